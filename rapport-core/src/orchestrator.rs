//! Memory orchestrator: the façade callers actually use.
//!
//! One call per user turn:
//!
//! ```text
//! validate ─▶ load-or-create ─▶ phase ─▶ profile ─▶ episode (+ eviction)
//!          ─▶ known topics / facts ─▶ save ─▶ updated record
//! ```
//!
//! Nothing is written until the final save, so a failed save leaves the
//! stored record exactly as it was. The orchestrator holds no per-user
//! locks: at most one in-flight interaction per user key is the caller's
//! responsibility. Different keys are independent.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::adaptive;
use crate::config::RapportConfig;
use crate::episodes::{self, EpisodeCandidate};
use crate::error::{RapportError, Result};
use crate::eviction;
use crate::memory::{Episode, RelationshipRecord};
use crate::metrics::{CounterSnapshot, RapportCounters};
use crate::persistence::{MemoryStore, RelationshipStore, SqliteStore};
use crate::phase::{self, PhaseProgress, PhaseSignals};
use crate::prompt::{PromptGenerator, TurnContext};
use crate::retrieval;
use crate::types::{RelationshipPhase, clamp_unit};

/// Number of known topics listed in a [`RelationshipSummary`].
const SUMMARY_KNOWN_TOPICS: usize = 10;
/// Number of top topics listed in a [`RelationshipSummary`].
const SUMMARY_TOP_TOPICS: usize = 5;

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// One user turn, with classifier output already attached.
#[derive(Debug, Clone)]
pub struct Interaction {
    /// Opaque user identifier.
    pub user_key: String,
    /// The user's message.
    pub message: String,
    /// Topic labels for this turn.
    pub topics: Vec<String>,
    /// Primary emotion label.
    pub emotion: String,
    /// Emotion intensity (0.0 to 1.0); out-of-range values are clamped.
    pub intensity: f32,
    /// Whether the classifier flagged acute risk.
    pub is_crisis: bool,
    /// Facts the user disclosed this turn.
    pub shared_info: Vec<String>,
}

impl Interaction {
    /// A neutral, topic-less turn.
    #[must_use]
    pub fn new(user_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_key: user_key.into(),
            message: message.into(),
            topics: Vec::new(),
            emotion: "neutral".to_string(),
            intensity: 0.0,
            is_crisis: false,
            shared_info: Vec::new(),
        }
    }

    /// Attach topic labels.
    #[must_use]
    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    /// Attach the emotion label and intensity.
    #[must_use]
    pub fn with_emotion(mut self, emotion: impl Into<String>, intensity: f32) -> Self {
        self.emotion = emotion.into();
        self.intensity = intensity;
        self
    }

    /// Set the crisis flag.
    #[must_use]
    pub fn with_crisis(mut self, is_crisis: bool) -> Self {
        self.is_crisis = is_crisis;
        self
    }

    /// Attach disclosed facts.
    #[must_use]
    pub fn with_shared<I, S>(mut self, shared: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shared_info = shared.into_iter().map(Into::into).collect();
        self
    }

    fn validate(&self) -> Result<()> {
        validate_key(&self.user_key)?;
        if self.message.trim().is_empty() {
            return Err(RapportError::Validation("message must not be empty".into()));
        }
        Ok(())
    }
}

/// A topic and its affinity, as listed in a summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicScore {
    /// Topic label.
    pub topic: String,
    /// Affinity (0.0 to 1.0).
    pub score: f32,
}

/// Read-only overview of one relationship.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipSummary {
    /// User identifier.
    pub user_key: String,
    /// Current phase.
    pub phase: RelationshipPhase,
    /// Interactions processed.
    pub total_interactions: u64,
    /// Current trust.
    pub trust_score: f32,
    /// Whole days since the first interaction.
    pub days_since_first: i64,
    /// Stored episodes.
    pub episode_count: usize,
    /// The first ten known topics.
    pub known_topics: Vec<String>,
    /// The five highest-affinity topics.
    pub top_topics: Vec<TopicScore>,
    /// Profile confidence.
    pub confidence_score: f32,
}

impl RelationshipSummary {
    /// Summarise `record` as of `now`.
    #[must_use]
    pub fn from_record(record: &RelationshipRecord, now: DateTime<Utc>) -> Self {
        Self {
            user_key: record.user_key.clone(),
            phase: record.state.phase,
            total_interactions: record.state.total_interactions,
            trust_score: record.state.trust_score,
            days_since_first: record.state.days_since_first(now),
            episode_count: record.episodes.len(),
            known_topics: record
                .state
                .known_topics
                .iter()
                .take(SUMMARY_KNOWN_TOPICS)
                .cloned()
                .collect(),
            top_topics: record
                .profile
                .top_topics(SUMMARY_TOP_TOPICS)
                .into_iter()
                .map(|t| TopicScore {
                    topic: t.topic.clone(),
                    score: t.affinity_score,
                })
                .collect(),
            confidence_score: record.profile.confidence_score,
        }
    }
}

fn validate_key(user_key: &str) -> Result<()> {
    if user_key.trim().is_empty() {
        return Err(RapportError::Validation("user key must not be empty".into()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// RelationshipMemory
// ---------------------------------------------------------------------------

/// The relationship memory engine.
pub struct RelationshipMemory {
    store: Arc<dyn RelationshipStore>,
    config: RapportConfig,
    prompts: PromptGenerator,
    counters: RapportCounters,
}

impl std::fmt::Debug for RelationshipMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationshipMemory")
            .field("config", &self.config)
            .field("counters", &self.counters.snapshot())
            .finish_non_exhaustive()
    }
}

impl RelationshipMemory {
    /// Create an engine over an existing store.
    #[must_use]
    pub fn new(store: Arc<dyn RelationshipStore>, config: RapportConfig) -> Self {
        let prompts = PromptGenerator::new(config.prompt.clone());
        Self {
            store,
            config,
            prompts,
            counters: RapportCounters::new(),
        }
    }

    /// An engine backed by a fresh [`MemoryStore`].
    #[must_use]
    pub fn in_memory(config: RapportConfig) -> Self {
        Self::new(Arc::new(MemoryStore::new()), config)
    }

    /// An engine backed by a [`SqliteStore`] at `path`.
    ///
    /// # Errors
    /// Returns `RapportError::Database` if the database cannot be opened.
    pub fn open_sqlite<P: AsRef<Path>>(path: P, config: RapportConfig) -> Result<Self> {
        let store = SqliteStore::open(path, &config.persistence)?;
        Ok(Self::new(Arc::new(store), config))
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &RapportConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Write path
    // ------------------------------------------------------------------

    /// Load the record for `user_key`, creating and persisting it if absent.
    ///
    /// # Errors
    /// Returns `RapportError::Validation` for an empty key, or the store's
    /// error if loading or saving fails.
    pub fn get_or_create(&self, user_key: &str) -> Result<RelationshipRecord> {
        validate_key(user_key)?;
        if let Some(record) = self.store.load(user_key)? {
            return Ok(record);
        }
        let record = RelationshipRecord::new(user_key, Utc::now());
        self.persist(&record)?;
        info!(user = %user_key, "Created relationship record");
        Ok(record)
    }

    /// Process one interaction at the current time.
    ///
    /// # Errors
    /// See [`Self::process_interaction_at`].
    pub fn process_interaction(&self, interaction: &Interaction) -> Result<RelationshipRecord> {
        self.process_interaction_at(interaction, Utc::now())
    }

    /// Process one interaction as if it happened at `now`.
    ///
    /// Unlike [`Self::get_or_create`], an unknown user is not saved up front:
    /// the fresh record is built in memory and written once, together with
    /// this turn's updates. A failed save therefore leaves no empty record
    /// behind for a first-time user.
    ///
    /// # Errors
    /// Returns `RapportError::Validation` for an empty key or message
    /// (nothing is touched), or the store's error if loading or saving
    /// fails (nothing is written).
    pub fn process_interaction_at(
        &self,
        interaction: &Interaction,
        now: DateTime<Utc>,
    ) -> Result<RelationshipRecord> {
        interaction.validate()?;
        let start = Instant::now();
        let key = interaction.user_key.as_str();
        let intensity = clamp_unit(interaction.intensity);

        let mut record = self
            .store
            .load(key)?
            .unwrap_or_else(|| RelationshipRecord::new(key, now));

        let transition = phase::update(
            &mut record.state,
            PhaseSignals {
                message: &interaction.message,
                emotion_intensity: intensity,
                has_personal_disclosure: !interaction.shared_info.is_empty(),
            },
            now,
        );

        adaptive::update_profile(
            &mut record.profile,
            &interaction.message,
            &interaction.topics,
            &interaction.emotion,
            intensity,
            now,
        );

        let candidate = EpisodeCandidate {
            user_key: key,
            message: &interaction.message,
            topics: &interaction.topics,
            emotion: &interaction.emotion,
            intensity,
            is_crisis: interaction.is_crisis,
            shared_info: &interaction.shared_info,
        };
        let episode = episodes::maybe_create(&candidate, &record.state.known_topics, &self.config.episodes, now);
        let created = episode.is_some();
        let mut evicted = Vec::new();
        if let Some(episode) = episode {
            debug!(
                user = %key,
                episode = %episode.id,
                kind = ?episode.episode_type,
                importance = episode.importance_score,
                "Episode created"
            );
            record.episodes.push(episode);
            evicted = eviction::enforce_capacity(&mut record.episodes, self.config.episodes.max_episodes_per_user);
        }

        for topic in &interaction.topics {
            record.state.learn_topic(topic);
        }
        for fact in &interaction.shared_info {
            record.state.learn_fact(fact);
        }

        self.persist(&record)?;

        RapportCounters::incr(&self.counters.interactions_processed);
        if created {
            RapportCounters::incr(&self.counters.episodes_created);
        }
        if !evicted.is_empty() {
            RapportCounters::add(&self.counters.episodes_evicted, evicted.len() as u64);
            debug!(user = %key, evicted = evicted.len(), "Episodes evicted");
        }
        if let Some(t) = &transition {
            RapportCounters::incr(&self.counters.phase_transitions);
            info!(
                user = %key,
                from = %t.from_phase,
                to = %t.to_phase,
                interactions = t.interaction_count,
                trigger = ?t.trigger,
                "Relationship phase changed"
            );
        }

        debug!(
            user = %key,
            interactions = record.state.total_interactions,
            trust = record.state.trust_score,
            elapsed_us = start.elapsed().as_micros(),
            "Interaction processed"
        );
        Ok(record)
    }

    /// Replace a user's record with fresh defaults, keeping the key.
    ///
    /// Returns `false` if the user is unknown.
    ///
    /// # Errors
    /// Returns the store's error if loading or saving fails.
    pub fn reset(&self, user_key: &str) -> Result<bool> {
        if self.store.load(user_key)?.is_none() {
            return Ok(false);
        }
        self.persist(&RelationshipRecord::new(user_key, Utc::now()))?;
        RapportCounters::incr(&self.counters.records_reset);
        info!(user = %user_key, "Relationship reset");
        Ok(true)
    }

    /// Remove a user's record entirely. Returns `false` if the user is
    /// unknown.
    ///
    /// # Errors
    /// Returns the store's error if the delete fails.
    pub fn delete(&self, user_key: &str) -> Result<bool> {
        let deleted = self.store.delete(user_key)?;
        if deleted {
            RapportCounters::incr(&self.counters.records_deleted);
            info!(user = %user_key, "Relationship deleted");
        }
        Ok(deleted)
    }

    fn persist(&self, record: &RelationshipRecord) -> Result<()> {
        match self.store.save(record) {
            Ok(()) => {
                RapportCounters::incr(&self.counters.saves_completed);
                Ok(())
            }
            Err(e) => {
                RapportCounters::incr(&self.counters.save_failures);
                warn!(user = %record.user_key, error = %e, "Failed to save relationship record");
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Read path
    // ------------------------------------------------------------------

    /// The full stored record as JSON, or `None` for an unknown user.
    ///
    /// # Errors
    /// Returns the store's error if loading fails.
    pub fn export_user_data(&self, user_key: &str) -> Result<Option<serde_json::Value>> {
        self.store
            .load(user_key)?
            .map(|record| serde_json::to_value(&record).map_err(RapportError::from))
            .transpose()
    }

    /// Search a user's episodes; empty for an unknown user.
    ///
    /// # Errors
    /// Returns the store's error if loading fails.
    pub fn search_episodes(&self, user_key: &str, query: &str, limit: usize) -> Result<Vec<Episode>> {
        Ok(self
            .store
            .load(user_key)?
            .map(|record| retrieval::search(&record.episodes, query, limit))
            .unwrap_or_default())
    }

    /// Render the system prompt for a user.
    ///
    /// An unknown user gets the prompt of a fresh record; nothing is
    /// persisted.
    ///
    /// # Errors
    /// Returns the store's error if loading fails.
    pub fn generate_system_prompt(&self, user_key: &str) -> Result<String> {
        let record = self
            .store
            .load(user_key)?
            .unwrap_or_else(|| RelationshipRecord::new(user_key, Utc::now()));
        let recent = record.recent_episodes(self.config.episodes.recent_for_prompt);
        Ok(self.prompts.generate(&record.state, &record.profile, &recent))
    }

    /// Safety instructions for a crisis turn.
    #[must_use]
    pub fn generate_crisis_addendum(&self) -> String {
        self.prompts.crisis_addendum()
    }

    /// Date and emotion context for the current turn.
    #[must_use]
    pub fn generate_context_addendum(&self, context: &TurnContext) -> String {
        self.prompts.context_addendum(context, Utc::now())
    }

    /// Overview of a relationship, or `None` for an unknown user.
    ///
    /// # Errors
    /// Returns the store's error if loading fails.
    pub fn get_relationship_summary(&self, user_key: &str) -> Result<Option<RelationshipSummary>> {
        let now = Utc::now();
        Ok(self
            .store
            .load(user_key)?
            .map(|record| RelationshipSummary::from_record(&record, now)))
    }

    /// Progress toward the next phase, or `None` for an unknown user.
    ///
    /// # Errors
    /// Returns the store's error if loading fails.
    pub fn phase_progress(&self, user_key: &str) -> Result<Option<PhaseProgress>> {
        Ok(self
            .store
            .load(user_key)?
            .map(|record| phase::phase_progress(&record.state)))
    }

    /// Snapshot of the process counters.
    #[must_use]
    pub fn metrics(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }
}
