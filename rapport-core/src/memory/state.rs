//! Relationship state: "How close are we"
//!
//! Scalar relationship metrics, the current phase and its append-only
//! transition history, plus the facts and topics the agent has learned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{RelationshipPhase, TransitionTrigger};

/// One recorded phase change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTransition {
    /// Phase before the change.
    pub from_phase: RelationshipPhase,
    /// Phase after the change.
    pub to_phase: RelationshipPhase,
    /// When the change happened.
    pub transitioned_at: DateTime<Utc>,
    /// Interaction count at the time of the change.
    pub interaction_count: u64,
    /// What caused the change.
    pub trigger: TransitionTrigger,
}

/// Relationship metrics for a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipState {
    /// Opaque user identifier.
    pub user_key: String,
    /// Current phase, always consistent with the scores below.
    #[serde(default)]
    pub phase: RelationshipPhase,
    /// Number of processed interactions.
    #[serde(default)]
    pub total_interactions: u64,
    /// When the relationship started.
    pub first_interaction_at: DateTime<Utc>,
    /// When the last interaction was processed.
    pub last_interaction_at: DateTime<Utc>,
    /// How much the user trusts the agent (0.0 to 1.0).
    #[serde(default)]
    pub trust_score: f32,
    /// How much the user opens up (0.0 to 1.0).
    #[serde(default)]
    pub openness_score: f32,
    /// Smoothed closeness (0.0 to 1.0).
    #[serde(default)]
    pub rapport_score: f32,
    /// Every phase change, oldest first. Never rewritten.
    #[serde(default)]
    pub phase_history: Vec<PhaseTransition>,
    /// Facts the user disclosed, deduplicated, in disclosure order.
    #[serde(default)]
    pub known_facts: Vec<String>,
    /// Topics ever discussed, deduplicated, in first-mention order.
    #[serde(default)]
    pub known_topics: Vec<String>,
}

impl RelationshipState {
    /// Fresh state for a user met at `now`.
    #[must_use]
    pub fn new(user_key: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_key: user_key.into(),
            phase: RelationshipPhase::Stranger,
            total_interactions: 0,
            first_interaction_at: now,
            last_interaction_at: now,
            trust_score: 0.0,
            openness_score: 0.0,
            rapport_score: 0.0,
            phase_history: Vec::new(),
            known_facts: Vec::new(),
            known_topics: Vec::new(),
        }
    }

    /// Remember a topic; returns `true` if it was new.
    pub fn learn_topic(&mut self, topic: &str) -> bool {
        if self.known_topics.iter().any(|t| t == topic) {
            return false;
        }
        self.known_topics.push(topic.to_string());
        true
    }

    /// Remember a disclosed fact; returns `true` if it was new.
    pub fn learn_fact(&mut self, fact: &str) -> bool {
        if self.known_facts.iter().any(|f| f == fact) {
            return false;
        }
        self.known_facts.push(fact.to_string());
        true
    }

    /// Whole days since the first interaction.
    #[must_use]
    pub fn days_since_first(&self, now: DateTime<Utc>) -> i64 {
        (now - self.first_interaction_at).num_days().max(0)
    }
}
