//! Episodes: "What we went through"
//!
//! A long-term record of one emotionally or informationally significant
//! interaction. Created only by [`crate::episodes::maybe_create`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EpisodeId, EpisodeType, clamp_unit};

/// A single remembered interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Unique identifier.
    pub id: EpisodeId,
    /// The user this episode belongs to (lookup only).
    pub user_key: String,
    /// When the triggering interaction happened.
    pub created_at: DateTime<Utc>,
    /// Short human-readable description.
    pub summary: String,
    /// Facts the user disclosed in this interaction.
    #[serde(default)]
    pub user_shared: Vec<String>,
    /// Emotion label of the triggering turn.
    #[serde(default)]
    pub emotional_context: String,
    /// Topic labels.
    #[serde(default)]
    pub topics: Vec<String>,
    /// How significant this episode is (0.0 to 1.0).
    pub importance_score: f32,
    /// Emotional intensity of the triggering turn (0.0 to 1.0).
    pub emotional_intensity: f32,
    /// Classification.
    #[serde(default)]
    pub episode_type: EpisodeType,
    /// Search terms derived from the triggering message.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Episode {
    /// Create an episode with the given summary and scores.
    ///
    /// Scores are clamped to [0, 1]; lists start empty.
    #[must_use]
    pub fn new(
        user_key: impl Into<String>,
        summary: impl Into<String>,
        importance_score: f32,
        emotional_intensity: f32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EpisodeId::new(),
            user_key: user_key.into(),
            created_at,
            summary: summary.into(),
            user_shared: Vec::new(),
            emotional_context: String::new(),
            topics: Vec::new(),
            importance_score: clamp_unit(importance_score),
            emotional_intensity: clamp_unit(emotional_intensity),
            episode_type: EpisodeType::General,
            keywords: Vec::new(),
        }
    }

    /// Set the topic labels.
    #[must_use]
    pub fn with_topics(mut self, topics: Vec<String>) -> Self {
        self.topics = topics;
        self
    }

    /// Set the search keywords.
    #[must_use]
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    /// Set the disclosed facts.
    #[must_use]
    pub fn with_shared(mut self, shared: Vec<String>) -> Self {
        self.user_shared = shared;
        self
    }

    /// Set the classification.
    #[must_use]
    pub fn with_type(mut self, episode_type: EpisodeType) -> Self {
        self.episode_type = episode_type;
        self
    }

    /// Set the emotion label.
    #[must_use]
    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotional_context = emotion.into();
        self
    }
}
