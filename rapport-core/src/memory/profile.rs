//! Adaptive profile: "How you like to talk"
//!
//! Learned stylistic preferences, separate from the relationship phase.
//! Mutated only by [`crate::adaptive::update_profile`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::types::{DepthLevel, ToneLevel};

/// Interest in a single topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicAffinity {
    /// Topic label.
    pub topic: String,
    /// Interest level (0.0 to 1.0).
    pub affinity_score: f32,
    /// How often the topic came up.
    pub mention_count: u32,
    /// When the topic was last explicitly mentioned.
    pub last_mentioned_at: Option<DateTime<Utc>>,
}

impl TopicAffinity {
    /// A first mention of `topic` at `now` with the given starting score.
    #[must_use]
    pub fn first_mention(topic: impl Into<String>, affinity_score: f32, now: DateTime<Utc>) -> Self {
        Self {
            topic: topic.into(),
            affinity_score,
            mention_count: 1,
            last_mentioned_at: Some(now),
        }
    }
}

/// Snapshot of the learned communication style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunicationStyle {
    /// Preferred tone.
    pub tone: ToneLevel,
    /// Preferred depth.
    pub depth: DepthLevel,
    /// Preference for being asked questions.
    pub likes_questions: f32,
    /// Preference for concrete advice.
    pub likes_advice: f32,
    /// Preference for empathy.
    pub likes_empathy: f32,
    /// Preference for detailed answers.
    pub likes_detail: f32,
    /// How much signal backs the values above.
    pub confidence: f32,
}

/// Per-user learned preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveProfile {
    /// Preferred response tone.
    #[serde(default)]
    pub preferred_tone: ToneLevel,
    /// Preferred response depth.
    #[serde(default)]
    pub preferred_depth: DepthLevel,
    /// Interest per topic.
    #[serde(default)]
    pub topic_affinities: BTreeMap<String, TopicAffinity>,
    /// All-time occurrence count per emotion label.
    #[serde(default)]
    pub emotional_pattern_counts: BTreeMap<String, u32>,
    /// Preference for being asked questions (0.0 to 1.0).
    pub likes_questions: f32,
    /// Preference for concrete advice (0.0 to 1.0).
    pub likes_advice: f32,
    /// Preference for empathy (0.0 to 1.0).
    pub likes_empathy: f32,
    /// Preference for detailed answers (0.0 to 1.0).
    pub likes_detail: f32,
    /// Derived from the amount of accumulated signal; never set directly.
    #[serde(default)]
    pub confidence_score: f32,
    /// When the profile last changed.
    pub last_updated_at: DateTime<Utc>,
}

impl AdaptiveProfile {
    /// A profile with no learned signal.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            preferred_tone: ToneLevel::Balanced,
            preferred_depth: DepthLevel::Medium,
            topic_affinities: BTreeMap::new(),
            emotional_pattern_counts: BTreeMap::new(),
            likes_questions: 0.5,
            likes_advice: 0.5,
            likes_empathy: 0.7,
            likes_detail: 0.5,
            confidence_score: 0.0,
            last_updated_at: now,
        }
    }

    /// The `n` topics with the highest affinity, best first.
    ///
    /// Ties keep alphabetical order.
    #[must_use]
    pub fn top_topics(&self, n: usize) -> Vec<&TopicAffinity> {
        let mut topics: Vec<&TopicAffinity> = self.topic_affinities.values().collect();
        topics.sort_by_key(|t| std::cmp::Reverse(OrderedFloat(t.affinity_score)));
        topics.truncate(n);
        topics
    }

    /// The most frequently observed emotion, or `"neutral"` with no data.
    #[must_use]
    pub fn dominant_emotion(&self) -> &str {
        self.emotional_pattern_counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map_or("neutral", |(emotion, _)| emotion.as_str())
    }

    /// Total number of emotion samples recorded.
    #[must_use]
    pub fn emotion_samples(&self) -> u32 {
        self.emotional_pattern_counts.values().sum()
    }

    /// Summary of the learned communication style.
    #[must_use]
    pub fn communication_style(&self) -> CommunicationStyle {
        CommunicationStyle {
            tone: self.preferred_tone,
            depth: self.preferred_depth,
            likes_questions: self.likes_questions,
            likes_advice: self.likes_advice,
            likes_empathy: self.likes_empathy,
            likes_detail: self.likes_detail,
            confidence: self.confidence_score,
        }
    }

    /// Whether the agent should ask the user questions.
    #[must_use]
    pub fn should_ask_question(&self) -> bool {
        self.likes_questions > 0.5
    }

    /// Whether the agent should offer advice.
    #[must_use]
    pub fn should_give_advice(&self) -> bool {
        self.likes_advice > 0.5
    }

    /// Whether the agent should lead with empathy.
    #[must_use]
    pub fn should_emphasize_empathy(&self) -> bool {
        self.likes_empathy > 0.6
    }
}
