//! Episode manager: deciding what is worth remembering.
//!
//! Most interactions are not memorable. Each turn gets an importance score
//! from several independent signals; only turns at or above the configured
//! threshold become an [`Episode`]:
//!
//! ```text
//! importance = 0.3 × intensity
//!            + 0.5   crisis
//!            + 0.2   disclosed facts
//!            + 0.1   disclosure phrasing
//!            + 0.15  insight phrasing
//!            + min(0.2, 0.1 × new topics)
//!            + 0.1 (> 200 chars) | 0.05 (> 100 chars)
//! ```
//!
//! Capacity enforcement lives in [`crate::eviction`], search in
//! [`crate::retrieval`].

pub mod keywords;

use chrono::{DateTime, Utc};

use crate::config::EpisodeConfig;
use crate::memory::Episode;
use crate::types::{EpisodeType, char_len, clamp_unit};

use keywords::{CRISIS_KEYWORDS, DISCLOSURE_KEYWORDS, INSIGHT_KEYWORDS, contains_any};

/// Message characters kept verbatim in a summary.
const SUMMARY_MESSAGE_CHARS: usize = 100;

/// One interaction, as seen by the episode manager.
#[derive(Debug, Clone, Copy)]
pub struct EpisodeCandidate<'a> {
    /// Owner of the episode.
    pub user_key: &'a str,
    /// The user's message.
    pub message: &'a str,
    /// Topic labels detected for this turn.
    pub topics: &'a [String],
    /// Emotion label.
    pub emotion: &'a str,
    /// Emotion intensity (0.0 to 1.0).
    pub intensity: f32,
    /// Whether the upstream classifier flagged a crisis.
    pub is_crisis: bool,
    /// Facts the user disclosed this turn.
    pub shared_info: &'a [String],
}

/// Build an episode for `candidate` if it is important enough.
///
/// `known_topics` must be the topics known *before* this turn, otherwise
/// every topic looks old and the novelty bonus never applies.
#[must_use]
pub fn maybe_create(
    candidate: &EpisodeCandidate<'_>,
    known_topics: &[String],
    config: &EpisodeConfig,
    now: DateTime<Utc>,
) -> Option<Episode> {
    let importance = calculate_importance(candidate, known_topics);
    if importance < config.importance_threshold {
        return None;
    }

    let episode_type = classify(candidate);
    let summary = summarize(candidate, episode_type);
    let keywords = keywords::extract_keywords(candidate.message, candidate.topics, config.max_keywords);

    Some(
        Episode::new(candidate.user_key, summary, importance, candidate.intensity, now)
            .with_topics(candidate.topics.to_vec())
            .with_keywords(keywords)
            .with_shared(candidate.shared_info.to_vec())
            .with_type(episode_type)
            .with_emotion(candidate.emotion),
    )
}

/// Importance of a turn, clamped to [0, 1].
#[must_use]
pub fn calculate_importance(candidate: &EpisodeCandidate<'_>, known_topics: &[String]) -> f32 {
    let mut score = clamp_unit(candidate.intensity) * 0.3;

    if candidate.is_crisis {
        score += 0.5;
    }
    if !candidate.shared_info.is_empty() {
        score += 0.2;
    }
    if contains_any(candidate.message, DISCLOSURE_KEYWORDS) {
        score += 0.1;
    }
    if contains_any(candidate.message, INSIGHT_KEYWORDS) {
        score += 0.15;
    }

    let new_topics = candidate
        .topics
        .iter()
        .filter(|t| !known_topics.contains(t))
        .count();
    score += (new_topics as f32 * 0.1).min(0.2);

    let len = char_len(candidate.message);
    if len > 200 {
        score += 0.1;
    } else if len > 100 {
        score += 0.05;
    }

    clamp_unit(score)
}

/// Classify a turn. Priority: crisis > disclosure > insight > general.
#[must_use]
pub fn classify(candidate: &EpisodeCandidate<'_>) -> EpisodeType {
    if candidate.is_crisis || contains_any(candidate.message, CRISIS_KEYWORDS) {
        EpisodeType::Crisis
    } else if !candidate.shared_info.is_empty()
        || contains_any(candidate.message, DISCLOSURE_KEYWORDS)
    {
        EpisodeType::Disclosure
    } else if contains_any(candidate.message, INSIGHT_KEYWORDS) {
        EpisodeType::Insight
    } else {
        EpisodeType::General
    }
}

/// `"[Type] / Topics: a, b / Emotion: x / message..."`, empty parts omitted.
#[must_use]
pub fn summarize(candidate: &EpisodeCandidate<'_>, episode_type: EpisodeType) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(4);

    let prefix = episode_type.summary_prefix();
    if !prefix.is_empty() {
        parts.push(prefix.to_string());
    }
    if !candidate.topics.is_empty() {
        parts.push(format!("Topics: {}", candidate.topics.join(", ")));
    }
    parts.push(format!("Emotion: {}", candidate.emotion));

    let excerpt = if char_len(candidate.message) > SUMMARY_MESSAGE_CHARS {
        let head: String = candidate.message.chars().take(SUMMARY_MESSAGE_CHARS).collect();
        format!("{head}...")
    } else {
        candidate.message.to_string()
    };
    if !excerpt.is_empty() {
        parts.push(excerpt);
    }

    parts.join(" / ")
}
