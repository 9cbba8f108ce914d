//! Episode retrieval: keyword search plus the simple views the prompt
//! generator and callers need (important, recent, by topic).
//!
//! Search is a linear scan. Per-user episode lists are capped (100 by
//! default), so an index would cost more than it saves.

pub mod scoring;

use std::cmp::Reverse;

use ordered_float::OrderedFloat;

use crate::memory::Episode;

/// Default minimum importance for [`important_episodes`].
pub const DEFAULT_MIN_IMPORTANCE: f32 = 0.6;

/// A scored search hit.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The matching episode.
    pub episode: Episode,
    /// Final score after importance weighting.
    pub score: f32,
    /// Per-field contributions (useful when tuning weights).
    pub breakdown: MatchBreakdown,
}

/// Breakdown of a search score by matched field.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MatchBreakdown {
    /// Topic matches.
    pub topic: f32,
    /// Keyword matches.
    pub keyword: f32,
    /// Summary match.
    pub summary: f32,
    /// Shared-fact matches.
    pub shared: f32,
}

impl MatchBreakdown {
    /// Sum of all contributions.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.topic + self.keyword + self.summary + self.shared
    }
}

/// Scored search over `episodes`, best first, at most `limit` hits.
///
/// A blank query matches nothing.
#[must_use]
pub fn search_scored(episodes: &[Episode], query: &str, limit: usize) -> Vec<SearchHit> {
    let query_lower = query.trim().to_lowercase();
    if query_lower.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<SearchHit> = episodes
        .iter()
        .filter_map(|episode| {
            let breakdown = scoring::compute_breakdown(episode, &query_lower);
            let raw = breakdown.total();
            (raw > 0.0).then(|| SearchHit {
                episode: episode.clone(),
                score: raw * scoring::importance_weight(episode),
                breakdown,
            })
        })
        .collect();

    // Stable: equal scores keep chronological order.
    hits.sort_by_key(|hit| Reverse(OrderedFloat(hit.score)));
    hits.truncate(limit);
    hits
}

/// Episodes matching `query`, best first.
#[must_use]
pub fn search(episodes: &[Episode], query: &str, limit: usize) -> Vec<Episode> {
    search_scored(episodes, query, limit)
        .into_iter()
        .map(|hit| hit.episode)
        .collect()
}

/// Episodes with importance at least `min_importance`, most important first.
#[must_use]
pub fn important_episodes(episodes: &[Episode], min_importance: f32, limit: usize) -> Vec<Episode> {
    let mut found: Vec<&Episode> = episodes
        .iter()
        .filter(|e| e.importance_score >= min_importance)
        .collect();
    found.sort_by_key(|e| Reverse(OrderedFloat(e.importance_score)));
    found.into_iter().take(limit).cloned().collect()
}

/// The `limit` newest episodes, newest first.
#[must_use]
pub fn recent_episodes(episodes: &[Episode], limit: usize) -> Vec<Episode> {
    let mut sorted: Vec<(usize, &Episode)> = episodes.iter().enumerate().collect();
    sorted.sort_by_key(|(idx, e)| Reverse((e.created_at, *idx)));
    sorted.into_iter().take(limit).map(|(_, e)| e.clone()).collect()
}

/// Episodes with a topic containing `topic`, newest first.
#[must_use]
pub fn episodes_by_topic(episodes: &[Episode], topic: &str, limit: usize) -> Vec<Episode> {
    let topic_lower = topic.to_lowercase();
    let matching: Vec<Episode> = episodes
        .iter()
        .filter(|e| e.topics.iter().any(|t| t.to_lowercase().contains(&topic_lower)))
        .cloned()
        .collect();
    recent_episodes(&matching, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn sample() -> Vec<Episode> {
        let t0 = Utc::now();
        vec![
            Episode::new("u1", "Emotion: stress / my boss again", 0.5, 0.5, t0)
                .with_keywords(vec!["boss".into()]),
            Episode::new("u1", "Topics: work / Emotion: sadness", 0.5, 0.5, t0 + Duration::minutes(1))
                .with_topics(vec!["work".into()]),
            Episode::new("u1", "Emotion: calm / work mentioned here", 0.5, 0.5, t0 + Duration::minutes(2)),
            Episode::new("u1", "Emotion: hope / new job", 0.9, 0.5, t0 + Duration::minutes(3))
                .with_keywords(vec!["workplace".into()]),
        ]
    }

    #[test]
    fn topic_beats_keyword_beats_summary() {
        let eps = sample();
        let hits = search(&eps, "WORK", 10);
        let summaries: Vec<&str> = hits.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(
            summaries,
            vec![
                "Topics: work / Emotion: sadness",
                "Emotion: hope / new job",
                "Emotion: calm / work mentioned here",
            ]
        );
    }

    #[test]
    fn importance_weights_the_score() {
        let eps = sample();
        let hits = search_scored(&eps, "work", 10);
        // topic 3 + summary 1, × 0.75
        assert!((hits[0].score - 3.0).abs() < 1e-5);
        // keyword 2, × 0.95
        assert!((hits[1].score - 1.9).abs() < 1e-5);
    }

    #[test]
    fn limit_and_blank_query() {
        let eps = sample();
        assert_eq!(search(&eps, "work", 1).len(), 1);
        assert!(search(&eps, "   ", 10).is_empty());
        assert!(search(&eps, "holiday", 10).is_empty());
    }

    #[test]
    fn recent_is_newest_first() {
        let eps = sample();
        let recent = recent_episodes(&eps, 2);
        assert_eq!(recent[0].summary, "Emotion: hope / new job");
        assert_eq!(recent[1].summary, "Emotion: calm / work mentioned here");
    }

    #[test]
    fn important_filters_and_sorts() {
        let eps = sample();
        let important = important_episodes(&eps, DEFAULT_MIN_IMPORTANCE, 10);
        assert_eq!(important.len(), 1);
        assert_eq!(important[0].summary, "Emotion: hope / new job");
    }

    #[test]
    fn by_topic_is_case_insensitive() {
        let eps = sample();
        let found = episodes_by_topic(&eps, "Work", 5);
        assert_eq!(found.len(), 1);
        assert!(episodes_by_topic(&eps, "family", 5).is_empty());
    }
}
