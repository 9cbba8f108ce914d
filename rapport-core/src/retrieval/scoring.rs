//! Per-field match scoring for episode search.
//!
//! Score = (3·topic + 2·keyword + 1·summary + 2.5·shared) × (0.5 + 0.5·importance)
//!
//! Every field test is a case-insensitive substring match of the query.
//! Topic and keyword hits are counted per entry, so an episode tagged with
//! two matching topics scores twice.

use crate::memory::Episode;
use crate::retrieval::MatchBreakdown;

const TOPIC_WEIGHT: f32 = 3.0;
const KEYWORD_WEIGHT: f32 = 2.0;
const SUMMARY_WEIGHT: f32 = 1.0;
const SHARED_WEIGHT: f32 = 2.5;

/// Field-by-field match contributions, before importance weighting.
///
/// `query_lower` must already be lowercased.
pub fn compute_breakdown(episode: &Episode, query_lower: &str) -> MatchBreakdown {
    MatchBreakdown {
        topic: TOPIC_WEIGHT * count_matches(&episode.topics, query_lower),
        keyword: KEYWORD_WEIGHT * count_matches(&episode.keywords, query_lower),
        summary: if episode.summary.to_lowercase().contains(query_lower) {
            SUMMARY_WEIGHT
        } else {
            0.0
        },
        shared: SHARED_WEIGHT * count_matches(&episode.user_shared, query_lower),
    }
}

/// Importance multiplier in [0.5, 1.0].
pub fn importance_weight(episode: &Episode) -> f32 {
    0.5 + episode.importance_score * 0.5
}

fn count_matches(fields: &[String], query_lower: &str) -> f32 {
    fields
        .iter()
        .filter(|f| f.to_lowercase().contains(query_lower))
        .count() as f32
}
