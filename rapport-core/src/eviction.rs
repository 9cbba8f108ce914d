//! Capacity-bounded episode eviction.
//!
//! When a user's episode list grows past the configured cap, the least
//! important episodes are dropped. The survivors keep their chronological
//! order:
//!
//! ```text
//!  chronological ──▶ rank by importance ──▶ keep top N ──▶ chronological
//!  [e0 e1 … e150]    [e42 e7 … e3]          [e42 … e88]    [e1 e3 … e149]
//! ```
//!
//! Ties are broken by original position in both sorts, so the pass is fully
//! deterministic.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;

use crate::memory::Episode;

/// Trim `episodes` to at most `capacity` entries.
///
/// Returns the evicted episodes (highest-ranked first), or an empty vector
/// when nothing had to go.
pub fn enforce_capacity(episodes: &mut Vec<Episode>, capacity: usize) -> Vec<Episode> {
    if episodes.len() <= capacity {
        return Vec::new();
    }

    let mut ranked: Vec<(usize, Episode)> = episodes.drain(..).enumerate().collect();
    // Highest importance first; earlier position wins ties.
    ranked.sort_by_key(|(idx, ep)| (Reverse(OrderedFloat(ep.importance_score)), *idx));

    let evicted: Vec<Episode> = ranked.split_off(capacity).into_iter().map(|(_, ep)| ep).collect();

    ranked.sort_by_key(|(idx, ep)| (ep.created_at, *idx));
    episodes.extend(ranked.into_iter().map(|(_, ep)| ep));

    evicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn episodes_with(importances: &[f32]) -> Vec<Episode> {
        let start = Utc::now();
        importances
            .iter()
            .enumerate()
            .map(|(i, &imp)| Episode::new("u1", format!("ep{i}"), imp, 0.5, start + Duration::minutes(i as i64)))
            .collect()
    }

    #[test]
    fn under_capacity_is_untouched() {
        let mut eps = episodes_with(&[0.5, 0.9, 0.1]);
        let before = eps.clone();
        let evicted = enforce_capacity(&mut eps, 3);
        assert!(evicted.is_empty());
        assert_eq!(eps, before);
    }

    #[test]
    fn keeps_most_important_in_chronological_order() {
        let mut eps = episodes_with(&[0.5, 0.9, 0.1, 0.7, 0.2]);
        let evicted = enforce_capacity(&mut eps, 3);
        let kept: Vec<&str> = eps.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(kept, vec!["ep0", "ep1", "ep3"]);
        let gone: Vec<&str> = evicted.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(gone, vec!["ep4", "ep2"]);
    }

    #[test]
    fn ties_prefer_earlier_episodes() {
        let mut eps = episodes_with(&[0.5, 0.5, 0.5, 0.5]);
        enforce_capacity(&mut eps, 2);
        let kept: Vec<&str> = eps.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(kept, vec!["ep0", "ep1"]);
    }

    #[test]
    fn zero_capacity_evicts_everything() {
        let mut eps = episodes_with(&[0.5, 0.6]);
        let evicted = enforce_capacity(&mut eps, 0);
        assert!(eps.is_empty());
        assert_eq!(evicted.len(), 2);
    }
}
