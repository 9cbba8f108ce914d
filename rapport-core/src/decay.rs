//! Lazy decay of trust and topic interest.
//!
//! Nothing here runs on a schedule. Decay is computed from elapsed wall-clock
//! time inside the next update call, so a user who never returns keeps the
//! stored scores untouched until they do:
//!
//! ```text
//!   trust    -= min(0.01 × ⌊days_idle / 7⌋, 0.1)   when days_idle > 7
//!   affinity -= 0.01 per update                    when last mention > 30 days
//! ```

use chrono::{DateTime, Utc};

use crate::memory::TopicAffinity;

/// Trust lost per full week of inactivity.
pub const TRUST_DECAY_PER_WEEK: f32 = 0.01;
/// Maximum trust lost to a single inactivity gap.
pub const MAX_TRUST_DECAY: f32 = 0.1;
/// Inactivity shorter than or equal to this is free.
pub const TRUST_GRACE_DAYS: i64 = 7;

/// Affinity lost per update for stale topics.
pub const AFFINITY_DECAY_STEP: f32 = 0.01;
/// A topic is stale once unmentioned for longer than this.
pub const AFFINITY_STALE_DAYS: i64 = 30;

/// Trust penalty for the gap between `last_interaction` and `now`.
#[must_use]
pub fn trust_decay(last_interaction: DateTime<Utc>, now: DateTime<Utc>) -> f32 {
    let days_idle = (now - last_interaction).num_days();
    if days_idle <= TRUST_GRACE_DAYS {
        return 0.0;
    }
    let weeks = (days_idle / 7) as f32;
    (TRUST_DECAY_PER_WEEK * weeks).min(MAX_TRUST_DECAY)
}

/// Apply one step of decay to every stale topic.
///
/// Returns how many topics were decayed.
pub fn decay_topic_affinities<'a>(
    affinities: impl IntoIterator<Item = &'a mut TopicAffinity>,
    now: DateTime<Utc>,
) -> usize {
    let mut decayed = 0;
    for affinity in affinities {
        let Some(last) = affinity.last_mentioned_at else {
            continue;
        };
        if (now - last).num_days() > AFFINITY_STALE_DAYS {
            affinity.affinity_score = (affinity.affinity_score - AFFINITY_DECAY_STEP).max(0.0);
            decayed += 1;
        }
    }
    decayed
}
