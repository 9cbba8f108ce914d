//! Core type definitions shared across the relationship engine.
//!
//! Every enum here is persisted, so the serde representation (lowercase
//! strings) is part of the storage format.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Unique identifier for an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpisodeId(pub Uuid);

impl EpisodeId {
    /// Create a new random episode ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EpisodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Relationship phase
// ---------------------------------------------------------------------------

/// Ordinal closeness between the agent and a user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipPhase {
    /// First contact.
    #[default]
    Stranger,
    /// Has talked a few times; past topics may be referenced.
    Acquaintance,
    /// Knows the user well and remembers important episodes.
    Familiar,
    /// Long-standing trust.
    Trusted,
}

impl RelationshipPhase {
    /// All phases in ascending order.
    pub const ALL: [Self; 4] = [Self::Stranger, Self::Acquaintance, Self::Familiar, Self::Trusted];

    /// Effective interaction count needed to reach this phase.
    #[must_use]
    pub fn threshold(self) -> f32 {
        match self {
            Self::Stranger => 0.0,
            Self::Acquaintance => 6.0,
            Self::Familiar => 21.0,
            Self::Trusted => 51.0,
        }
    }

    /// The phase after this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Stranger => Some(Self::Acquaintance),
            Self::Acquaintance => Some(Self::Familiar),
            Self::Familiar => Some(Self::Trusted),
            Self::Trusted => None,
        }
    }

    /// Lowercase name, identical to the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stranger => "stranger",
            Self::Acquaintance => "acquaintance",
            Self::Familiar => "familiar",
            Self::Trusted => "trusted",
        }
    }
}

impl fmt::Display for RelationshipPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a phase transition was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionTrigger {
    /// Enough (trust-weighted) interactions accumulated to advance.
    InteractionMilestone,
    /// Inactivity decay lowered trust enough to fall back a phase.
    TrustDecay,
}

// ---------------------------------------------------------------------------
// Episodes
// ---------------------------------------------------------------------------

/// Classification of a remembered episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeType {
    /// An ordinary but memorable exchange.
    #[default]
    General,
    /// The user shared something personal.
    Disclosure,
    /// The user appeared to be at acute risk.
    Crisis,
    /// A relationship milestone.
    Milestone,
    /// The user reached a realization.
    Insight,
}

impl EpisodeType {
    /// Summary prefix for this type; empty for general episodes.
    #[must_use]
    pub fn summary_prefix(self) -> &'static str {
        match self {
            Self::General => "",
            Self::Disclosure => "[Disclosure]",
            Self::Crisis => "[Crisis]",
            Self::Milestone => "[Milestone]",
            Self::Insight => "[Insight]",
        }
    }
}

// ---------------------------------------------------------------------------
// Communication style
// ---------------------------------------------------------------------------

/// Preferred response tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneLevel {
    /// Warm and encouraging.
    Warm,
    /// Calm and professional.
    Professional,
    /// Friendly and casual.
    Casual,
    /// No strong lean.
    #[default]
    Balanced,
}

/// Preferred response depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthLevel {
    /// Short answers.
    Shallow,
    /// Moderate detail.
    #[default]
    Medium,
    /// Detailed answers with examples.
    Deep,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Clamp a score into the unit interval, mapping NaN to zero.
#[must_use]
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Length of a message in characters (not bytes).
#[must_use]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_are_ordered() {
        assert!(RelationshipPhase::Stranger < RelationshipPhase::Acquaintance);
        assert!(RelationshipPhase::Familiar < RelationshipPhase::Trusted);
        assert_eq!(RelationshipPhase::Trusted.next(), None);
    }

    #[test]
    fn enums_serialize_lowercase() {
        let phase = serde_json::to_string(&RelationshipPhase::Acquaintance).expect("ser");
        assert_eq!(phase, "\"acquaintance\"");
        let ty = serde_json::to_string(&EpisodeType::Disclosure).expect("ser");
        assert_eq!(ty, "\"disclosure\"");
        let trigger = serde_json::to_string(&TransitionTrigger::InteractionMilestone).expect("ser");
        assert_eq!(trigger, "\"interaction_milestone\"");
    }

    #[test]
    fn clamp_unit_handles_nan_and_overflow() {
        assert_eq!(clamp_unit(f32::NAN), 0.0);
        assert_eq!(clamp_unit(3.0), 1.0);
        assert_eq!(clamp_unit(-0.5), 0.0);
    }

    #[test]
    fn char_len_counts_scalars() {
        assert_eq!(char_len("こんにちは"), 5);
    }
}
