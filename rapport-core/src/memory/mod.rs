//! The relationship data model and the [`RelationshipRecord`] aggregate.
//!
//! One record exists per user. It is the unit of persistence: the storage
//! layer saves and loads whole records, serialised as
//! `{ user_key, state, profile, episodes }`.

pub mod episode;
pub mod profile;
pub mod state;

pub use episode::Episode;
pub use profile::{AdaptiveProfile, CommunicationStyle, TopicAffinity};
pub use state::{PhaseTransition, RelationshipState};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RapportError, Result};

/// Everything the engine knows about one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    /// Opaque user identifier; also the storage key.
    pub user_key: String,
    /// Phase, scores, history, facts and topics.
    pub state: RelationshipState,
    /// Learned communication preferences.
    pub profile: AdaptiveProfile,
    /// Remembered episodes in chronological order, capacity-bounded.
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

impl RelationshipRecord {
    /// A fresh record for a user first seen at `now`.
    #[must_use]
    pub fn new(user_key: impl Into<String>, now: DateTime<Utc>) -> Self {
        let user_key = user_key.into();
        Self {
            state: RelationshipState::new(user_key.clone(), now),
            profile: AdaptiveProfile::new(now),
            episodes: Vec::new(),
            user_key,
        }
    }

    /// Serialise to the persisted JSON document.
    ///
    /// # Errors
    /// Returns `RapportError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a persisted JSON document.
    ///
    /// # Errors
    /// Returns `RapportError::Serialization` if the document is malformed or
    /// its two user keys disagree.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str::<Self>(json)?.checked()
    }

    /// Parse a persisted JSON document from raw bytes.
    ///
    /// # Errors
    /// Same as [`Self::from_json`].
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice::<Self>(bytes)?.checked()
    }

    /// `user_key` is duplicated in `state`; a document where they differ is
    /// corrupt.
    fn checked(self) -> Result<Self> {
        if self.user_key != self.state.user_key {
            return Err(RapportError::Serialization(format!(
                "record key {:?} does not match state key {:?}",
                self.user_key, self.state.user_key
            )));
        }
        Ok(self)
    }

    /// The `n` newest episodes, newest first.
    #[must_use]
    pub fn recent_episodes(&self, n: usize) -> Vec<Episode> {
        crate::retrieval::recent_episodes(&self.episodes, n)
    }
}
