//! Persistence for relationship records.
//!
//! The orchestrator only talks to the [`RelationshipStore`] trait: whole
//! records are loaded and saved by user key, nothing finer-grained. Two
//! backends ship with the crate:
//!
//! - [`SqliteStore`]: durable, one row per user, JSON document per row.
//! - [`MemoryStore`]: process-local map, for tests and ephemeral sessions.
//!
//! Both serialise records to the same JSON document, so a record written
//! by one can be read by the other.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::memory::RelationshipRecord;

/// Load/save-by-key storage for relationship records.
///
/// Implementations must be internally synchronised; the orchestrator shares
/// one store across threads. Not-found is `Ok(None)` / `Ok(false)`, never an
/// error.
pub trait RelationshipStore: Send + Sync {
    /// Load the record for `user_key`, if one exists.
    ///
    /// # Errors
    /// Returns an error if the backend fails or the stored document is
    /// malformed.
    fn load(&self, user_key: &str) -> Result<Option<RelationshipRecord>>;

    /// Insert or replace the record under `record.user_key`.
    ///
    /// # Errors
    /// Returns an error if the backend fails or the record cannot be encoded.
    fn save(&self, record: &RelationshipRecord) -> Result<()>;

    /// Remove the record for `user_key`. Returns `true` if one existed.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    fn delete(&self, user_key: &str) -> Result<bool>;

    /// Every stored user key, in unspecified order.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    fn list_keys(&self) -> Result<Vec<String>>;
}
