//! In-memory store.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::Result;
use crate::memory::RelationshipRecord;
use crate::persistence::RelationshipStore;

/// A [`RelationshipStore`] backed by a process-local map of JSON documents.
///
/// Records are stored serialised, not as live values, so loads always hand
/// out independent copies and exercise the same encoding as SQLite.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl RelationshipStore for MemoryStore {
    fn load(&self, user_key: &str) -> Result<Option<RelationshipRecord>> {
        let records = self.records.read();
        records
            .get(user_key)
            .map(|json| RelationshipRecord::from_json(json))
            .transpose()
    }

    fn save(&self, record: &RelationshipRecord) -> Result<()> {
        let json = record.to_json()?;
        self.records.write().insert(record.user_key.clone(), json);
        Ok(())
    }

    fn delete(&self, user_key: &str) -> Result<bool> {
        Ok(self.records.write().remove(user_key).is_some())
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.records.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn save_load_delete() {
        let store = MemoryStore::new();
        let mut record = RelationshipRecord::new("alice", Utc::now());
        record.state.total_interactions = 3;

        assert!(store.load("alice").expect("load").is_none());
        store.save(&record).expect("save");
        assert_eq!(store.load("alice").expect("load"), Some(record));
        assert_eq!(store.list_keys().expect("keys"), vec!["alice".to_string()]);
        assert_eq!(store.len(), 1);

        assert!(store.delete("alice").expect("delete"));
        assert!(!store.delete("alice").expect("delete again"));
        assert!(store.is_empty());
    }

    #[test]
    fn loads_are_independent_copies() {
        let store = MemoryStore::new();
        store.save(&RelationshipRecord::new("bob", Utc::now())).expect("save");
        let mut first = store.load("bob").expect("load").expect("Some");
        first.state.trust_score = 0.9;
        let second = store.load("bob").expect("load").expect("Some");
        assert_eq!(second.state.trust_score, 0.0);
    }
}
