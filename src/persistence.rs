//! Persistence collaborator interface.
//!
//! The engine never owns a database. Whatever actually stores records
//! (flat files, a document store, a SQL table) sits behind [`ClaimStorage`]
//! and is injected by the embedding host. [`MemoryStorage`] is the
//! reference implementation used by tests and simple embeddings.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::error::ClaimError;

#[async_trait]
pub trait ClaimStorage: Send + Sync {
    /// Durably write one claim record. The store clears the claim's dirty
    /// marker only after this returns `Ok`.
    async fn write_claim_record(&self, id: Uuid, record: Value) -> Result<(), ClaimError>;

    /// All records for a world, read once at startup.
    async fn read_all_claim_records(&self, world_id: Uuid) -> Result<Vec<Value>, ClaimError>;
}

/// In-memory storage backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: DashMap<Uuid, Value>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail. Lets tests exercise the
    /// dirty-stays-set contract.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn record(&self, id: &Uuid) -> Option<Value> {
        self.records.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Seed a record directly, e.g. a legacy fixture.
    pub fn insert_record(&self, id: Uuid, record: Value) {
        self.records.insert(id, record);
    }
}

#[async_trait]
impl ClaimStorage for MemoryStorage {
    async fn write_claim_record(&self, id: Uuid, record: Value) -> Result<(), ClaimError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ClaimError::PersistenceFailure(
                "memory storage configured to fail writes".into(),
            ));
        }
        self.records.insert(id, record);
        Ok(())
    }

    async fn read_all_claim_records(&self, world_id: Uuid) -> Result<Vec<Value>, ClaimError> {
        let world = Value::String(world_id.to_string());
        Ok(self
            .records
            .iter()
            .filter(|entry| entry.value().get("world-uuid") == Some(&world))
            .map(|entry| entry.value().clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_and_read_back() {
        let storage = MemoryStorage::new();
        let id = Uuid::new_v4();
        let world = Uuid::new_v4();
        let record = serde_json::json!({ "uuid": id, "world-uuid": world });

        storage.write_claim_record(id, record.clone()).await.unwrap();
        let records = storage.read_all_claim_records(world).await.unwrap();
        assert_eq!(records, vec![record]);

        // Other worlds see nothing.
        let other = storage.read_all_claim_records(Uuid::new_v4()).await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        let err = storage
            .write_claim_record(Uuid::new_v4(), serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::PersistenceFailure(_)));
        assert!(storage.is_empty());
    }
}
