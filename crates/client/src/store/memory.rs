use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use uuid::Uuid;

use common::record::{FileRecord, NewFileRecord};

use super::provider::{MetadataStore, StoreError};

/// In-memory metadata store using HashMaps
///
/// Used by tests and local runs in place of the hosted document collection.
#[derive(Debug, Clone)]
pub struct MemoryMetadataStore {
    inner: Arc<RwLock<MemoryMetadataStoreInner>>,
    snapshot_tx: Arc<watch::Sender<Vec<FileRecord>>>,
}

#[derive(Debug, Default)]
struct MemoryMetadataStoreInner {
    /// Records keyed by generated id
    records: HashMap<String, FileRecord>,
    /// Insertion order per id, the tie-break for equal creation times
    insertion_order: HashMap<String, u64>,
    next_seq: u64,
}

impl MemoryMetadataStoreInner {
    /// Full collection ordered by `createdAt` descending, later insertions
    /// first among ties.
    fn snapshot(&self) -> Vec<FileRecord> {
        let mut entries: Vec<(u64, &FileRecord)> = self
            .records
            .iter()
            .map(|(id, record)| (self.insertion_order[id], record))
            .collect();
        entries.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| seq_b.cmp(seq_a))
        });
        entries.into_iter().map(|(_, record)| record.clone()).collect()
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryMetadataStoreError {
    #[error("memory store error: {0}")]
    Internal(String),
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        let (snapshot_tx, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(RwLock::new(MemoryMetadataStoreInner::default())),
            snapshot_tx: Arc::new(snapshot_tx),
        }
    }

    /// Append with an explicit creation instant. Lets tests pin the sort key.
    pub fn append_at(
        &self,
        record: NewFileRecord,
        created_at: DateTime<Utc>,
    ) -> Result<String, StoreError<MemoryMetadataStoreError>> {
        let mut inner = self.inner.write().map_err(|e| {
            StoreError::Provider(MemoryMetadataStoreError::Internal(format!(
                "failed to acquire write lock: {}",
                e
            )))
        })?;

        let id = Uuid::new_v4().to_string();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.insertion_order.insert(id.clone(), seq);
        inner
            .records
            .insert(id.clone(), record.into_record(id.clone(), created_at));

        self.snapshot_tx.send_replace(inner.snapshot());
        Ok(id)
    }
}

impl Default for MemoryMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    type Error = MemoryMetadataStoreError;

    async fn append(&self, record: NewFileRecord) -> Result<String, StoreError<Self::Error>> {
        self.append_at(record, Utc::now())
    }

    async fn get(&self, id: &str) -> Result<FileRecord, StoreError<Self::Error>> {
        let inner = self.inner.read().map_err(|e| {
            StoreError::Provider(MemoryMetadataStoreError::Internal(format!(
                "failed to acquire read lock: {}",
                e
            )))
        })?;

        inner
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn increment_download_count(&self, id: &str) -> Result<u64, StoreError<Self::Error>> {
        let mut inner = self.inner.write().map_err(|e| {
            StoreError::Provider(MemoryMetadataStoreError::Internal(format!(
                "failed to acquire write lock: {}",
                e
            )))
        })?;

        let record = inner
            .records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.download_count += 1;
        let count = record.download_count;

        self.snapshot_tx.send_replace(inner.snapshot());
        Ok(count)
    }

    fn subscribe(&self) -> watch::Receiver<Vec<FileRecord>> {
        self.snapshot_tx.subscribe()
    }
}
