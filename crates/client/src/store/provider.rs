use std::fmt::{Debug, Display};

use async_trait::async_trait;
use tokio::sync::watch;

use common::record::{FileRecord, NewFileRecord};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError<T> {
    #[error("metadata store provider error: {0}")]
    Provider(#[from] T),
    /// No record exists under the given id
    #[error("record not found: {0}")]
    NotFound(String),
}

/// An ordered document collection holding the published-artifact metadata.
///
/// The collection is keyed by store-generated id, sorted by creation time
/// descending with ties broken by insertion order, and pushes full snapshots
/// to subscribers on every change.
#[async_trait]
pub trait MetadataStore: Send + Sync + Debug + Clone + 'static {
    type Error: Display + Debug + Send + Sync;

    /// Append a new record; the store assigns the id and stamps `createdAt`.
    ///
    /// # Returns
    /// * `Ok(String)` - The generated id of the stored record
    async fn append(&self, record: NewFileRecord) -> Result<String, StoreError<Self::Error>>;

    /// Fetch a single record by id.
    async fn get(&self, id: &str) -> Result<FileRecord, StoreError<Self::Error>>;

    /// Atomically add one to a record's download counter.
    ///
    /// # Returns
    /// * `Ok(u64)` - The counter value after the increment
    async fn increment_download_count(&self, id: &str) -> Result<u64, StoreError<Self::Error>>;

    /// Subscribe to live snapshots of the full, ordered collection.
    ///
    /// Later snapshots fully replace earlier ones; subscribers must apply
    /// them in delivery order.
    fn subscribe(&self) -> watch::Receiver<Vec<FileRecord>>;
}
