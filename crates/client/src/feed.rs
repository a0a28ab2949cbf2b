//! Live listing of published records
//!
//! Wraps the store's snapshot subscription. Snapshots arrive in
//! store-assigned order and each one fully replaces the last; filtering is a
//! pure view over the current snapshot and never mutates it.

use tokio::sync::watch;

use common::record::FileRecord;

use crate::store::MetadataStore;

/// Case-insensitive substring match over title and description. An empty
/// query matches everything.
pub fn matches_query(record: &FileRecord, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let query = query.to_lowercase();
    record.title.to_lowercase().contains(&query)
        || record.description.to_lowercase().contains(&query)
}

/// A live, order-preserving view of all published records.
#[derive(Debug)]
pub struct ListingFeed {
    rx: watch::Receiver<Vec<FileRecord>>,
}

impl ListingFeed {
    pub fn new(rx: watch::Receiver<Vec<FileRecord>>) -> Self {
        Self { rx }
    }

    pub fn from_store<S: MetadataStore>(store: &S) -> Self {
        Self::new(store.subscribe())
    }

    /// The latest snapshot, newest records first.
    pub fn current(&self) -> Vec<FileRecord> {
        self.rx.borrow().clone()
    }

    /// The latest snapshot filtered by a search query, order preserved.
    pub fn filtered(&self, query: &str) -> Vec<FileRecord> {
        self.rx
            .borrow()
            .iter()
            .filter(|record| matches_query(record, query))
            .cloned()
            .collect()
    }

    /// Wait for the next snapshot. Errors only when the store is gone.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }
}
