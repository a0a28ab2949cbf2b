//! Access gate decision table, counter invariants, and per-record
//! exclusivity

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Notify;

use client::gate::{AccessAction, AccessError, AccessGate, RecordActivity, Redeemer, Redemption};
use client::store::{MemoryMetadataStore, MetadataStore};
use common::hash;
use common::record::FileRecord;

/// Redeemer standing in for the direct-fetch strategy: counts calls,
/// optionally parks until released, and increments the download counter
/// through the store like `DirectRedeemer` does.
#[derive(Debug, Clone)]
struct StubRedeemer {
    store: MemoryMetadataStore,
    calls: Arc<AtomicUsize>,
    hold: Option<Arc<Notify>>,
}

impl StubRedeemer {
    fn new(store: MemoryMetadataStore) -> Self {
        Self {
            store,
            calls: Arc::new(AtomicUsize::new(0)),
            hold: None,
        }
    }

    fn holding(store: MemoryMetadataStore, hold: Arc<Notify>) -> Self {
        Self {
            store,
            calls: Arc::new(AtomicUsize::new(0)),
            hold: Some(hold),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Redeemer for StubRedeemer {
    async fn redeem(
        &self,
        record: &FileRecord,
        _action: AccessAction,
        _entered_password: &str,
    ) -> Result<Redemption, AccessError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hold) = &self.hold {
            hold.notified().await;
        }
        self.store
            .increment_download_count(&record.id)
            .await
            .map_err(|e| AccessError::Store(e.to_string()))?;
        Ok(Redemption::Stream {
            bytes: Bytes::from_static(b"data"),
            filename: record.filename.clone(),
        })
    }
}

async fn stored_record(store: &MemoryMetadataStore, password_hash: &str) -> FileRecord {
    let id = store
        .append(support::new_record("notes", password_hash))
        .await
        .unwrap();
    store.get(&id).await.unwrap()
}

#[tokio::test]
async fn unprotected_record_proceeds_without_a_password() {
    let store = MemoryMetadataStore::new();
    let record = stored_record(&store, "").await;
    let gate = AccessGate::new(StubRedeemer::new(store.clone()));

    assert!(gate
        .authorize(&record, AccessAction::View, "")
        .await
        .is_ok());
    assert!(gate
        .authorize(&record, AccessAction::Download, "")
        .await
        .is_ok());
    assert_eq!(store.get(&record.id).await.unwrap().download_count, 2);
}

#[tokio::test]
async fn correct_password_redeems_and_increments_exactly_once() {
    let store = MemoryMetadataStore::new();
    let record = stored_record(&store, &hash::seal("secret1")).await;
    let redeemer = StubRedeemer::new(store.clone());
    let gate = AccessGate::new(redeemer.clone());

    let outcome = gate
        .authorize(&record, AccessAction::Download, "secret1")
        .await
        .unwrap();
    assert!(matches!(outcome, Redemption::Stream { .. }));
    assert_eq!(redeemer.calls(), 1);
    assert_eq!(store.get(&record.id).await.unwrap().download_count, 1);
}

#[tokio::test]
async fn wrong_password_rejects_without_touching_the_backend() {
    let store = MemoryMetadataStore::new();
    let record = stored_record(&store, &hash::seal("secret1")).await;
    let redeemer = StubRedeemer::new(store.clone());
    let gate = AccessGate::new(redeemer.clone());

    let err = gate
        .authorize(&record, AccessAction::Download, "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::WrongPassword));
    assert_eq!(redeemer.calls(), 0);
    assert_eq!(store.get(&record.id).await.unwrap().download_count, 0);

    // the caller can retry the same action immediately
    gate.authorize(&record, AccessAction::Download, "secret1")
        .await
        .unwrap();
    assert_eq!(store.get(&record.id).await.unwrap().download_count, 1);
}

#[tokio::test]
async fn concurrent_action_on_the_same_record_is_rejected_immediately() {
    let store = MemoryMetadataStore::new();
    let record = stored_record(&store, "").await;
    let hold = Arc::new(Notify::new());
    let redeemer = StubRedeemer::holding(store.clone(), hold.clone());
    let gate = Arc::new(AccessGate::new(redeemer.clone()));

    let first = {
        let gate = gate.clone();
        let record = record.clone();
        tokio::spawn(async move {
            gate.authorize(&record, AccessAction::Download, "")
                .await
        })
    };

    // wait until the first action is parked inside the redeemer
    while redeemer.calls() == 0 {
        tokio::task::yield_now().await;
    }
    assert_eq!(gate.activity(&record.id), RecordActivity::Downloading);

    let err = gate
        .authorize(&record, AccessAction::View, "")
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Busy(_)));
    assert_eq!(redeemer.calls(), 1);

    hold.notify_one();
    first.await.unwrap().unwrap();
    assert_eq!(gate.activity(&record.id), RecordActivity::Idle);
    assert_eq!(store.get(&record.id).await.unwrap().download_count, 1);

    // the slot is free again once the first action resolved
    hold.notify_one();
    gate.authorize(&record, AccessAction::View, "")
        .await
        .unwrap();
    assert_eq!(store.get(&record.id).await.unwrap().download_count, 2);
}

#[tokio::test]
async fn failed_redemption_returns_the_record_to_idle() {
    #[derive(Debug)]
    struct FailingRedeemer;

    #[async_trait]
    impl Redeemer for FailingRedeemer {
        async fn redeem(
            &self,
            _record: &FileRecord,
            _action: AccessAction,
            _entered_password: &str,
        ) -> Result<Redemption, AccessError> {
            Err(AccessError::Denied("backend unavailable".to_string()))
        }
    }

    let store = MemoryMetadataStore::new();
    let record = stored_record(&store, "").await;
    let gate = AccessGate::new(FailingRedeemer);

    let err = gate
        .authorize(&record, AccessAction::Download, "")
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Denied(_)));
    assert_eq!(gate.activity(&record.id), RecordActivity::Idle);
}
