//! Password-gated access to published artifacts
//!
//! A requested view/download first passes the local password check, then is
//! redeemed through one of two strategies behind the [`Redeemer`] trait:
//! fetching the stored location directly (incrementing the counter through
//! the metadata store), or delegating to the gatekeeping authority, which
//! re-checks the password and increments the counter itself. Either way a
//! successful redemption increments the counter exactly once.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use url::Url;

use common::record::FileRecord;

use crate::store::MetadataStore;

/// What the caller wants to do with the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessAction {
    View,
    Download,
}

/// Per-record in-flight state, queried by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordActivity {
    #[default]
    Idle,
    Viewing,
    Downloading,
}

/// A successful redemption, tagged by shape so callers branch explicitly
/// instead of probing fields.
#[derive(Debug, Clone)]
pub enum Redemption {
    /// The artifact bytes were streamed back directly
    Stream { bytes: Bytes, filename: String },
    /// A short-lived retrieval location to open
    Location(Url),
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// Recoverable; the caller re-prompts without losing the chosen action
    #[error("incorrect password")]
    WrongPassword,
    /// An action for this record is already in flight
    #[error("record {0} is busy")]
    Busy(String),
    #[error("access denied: {0}")]
    Denied(String),
    /// The record carries no stored retrieval location (direct strategy only)
    #[error("record has no stored retrieval location")]
    MissingLocation,
    #[error("invalid response from gatekeeper: {0}")]
    InvalidResponse(#[source] serde_json::Error),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("metadata store error: {0}")]
    Store(String),
}

/// Converts an authorized request into an actual transfer.
#[async_trait]
pub trait Redeemer: Send + Sync {
    async fn redeem(
        &self,
        record: &FileRecord,
        action: AccessAction,
        entered_password: &str,
    ) -> Result<Redemption, AccessError>;
}

/// Strategy A: fetch the stored location ourselves and increment the
/// download counter through the metadata store.
///
/// The gate has already verified the password locally; nothing re-checks it
/// server-side on this path.
#[derive(Debug, Clone)]
pub struct DirectRedeemer<S: MetadataStore> {
    client: reqwest::Client,
    store: S,
}

impl<S: MetadataStore> DirectRedeemer<S> {
    pub fn new(store: S) -> Self {
        Self {
            client: reqwest::Client::new(),
            store,
        }
    }
}

#[async_trait]
impl<S: MetadataStore> Redeemer for DirectRedeemer<S> {
    async fn redeem(
        &self,
        record: &FileRecord,
        _action: AccessAction,
        _entered_password: &str,
    ) -> Result<Redemption, AccessError> {
        let url = record.url.clone().ok_or(AccessError::MissingLocation)?;

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(AccessError::Denied(format!(
                "fetch failed ({})",
                response.status()
            )));
        }
        let bytes = response.bytes().await?;

        self.store
            .increment_download_count(&record.id)
            .await
            .map_err(|e| AccessError::Store(e.to_string()))?;

        Ok(Redemption::Stream {
            bytes,
            filename: record.filename.clone(),
        })
    }
}

/// The access gate: one in-flight action per record id, password check
/// before any backend contact.
#[derive(Debug)]
pub struct AccessGate<R: Redeemer> {
    redeemer: R,
    activity: Arc<Mutex<HashMap<String, RecordActivity>>>,
}

impl<R: Redeemer> AccessGate<R> {
    pub fn new(redeemer: R) -> Self {
        Self {
            redeemer,
            activity: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Current in-flight state for a record id.
    pub fn activity(&self, id: &str) -> RecordActivity {
        self.activity
            .lock()
            .get(id)
            .copied()
            .unwrap_or(RecordActivity::Idle)
    }

    /// Authorize and redeem one action against a record.
    ///
    /// A second call for the same id while one is outstanding fails with
    /// [`AccessError::Busy`] immediately, without contacting any backend.
    /// Every exit path, success or error, returns the record to `Idle`.
    pub async fn authorize(
        &self,
        record: &FileRecord,
        action: AccessAction,
        entered_password: &str,
    ) -> Result<Redemption, AccessError> {
        let _slot = ActivitySlot::claim(self.activity.clone(), record.id.clone(), action)?;

        if record.is_protected() && !record.password_matches(entered_password) {
            tracing::debug!(id = %record.id, "password mismatch");
            return Err(AccessError::WrongPassword);
        }

        tracing::info!(id = %record.id, ?action, "redeeming");
        self.redeemer.redeem(record, action, entered_password).await
    }
}

/// RAII claim on a record's activity slot; dropping it removes the entry,
/// so no error path leaves the loading state stuck and the map only holds
/// records with an action in flight.
#[derive(Debug)]
struct ActivitySlot {
    map: Arc<Mutex<HashMap<String, RecordActivity>>>,
    id: String,
}

impl ActivitySlot {
    fn claim(
        map: Arc<Mutex<HashMap<String, RecordActivity>>>,
        id: String,
        action: AccessAction,
    ) -> Result<Self, AccessError> {
        {
            let mut guard = map.lock();
            let entry = guard.entry(id.clone()).or_default();
            if *entry != RecordActivity::Idle {
                return Err(AccessError::Busy(id));
            }
            *entry = match action {
                AccessAction::View => RecordActivity::Viewing,
                AccessAction::Download => RecordActivity::Downloading,
            };
        }
        Ok(Self { map, id })
    }
}

impl Drop for ActivitySlot {
    fn drop(&mut self) {
        self.map.lock().remove(&self.id);
    }
}
