//! The publish pipeline
//!
//! Hash the password, negotiate with the gatekeeper, pause for caller
//! confirmation when the grant carries a last-action warning, perform the
//! signed upload, then append the metadata record. A declined confirmation
//! leaves no side effect; a failed upload writes no metadata.

use std::path::Path;

use reqwest::StatusCode;

use common::filename::{normalize_extension, storage_filename, strip_trailing_extension};
use common::hash;
use common::record::{NewFileRecord, MAX_DESCRIPTION_LEN};

use crate::config::{Config, ConfigError};
use crate::gatekeeper::{Gatekeeper, NegotiateError, UploadGrant};
use crate::object_store::{ObjectStore, StoredObject, UploadMaterial};
use crate::store::MetadataStore;

/// Default resource type for text snippets
const SNIPPET_RESOURCE_TYPE: &str = "raw";
/// Default resource type for binary files (the store sniffs the real one)
const FILE_RESOURCE_TYPE: &str = "auto";

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Negotiate(#[from] NegotiateError),
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("snippet body must not be empty")]
    EmptyBody,
    #[error("no file content provided")]
    EmptyFile,
    #[error("description exceeds {} characters", MAX_DESCRIPTION_LEN)]
    DescriptionTooLong,
    #[error("object store rejected the upload: {message}")]
    Upload { status: StatusCode, message: String },
    #[error("invalid upload URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The upload succeeded but the metadata append did not; the stored
    /// object is orphaned and nothing is rolled back.
    #[error("metadata write failed after upload: {0}")]
    Store(String),
}

/// A text snippet to publish.
#[derive(Debug, Clone)]
pub struct SnippetDraft {
    pub title: String,
    pub body: String,
    /// Raw extension input, e.g. `".txt"`, `"rs"`; empty falls back to `txt`
    pub extension: String,
    /// Defaults to a generated `Text snippet (.ext)` description
    pub description: Option<String>,
    /// Empty means unprotected
    pub password: String,
}

/// A binary file to publish.
#[derive(Debug, Clone)]
pub struct FileDraft {
    pub title: String,
    pub description: String,
    /// Original filename including extension
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Empty means unprotected
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published { id: String },
    /// The caller declined the last-action confirmation; nothing was
    /// uploaded or written
    Cancelled,
}

/// Orchestrates negotiate → confirm → upload → append.
#[derive(Debug)]
pub struct Publisher<S: MetadataStore> {
    gatekeeper: Gatekeeper,
    objects: ObjectStore,
    store: S,
}

impl<S: MetadataStore> Publisher<S> {
    pub fn new(config: &Config, store: S) -> Result<Self, PublishError> {
        Ok(Self {
            gatekeeper: Gatekeeper::new(&config.gatekeeper_url)?,
            objects: ObjectStore::new(config),
            store,
        })
    }

    /// The negotiating gatekeeper, for querying rate-limit state.
    pub fn gatekeeper(&self) -> &Gatekeeper {
        &self.gatekeeper
    }

    /// Publish a text snippet.
    ///
    /// `confirm` is invoked with the warning text and the remaining quota
    /// when the grant is the last allowed action in the window; returning
    /// `false` cancels the publish with no side effect.
    pub async fn publish_snippet(
        &self,
        draft: SnippetDraft,
        confirm: impl FnOnce(&str, Option<i64>) -> bool,
    ) -> Result<PublishOutcome, PublishError> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(PublishError::EmptyTitle);
        }
        if draft.body.is_empty() {
            return Err(PublishError::EmptyBody);
        }
        if let Some(description) = &draft.description {
            if description.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(PublishError::DescriptionTooLong);
            }
        }

        let ext = normalize_extension(&draft.extension);
        let filename = storage_filename(&title, &draft.extension);
        let description = draft
            .description
            .unwrap_or_else(|| format!("Text snippet ({})", ext.dotted));

        let grant = self.negotiate_confirmed(confirm).await?;
        let Some(grant) = grant else {
            return Ok(PublishOutcome::Cancelled);
        };

        let material = UploadMaterial {
            bytes: draft.body.into_bytes(),
            filename: filename.clone(),
            content_type: "text/plain".to_string(),
        };
        let stored = self
            .objects
            .upload(material, &grant, &ext.bare, SNIPPET_RESOURCE_TYPE)
            .await?;

        let requested_type = grant
            .resource_type
            .as_deref()
            .unwrap_or(SNIPPET_RESOURCE_TYPE);
        let record = build_record(
            title,
            description,
            filename,
            &ext.bare,
            requested_type,
            &stored,
            &draft.password,
        );
        self.append(record).await
    }

    /// Publish a binary file. The extension is taken from the original
    /// filename, the content type guessed from it.
    pub async fn publish_file(
        &self,
        draft: FileDraft,
        confirm: impl FnOnce(&str, Option<i64>) -> bool,
    ) -> Result<PublishOutcome, PublishError> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(PublishError::EmptyTitle);
        }
        if draft.bytes.is_empty() {
            return Err(PublishError::EmptyFile);
        }
        if draft.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(PublishError::DescriptionTooLong);
        }

        let raw_ext = Path::new(&draft.filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let ext = normalize_extension(raw_ext);
        let filename = storage_filename(&title, raw_ext);
        let content_type = mime_guess::from_path(&draft.filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        let grant = self.negotiate_confirmed(confirm).await?;
        let Some(grant) = grant else {
            return Ok(PublishOutcome::Cancelled);
        };

        let material = UploadMaterial {
            bytes: draft.bytes,
            filename: filename.clone(),
            content_type,
        };
        let stored = self
            .objects
            .upload(material, &grant, &ext.bare, FILE_RESOURCE_TYPE)
            .await?;

        let requested_type = grant.resource_type.as_deref().unwrap_or(FILE_RESOURCE_TYPE);
        let record = build_record(
            title,
            draft.description,
            filename,
            &ext.bare,
            requested_type,
            &stored,
            &draft.password,
        );
        self.append(record).await
    }

    /// Negotiate, pausing for confirmation on a last-action warning.
    /// `Ok(None)` means the caller declined.
    async fn negotiate_confirmed(
        &self,
        confirm: impl FnOnce(&str, Option<i64>) -> bool,
    ) -> Result<Option<UploadGrant>, PublishError> {
        let grant = self.gatekeeper.negotiate_upload().await?;
        if let Some(warning) = &grant.warning {
            if !confirm(warning, grant.remaining) {
                tracing::info!("publish cancelled at last-action warning");
                return Ok(None);
            }
        }
        Ok(Some(grant))
    }

    async fn append(&self, record: NewFileRecord) -> Result<PublishOutcome, PublishError> {
        let id = self
            .store
            .append(record)
            .await
            .map_err(|e| PublishError::Store(e.to_string()))?;
        tracing::info!(%id, "published");
        Ok(PublishOutcome::Published { id })
    }
}

/// Assemble the metadata record from the store's response.
///
/// Store-omitted fields stay absent; `format` and `resource_type` fall back
/// to what was requested, and the public id loses a matching trailing
/// extension the same way the storage filename derivation strips one.
fn build_record(
    title: String,
    description: String,
    filename: String,
    ext_bare: &str,
    requested_resource_type: &str,
    stored: &StoredObject,
    password: &str,
) -> NewFileRecord {
    let public_id = stored
        .public_id
        .as_deref()
        .map(|pid| strip_trailing_extension(pid, ext_bare))
        .filter(|pid| !pid.is_empty())
        .map(str::to_string);

    NewFileRecord {
        title,
        description,
        filename,
        url: stored.secure_url.clone(),
        public_id,
        format: Some(
            stored
                .format
                .clone()
                .unwrap_or_else(|| ext_bare.to_string()),
        ),
        resource_type: Some(
            stored
                .resource_type
                .clone()
                .unwrap_or_else(|| requested_resource_type.to_string()),
        ),
        version: stored.version_string(),
        password_hash: hash::seal(password),
        download_count: 0,
    }
}
