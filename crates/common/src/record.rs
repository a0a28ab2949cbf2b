//! Data model for published artifacts
//!
//! A [`FileRecord`] is created once by a successful publish and never edited
//! afterwards except for its download counter. Wire names follow the stored
//! document format: camelCase for the core fields, snake_case for the fields
//! copied through from the object store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::hash;

/// Client-enforced cap on the free-text description
pub const MAX_DESCRIPTION_LEN: usize = 100;

/// One published artifact, as read back from the metadata store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Store-assigned opaque identifier, stable for the record's lifetime
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub filename: String,
    /// Secure retrieval location, when the object store returned one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
    /// Object-store public id, stored without its extension
    #[serde(default, rename = "public_id", skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, rename = "resource_type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Sealed password; empty means unprotected
    #[serde(default, rename = "passwordHash")]
    pub password_hash: String,
    #[serde(rename = "downloadCount")]
    pub download_count: u64,
    /// Store-stamped creation instant, the feed's sole sort key
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn is_protected(&self) -> bool {
        !self.password_hash.is_empty()
    }

    /// Verify an entered password against the sealed one.
    pub fn password_matches(&self, entered: &str) -> bool {
        hash::verify(&self.password_hash, entered)
    }
}

/// The append payload for a new record.
///
/// The store assigns `id` and stamps `createdAt`; fields the object store
/// omitted are absent here and must stay absent in the stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFileRecord {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
    #[serde(default, rename = "public_id", skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, rename = "resource_type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, rename = "passwordHash")]
    pub password_hash: String,
    #[serde(rename = "downloadCount")]
    pub download_count: u64,
}

impl NewFileRecord {
    /// Promote the payload to a full record with store-assigned identity.
    pub fn into_record(self, id: String, created_at: DateTime<Utc>) -> FileRecord {
        FileRecord {
            id,
            title: self.title,
            description: self.description,
            filename: self.filename,
            url: self.url,
            public_id: self.public_id,
            format: self.format,
            resource_type: self.resource_type,
            version: self.version,
            password_hash: self.password_hash,
            download_count: self.download_count,
            created_at,
        }
    }
}
