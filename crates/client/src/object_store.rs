//! Signed uploads against the binary object store
//!
//! The artifact is posted as a multipart form carrying every authorization
//! field the negotiator returned, verbatim, to the resource-type path the
//! authority specified.

use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use url::Url;

use common::filename::strip_trailing_extension;

use crate::config::Config;
use crate::gatekeeper::UploadGrant;
use crate::publish::PublishError;

/// The artifact to upload: bytes plus the derived filename and content type.
#[derive(Debug, Clone)]
pub struct UploadMaterial {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

/// What the object store reports back about a stored artifact. Every field
/// is optional; absent ones stay absent in the metadata record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoredObject {
    #[serde(default)]
    pub secure_url: Option<Url>,
    #[serde(default)]
    pub public_id: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub version: Option<serde_json::Value>,
    #[serde(default)]
    pub original_filename: Option<String>,
}

impl StoredObject {
    /// The store reports `version` as a number; it is stored stringified.
    pub fn version_string(&self) -> Option<String> {
        match &self.version {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadErrorBody {
    #[serde(default)]
    error: Option<UploadErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct UploadErrorMessage {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ObjectStore {
    base: Url,
    cloud_name: String,
    default_folder: Option<String>,
    client: Client,
}

impl ObjectStore {
    pub fn new(config: &Config) -> Self {
        Self {
            base: config.object_store_base.clone(),
            cloud_name: config.cloud_name.clone(),
            default_folder: config.upload_folder.clone(),
            client: Client::new(),
        }
    }

    /// Perform one signed upload.
    ///
    /// `ext_bare` is the normalized bare extension, used to strip a trailing
    /// extension from any requested public id. `fallback_resource_type` is
    /// used when the grant does not name one.
    pub async fn upload(
        &self,
        material: UploadMaterial,
        grant: &UploadGrant,
        ext_bare: &str,
        fallback_resource_type: &str,
    ) -> Result<StoredObject, PublishError> {
        let resource_type = grant
            .resource_type
            .as_deref()
            .unwrap_or(fallback_resource_type);
        let url = self.base.join(&format!(
            "/v1_1/{}/{}/upload",
            self.cloud_name, resource_type
        ))?;

        let filename = material.filename.clone();
        let part = multipart::Part::bytes(material.bytes)
            .file_name(material.filename)
            .mime_str(&material.content_type)?;

        let mut form = multipart::Form::new()
            .part("file", part)
            .text("api_key", grant.api_key.clone())
            .text("timestamp", grant.timestamp.to_string())
            .text("signature", grant.signature.clone());

        if let Some(preset) = &grant.upload_preset {
            form = form.text("upload_preset", preset.clone());
        }
        if let Some(folder) = grant.folder.clone().or_else(|| self.default_folder.clone()) {
            form = form.text("folder", folder);
        }
        if let Some(public_id) = &grant.public_id {
            // the store appends the format itself; a doubled extension here
            // would produce foo.txt.txt object names
            let cleaned = strip_trailing_extension(public_id, ext_bare);
            if !cleaned.is_empty() {
                form = form.text("public_id", cleaned.to_string());
            }
        }
        if let Some(resource_type) = &grant.resource_type {
            form = form.text("resource_type", resource_type.clone());
        }

        tracing::debug!(%url, filename = %filename, "uploading to object store");
        let response = self.client.post(url).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;
        parse_upload_response(status, &body)
    }
}

/// Interpret one object-store response. Pure so the failure contract is
/// unit-testable.
pub(crate) fn parse_upload_response(
    status: StatusCode,
    body: &str,
) -> Result<StoredObject, PublishError> {
    if !status.is_success() {
        let message = serde_json::from_str::<UploadErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .and_then(|e| e.message)
            .unwrap_or_else(|| format!("upload failed with status {}", status));
        return Err(PublishError::Upload { status, message });
    }

    serde_json::from_str(body).map_err(|_| PublishError::Upload {
        status,
        message: format!("unreadable upload response (status {})", status),
    })
}
