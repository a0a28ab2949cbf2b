use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use parking_lot::Mutex;
use url::Url;

use common::rate_limit::RateLimitState;
use common::record::FileRecord;

use super::error::NegotiateError;
use super::wire::{parse_negotiation, DenialBody, UploadGrant};
use crate::gate::{AccessAction, AccessError, Redeemer, Redemption};

/// Client for the gatekeeping authority.
///
/// The authority identifies callers out of band; no identity token is sent.
/// Every negotiation response, granted or denied, refreshes the shared
/// [`RateLimitState`].
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    endpoint: Url,
    client: Client,
    limits: Arc<Mutex<RateLimitState>>,
}

impl Gatekeeper {
    pub fn new(endpoint: &Url) -> Result<Self, NegotiateError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            endpoint: endpoint.clone(),
            client,
            limits: Arc::new(Mutex::new(RateLimitState::default())),
        })
    }

    /// Negotiate permission for one upload.
    ///
    /// A grant carrying a warning is the last allowed action in the window;
    /// the caller must confirm before acting on it.
    pub async fn negotiate_upload(&self) -> Result<UploadGrant, NegotiateError> {
        tracing::debug!(endpoint = %self.endpoint, "negotiating upload");
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&serde_json::json!({ "action": "upload" }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let result = parse_negotiation(status, &body);

        match &result {
            Ok(grant) => {
                self.limits
                    .lock()
                    .absorb_grant(grant.remaining, grant.warning.as_deref());
                tracing::info!(remaining = ?grant.remaining, "upload granted");
            }
            Err(NegotiateError::Denied { ban_expires, .. }) => {
                self.limits.lock().absorb_denial(ban_expires.as_deref());
                tracing::warn!(ban_expires = ?ban_expires, "upload denied");
            }
            // quota state is absorbed from every parseable 200, even one
            // that cannot authorize an upload
            Err(NegotiateError::IncompleteGrant { remaining, warning }) => {
                self.limits
                    .lock()
                    .absorb_grant(*remaining, warning.as_deref());
                tracing::warn!("incomplete grant from gatekeeper");
            }
            Err(_) => {}
        }

        result
    }

    /// Snapshot of the rate-limit/ban state from the most recent
    /// negotiation.
    pub fn rate_limit(&self) -> RateLimitState {
        self.limits.lock().clone()
    }
}

/// Pull a quoted filename out of a `Content-Disposition` header value.
pub(crate) fn filename_from_disposition(disposition: &str) -> Option<String> {
    let (_, tail) = disposition.split_once("filename=\"")?;
    let (name, _) = tail.split_once('"')?;
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Strategy B: the authority re-checks the password server-side, increments
/// the download counter itself, and answers with either the streamed bytes
/// or a short-lived retrieval location.
#[async_trait]
impl Redeemer for Gatekeeper {
    async fn redeem(
        &self,
        record: &FileRecord,
        _action: AccessAction,
        entered_password: &str,
    ) -> Result<Redemption, AccessError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&serde_json::json!({
                "action": "download",
                "fileId": record.id,
                "enteredPassword": entered_password,
            }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AccessError::WrongPassword);
        }
        if !status.is_success() {
            let body = response.text().await?;
            let reason = serde_json::from_str::<DenialBody>(&body)
                .ok()
                .and_then(|d| d.error)
                .unwrap_or_else(|| format!("download failed ({})", status));
            return Err(AccessError::Denied(reason));
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("application/json"))
            .unwrap_or(false);

        if is_json {
            #[derive(serde::Deserialize)]
            struct LocationBody {
                url: Url,
            }
            let body = response.text().await?;
            let located: LocationBody =
                serde_json::from_str(&body).map_err(AccessError::InvalidResponse)?;
            Ok(Redemption::Location(located.url))
        } else {
            let filename = response
                .headers()
                .get(CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok())
                .and_then(filename_from_disposition)
                .unwrap_or_else(|| record.filename.clone());
            let bytes = response.bytes().await?;
            Ok(Redemption::Stream { bytes, filename })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_quoted_disposition_filename() {
        assert_eq!(
            filename_from_disposition("attachment; filename=\"notes.txt\"").as_deref(),
            Some("notes.txt")
        );
        assert_eq!(filename_from_disposition("inline"), None);
        assert_eq!(filename_from_disposition("attachment; filename=\"\""), None);
    }
}
