//! Wire contract of the gatekeeping authority
//!
//! Parsing is a pure function of `(status, body)` so the contract can be
//! exercised without a live authority. Malformed JSON is reported as
//! [`NegotiateError::InvalidResponse`], never conflated with a denial.

use reqwest::StatusCode;
use serde::Deserialize;

use super::error::NegotiateError;

/// Everything required to perform one signed upload, as granted by the
/// gatekeeping authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadGrant {
    pub signature: String,
    pub timestamp: i64,
    pub api_key: String,
    pub upload_preset: Option<String>,
    pub folder: Option<String>,
    /// Requested object id; any trailing extension is stripped before use
    pub public_id: Option<String>,
    pub resource_type: Option<String>,
    /// Present when this is the last allowed action in the window; the
    /// caller must confirm before the upload proceeds
    pub warning: Option<String>,
    /// Quota left in the window after this action, when communicated
    pub remaining: Option<i64>,
}

impl UploadGrant {
    /// Whether the authority flagged this as the last allowed action,
    /// requiring explicit caller confirmation.
    pub fn requires_confirmation(&self) -> bool {
        self.warning.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct RawGrant {
    signature: Option<String>,
    timestamp: Option<i64>,
    api_key: Option<String>,
    #[serde(default)]
    upload_preset: Option<String>,
    #[serde(default)]
    folder: Option<String>,
    #[serde(default)]
    public_id: Option<String>,
    #[serde(default)]
    resource_type: Option<String>,
    #[serde(default)]
    warning: Option<String>,
    #[serde(default)]
    remaining: Option<serde_json::Value>,
}

/// Error body of a non-2xx authority response.
#[derive(Debug, Deserialize)]
pub(crate) struct DenialBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, rename = "banExpires")]
    pub ban_expires: Option<String>,
}

/// The authority reports `remaining` as a number or, from some deployments,
/// a numeric string. Anything else counts as unknown.
fn remaining_count(value: Option<&serde_json::Value>) -> Option<i64> {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Interpret one negotiation response.
pub(crate) fn parse_negotiation(
    status: StatusCode,
    body: &str,
) -> Result<UploadGrant, NegotiateError> {
    if !status.is_success() {
        let denial: DenialBody =
            serde_json::from_str(body).map_err(NegotiateError::InvalidResponse)?;
        return Err(NegotiateError::Denied {
            reason: denial
                .error
                .unwrap_or_else(|| "Server permission denied.".to_string()),
            ban_expires: denial.ban_expires,
        });
    }

    let raw: RawGrant = serde_json::from_str(body).map_err(NegotiateError::InvalidResponse)?;
    let remaining = remaining_count(raw.remaining.as_ref());
    match (raw.signature, raw.timestamp, raw.api_key) {
        (Some(signature), Some(timestamp), Some(api_key)) => Ok(UploadGrant {
            signature,
            timestamp,
            api_key,
            upload_preset: raw.upload_preset,
            folder: raw.folder,
            public_id: raw.public_id,
            resource_type: raw.resource_type,
            warning: raw.warning,
            remaining,
        }),
        _ => Err(NegotiateError::IncompleteGrant {
            remaining,
            warning: raw.warning,
        }),
    }
}
