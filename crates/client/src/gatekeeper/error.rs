fn ban_suffix(ban_expires: &Option<String>) -> String {
    match ban_expires {
        Some(at) => format!(" Ban expires: {}", at),
        None => String::new(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NegotiateError {
    /// The authority rejected the negotiation. The ban expiry, when present,
    /// is the authority's literal string and is rendered verbatim.
    #[error("{reason}{}", ban_suffix(.ban_expires))]
    Denied {
        reason: String,
        ban_expires: Option<String>,
    },
    /// The response body was not the JSON the contract promises. Distinct
    /// from an HTTP-level denial.
    #[error("invalid response from gatekeeper: {0}")]
    InvalidResponse(#[source] serde_json::Error),
    /// A 200 response missing one of signature/timestamp/api_key. The
    /// advisory fields that did parse are carried so quota state can still
    /// be absorbed from the response.
    #[error("incomplete signed data received from gatekeeper")]
    IncompleteGrant {
        remaining: Option<i64>,
        warning: Option<String>,
    },
    #[error("gatekeeper request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
