//! Client-held view of the gatekeeper's sliding-window quota
//!
//! The gatekeeper is the sole source of truth for quota; this state is
//! recomputed from every negotiation response, granted or denied, and is
//! discarded with the process.

/// Ephemeral rate-limit/ban state derived from gatekeeper responses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitState {
    /// Quota left in the current window, `None` when unknown
    pub remaining: Option<i64>,
    /// Advisory message from the gatekeeper, empty when none
    pub warning: String,
    /// Literal ban expiry string from the most recent denial, surfaced
    /// verbatim; `None` when the last negotiation was not a ban
    pub ban_expires: Option<String>,
}

impl RateLimitState {
    /// Absorb the advisory fields of a granted negotiation.
    ///
    /// Both fields are replaced unconditionally: an absent warning clears a
    /// previous one, and a grant clears any earlier ban.
    pub fn absorb_grant(&mut self, remaining: Option<i64>, warning: Option<&str>) {
        self.remaining = remaining;
        self.warning = warning.unwrap_or_default().to_string();
        self.ban_expires = None;
    }

    /// Record a denial, keeping the authority's expiry string untouched.
    pub fn absorb_denial(&mut self, ban_expires: Option<&str>) {
        self.remaining = Some(0);
        self.ban_expires = ban_expires.map(str::to_string);
    }

    pub fn is_banned(&self) -> bool {
        self.ban_expires.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_replaces_previous_state() {
        let mut state = RateLimitState::default();
        state.absorb_grant(Some(4), Some("last upload in window"));
        assert_eq!(state.remaining, Some(4));
        assert_eq!(state.warning, "last upload in window");

        state.absorb_grant(None, None);
        assert_eq!(state.remaining, None);
        assert!(state.warning.is_empty());
    }

    #[test]
    fn denial_records_verbatim_expiry_and_grant_clears_it() {
        let mut state = RateLimitState::default();
        state.absorb_denial(Some("2025-01-01T00:00:00Z"));
        assert!(state.is_banned());
        assert_eq!(state.remaining, Some(0));
        assert_eq!(state.ban_expires.as_deref(), Some("2025-01-01T00:00:00Z"));

        state.absorb_grant(Some(5), None);
        assert!(!state.is_banned());
    }
}
