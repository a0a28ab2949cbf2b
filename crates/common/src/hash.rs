//! Password sealing using SHA-256
//!
//! The same digest is computed at publish time (to seal the chosen password)
//! and at access time (to verify an entered one), and the two hex strings are
//! compared for exact equality. The empty string is mapped to the empty
//! string rather than to a digest, which is what lets an empty
//! `password_hash` mean "unprotected".
//!
//! Known weakness, kept on purpose: there is no per-record salt, so equal
//! passwords seal to equal digests across records. The scheme is an access
//! gate, not encryption.

use sha2::{Digest, Sha256};

/// Length of a sealed password in hex characters (SHA-256)
pub const SEALED_LEN: usize = 64;

/// Seal a plaintext secret into its stored form.
///
/// Empty input yields the empty string, never a valid digest.
pub fn seal(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Check an entered password against a sealed one.
///
/// An empty `sealed` value means the record is unprotected and every entry
/// (including the empty one) verifies.
pub fn verify(sealed: &str, entered: &str) -> bool {
    if sealed.is_empty() {
        return true;
    }
    sealed == seal(entered)
}
