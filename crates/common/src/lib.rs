/**
 * Password sealing and verification.
 *  A sealed password is a one-way digest stored
 *  in place of the plaintext; the empty string
 *  means "unprotected".
 */
pub mod hash;
/**
 * Storage filename derivation.
 *  Normalizes user-supplied extensions and titles
 *  into a single safe filename, shared by every
 *  publish path.
 */
pub mod filename;
/**
 * The published-artifact data model.
 *  One immutable record per artifact, ordered by
 *  creation time, plus the append payload the
 *  metadata store stamps.
 */
pub mod record;
/**
 * Client-held view of the gatekeeper's
 *  sliding-window quota. Recomputed on every
 *  negotiation response, never persisted.
 */
pub mod rate_limit;

pub mod prelude {
    pub use crate::filename::{normalize_extension, storage_filename, NormalizedExtension};
    pub use crate::hash::{seal, verify};
    pub use crate::rate_limit::RateLimitState;
    pub use crate::record::{FileRecord, NewFileRecord, MAX_DESCRIPTION_LEN};
}
