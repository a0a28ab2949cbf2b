/**
 * Environment-driven configuration for the
 *  gatekeeper endpoint and the object store.
 */
pub mod config;
/**
 * The listing feed: a live, order-preserving
 *  view of all published records with a pure
 *  client-side text filter.
 */
pub mod feed;
/**
 * The access gate: password-checks a requested
 *  view/download and redeems it through one of
 *  the two supported strategies.
 */
pub mod gate;
/**
 * Client for the gatekeeping authority.
 *  Negotiates upload permission, tracks the
 *  rate-limit/ban state it communicates, and
 *  redeems downloads server-side.
 */
pub mod gatekeeper;
/**
 * Signed uploads against the binary object
 *  store.
 */
pub mod object_store;
/**
 * The publish pipeline: negotiate, confirm,
 *  upload, then append the metadata record.
 */
pub mod publish;
/**
 * Metadata store trait and the in-memory
 *  provider used by tests and local runs.
 */
pub mod store;

pub mod prelude {
    pub use crate::config::{Config, ConfigError};
    pub use crate::feed::ListingFeed;
    pub use crate::gate::{AccessAction, AccessError, AccessGate, RecordActivity, Redemption};
    pub use crate::gatekeeper::{Gatekeeper, NegotiateError, UploadGrant};
    pub use crate::publish::{PublishError, PublishOutcome, Publisher};
    pub use crate::store::{MemoryMetadataStore, MetadataStore, StoreError};
}
