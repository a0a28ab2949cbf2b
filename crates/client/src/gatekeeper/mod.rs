#[allow(clippy::module_inception)]
mod client;
mod error;
mod wire;

pub use client::Gatekeeper;
pub use error::NegotiateError;
pub use wire::UploadGrant;
