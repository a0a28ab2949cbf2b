mod memory;
mod provider;

pub use memory::{MemoryMetadataStore, MemoryMetadataStoreError};
pub use provider::{MetadataStore, StoreError};
