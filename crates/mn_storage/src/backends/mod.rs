pub mod azure;
pub mod memory;

pub use azure::{AzureBlobStorage, ConnectionString};
pub use memory::{InMemoryBlobStorage, StoredBlob};
