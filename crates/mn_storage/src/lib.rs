use std::sync::Arc;

use clap::ValueEnum;
use mn_core::{BlobStorage, Result, RunConfig};

pub mod backends;
pub mod export;
pub mod publisher;

pub use backends::*;
pub use publisher::Publisher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    /// Azure Blob Storage, configured by a connection string
    Azure,
    /// Process memory, discarded on exit
    Memory,
}

pub async fn create_storage(kind: StorageKind, config: &RunConfig) -> Result<Arc<dyn BlobStorage>> {
    let storage: Arc<dyn BlobStorage> = match kind {
        StorageKind::Azure => Arc::new(AzureBlobStorage::new(
            config.require_connection_string()?,
            config.timeout,
        )?),
        StorageKind::Memory => Arc::new(InMemoryBlobStorage::new()),
    };
    tracing::info!("🏦 Storage backend ready (using {})", storage.name());
    Ok(storage)
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::export::{object_name, serialize_table};
    pub use super::{create_storage, Publisher, StorageKind};
}

#[cfg(test)]
mod tests {
    use super::*;
    use mn_core::Error;

    #[tokio::test]
    async fn test_azure_requires_connection_string() {
        let config = RunConfig::default();
        let result = create_storage(StorageKind::Azure, &config).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_memory_needs_no_credentials() {
        let storage = create_storage(StorageKind::Memory, &RunConfig::default()).await.unwrap();
        assert_eq!(storage.name(), "memory");
    }
}
