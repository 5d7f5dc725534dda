use async_trait::async_trait;
use mn_core::{BlobStorage, Result};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub container: String,
    pub name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// Keeps uploaded blobs in memory; used for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlobStorage {
    blobs: Arc<RwLock<Vec<StoredBlob>>>,
}

impl InMemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn blobs(&self) -> Vec<StoredBlob> {
        self.blobs.read().await.clone()
    }

    pub async fn get(&self, container: &str, name: &str) -> Option<StoredBlob> {
        self.blobs
            .read()
            .await
            .iter()
            .find(|b| b.container == container && b.name == name)
            .cloned()
    }
}

#[async_trait]
impl BlobStorage for InMemoryBlobStorage {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put_block_blob(
        &self,
        container: &str,
        blob_name: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let blob = StoredBlob {
            container: container.to_string(),
            name: blob_name.to_string(),
            content_type: content_type.to_string(),
            content,
        };
        let mut blobs = self.blobs.write().await;
        if let Some(existing) = blobs
            .iter_mut()
            .find(|b| b.container == blob.container && b.name == blob.name)
        {
            *existing = blob;
        } else {
            blobs.push(blob);
        }
        Ok(())
    }
}
