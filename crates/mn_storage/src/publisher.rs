use std::sync::Arc;

use chrono::Local;
use mn_core::{
    ArticleTable, BlobStorage, OutputFormat, Result, RetryPolicy, UploadArtifact, UploadReceipt,
};
use tracing::{info, warn};

use crate::export::build_artifact;

/// Serializes an article table and writes it to one container.
pub struct Publisher {
    storage: Arc<dyn BlobStorage>,
    container: String,
    retry: RetryPolicy,
}

impl Publisher {
    pub fn new(storage: Arc<dyn BlobStorage>, container: impl Into<String>) -> Self {
        Self {
            storage,
            container: container.into(),
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// Serialize `table` and upload it as `{timestamp}_{base_name}{ext}`.
    /// The timestamp is taken here, right before the upload.
    pub async fn publish(
        &self,
        table: &ArticleTable,
        base_name: &str,
        format: OutputFormat,
    ) -> Result<UploadReceipt> {
        let artifact = build_artifact(table, base_name, format, &Local::now().naive_local())?;
        self.upload(artifact).await
    }

    pub async fn upload(&self, artifact: UploadArtifact) -> Result<UploadReceipt> {
        let content_type = artifact.content_type();
        let size = artifact.content.len();
        let mut attempt = 0;
        loop {
            let result = self
                .storage
                .put_block_blob(&self.container, &artifact.name, artifact.content.clone(), content_type)
                .await;
            match result {
                Ok(()) => break,
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let backoff = self.retry.backoff(attempt);
                    attempt += 1;
                    warn!(
                        "Upload of {} failed (attempt {}/{}): {}, retrying in {:.1}s",
                        artifact.name,
                        attempt,
                        self.retry.max_retries + 1,
                        e,
                        backoff.as_secs_f64()
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "☁️ Uploaded {} ({} bytes) to {}/{}",
            artifact.name,
            size,
            self.storage.name(),
            self.container
        );
        Ok(UploadReceipt {
            container: self.container.clone(),
            blob_name: artifact.name,
            content_type: content_type.to_string(),
            size,
            uploaded_at: Local::now(),
        })
    }
}
