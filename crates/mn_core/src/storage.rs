use async_trait::async_trait;
use crate::Result;

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &str;

    /// Write `content` as a single block blob, replacing any blob with the same name
    async fn put_block_blob(
        &self,
        container: &str,
        blob_name: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<()>;
}
