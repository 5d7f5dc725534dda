pub mod config;
pub mod error;
pub mod storage;
pub mod types;

pub use config::{BodyStrategy, RetryPolicy, RunConfig, UploadPolicy};
pub use error::{Error, Result};
pub use storage::BlobStorage;
pub use types::{ArticleRecord, ArticleTable, OutputFormat, UploadArtifact, UploadReceipt};
