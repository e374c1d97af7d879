//! 图片存储契约
//!
//! 外部对象存储的最小接口：写入字节，换回可公开访问的 URL。

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob storage failed: {message}")]
    Storage { message: String },
}

impl BlobError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put_blob(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BlobError>;
}
