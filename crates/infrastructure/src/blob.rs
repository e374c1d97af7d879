//! 本地磁盘图片存储
//!
//! `put_blob` 契约的本地实现：字节落盘，返回可公开访问的 URL。
//! 过期附件的实际清理不在这里，由外部清理进程负责。

use std::path::PathBuf;

use async_trait::async_trait;

use application::blob::{BlobError, BlobStore};

pub struct LocalDiskBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalDiskBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    /// 文件名只允许字母数字、点、横线、下划线，防止路径逃逸。
    fn sanitize(name: &str) -> String {
        name.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

#[async_trait]
impl BlobStore for LocalDiskBlobStore {
    async fn put_blob(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BlobError> {
        let safe_name = Self::sanitize(name);

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| BlobError::storage(format!("create blob dir failed: {e}")))?;

        let path = self.root.join(&safe_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| BlobError::storage(format!("write blob failed: {e}")))?;

        tracing::debug!(name = %safe_name, content_type, "图片已写入本地存储");

        Ok(format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            safe_name
        ))
    }
}
