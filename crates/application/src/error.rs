use domain::{DomainError, RepositoryError};
use thiserror::Error;

use crate::blob::BlobError;

/// 应用层错误。
///
/// `Blacklisted` 是审核拒绝，`Repository`/`Infrastructure` 是基础设施故障，
/// 两者必须保持可区分：查询失败不等于被拉黑。
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("sender is blacklisted: {reason}")]
    Blacklisted { reason: String },
    #[error("blob error: {0}")]
    Blob(#[from] BlobError),
    #[error("infrastructure error: {message}")]
    Infrastructure { message: String },
}

impl ChatError {
    pub fn blacklisted(reason: impl Into<String>) -> Self {
        ChatError::Blacklisted {
            reason: reason.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        ChatError::Infrastructure {
            message: message.into(),
        }
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
