//! 聊天系统核心领域模型
//!
//! 包含用户、消息、联系人、附件等核心实体，以及相关的业务规则。

pub mod contact;
pub mod errors;
pub mod message;
pub mod user;
pub mod value_objects;

// 重新导出常用类型
pub use contact::Contact;
pub use errors::{DomainError, DomainResult, RepositoryError, RepositoryResult};
pub use message::{Attachment, Message, NewMessage};
pub use user::{ModerationState, User, UserProfile, UserRole};
pub use value_objects::{MessageBody, MessageId, Timestamp, UserId, Username};
