//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务：在线连接注册表、消息路由与扇出、
//! 审核拦截、附件过期标记，以及对外部适配器（存储、图片仓库）的抽象。

pub mod attachments;
pub mod blob;
pub mod clock;
pub mod dto;
pub mod error;
pub mod events;
pub mod moderation;
pub mod presence;
pub mod registry;
pub mod repository;
pub mod services;

pub use attachments::EphemeralResourceTracker;
pub use blob::{BlobError, BlobStore};
pub use clock::{Clock, SystemClock};
pub use dto::{ContactDto, MessageDto, UserDto};
pub use error::{ChatError, ChatResult};
pub use events::ServerEvent;
pub use moderation::ModerationGate;
pub use presence::PresenceBroadcaster;
pub use registry::{ConnectionHandle, ConnectionRegistry};
pub use repository::{ContactRepository, MessageRepository, UserRepository};
pub use services::{
    ChatService, ChatServiceDependencies, ContactService, ContactServiceDependencies, UserService,
    UserServiceDependencies,
};
