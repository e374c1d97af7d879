//! 基础设施层
//!
//! 外部存储契约的具体适配：PostgreSQL 仓库实现与本地磁盘图片存储。

pub mod blob;
pub mod db;

pub use blob::LocalDiskBlobStore;
pub use db::repositories::{PgContactRepository, PgMessageRepository, PgUserRepository};
pub use db::{create_pg_pool, DbPool};
