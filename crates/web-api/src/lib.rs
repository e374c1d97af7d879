//! Web API 层
//!
//! HTTP 管理接口与 WebSocket 实时通道。

pub mod error;
pub mod routes;
pub mod state;
pub mod ws;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
