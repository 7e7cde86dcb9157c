//! Web API 层。
//!
//! 提供 Axum 路由：WebSocket 传输端点、登录会话、文件上传，
//! 以及前端页面和已上传文件的静态服务。

mod error;
mod routes;
mod state;
mod ws_connection;

pub use error::{ApiError, ErrorBody};
pub use routes::{router, SESSION_COOKIE};
pub use state::AppState;
pub use ws_connection::WebSocketConnection;
