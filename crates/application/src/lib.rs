//! 应用层实现。
//!
//! 在线状态与消息网关的核心：连接注册表、事件路由、串行化所有注册表访问的
//! 在线状态中心，以及对外部协作者（上传存储、登录会话）的抽象。

pub mod broadcaster;
pub mod error;
pub mod presence;
pub mod registry;
pub mod router;
pub mod session;
pub mod upload;

pub use broadcaster::{ConnectionBroadcaster, DeliveryReport};
pub use error::ApplicationError;
pub use presence::{OnlineStats, PresenceHub};
pub use registry::ConnectionRegistry;
pub use router::{Audience, Dispatch, EventRouter};
pub use session::{MemorySessionStore, SessionStore};
pub use upload::{UploadError, UploadRequest, UploadStore};

#[cfg(any(test, feature = "testing"))]
pub use upload::MockUploadStore;
