//! 在线状态与消息网关的领域模型
//!
//! 包含参与者、连接标识、客户端/服务端事件等核心类型，不涉及任何 I/O。

pub mod entities;
pub mod errors;
pub mod events;
pub mod value_objects;

// 重新导出常用类型
pub use entities::*;
pub use errors::*;
pub use events::*;
pub use value_objects::*;
