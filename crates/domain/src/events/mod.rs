//! 线上事件定义
//!
//! 客户端与服务端之间传递的事件都是封闭的枚举，由编译器保证分发时穷尽处理。

pub mod client_event;
pub mod server_event;

pub use client_event::ClientEvent;
pub use server_event::{PresenceNotice, Roster, ServerEvent};
