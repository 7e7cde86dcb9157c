//! 客户端发往服务端的事件
//!
//! 每个 WebSocket 文本帧是一个 `{"event": "<名称>", "data": {...}}` 对象。
//! `disconnect` 不是帧，而是传输层连接关闭本身。

use serde::{Deserialize, Serialize};

use crate::entities::participant::Participant;
use crate::errors::{DomainError, DomainResult};

/// 客户端事件的封闭集合
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// 以显示名和头像加入会话
    Join {
        name: String,
        #[serde(default)]
        avatar: String,
    },
    /// 公共聊天消息
    ChatMessage { message: String },
    /// 正在输入提示
    Typing { name: String },
    /// 按显示名定向的私聊消息
    #[serde(rename_all = "camelCase")]
    PrivateMessage { to_user_name: String, message: String },
    /// 已上传文件的消息
    #[serde(rename_all = "camelCase")]
    FileMessage { file_path: String, file_type: String },
}

impl ClientEvent {
    /// 解析一个文本帧。未知事件名、缺少必填字段或非法 JSON 都视为无效事件。
    pub fn from_frame(text: &str) -> DomainResult<Self> {
        let event: ClientEvent =
            serde_json::from_str(text).map_err(|err| DomainError::invalid_event(err.to_string()))?;
        event.validate()?;
        Ok(event)
    }

    /// 事件名，用于日志
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Join { .. } => "join",
            ClientEvent::ChatMessage { .. } => "chat-message",
            ClientEvent::Typing { .. } => "typing",
            ClientEvent::PrivateMessage { .. } => "private-message",
            ClientEvent::FileMessage { .. } => "file-message",
        }
    }

    fn validate(&self) -> DomainResult<()> {
        match self {
            ClientEvent::Join { name, .. } => Participant::validate_display_name(name),
            ClientEvent::FileMessage { file_path, .. } if file_path.trim().is_empty() => Err(
                DomainError::validation_error("filePath", "file path cannot be empty"),
            ),
            _ => Ok(()),
        }
    }
}
