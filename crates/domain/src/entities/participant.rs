//! 在线参与者实体

use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::ConnectionId;

/// 一个已加入会话的在线用户。
///
/// 生命周期与所属传输会话一致：收到 `join` 时创建，断开时立即移除，
/// 不做任何持久化。显示名不保证唯一。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub connection_id: ConnectionId,
    pub display_name: String,
    pub avatar_locator: String,
}

impl Participant {
    pub fn new(
        connection_id: ConnectionId,
        display_name: impl Into<String>,
        avatar_locator: impl Into<String>,
    ) -> Self {
        Self {
            connection_id,
            display_name: display_name.into(),
            avatar_locator: avatar_locator.into(),
        }
    }

    /// 校验显示名：去掉首尾空白后不能为空。
    pub fn validate_display_name(name: &str) -> DomainResult<()> {
        if name.trim().is_empty() {
            return Err(DomainError::validation_error(
                "name",
                "display name cannot be empty",
            ));
        }
        Ok(())
    }
}
