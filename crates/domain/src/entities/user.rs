//! 登录资料实体

use serde::{Deserialize, Serialize};

use crate::entities::participant::Participant;
use crate::errors::DomainResult;

/// 通过 `POST /login` 提交的用户资料，保存在服务端会话中。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginProfile {
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub avatar: String,
}

impl LoginProfile {
    pub fn new(
        name: impl Into<String>,
        status: impl Into<String>,
        avatar: impl Into<String>,
    ) -> DomainResult<Self> {
        let name = name.into();
        Participant::validate_display_name(&name)?;
        Ok(Self {
            name,
            status: status.into(),
            avatar: avatar.into(),
        })
    }
}
