//! 领域模型错误定义
//!
//! 网关核心只有少量可预期的失败：客户端发来的事件帧无法解析，
//! 或者携带的字段不满足约束。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 事件帧无法解析（未知事件名、缺少字段、非法 JSON）
    #[error("无效事件: {reason}")]
    InvalidEvent { reason: String },

    /// 字段验证失败
    #[error("验证失败: {field}: {message}")]
    ValidationError { field: String, message: String },
}

impl DomainError {
    /// 创建无效事件错误
    pub fn invalid_event(reason: impl Into<String>) -> Self {
        Self::InvalidEvent {
            reason: reason.into(),
        }
    }

    /// 创建验证错误
    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;
