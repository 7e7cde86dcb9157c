use domain::DomainError;
use thiserror::Error;

use crate::upload::UploadError;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("upload error: {0}")]
    Upload(#[from] UploadError),
    /// 在线状态中心任务已退出
    #[error("presence hub is not running")]
    HubUnavailable,
}
