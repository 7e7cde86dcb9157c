//! 上传定位服务端口
//!
//! 接收字节流，持久化后返回稳定的检索路径和 MIME 类型。具体存储由基础设施层实现。

use async_trait::async_trait;
use domain::StoredFile;
use thiserror::Error;

/// 一次上传请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// multipart 字段名，例如 `avatar`、`file`
    pub field: String,
    /// 客户端给出的原始文件名
    pub original_name: Option<String>,
    /// 客户端声明的 MIME 类型
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid field name: {0}")]
    InvalidField(String),
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// 保存文件并返回定位信息
    async fn store(&self, request: UploadRequest) -> Result<StoredFile, UploadError>;
}
