//! 上传文件实体定义

use serde::{Deserialize, Serialize};

/// 默认 MIME 类型，上传方未声明时使用
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// 文件类别，客户端据此决定按图片还是普通附件渲染
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Other,
}

impl FileKind {
    /// 根据 MIME 类型判断类别
    pub fn from_content_type(content_type: &str) -> Self {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if essence.starts_with("image/") {
            FileKind::Image
        } else {
            FileKind::Other
        }
    }
}

/// 上传服务返回的存储结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    /// 对外可访问的检索路径，例如 `/uploads/file-1700000000000-1a2b3c4d.png`
    pub locator: String,
    /// MIME类型
    pub content_type: String,
    /// 文件大小（字节）
    pub size: u64,
}

impl StoredFile {
    pub fn new(locator: impl Into<String>, content_type: impl Into<String>, size: u64) -> Self {
        Self {
            locator: locator.into(),
            content_type: content_type.into(),
            size,
        }
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_content_type(&self.content_type)
    }
}
