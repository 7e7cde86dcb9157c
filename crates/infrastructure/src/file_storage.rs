//! 本地文件系统上传存储
//!
//! 文件写入 `<upload_dir>/<字段名>-<毫秒时间戳>-<8位随机>.<扩展名>`，
//! 定位路径为 `<public_prefix>/<文件名>`，由 HTTP 层的静态服务对外提供。
//! 静态服务按扩展名推断 MIME 类型，所以原始文件名没有可用扩展名时，
//! 改用声明的 MIME 类型对应的扩展名。

use std::path::PathBuf;

use application::{UploadError, UploadRequest, UploadStore};
use async_trait::async_trait;
use chrono::Utc;
use domain::{StoredFile, DEFAULT_CONTENT_TYPE};
use uuid::Uuid;

/// 扩展名最大长度，超出时丢弃扩展名
const MAX_EXTENSION_LEN: usize = 10;

#[derive(Debug, Clone)]
pub struct LocalUploadStore {
    root: PathBuf,
    public_prefix: String,
}

impl LocalUploadStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// 确保存储目录存在
    pub async fn ensure_root(&self) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn file_name(
        field: &str,
        original_name: Option<&str>,
        content_type: &str,
    ) -> Result<String, UploadError> {
        if field.is_empty()
            || !field
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(UploadError::InvalidField(field.to_string()));
        }

        let token = Uuid::new_v4().simple().to_string();
        let mut name = format!("{}-{}-{}", field, Utc::now().timestamp_millis(), &token[..8]);
        let extension = original_name
            .and_then(Self::extension)
            .or_else(|| Self::extension_for_mime(content_type));
        if let Some(extension) = extension {
            name.push('.');
            name.push_str(extension);
        }
        Ok(name)
    }

    /// 只取原始文件名中的扩展名，且必须是短的字母数字串
    fn extension(original_name: &str) -> Option<&str> {
        let base = original_name.rsplit(['/', '\\']).next()?;
        let (stem, extension) = base.rsplit_once('.')?;
        if stem.is_empty()
            || extension.is_empty()
            || extension.len() > MAX_EXTENSION_LEN
            || !extension.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return None;
        }
        Some(extension)
    }

    /// MIME 类型对应的扩展名，优先选能反推回同一类型的那个
    fn extension_for_mime(content_type: &str) -> Option<&'static str> {
        let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
        if essence == DEFAULT_CONTENT_TYPE {
            return None;
        }
        let candidates = mime_guess::get_mime_extensions_str(&essence)?;
        candidates
            .iter()
            .copied()
            .find(|ext| mime_guess::from_ext(ext).first_raw() == Some(essence.as_str()))
            .or_else(|| candidates.first().copied())
    }
}

#[async_trait]
impl UploadStore for LocalUploadStore {
    async fn store(&self, request: UploadRequest) -> Result<StoredFile, UploadError> {
        let content_type = request
            .content_type
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let file_name = Self::file_name(
            &request.field,
            request.original_name.as_deref(),
            &content_type,
        )?;
        self.ensure_root().await?;

        let path = self.root.join(&file_name);
        tokio::fs::write(&path, &request.bytes).await?;
        let stored = StoredFile::new(
            format!("{}/{}", self.public_prefix, file_name),
            content_type,
            request.bytes.len() as u64,
        );

        tracing::info!(
            locator = %stored.locator,
            content_type = %stored.content_type,
            size = stored.size,
            "文件已保存"
        );
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::FileKind;

    fn request(field: &str, name: Option<&str>, content_type: Option<&str>, bytes: &[u8]) -> UploadRequest {
        UploadRequest {
            field: field.into(),
            original_name: name.map(str::to_owned),
            content_type: content_type.map(str::to_owned),
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn stores_bytes_and_returns_locator() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalUploadStore::new(dir.path().join("uploads"), "/uploads");

        let stored = store
            .store(request("file", Some("cat.png"), Some("image/png"), b"\x89PNG"))
            .await
            .unwrap();

        assert!(stored.locator.starts_with("/uploads/file-"));
        assert!(stored.locator.ends_with(".png"));
        assert_eq!(stored.content_type, "image/png");
        assert_eq!(stored.kind(), FileKind::Image);
        assert_eq!(stored.size, 4);

        let name = stored.locator.trim_start_matches("/uploads/");
        let on_disk = tokio::fs::read(dir.path().join("uploads").join(name))
            .await
            .unwrap();
        assert_eq!(on_disk, b"\x89PNG");
    }

    #[tokio::test]
    async fn consecutive_uploads_get_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalUploadStore::new(dir.path(), "/uploads/");

        let first = store.store(request("avatar", Some("a.jpg"), None, b"1")).await.unwrap();
        let second = store.store(request("avatar", Some("a.jpg"), None, b"2")).await.unwrap();

        assert_ne!(first.locator, second.locator);
        assert_eq!(first.content_type, DEFAULT_CONTENT_TYPE);
        assert!(first.locator.starts_with("/uploads/avatar-"));
    }

    #[tokio::test]
    async fn rejects_unsafe_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalUploadStore::new(dir.path(), "/uploads");
        let result = store.store(request("../etc", Some("x.txt"), None, b"x")).await;
        assert!(matches!(result, Err(UploadError::InvalidField(_))));
    }

    #[tokio::test]
    async fn missing_extension_is_taken_from_declared_type() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalUploadStore::new(dir.path(), "/uploads");

        for name in [Some("photo"), Some("snapshot.jpeg_large"), None] {
            let stored = store
                .store(request("file", name, Some("image/png"), b"png"))
                .await
                .unwrap();
            assert!(stored.locator.ends_with(".png"), "{}", stored.locator);
            assert_eq!(
                mime_guess::from_path(&stored.locator).first_raw(),
                Some("image/png")
            );
        }

        let stored = store
            .store(request("file", Some("scan"), Some("image/jpeg"), b"jpg"))
            .await
            .unwrap();
        assert_eq!(
            mime_guess::from_path(&stored.locator).first_raw(),
            Some("image/jpeg")
        );
    }

    #[tokio::test]
    async fn original_extension_wins_and_generic_type_adds_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalUploadStore::new(dir.path(), "/uploads");

        let stored = store
            .store(request("file", Some("notes.txt"), Some("image/png"), b"x"))
            .await
            .unwrap();
        assert!(stored.locator.ends_with(".txt"));

        let stored = store
            .store(request("file", Some("blob"), None, b"x"))
            .await
            .unwrap();
        assert!(!stored.locator.contains('.'));
    }

    #[test]
    fn extension_never_carries_path_components() {
        assert_eq!(LocalUploadStore::extension("photo.JPG"), Some("JPG"));
        assert_eq!(LocalUploadStore::extension("../../evil.sh"), Some("sh"));
        assert_eq!(LocalUploadStore::extension("dir.d/noext"), None);
        assert_eq!(LocalUploadStore::extension(".bashrc"), None);
        assert_eq!(LocalUploadStore::extension("archive.tar/gz"), None);
        assert_eq!(LocalUploadStore::extension("weird.p h p"), None);
    }
}
