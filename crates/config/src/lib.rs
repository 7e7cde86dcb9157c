//! 统一配置中心
//!
//! 配置按以下顺序合并，后者覆盖前者：
//! - 内置默认值
//! - `APP_CONFIG_FILE` 指向的可选配置文件（YAML / JSON / TOML）
//! - `APP_` 前缀的环境变量，`__` 表示嵌套，例如 `APP_SERVER__HOST`
//! - `PORT` 环境变量，映射到 `server.port`

use std::path::PathBuf;

use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// 未设置 `PORT` 时的默认监听端口
pub const DEFAULT_PORT: u16 = 3000;

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// 服务配置
    #[validate(nested)]
    pub server: ServerConfig,
    /// 静态文件与上传存储配置
    #[validate(nested)]
    pub storage: StorageConfig,
    /// 在线状态中心配置
    #[validate(nested)]
    pub hub: HubConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StorageConfig {
    /// 前端静态资源目录
    pub static_dir: PathBuf,
    /// 上传文件落盘目录
    pub upload_dir: PathBuf,
    /// 上传文件对外访问的路径前缀
    #[validate(custom(function = "validate_public_prefix"))]
    pub public_prefix: String,
    /// 单次请求体上限（字节）
    #[validate(range(min = 1))]
    pub max_upload_bytes: usize,
}

/// 在线状态中心配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HubConfig {
    /// 命令队列容量
    #[validate(range(min = 1))]
    pub command_capacity: usize,
    /// 每个连接的下行队列容量，满时丢弃该连接的这条推送
    #[validate(range(min = 1))]
    pub outbound_capacity: usize,
}

fn validate_public_prefix(prefix: &str) -> Result<(), ValidationError> {
    if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
        return Err(ValidationError::new("public_prefix")
            .with_message("public prefix must look like `/uploads`".into()));
    }
    Ok(())
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: DEFAULT_PORT,
                cors_origins: vec!["*".into()],
            },
            storage: StorageConfig {
                static_dir: PathBuf::from("public"),
                upload_dir: PathBuf::from("public/uploads"),
                public_prefix: "/uploads".into(),
                max_upload_bytes: 10 * 1024 * 1024,
            },
            hub: HubConfig {
                command_capacity: 1024,
                outbound_capacity: 256,
            },
        }
    }
}

impl AppConfig {
    /// 从默认值、配置文件和环境变量加载配置并校验
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// 构造分层配置源
    pub fn figment() -> Figment {
        let mut fig = Figment::new().merge(Serialized::defaults(AppConfig::default()));
        if let Ok(path) = std::env::var("APP_CONFIG_FILE") {
            if path.ends_with(".yml") || path.ends_with(".yaml") {
                fig = fig.merge(Yaml::file(path));
            } else if path.ends_with(".json") {
                fig = fig.merge(Json::file(path));
            } else {
                fig = fig.merge(Toml::file(path));
            }
        }
        fig.merge(Env::prefixed("APP_").split("__"))
            .merge(Env::raw().only(&["PORT"]).map(|_| "server.port".into()))
    }

    pub fn from_figment(fig: Figment) -> Result<Self, ConfigError> {
        let cfg: AppConfig = fig.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// 监听地址，例如 `0.0.0.0:3000`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 用于日志输出的简要描述
    pub fn sanitize(&self) -> String {
        format!(
            "listen={} static_dir={} upload_dir={} public_prefix={} max_upload_bytes={} outbound_capacity={}",
            self.bind_addr(),
            self.storage.static_dir.display(),
            self.storage.upload_dir.display(),
            self.storage.public_prefix,
            self.storage.max_upload_bytes,
            self.hub.outbound_capacity,
        )
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}
