//! 登录会话存储
//!
//! 只在进程内存中保存，进程重启即失效。

use std::collections::HashMap;

use async_trait::async_trait;
use domain::{LoginProfile, SessionId};
use tokio::sync::RwLock;

use crate::error::ApplicationError;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 写入（或覆盖）会话中的登录资料
    async fn put(&self, id: SessionId, profile: LoginProfile) -> Result<(), ApplicationError>;

    /// 读取会话中的登录资料
    async fn get(&self, id: SessionId) -> Result<Option<LoginProfile>, ApplicationError>;
}

/// 内存实现的会话存储
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, LoginProfile>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, id: SessionId, profile: LoginProfile) -> Result<(), ApplicationError> {
        self.sessions.write().await.insert(id, profile);
        Ok(())
    }

    async fn get(&self, id: SessionId) -> Result<Option<LoginProfile>, ApplicationError> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }
}
