//! 下行推送
//!
//! 保存每个打开的传输会话的下行队列，并按 `Audience` 把事件投递进去。
//! 投递使用 `try_send`，某个客户端队列满或已关闭时只丢弃该客户端的这一条，
//! 不会阻塞其他连接。

use std::collections::HashMap;

use domain::{ConnectionId, ServerEvent};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::router::{Audience, Dispatch};

/// 一次投递的结果统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub dropped: usize,
}

/// 连接下行队列表
#[derive(Debug, Default)]
pub struct ConnectionBroadcaster {
    sessions: HashMap<ConnectionId, mpsc::Sender<ServerEvent>>,
}

impl ConnectionBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// 挂载一个新会话的下行队列；同一连接重复挂载时替换旧队列
    pub fn attach(&mut self, connection_id: ConnectionId, sender: mpsc::Sender<ServerEvent>) {
        self.sessions.insert(connection_id, sender);
    }

    /// 卸载会话，返回此前是否存在
    pub fn detach(&mut self, connection_id: ConnectionId) -> bool {
        self.sessions.remove(&connection_id).is_some()
    }

    pub fn contains(&self, connection_id: ConnectionId) -> bool {
        self.sessions.contains_key(&connection_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// 按推送对象投递一条事件
    pub fn deliver(&self, dispatch: &Dispatch) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        match dispatch.audience {
            Audience::Only(target) => {
                if let Some(sender) = self.sessions.get(&target) {
                    Self::push(target, sender, &dispatch.event, &mut report);
                } else {
                    report.dropped += 1;
                }
            }
            audience => {
                for (connection_id, sender) in &self.sessions {
                    if audience.includes(*connection_id) {
                        Self::push(*connection_id, sender, &dispatch.event, &mut report);
                    }
                }
            }
        }

        tracing::debug!(
            event = dispatch.event.name(),
            delivered = report.delivered,
            dropped = report.dropped,
            "事件已投递"
        );
        report
    }

    fn push(
        connection_id: ConnectionId,
        sender: &mpsc::Sender<ServerEvent>,
        event: &ServerEvent,
        report: &mut DeliveryReport,
    ) {
        match sender.try_send(event.clone()) {
            Ok(()) => report.delivered += 1,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(connection_id = %connection_id, event = event.name(), "下行队列已满，丢弃推送");
                report.dropped += 1;
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(connection_id = %connection_id, "下行队列已关闭");
                report.dropped += 1;
            }
        }
    }
}
