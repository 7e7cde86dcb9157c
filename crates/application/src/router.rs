//! 事件路由
//!
//! 把一个连接发来的事件翻译成注册表变更和一组推送（广播、排除发送者的广播、单播）。
//! 路由本身不做 I/O，推送由在线状态中心交给 `ConnectionBroadcaster` 执行。
//!
//! | 事件 | 推送 |
//! |---|---|
//! | `join` | `user-connected` 给除发送者外所有人，随后名单给所有人 |
//! | 断开 | 有条目被移除时：`user-disconnected` 给所有人，随后名单给所有人 |
//! | `chat-message` | 给所有人（含发送者） |
//! | `typing` | 给除发送者外所有人 |
//! | `private-message` | 只给按名字解析出的那个连接 |
//! | `file-message` | 给所有人（含发送者） |

use domain::{ClientEvent, ConnectionId, PresenceNotice, Roster, ServerEvent};

use crate::registry::ConnectionRegistry;

/// 推送对象
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// 所有打开的会话，含发送者
    Everyone,
    /// 除指定连接外的所有会话
    EveryoneExcept(ConnectionId),
    /// 仅指定连接
    Only(ConnectionId),
}

impl Audience {
    /// 某个连接是否在推送范围内
    pub fn includes(&self, connection_id: ConnectionId) -> bool {
        match self {
            Audience::Everyone => true,
            Audience::EveryoneExcept(excluded) => *excluded != connection_id,
            Audience::Only(target) => *target == connection_id,
        }
    }
}

/// 一次推送：对象 + 事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub audience: Audience,
    pub event: ServerEvent,
}

impl Dispatch {
    pub fn new(audience: Audience, event: ServerEvent) -> Self {
        Self { audience, event }
    }
}

/// 无状态的事件路由器
#[derive(Debug, Default, Clone, Copy)]
pub struct EventRouter;

impl EventRouter {
    /// 路由一个客户端事件，返回按顺序执行的推送列表
    pub fn route(
        registry: &mut ConnectionRegistry,
        from: ConnectionId,
        event: ClientEvent,
    ) -> Vec<Dispatch> {
        match event {
            ClientEvent::Join { name, avatar } => {
                let participant = registry.register(from, name, avatar);
                tracing::info!(connection_id = %from, name = %participant.display_name, "参与者加入");
                vec![
                    Dispatch::new(
                        Audience::EveryoneExcept(from),
                        ServerEvent::UserConnected(PresenceNotice::from(&participant)),
                    ),
                    Self::roster_update(registry),
                ]
            }
            ClientEvent::ChatMessage { message } => match registry.get(from) {
                Some(sender) => vec![Dispatch::new(
                    Audience::Everyone,
                    ServerEvent::ChatMessage {
                        name: sender.display_name.clone(),
                        message,
                    },
                )],
                None => {
                    tracing::warn!(connection_id = %from, "未加入的连接发送聊天消息，已丢弃");
                    Vec::new()
                }
            },
            ClientEvent::Typing { name } => vec![Dispatch::new(
                Audience::EveryoneExcept(from),
                ServerEvent::Typing { name },
            )],
            ClientEvent::PrivateMessage {
                to_user_name,
                message,
            } => {
                let Some(sender) = registry.get(from) else {
                    tracing::warn!(connection_id = %from, "未加入的连接发送私聊消息，已丢弃");
                    return Vec::new();
                };
                match registry.find_by_name(&to_user_name) {
                    Some(recipient) => vec![Dispatch::new(
                        Audience::Only(recipient.connection_id),
                        ServerEvent::PrivateMessage {
                            from: sender.display_name.clone(),
                            message,
                        },
                    )],
                    None => {
                        tracing::warn!(connection_id = %from, to = %to_user_name, "私聊目标不存在");
                        Vec::new()
                    }
                }
            }
            ClientEvent::FileMessage {
                file_path,
                file_type,
            } => vec![Dispatch::new(
                Audience::Everyone,
                ServerEvent::FileMessage {
                    file_path,
                    file_type,
                },
            )],
        }
    }

    /// 处理传输层断开。重复断开或从未加入的连接不产生任何推送。
    pub fn disconnect(registry: &mut ConnectionRegistry, from: ConnectionId) -> Vec<Dispatch> {
        match registry.unregister(from) {
            Some(participant) => {
                tracing::info!(connection_id = %from, name = %participant.display_name, "参与者离开");
                vec![
                    Dispatch::new(
                        Audience::Everyone,
                        ServerEvent::UserDisconnected(PresenceNotice::from(&participant)),
                    ),
                    Self::roster_update(registry),
                ]
            }
            None => Vec::new(),
        }
    }

    fn roster_update(registry: &ConnectionRegistry) -> Dispatch {
        Dispatch::new(
            Audience::Everyone,
            ServerEvent::UpdateUserList(Roster::new(registry.snapshot())),
        )
    }
}
