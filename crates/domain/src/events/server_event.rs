//! 服务端推送给客户端的事件

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::entities::participant::Participant;
use crate::value_objects::ConnectionId;

/// 服务端事件的封闭集合，与客户端事件使用同样的 `{event, data}` 帧格式。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// 完整在线名单
    UpdateUserList(Roster),
    /// 有人加入
    UserConnected(PresenceNotice),
    /// 有人离开
    UserDisconnected(PresenceNotice),
    /// 公共聊天消息
    ChatMessage { name: String, message: String },
    /// 正在输入提示
    Typing { name: String },
    /// 私聊消息
    PrivateMessage { from: String, message: String },
    /// 文件消息
    #[serde(rename_all = "camelCase")]
    FileMessage { file_path: String, file_type: String },
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::UpdateUserList(_) => "update-user-list",
            ServerEvent::UserConnected(_) => "user-connected",
            ServerEvent::UserDisconnected(_) => "user-disconnected",
            ServerEvent::ChatMessage { .. } => "chat-message",
            ServerEvent::Typing { .. } => "typing",
            ServerEvent::PrivateMessage { .. } => "private-message",
            ServerEvent::FileMessage { .. } => "file-message",
        }
    }

    /// 序列化为一个文本帧
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// 上线/下线通知的载荷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceNotice {
    pub name: String,
    pub avatar: String,
}

impl From<&Participant> for PresenceNotice {
    fn from(participant: &Participant) -> Self {
        Self {
            name: participant.display_name.clone(),
            avatar: participant.avatar_locator.clone(),
        }
    }
}

/// 在线名单。
///
/// 线上格式是以连接标识为键的 JSON 对象，值为 `{name, avatar, socketId}`，
/// 键的顺序即加入顺序。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster(pub Vec<Participant>);

impl Roster {
    pub fn new(participants: Vec<Participant>) -> Self {
        Self(participants)
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|p| p.display_name.as_str()).collect()
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RosterEntry {
    name: String,
    #[serde(default)]
    avatar: String,
    socket_id: ConnectionId,
}

impl Serialize for Roster {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for participant in &self.0 {
            map.serialize_entry(
                &participant.connection_id,
                &RosterEntry {
                    name: participant.display_name.clone(),
                    avatar: participant.avatar_locator.clone(),
                    socket_id: participant.connection_id,
                },
            )?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Roster {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RosterVisitor;

        impl<'de> Visitor<'de> for RosterVisitor {
            type Value = Roster;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of connection id to roster entry")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Roster, A::Error> {
                let mut participants = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((_, entry)) = access.next_entry::<String, RosterEntry>()? {
                    participants.push(Participant::new(entry.socket_id, entry.name, entry.avatar));
                }
                Ok(Roster(participants))
            }
        }

        deserializer.deserialize_map(RosterVisitor)
    }
}
