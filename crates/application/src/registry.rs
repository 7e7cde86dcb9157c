//! 连接注册表
//!
//! 进程内唯一的"谁在线"数据源：连接标识 → 参与者。
//! 注册表本身不加锁，由在线状态中心任务独占持有（见 `presence` 模块）。

use std::collections::HashMap;

use domain::{ConnectionId, Participant};

#[derive(Debug, Clone)]
struct RegistryEntry {
    /// 首次注册的序号，用于重名时的确定性选择和名单排序
    seq: u64,
    participant: Participant,
}

/// 连接标识到参与者的映射。每个连接至多一个参与者，显示名可以重复。
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: HashMap<ConnectionId, RegistryEntry>,
    next_seq: u64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或覆盖某个连接的参与者。
    ///
    /// 同一连接重复加入时更新名字与头像，但保留原来的注册序号。
    pub fn register(
        &mut self,
        connection_id: ConnectionId,
        display_name: impl Into<String>,
        avatar_locator: impl Into<String>,
    ) -> Participant {
        let participant = Participant::new(connection_id, display_name, avatar_locator);
        match self.entries.get_mut(&connection_id) {
            Some(entry) => entry.participant = participant.clone(),
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.entries.insert(
                    connection_id,
                    RegistryEntry {
                        seq,
                        participant: participant.clone(),
                    },
                );
            }
        }
        participant
    }

    /// 移除并返回连接对应的参与者；未注册或已移除时返回 `None`。
    pub fn unregister(&mut self, connection_id: ConnectionId) -> Option<Participant> {
        self.entries
            .remove(&connection_id)
            .map(|entry| entry.participant)
    }

    /// 按显示名查找。重名时返回最早注册的那一个。
    pub fn find_by_name(&self, display_name: &str) -> Option<&Participant> {
        self.entries
            .values()
            .filter(|entry| entry.participant.display_name == display_name)
            .min_by_key(|entry| entry.seq)
            .map(|entry| &entry.participant)
    }

    pub fn get(&self, connection_id: ConnectionId) -> Option<&Participant> {
        self.entries
            .get(&connection_id)
            .map(|entry| &entry.participant)
    }

    pub fn contains(&self, connection_id: ConnectionId) -> bool {
        self.entries.contains_key(&connection_id)
    }

    /// 当前完整名单，按注册顺序排列
    pub fn snapshot(&self) -> Vec<Participant> {
        let mut entries: Vec<&RegistryEntry> = self.entries.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries
            .into_iter()
            .map(|entry| entry.participant.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
