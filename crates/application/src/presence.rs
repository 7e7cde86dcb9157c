//! 在线状态中心
//!
//! 一个独占注册表和下行队列表的 tokio 任务。所有连接通过 `PresenceHub`
//! 句柄把命令送进同一个 mpsc 队列，任务逐条处理：每条命令的注册表变更和
//! 全部推送都完成后才取下一条，因此所有客户端看到的上下线和名单顺序一致。

use config::HubConfig;
use domain::{ClientEvent, ConnectionId, Participant, ServerEvent};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::broadcaster::ConnectionBroadcaster;
use crate::error::ApplicationError;
use crate::registry::ConnectionRegistry;
use crate::router::{Dispatch, EventRouter};

/// 在线统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OnlineStats {
    /// 打开的传输会话数（含尚未 join 的）
    pub open_connections: usize,
    /// 已加入的参与者数
    pub participants: usize,
}

/// 发送给中心任务的命令
#[derive(Debug)]
enum HubCommand {
    Open {
        connection_id: ConnectionId,
        reply: oneshot::Sender<mpsc::Receiver<ServerEvent>>,
    },
    Dispatch {
        connection_id: ConnectionId,
        event: ClientEvent,
    },
    Close {
        connection_id: ConnectionId,
        done: oneshot::Sender<()>,
    },
    Roster {
        reply: oneshot::Sender<Vec<Participant>>,
    },
    Stats {
        reply: oneshot::Sender<OnlineStats>,
    },
}

/// 在线状态中心句柄，可廉价克隆给每个连接
#[derive(Debug, Clone)]
pub struct PresenceHub {
    commands: mpsc::Sender<HubCommand>,
}

impl PresenceHub {
    /// 启动中心任务。所有句柄释放后任务自动结束。
    pub fn spawn(config: &HubConfig) -> (Self, JoinHandle<()>) {
        let (commands, receiver) = mpsc::channel(config.command_capacity);
        let actor = HubActor {
            registry: ConnectionRegistry::new(),
            broadcaster: ConnectionBroadcaster::new(),
            outbound_capacity: config.outbound_capacity,
        };
        let handle = tokio::spawn(actor.run(receiver));
        (Self { commands }, handle)
    }

    /// 挂载新的传输会话，返回该会话的下行事件流
    pub async fn open(
        &self,
        connection_id: ConnectionId,
    ) -> Result<mpsc::Receiver<ServerEvent>, ApplicationError> {
        let (reply, response) = oneshot::channel();
        self.send(HubCommand::Open {
            connection_id,
            reply,
        })
        .await?;
        response.await.map_err(|_| ApplicationError::HubUnavailable)
    }

    /// 提交一个客户端事件。同一连接按提交顺序处理。
    pub async fn dispatch(
        &self,
        connection_id: ConnectionId,
        event: ClientEvent,
    ) -> Result<(), ApplicationError> {
        self.send(HubCommand::Dispatch {
            connection_id,
            event,
        })
        .await
    }

    /// 传输层断开。幂等，等待清理和推送完成后返回。
    pub async fn close(&self, connection_id: ConnectionId) -> Result<(), ApplicationError> {
        let (done, finished) = oneshot::channel();
        self.send(HubCommand::Close {
            connection_id,
            done,
        })
        .await?;
        finished.await.map_err(|_| ApplicationError::HubUnavailable)
    }

    /// 当前名单快照，按加入顺序
    pub async fn roster(&self) -> Result<Vec<Participant>, ApplicationError> {
        let (reply, response) = oneshot::channel();
        self.send(HubCommand::Roster { reply }).await?;
        response.await.map_err(|_| ApplicationError::HubUnavailable)
    }

    pub async fn stats(&self) -> Result<OnlineStats, ApplicationError> {
        let (reply, response) = oneshot::channel();
        self.send(HubCommand::Stats { reply }).await?;
        response.await.map_err(|_| ApplicationError::HubUnavailable)
    }

    async fn send(&self, command: HubCommand) -> Result<(), ApplicationError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ApplicationError::HubUnavailable)
    }
}

struct HubActor {
    registry: ConnectionRegistry,
    broadcaster: ConnectionBroadcaster,
    outbound_capacity: usize,
}

impl HubActor {
    async fn run(mut self, mut commands: mpsc::Receiver<HubCommand>) {
        tracing::info!("在线状态中心已启动");
        while let Some(command) = commands.recv().await {
            self.handle(command);
        }
        tracing::info!("在线状态中心已停止");
    }

    fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Open {
                connection_id,
                reply,
            } => {
                let (sender, receiver) = mpsc::channel(self.outbound_capacity);
                self.broadcaster.attach(connection_id, sender);
                if reply.send(receiver).is_err() {
                    // 请求方已经放弃，撤销挂载
                    self.broadcaster.detach(connection_id);
                }
            }
            HubCommand::Dispatch {
                connection_id,
                event,
            } => {
                if !self.broadcaster.contains(connection_id) {
                    tracing::warn!(connection_id = %connection_id, event = event.name(), "会话未打开，忽略事件");
                    return;
                }
                tracing::debug!(connection_id = %connection_id, event = event.name(), "路由事件");
                let dispatches = EventRouter::route(&mut self.registry, connection_id, event);
                self.fan_out(&dispatches);
            }
            HubCommand::Close {
                connection_id,
                done,
            } => {
                // 先卸载会话，断开者不再收到任何推送
                self.broadcaster.detach(connection_id);
                let dispatches = EventRouter::disconnect(&mut self.registry, connection_id);
                self.fan_out(&dispatches);
                let _ = done.send(());
            }
            HubCommand::Roster { reply } => {
                let _ = reply.send(self.registry.snapshot());
            }
            HubCommand::Stats { reply } => {
                let _ = reply.send(OnlineStats {
                    open_connections: self.broadcaster.len(),
                    participants: self.registry.len(),
                });
            }
        }
    }

    fn fan_out(&self, dispatches: &[Dispatch]) {
        for dispatch in dispatches {
            self.broadcaster.deliver(dispatch);
        }
    }
}
