use application::PresenceHub;
use axum::extract::ws::{Message as WsMessage, WebSocket};
use domain::{ClientEvent, ConnectionId, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

/// WebSocket 连接
///
/// 封装单个传输会话：
/// - 在在线状态中心挂载下行队列
/// - 解析客户端事件帧并按序提交给中心
/// - 把中心推送的事件写回客户端
/// - 断开时提交一次幂等的清理
pub struct WebSocketConnection {
    socket: WebSocket,
    hub: PresenceHub,
    connection_id: ConnectionId,
}

/// 处理完一个入站帧后的去向
enum Flow {
    Continue,
    Stop,
}

impl WebSocketConnection {
    pub fn new(socket: WebSocket, hub: PresenceHub) -> Self {
        Self {
            socket,
            hub,
            connection_id: ConnectionId::random(),
        }
    }

    /// 运行连接主循环，直到任意一侧结束
    pub async fn run(self) {
        let Self {
            socket,
            hub,
            connection_id,
        } = self;

        let mut outbound = match hub.open(connection_id).await {
            Ok(receiver) => receiver,
            Err(err) => {
                tracing::error!(error = %err, connection_id = %connection_id, "无法挂载连接");
                return;
            }
        };
        tracing::info!(connection_id = %connection_id, "WebSocket 连接已建立");

        let (mut sender, mut incoming) = socket.split();

        // 所有对 sender 的写操作都经过这个队列
        let (cmd_tx, mut cmd_rx) = mpsc::channel::<WsCommand>(32);

        let mut send_task = tokio::spawn(async move {
            loop {
                let message = tokio::select! {
                    Some(cmd) = cmd_rx.recv() => match cmd {
                        WsCommand::SendPong(data) => WsMessage::Pong(data.into()),
                    },
                    Some(event) = outbound.recv() => match encode(&event) {
                        Some(text) => WsMessage::Text(text.into()),
                        None => continue,
                    },
                    else => break,
                };
                if sender.send(message).await.is_err() {
                    tracing::debug!(connection_id = %connection_id, "写入失败，客户端已断开");
                    break;
                }
            }
        });

        let recv_hub = hub.clone();
        let mut recv_task = tokio::spawn(async move {
            while let Some(Ok(message)) = incoming.next().await {
                if let Flow::Stop =
                    Self::handle_incoming(message, &recv_hub, connection_id, &cmd_tx).await
                {
                    break;
                }
            }
        });

        tokio::select! {
            _ = &mut send_task => recv_task.abort(),
            _ = &mut recv_task => send_task.abort(),
        }

        // 传输层断开：从注册表移除并广播
        if let Err(err) = hub.close(connection_id).await {
            tracing::error!(error = %err, connection_id = %connection_id, "清理连接失败");
        }
        tracing::info!(connection_id = %connection_id, "WebSocket 连接已断开");
    }

    /// 处理来自客户端的帧
    ///
    /// 无法解析的事件只记录日志并丢弃，连接保持打开。
    async fn handle_incoming(
        message: WsMessage,
        hub: &PresenceHub,
        connection_id: ConnectionId,
        cmd_tx: &mpsc::Sender<WsCommand>,
    ) -> Flow {
        match message {
            WsMessage::Text(text) => match ClientEvent::from_frame(text.as_str()) {
                Ok(event) => {
                    if let Err(err) = hub.dispatch(connection_id, event).await {
                        tracing::error!(error = %err, connection_id = %connection_id, "提交事件失败");
                        return Flow::Stop;
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, connection_id = %connection_id, "丢弃无效事件帧");
                }
            },
            WsMessage::Close(_) => {
                tracing::debug!(connection_id = %connection_id, "收到关闭帧");
                return Flow::Stop;
            }
            WsMessage::Ping(data) => {
                if cmd_tx.send(WsCommand::SendPong(data.to_vec())).await.is_err() {
                    return Flow::Stop;
                }
            }
            WsMessage::Pong(_) => {}
            WsMessage::Binary(_) => {
                tracing::debug!(connection_id = %connection_id, "忽略二进制帧");
            }
        }
        Flow::Continue
    }
}

fn encode(event: &ServerEvent) -> Option<String> {
    match event.to_frame() {
        Ok(text) => Some(text),
        Err(err) => {
            tracing::warn!(error = %err, event = event.name(), "事件序列化失败");
            None
        }
    }
}

/// WebSocket 写操作命令
#[derive(Debug)]
enum WsCommand {
    SendPong(Vec<u8>),
}
