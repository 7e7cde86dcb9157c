#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use application::{MemorySessionStore, PresenceHub, UploadStore};
use config::AppConfig;
use futures_util::{SinkExt, StreamExt};
use infrastructure::LocalUploadStore;
use serde_json::Value;
use tempfile::TempDir;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::oneshot,
    time::timeout,
};
use tokio_tungstenite::{
    connect_async, tungstenite::Message as TungsteniteMessage, MaybeTlsStream, WebSocketStream,
};
use web_api::{router, AppState};

/// 运行中的测试服务器，释放时关闭
pub struct TestServer {
    pub addr: SocketAddr,
    pub hub: PresenceHub,
    pub dir: TempDir,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(&dir);
        let uploads = Arc::new(LocalUploadStore::new(
            &config.storage.upload_dir,
            config.storage.public_prefix.clone(),
        ));
        Self::start_with(dir, config, uploads).await
    }

    pub async fn start_with(dir: TempDir, config: AppConfig, uploads: Arc<dyn UploadStore>) -> Self {
        let (hub, _task) = PresenceHub::spawn(&config.hub);
        let state = AppState::new(hub.clone(), Arc::new(MemorySessionStore::new()), uploads);
        let app = router(state, &config);

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Self {
            addr,
            hub,
            dir,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn http(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn connect(&self) -> WsClient {
        let before = self.hub.stats().await.expect("stats").open_connections;
        let (stream, _) = connect_async(format!("ws://{}/ws", self.addr))
            .await
            .expect("ws connect");
        let client = WsClient { stream };
        // 等待中心挂载该会话，避免错过紧随其后的广播
        self.wait_for_open(before + 1).await;
        client
    }

    pub async fn wait_for_open(&self, expected: usize) {
        timeout(Duration::from_secs(2), async {
            loop {
                let stats = self.hub.stats().await.expect("stats");
                if stats.open_connections == expected {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("open connection count did not settle");
    }

    pub async fn wait_for_participants(&self, expected: usize) {
        timeout(Duration::from_secs(2), async {
            loop {
                let stats = self.hub.stats().await.expect("stats");
                if stats.participants == expected {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("participant count did not settle");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub fn test_config(dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.server.host = "127.0.0.1".into();
    config.storage.static_dir = dir.path().join("public");
    config.storage.upload_dir = dir.path().join("uploads");
    config
}

pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn emit(&mut self, event: &str, data: Value) {
        let frame = serde_json::json!({ "event": event, "data": data }).to_string();
        self.send_raw(&frame).await;
    }

    pub async fn send_raw(&mut self, frame: &str) {
        self.stream
            .send(TungsteniteMessage::text(frame.to_string()))
            .await
            .expect("ws send");
    }

    /// 读取下一条事件帧，超时则 panic
    pub async fn next_event(&mut self) -> Value {
        self.try_next_event(Duration::from_secs(2))
            .await
            .expect("timed out waiting for event")
    }

    /// 在给定时间内读取下一条事件帧
    pub async fn try_next_event(&mut self, wait: Duration) -> Option<Value> {
        loop {
            let message = timeout(wait, self.stream.next()).await.ok()??.ok()?;
            if let TungsteniteMessage::Text(text) = message {
                return Some(serde_json::from_str(text.as_str()).expect("json frame"));
            }
        }
    }

    /// 读取事件直到遇到指定事件名，返回该事件
    pub async fn expect_event(&mut self, name: &str) -> Value {
        loop {
            let event = self.next_event().await;
            if event["event"] == name {
                return event;
            }
        }
    }

    /// 确认在一段时间内没有收到任何事件
    pub async fn expect_silence(&mut self) {
        if let Some(event) = self.try_next_event(Duration::from_millis(200)).await {
            panic!("unexpected event: {event}");
        }
    }

    pub async fn close(mut self) {
        self.stream.close(None).await.ok();
    }
}

/// 名单事件中的名字，排序后返回
pub fn roster_names(event: &Value) -> Vec<String> {
    assert_eq!(event["event"], "update-user-list");
    let mut names: Vec<String> = event["data"]
        .as_object()
        .expect("roster object")
        .values()
        .map(|entry| entry["name"].as_str().unwrap_or_default().to_string())
        .collect();
    names.sort();
    names
}
