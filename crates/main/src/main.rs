//! 主应用程序入口
//!
//! 加载配置，启动在线状态中心和 Axum 服务，Ctrl-C 时优雅退出。

use std::{sync::Arc, time::Duration};

use application::{MemorySessionStore, PresenceHub};
use config::AppConfig;
use infrastructure::LocalUploadStore;
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志，未设置 RUST_LOG 时默认 info
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load()?;
    tracing::info!(config = %config.sanitize(), "配置已加载");

    let uploads = LocalUploadStore::new(
        &config.storage.upload_dir,
        config.storage.public_prefix.clone(),
    );
    uploads.ensure_root().await?;

    let (hub, hub_task) = PresenceHub::spawn(&config.hub);
    let state = AppState::new(hub, Arc::new(MemorySessionStore::new()), Arc::new(uploads));
    let app = router(state, &config);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("在线状态网关启动在 http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 已升级的 WebSocket 任务可能仍持有中心句柄，不无限等待
    if tokio::time::timeout(Duration::from_secs(5), hub_task).await.is_err() {
        tracing::warn!("在线状态中心未能及时退出");
    }
    tracing::info!("服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "无法监听退出信号");
        std::future::pending::<()>().await;
    }
    tracing::info!("收到退出信号，开始关闭");
}
