use axum::{
    extract::{DefaultBodyLimit, Multipart, State, WebSocketUpgrade},
    http::{header, HeaderMap, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use config::{AppConfig, ServerConfig};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use application::UploadRequest;
use domain::{LoginProfile, SessionId};

use crate::{error::ApiError, state::AppState, ws_connection::WebSocketConnection};

/// 会话 cookie 名称
pub const SESSION_COOKIE: &str = "sid";

#[derive(Debug, Deserialize)]
struct LoginPayload {
    #[serde(default)]
    name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    avatar: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    logged_in: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<LoginProfile>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AvatarResponse {
    avatar_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    success: bool,
    file_path: String,
    file_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    open_connections: usize,
    participants: usize,
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    let storage = &config.storage;
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(websocket_upgrade))
        .route("/login", post(login))
        .route("/session", get(session))
        .route("/upload-avatar", post(upload_avatar))
        .route("/upload", post(upload_file))
        .nest_service(&storage.public_prefix, ServeDir::new(&storage.upload_dir))
        .fallback_service(ServeDir::new(&storage.static_dir))
        .layer(DefaultBodyLimit::max(storage.max_upload_bytes))
        .layer(cors_layer(&config.server))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);
    if server.cors_origins.is_empty() || server.cors_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "忽略无效的 CORS 来源");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let stats = state.hub.stats().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        open_connections: stats.open_connections,
        participants: stats.participants,
    }))
}

async fn websocket_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| WebSocketConnection::new(socket, state.hub).run())
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginPayload>,
) -> Result<Response, ApiError> {
    let profile = LoginProfile::new(payload.name, payload.status, payload.avatar)
        .map_err(application::ApplicationError::from)?;

    // 只沿用服务端签发过的会话，未知标识一律换新
    let issued = match session_cookie(&headers) {
        Some(id) => state.sessions.get(id).await?.map(|_| id),
        None => None,
    };
    let session_id = issued.unwrap_or_else(SessionId::random);
    tracing::info!(name = %profile.name, "用户登录");
    state.sessions.put(session_id, profile).await?;

    let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax");
    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|_| ApiError::internal_server_error("failed to build session cookie"))?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse { logged_in: true }),
    )
        .into_response())
}

async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, ApiError> {
    let user = match session_cookie(&headers) {
        Some(id) => state.sessions.get(id).await?,
        None => None,
    };
    Ok(Json(SessionResponse {
        logged_in: user.is_some(),
        user,
    }))
}

async fn upload_avatar(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AvatarResponse>, ApiError> {
    let request = read_file_field(multipart, "avatar")
        .await?
        .ok_or_else(ApiError::no_file_uploaded)?;
    let stored = state.uploads.store(request).await?;
    Ok(Json(AvatarResponse {
        avatar_url: stored.locator,
    }))
}

async fn upload_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let request = read_file_field(multipart, "file")
        .await?
        .ok_or_else(ApiError::no_file_uploaded)?;
    let stored = state.uploads.store(request).await?;
    Ok(Json(UploadResponse {
        success: true,
        file_path: stored.locator,
        file_type: stored.content_type,
    }))
}

/// 读取指定名称的 multipart 文件字段，其余字段忽略
async fn read_file_field(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<Option<UploadRequest>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(field_name) {
            continue;
        }
        let original_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await?;
        return Ok(Some(UploadRequest {
            field: field_name.to_string(),
            original_name,
            content_type,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}

/// 从 Cookie 头中取出会话标识
fn session_cookie(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| SessionId::parse(value))
}
