//! 管理 HTTP 接口
//!
//! 注册、管理员登录、用户列表、拉黑、图片上传。每个接口都是对
//! 存储/图片契约的一层薄封装。

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;
use validator::Validate;

use application::services::RegisterUserRequest;
use application::{EphemeralResourceTracker, UserDto};
use domain::{Timestamp, UserRole};

use crate::{error::ApiError, state::AppState, ws};

/// 管理接口鉴权请求头。
const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

#[derive(Debug, Deserialize, Validate)]
struct RegisterPayload {
    #[validate(length(min = 1, max = 50))]
    username: String,
    /// 携带正确口令时以管理员身份注册
    admin_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdminLoginPayload {
    secret: String,
}

#[derive(Debug, Deserialize)]
struct BlacklistPayload {
    /// Some 拉黑（携带原因），None 解除
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    url: String,
    expires_at: Timestamp,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes())
        .route("/ws", get(ws::websocket_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_user))
        .route("/admin/login", post(admin_login))
        .route("/admin/users", get(list_users))
        .route("/admin/users/{user_id}/blacklist", post(set_blacklist))
        .route("/images", post(upload_image))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

fn ensure_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let provided = headers
        .get(ADMIN_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if provided != state.admin_secret.as_ref() {
        return Err(ApiError::unauthorized("invalid admin secret"));
    }
    Ok(())
}

async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let role = match payload.admin_secret {
        Some(secret) if secret == state.admin_secret.as_ref() => UserRole::Admin,
        _ => UserRole::Normal,
    };

    let user = state
        .user_service
        .register(RegisterUserRequest {
            username: payload.username,
            role,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserDto::from(&user))))
}

async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginPayload>,
) -> Result<StatusCode, ApiError> {
    if payload.secret != state.admin_secret.as_ref() {
        return Err(ApiError::unauthorized("invalid admin secret"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    ensure_admin(&state, &headers)?;

    let users = state.user_service.list_users().await?;
    Ok(Json(users.iter().map(UserDto::from).collect()))
}

async fn set_blacklist(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<BlacklistPayload>,
) -> Result<Json<UserDto>, ApiError> {
    ensure_admin(&state, &headers)?;

    let user = state
        .user_service
        .set_blacklist(user_id, payload.reason)
        .await?;
    Ok(Json(UserDto::from(&user)))
}

/// 上传图片：字节写入图片存储，返回公开 URL 与过期时间。
async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    if body.is_empty() {
        return Err(ApiError::bad_request("empty upload"));
    }

    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_owned();

    let name = blob_name(&content_type);
    let url = state
        .blob_store
        .put_blob(&name, body.to_vec(), &content_type)
        .await?;

    let now = Utc::now();
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url,
            expires_at: EphemeralResourceTracker::expiry_for(now),
        }),
    ))
}

/// 随机文件名，扩展名从内容类型推断。
fn blob_name(content_type: &str) -> String {
    let suffix: [u8; 16] = rand::random();
    let extension = match content_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    };
    format!("{}.{}", HEXLOWER.encode(&suffix), extension)
}
