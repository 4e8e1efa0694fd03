/**
 * Authentication Routes
 * Cookie-based admin sessions with login, logout, me and password reset
 */
use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use super::payload::ValidJson;
use super::SuccessResponse;
use crate::auth::{
    authenticate, clear_session_cookie, generate_reset_token, hash_password, hash_token,
    issue_token, session_cookie, verify_password,
};
use crate::db::AdminUser;
use crate::error::AppError;
use crate::state::AppState;

/// Minimum length for a new password
pub const MIN_PASSWORD_LENGTH: usize = 8;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Admin info returned to the frontend
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminInfo {
    pub id: String,
    pub username: String,
}

impl From<&AdminUser> for AdminInfo {
    fn from(admin: &AdminUser) -> Self {
        Self {
            id: admin.id.to_string(),
            username: admin.username.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: AdminInfo,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ip = addr.ip().to_string();

    if !state.throttle.check(&ip).await {
        tracing::warn!(ip = %ip, "login throttled");
        return Err(AppError::TooManyRequests);
    }

    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "username and password are required".to_string(),
        ));
    }

    let Some(admin) = state.store().admin_by_username(username).await? else {
        tracing::warn!(username = %username, "login failed: unknown user");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(payload.password, admin.password_hash.clone()).await {
        tracing::warn!(username = %admin.username, "login failed: wrong password");
        return Err(AppError::InvalidCredentials);
    }

    state.throttle.reset(&ip).await;

    let token = issue_token(&state.config.auth, &admin.id.to_string(), &admin.username)
        .map_err(|e| AppError::Internal(format!("failed to create token: {e}")))?;
    let cookie = session_cookie(&state.config.auth, &token)?;

    tracing::info!(username = %admin.username, "admin logged in");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            success: true,
            user: AdminInfo::from(&admin),
            token,
        }),
    ))
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_session_cookie(&state.config.auth))],
        Json(SuccessResponse::ok()),
    )
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AdminInfo>, AppError> {
    let claims = authenticate(&state.config.auth, &headers).ok_or(AppError::Unauthorized)?;
    let admin = state
        .store()
        .admin_by_username(&claims.username)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(AdminInfo::from(&admin)))
}

/// POST /api/auth/forgot-password
///
/// The response never reveals whether the username exists.
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let username = payload.username.trim();
    if !username.is_empty() {
        if let Some(admin) = state.store().admin_by_username(username).await? {
            let token = generate_reset_token();
            let expires_at = Utc::now() + Duration::minutes(state.config.auth.reset_ttl_minutes);
            state
                .store()
                .set_reset_token(admin.id, &hash_token(&token), expires_at)
                .await?;

            // Mail delivery is not wired up; operators pick the link from the log.
            let link = format!("{}/admin/reset-password?token={}", state.config.site.url, token);
            tracing::info!(username = %admin.username, link = %link, "password reset requested");
        } else {
            tracing::debug!(username = %username, "password reset for unknown user");
        }
    }

    Ok(Json(MessageResponse {
        success: true,
        message: "If the account exists, a reset link has been issued.",
    }))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if payload.token.is_empty() {
        return Err(AppError::InvalidResetToken);
    }
    if payload.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let admin = state
        .store()
        .admin_by_reset_token(&hash_token(&payload.token))
        .await?
        .ok_or(AppError::InvalidResetToken)?;
    if !matches!(admin.reset_expires, Some(expires) if expires > Utc::now()) {
        return Err(AppError::InvalidResetToken);
    }

    let password_hash = hash_password(payload.password, state.config.auth.bcrypt_cost).await?;
    state
        .store()
        .complete_password_reset(admin.id, &password_hash)
        .await?;

    tracing::info!(username = %admin.username, "password reset completed");

    Ok(Json(MessageResponse {
        success: true,
        message: "Password updated.",
    }))
}
