use axum::{Extension, Json};
use recorder::Identity;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::{jwt, middleware::AuthUser};
use crate::config::Config;
use crate::db::accounts;
use crate::error::AppError;
use crate::routes::session::{respond, SessionResponse};
use crate::sessions::SessionRegistry;

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

fn user_response(
    id: i64,
    email: &str,
    display_name: Option<&str>,
    created_at: chrono::DateTime<chrono::Utc>,
) -> UserResponse {
    let fallback = email.split('@').next().unwrap_or(email);
    UserResponse {
        id,
        email: email.to_string(),
        display_name: display_name.unwrap_or(fallback).to_string(),
        created_at: created_at.to_rfc3339(),
    }
}

async fn auth_response(
    pool: &PgPool,
    config: &Config,
    identity: &Identity,
) -> Result<Json<AuthResponse>, AppError> {
    let account = accounts::get_account_by_id(pool, identity.account_id)
        .await?
        .ok_or_else(|| AppError::Internal("Failed to retrieve account".into()))?;

    let token = jwt::create_token(identity, &config.jwt_secret, config.jwt_expire_hours)
        .map_err(|e| AppError::Internal(format!("Token creation error: {e}")))?;

    Ok(Json(AuthResponse {
        user: user_response(
            account.id,
            &account.email,
            account.display_name.as_deref(),
            account.created_at,
        ),
        token,
    }))
}

/// POST /api/auth/register
pub async fn register(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    Extension(sessions): Extension<SessionRegistry>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let identity = sessions.register(&req.email, &req.password).await?;
    auth_response(&pool, &config, &identity).await
}

/// POST /api/auth/login
pub async fn login(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    Extension(sessions): Extension<SessionRegistry>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let identity = sessions.login(&req.email, &req.password).await?;
    auth_response(&pool, &config, &identity).await
}

/// POST /api/auth/logout
///
/// Ends the recorder session; any unsaved recording is discarded. Tokens are
/// stateless, so the client drops its own.
pub async fn logout(
    Extension(sessions): Extension<SessionRegistry>,
    user: AuthUser,
) -> Result<Json<SessionResponse>, AppError> {
    let session = sessions.logout(&user).await?;
    let mut recorder = session.lock().await;
    Ok(respond(&mut recorder))
}

/// GET /api/auth/me
pub async fn me(user: AuthUser) -> Json<UserResponse> {
    Json(user_response(
        user.id,
        &user.email,
        user.display_name.as_deref(),
        user.created_at,
    ))
}
