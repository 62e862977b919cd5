//! Authentication handlers: register, login, password reset via OTP.

use axum::{extract::State, Extension, Json};
use chrono::{Duration, Utc};
use rand::Rng;
use std::sync::Arc;
use validator::Validate;

use crate::auth::jwt::JwtManager;
use crate::auth::middleware::AuthUser;
use crate::auth::password::{hash_password, verify_password};
use crate::models::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest, ResetPasswordRequest,
    User, UserProfile,
};
use crate::utils::error::ApiError;
use crate::AppState;

const OTP_VALIDITY_MINUTES: i64 = 5;

fn generate_otp() -> String {
    let code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    code.to_string()
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    req.validate()?;

    let email = req.email.trim().to_lowercase();

    let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db.pool)
        .await?;

    if exists.is_some() {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let password_hash = hash_password(&req.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?;

    sqlx::query("INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3)")
        .bind(req.name.trim())
        .bind(&email)
        .bind(&password_hash)
        .execute(&state.db.pool)
        .await?;

    tracing::info!("User registered: {}", email);

    Ok(Json(serde_json::json!({
        "message": "User registered successfully"
    })))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    req.validate()?;

    let email = req.email.trim().to_lowercase();

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db.pool)
        .await?;

    let user = user.ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::Unauthorized("Invalid password".to_string()));
    }

    let jwt_manager = JwtManager::new(&state.config.jwt_secret, state.config.jwt_expiry_seconds);
    let token = jwt_manager
        .generate_token(user.id, user.role)
        .map_err(ApiError::Internal)?;

    let expires_at = Utc::now().timestamp() + state.config.jwt_expiry_seconds as i64;

    tracing::info!("User {} logged in", email);

    Ok(Json(LoginResponse {
        token,
        name: user.name,
        email: user.email,
        role: user.role,
        expires_at,
    }))
}

/// POST /auth/forgot-password
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    req.validate()?;

    let email = req.email.trim().to_lowercase();

    let user_exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db.pool)
        .await?;

    if user_exists.is_none() {
        return Err(ApiError::NotFound("Email not found".to_string()));
    }

    let otp = generate_otp();
    let expires_at = Utc::now() + Duration::minutes(OTP_VALIDITY_MINUTES);

    sqlx::query("UPDATE users SET otp_code = $1, otp_expires_at = $2, updated_at = NOW() WHERE email = $3")
        .bind(&otp)
        .bind(expires_at)
        .bind(&email)
        .execute(&state.db.pool)
        .await?;

    // Best effort; the OTP is in the database regardless.
    let notifier = state.notifier.clone();
    let to = email.clone();
    tokio::spawn(async move {
        notifier.send_password_otp(&to, &otp).await;
    });

    Ok(Json(serde_json::json!({
        "message": "OTP sent to your email"
    })))
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    req.validate()?;

    let email = req.email.trim().to_lowercase();

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db.pool)
        .await?;

    let user = user.ok_or_else(|| ApiError::NotFound("Email not found".to_string()))?;

    match (&user.otp_code, user.otp_expires_at) {
        (Some(code), Some(expiry)) if *code == req.otp => {
            if expiry < Utc::now() {
                return Err(ApiError::InvalidInput("OTP expired".to_string()));
            }
        }
        _ => return Err(ApiError::InvalidInput("Invalid OTP".to_string())),
    }

    let password_hash = hash_password(&req.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?;

    sqlx::query(
        r#"
        UPDATE users
        SET password_hash = $1, otp_code = NULL, otp_expires_at = NULL, updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(&password_hash)
    .bind(user.id)
    .execute(&state.db.pool)
    .await?;

    tracing::info!("Password reset for {}", email);

    Ok(Json(serde_json::json!({
        "message": "Password reset successful"
    })))
}

/// GET /account/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<UserProfile>, ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.user_id)
        .fetch_optional(&state.db.pool)
        .await?;

    let user = user.ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
