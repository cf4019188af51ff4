//! User account endpoints
//!
//! Passwords are stored as Argon2id PHC strings. Hashing and verification
//! are CPU-heavy, so both run on the blocking thread pool.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, response::Response};
use serde::Deserialize;
use serde_json::json;
use tokio::task;
use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::web::{AppState, handle_error, responses};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Response {
    match register_inner(&state, request).await {
        Ok(body) => responses::created(body),
        Err(e) => handle_error(e),
    }
}

async fn register_inner(
    state: &AppState,
    request: RegisterRequest,
) -> AppResult<serde_json::Value> {
    let username = request.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::validation("username must not be empty"));
    }
    if request.password.len() < 8 {
        return Err(AppError::validation(
            "password must be at least 8 characters",
        ));
    }

    if state.users.find_by_username(&username).await?.is_some() {
        return Err(AppError::validation("username is already taken"));
    }

    let password_hash = hash_password(request.password).await?;
    let user = state
        .users
        .create(&username, request.email.as_deref(), &password_hash)
        .await?;

    info!("Registered user {}", user.username);
    Ok(json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
        "created_at": user.created_at,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Response {
    match login_inner(&state, request).await {
        Ok(body) => responses::ok(body),
        Err(e) => handle_error(e),
    }
}

async fn login_inner(state: &AppState, request: LoginRequest) -> AppResult<serde_json::Value> {
    let invalid = || AppError::validation("invalid username or password");

    let user = state
        .users
        .find_by_username(request.username.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(request.password, user.password_hash.clone()).await? {
        return Err(invalid());
    }

    Ok(json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
    }))
}

async fn hash_password(password: String) -> AppResult<String> {
    task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
    })
    .await
    .map_err(|e| AppError::internal(format!("password hashing task failed: {e}")))?
}

async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash)
            .map_err(|e| AppError::internal(format!("stored hash is malformed: {e}")))?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!(
                "password verification failed: {e}"
            ))),
        }
    })
    .await
    .map_err(|e| AppError::internal(format!("password verification task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_and_verify_round_trip() {
        let hash = hash_password("correct horse".to_string()).await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(
            verify_password("correct horse".to_string(), hash.clone())
                .await
                .unwrap()
        );
        assert!(
            !verify_password("battery staple".to_string(), hash)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn salts_differ_between_hashes() {
        let first = hash_password("same password".to_string()).await.unwrap();
        let second = hash_password("same password".to_string()).await.unwrap();
        assert_ne!(first, second);
    }
}
