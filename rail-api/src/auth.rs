use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use rail_core::StoreError;
use rail_shared::{NewUser, Role, User};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{error::AppError, middleware::issue_token, password, state::AppState};

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let Json(req) = payload?;

    let (Some(name), Some(email), Some(password), Some(role)) = (
        non_empty(req.name),
        non_empty(req.email),
        req.password.filter(|p| !p.is_empty()),
        non_empty(req.role),
    ) else {
        return Err(AppError::ValidationError("All fields are required".to_string()));
    };
    let role: Role = role.parse().map_err(AppError::ValidationError)?;

    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(anyhow::Error::from)?
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?;

    let user = state
        .users
        .create_user(NewUser { name, email, password_hash, role })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(_) => {
                AppError::from(StoreError::Duplicate("Email already exists".to_string()))
            }
            other => AppError::from(other),
        })?;

    info!(user_id = %user.id, role = %user.role, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(req) = payload?;

    let (Some(email), Some(password)) = (non_empty(req.email), req.password.filter(|p| !p.is_empty())) else {
        return Err(AppError::ValidationError("Email and password are required".to_string()));
    };

    let invalid = || AppError::AuthenticationError("Invalid credentials".to_string());

    let user = state.users.find_user_by_email(&email).await?.ok_or_else(invalid)?;

    let hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(anyhow::Error::from)?
        .map_err(|e| anyhow::anyhow!("Stored password hash unreadable: {}", e))?;
    if !verified {
        return Err(invalid());
    }

    let token = issue_token(&state.auth, &user)
        .map_err(|e| anyhow::anyhow!("Token encoding failed: {}", e))?;

    Ok(Json(AuthResponse { token }))
}
