use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rail_shared::User;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::AuthorizationError("Invalid or expired token".to_string()))
    }
}

pub fn issue_token(auth: &AuthConfig, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.to_string(),
        exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.expose().as_bytes()))
}

/// Bearer token, falling back to the bare `token` header older clients send.
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(bearer) = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        return Some(bearer.trim());
    }
    headers.get("token").and_then(|h| h.to_str().ok()).map(str::trim)
}

// ============================================================================
// Customer Authentication Middleware
// ============================================================================

pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 1. Extract token
    let token = extract_token(req.headers())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::AuthenticationError("Authorization token is required".to_string()))?;

    // 2. Decode and validate JWT (signature + exp)
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.expose().as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthorizationError("Invalid or expired token".to_string()))?;

    // 3. Inject claims
    req.extensions_mut().insert(token_data.claims);

    Ok(next.run(req).await)
}

// ============================================================================
// Admin API Key Middleware
// ============================================================================

pub async fn admin_key_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get("api-key")
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();

    let expected = state.auth.admin_api_key.expose();
    if !constant_time_eq::constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
        return Err(AppError::AuthorizationError("Invalid API key".to_string()));
    }

    Ok(next.run(req).await)
}
