use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header::AUTHORIZATION, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use models::{Credentials, TokenResponse};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::JsonBody;
use crate::auth::{hash_password, verify_password, TokenIssuer};
use crate::errors::ApiError;
use crate::store::{MemoryStore, UserId};

#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<MemoryStore>,
    pub tokens: TokenIssuer,
}

/// Inserted into request extensions by [`require_bearer_token`].
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: UserId,
}

fn require_fields(input: &Credentials) -> Result<(), ApiError> {
    if input.email.trim().is_empty() || input.password.is_empty() {
        return Err(ApiError::BadRequest("Email and password are required".into()));
    }
    Ok(())
}

pub async fn register(
    State(state): State<ServerState>,
    JsonBody(input): JsonBody<Credentials>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    require_fields(&input)?;
    let hash = hash_password(&input.password)?;
    let user_id = state
        .store
        .insert_user(&input.email, hash)
        .await
        .ok_or_else(|| ApiError::Conflict("Email address already in use".into()))?;
    info!(user_id, email = %input.email, "user_registered");
    Ok((StatusCode::CREATED, Json(json!({"message": "User created successfully", "userID": user_id}))))
}

pub async fn login(
    State(state): State<ServerState>,
    JsonBody(input): JsonBody<Credentials>,
) -> Result<Json<TokenResponse>, ApiError> {
    let invalid = || ApiError::Unauthorized("Invalid email or password".into());
    let user = state.store.find_user(&input.email).await.ok_or_else(invalid)?;
    if !verify_password(&input.password, &user.password_hash) {
        return Err(invalid());
    }
    let token = state.tokens.issue(user.id)?;
    info!(user_id = user.id, "user_logged_in");
    Ok(Json(TokenResponse { token }))
}

/// Validates `Authorization: Bearer <token>` and attaches the caller's [`AuthUser`].
pub async fn require_bearer_token(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());
    let Some(header) = header else {
        warn!(%path, "missing Authorization header");
        return Err(ApiError::Unauthorized("Authorization header required".into()));
    };
    let Some(token) = header.strip_prefix("Bearer ") else {
        warn!(%path, "invalid Authorization format (expect Bearer)");
        return Err(ApiError::Unauthorized("Invalid token format".into()));
    };

    let user_id = state.tokens.verify(token).inspect_err(|e| warn!(%path, error = %e, "token validation failed"))?;
    req.extensions_mut().insert(AuthUser { user_id });
    Ok(next.run(req).await)
}
