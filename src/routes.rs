//! HTTP surface.
//!
//! Thin handlers over [`AuthService`]: extract, delegate, serialize.
//! Role requirements are declared per route as constants next to the
//! handler so the protection level of an endpoint is visible where the
//! endpoint is defined.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::error::AuthError;
use crate::service::{AuthService, NewUser, RoleRequirement};
use crate::store::{CredentialStore, Role};
use crate::token::TokenError;

const VERIFY_REQUIREMENT: RoleRequirement = RoleRequirement::Authenticated;
const CREATE_USER_REQUIREMENT: RoleRequirement = RoleRequirement::Admin;

/// Shared application state, generic over the credential store like the
/// service it wraps.
pub struct AppState<S: CredentialStore> {
    pub service: Arc<AuthService<S>>,
    pub started_at: DateTime<Utc>,
}

impl<S: CredentialStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            started_at: self.started_at,
        }
    }
}

impl<S: CredentialStore> AppState<S> {
    pub fn new(service: AuthService<S>) -> Self {
        Self {
            service: Arc::new(service),
            started_at: Utc::now(),
        }
    }
}

/// Build the application router.
pub fn router<S: CredentialStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login::<S>))
        .route("/api/auth/verify", get(verify::<S>))
        .route("/api/users", post(create_user::<S>))
        .route("/api/health", get(health))
        .route("/api/health/detailed", get(health_detailed::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    username: String,
    role: Role,
    full_name: String,
}

async fn login<S: CredentialStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AuthError::Validation(
            "username and password are required".to_string(),
        ));
    }

    let output = state.service.login(&req.username, &req.password).await?;
    Ok(Json(LoginResponse {
        token: output.token,
        username: output.username,
        role: output.role,
        full_name: output.full_name,
    }))
}

async fn verify<S: CredentialStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    let token = bearer_token(&headers)?;
    let ctx = state.service.authorize(token, VERIFY_REQUIREMENT)?;
    Ok(Json(json!({
        "valid": true,
        "username": ctx.identity,
        "role": ctx.role,
    }))
    .into_response())
}

#[derive(Debug, Deserialize)]
struct CreateUserRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    email: String,
    /// Requested role. Only USER is accepted; the bootstrap administrator
    /// is the single ADMIN the system has.
    role: Option<Role>,
}

async fn create_user<S: CredentialStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Json(req): Json<CreateUserRequest>,
) -> Result<Response, AuthError> {
    let token = bearer_token(&headers)?;
    state.service.authorize(token, CREATE_USER_REQUIREMENT)?;

    if req.role == Some(Role::Admin) {
        return Err(AuthError::Forbidden);
    }

    let created = state
        .service
        .provision(NewUser {
            username: req.username,
            password: req.password,
            full_name: req.full_name,
            email: req.email,
        })
        .await?;

    // The digest never leaves the store layer.
    let body = json!({
        "username": created.username,
        "role": created.role,
        "status": created.status,
        "full_name": created.full_name,
        "email": created.email,
    });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "wellhead",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn health_detailed<S: CredentialStore>(State(state): State<AppState<S>>) -> Response {
    let store = state.service.store();
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0);

    match (store.count().await, store.count_active().await) {
        (Ok(total), Ok(active)) => Json(json!({
            "status": "ok",
            "uptime_seconds": uptime_secs,
            "total_users": total,
            "active_users": active,
        }))
        .into_response(),
        (Err(err), _) | (_, Err(err)) => {
            tracing::error!(error = %err, "health check failed against credential store");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy" })),
            )
                .into_response()
        }
    }
}

/// Extract the bearer token from the `Authorization` header.
///
/// A missing or non-Bearer header is the same failure as an unparseable
/// token.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::Unauthenticated(TokenError::Malformed))
}
