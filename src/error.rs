//! Error types and their HTTP mapping.
//!
//! One rule governs the whole surface: a failed login reveals nothing
//! about which part failed. Unknown username, wrong password, and
//! undecodable stored digest all collapse into
//! [`AuthError::InvalidCredentials`] with an identical response body.
//! Lockout and disablement are deliberately distinguishable; they are
//! account states, not credential information.

use std::time::Duration;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;
use crate::token::TokenError;

/// Authentication and authorization failures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username or password wrong. Never says which.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Identity is locked out; retry after the given duration.
    #[error("account locked")]
    AccountLocked { retry_after: Duration },

    /// Account exists, credentials are correct, but the account is disabled.
    #[error("account disabled")]
    AccountDisabled,

    /// No valid token presented on a protected operation.
    #[error("unauthenticated: {0}")]
    Unauthenticated(#[from] TokenError),

    /// Valid token, insufficient role.
    #[error("forbidden")]
    Forbidden,

    /// Request payload failed validation.
    #[error("{0}")]
    Validation(String),

    /// Resource conflict, e.g. provisioning an existing username.
    #[error("{0}")]
    Conflict(String),

    /// The credential store failed. Surfaces as a 500, never as
    /// `InvalidCredentials`.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Digest production failed while provisioning a credential.
    #[error("hashing error: {0}")]
    Hashing(#[from] crate::password::PasswordHashError),

    /// Token signing failed on an otherwise successful login.
    #[error("token issuance error: {0}")]
    TokenIssuance(#[from] crate::token::TokenIssueError),
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AccountLocked { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::AccountDisabled => StatusCode::FORBIDDEN,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Store(_) | Self::Hashing(_) | Self::TokenIssuance(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable error code.
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::AccountLocked { .. } => "account_locked",
            Self::AccountDisabled => "account_disabled",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::Validation(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::Store(_) | Self::Hashing(_) | Self::TokenIssuance(_) => "internal_error",
        }
    }

    /// Client-facing message. Internal detail (store errors, token
    /// rejection reasons) stays in the logs.
    fn message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Invalid username or password".to_string(),
            Self::AccountLocked { .. } => {
                "Account temporarily locked due to repeated failed logins".to_string()
            }
            Self::AccountDisabled => "Account is disabled".to_string(),
            Self::Unauthenticated(_) => "Authentication required".to_string(),
            Self::Forbidden => "Insufficient permissions".to_string(),
            Self::Validation(msg) | Self::Conflict(msg) => msg.clone(),
            Self::Store(_) | Self::Hashing(_) | Self::TokenIssuance(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

/// JSON error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            Self::Store(err) => tracing::error!(error = %err, "credential store failure"),
            Self::Hashing(err) => tracing::error!(error = %err, "password hashing failure"),
            Self::TokenIssuance(err) => tracing::error!(error = %err, "token signing failure"),
            _ => {}
        }

        let retry_after_seconds = match self {
            Self::AccountLocked { retry_after } => Some(retry_after.as_secs()),
            _ => None,
        };

        let body = ErrorResponse {
            error: self.code(),
            message: self.message(),
            retry_after_seconds,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after_seconds {
            if let Ok(value) = secs.to_string().parse() {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::AccountLocked {
                retry_after: Duration::from_secs(900)
            }
            .status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(AuthError::AccountDisabled.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::Unauthenticated(TokenError::Expired).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Store(StoreError::Unavailable("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn locked_response_carries_retry_after() {
        let response = AuthError::AccountLocked {
            retry_after: Duration::from_secs(312),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok()),
            Some("312")
        );
    }

    #[test]
    fn signing_failure_is_internal_not_unauthenticated() {
        let err = AuthError::TokenIssuance(crate::token::TokenIssueError("boom".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "internal_error");
    }

    #[test]
    fn store_error_message_hides_detail() {
        let err = AuthError::Store(StoreError::Unavailable(
            "connection refused at 10.0.0.3:5432".into(),
        ));
        assert_eq!(err.message(), "Internal server error");
    }
}
