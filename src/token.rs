//! JWT issuance and verification.
//!
//! Tokens are stateless: a signed HS256 assertion of identity and role,
//! valid for a fixed lifetime from issuance and verified by signature and
//! expiry alone. Nothing is persisted server-side, so there is no
//! per-token revocation; rotating the signing secret invalidates every
//! outstanding token.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;
use crate::store::Role;

/// Claims embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the username.
    pub sub: String,
    /// Role at issuance time.
    pub role: Role,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Why a token was rejected.
///
/// Checks run in this order: structure, signature, expiry. Any single
/// failure invalidates the whole token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Not a structurally valid JWT (or not a token at all).
    #[error("malformed token")]
    Malformed,
    /// Well-formed but not signed with our secret.
    #[error("invalid token signature")]
    InvalidSignature,
    /// Signature valid but the token has expired.
    #[error("token expired")]
    Expired,
}

/// Failure to sign a token. An infrastructure fault, distinct from the
/// verification rejections in [`TokenError`].
#[derive(Debug, Error)]
#[error("token signing failed: {0}")]
pub struct TokenIssueError(pub(crate) String);

/// Issue a signed token for an authenticated identity.
pub fn issue(identity: &str, role: Role, config: &AuthConfig) -> Result<String, TokenIssueError> {
    issue_at(identity, role, config, Utc::now())
}

/// Issue a token with an explicit issuance instant.
pub(crate) fn issue_at(
    identity: &str,
    role: Role,
    config: &AuthConfig,
    issued_at: DateTime<Utc>,
) -> Result<String, TokenIssueError> {
    let iat = issued_at.timestamp();
    let claims = Claims {
        sub: identity.to_string(),
        role,
        iat,
        exp: iat + config.token_lifetime.as_secs() as i64,
    };

    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| TokenIssueError(e.to_string()))
}

/// Verify a token and return its claims.
///
/// Zero validation leeway: a token is rejected the second its lifetime
/// elapses.
pub fn verify(token: &str, config: &AuthConfig) -> Result<Claims, TokenError> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["sub", "exp"]);

    jsonwebtoken::decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        })
}
