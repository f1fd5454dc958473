//! Runtime configuration.
//!
//! All knobs are environment-driven with safe defaults, so a bare
//! `wellhead` binary comes up with the documented behavior (5 attempts,
//! 15 minute lockout, 24 hour tokens) and production deployments override
//! only what they need.

use std::time::Duration;

/// Fallback signing secret for local development.
///
/// Refused outside development: [`AuthConfig::from_env`] panics at startup
/// if `WELLHEAD_JWT_SECRET` is unset while `APP_ENV=production`.
const DEV_SECRET: &str = "dev-secret-key";

/// Configuration for the authentication core.
///
/// The signing secret is process-wide and loaded once at startup; rotating
/// it invalidates every outstanding token.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret for JWTs.
    pub jwt_secret: String,
    /// Consecutive failed logins before an identity is locked (default: 5).
    pub max_failed_attempts: u32,
    /// How long a locked identity stays locked (default: 15 minutes).
    pub lockout_duration: Duration,
    /// Token lifetime from issuance (default: 24 hours).
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_SECRET.to_string(),
            max_failed_attempts: 5,
            lockout_duration: Duration::from_secs(15 * 60),
            token_lifetime: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl AuthConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `WELLHEAD_JWT_SECRET`: token signing secret (required in production)
    /// - `WELLHEAD_MAX_FAILED_ATTEMPTS`: lockout threshold (default: 5)
    /// - `WELLHEAD_LOCKOUT_SECS`: lockout duration in seconds (default: 900)
    /// - `WELLHEAD_TOKEN_LIFETIME_SECS`: token lifetime in seconds (default: 86400)
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` is `production` and no signing secret is set.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let jwt_secret = match std::env::var("WELLHEAD_JWT_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                if is_production() {
                    panic!("WELLHEAD_JWT_SECRET must be set in production");
                }
                tracing::warn!("WELLHEAD_JWT_SECRET not set, using development secret");
                defaults.jwt_secret
            }
        };

        Self {
            jwt_secret,
            max_failed_attempts: env_parse(
                "WELLHEAD_MAX_FAILED_ATTEMPTS",
                defaults.max_failed_attempts,
            ),
            lockout_duration: Duration::from_secs(env_parse(
                "WELLHEAD_LOCKOUT_SECS",
                defaults.lockout_duration.as_secs(),
            )),
            token_lifetime: Duration::from_secs(env_parse(
                "WELLHEAD_TOKEN_LIFETIME_SECS",
                defaults.token_lifetime.as_secs(),
            )),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:5000`.
    pub bind: String,
    /// Username of the bootstrap administrator account.
    pub admin_username: String,
    /// Password for the bootstrap administrator account.
    pub admin_password: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `WELLHEAD_BIND`: listen address (default: "0.0.0.0:5000")
    /// - `WELLHEAD_ADMIN_USER`: bootstrap admin username (default: "admin")
    /// - `WELLHEAD_ADMIN_PASSWORD`: bootstrap admin password (required in
    ///   production, defaults to "admin123" for development)
    ///
    /// The bootstrap admin is the only ADMIN record the system ever has;
    /// provisioning through the API always creates USER accounts.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let admin_password = match std::env::var("WELLHEAD_ADMIN_PASSWORD") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                if is_production() {
                    panic!("WELLHEAD_ADMIN_PASSWORD must be set in production");
                }
                tracing::warn!("WELLHEAD_ADMIN_PASSWORD not set, using development default");
                defaults.admin_password
            }
        };

        Self {
            bind: std::env::var("WELLHEAD_BIND").unwrap_or(defaults.bind),
            admin_username: std::env::var("WELLHEAD_ADMIN_USER").unwrap_or(defaults.admin_username),
            admin_password,
        }
    }
}

/// Whether we are running with production settings.
///
/// Uses `APP_ENV` or `RUST_ENV`; anything other than "production"/"prod"
/// counts as development.
fn is_production() -> bool {
    let env = std::env::var("APP_ENV")
        .or_else(|_| std::env::var("RUST_ENV"))
        .unwrap_or_else(|_| "development".to_string());
    matches!(env.to_lowercase().as_str(), "production" | "prod")
}

/// Parse an environment variable, falling back to the default on absence.
/// Unparseable values fall back too, with a warning.
fn env_parse<T: std::str::FromStr + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(key, value = %raw, %default, "unparseable value, using default");
                default
            }
        },
        Err(_) => default,
    }
}
