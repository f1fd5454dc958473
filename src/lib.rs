//! # wellhead
//!
//! Authentication and authorization core for an oil-plant inventory and
//! maintenance reporting API.
//!
//! The interesting part of this service is the login path: credential
//! verification with Argon2id, per-identity brute-force lockout, stateless
//! HS256 JWT issuance, and role-based authorization for the protected CRUD
//! routes. Everything else (articles, maintenance reports, dashboards) is a
//! thin consumer of [`AuthService::authorize`] and lives outside this crate.
//!
//! ## Components
//!
//! - **Password hashing** ([`password`]): salted Argon2id digests; verify
//!   never fails on malformed input, it just rejects.
//! - **Lockout tracking** ([`lockout`]): 5 consecutive failures lock an
//!   identity for 15 minutes; the lock expires purely by clock.
//! - **Tokens** ([`token`]): signed, time-bound identity + role assertions.
//!   No server-side session state; rotating the secret revokes everything.
//! - **Auth service** ([`service`]): the login state machine and the
//!   `authorize` entry point for protected endpoints.
//! - **Security events** ([`events`]): structured audit records for every
//!   authentication outcome, emitted through `tracing`.
//!
//! ## Quick Start
//!
//! ```ignore
//! use wellhead::{AuthConfig, AuthService, MemoryCredentialStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AuthConfig::from_env();
//!     let service = AuthService::new(MemoryCredentialStore::new(), config)?;
//!
//!     let app = wellhead::routes::router(wellhead::routes::AppState::new(service));
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod lockout;
pub mod password;
pub mod routes;
pub mod service;
pub mod store;
pub mod token;

// Re-exports
pub use config::{AuthConfig, ServerConfig};
pub use error::AuthError;
pub use events::{SecurityEvent, Severity};
pub use lockout::{LockoutPolicy, LockoutStatus, LockoutTracker};
pub use service::{AuthService, AuthzContext, LoginOutput, RoleRequirement};
pub use store::{Credential, CredentialStore, MemoryCredentialStore, Role, UserStatus};
pub use token::{Claims, TokenError, TokenIssueError};
