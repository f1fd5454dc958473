//! Credential storage.
//!
//! The [`CredentialStore`] trait is the seam between the authentication
//! core and persistence. The bundled [`MemoryCredentialStore`] backs
//! single-instance deployments and tests; a database-backed store
//! implements the same trait without touching the core.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed role set. Authorization compares against these two values and
/// nothing else; an unknown role string fails deserialization instead of
/// being treated as anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "USER")]
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "ADMIN"),
            Self::User => write!(f, "USER"),
        }
    }
}

/// Account status. A disabled account keeps its record but cannot
/// authenticate, even with correct credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "DISABLED")]
    Disabled,
}

/// A stored credential record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Unique identity, stored lowercase.
    pub username: String,
    /// Argon2id digest in PHC format. Never serialized out of the store
    /// by the API layer.
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
    pub full_name: String,
    pub email: String,
    /// Last successful login, if any.
    pub last_login: Option<DateTime<Utc>>,
}

/// Store failures. Kept distinct from authentication failures: a store
/// outage must never be reported to a caller as bad credentials.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("record already exists: {0}")]
    Duplicate(String),
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence interface for credential records.
pub trait CredentialStore: Send + Sync {
    /// Look up a credential by username. `Ok(None)` means the identity
    /// does not exist; `Err` means the store itself failed.
    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<Credential>, StoreError>> + Send;

    /// Look up a credential by email. Emails are unique across records,
    /// like usernames.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<Credential>, StoreError>> + Send;

    /// Insert a new credential record.
    fn insert(&self, credential: Credential)
        -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Stamp a successful login on the record.
    fn touch_last_login(
        &self,
        username: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Total number of credential records.
    fn count(&self) -> impl Future<Output = Result<usize, StoreError>> + Send;

    /// Number of records with [`UserStatus::Active`].
    fn count_active(&self) -> impl Future<Output = Result<usize, StoreError>> + Send;
}

/// In-memory credential store keyed by lowercase username.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: RwLock<HashMap<String, Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self.records.read().get(username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self
            .records
            .read()
            .values()
            .find(|c| c.email == email)
            .cloned())
    }

    async fn insert(&self, credential: Credential) -> Result<(), StoreError> {
        let mut records = self.records.write();
        if records.contains_key(&credential.username) {
            return Err(StoreError::Duplicate(credential.username));
        }
        records.insert(credential.username.clone(), credential);
        Ok(())
    }

    async fn touch_last_login(&self, username: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(record) = self.records.write().get_mut(username) {
            record.last_login = Some(at);
        }
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().len())
    }

    async fn count_active(&self) -> Result<usize, StoreError> {
        Ok(self
            .records
            .read()
            .values()
            .filter(|c| c.status == UserStatus::Active)
            .count())
    }
}
