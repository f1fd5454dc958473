//! Authentication service.
//!
//! Orchestrates the lockout tracker, credential store, password hasher,
//! and token issuer into the login and authorization operations. The
//! ordering inside [`AuthService::login`] is load-bearing:
//!
//! 1. Lockout check. A locked identity is rejected before the store or
//!    hasher is touched, so lockout is not a password oracle and locked
//!    attempts cost nothing.
//! 2. Store lookup. A missing identity still pays for one password
//!    verification against a dummy digest, keeping the timing of
//!    "unknown user" and "wrong password" alike.
//! 3. Password verification, then status check. Disabled accounts are
//!    reported only after the credentials prove the caller owns them.

use chrono::{DateTime, Utc};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::events::SecurityEvent;
use crate::lockout::{LockoutPolicy, LockoutStatus, LockoutTracker};
use crate::password::{hash_password, verify_password, PasswordHashError};
use crate::security_event;
use crate::store::{Credential, CredentialStore, Role, StoreError, UserStatus};
use crate::token::{self, Claims};

/// Role requirement attached to a protected operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRequirement {
    /// Any valid token.
    Authenticated,
    /// ADMIN role required.
    Admin,
}

impl RoleRequirement {
    pub fn satisfied_by(self, role: Role) -> bool {
        match self {
            Self::Authenticated => true,
            Self::Admin => role == Role::Admin,
        }
    }
}

/// Verified caller context produced by [`AuthService::authorize`].
#[derive(Debug, Clone)]
pub struct AuthzContext {
    pub identity: String,
    pub role: Role,
}

/// Successful login result.
#[derive(Debug, Clone)]
pub struct LoginOutput {
    pub token: String,
    pub username: String,
    pub role: Role,
    pub full_name: String,
}

/// Request to provision a new credential record.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
}

/// The authentication core, generic over credential storage.
pub struct AuthService<S: CredentialStore> {
    store: S,
    lockout: LockoutTracker,
    config: AuthConfig,
    /// Digest of an unguessable value, verified against when the username
    /// does not exist so both paths hash exactly once.
    dummy_hash: String,
}

impl<S: CredentialStore> AuthService<S> {
    pub fn new(store: S, config: AuthConfig) -> Result<Self, PasswordHashError> {
        let lockout = LockoutTracker::new(LockoutPolicy::from_config(&config));
        let nonce = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let dummy_hash = hash_password(&format!("wellhead-dummy-{nonce}"))?;
        Ok(Self {
            store,
            lockout,
            config,
            dummy_hash,
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn lockout(&self) -> &LockoutTracker {
        &self.lockout
    }

    /// Authenticate a username/password pair and issue a token.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutput, AuthError> {
        self.login_at(username, password, Utc::now()).await
    }

    /// [`login`](Self::login) against an explicit clock.
    pub async fn login_at(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutput, AuthError> {
        let identity = normalize_identity(username);

        if let LockoutStatus::Locked { retry_after } = self.lockout.check_at(&identity, now) {
            security_event!(
                SecurityEvent::LoginBlocked,
                identity = %identity,
                retry_after_secs = retry_after.as_secs(),
                "login attempt on locked identity"
            );
            return Err(AuthError::AccountLocked { retry_after });
        }

        let credential = self.store.find_by_username(&identity).await?;

        let Some(credential) = credential else {
            // Unknown identity: burn one verification against the dummy
            // digest so this path is not observably faster.
            let _ = verify_password(password, &self.dummy_hash);
            return Err(self.fail_attempt(&identity, now));
        };

        if !verify_password(password, &credential.password_hash) {
            return Err(self.fail_attempt(&identity, now));
        }

        if credential.status == UserStatus::Disabled {
            security_event!(
                SecurityEvent::LoginFailed,
                identity = %identity,
                reason = "account_disabled",
                "login rejected for disabled account"
            );
            return Err(AuthError::AccountDisabled);
        }

        self.lockout.record_success(&identity);
        self.store.touch_last_login(&identity, now).await?;
        let token = token::issue(&identity, credential.role, &self.config)?;

        security_event!(
            SecurityEvent::LoginSuccess,
            identity = %identity,
            role = %credential.role,
            "login succeeded"
        );

        Ok(LoginOutput {
            token,
            username: identity,
            role: credential.role,
            full_name: credential.full_name,
        })
    }

    /// Record a failed attempt and produce the uniform rejection.
    ///
    /// Even the attempt that locks the identity reports plain invalid
    /// credentials; the lockout only answers *subsequent* attempts.
    fn fail_attempt(&self, identity: &str, now: DateTime<Utc>) -> AuthError {
        let outcome = self.lockout.record_failure_at(identity, now);
        security_event!(
            SecurityEvent::LoginFailed,
            identity = %identity,
            failed_count = outcome.failed_count,
            "login failed"
        );
        AuthError::InvalidCredentials
    }

    /// Verify a bearer token against a role requirement.
    pub fn authorize(
        &self,
        token: &str,
        requirement: RoleRequirement,
    ) -> Result<AuthzContext, AuthError> {
        let claims: Claims = token::verify(token, &self.config)?;

        if !requirement.satisfied_by(claims.role) {
            security_event!(
                SecurityEvent::AccessDenied,
                identity = %claims.sub,
                role = %claims.role,
                "insufficient role for operation"
            );
            return Err(AuthError::Forbidden);
        }

        security_event!(
            SecurityEvent::AccessGranted,
            identity = %claims.sub,
            role = %claims.role,
            "access granted"
        );

        Ok(AuthzContext {
            identity: claims.sub,
            role: claims.role,
        })
    }

    /// Provision a new USER credential record.
    ///
    /// The bootstrap administrator is the only ADMIN the system has;
    /// this path always creates USER accounts.
    pub async fn provision(&self, new_user: NewUser) -> Result<Credential, AuthError> {
        let username = normalize_identity(&new_user.username);
        let full_name = new_user.full_name.trim().to_string();
        let email = new_user.email.trim().to_lowercase();

        if username.is_empty() {
            return Err(AuthError::Validation("username is required".to_string()));
        }
        if new_user.password.len() < 6 {
            return Err(AuthError::Validation(
                "password must be at least 6 characters".to_string(),
            ));
        }
        if full_name.is_empty() {
            return Err(AuthError::Validation("full name is required".to_string()));
        }
        if email.is_empty() {
            return Err(AuthError::Validation("email is required".to_string()));
        }

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AuthError::Conflict(format!(
                "email '{email}' already in use"
            )));
        }

        let credential = Credential {
            username: username.clone(),
            password_hash: hash_password(&new_user.password)?,
            role: Role::User,
            status: UserStatus::Active,
            full_name,
            email,
            last_login: None,
        };

        match self.store.insert(credential.clone()).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                return Err(AuthError::Conflict(format!(
                    "username '{username}' already exists"
                )));
            }
            Err(err) => return Err(AuthError::Store(err)),
        }

        security_event!(
            SecurityEvent::UserProvisioned,
            identity = %username,
            "user account provisioned"
        );

        Ok(credential)
    }

    /// Insert the bootstrap administrator if it does not exist yet.
    pub async fn seed_admin(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let identity = normalize_identity(username);
        if self.store.find_by_username(&identity).await?.is_some() {
            return Ok(());
        }

        let credential = Credential {
            username: identity.clone(),
            password_hash: hash_password(password)?,
            role: Role::Admin,
            status: UserStatus::Active,
            full_name: "Administrator".to_string(),
            email: format!("{identity}@localhost"),
            last_login: None,
        };
        self.store.insert(credential).await?;
        tracing::info!(identity = %identity, "bootstrap administrator seeded");
        Ok(())
    }
}

/// Identities are compared case-insensitively; everything stores and
/// looks up the lowercase form.
fn normalize_identity(username: &str) -> String {
    username.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCredentialStore;

    async fn service_with_user(
        username: &str,
        password: &str,
        status: UserStatus,
    ) -> AuthService<MemoryCredentialStore> {
        let service = AuthService::new(MemoryCredentialStore::new(), AuthConfig::default()).unwrap();
        service
            .store()
            .insert(Credential {
                username: username.to_string(),
                password_hash: hash_password(password).unwrap(),
                role: Role::User,
                status,
                full_name: "Operario Uno".to_string(),
                email: format!("{username}@planta.example"),
                last_login: None,
            })
            .await
            .unwrap();
        service
    }

    #[tokio::test]
    async fn login_success_issues_verifiable_token() {
        let service = service_with_user("operario1", "operario123", UserStatus::Active).await;
        let output = service.login("operario1", "operario123").await.unwrap();
        assert_eq!(output.username, "operario1");
        assert_eq!(output.role, Role::User);

        let ctx = service
            .authorize(&output.token, RoleRequirement::Authenticated)
            .unwrap();
        assert_eq!(ctx.identity, "operario1");
    }

    #[tokio::test]
    async fn username_is_case_insensitive() {
        let service = service_with_user("operario1", "operario123", UserStatus::Active).await;
        let output = service.login("  OPERARIO1 ", "operario123").await.unwrap();
        assert_eq!(output.username, "operario1");
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_are_indistinguishable() {
        let service = service_with_user("operario1", "operario123", UserStatus::Active).await;

        let unknown = service.login("ghost", "whatever").await.unwrap_err();
        let wrong = service.login("operario1", "wrong").await.unwrap_err();
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn disabled_account_rejected_with_correct_password() {
        let service = service_with_user("operario1", "operario123", UserStatus::Disabled).await;
        let err = service.login("operario1", "operario123").await.unwrap_err();
        assert!(matches!(err, AuthError::AccountDisabled));
        // Not a failed credential attempt.
        assert_eq!(service.lockout().failed_count("operario1"), 0);
    }

    #[tokio::test]
    async fn fifth_failure_reports_invalid_credentials_not_locked() {
        let service = service_with_user("operario1", "operario123", UserStatus::Active).await;
        for _ in 0..5 {
            let err = service.login("operario1", "wrong").await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
        }
        // Only the sixth attempt observes the lock.
        let err = service.login("operario1", "operario123").await.unwrap_err();
        assert!(matches!(err, AuthError::AccountLocked { .. }));
    }

    #[tokio::test]
    async fn admin_requirement_rejects_user_role() {
        let service = service_with_user("operario1", "operario123", UserStatus::Active).await;
        let output = service.login("operario1", "operario123").await.unwrap();
        let err = service
            .authorize(&output.token, RoleRequirement::Admin)
            .unwrap_err();
        assert!(matches!(err, AuthError::Forbidden));
    }

    #[tokio::test]
    async fn provision_creates_user_role_only() {
        let service = service_with_user("admin", "admin123", UserStatus::Active).await;
        let created = service
            .provision(NewUser {
                username: "Operario2".to_string(),
                password: "secreto7".to_string(),
                full_name: " Operario Dos ".to_string(),
                email: "DOS@Planta.example".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(created.username, "operario2");
        assert_eq!(created.role, Role::User);
        assert_eq!(created.email, "dos@planta.example");
        assert_eq!(created.full_name, "Operario Dos");
    }

    #[tokio::test]
    async fn provision_rejects_short_password_and_duplicates() {
        let service = service_with_user("operario1", "operario123", UserStatus::Active).await;

        let err = service
            .provision(NewUser {
                username: "nuevo".to_string(),
                password: "abc".to_string(),
                full_name: "Nuevo".to_string(),
                email: "nuevo@planta.example".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));

        let err = service
            .provision(NewUser {
                username: "OPERARIO1".to_string(),
                password: "secreto7".to_string(),
                full_name: "Dup".to_string(),
                email: "dup@planta.example".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));
    }

    #[tokio::test]
    async fn provision_requires_full_name_and_email() {
        let service = service_with_user("admin", "admin123", UserStatus::Active).await;

        let err = service
            .provision(NewUser {
                username: "nuevo".to_string(),
                password: "secreto7".to_string(),
                full_name: "   ".to_string(),
                email: "nuevo@planta.example".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));

        let err = service
            .provision(NewUser {
                username: "nuevo".to_string(),
                password: "secreto7".to_string(),
                full_name: "Nuevo Usuario".to_string(),
                email: "".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn provision_rejects_duplicate_email() {
        let service = service_with_user("admin", "admin123", UserStatus::Active).await;
        service
            .provision(NewUser {
                username: "uno".to_string(),
                password: "secreto7".to_string(),
                full_name: "Usuario Uno".to_string(),
                email: "Same@Planta.example".to_string(),
            })
            .await
            .unwrap();

        // Same address, different case and username.
        let err = service
            .provision(NewUser {
                username: "dos".to_string(),
                password: "secreto7".to_string(),
                full_name: "Usuario Dos".to_string(),
                email: "same@planta.example".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));
    }

    #[tokio::test]
    async fn seed_admin_is_idempotent() {
        let service = AuthService::new(MemoryCredentialStore::new(), AuthConfig::default()).unwrap();
        service.seed_admin("admin", "admin123").await.unwrap();
        service.seed_admin("admin", "otherpass").await.unwrap();
        assert_eq!(service.store().count().await.unwrap(), 1);

        // First seed wins.
        let output = service.login("admin", "admin123").await.unwrap();
        assert_eq!(output.role, Role::Admin);
    }
}
