//! Security event logging.
//!
//! Every authentication outcome produces a structured, append-only audit
//! record. The records are emitted through `tracing`; storage and rotation
//! belong to whatever subscriber is installed (stdout JSON by default, a
//! log collector in production). The core only produces them.
//!
//! # Usage
//!
//! ```ignore
//! use wellhead::{security_event, SecurityEvent};
//!
//! security_event!(
//!     SecurityEvent::LoginFailed,
//!     identity = %username,
//!     failed_count = 3,
//!     "login failed"
//! );
//! ```

use std::fmt;

/// Security event categories for audit logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    /// Credentials verified, token issued.
    LoginSuccess,
    /// Credential verification failed. Unknown user and wrong password
    /// both land here; the record does not distinguish.
    LoginFailed,
    /// Login attempt rejected without credential checking because the
    /// identity is locked.
    LoginBlocked,
    /// Identity reached the failure threshold and was locked.
    AccountLocked,
    /// A protected operation accepted a token.
    AccessGranted,
    /// A valid token presented an insufficient role.
    AccessDenied,
    /// A new credential record was provisioned.
    UserProvisioned,
}

impl SecurityEvent {
    /// Event category for filtering/grouping.
    pub fn category(&self) -> &'static str {
        match self {
            Self::LoginSuccess | Self::LoginFailed | Self::LoginBlocked => "authentication",
            Self::AccessGranted | Self::AccessDenied => "authorization",
            Self::AccountLocked => "security",
            Self::UserProvisioned => "user_management",
        }
    }

    /// Severity level for the event.
    pub fn severity(&self) -> Severity {
        match self {
            Self::LoginBlocked | Self::AccountLocked => Severity::High,
            Self::LoginFailed | Self::AccessDenied | Self::UserProvisioned => Severity::Medium,
            Self::LoginSuccess | Self::AccessGranted => Severity::Low,
        }
    }

    /// Event name as it appears in log records.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoginSuccess => "login_success",
            Self::LoginFailed => "login_failed",
            Self::LoginBlocked => "login_blocked",
            Self::AccountLocked => "account_locked",
            Self::AccessGranted => "access_granted",
            Self::AccessDenied => "access_denied",
            Self::UserProvisioned => "user_provisioned",
        }
    }
}

impl fmt::Display for SecurityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Event severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Routine operations.
    Low,
    /// Important state changes.
    Medium,
    /// Security-relevant failures.
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Log a security event with structured fields.
///
/// Automatically includes `security_event`, `category`, and `severity`
/// fields and picks the tracing level from the event's severity.
#[macro_export]
macro_rules! security_event {
    ($event:expr, $($field:tt)*) => {{
        let event = $event;
        let category = event.category();
        let event_name = event.name();

        match event.severity() {
            $crate::Severity::High => {
                ::tracing::warn!(
                    security_event = event_name,
                    category = category,
                    severity = "high",
                    $($field)*
                );
            }
            $crate::Severity::Medium => {
                ::tracing::info!(
                    security_event = event_name,
                    category = category,
                    severity = "medium",
                    $($field)*
                );
            }
            $crate::Severity::Low => {
                ::tracing::debug!(
                    security_event = event_name,
                    category = category,
                    severity = "low",
                    $($field)*
                );
            }
        }
    }};
}
