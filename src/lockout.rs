//! Login attempt tracking and account lockout.
//!
//! Tracks consecutive failed login attempts per identity and locks the
//! identity after a configurable threshold. The lock expires purely by
//! clock: any check after `locked_until` observes the identity as open
//! again with a fresh counter. There is no manual unlock path.
//!
//! Scope is per-identity only, not per-(identity, source IP): failures
//! count against the account regardless of where they come from.
//!
//! # State machine, per identity
//!
//! - OPEN, failure (count < threshold): increment, stay OPEN
//! - OPEN, failure (count reaches threshold): set `locked_until`, LOCKED
//! - OPEN, success: reset counter
//! - LOCKED, any check after `locked_until`: clear, OPEN
//!
//! Mutations take the tracker's write lock, so concurrent failing attempts
//! against one identity cannot lose increments or lock twice.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::config::AuthConfig;
use crate::events::SecurityEvent;
use crate::security_event;

/// Lockout policy configuration.
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    /// Consecutive failed attempts before lockout.
    pub max_attempts: u32,
    /// Duration of the lockout window.
    pub lockout_duration: Duration,
}

impl Default for LockoutPolicy {
    /// 5 failed attempts, 15 minute lockout.
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_duration: Duration::from_secs(15 * 60),
        }
    }
}

impl LockoutPolicy {
    /// Derive the policy from the auth configuration.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            max_attempts: config.max_failed_attempts,
            lockout_duration: config.lockout_duration,
        }
    }
}

/// Result of a lockout check, consulted before any credential work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutStatus {
    /// Attempts allowed.
    Open,
    /// Attempts rejected regardless of credential validity.
    Locked {
        /// Time remaining until the lock expires.
        retry_after: Duration,
    },
}

/// Result of recording a failed attempt.
#[derive(Debug, Clone, Copy)]
pub struct FailureOutcome {
    /// Consecutive failures recorded for the identity, this one included.
    pub failed_count: u32,
    /// Remaining lock duration, if the identity is now locked.
    pub locked_for: Option<Duration>,
}

/// Per-identity attempt state. Created lazily on first failure, removed
/// on success or observed lock expiry.
#[derive(Debug, Clone, Default)]
struct AttemptRecord {
    failed_count: u32,
    locked_until: Option<DateTime<Utc>>,
}

impl AttemptRecord {
    fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let until = self.locked_until?;
        (until - now).to_std().ok().filter(|d| !d.is_zero())
    }
}

/// In-memory per-identity lockout tracker.
///
/// Suitable for single-instance deployments; a multi-instance deployment
/// would back the same interface with shared storage.
#[derive(Debug, Default)]
pub struct LockoutTracker {
    policy: LockoutPolicy,
    records: RwLock<HashMap<String, AttemptRecord>>,
}

impl LockoutTracker {
    /// Create a tracker with the given policy.
    pub fn new(policy: LockoutPolicy) -> Self {
        Self {
            policy,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Check whether an identity may attempt to log in.
    ///
    /// Read-only from the caller's perspective; internally an elapsed lock
    /// is cleared here so the next failure starts a fresh count.
    pub fn check(&self, identity: &str) -> LockoutStatus {
        self.check_at(identity, Utc::now())
    }

    /// [`check`](Self::check) against an explicit clock.
    pub fn check_at(&self, identity: &str, now: DateTime<Utc>) -> LockoutStatus {
        {
            let records = self.records.read();
            match records.get(identity) {
                None => return LockoutStatus::Open,
                Some(record) => {
                    if let Some(retry_after) = record.remaining(now) {
                        return LockoutStatus::Locked { retry_after };
                    }
                    if record.locked_until.is_none() {
                        return LockoutStatus::Open;
                    }
                    // Lock has elapsed; fall through to clear it.
                }
            }
        }

        let mut records = self.records.write();
        // Re-validate under the write lock; another caller may have
        // cleared or re-locked in between.
        if let Some(record) = records.get(identity) {
            if let Some(retry_after) = record.remaining(now) {
                return LockoutStatus::Locked { retry_after };
            }
            if record.locked_until.is_some() {
                records.remove(identity);
            }
        }
        LockoutStatus::Open
    }

    /// Record a failed login attempt.
    ///
    /// The attempt that reaches the threshold performs the single
    /// OPEN→LOCKED transition and emits an `account_locked` event.
    pub fn record_failure(&self, identity: &str) -> FailureOutcome {
        self.record_failure_at(identity, Utc::now())
    }

    /// [`record_failure`](Self::record_failure) against an explicit clock.
    pub fn record_failure_at(&self, identity: &str, now: DateTime<Utc>) -> FailureOutcome {
        let mut records = self.records.write();
        let record = records.entry(identity.to_string()).or_default();

        // An elapsed lock observed here behaves as OPEN with a fresh count.
        if record.locked_until.is_some() && record.remaining(now).is_none() {
            *record = AttemptRecord::default();
        }

        record.failed_count += 1;

        if record.locked_until.is_none() && record.failed_count >= self.policy.max_attempts {
            record.locked_until = Some(now + self.policy.lockout_duration);
            security_event!(
                SecurityEvent::AccountLocked,
                identity = %identity,
                failed_count = record.failed_count,
                lockout_secs = self.policy.lockout_duration.as_secs(),
                "account locked after repeated failed logins"
            );
        }

        FailureOutcome {
            failed_count: record.failed_count,
            locked_for: record.remaining(now),
        }
    }

    /// Record a successful authentication, resetting the identity's state.
    pub fn record_success(&self, identity: &str) {
        self.records.write().remove(identity);
    }

    /// Current consecutive failure count for an identity.
    pub fn failed_count(&self, identity: &str) -> u32 {
        self.records
            .read()
            .get(identity)
            .map(|r| r.failed_count)
            .unwrap_or(0)
    }
}
