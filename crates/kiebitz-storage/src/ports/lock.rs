//! Named, reentrant-by-owner, TTL-bounded, blocking-with-timeout locks.
//!
//! Four lock classes are named: `Provider::<id>`, `Appointment::<id>`,
//! `Token::<token>`, `User::<userId>`. Callers acquire at most one lock per
//! class per request, and the fixed acquisition order Provider →
//! Appointment (never reversed) rules out deadlock.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::DbError;

/// A held lock; releases on drop, guaranteeing release on every exit path.
pub struct LockGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl LockGuard {
    /// Wrap a release callback invoked exactly once, on drop.
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// Abstract interface for acquiring named locks.
#[async_trait]
pub trait LockManager: Send + Sync {
    /// Block up to `timeout` trying to acquire `name`; the lock is
    /// automatically considered stale and reclaimable after `ttl` even if
    /// never explicitly released (defends against a crashed holder).
    ///
    /// Returns `Err(DbError::LockTimeout)` — mapped to 503 "lock timeout"
    /// at the gateway — if `timeout` elapses first.
    async fn acquire(&self, name: &str, ttl: Duration, timeout: Duration)
        -> Result<LockGuard, DbError>;
}

/// The lock-name prefixes for each lock class.
pub mod names {
    /// `Lock::Provider::<id>`.
    pub fn provider(id_hex: &str) -> String {
        format!("provider:{id_hex}")
    }

    /// `Lock::Appointment::<id>`.
    pub fn appointment(id_hex: &str) -> String {
        format!("appointment:{id_hex}")
    }

    /// `Lock::Token::<token>` (reserved for cancellation flows).
    pub fn token(token_hex: &str) -> String {
        format!("token:{token_hex}")
    }

    /// `Lock::User::<userId>`.
    pub fn user(user_id_hex: &str) -> String {
        format!("user:{user_id_hex}")
    }
}
