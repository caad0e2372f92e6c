//! Per-client brute-force tracking for access code validation.
//!
//! Flow Overview:
//! 1) Each failed validation bumps the client's counter.
//! 2) Reaching `max_attempts` locks the client for `cooldown` and resets the counter.
//! 3) A correct code deletes the client's record.
//! 4) Records idle for more than twice the cooldown are swept before each check.
//!
//! Scaling: the default store is process-local. Several replicas behind a load
//! balancer each keep their own counters, so a client gets `max_attempts` per
//! replica. Plug a shared [`AttemptStore`] in if that matters.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

use super::clock::Clock;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Failure history for one client identifier. Timestamps are epoch milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttemptRecord {
    /// Consecutive failures since the last reset.
    pub attempts: u32,
    pub last_attempt_at: i64,
    /// Zero when the client was never locked.
    pub locked_until: i64,
}

/// Keyed storage behind the tracker.
///
/// Implementations do not need their own locking: the tracker serializes every
/// call behind a mutex.
pub trait AttemptStore: Send {
    fn get(&self, client_id: &str) -> Option<AttemptRecord>;
    fn put(&mut self, client_id: &str, record: AttemptRecord);
    fn delete(&mut self, client_id: &str);
    /// Keep only the records for which `keep` returns true.
    fn retain(&mut self, keep: &mut dyn FnMut(&str, &AttemptRecord) -> bool);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct MemoryAttemptStore {
    records: HashMap<String, AttemptRecord>,
}

impl AttemptStore for MemoryAttemptStore {
    fn get(&self, client_id: &str) -> Option<AttemptRecord> {
        self.records.get(client_id).copied()
    }

    fn put(&mut self, client_id: &str, record: AttemptRecord) {
        self.records.insert(client_id.to_string(), record);
    }

    fn delete(&mut self, client_id: &str) {
        self.records.remove(client_id);
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&str, &AttemptRecord) -> bool) {
        self.records.retain(|client_id, record| keep(client_id, record));
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_attempts: u32,
    pub cooldown: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

impl LockoutPolicy {
    #[must_use]
    pub fn cooldown_millis(&self) -> i64 {
        i64::try_from(self.cooldown.as_millis()).unwrap_or(i64::MAX)
    }

    #[must_use]
    pub fn cooldown_seconds(&self) -> u64 {
        self.cooldown.as_secs()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureOutcome {
    /// The failure was counted; this many attempts are left before lockout.
    Counted { remaining_attempts: u32 },
    /// This failure triggered a lockout ending at `locked_until`.
    LockedOut { locked_until: i64 },
}

pub struct AttemptTracker {
    store: Mutex<Box<dyn AttemptStore>>,
    policy: LockoutPolicy,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AttemptTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttemptTracker")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl AttemptTracker {
    #[must_use]
    pub fn new(policy: LockoutPolicy, clock: Arc<dyn Clock>) -> Self {
        Self::with_store(Box::new(MemoryAttemptStore::default()), policy, clock)
    }

    #[must_use]
    pub fn with_store(
        store: Box<dyn AttemptStore>,
        policy: LockoutPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store: Mutex::new(store),
            policy,
            clock,
        }
    }

    #[must_use]
    pub fn policy(&self) -> LockoutPolicy {
        self.policy
    }

    /// Hold the store for a multi-step read-modify-write sequence.
    pub fn lock(&self) -> Attempts<'_> {
        Attempts {
            store: self.store.lock().unwrap_or_else(PoisonError::into_inner),
            policy: self.policy,
            clock: self.clock.as_ref(),
        }
    }

    pub fn record_failure(&self, client_id: &str) -> FailureOutcome {
        self.lock().record_failure(client_id)
    }

    pub fn record_success(&self, client_id: &str) {
        self.lock().record_success(client_id);
    }

    #[must_use]
    pub fn is_locked(&self, client_id: &str) -> bool {
        self.lock().is_locked(client_id)
    }

    pub fn sweep(&self) {
        self.lock().sweep();
    }

    #[must_use]
    pub fn record(&self, client_id: &str) -> Option<AttemptRecord> {
        self.lock().record(client_id)
    }

    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.lock().store.len()
    }
}

/// Exclusive view over the attempt store.
pub struct Attempts<'a> {
    store: MutexGuard<'a, Box<dyn AttemptStore>>,
    policy: LockoutPolicy,
    clock: &'a dyn Clock,
}

impl Attempts<'_> {
    #[must_use]
    pub fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    #[must_use]
    pub fn record(&self, client_id: &str) -> Option<AttemptRecord> {
        self.store.get(client_id)
    }

    pub fn record_failure(&mut self, client_id: &str) -> FailureOutcome {
        let now = self.now();
        let mut record = self.store.get(client_id).unwrap_or_default();
        record.attempts = record.attempts.saturating_add(1);
        record.last_attempt_at = now;

        if record.attempts >= self.policy.max_attempts {
            record.locked_until = now.saturating_add(self.policy.cooldown_millis());
            record.attempts = 0;
            self.store.put(client_id, record);
            warn!(
                "Client {client_id} locked out for {}s after {} failed attempts",
                self.policy.cooldown_seconds(),
                self.policy.max_attempts
            );
            return FailureOutcome::LockedOut {
                locked_until: record.locked_until,
            };
        }

        self.store.put(client_id, record);
        FailureOutcome::Counted {
            remaining_attempts: self.policy.max_attempts - record.attempts,
        }
    }

    pub fn record_success(&mut self, client_id: &str) {
        self.store.delete(client_id);
    }

    /// End of the active lockout, if any.
    #[must_use]
    pub fn locked_until(&self, client_id: &str) -> Option<i64> {
        let now = self.now();
        self.store
            .get(client_id)
            .map(|record| record.locked_until)
            .filter(|&locked_until| locked_until > now)
    }

    #[must_use]
    pub fn is_locked(&self, client_id: &str) -> bool {
        self.locked_until(client_id).is_some()
    }

    pub fn sweep(&mut self) {
        let now = self.now();
        let horizon = self.policy.cooldown_millis().saturating_mul(2);
        let before = self.store.len();
        self.store
            .retain(&mut |_, record| now.saturating_sub(record.last_attempt_at) <= horizon);
        let purged = before.saturating_sub(self.store.len());
        if purged > 0 {
            debug!("Purged {purged} stale attempt records");
        }
    }
}
