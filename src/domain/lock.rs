// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Booking Lock Service (C2, spec §4.1).
//!
//! Advisory, in-memory TTL map keyed by booking id. Narrows the race window
//! ahead of the authoritative transactional check in [`crate::domain::booking_core`];
//! it is never itself the correctness barrier (I6 notwithstanding — see §9's
//! "race between lock and booking state").

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    Ok,
    /// Held by another driver and not yet stale.
    Locked,
}

struct LockRow {
    driver_id: String,
    acquired_at: Instant,
}

pub struct BookingLockService {
    locks: Mutex<HashMap<String, LockRow>>,
    ttl: Duration,
}

impl BookingLockService {
    pub fn new(ttl: Duration) -> Self {
        Self { locks: Mutex::new(HashMap::new()), ttl }
    }

    /// Attempt to acquire the lock for `booking_id` on behalf of `driver_id`.
    ///
    /// Idempotent: re-acquiring with the same driver succeeds. A lock older
    /// than the configured TTL is treated as stale and silently replaced.
    pub fn acquire(&self, booking_id: &str, driver_id: &str) -> AcquireOutcome {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(row) = locks.get(booking_id) {
            if row.driver_id == driver_id {
                return AcquireOutcome::Ok;
            }
            if row.acquired_at.elapsed() < self.ttl {
                return AcquireOutcome::Locked;
            }
        }
        locks.insert(
            booking_id.to_owned(),
            LockRow { driver_id: driver_id.to_owned(), acquired_at: Instant::now() },
        );
        AcquireOutcome::Ok
    }

    /// Release the lock only if `driver_id` is the current holder.
    pub fn release(&self, booking_id: &str, driver_id: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(row) = locks.get(booking_id) {
            if row.driver_id == driver_id {
                locks.remove(booking_id);
            }
        }
    }

    /// Whether the lock for `booking_id` is currently considered stale
    /// (either absent, or older than the TTL).
    pub fn is_stale(&self, booking_id: &str) -> bool {
        let locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        match locks.get(booking_id) {
            None => true,
            Some(row) => row.acquired_at.elapsed() >= self.ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_driver_is_locked_out() {
        let svc = BookingLockService::new(Duration::from_secs(10));
        assert_eq!(svc.acquire("b1", "d1"), AcquireOutcome::Ok);
        assert_eq!(svc.acquire("b1", "d2"), AcquireOutcome::Locked);
    }

    #[test]
    fn same_driver_reacquire_is_idempotent() {
        let svc = BookingLockService::new(Duration::from_secs(10));
        assert_eq!(svc.acquire("b1", "d1"), AcquireOutcome::Ok);
        assert_eq!(svc.acquire("b1", "d1"), AcquireOutcome::Ok);
    }

    #[test]
    fn release_by_non_holder_is_noop() {
        let svc = BookingLockService::new(Duration::from_secs(10));
        svc.acquire("b1", "d1");
        svc.release("b1", "d2");
        assert_eq!(svc.acquire("b1", "d2"), AcquireOutcome::Locked);
    }

    #[test]
    fn stale_lock_is_overwritten() {
        let svc = BookingLockService::new(Duration::from_millis(1));
        svc.acquire("b1", "d1");
        std::thread::sleep(Duration::from_millis(5));
        assert!(svc.is_stale("b1"));
        assert_eq!(svc.acquire("b1", "d2"), AcquireOutcome::Ok);
    }
}
