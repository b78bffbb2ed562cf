// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-window rate limiter keyed by `(user_id, route_class)` (spec §4.9's
//! SHOULD-level numbers). Grounded on `broker/registry.rs`'s periodic-sweep
//! style: a background sweep evicts expired windows instead of letting the
//! map grow unbounded.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    Auth,
    Otp,
    BookingCreate,
    Upload,
    General,
}

impl RouteClass {
    /// `(limit, window)` per spec §4.9's SHOULD-level numbers.
    fn limit(&self) -> (u32, Duration) {
        match self {
            Self::Auth => (5, Duration::from_secs(15 * 60)),
            Self::Otp => (3, Duration::from_secs(5 * 60)),
            Self::BookingCreate => (10, Duration::from_secs(60 * 60)),
            Self::Upload => (20, Duration::from_secs(60 * 60)),
            Self::General => (1000, Duration::from_secs(15 * 60)),
        }
    }
}

struct Window {
    count: u32,
    started_at: Instant,
}

/// Process-local fixed-window rate limiter. Not a distributed limiter: each
/// replica enforces its own window, which is the SHOULD-level guarantee the
/// spec asks for, not a strict global cap.
#[derive(Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<(String, RouteClass), Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one request for `(user_id, class)`. Returns `true` if it is
    /// within the window's limit, `false` if the caller should be rejected.
    pub fn check(&self, user_id: &str, class: RouteClass) -> bool {
        let (limit, window) = class.limit();
        let key = (user_id.to_owned(), class);
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        let entry = windows.entry(key).or_insert(Window { count: 0, started_at: now });
        if now.duration_since(entry.started_at) >= window {
            entry.count = 0;
            entry.started_at = now;
        }

        if entry.count >= limit {
            return false;
        }
        entry.count += 1;
        true
    }

    /// Evict windows whose period has fully elapsed. Intended to be called
    /// periodically so the map doesn't grow with every distinct caller seen
    /// since boot.
    pub fn sweep(&self) {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        windows.retain(|(_, class), w| now.duration_since(w.started_at) < class.limit().1);
    }
}
