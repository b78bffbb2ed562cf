// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed collection set backing the Persistent Store (spec §6's layout).

use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::booking::Booking;
use crate::domain::slots::WorkSlot;
use crate::domain::user::{DriverLocation, User};
use crate::domain::verification::VerificationStatus;
use crate::store::Collection;

/// `booking_rejections/{auto}` — excludes a driver from rediscovery of a
/// booking they already turned down.
#[derive(Debug, Clone)]
pub struct RejectionRecord {
    pub booking_id: String,
    pub driver_id: String,
    pub reason: String,
    pub rejected_at: chrono::DateTime<chrono::Utc>,
}

/// `tripTracking/{bookingId}` — denormalized status mirror for replay on
/// `subscribe_tracking` (SPEC_FULL.md §3 supplement).
#[derive(Debug, Clone)]
pub struct TrackingRow {
    pub booking_id: String,
    pub status: crate::domain::booking::BookingStatus,
    pub driver_id: Option<String>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub history: Vec<(crate::domain::booking::BookingStatus, chrono::DateTime<chrono::Utc>)>,
}

/// `documentVerificationRequests/{auto}` — audit row for verification
/// status changes (SPEC_FULL.md §3 supplement).
#[derive(Debug, Clone)]
pub struct DocumentVerificationRequest {
    pub driver_id: String,
    pub previous_status: VerificationStatus,
    pub new_status: VerificationStatus,
    pub reviewed_by: Option<String>,
    pub at: chrono::DateTime<chrono::Utc>,
}

/// `driverLocations/{driverId}` — the live location feed, separate from the
/// driver's `User` row so location-only writes don't race profile writes.
#[derive(Debug, Clone)]
pub struct DriverLocationRow {
    pub driver_id: String,
    pub location: DriverLocation,
    pub current_trip_id: Option<String>,
}

/// The full set of persisted collections (spec §6's layout table).
#[derive(Default)]
pub struct Store {
    pub users: Collection<User>,
    pub bookings: Collection<Booking>,
    pub work_slots: Collection<WorkSlot>,
    pub driver_locations: Collection<DriverLocationRow>,
    pub rejections: Collection<RejectionRecord>,
    pub tracking: Collection<TrackingRow>,
    pub verification_requests: Collection<DocumentVerificationRequest>,

    /// In-process document-status cache (spec §5/§6): per-driver
    /// verification status, invalidated on every document write.
    document_status_cache: RwLock<HashMap<String, VerificationStatus>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached_verification_status(&self, driver_id: &str) -> Option<VerificationStatus> {
        self.document_status_cache.read().unwrap_or_else(|e| e.into_inner()).get(driver_id).copied()
    }

    pub fn cache_verification_status(&self, driver_id: &str, status: VerificationStatus) {
        self.document_status_cache
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(driver_id.to_owned(), status);
    }

    pub fn invalidate_verification_cache(&self, driver_id: &str) {
        self.document_status_cache.write().unwrap_or_else(|e| e.into_inner()).remove(driver_id);
    }

    /// List bookings by customer or driver, optionally filtered by status,
    /// newest first — the `orderBy(createdAt) + limit` query primitive
    /// named in spec §6 (SPEC_FULL.md §4.6 supplement).
    pub fn list_bookings_for_user(
        &self,
        user_id: &str,
        as_driver: bool,
        status: Option<crate::domain::booking::BookingStatus>,
        limit: usize,
    ) -> Vec<Booking> {
        let mut rows = self.bookings.query(|b| {
            let owner_matches = if as_driver {
                b.driver_id.as_deref() == Some(user_id)
            } else {
                b.customer_id == user_id
            };
            owner_matches && status.map(|s| b.status == s).unwrap_or(true)
        });
        rows.sort_by(|a, b| b.timing.created_at.cmp(&a.timing.created_at));
        rows.truncate(limit);
        rows
    }

    pub fn has_rejection(&self, booking_id: &str, driver_id: &str) -> bool {
        !self
            .rejections
            .query(|r| r.booking_id == booking_id && r.driver_id == driver_id)
            .is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_cache_round_trips() {
        let store = Store::new();
        assert_eq!(store.cached_verification_status("d1"), None);
        store.cache_verification_status("d1", VerificationStatus::Verified);
        assert_eq!(store.cached_verification_status("d1"), Some(VerificationStatus::Verified));
        store.invalidate_verification_cache("d1");
        assert_eq!(store.cached_verification_status("d1"), None);
    }
}
