// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch Engine (C7, spec §4.7): candidate discovery and widening-radius
//! notification fan-out.
//!
//! Depends only on an injected [`Notifier`] so this module has no direct
//! socket dependency (SPEC_FULL.md §4.7 supplement) — the session plane (C8)
//! is the only `Notifier` implementation in the running service.

use crate::domain::booking::Booking;
use crate::domain::booking_core::{rank_candidates, RankedCandidate};
use crate::domain::geo::Point;
use crate::domain::user::User;
use crate::store::memory::Store;

/// Radius search parameters, sourced from [`crate::config::Config`].
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    pub radius_min_km: f64,
    pub radius_max_km: f64,
    pub radius_step_km: f64,
}

/// Pushes `new_booking_available` to a candidate driver. Implemented by the
/// session plane in the running service; fakeable in tests.
pub trait Notifier {
    fn notify_new_booking(&self, driver_id: &str, booking_id: &str);
}

/// A `Notifier` that records calls instead of sending anything, for tests.
#[derive(Default)]
pub struct RecordingNotifier {
    pub notified: std::sync::Mutex<Vec<(String, String)>>,
}

impl Notifier for RecordingNotifier {
    fn notify_new_booking(&self, driver_id: &str, booking_id: &str) {
        self.notified
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((driver_id.to_owned(), booking_id.to_owned()));
    }
}

/// Eligible candidates within `radius_km` of `pickup`, excluding drivers who
/// already rejected this booking.
fn discover_within(store: &Store, booking_id: &str, pickup: Point, radius_km: f64) -> Vec<User> {
    store
        .users
        .query(|u| u.is_eligible_candidate())
        .into_iter()
        .filter(|u| !store.has_rejection(booking_id, &u.user_id))
        .filter(|u| {
            let loc = u.driver.as_ref().and_then(|d| d.current_location);
            match loc {
                Some(loc) => crate::domain::geo::haversine_distance_km(pickup, loc.coords) <= radius_km,
                None => false,
            }
        })
        .collect()
}

/// Result of one dispatch attempt: the radius that finally produced
/// candidates (`None` if even the max radius found nobody) and the ranked,
/// notified candidates.
pub struct DispatchOutcome {
    pub radius_km: Option<f64>,
    pub candidates: Vec<RankedCandidate>,
}

/// Find and notify eligible drivers for `booking`, widening the search
/// radius from `radius_min_km` to `radius_max_km` in `radius_step_km`
/// increments until at least one candidate is found (spec §4.7).
///
/// No geospatial index is used beyond a linear scan of online drivers
/// (§1's stated non-goal) — this is O(online drivers) per radius step.
pub fn dispatch(
    store: &Store,
    notifier: &dyn Notifier,
    cfg: DispatchConfig,
    booking: &Booking,
) -> DispatchOutcome {
    let mut radius = cfg.radius_min_km;
    loop {
        let raw = discover_within(store, &booking.id, booking.pickup.location, radius);
        if !raw.is_empty() {
            let ranked = rank_candidates(booking.pickup.location, raw);
            for candidate in &ranked {
                notifier.notify_new_booking(&candidate.driver.user_id, &booking.id);
            }
            return DispatchOutcome { radius_km: Some(radius), candidates: ranked };
        }
        if radius >= cfg.radius_max_km {
            return DispatchOutcome { radius_km: None, candidates: Vec::new() };
        }
        radius = (radius + cfg.radius_step_km).min(cfg.radius_max_km);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::{ContactPoint, Package, PaymentMethod};
    use crate::domain::fare::{compute_fare, FareRates, VehicleType};
    use crate::domain::user::{DriverLocation, DriverProfile};
    use crate::domain::verification::VerificationStatus;

    fn cfg() -> DispatchConfig {
        DispatchConfig { radius_min_km: 1.0, radius_max_km: 10.0, radius_step_km: 2.0 }
    }

    fn contact(p: Point) -> ContactPoint {
        ContactPoint { name: "n".into(), phone: "+910000000000".into(), address: "a".into(), location: p, instructions: None }
    }

    fn booking_at(pickup: Point) -> Booking {
        let now = chrono::Utc::now();
        Booking {
            id: "b1".into(),
            customer_id: "c1".into(),
            driver_id: None,
            status: crate::domain::booking::BookingStatus::Pending,
            pickup: contact(pickup),
            dropoff: contact(Point::new(pickup.latitude + 0.05, pickup.longitude)),
            package: Package { weight_kg: 1.0, description: "x".into(), fragile: false },
            vehicle_type: VehicleType::TwoWheeler,
            fare: compute_fare(FareRates { base_fare: 1000, per_km_rate: 100 }, 1.0, 1.0, VehicleType::TwoWheeler, now),
            payment_method: PaymentMethod::Cash,
            payment_status: crate::domain::booking::PaymentStatus::Pending,
            timing: crate::domain::booking::Timing { created_at: Some(now), ..Default::default() },
            distance_km: 5.0,
            cancellation: None,
            rating: None,
        }
    }

    fn driver_at(id: &str, loc: Point) -> User {
        let mut u = User::new_driver(&format!("+9190000000{id}"), "d");
        u.user_id = id.to_owned();
        u.driver = Some(DriverProfile {
            verification_status: VerificationStatus::Verified,
            is_verified: true,
            is_online: true,
            is_available: true,
            current_location: Some(DriverLocation {
                coords: loc,
                timestamp: chrono::Utc::now(),
                accuracy: None,
                speed: None,
                bearing: None,
            }),
            current_booking_id: None,
            rating: 4.0,
            trip_count: 5,
            last_seen: chrono::Utc::now(),
            documents: Default::default(),
            previously_approved: true,
        });
        u
    }

    #[test]
    fn finds_nearby_driver_at_minimum_radius() {
        let store = Store::new();
        let pickup = Point::new(12.9716, 77.5946);
        store.users.put("d1", driver_at("d1", pickup));
        let notifier = RecordingNotifier::default();

        let outcome = dispatch(&store, &notifier, cfg(), &booking_at(pickup));
        assert_eq!(outcome.radius_km, Some(1.0));
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(notifier.notified.lock().unwrap().len(), 1);
    }

    #[test]
    fn widens_radius_to_find_distant_driver() {
        let store = Store::new();
        let pickup = Point::new(12.9716, 77.5946);
        let far = Point::new(12.9716 + 0.05, 77.5946);
        store.users.put("d1", driver_at("d1", far));
        let notifier = RecordingNotifier::default();

        let outcome = dispatch(&store, &notifier, cfg(), &booking_at(pickup));
        assert!(outcome.radius_km.unwrap() > 1.0);
        assert_eq!(outcome.candidates.len(), 1);
    }

    #[test]
    fn no_candidates_beyond_max_radius_notifies_nobody() {
        let store = Store::new();
        let pickup = Point::new(12.9716, 77.5946);
        let far = Point::new(12.9716 + 2.0, 77.5946);
        store.users.put("d1", driver_at("d1", far));
        let notifier = RecordingNotifier::default();

        let outcome = dispatch(&store, &notifier, cfg(), &booking_at(pickup));
        assert_eq!(outcome.radius_km, None);
        assert!(outcome.candidates.is_empty());
        assert!(notifier.notified.lock().unwrap().is_empty());
    }

    #[test]
    fn driver_who_already_rejected_is_excluded() {
        let store = Store::new();
        let pickup = Point::new(12.9716, 77.5946);
        store.users.put("d1", driver_at("d1", pickup));
        store.rejections.put(
            "b1:d1",
            crate::store::memory::RejectionRecord {
                booking_id: "b1".into(),
                driver_id: "d1".into(),
                reason: "busy".into(),
                rejected_at: chrono::Utc::now(),
            },
        );
        let notifier = RecordingNotifier::default();

        let outcome = dispatch(&store, &notifier, cfg(), &booking_at(pickup));
        assert_eq!(outcome.radius_km, None);
    }
}
