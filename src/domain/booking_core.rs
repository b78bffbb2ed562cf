// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Booking Core (C6, spec §4.6): lifecycle orchestration sitting on top of
//! the store, the lock service, and the fare engine.

use crate::domain::booking::{Booking, BookingStatus, Cancellation};
use crate::domain::fare::{self, FareBreakdown, FareRates, VehicleType};
use crate::domain::geo::{haversine_distance_km, Point};
use crate::domain::lock::{AcquireOutcome, BookingLockService};
use crate::domain::service_area::{self, Endpoint, ServiceAreaConfig};
use crate::domain::user::User;
use crate::error::CoreError;
use crate::store::memory::{RejectionRecord, Store, TrackingRow};
use crate::store::transact2;

pub struct CreateBookingInput {
    pub customer_id: String,
    pub pickup: crate::domain::booking::ContactPoint,
    pub dropoff: crate::domain::booking::ContactPoint,
    pub package: crate::domain::booking::Package,
    pub vehicle_type: VehicleType,
    pub payment_method: crate::domain::booking::PaymentMethod,
    pub at: chrono::DateTime<chrono::Utc>,
}

/// Create a booking: service-area check, fare computation, persist pending.
pub fn create_booking(
    store: &Store,
    area: &ServiceAreaConfig,
    rates: FareRates,
    map_distance_km: Option<f64>,
    input: CreateBookingInput,
    id: String,
) -> Result<Booking, CoreError> {
    service_area::validate_booking(area, input.pickup.location, input.dropoff.location).map_err(
        |endpoint| {
            CoreError::Validation(format!("{} is outside the service area", endpoint.label()))
        },
    )?;

    let distance_km = map_distance_km
        .unwrap_or_else(|| haversine_distance_km(input.pickup.location, input.dropoff.location));

    let fare: FareBreakdown =
        fare::compute_fare(rates, distance_km, input.package.weight_kg, input.vehicle_type, input.at);

    let booking = Booking {
        id: id.clone(),
        customer_id: input.customer_id,
        driver_id: None,
        status: BookingStatus::Pending,
        pickup: input.pickup,
        dropoff: input.dropoff,
        package: input.package,
        vehicle_type: input.vehicle_type,
        fare,
        payment_method: input.payment_method,
        payment_status: crate::domain::booking::PaymentStatus::Pending,
        timing: crate::domain::booking::Timing { created_at: Some(input.at), ..Default::default() },
        distance_km,
        cancellation: None,
        rating: None,
    };

    store.bookings.put(&booking.id, booking.clone());
    store.tracking.put(
        &booking.id,
        TrackingRow {
            booking_id: booking.id.clone(),
            status: booking.status,
            driver_id: None,
            updated_at: input.at,
            history: vec![(booking.status, input.at)],
        },
    );

    Ok(booking)
}

fn mirror_tracking(store: &Store, booking: &Booking, at: chrono::DateTime<chrono::Utc>) {
    let mut row = store.tracking.get(&booking.id).unwrap_or(TrackingRow {
        booking_id: booking.id.clone(),
        status: booking.status,
        driver_id: booking.driver_id.clone(),
        updated_at: at,
        history: vec![],
    });
    row.status = booking.status;
    row.driver_id = booking.driver_id.clone();
    row.updated_at = at;
    row.history.push((booking.status, at));
    store.tracking.put(&booking.id, row);
}

/// Atomic accept (C6, spec §4.6). The only path to `driver_assigned`.
pub fn accept_booking(
    store: &Store,
    locks: &BookingLockService,
    booking_id: &str,
    driver_id: &str,
    at: chrono::DateTime<chrono::Utc>,
) -> Result<Booking, CoreError> {
    match locks.acquire(booking_id, driver_id) {
        AcquireOutcome::Ok => {}
        AcquireOutcome::Locked => {
            let current = store.bookings.get(booking_id);
            let stale = current.as_ref().map(|b| b.is_unassigned()).unwrap_or(false);
            if !stale {
                return Err(CoreError::BookingAlreadyAssigned);
            }
            tracing::warn!(booking_id, driver_id, "lock held but booking unassigned, proceeding");
        }
    }

    let result = (|| {
        transact2(
            &store.bookings,
            booking_id,
            &store.users,
            driver_id,
            |booking, driver| {
                let mut booking = booking.ok_or_else(|| CoreError::NotFound(booking_id.to_owned()))?;
                let mut driver = driver.ok_or_else(|| CoreError::NotFound(driver_id.to_owned()))?;

                if booking.status != BookingStatus::Pending {
                    let idempotent_winner = booking.driver_id.as_deref() == Some(driver_id)
                        && booking.status == BookingStatus::DriverAssigned;
                    if !idempotent_winner {
                        return Err(CoreError::BookingAlreadyAssigned);
                    }
                    return Ok((booking, driver));
                }

                if let Some(existing) = booking.driver_id.as_deref() {
                    if crate::compat::is_present_driver_id(existing) && existing != driver_id {
                        return Err(CoreError::BookingAlreadyAssigned);
                    }
                }

                let driver_profile = driver
                    .driver
                    .as_ref()
                    .ok_or_else(|| CoreError::Validation("not a driver account".into()))?;
                if !(driver_profile.is_online && driver_profile.is_available) {
                    return Err(CoreError::DriverNotAvailable);
                }

                booking.driver_id = Some(driver_id.to_owned());
                booking.status = BookingStatus::DriverAssigned;
                booking.timing.assigned_at = Some(at);

                if let Some(profile) = driver.driver.as_mut() {
                    profile.is_available = false;
                    profile.current_booking_id = Some(booking_id.to_owned());
                }

                Ok((booking, driver))
            },
        )
    })();

    locks.release(booking_id, driver_id);

    let (booking, _driver) = result?;
    mirror_tracking(store, &booking, at);
    Ok(booking)
}

/// Reject a booking offer: record the rejection, return it to the pool.
pub fn reject_booking(
    store: &Store,
    booking_id: &str,
    driver_id: &str,
    reason: &str,
    at: chrono::DateTime<chrono::Utc>,
) -> Result<Booking, CoreError> {
    let mut booking = store.bookings.get(booking_id).ok_or_else(|| CoreError::NotFound(booking_id.to_owned()))?;

    booking.driver_id = None;
    booking.status = BookingStatus::Pending;
    booking.cancellation = Some(Cancellation {
        cancelled_by: driver_id.to_owned(),
        reason: reason.to_owned(),
        cancelled_at: at,
        refund_amount: 0,
    });
    store.bookings.put(booking_id, booking.clone());

    store.rejections.put(
        &format!("{booking_id}:{driver_id}"),
        RejectionRecord {
            booking_id: booking_id.to_owned(),
            driver_id: driver_id.to_owned(),
            reason: reason.to_owned(),
            rejected_at: at,
        },
    );

    if let Some(mut driver) = store.users.get(driver_id) {
        if let Some(profile) = driver.driver.as_mut() {
            profile.is_available = true;
            profile.current_booking_id = None;
        }
        store.users.put(driver_id, driver);
    }

    mirror_tracking(store, &booking, at);
    Ok(booking)
}

/// Validated lifecycle status update (spec §4.6's "Status update").
pub fn update_status(
    store: &Store,
    booking_id: &str,
    next: BookingStatus,
    at: chrono::DateTime<chrono::Utc>,
) -> Result<Booking, CoreError> {
    let mut booking = store.bookings.get(booking_id).ok_or_else(|| CoreError::NotFound(booking_id.to_owned()))?;

    if !booking.status.can_transition_to(next) {
        return Err(CoreError::Validation(format!(
            "cannot transition from {} to {}",
            booking.status.as_str(),
            next.as_str()
        )));
    }

    booking.status = next;
    match next {
        BookingStatus::PickedUp => booking.timing.picked_up_at = Some(at),
        BookingStatus::Delivered => booking.timing.delivered_at = Some(at),
        BookingStatus::Cancelled => booking.timing.cancelled_at = Some(at),
        _ => {}
    }
    store.bookings.put(booking_id, booking.clone());
    mirror_tracking(store, &booking, at);
    Ok(booking)
}

/// Cancel a booking (allowed from pending/confirmed/driver_assigned).
/// Refund policy: full refund before assignment; `min(50, 10%)` penalty
/// on assigned state (spec §4.6).
pub fn cancel_booking(
    store: &Store,
    booking_id: &str,
    cancelled_by: &str,
    reason: &str,
    at: chrono::DateTime<chrono::Utc>,
) -> Result<Booking, CoreError> {
    let mut booking = store.bookings.get(booking_id).ok_or_else(|| CoreError::NotFound(booking_id.to_owned()))?;

    if !booking.status.is_cancellable() {
        return Err(CoreError::Validation(format!(
            "booking in status {} cannot be cancelled",
            booking.status.as_str()
        )));
    }

    let penalty = if booking.status == BookingStatus::DriverAssigned {
        (booking.fare.total / 10).min(50)
    } else {
        0
    };
    let refund_amount = booking.fare.total - penalty;

    if let Some(driver_id) = booking.driver_id.clone() {
        if let Some(mut driver) = store.users.get(&driver_id) {
            if let Some(profile) = driver.driver.as_mut() {
                profile.current_booking_id = None;
                profile.is_available = true;
            }
            store.users.put(&driver_id, driver);
        }
    }

    booking.status = BookingStatus::Cancelled;
    booking.timing.cancelled_at = Some(at);
    booking.cancellation = Some(Cancellation {
        cancelled_by: cancelled_by.to_owned(),
        reason: reason.to_owned(),
        cancelled_at: at,
        refund_amount,
    });
    store.bookings.put(booking_id, booking.clone());
    mirror_tracking(store, &booking, at);
    Ok(booking)
}

/// Candidate dispatch discovery target: a driver's distance to pickup.
pub struct RankedCandidate {
    pub driver: User,
    pub distance_km: f64,
}

/// Rank candidates by distance, tiebreaking within 1km by rating then trip
/// count descending (spec §4.7).
pub fn rank_candidates(pickup: Point, candidates: Vec<User>) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = candidates
        .into_iter()
        .filter_map(|u| {
            let loc = u.driver.as_ref()?.current_location?;
            Some(RankedCandidate { distance_km: haversine_distance_km(pickup, loc.coords), driver: u })
        })
        .collect();

    ranked.sort_by(|a, b| {
        if (a.distance_km - b.distance_km).abs() < 1.0 {
            let (ra, rb) = (a.driver.driver.as_ref().map(|d| d.rating), b.driver.driver.as_ref().map(|d| d.rating));
            let (ta, tb) =
                (a.driver.driver.as_ref().map(|d| d.trip_count), b.driver.driver.as_ref().map(|d| d.trip_count));
            rb.partial_cmp(&ra)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(tb.cmp(&ta))
        } else {
            a.distance_km.partial_cmp(&b.distance_km).unwrap_or(std::cmp::Ordering::Equal)
        }
    });
    ranked
}
