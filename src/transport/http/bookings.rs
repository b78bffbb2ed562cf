// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Booking HTTP surface (spec §4.9): create/list/detail/status/cancel,
//! plus the HTTP mirror of accept/reject for clients that prefer polling
//! over the session plane.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::collaborators::Claims;
use crate::domain::booking::{Booking, BookingStatus, ContactPoint, Package, PaymentMethod};
use crate::domain::booking_core::{self, CreateBookingInput};
use crate::domain::dispatch;
use crate::domain::fare::VehicleType;
use crate::domain::user::UserType;
use crate::error::ErrorCode;
use crate::rate_limit::RouteClass;
use crate::transport::http::{ok, ApiError, ApiResult};
use crate::transport::rooms::{booking_room, type_room, user_room};
use crate::transport::state::AppState;
use crate::transport::ws_msg::ServerMessage;

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub pickup: ContactPoint,
    pub dropoff: ContactPoint,
    pub package: Package,
    pub vehicle_type: VehicleType,
    pub payment_method: PaymentMethod,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<CreateBookingRequest>,
) -> ApiResult<Booking> {
    if !state.rate_limiter.check(&claims.user_id, RouteClass::BookingCreate) {
        return Err(ApiError::new(ErrorCode::RateLimitExceeded, "too many bookings created recently"));
    }
    if body.package.weight_kg > state.config.max_package_weight_kg {
        return Err(ApiError::new(ErrorCode::ValidationError, "package exceeds the maximum accepted weight"));
    }

    let at = chrono::Utc::now();
    let map_distance_km = state.collaborators.map.distance_km(body.pickup.location, body.dropoff.location).ok();

    let input = CreateBookingInput {
        customer_id: claims.user_id.clone(),
        pickup: body.pickup,
        dropoff: body.dropoff,
        package: body.package,
        vehicle_type: body.vehicle_type,
        payment_method: body.payment_method,
        at,
    };

    let booking = booking_core::create_booking(
        &state.store,
        &state.service_area,
        state.fare_rates,
        map_distance_km,
        input,
        uuid::Uuid::new_v4().to_string(),
    )?;

    if booking.distance_km > state.config.max_distance_km {
        return Err(ApiError::new(ErrorCode::ValidationError, "trip distance exceeds the maximum accepted distance"));
    }

    let outcome = dispatch::dispatch(&state.store, &SessionNotifier(&state), state.dispatch, &booking);
    tracing::info!(booking_id = %booking.id, radius_km = ?outcome.radius_km, candidates = outcome.candidates.len(), "dispatch round complete");

    ok(booking)
}

/// Adapts the session plane's room-routing to the [`dispatch::Notifier`]
/// contract so C7 stays free of any direct socket dependency.
struct SessionNotifier<'a>(&'a Arc<AppState>);

impl dispatch::Notifier for SessionNotifier<'_> {
    fn notify_new_booking(&self, driver_id: &str, booking_id: &str) {
        if let Some(booking) = self.0.store.bookings.get(booking_id) {
            let msg = ServerMessage::NewBookingAvailable {
                booking_id: booking_id.to_owned(),
                pickup: booking.pickup.location,
                dropoff: booking.dropoff.location,
                fare_total: booking.fare.total,
                distance_km: booking.distance_km,
            };
            self.0.rooms.publish(&crate::transport::rooms::user_room(driver_id), msg);
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    #[serde(default)]
    pub status: Option<BookingStatus>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListBookingsQuery>,
) -> ApiResult<Vec<Booking>> {
    let as_driver = claims.user_type == UserType::Driver;
    let rows = state.store.list_bookings_for_user(&claims.user_id, as_driver, query.status, query.limit.min(100));
    ok(rows)
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<String>,
) -> ApiResult<Booking> {
    let booking = state.store.bookings.get(&booking_id).ok_or_else(|| ApiError::new(ErrorCode::BookingNotFound, "booking not found"))?;
    authorize_booking_access(&claims, &booking)?;
    ok(booking)
}

fn authorize_booking_access(claims: &Claims, booking: &Booking) -> Result<(), ApiError> {
    let is_owner = booking.customer_id == claims.user_id || booking.driver_id.as_deref() == Some(&claims.user_id);
    if is_owner || claims.user_type == UserType::Admin {
        Ok(())
    } else {
        Err(ApiError::new(ErrorCode::Forbidden, "not a participant in this booking"))
    }
}

pub async fn accept(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<String>,
) -> ApiResult<Booking> {
    if claims.user_type != UserType::Driver {
        return Err(ApiError::new(ErrorCode::Forbidden, "driver account required"));
    }
    let booking = booking_core::accept_booking(&state.store, &state.locks, &booking_id, &claims.user_id, chrono::Utc::now())?;
    if let Some(driver) = state.store.users.get(&claims.user_id) {
        let msg = ServerMessage::DriverAssigned {
            booking_id: booking_id.clone(),
            driver_id: claims.user_id.clone(),
            driver_name: driver.name,
            vehicle_number: driver.vehicle_number,
        };
        state.rooms.publish(&booking_room(&booking_id), msg.clone());
        state.rooms.publish(&user_room(&booking.customer_id), msg.clone());
        state.rooms.publish(&type_room("customer"), msg);
    }
    ok(booking)
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

pub async fn reject(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<String>,
    Json(body): Json<RejectRequest>,
) -> ApiResult<Booking> {
    if claims.user_type != UserType::Driver {
        return Err(ApiError::new(ErrorCode::Forbidden, "driver account required"));
    }
    let booking = booking_core::reject_booking(&state.store, &booking_id, &claims.user_id, &body.reason, chrono::Utc::now())?;
    ok(booking)
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: BookingStatus,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<String>,
    Json(body): Json<StatusUpdateRequest>,
) -> ApiResult<Booking> {
    if claims.user_type != UserType::Driver {
        return Err(ApiError::new(ErrorCode::Forbidden, "driver account required"));
    }
    let booking = booking_core::update_status(&state.store, &booking_id, body.status, chrono::Utc::now())?;
    let msg = ServerMessage::BookingStatusUpdate { booking_id: booking_id.clone(), status: booking.status, at: chrono::Utc::now() };
    state.rooms.publish(&booking_room(&booking_id), msg.clone());
    state.rooms.publish(&user_room(&booking.customer_id), msg.clone());
    state.rooms.publish(&type_room("customer"), msg);
    ok(booking)
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub reason: String,
}

pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<String>,
    Json(body): Json<CancelRequest>,
) -> ApiResult<Booking> {
    let booking = state.store.bookings.get(&booking_id).ok_or_else(|| ApiError::new(ErrorCode::BookingNotFound, "booking not found"))?;
    authorize_booking_access(&claims, &booking)?;
    let booking = booking_core::cancel_booking(&state.store, &booking_id, &claims.user_id, &body.reason, chrono::Utc::now())?;
    let msg = ServerMessage::BookingStatusUpdate { booking_id: booking_id.clone(), status: booking.status, at: chrono::Utc::now() };
    state.rooms.publish(&booking_room(&booking_id), msg.clone());
    state.rooms.publish(&user_room(&booking.customer_id), msg.clone());
    state.rooms.publish(&type_room("customer"), msg);
    ok(booking)
}
