// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! API contract types and server wiring for HTTP and WebSocket transports
//! (C8/C9, spec §4.8/§4.9).

pub mod auth;
pub mod http;
pub mod rooms;
pub mod state;
pub mod ws;
pub mod ws_msg;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ErrorCode;
use crate::transport::state::AppState;

/// Top-level error response envelope shared across HTTP and WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body containing a machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorCode {
    /// Convert this error code into a transport [`ErrorBody`].
    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into() }
    }

    /// Convert this error code into an axum JSON error response.
    pub fn to_http_response(&self, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body(message) };
        (status, Json(body))
    }
}

/// Build the full axum `Router`: the booking/driver/work-slot/service-area
/// HTTP surface (C9) plus the `/ws` session plane (C8), with auth and CORS
/// layered the way the teacher layers its own router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(http::health::health))
        .route("/api/v1/ready", get(http::health::ready))
        .route("/api/v1/bookings", post(http::bookings::create).get(http::bookings::list))
        .route("/api/v1/bookings/{booking_id}", get(http::bookings::detail))
        .route("/api/v1/bookings/{booking_id}/accept", post(http::bookings::accept))
        .route("/api/v1/bookings/{booking_id}/reject", post(http::bookings::reject))
        .route("/api/v1/bookings/{booking_id}/status", patch(http::bookings::update_status))
        .route("/api/v1/bookings/{booking_id}/cancel", post(http::bookings::cancel))
        .route("/api/v1/drivers/me", get(http::drivers::profile))
        .route("/api/v1/drivers/me/status", patch(http::drivers::update_status))
        .route("/api/v1/drivers/me/location", post(http::drivers::update_location))
        .route("/api/v1/drivers/me/documents", post(http::drivers::upload_document))
        .route("/api/v1/drivers/{driver_id}", get(http::drivers::detail))
        .route("/api/v1/work-slots/generate", post(http::work_slots::generate))
        .route("/api/v1/work-slots", get(http::work_slots::list))
        .route("/api/v1/work-slots/select-batch", post(http::work_slots::select_batch))
        .route("/api/v1/work-slots/{slot_id}/select", patch(http::work_slots::select))
        .route("/api/v1/work-slots/{slot_id}/book", post(http::work_slots::book))
        .route("/api/v1/service-area", get(http::service_area::info))
        .route("/api/v1/service-area/validate-point", post(http::service_area::validate_point))
        .route("/api/v1/service-area/validate-route", post(http::service_area::validate_route))
        .route("/api/v1/admin/drivers/{driver_id}/documents/review", post(http::admin::review_document))
        .route("/api/v1/admin/drivers/{driver_id}/documents/import-legacy", post(http::admin::import_legacy_record))
        .route("/api/v1/admin/drivers/{driver_id}/approve", post(http::admin::grant_approved))
        .route("/api/v1/admin/drivers/{driver_id}/deactivate", post(http::admin::deactivate_driver))
        .route("/api/v1/admin/verification-queue", get(http::admin::verification_queue))
        .route("/ws", get(ws::ws_handler))
        .layer(middleware::from_fn_with_state(state.clone(), auth::auth_layer))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Build a minimal health-only router, for `--health-port`.
pub fn build_health_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(http::health::health))
        .route("/api/v1/ready", get(http::health::ready))
        .with_state(state)
}
