// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver HTTP surface (spec §4.9): profile, online/availability toggle,
//! location, and document upload.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::collaborators::Claims;
use crate::domain::geo::Point;
use crate::domain::service_area;
use crate::domain::user::{DriverLocation, User};
use crate::domain::verification::{DocStatus, DocumentKind};
use crate::domain::verification_engine;
use crate::error::ErrorCode;
use crate::rate_limit::RouteClass;
use crate::transport::http::{ok, require_driver, ApiError, ApiResult};
use crate::transport::rooms::role_room;
use crate::transport::state::AppState;
use crate::transport::ws_msg::ServerMessage;

pub async fn profile(State(state): State<Arc<AppState>>, Extension(claims): Extension<Claims>) -> ApiResult<User> {
    let driver_id = require_driver(&claims)?;
    let user = state.store.users.get(driver_id).ok_or_else(|| ApiError::new(ErrorCode::DriverNotFound, "driver not found"))?;
    ok(user)
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(driver_id): Path<String>,
) -> ApiResult<User> {
    if claims.user_id != driver_id && claims.user_type != crate::domain::user::UserType::Admin {
        return Err(ApiError::new(ErrorCode::Forbidden, "not authorized to view this driver"));
    }
    let user = state.store.users.get(&driver_id).ok_or_else(|| ApiError::new(ErrorCode::DriverNotFound, "driver not found"))?;
    ok(user)
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub is_online: bool,
    pub is_available: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdateResponse {
    pub is_online: bool,
    pub is_available: bool,
}

/// I4 does not apply here: this is an explicit client request, not a
/// transport disconnect, so the requested flags are honored as given
/// (subject to the service-area gate on `is_online`).
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<StatusUpdateRequest>,
) -> ApiResult<StatusUpdateResponse> {
    let driver_id = require_driver(&claims)?.to_owned();
    let mut user =
        state.store.users.get(&driver_id).ok_or_else(|| ApiError::new(ErrorCode::DriverNotFound, "driver not found"))?;

    let current_coords = user.driver.as_ref().and_then(|d| d.current_location).map(|l| l.coords);
    let online = body.is_online
        && service_area::validate_driver_online(&state.service_area, current_coords.unwrap_or(state.service_area.centre));
    if body.is_online && !online {
        return Err(ApiError::new(ErrorCode::ServiceAreaViolation, "driver location is outside the service area"));
    }

    let response = if let Some(profile) = user.driver.as_mut() {
        profile.is_online = online;
        profile.is_available = online && body.is_available;
        profile.last_seen = chrono::Utc::now();
        StatusUpdateResponse { is_online: profile.is_online, is_available: profile.is_available }
    } else {
        return Err(ApiError::new(ErrorCode::Forbidden, "driver account required"));
    };

    state.store.users.put(&driver_id, user);
    state.rooms.publish(&role_room("driver"), ServerMessage::PresenceUpdated { user_id: driver_id, available: response.is_available });
    ok(response)
}

#[derive(Debug, Deserialize)]
pub struct LocationUpdateRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub bearing: Option<f64>,
}

pub async fn update_location(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<LocationUpdateRequest>,
) -> ApiResult<DriverLocation> {
    let driver_id = require_driver(&claims)?.to_owned();
    let mut user =
        state.store.users.get(&driver_id).ok_or_else(|| ApiError::new(ErrorCode::DriverNotFound, "driver not found"))?;

    let location = DriverLocation {
        coords: Point::new(body.latitude, body.longitude),
        timestamp: chrono::Utc::now(),
        accuracy: body.accuracy,
        speed: body.speed,
        bearing: body.bearing,
    };
    let booking_id = user.driver.as_ref().and_then(|d| d.current_booking_id.clone());
    if let Some(profile) = user.driver.as_mut() {
        profile.current_location = Some(location);
        profile.last_seen = chrono::Utc::now();
    } else {
        return Err(ApiError::new(ErrorCode::Forbidden, "driver account required"));
    }
    state.store.users.put(&driver_id, user);

    if let Some(booking_id) = booking_id {
        state.rooms.publish(
            &crate::transport::rooms::booking_room(&booking_id),
            ServerMessage::LocationUpdated { booking_id, driver_id, location: location.coords },
        );
    }
    ok(location)
}

#[derive(Debug, Serialize)]
pub struct DocumentUploadResponse {
    pub kind: DocumentKind,
    pub url: String,
    pub status: DocStatus,
}

fn parse_document_kind(raw: &str) -> Option<DocumentKind> {
    DocumentKind::REQUIRED.into_iter().find(|k| k.storage_key() == raw)
}

/// Accept a single-file multipart upload for one document kind (the `kind`
/// field names which of the five required documents this is). Newly
/// uploaded documents always start `pending` — only an admin review can
/// move them to `verified`/`rejected` (spec §4.2).
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> ApiResult<DocumentUploadResponse> {
    let driver_id = require_driver(&claims)?.to_owned();
    if !state.rate_limiter.check(&driver_id, RouteClass::Upload) {
        return Err(ApiError::new(ErrorCode::RateLimitExceeded, "too many uploads recently"));
    }

    let mut kind: Option<DocumentKind> = None;
    let mut bytes: Option<bytes::Bytes> = None;

    while let Some(field) = multipart.next_field().await.map_err(|_| ApiError::new(ErrorCode::ValidationError, "malformed upload"))? {
        match field.name() {
            Some("kind") => {
                let text = field.text().await.map_err(|_| ApiError::new(ErrorCode::ValidationError, "malformed kind field"))?;
                kind = parse_document_kind(&text);
            }
            Some("file") => {
                bytes = Some(field.bytes().await.map_err(|_| ApiError::new(ErrorCode::ValidationError, "malformed file field"))?);
            }
            _ => {}
        }
    }

    let kind = kind.ok_or_else(|| ApiError::new(ErrorCode::ValidationError, "unknown or missing document kind"))?;
    let bytes = bytes.ok_or_else(|| ApiError::new(ErrorCode::ValidationError, "missing file"))?;

    let url = state.collaborators.storage.put(&driver_id, kind.storage_key(), &bytes)?;
    let user = verification_engine::review_document(&state.store, &driver_id, kind, DocStatus::Pending, Some(url.clone()), None, chrono::Utc::now())?;
    let status =
        user.driver.as_ref().and_then(|d| d.documents.get(&kind)).map(|r| r.status).unwrap_or(DocStatus::Pending);

    ok(DocumentUploadResponse { kind, url, status })
}

impl From<ErrorCode> for ApiError {
    fn from(code: ErrorCode) -> Self {
        ApiError::new(code, "upstream collaborator failure")
    }
}
