// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin HTTP surface (spec §4.9): document review and verification
//! escalation, gated on `role ∈ {super_admin, admin}`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::collaborators::Claims;
use crate::domain::user::User;
use crate::domain::verification::{DocStatus, DocumentKind, VerificationStatus};
use crate::domain::verification_engine;
use crate::error::ErrorCode;
use crate::transport::http::{ok, require_admin, ApiError, ApiResult};
use crate::transport::rooms::user_room;
use crate::transport::state::AppState;
use crate::transport::ws_msg::ServerMessage;

#[derive(Debug, Deserialize)]
pub struct ReviewDocumentRequest {
    pub kind: DocumentKind,
    pub status: DocStatus,
}

pub async fn review_document(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(driver_id): Path<String>,
    Json(body): Json<ReviewDocumentRequest>,
) -> ApiResult<User> {
    require_admin(&claims)?;
    let user = verification_engine::review_document(
        &state.store,
        &driver_id,
        body.kind,
        body.status,
        None,
        Some(claims.user_id.clone()),
        chrono::Utc::now(),
    )?;

    if let Some(profile) = &user.driver {
        state.rooms.publish(
            &user_room(&driver_id),
            ServerMessage::Error { code: "VERIFICATION_STATUS_CHANGED".into(), message: profile.verification_status.as_str().to_owned() },
        );
    }
    ok(user)
}

pub async fn grant_approved(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(driver_id): Path<String>,
) -> ApiResult<User> {
    require_admin(&claims)?;
    let user = verification_engine::grant_approved(&state.store, &driver_id, &claims.user_id, chrono::Utc::now())?;
    ok(user)
}

#[derive(Debug, Serialize)]
pub struct VerificationStatusEntry {
    pub driver_id: String,
    pub status: VerificationStatus,
}

/// List every driver currently `pending_verification` or `rejected`, the
/// admin review queue (spec §4.9).
pub async fn verification_queue(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Vec<VerificationStatusEntry>> {
    require_admin(&claims)?;
    let rows = state
        .store
        .users
        .query(|u| {
            u.driver.as_ref().map(|d| matches!(d.verification_status, VerificationStatus::PendingVerification | VerificationStatus::Rejected)).unwrap_or(false)
        })
        .into_iter()
        .map(|u| VerificationStatusEntry { driver_id: u.user_id.clone(), status: u.driver.as_ref().map(|d| d.verification_status).unwrap_or(VerificationStatus::NotUploaded) })
        .collect();
    ok(rows)
}

/// Backfill a driver's documents/location from a record exported by a
/// system that predates the canonical storage shapes (spec §9).
pub async fn import_legacy_record(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(driver_id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<User> {
    require_admin(&claims)?;
    let user = verification_engine::import_legacy_record(&state.store, &driver_id, &body)?;
    ok(user)
}

pub async fn deactivate_driver(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(driver_id): Path<String>,
) -> ApiResult<User> {
    require_admin(&claims)?;
    let mut user = state.store.users.get(&driver_id).ok_or_else(|| ApiError::new(ErrorCode::DriverNotFound, "driver not found"))?;
    user.deactivated = true;
    if let Some(profile) = user.driver.as_mut() {
        profile.is_online = false;
        profile.is_available = false;
    }
    state.store.users.put(&driver_id, user.clone());
    ok(user)
}
