// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work-Slot HTTP surface (C5, spec §4.4/§4.9): generate/list/select/book.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::collaborators::Claims;
use crate::domain::slots::{self, WorkSlot};
use crate::error::ErrorCode;
use crate::transport::http::{ok, require_driver, ApiError, ApiResult};
use crate::transport::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub date: chrono::NaiveDate,
}

/// Regenerate the eight canonical slots for a date: delete any existing rows
/// for `(driver, date)` then insert fresh ones, guarded against concurrent
/// regeneration for the same driver (spec §4.4).
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<GenerateRequest>,
) -> ApiResult<Vec<WorkSlot>> {
    let driver_id = require_driver(&claims)?.to_owned();
    state.slot_guard.try_acquire(&driver_id)?;

    let fresh = slots::generate_daily_slots(&driver_id, body.date);
    state.store.work_slots.delete_where(|s| s.driver_id == driver_id && s.date == body.date);
    for slot in &fresh {
        state.store.work_slots.put(&slot.id, slot.clone());
    }

    state.slot_guard.release(&driver_id);
    ok(fresh)
}

#[derive(Debug, Deserialize)]
pub struct ListSlotsQuery {
    #[serde(default)]
    pub from: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub to: Option<chrono::NaiveDate>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListSlotsQuery>,
) -> ApiResult<Vec<WorkSlot>> {
    let driver_id = require_driver(&claims)?.to_owned();
    let mut rows = state.store.work_slots.query(|s| {
        s.driver_id == driver_id
            && query.from.map(|d| s.date >= d).unwrap_or(true)
            && query.to.map(|d| s.date <= d).unwrap_or(true)
    });
    rows.sort_by(|a, b| (a.date, a.start_hour).cmp(&(b.date, b.start_hour)));
    ok(rows)
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub is_selected: bool,
}

pub async fn select(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(slot_id): Path<String>,
    Json(body): Json<SelectRequest>,
) -> ApiResult<WorkSlot> {
    let driver_id = require_driver(&claims)?.to_owned();
    let mut slot = state.store.work_slots.get(&slot_id).ok_or_else(|| ApiError::new(ErrorCode::SlotNotFound, "slot not found"))?;
    slots::set_selected(&mut slot, &driver_id, body.is_selected, chrono::Utc::now())?;
    state.store.work_slots.put(&slot_id, slot.clone());
    ok(slot)
}

#[derive(Debug, Deserialize)]
pub struct SelectBatchRequest {
    pub slot_ids: Vec<String>,
    pub is_selected: bool,
}

pub async fn select_batch(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<SelectBatchRequest>,
) -> ApiResult<Vec<String>> {
    let driver_id = require_driver(&claims)?.to_owned();
    let mut owned = state.store.work_slots.query(|s| s.driver_id == driver_id && body.slot_ids.contains(&s.id));
    let changed = slots::set_selected_batch(&mut owned, &driver_id, &body.slot_ids, body.is_selected, chrono::Utc::now());
    for slot in &owned {
        state.store.work_slots.put(&slot.id, slot.clone());
    }
    ok(changed)
}

/// A customer books a driver's `available` slot.
pub async fn book(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(slot_id): Path<String>,
) -> ApiResult<WorkSlot> {
    let mut slot = state.store.work_slots.get(&slot_id).ok_or_else(|| ApiError::new(ErrorCode::SlotNotFound, "slot not found"))?;
    slots::book_slot(&mut slot, &claims.user_id)?;
    state.store.work_slots.put(&slot_id, slot.clone());
    ok(slot)
}
