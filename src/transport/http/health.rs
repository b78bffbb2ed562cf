// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::transport::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthBody {
    status: &'static str,
}

pub async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

#[derive(Debug, Serialize)]
pub struct ReadyBody {
    ready: bool,
    bookings: usize,
    users: usize,
}

pub async fn ready(State(state): State<Arc<AppState>>) -> Json<ReadyBody> {
    Json(ReadyBody { ready: true, bookings: state.store.bookings.list().len(), users: state.store.users.list().len() })
}
