// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service-Area HTTP surface (C4, spec §4.3/§4.9): public config info and
//! route validation.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::geo::Point;
use crate::domain::service_area::{PointValidation, RouteValidation};
use crate::transport::http::{ok, ApiResult};
use crate::transport::state::AppState;

#[derive(Debug, Serialize)]
pub struct ServiceAreaInfo {
    pub centre: Point,
    pub radius_min_m: f64,
    pub radius_max_m: f64,
    pub warning_threshold_m: f64,
    pub strict: bool,
}

pub async fn info(State(state): State<Arc<AppState>>) -> ApiResult<ServiceAreaInfo> {
    let area = state.service_area;
    ok(ServiceAreaInfo {
        centre: area.centre,
        radius_min_m: area.radius_min_m,
        radius_max_m: area.radius_max_m,
        warning_threshold_m: area.warning_threshold_m,
        strict: area.strict,
    })
}

#[derive(Debug, Deserialize)]
pub struct ValidatePointRequest {
    pub latitude: f64,
    pub longitude: f64,
}

pub async fn validate_point(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ValidatePointRequest>,
) -> ApiResult<PointValidation> {
    let point = Point::new(body.latitude, body.longitude);
    ok(state.service_area.validate_point(point))
}

#[derive(Debug, Deserialize)]
pub struct ValidateRouteRequest {
    pub points: Vec<Point>,
}

pub async fn validate_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ValidateRouteRequest>,
) -> ApiResult<RouteValidation> {
    ok(crate::domain::service_area::validate_route(&state.service_area, &body.points))
}
