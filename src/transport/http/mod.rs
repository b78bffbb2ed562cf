// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External API Surface (C9, spec §4.9): the HTTP route handlers, grouped by
//! resource the way the teacher groups `transport/http.rs` by concern
//! (terminal/input/session/credentials).

pub mod admin;
pub mod bookings;
pub mod drivers;
pub mod health;
pub mod service_area;
pub mod work_slots;

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::collaborators::Claims;
use crate::domain::user::{AdminRole, UserType};
use crate::error::{CoreError, ErrorCode};

/// Shorthand for a handler result: success payload or a mapped `ErrorCode`.
pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Wraps an [`ErrorCode`] with a human-readable message, turned into the
/// shared [`ErrorResponse`] envelope by [`IntoResponse`].
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        let code = e.code();
        Self { code, message: e.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Per SPEC_FULL.md §7: Internal-mapped failures log at error!, every
        // other code is an expected client-facing rejection logged at debug!.
        if matches!(self.code, ErrorCode::Internal) {
            tracing::error!(code = %self.code, message = %self.message, "internal error");
        } else {
            tracing::debug!(code = %self.code, message = %self.message, "request rejected");
        }
        let (status, body) = self.code.to_http_response(self.message);
        (status, body).into_response()
    }
}

pub(crate) fn ok<T: Serialize>(value: T) -> ApiResult<T> {
    Ok(Json(value))
}

/// Require the caller to be an authenticated driver, returning their user id.
pub(crate) fn require_driver(claims: &Claims) -> Result<&str, ApiError> {
    if claims.user_type != UserType::Driver {
        return Err(ApiError::new(ErrorCode::Forbidden, "driver account required"));
    }
    Ok(&claims.user_id)
}

/// Require the caller to carry `super_admin` or `admin` (spec §4.9).
pub(crate) fn require_admin(claims: &Claims) -> Result<AdminRole, ApiError> {
    if claims.user_type != UserType::Admin {
        return Err(ApiError::new(ErrorCode::Forbidden, "admin account required"));
    }
    claims.role.ok_or_else(|| ApiError::new(ErrorCode::InsufficientPermissions, "admin token carries no role"))
}
