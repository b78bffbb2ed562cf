// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JWT bearer-token authentication middleware (C8/C9, spec §6), replacing
//! the teacher's shared-secret equality check with signed-claims
//! verification via the injected [`crate::collaborators::AuthProvider`].

use std::sync::Arc;

use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ErrorCode;
use crate::transport::state::AppState;
use crate::transport::ErrorResponse;

/// Routes that never require a bearer token: health checks and the
/// WebSocket upgrade (auth there happens via the first `auth` client
/// message, per spec §4.8).
fn is_public(path: &str) -> bool {
    path == "/api/v1/health" || path == "/api/v1/ready" || path == "/ws"
}

/// Axum middleware enforcing bearer-token auth on every route except the
/// public ones above. On success, the decoded [`crate::collaborators::Claims`]
/// are inserted into the request extensions for handlers to read.
pub async fn auth_layer(State(state): State<Arc<AppState>>, mut req: Request<axum::body::Body>, next: Next) -> Response {
    let path = req.uri().path().to_owned();
    if is_public(&path) {
        return next.run(req).await;
    }

    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let token = match token {
        Some(t) => t,
        None => return unauthorized(ErrorCode::MissingToken),
    };

    match state.collaborators.auth.verify(token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(code) => unauthorized(code),
    }
}

fn unauthorized(code: ErrorCode) -> Response {
    let body = ErrorResponse { error: code.to_error_body("authentication failed") };
    (StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::UNAUTHORIZED), axum::Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_and_ws_are_public() {
        assert!(is_public("/api/v1/health"));
        assert!(is_public("/api/v1/ready"));
        assert!(is_public("/ws"));
        assert!(!is_public("/api/v1/bookings"));
    }
}
