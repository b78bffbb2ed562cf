// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error codes shared across HTTP and WebSocket transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    MissingToken,
    InvalidToken,
    TokenExpired,
    Forbidden,
    InsufficientPermissions,
    ValidationError,
    BookingNotFound,
    BookingAlreadyAssigned,
    DriverNotAvailable,
    DriverNotFound,
    SlotNotFound,
    SlotNotAvailable,
    SlotAlreadyStarted,
    GenerationInProgress,
    ServiceAreaViolation,
    RateLimitExceeded,
    UpstreamUnavailable,
    Internal,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::MissingToken => 401,
            Self::InvalidToken => 401,
            Self::TokenExpired => 401,
            Self::Forbidden => 403,
            Self::InsufficientPermissions => 403,
            Self::ValidationError => 400,
            Self::BookingNotFound => 404,
            Self::BookingAlreadyAssigned => 409,
            Self::DriverNotAvailable => 409,
            Self::DriverNotFound => 404,
            Self::SlotNotFound => 404,
            Self::SlotNotAvailable => 409,
            Self::SlotAlreadyStarted => 409,
            Self::GenerationInProgress => 409,
            Self::ServiceAreaViolation => 422,
            Self::RateLimitExceeded => 429,
            Self::UpstreamUnavailable => 503,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingToken => "MISSING_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::Forbidden => "FORBIDDEN",
            Self::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BookingNotFound => "BOOKING_NOT_FOUND",
            Self::BookingAlreadyAssigned => "BOOKING_ALREADY_ASSIGNED",
            Self::DriverNotAvailable => "DRIVER_NOT_AVAILABLE",
            Self::DriverNotFound => "DRIVER_NOT_FOUND",
            Self::SlotNotFound => "SLOT_NOT_FOUND",
            Self::SlotNotAvailable => "SLOT_NOT_AVAILABLE",
            Self::SlotAlreadyStarted => "SLOT_ALREADY_STARTED",
            Self::GenerationInProgress => "GENERATION_IN_PROGRESS",
            Self::ServiceAreaViolation => "SERVICE_AREA_VIOLATION",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain-level failure produced by the store and dispatch layers before
/// being mapped to a transport [`ErrorCode`].
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("transaction conflict after {0} retries")]
    TransactionConflict(u32),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("booking already assigned")]
    BookingAlreadyAssigned,
    #[error("driver not available")]
    DriverNotAvailable,
    #[error("slot not available")]
    SlotNotAvailable,
    #[error("slot already started")]
    SlotAlreadyStarted,
    #[error("generation already in progress for this driver")]
    GenerationInProgress,
    #[error("point is outside the service area")]
    ServiceAreaViolation,
}

impl CoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::BookingNotFound,
            Self::TransactionConflict(_) => ErrorCode::UpstreamUnavailable,
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::BookingAlreadyAssigned => ErrorCode::BookingAlreadyAssigned,
            Self::DriverNotAvailable => ErrorCode::DriverNotAvailable,
            Self::SlotNotAvailable => ErrorCode::SlotNotAvailable,
            Self::SlotAlreadyStarted => ErrorCode::SlotAlreadyStarted,
            Self::GenerationInProgress => ErrorCode::GenerationInProgress,
            Self::ServiceAreaViolation => ErrorCode::ServiceAreaViolation,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
