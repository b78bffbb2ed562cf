// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session Plane (C8, spec §4.8) wire protocol: the internally-tagged JSON
//! enums exchanged over the WebSocket connection.

use serde::{Deserialize, Serialize};

use crate::domain::booking::BookingStatus;
use crate::domain::geo::Point;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    NewBookingAvailable {
        booking_id: String,
        pickup: Point,
        dropoff: Point,
        fare_total: i64,
        distance_km: f64,
    },
    DriverAssigned {
        booking_id: String,
        driver_id: String,
        driver_name: String,
        vehicle_number: Option<String>,
    },
    BookingStatusUpdate {
        booking_id: String,
        status: BookingStatus,
        at: chrono::DateTime<chrono::Utc>,
    },
    LocationUpdated {
        booking_id: String,
        driver_id: String,
        location: Point,
    },
    ChatMessage {
        booking_id: String,
        from: String,
        text: String,
        at: chrono::DateTime<chrono::Utc>,
    },
    TypingIndicator {
        booking_id: String,
        user_id: String,
        typing: bool,
    },
    PresenceUpdated {
        user_id: String,
        available: bool,
    },
    EmergencyAlert {
        booking_id: String,
        user_id: String,
        location: Point,
    },
    EtaUpdated {
        booking_id: String,
        eta_minutes: f64,
    },
    AuthStatusUpdate {
        authenticated: bool,
    },
    SessionExpired {},
    ForceLogout {
        reason: String,
    },
    ActiveTrips {
        booking_ids: Vec<String>,
    },
    Error {
        code: String,
        message: String,
    },
    Pong {},
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Auth {
        token: String,
    },
    SubscribeTracking {
        booking_id: String,
    },
    UpdateLocation {
        latitude: f64,
        longitude: f64,
        accuracy: Option<f64>,
        speed: Option<f64>,
        bearing: Option<f64>,
    },
    SendMessage {
        booking_id: String,
        text: String,
    },
    TypingStart {
        booking_id: String,
    },
    TypingStop {
        booking_id: String,
    },
    PresenceUpdate {
        available: bool,
    },
    EmergencyAlert {
        booking_id: String,
        latitude: f64,
        longitude: f64,
    },
    TripStatusUpdate {
        booking_id: String,
        status: BookingStatus,
    },
    AcceptBooking {
        booking_id: String,
    },
    RejectBooking {
        booking_id: String,
        reason: String,
    },
    DriverStatusUpdate {
        is_online: bool,
        is_available: bool,
    },
    Ping {},
}

/// Build a WebSocket error message.
pub fn ws_error(code: crate::error::ErrorCode, message: &str) -> ServerMessage {
    ServerMessage::Error { code: code.as_str().to_owned(), message: message.to_owned() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_message_tag_roundtrips() {
        let raw = r#"{"type":"accept_booking","booking_id":"b1"}"#;
        let msg: ClientMessage = serde_json::from_str(raw).unwrap();
        assert!(matches!(msg, ClientMessage::AcceptBooking { booking_id } if booking_id == "b1"));
    }

    #[test]
    fn server_message_serializes_with_type_tag() {
        let msg = ServerMessage::Pong {};
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"pong"}"#);
    }
}
