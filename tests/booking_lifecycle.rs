// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end booking lifecycle over the HTTP surface (spec §8 scenarios 1-3),
//! driven with `axum_test::TestServer` the way the teacher's own
//! `transport/http/*_tests.rs` files drive `build_router`.

use axum::http::StatusCode;
use serde_json::{json, Value};

use dispatch_core::domain::user::{DriverProfile, User, UserType};
use dispatch_core::domain::verification::VerificationStatus;
use dispatch_core::test_support::{mint_token, AppStateBuilder};
use dispatch_core::transport::build_router;

fn customer_token() -> String {
    mint_token("c1", UserType::Customer, None)
}

fn driver_token() -> String {
    mint_token("d1", UserType::Driver, None)
}

fn auth(token: &str) -> (axum::http::HeaderName, axum::http::HeaderValue) {
    (axum::http::header::AUTHORIZATION, axum::http::HeaderValue::from_str(&format!("Bearer {token}")).unwrap())
}

fn pickup_near_centre() -> Value {
    json!({"name": "alice", "phone": "+910000000001", "address": "a", "location": {"latitude": 12.9716, "longitude": 77.5946}})
}

fn dropoff_near_centre() -> Value {
    json!({"name": "bob", "phone": "+910000000002", "address": "b", "location": {"latitude": 12.98, "longitude": 77.6}})
}

fn create_booking_body() -> Value {
    json!({
        "pickup": pickup_near_centre(),
        "dropoff": dropoff_near_centre(),
        "package": {"weight_kg": 2.0, "description": "box", "fragile": false},
        "vehicle_type": "2_wheeler",
        "payment_method": "cash",
    })
}

fn seed_online_driver(state: &dispatch_core::transport::state::AppState) {
    let mut user = User::new_driver("+919000000001", "driver one");
    user.user_id = "d1".into();
    user.driver = Some(DriverProfile {
        verification_status: VerificationStatus::Verified,
        is_verified: true,
        is_online: true,
        is_available: true,
        current_location: Some(dispatch_core::domain::user::DriverLocation {
            coords: dispatch_core::domain::geo::Point::new(12.9716, 77.5946),
            timestamp: chrono::Utc::now(),
            accuracy: None,
            speed: None,
            bearing: None,
        }),
        current_booking_id: None,
        rating: 4.5,
        trip_count: 20,
        last_seen: chrono::Utc::now(),
        documents: Default::default(),
        previously_approved: true,
    });
    state.store.users.put("d1", user);
}

#[tokio::test]
async fn health_and_ready_are_public() -> anyhow::Result<()> {
    let state = AppStateBuilder::new().build();
    let server = axum_test::TestServer::new(build_router(state))?;

    server.get("/api/v1/health").await.assert_status(StatusCode::OK);
    server.get("/api/v1/ready").await.assert_status(StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn bookings_require_a_bearer_token() -> anyhow::Result<()> {
    let state = AppStateBuilder::new().build();
    let server = axum_test::TestServer::new(build_router(state))?;

    let resp = server.get("/api/v1/bookings").await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}

/// Scenario: customer creates a booking near an online, verified driver; the
/// booking is dispatched and immediately acceptable.
#[tokio::test]
async fn customer_creates_booking_and_driver_accepts() -> anyhow::Result<()> {
    let state = AppStateBuilder::new().build();
    seed_online_driver(&state);
    let server = axum_test::TestServer::new(build_router(state))?;

    let (name, value) = auth(&customer_token());
    let resp = server.post("/api/v1/bookings").add_header(name, value).json(&create_booking_body()).await;
    resp.assert_status(StatusCode::OK);
    let booking: Value = resp.json();
    assert_eq!(booking["status"], "pending");
    let booking_id = booking["id"].as_str().unwrap().to_owned();

    let (name, value) = auth(&driver_token());
    let resp = server.post(&format!("/api/v1/bookings/{booking_id}/accept")).add_header(name, value).await;
    resp.assert_status(StatusCode::OK);
    let accepted: Value = resp.json();
    assert_eq!(accepted["status"], "driver_assigned");
    assert_eq!(accepted["driver_id"], "d1");
    Ok(())
}

/// Scenario: a second driver's concurrent accept of an already-assigned
/// booking is rejected (I2: at most one active driver per booking).
#[tokio::test]
async fn second_driver_cannot_accept_already_assigned_booking() -> anyhow::Result<()> {
    let state = AppStateBuilder::new().build();
    seed_online_driver(&state);
    let mut other = User::new_driver("+919000000002", "driver two");
    other.user_id = "d2".into();
    other.driver = Some(DriverProfile {
        verification_status: VerificationStatus::Verified,
        is_verified: true,
        is_online: true,
        is_available: true,
        current_location: Some(dispatch_core::domain::user::DriverLocation {
            coords: dispatch_core::domain::geo::Point::new(12.9716, 77.5946),
            timestamp: chrono::Utc::now(),
            accuracy: None,
            speed: None,
            bearing: None,
        }),
        current_booking_id: None,
        rating: 4.0,
        trip_count: 3,
        last_seen: chrono::Utc::now(),
        documents: Default::default(),
        previously_approved: true,
    });
    state.store.users.put("d2", other);
    let server = axum_test::TestServer::new(build_router(state))?;

    let (name, value) = auth(&customer_token());
    let resp = server.post("/api/v1/bookings").add_header(name, value).json(&create_booking_body()).await;
    let booking: Value = resp.json();
    let booking_id = booking["id"].as_str().unwrap().to_owned();

    let d1_token = mint_token("d1", UserType::Driver, None);
    let d2_token = mint_token("d2", UserType::Driver, None);

    let (name, value) = auth(&d1_token);
    server.post(&format!("/api/v1/bookings/{booking_id}/accept")).add_header(name, value).await.assert_status(StatusCode::OK);

    let (name, value) = auth(&d2_token);
    let resp = server.post(&format!("/api/v1/bookings/{booking_id}/accept")).add_header(name, value).await;
    resp.assert_status(StatusCode::CONFLICT);
    Ok(())
}

/// Scenario: a booking with no nearby drivers still returns a pending
/// booking (dispatch failing to find a candidate is not a create-time error).
#[tokio::test]
async fn booking_created_with_no_nearby_drivers_stays_pending() -> anyhow::Result<()> {
    let state = AppStateBuilder::new().build();
    let server = axum_test::TestServer::new(build_router(state))?;

    let (name, value) = auth(&customer_token());
    let resp = server.post("/api/v1/bookings").add_header(name, value).json(&create_booking_body()).await;
    resp.assert_status(StatusCode::OK);
    let booking: Value = resp.json();
    assert_eq!(booking["status"], "pending");
    assert!(booking["driver_id"].is_null());
    Ok(())
}

/// Scenario: cancelling before assignment refunds the fare in full.
#[tokio::test]
async fn cancel_before_assignment_refunds_in_full() -> anyhow::Result<()> {
    let state = AppStateBuilder::new().build();
    let server = axum_test::TestServer::new(build_router(state))?;

    let (name, value) = auth(&customer_token());
    let resp = server.post("/api/v1/bookings").add_header(name.clone(), value.clone()).json(&create_booking_body()).await;
    let booking: Value = resp.json();
    let booking_id = booking["id"].as_str().unwrap().to_owned();
    let total = booking["fare"]["total"].as_i64().unwrap();

    let resp = server
        .post(&format!("/api/v1/bookings/{booking_id}/cancel"))
        .add_header(name, value)
        .json(&json!({"reason": "changed my mind"}))
        .await;
    resp.assert_status(StatusCode::OK);
    let cancelled: Value = resp.json();
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(cancelled["cancellation"]["refund_amount"], total);
    Ok(())
}

/// Scenario: a customer cannot read a booking belonging to someone else.
#[tokio::test]
async fn non_participant_cannot_view_booking_detail() -> anyhow::Result<()> {
    let state = AppStateBuilder::new().build();
    let server = axum_test::TestServer::new(build_router(state))?;

    let (name, value) = auth(&customer_token());
    let resp = server.post("/api/v1/bookings").add_header(name, value).json(&create_booking_body()).await;
    let booking: Value = resp.json();
    let booking_id = booking["id"].as_str().unwrap().to_owned();

    let stranger = mint_token("c2", UserType::Customer, None);
    let (name, value) = auth(&stranger);
    let resp = server.get(&format!("/api/v1/bookings/{booking_id}")).add_header(name, value).await;
    resp.assert_status(StatusCode::FORBIDDEN);
    Ok(())
}
