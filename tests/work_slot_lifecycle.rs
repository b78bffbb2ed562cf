// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work-slot generation, selection, and booking over the HTTP surface
//! (C5, spec §4.4 / §8).

use axum::http::StatusCode;
use serde_json::{json, Value};

use dispatch_core::domain::user::UserType;
use dispatch_core::test_support::{mint_token, AppStateBuilder};
use dispatch_core::transport::build_router;

fn auth(token: &str) -> (axum::http::HeaderName, axum::http::HeaderValue) {
    (axum::http::header::AUTHORIZATION, axum::http::HeaderValue::from_str(&format!("Bearer {token}")).unwrap())
}

fn driver_token() -> String {
    mint_token("d1", UserType::Driver, None)
}

#[tokio::test]
async fn generating_slots_twice_produces_the_same_eight_ids() -> anyhow::Result<()> {
    let state = AppStateBuilder::new().build();
    let server = axum_test::TestServer::new(build_router(state))?;
    let (name, value) = auth(&driver_token());

    let body = json!({"date": "2030-03-01"});
    let first = server.post("/api/v1/work-slots/generate").add_header(name.clone(), value.clone()).json(&body).await;
    first.assert_status(StatusCode::OK);
    let first: Vec<Value> = first.json();
    assert_eq!(first.len(), 8);

    let second = server.post("/api/v1/work-slots/generate").add_header(name, value).json(&body).await;
    let second: Vec<Value> = second.json();
    let first_ids: Vec<_> = first.iter().map(|s| s["id"].as_str().unwrap().to_owned()).collect();
    let second_ids: Vec<_> = second.iter().map(|s| s["id"].as_str().unwrap().to_owned()).collect();
    assert_eq!(first_ids, second_ids);
    Ok(())
}

/// A customer can book a driver's selected, available slot; a second
/// customer booking the same slot is rejected (I-like single-occupancy
/// for slots, mirrored from the booking assignment invariant).
#[tokio::test]
async fn customer_books_an_available_slot_and_a_second_booking_is_rejected() -> anyhow::Result<()> {
    let state = AppStateBuilder::new().build();
    let server = axum_test::TestServer::new(build_router(state))?;
    let (dname, dvalue) = auth(&driver_token());

    let generated = server
        .post("/api/v1/work-slots/generate")
        .add_header(dname, dvalue)
        .json(&json!({"date": "2030-03-01"}))
        .await
        .json::<Vec<Value>>();
    let slot_id = generated[0]["id"].as_str().unwrap().to_owned();

    let c1 = mint_token("c1", UserType::Customer, None);
    let c2 = mint_token("c2", UserType::Customer, None);

    let (name, value) = auth(&c1);
    let resp = server.post(&format!("/api/v1/work-slots/{slot_id}/book")).add_header(name, value).await;
    resp.assert_status(StatusCode::OK);
    let booked: Value = resp.json();
    assert_eq!(booked["status"], "booked");
    assert_eq!(booked["customer_id"], "c1");

    let (name, value) = auth(&c2);
    let resp = server.post(&format!("/api/v1/work-slots/{slot_id}/book")).add_header(name, value).await;
    resp.assert_status(StatusCode::CONFLICT);
    Ok(())
}

/// A driver cannot deselect a slot that has already started (I5).
#[tokio::test]
async fn deselecting_a_started_slot_is_rejected() -> anyhow::Result<()> {
    let state = AppStateBuilder::new().build();
    let server = axum_test::TestServer::new(build_router(state))?;
    let (name, value) = auth(&driver_token());

    let past_date = chrono::Utc::now().date_naive() - chrono::Duration::days(1);
    let generated = server
        .post("/api/v1/work-slots/generate")
        .add_header(name.clone(), value.clone())
        .json(&json!({"date": past_date.to_string()}))
        .await
        .json::<Vec<Value>>();
    let slot_id = generated[0]["id"].as_str().unwrap().to_owned();

    server
        .patch(&format!("/api/v1/work-slots/{slot_id}/select"))
        .add_header(name.clone(), value.clone())
        .json(&json!({"is_selected": true}))
        .await
        .assert_status(StatusCode::OK);

    let resp = server
        .patch(&format!("/api/v1/work-slots/{slot_id}/select"))
        .add_header(name, value)
        .json(&json!({"is_selected": false}))
        .await;
    resp.assert_status(StatusCode::CONFLICT);
    Ok(())
}

/// Listing slots with no `from`/`to` query params must still deserialize
/// (the `Option<NaiveDate>` fields default to `None` rather than erroring).
#[tokio::test]
async fn listing_slots_without_a_date_range_succeeds() -> anyhow::Result<()> {
    let state = AppStateBuilder::new().build();
    let server = axum_test::TestServer::new(build_router(state))?;
    let (name, value) = auth(&driver_token());

    server
        .post("/api/v1/work-slots/generate")
        .add_header(name.clone(), value.clone())
        .json(&json!({"date": "2030-03-01"}))
        .await
        .assert_status(StatusCode::OK);

    let resp = server.get("/api/v1/work-slots").add_header(name, value).await;
    resp.assert_status(StatusCode::OK);
    let rows: Vec<Value> = resp.json();
    assert_eq!(rows.len(), 8);
    Ok(())
}
