// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session Plane (C8, spec §4.8): per-connection WebSocket loop.
//!
//! Grounded on the teacher's `transport/ws.rs` connection handler, which
//! multiplexes several `broadcast::Receiver`s and the inbound socket stream
//! in one `tokio::select!` loop. Here the set of subscribed rooms grows at
//! runtime (a driver's `subscribe_tracking` adds a room mid-connection), so
//! each room is forwarded into one local `mpsc` channel by its own spawned
//! task instead of being selected on directly.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::collaborators::Claims;
use crate::domain::booking_core;
use crate::domain::user::UserType;
use crate::error::ErrorCode;
use crate::rate_limit::RouteClass;
use crate::transport::rooms::{booking_room, role_room, type_room, user_room};
use crate::transport::state::AppState;
use crate::transport::ws_msg::{ws_error, ClientMessage, ServerMessage};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// Time a connection is given to present an `auth` message before it is
/// dropped, when no `?token=` query parameter was supplied.
const AUTH_GRACE: Duration = Duration::from_secs(10);

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, state, query))
}

fn spawn_forwarder(state: &Arc<AppState>, room: String, tx: mpsc::Sender<ServerMessage>) -> JoinHandle<()> {
    let mut rx = state.rooms.subscribe(&room);
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    if tx.send(msg).await.is_err() {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

async fn authenticate(
    state: &Arc<AppState>,
    query: &WsQuery,
    ws_rx: &mut futures_util::stream::SplitStream<WebSocket>,
) -> Option<Claims> {
    if let Some(token) = &query.token {
        return state.collaborators.auth.verify(token).ok();
    }

    let wait = tokio::time::timeout(AUTH_GRACE, async {
        while let Some(Ok(msg)) = ws_rx.next().await {
            if let Message::Text(text) = msg {
                if let Ok(ClientMessage::Auth { token }) = serde_json::from_str::<ClientMessage>(&text) {
                    return state.collaborators.auth.verify(&token).ok();
                }
            }
        }
        None
    });
    wait.await.ok().flatten()
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>, query: WsQuery) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let claims = match authenticate(&state, &query, &mut ws_rx).await {
        Some(c) => c,
        None => {
            let _ = ws_tx.send(Message::Close(None)).await;
            return;
        }
    };

    let (local_tx, mut local_rx) = mpsc::channel::<ServerMessage>(128);
    let mut forwarders = vec![
        spawn_forwarder(&state, user_room(&claims.user_id), local_tx.clone()),
        spawn_forwarder(&state, role_room(claims.user_type.as_str()), local_tx.clone()),
        spawn_forwarder(&state, type_room(claims.user_type.as_str()), local_tx.clone()),
    ];

    if send_json(&mut ws_tx, &ServerMessage::AuthStatusUpdate { authenticated: true }).await.is_err() {
        abort_all(forwarders);
        return;
    }

    let as_driver = claims.user_type == UserType::Driver;
    let active_trips: Vec<String> = state
        .store
        .list_bookings_for_user(&claims.user_id, as_driver, None, usize::MAX)
        .into_iter()
        .filter(|b| !b.status.is_terminal())
        .map(|b| b.id)
        .collect();
    if send_json(&mut ws_tx, &ServerMessage::ActiveTrips { booking_ids: active_trips }).await.is_err() {
        abort_all(forwarders);
        return;
    }

    let heartbeat = Duration::from_secs(state.config.ws_heartbeat_secs.max(1));
    let mut ticker = tokio::time::interval(heartbeat);
    let mut missed_pongs: u32 = 0;

    loop {
        tokio::select! {
            forwarded = local_rx.recv() => {
                match forwarded {
                    Some(msg) => {
                        if send_json(&mut ws_tx, &msg).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = ws_rx.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(msg) => handle_client_message(&state, &claims, msg, &local_tx, &mut forwarders).await,
                            Err(_) => {
                                let _ = local_tx.send(ws_error(ErrorCode::ValidationError, "malformed message")).await;
                            }
                        }
                    }
                    Some(Ok(Message::Pong(_))) => missed_pongs = 0,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
            _ = ticker.tick() => {
                missed_pongs += 1;
                if missed_pongs > state.config.ws_max_missed_pongs {
                    break;
                }
                if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    abort_all(forwarders);
    handle_disconnect(&state, &claims).await;
}

fn abort_all(handles: Vec<JoinHandle<()>>) {
    for h in handles {
        h.abort();
    }
}

async fn send_json(
    ws_tx: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(msg).unwrap_or_else(|_| "{}".to_owned());
    ws_tx.send(Message::Text(text)).await
}

macro_rules! require_driver {
    ($claims:expr, $tx:expr) => {
        if $claims.user_type != UserType::Driver {
            let _ = $tx.send(ws_error(ErrorCode::Forbidden, "driver-only action")).await;
            return;
        }
    };
}

async fn handle_client_message(
    state: &Arc<AppState>,
    claims: &Claims,
    msg: ClientMessage,
    tx: &mpsc::Sender<ServerMessage>,
    forwarders: &mut Vec<JoinHandle<()>>,
) {
    match msg {
        ClientMessage::Auth { .. } => {}

        ClientMessage::Ping {} => {
            let _ = tx.send(ServerMessage::Pong {}).await;
        }

        ClientMessage::SubscribeTracking { booking_id } => {
            let Some(booking) = state.store.bookings.get(&booking_id) else {
                let _ = tx.send(ws_error(ErrorCode::BookingNotFound, "booking not found")).await;
                return;
            };
            let is_participant =
                booking.customer_id == claims.user_id || booking.driver_id.as_deref() == Some(&claims.user_id);
            if !is_participant {
                let _ = tx.send(ws_error(ErrorCode::Forbidden, "not a participant in this booking")).await;
                return;
            }

            forwarders.push(spawn_forwarder(state, booking_room(&booking_id), tx.clone()));
            if let Some(row) = state.store.tracking.get(&booking_id) {
                let _ = tx
                    .send(ServerMessage::BookingStatusUpdate { booking_id, status: row.status, at: row.updated_at })
                    .await;
            }
        }

        ClientMessage::UpdateLocation { latitude, longitude, accuracy, speed, bearing } => {
            require_driver!(claims, tx);
            let location = crate::domain::user::DriverLocation {
                coords: crate::domain::geo::Point::new(latitude, longitude),
                timestamp: chrono::Utc::now(),
                accuracy,
                speed,
                bearing,
            };
            if let Some(mut user) = state.store.users.get(&claims.user_id) {
                let booking_id = user.driver.as_ref().and_then(|d| d.current_booking_id.clone());
                if let Some(profile) = user.driver.as_mut() {
                    profile.current_location = Some(location);
                    profile.last_seen = chrono::Utc::now();
                }
                state.store.users.put(&claims.user_id, user);
                if let Some(booking_id) = booking_id {
                    state.rooms.publish(
                        &booking_room(&booking_id),
                        ServerMessage::LocationUpdated { booking_id, driver_id: claims.user_id.clone(), location: location.coords },
                    );
                }
            }
        }

        ClientMessage::SendMessage { booking_id, text } => {
            if !(1..=500).contains(&text.chars().count()) {
                let _ = tx.send(ws_error(ErrorCode::ValidationError, "message must be 1..500 characters")).await;
                return;
            }
            if !state.rate_limiter.check(&claims.user_id, RouteClass::General) {
                let _ = tx.send(ws_error(ErrorCode::RateLimitExceeded, "too many messages")).await;
                return;
            }
            state.rooms.publish(
                &booking_room(&booking_id),
                ServerMessage::ChatMessage { booking_id, from: claims.user_id.clone(), text, at: chrono::Utc::now() },
            );
        }

        ClientMessage::TypingStart { booking_id } => {
            state.rooms.publish(
                &booking_room(&booking_id),
                ServerMessage::TypingIndicator { booking_id, user_id: claims.user_id.clone(), typing: true },
            );
        }

        ClientMessage::TypingStop { booking_id } => {
            state.rooms.publish(
                &booking_room(&booking_id),
                ServerMessage::TypingIndicator { booking_id, user_id: claims.user_id.clone(), typing: false },
            );
        }

        ClientMessage::PresenceUpdate { available } => {
            require_driver!(claims, tx);
            if let Some(mut user) = state.store.users.get(&claims.user_id) {
                if let Some(profile) = user.driver.as_mut() {
                    profile.is_available = available;
                }
                state.store.users.put(&claims.user_id, user);
            }
            state
                .rooms
                .publish(&role_room("driver"), ServerMessage::PresenceUpdated { user_id: claims.user_id.clone(), available });
        }

        ClientMessage::EmergencyAlert { booking_id, latitude, longitude } => {
            let location = crate::domain::geo::Point::new(latitude, longitude);
            let payload =
                ServerMessage::EmergencyAlert { booking_id: booking_id.clone(), user_id: claims.user_id.clone(), location };
            state.rooms.publish(&booking_room(&booking_id), payload.clone());
            state.rooms.publish(&role_room("admin"), payload);
        }

        ClientMessage::TripStatusUpdate { booking_id, status } => {
            require_driver!(claims, tx);
            match booking_core::update_status(&state.store, &booking_id, status, chrono::Utc::now()) {
                Ok(booking) => {
                    let msg = ServerMessage::BookingStatusUpdate { booking_id: booking_id.clone(), status: booking.status, at: chrono::Utc::now() };
                    state.rooms.publish(&booking_room(&booking_id), msg.clone());
                    state.rooms.publish(&user_room(&booking.customer_id), msg.clone());
                    state.rooms.publish(&type_room("customer"), msg);
                }
                Err(e) => {
                    let _ = tx.send(ws_error(e.code(), &e.to_string())).await;
                }
            }
        }

        ClientMessage::AcceptBooking { booking_id } => {
            require_driver!(claims, tx);
            match booking_core::accept_booking(&state.store, &state.locks, &booking_id, &claims.user_id, chrono::Utc::now()) {
                Ok(booking) => {
                    if let Some(driver) = state.store.users.get(&claims.user_id) {
                        let msg = ServerMessage::DriverAssigned {
                            booking_id: booking_id.clone(),
                            driver_id: claims.user_id.clone(),
                            driver_name: driver.name,
                            vehicle_number: driver.vehicle_number,
                        };
                        state.rooms.publish(&booking_room(&booking_id), msg.clone());
                        state.rooms.publish(&user_room(&booking.customer_id), msg.clone());
                        state.rooms.publish(&type_room("customer"), msg);
                    }
                }
                Err(e) => {
                    let _ = tx.send(ws_error(e.code(), &e.to_string())).await;
                }
            }
        }

        ClientMessage::RejectBooking { booking_id, reason } => {
            require_driver!(claims, tx);
            if let Err(e) = booking_core::reject_booking(&state.store, &booking_id, &claims.user_id, &reason, chrono::Utc::now()) {
                let _ = tx.send(ws_error(e.code(), &e.to_string())).await;
            }
        }

        ClientMessage::DriverStatusUpdate { is_online, is_available } => {
            require_driver!(claims, tx);
            if let Some(mut user) = state.store.users.get(&claims.user_id) {
                let current_coords = user.driver.as_ref().and_then(|d| d.current_location).map(|l| l.coords);
                let online = is_online
                    && crate::domain::service_area::validate_driver_online(
                        &state.service_area,
                        current_coords.unwrap_or(state.service_area.centre),
                    );
                if let Some(profile) = user.driver.as_mut() {
                    profile.is_online = online;
                    profile.is_available = online && is_available;
                    profile.last_seen = chrono::Utc::now();
                }
                state.store.users.put(&claims.user_id, user);
            }
        }
    }
}

/// I4: a transport disconnect never mutates `isOnline` directly. If the
/// driver has an active (occupied) booking, force `isOnline=true,
/// isAvailable=false`; otherwise only `lastSeen` advances.
async fn handle_disconnect(state: &Arc<AppState>, claims: &Claims) {
    if claims.user_type != UserType::Driver {
        return;
    }
    let Some(mut user) = state.store.users.get(&claims.user_id) else { return };
    let has_active_booking = user
        .driver
        .as_ref()
        .and_then(|d| d.current_booking_id.clone())
        .and_then(|id| state.store.bookings.get(&id))
        .map(|b| b.status.is_occupied())
        .unwrap_or(false);

    if let Some(profile) = user.driver.as_mut() {
        if has_active_booking {
            profile.is_online = true;
            profile.is_available = false;
        }
        profile.last_seen = chrono::Utc::now();
    }
    state.store.users.put(&claims.user_id, user);
}
