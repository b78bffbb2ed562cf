// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Room-keyed broadcast registry backing the Session Plane's pub/sub model
//! (C8, spec §4.8). Grounded on the teacher's `transport/ws.rs` connection
//! loop, which already multiplexes several `broadcast::Receiver`s into one
//! socket writer — generalized here from a handful of fixed channels to an
//! open-ended, lazily-created set of named rooms.

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::transport::ws_msg::ServerMessage;

/// Bounded so a slow or absent subscriber can't make the sender block; lagged
/// receivers simply skip ahead (`broadcast::error::RecvError::Lagged`).
const ROOM_CAPACITY: usize = 256;

#[derive(Default)]
pub struct Rooms {
    channels: DashMap<String, broadcast::Sender<ServerMessage>>,
}

impl Rooms {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, room: &str) -> broadcast::Sender<ServerMessage> {
        self.channels
            .entry(room.to_owned())
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .clone()
    }

    pub fn subscribe(&self, room: &str) -> broadcast::Receiver<ServerMessage> {
        self.sender(room).subscribe()
    }

    /// Publish to a room. A room with no subscribers silently drops the
    /// message (mirrors `broadcast::Sender::send`'s `Err` on zero receivers).
    pub fn publish(&self, room: &str, msg: ServerMessage) {
        let _ = self.sender(room).send(msg);
    }
}

pub fn user_room(user_id: &str) -> String {
    format!("user:{user_id}")
}

pub fn role_room(role: &str) -> String {
    format!("role:{role}")
}

pub fn type_room(user_type: &str) -> String {
    format!("type:{user_type}")
}

pub fn trip_room(trip_id: &str) -> String {
    format!("trip:{trip_id}")
}

pub fn booking_room(booking_id: &str) -> String {
    format!("booking:{booking_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_reaches_subscriber() {
        let rooms = Rooms::new();
        let mut rx = rooms.subscribe(&user_room("d1"));
        rooms.publish(&user_room("d1"), ServerMessage::Pong {});
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn publish_to_empty_room_does_not_panic() {
        let rooms = Rooms::new();
        rooms.publish(&user_room("d1"), ServerMessage::Pong {});
    }

    #[test]
    fn room_keys_are_namespaced() {
        assert_eq!(user_room("d1"), "user:d1");
        assert_eq!(role_room("driver"), "role:driver");
        assert_eq!(type_room("customer"), "type:customer");
        assert_eq!(trip_room("t1"), "trip:t1");
        assert_eq!(booking_room("b1"), "booking:b1");
    }
}
