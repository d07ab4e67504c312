//! One connected client: routes its inbound frames to rooms

use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::game::RoomRegistry;
use crate::util::rate_limit::SessionRateLimiter;
use crate::ws::protocol::ClientEvent;

/// Event name some clients send as a keepalive
const KEEPALIVE_EVENT: &str = "ignore";

/// Just enough of a frame to name its event
#[derive(Deserialize)]
struct EventName {
    event: String,
}

/// What happened to an inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// Handed to a room
    Forwarded,
    /// Dropped: rate limited, malformed, keepalive, or the room is gone
    Dropped,
}

/// Server side of one client connection
pub struct Session {
    pub connection_id: Uuid,
    pub player_number: u8,
    /// Room this session was seated in
    pub room_id: Uuid,
    registry: RoomRegistry,
    rate_limiter: SessionRateLimiter,
}

impl Session {
    pub fn new(connection_id: Uuid, room_id: Uuid, player_number: u8, registry: RoomRegistry) -> Self {
        Self {
            connection_id,
            player_number,
            room_id,
            registry,
            rate_limiter: SessionRateLimiter::new(),
        }
    }

    #[cfg(test)]
    pub fn with_rate_limiter(mut self, rate_limiter: SessionRateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// Handle one text frame from the client
    pub fn handle_text(&self, text: &str) -> Inbound {
        if !self.rate_limiter.check_input() {
            warn!(connection_id = %self.connection_id, player_number = self.player_number, "Rate limited input message");
            return Inbound::Dropped;
        }

        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => self.dispatch(event),
            Err(e) => {
                let keepalive = serde_json::from_str::<EventName>(text)
                    .map(|n| n.event == KEEPALIVE_EVENT)
                    .unwrap_or(false);
                if keepalive {
                    debug!(connection_id = %self.connection_id, player_number = self.player_number, "Keepalive");
                } else {
                    warn!(connection_id = %self.connection_id, player_number = self.player_number, error = %e, "Failed to parse client message");
                }
                Inbound::Dropped
            }
        }
    }

    /// Route a parsed event to its room
    pub fn dispatch(&self, event: ClientEvent) -> Inbound {
        let (room_id, result) = match event {
            ClientEvent::Join => {
                let Some(room) = self.registry.find_room_by_id(self.room_id) else {
                    return self.room_gone(self.room_id);
                };
                (room.id, room.join(self.connection_id))
            }
            ClientEvent::Move(input) => {
                let Some(room) = self.registry.find_room_by_id(input.room_id) else {
                    return self.room_gone(input.room_id);
                };
                (room.id, room.move_paddle(input))
            }
        };

        match result {
            Ok(()) => Inbound::Forwarded,
            Err(e) => {
                debug!(connection_id = %self.connection_id, player_number = self.player_number, room_id = %room_id, error = %e, "Room closed");
                Inbound::Dropped
            }
        }
    }

    fn room_gone(&self, room_id: Uuid) -> Inbound {
        debug!(connection_id = %self.connection_id, player_number = self.player_number, room_id = %room_id, "Event for unknown room");
        Inbound::Dropped
    }
}
