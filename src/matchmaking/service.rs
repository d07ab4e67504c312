//! Matchmaking service - seats new connections in rooms

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::game::{RoomHandle, RoomRegistry};
use crate::ws::protocol::ServerEvent;

/// Where a connection ended up
pub struct Assignment {
    pub room: RoomHandle,
    pub player_number: u8,
    /// Subscription to the room's events, opened before the room could publish anything for this seat
    pub events: broadcast::Receiver<ServerEvent>,
}

/// Matchmaking service
#[derive(Clone)]
pub struct MatchmakingService {
    registry: RoomRegistry,
    /// Connected sessions -> their room
    connections: Arc<DashMap<Uuid, Uuid>>,
}

impl MatchmakingService {
    pub fn new(registry: RoomRegistry) -> Self {
        Self {
            registry,
            connections: Arc::new(DashMap::new()),
        }
    }

    /// Seat a new connection: second player of the most recent open room,
    /// or first player of a new one.
    pub fn connect(&self, connection_id: Uuid) -> Assignment {
        let mut rooms = self.registry.lock();

        let assignment = loop {
            let open = rooms
                .find_open_room()
                .and_then(|room| rooms.take_seat(room.id).map(|n| (room, n)));

            let Some((room, player_number)) = open else {
                let room = rooms.create_room(connection_id);
                let events = room.subscribe();
                break Assignment {
                    room,
                    player_number: 1,
                    events,
                };
            };

            let events = room.subscribe();
            match room.add_player(connection_id, player_number) {
                Ok(()) => {
                    break Assignment {
                        room,
                        player_number,
                        events,
                    }
                }
                Err(e) => {
                    // Task died without deregistering; forget it and look again
                    warn!(room_id = %room.id, error = %e, "Dropping stale room");
                    rooms.remove_room(room.id);
                }
            }
        };
        drop(rooms);

        self.connections.insert(connection_id, assignment.room.id);

        info!(
            connection_id = %connection_id,
            room_id = %assignment.room.id,
            player_number = assignment.player_number,
            "Connection assigned"
        );

        assignment
    }

    /// A connection went away. Rooms with nobody left connected are shut down.
    pub fn disconnect(&self, connection_id: Uuid) {
        let Some((_, room_id)) = self.connections.remove(&connection_id) else {
            return;
        };

        let mut rooms = self.registry.lock();
        match rooms.release_seat(room_id) {
            Some(0) => {
                if let Some(room) = rooms.remove_room(room_id) {
                    if let Err(e) = room.shutdown() {
                        debug!(room_id = %room_id, error = %e, "Room already stopped");
                    }
                }
            }
            Some(remaining) => {
                info!(
                    connection_id = %connection_id,
                    room_id = %room_id,
                    remaining,
                    "Player left, room keeps running"
                );
            }
            None => {}
        }
    }

    /// Room a connection is seated in
    #[cfg(test)]
    pub fn room_of(&self, connection_id: &Uuid) -> Option<Uuid> {
        self.connections.get(connection_id).map(|r| *r)
    }

    pub fn connected_players(&self) -> usize {
        self.connections.len()
    }

    #[cfg(test)]
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }
}
