//! Process-wide table of live rooms
//!
//! Every lookup and mutation goes through one lock so that "find an open
//! room, then take its seat" is a single atomic step for the matchmaker.

use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::room::{GameRoom, RoomHandle};
use super::state::MAX_PLAYERS;

#[derive(Debug)]
struct RoomEntry {
    handle: RoomHandle,
    /// Seats ever taken. Never decreases, so a room is not refilled.
    seats: usize,
    /// Seated sessions still connected
    connected: usize,
}

/// Registry of all active rooms, in creation order
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<Mutex<Vec<RoomEntry>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the registry lock. Everything done through the returned table is atomic.
    pub fn lock(&self) -> RoomTable<'_> {
        RoomTable {
            registry: self,
            rooms: self.rooms.lock(),
        }
    }

    pub fn find_room_by_id(&self, id: Uuid) -> Option<RoomHandle> {
        self.lock().find_room_by_id(id)
    }

    pub fn remove_room(&self, id: Uuid) -> Option<RoomHandle> {
        self.lock().remove_room(id)
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.lock().len()
    }

    pub fn open_rooms(&self) -> usize {
        self.rooms
            .lock()
            .iter()
            .filter(|e| e.seats < MAX_PLAYERS)
            .count()
    }
}

/// Locked view of the registry
pub struct RoomTable<'a> {
    registry: &'a RoomRegistry,
    rooms: MutexGuard<'a, Vec<RoomEntry>>,
}

impl RoomTable<'_> {
    /// Most recently created room with a free seat
    pub fn find_open_room(&self) -> Option<RoomHandle> {
        self.rooms
            .iter()
            .rev()
            .find(|e| e.seats < MAX_PLAYERS)
            .map(|e| e.handle.clone())
    }

    pub fn find_room_by_id(&self, id: Uuid) -> Option<RoomHandle> {
        self.entry(id).map(|e| e.handle.clone())
    }

    /// Spawn a new room with `creator` seated as player 1
    pub fn create_room(&mut self, creator: Uuid) -> RoomHandle {
        let id = Uuid::new_v4();
        let seed = rand::random::<u64>();

        let (room, handle) = GameRoom::new(id, seed, creator, self.registry.clone());
        self.insert_room(handle.clone(), 1);
        tokio::spawn(room.run());

        info!(room_id = %id, connection_id = %creator, "Created new room");
        handle
    }

    /// Track an already running room with `seats` taken
    pub fn insert_room(&mut self, handle: RoomHandle, seats: usize) {
        self.rooms.push(RoomEntry {
            handle,
            seats,
            connected: seats,
        });
    }

    /// Reserve the next seat. Returns the player number, or `None` if the
    /// room is full or gone.
    pub fn take_seat(&mut self, id: Uuid) -> Option<u8> {
        let entry = self.entry_mut(id)?;
        if entry.seats >= MAX_PLAYERS {
            return None;
        }
        entry.seats += 1;
        entry.connected += 1;
        u8::try_from(entry.seats).ok()
    }

    /// A seated session disconnected. Returns how many remain connected.
    pub fn release_seat(&mut self, id: Uuid) -> Option<usize> {
        let entry = self.entry_mut(id)?;
        entry.connected = entry.connected.saturating_sub(1);
        Some(entry.connected)
    }

    /// Drop a room. No-op if absent.
    pub fn remove_room(&mut self, id: Uuid) -> Option<RoomHandle> {
        let pos = self.rooms.iter().position(|e| e.handle.id == id)?;
        Some(self.rooms.remove(pos).handle)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    fn entry(&self, id: Uuid) -> Option<&RoomEntry> {
        self.rooms.iter().find(|e| e.handle.id == id)
    }

    fn entry_mut(&mut self, id: Uuid) -> Option<&mut RoomEntry> {
        self.rooms.iter_mut().find(|e| e.handle.id == id)
    }
}
