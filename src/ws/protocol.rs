//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Paddle movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Payload of a `move` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveInput {
    pub direction: Direction,
    /// Room the paddle lives in
    pub room_id: Uuid,
    /// Slot being moved (1 or 2)
    pub player_number: u8,
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Player is ready; starts the countdown once the room is full
    Join,

    /// Nudge a paddle up or down
    Move(MoveInput),
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Slot assigned to this connection
    PlayerNumber(u8),

    /// Second player arrived
    AllReady,

    /// Countdown started
    StartingGame,

    /// Countdown finished, ticking begins
    StartedGame(RoomSnapshot),

    /// Per-tick or post-move state
    UpdateGame(RoomSnapshot),

    /// Final state, `winner` set
    EndGame(RoomSnapshot),
}

impl ServerEvent {
    /// Snapshot carried by the event, if any
    #[cfg(test)]
    pub fn snapshot(&self) -> Option<&RoomSnapshot> {
        match self {
            Self::StartedGame(s) | Self::UpdateGame(s) | Self::EndGame(s) => Some(s),
            _ => None,
        }
    }
}

/// Full room state as broadcast to both sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub id: Uuid,
    pub players: Vec<PlayerSnapshot>,
    pub ball: BallSnapshot,
    /// Player number of the winner, `null` while the match is live
    pub winner: Option<u8>,
}

/// Player state in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    /// Connection that owns this slot
    pub ws_id: Uuid,
    pub player_number: u8,
    pub score: u32,
    /// Paddle left edge
    pub x: f64,
    /// Paddle top edge
    pub y: f64,
}

/// Ball state in a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub x: f64,
    pub y: f64,
    /// Horizontal direction multiplier (-1 or 1)
    pub dx: f64,
    /// Vertical direction multiplier (-1, 0 or 1)
    pub dy: f64,
}
