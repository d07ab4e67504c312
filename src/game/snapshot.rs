//! Snapshot building for network transmission
//!
//! Tick, move and lifecycle broadcasts all go through [`build`] so every
//! event carries the same serialization of the room.

use crate::ws::protocol::{PlayerSnapshot, RoomSnapshot, ServerEvent};

use super::state::RoomState;

/// Full snapshot of a room
pub fn build(state: &RoomState) -> RoomSnapshot {
    let players = state
        .players
        .iter()
        .map(|p| PlayerSnapshot {
            ws_id: p.connection_id,
            player_number: p.player_number,
            score: p.score,
            x: p.x,
            y: p.y,
        })
        .collect();

    RoomSnapshot {
        id: state.id,
        players,
        ball: state.ball.snapshot(),
        winner: state.winner,
    }
}

pub fn started_game(state: &RoomState) -> ServerEvent {
    ServerEvent::StartedGame(build(state))
}

pub fn update_game(state: &RoomState) -> ServerEvent {
    ServerEvent::UpdateGame(build(state))
}

pub fn end_game(state: &RoomState) -> ServerEvent {
    ServerEvent::EndGame(build(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn snapshot_mirrors_room_in_slot_order() {
        let creator = Uuid::new_v4();
        let second = Uuid::new_v4();
        let mut state = RoomState::new(Uuid::new_v4(), 3, creator);
        assert!(state.seat_player(second, 2));
        state.players[1].score = 4;

        let snapshot = build(&state);
        assert_eq!(snapshot.id, state.id);
        assert_eq!(snapshot.players.len(), 2);
        assert_eq!(snapshot.players[0].ws_id, creator);
        assert_eq!(snapshot.players[0].player_number, 1);
        assert_eq!(snapshot.players[1].ws_id, second);
        assert_eq!(snapshot.players[1].score, 4);
        assert_eq!(snapshot.players[1].x, 690.0);
        assert_eq!(snapshot.ball.x, 395.0);
        assert_eq!(snapshot.winner, None);
    }

    #[test]
    fn event_wrappers_share_the_snapshot() {
        let state = RoomState::new(Uuid::new_v4(), 3, Uuid::new_v4());
        let expected = build(&state);
        assert_eq!(started_game(&state).snapshot(), Some(&expected));
        assert_eq!(update_game(&state).snapshot(), Some(&expected));
        assert_eq!(end_game(&state).snapshot(), Some(&expected));
    }
}
