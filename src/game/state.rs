//! Authoritative room state and the per-tick step

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::ws::protocol::Direction;

use super::physics::{step_paddle, Ball, Side, PADDLE_START_Y};

/// Most players a room can seat
pub const MAX_PLAYERS: usize = 2;

/// Score player 1 needs to win
pub const WIN_SCORE_PLAYER_ONE: u32 = 5;
/// Score player 2 needs to win. Deliberately not equal to player 1's;
/// the asymmetry is how the game has always played.
pub const WIN_SCORE_PLAYER_TWO: u32 = 10;

/// Winning score for a slot
pub fn win_score(player_number: u8) -> Option<u32> {
    match player_number {
        1 => Some(WIN_SCORE_PLAYER_ONE),
        2 => Some(WIN_SCORE_PLAYER_TWO),
        _ => None,
    }
}

/// Room lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    /// Seating players or waiting for a `join`
    Waiting,
    /// Countdown before the first tick
    Starting,
    /// Ticking
    Running,
    /// Winner decided or room abandoned. Terminal.
    Finished,
}

/// A seated player (authoritative)
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    /// Owning connection; identifies it, does not keep it alive
    pub connection_id: Uuid,
    pub player_number: u8,
    pub score: u32,
    pub x: f64,
    pub y: f64,
}

impl PlayerState {
    pub fn new(connection_id: Uuid, side: Side) -> Self {
        let player_number = match side {
            Side::Left => 1,
            Side::Right => 2,
        };
        Self {
            connection_id,
            player_number,
            score: 0,
            x: side.paddle_x(),
            y: PADDLE_START_Y,
        }
    }
}

/// Result of one simulation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Room keeps running
    Continue,
    /// Room just finished with this winner
    Won(u8),
}

/// Room state (owned by the room task)
#[derive(Debug, Clone)]
pub struct RoomState {
    pub id: Uuid,
    pub phase: RoomPhase,
    pub tick: u64,
    pub players: Vec<PlayerState>,
    pub ball: Ball,
    pub winner: Option<u8>,
}

impl RoomState {
    /// New room with `creator` in slot 1 and the ball served in a seeded random direction
    pub fn new(id: Uuid, seed: u64, creator: Uuid) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let dx = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };

        Self {
            id,
            phase: RoomPhase::Waiting,
            tick: 0,
            players: vec![PlayerState::new(creator, Side::Left)],
            ball: Ball::serve(dx),
            winner: None,
        }
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    pub fn player(&self, player_number: u8) -> Option<&PlayerState> {
        self.players.get(usize::from(player_number).checked_sub(1)?)
    }

    fn player_mut(&mut self, player_number: u8) -> Option<&mut PlayerState> {
        self.players.get_mut(usize::from(player_number).checked_sub(1)?)
    }

    /// Seat `connection_id` as `player_number`. Only the next free slot of a
    /// waiting room can be taken.
    pub fn seat_player(&mut self, connection_id: Uuid, player_number: u8) -> bool {
        if self.phase != RoomPhase::Waiting || self.is_full() {
            return false;
        }
        if usize::from(player_number) != self.players.len() + 1 {
            return false;
        }
        let Some(side) = Side::for_player(player_number) else {
            return false;
        };

        self.players.push(PlayerState::new(connection_id, side));
        true
    }

    /// WAITING -> STARTING when the room is full. False if nothing changed.
    pub fn begin_countdown(&mut self) -> bool {
        if self.phase != RoomPhase::Waiting || !self.is_full() {
            return false;
        }
        self.phase = RoomPhase::Starting;
        true
    }

    /// STARTING -> RUNNING. False if nothing changed.
    pub fn begin_play(&mut self) -> bool {
        if self.phase != RoomPhase::Starting {
            return false;
        }
        self.phase = RoomPhase::Running;
        true
    }

    /// Move a paddle one step. False for finished rooms and empty or unknown slots.
    pub fn apply_move(&mut self, player_number: u8, direction: Direction) -> bool {
        if self.phase == RoomPhase::Finished {
            return false;
        }
        match self.player_mut(player_number) {
            Some(player) => {
                player.y = step_paddle(player.y, direction);
                true
            }
            None => false,
        }
    }

    /// Mark the room terminal without a winner
    pub fn abandon(&mut self) {
        self.phase = RoomPhase::Finished;
    }

    /// Advance the simulation one tick. A no-op unless RUNNING.
    ///
    /// Order is fixed: move, left paddle, right paddle, walls, left goal,
    /// right goal, win check.
    pub fn step(&mut self) -> TickOutcome {
        if self.phase != RoomPhase::Running {
            return TickOutcome::Continue;
        }
        self.tick += 1;

        self.ball.advance();

        for player in &self.players {
            if let Some(side) = Side::for_player(player.player_number) {
                self.ball.bounce_off_paddle(side, player.y);
            }
        }

        self.ball.bounce_off_walls();

        if let Some(goal) = self.ball.goal() {
            let scorer = goal.scorer();
            if let Some(player) = self.player_mut(scorer) {
                player.score += 1;
            }
            // Serve toward the player who was scored against
            let dx = if scorer == 1 { -1.0 } else { 1.0 };
            self.ball = Ball::serve(dx);
        }

        match self.check_winner() {
            Some(winner) => {
                self.winner = Some(winner);
                self.phase = RoomPhase::Finished;
                TickOutcome::Won(winner)
            }
            None => TickOutcome::Continue,
        }
    }

    /// First player (by number) at or past their winning score
    fn check_winner(&self) -> Option<u8> {
        if self.winner.is_some() {
            return None;
        }
        self.players
            .iter()
            .find(|p| win_score(p.player_number).is_some_and(|target| p.score >= target))
            .map(|p| p.player_number)
    }

    pub fn score(&self, player_number: u8) -> u32 {
        self.player(player_number).map(|p| p.score).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::physics::{COURT_HEIGHT, COURT_WIDTH, PADDLE_MAX_Y, SERVE_X, SERVE_Y};

    fn running_room() -> RoomState {
        let mut room = RoomState::new(Uuid::new_v4(), 7, Uuid::new_v4());
        assert!(room.seat_player(Uuid::new_v4(), 2));
        assert!(room.begin_countdown());
        assert!(room.begin_play());
        room
    }

    #[test]
    fn new_room_seats_creator_left_and_serves_from_center() {
        let creator = Uuid::new_v4();
        let room = RoomState::new(Uuid::new_v4(), 1, creator);
        assert_eq!(room.phase, RoomPhase::Waiting);
        assert_eq!(room.players.len(), 1);
        assert_eq!(room.players[0].connection_id, creator);
        assert_eq!(room.players[0].player_number, 1);
        assert_eq!((room.players[0].x, room.players[0].y), (90.0, 200.0));
        assert_eq!((room.ball.x, room.ball.y, room.ball.dy), (SERVE_X, SERVE_Y, 0.0));
        assert!(room.ball.dx == 1.0 || room.ball.dx == -1.0);
        assert_eq!(room.winner, None);
    }

    #[test]
    fn serve_direction_is_deterministic_per_seed() {
        let a = RoomState::new(Uuid::nil(), 42, Uuid::nil());
        let b = RoomState::new(Uuid::nil(), 42, Uuid::nil());
        assert_eq!(a.ball, b.ball);
    }

    #[test]
    fn third_player_is_refused() {
        let mut room = RoomState::new(Uuid::new_v4(), 1, Uuid::new_v4());
        assert!(!room.seat_player(Uuid::new_v4(), 1));
        assert!(room.seat_player(Uuid::new_v4(), 2));
        assert_eq!(room.players[1].x, 690.0);
        assert!(!room.seat_player(Uuid::new_v4(), 3));
        assert_eq!(room.players.len(), 2);
    }

    #[test]
    fn countdown_needs_two_players_and_happens_once() {
        let mut room = RoomState::new(Uuid::new_v4(), 1, Uuid::new_v4());
        assert!(!room.begin_countdown());
        assert!(room.seat_player(Uuid::new_v4(), 2));
        assert!(room.begin_countdown());
        assert!(!room.begin_countdown());
        assert!(room.begin_play());
        assert!(!room.begin_play());
        assert_eq!(room.phase, RoomPhase::Running);
    }

    #[test]
    fn step_is_inert_until_running() {
        let mut room = RoomState::new(Uuid::new_v4(), 1, Uuid::new_v4());
        let before = room.ball;
        assert_eq!(room.step(), TickOutcome::Continue);
        assert_eq!(room.ball, before);
        assert_eq!(room.tick, 0);
    }

    #[test]
    fn moves_never_leave_the_court() {
        let mut room = RoomState::new(Uuid::new_v4(), 1, Uuid::new_v4());
        for _ in 0..100 {
            room.apply_move(1, Direction::Up);
            assert!((0.0..=PADDLE_MAX_Y).contains(&room.players[0].y));
        }
        assert_eq!(room.players[0].y, 0.0);
        for _ in 0..100 {
            room.apply_move(1, Direction::Down);
            assert!((0.0..=PADDLE_MAX_Y).contains(&room.players[0].y));
        }
        assert_eq!(room.players[0].y, PADDLE_MAX_Y);
    }

    #[test]
    fn moves_for_empty_or_bogus_slots_are_ignored() {
        let mut room = RoomState::new(Uuid::new_v4(), 1, Uuid::new_v4());
        assert!(!room.apply_move(2, Direction::Up));
        assert!(!room.apply_move(0, Direction::Up));
        assert!(!room.apply_move(9, Direction::Down));
        assert!(room.apply_move(1, Direction::Down));
    }

    #[test]
    fn left_paddle_returns_ball_upward() {
        let mut room = running_room();
        room.ball = Ball {
            x: 104.0,
            y: 220.0,
            dx: -1.0,
            dy: 0.0,
        };
        assert_eq!(room.step(), TickOutcome::Continue);
        assert_eq!(room.ball.dx, 1.0);
        assert_eq!(room.ball.dy, -1.0);
        assert_eq!(room.ball.x, 99.0);
    }

    #[test]
    fn left_goal_scores_for_player_two_and_reserves() {
        let mut room = running_room();
        room.players[0].y = 0.0;
        room.ball = Ball {
            x: 8.0,
            y: 300.0,
            dx: -1.0,
            dy: 0.0,
        };
        room.step();
        assert_eq!(room.score(2), 1);
        assert_eq!(room.score(1), 0);
        assert_eq!(room.ball, Ball::serve(1.0));
    }

    #[test]
    fn right_goal_scores_for_player_one_and_reserves() {
        let mut room = running_room();
        room.players[1].y = 0.0;
        room.ball = Ball {
            x: 793.0,
            y: 300.0,
            dx: 1.0,
            dy: 1.0,
        };
        room.step();
        assert_eq!(room.score(1), 1);
        assert_eq!(room.ball, Ball::serve(-1.0));
    }

    #[test]
    fn player_one_wins_at_five() {
        let mut room = running_room();
        room.players[0].score = 4;
        room.players[1].y = 0.0;
        room.ball = Ball {
            x: 794.0,
            y: 300.0,
            dx: 1.0,
            dy: 0.0,
        };
        assert_eq!(room.step(), TickOutcome::Won(1));
        assert_eq!(room.winner, Some(1));
        assert_eq!(room.phase, RoomPhase::Finished);

        // Terminal: further steps change nothing
        let ball = room.ball;
        assert_eq!(room.step(), TickOutcome::Continue);
        assert_eq!(room.ball, ball);
        assert_eq!(room.winner, Some(1));
        assert!(!room.apply_move(1, Direction::Up));
    }

    #[test]
    fn player_two_needs_ten() {
        let mut room = running_room();
        room.players[0].y = 0.0;
        room.players[1].score = 5;
        room.ball = Ball {
            x: 6.0,
            y: 300.0,
            dx: -1.0,
            dy: 0.0,
        };
        assert_eq!(room.step(), TickOutcome::Continue);
        assert_eq!(room.score(2), 6);

        room.players[1].score = 9;
        room.ball = Ball {
            x: 6.0,
            y: 300.0,
            dx: -1.0,
            dy: 0.0,
        };
        assert_eq!(room.step(), TickOutcome::Won(2));
        assert_eq!(room.winner, Some(2));
    }

    #[test]
    fn ball_stays_on_court_and_scores_only_grow() {
        let mut room = running_room();
        let mut last = (0, 0);
        for _ in 0..20_000 {
            if let TickOutcome::Won(_) = room.step() {
                break;
            }
            assert!((0.0..=COURT_WIDTH).contains(&room.ball.x));
            assert!((0.0..=COURT_HEIGHT).contains(&room.ball.y));
            let scores = (room.score(1), room.score(2));
            assert!(scores.0 >= last.0 && scores.1 >= last.1);
            assert!(scores.0 + scores.1 <= last.0 + last.1 + 1);
            last = scores;
        }
    }
}
