//! Court geometry, ball movement and collision rules
//!
//! Coordinates are court units with the origin at the top-left corner.
//! Paddle positions are their top-left corner; the ball position is its
//! top-left corner as well, so the serve point sits half a ball off center.

use crate::ws::protocol::{BallSnapshot, Direction};

pub const COURT_WIDTH: f64 = 800.0;
pub const COURT_HEIGHT: f64 = 500.0;

pub const PADDLE_WIDTH: f64 = 20.0;
pub const PADDLE_HEIGHT: f64 = 60.0;
/// Lowest allowed paddle top edge
pub const PADDLE_MAX_Y: f64 = COURT_HEIGHT - PADDLE_HEIGHT;
/// Paddle travel per `move` event
pub const PADDLE_STEP: f64 = 10.0;
pub const PADDLE_START_Y: f64 = 200.0;
pub const LEFT_PADDLE_X: f64 = 90.0;
/// Mirror of the left paddle
pub const RIGHT_PADDLE_X: f64 = COURT_WIDTH - LEFT_PADDLE_X - PADDLE_WIDTH;

pub const BALL_RADIUS: f64 = 10.0;
/// Court units travelled per tick per unit of direction
pub const BALL_SPEED: f64 = 5.0;
pub const SERVE_X: f64 = COURT_WIDTH / 2.0 - BALL_RADIUS / 2.0;
pub const SERVE_Y: f64 = COURT_HEIGHT / 2.0 - BALL_RADIUS / 2.0;

/// Ball x below which player 1's paddle can return it
pub const LEFT_HIT_X: f64 = 110.0;
/// Ball x above which player 2's paddle can return it
pub const RIGHT_HIT_X: f64 = 690.0;
pub const TOP_WALL_Y: f64 = 5.0;
pub const BOTTOM_WALL_Y: f64 = 490.0;
pub const LEFT_GOAL_X: f64 = 5.0;
pub const RIGHT_GOAL_X: f64 = 795.0;

/// Which paddle a check runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Player 1
    Left,
    /// Player 2
    Right,
}

impl Side {
    pub fn for_player(player_number: u8) -> Option<Self> {
        match player_number {
            1 => Some(Self::Left),
            2 => Some(Self::Right),
            _ => None,
        }
    }

    /// Fixed paddle x for this side
    pub fn paddle_x(self) -> f64 {
        match self {
            Self::Left => LEFT_PADDLE_X,
            Self::Right => RIGHT_PADDLE_X,
        }
    }

    /// Horizontal direction of a ball returned by this side
    fn return_dx(self) -> f64 {
        match self {
            Self::Left => 1.0,
            Self::Right => -1.0,
        }
    }
}

/// Goal line the ball crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    /// Ball left through player 1's side; player 2 scores
    Left,
    /// Ball left through player 2's side; player 1 scores
    Right,
}

impl Goal {
    /// Player credited with the point
    pub fn scorer(self) -> u8 {
        match self {
            Self::Left => 2,
            Self::Right => 1,
        }
    }
}

/// Authoritative ball state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Ball {
    /// Ball at the serve point heading flat in `dx`
    pub fn serve(dx: f64) -> Self {
        Self {
            x: SERVE_X,
            y: SERVE_Y,
            dx,
            dy: 0.0,
        }
    }

    pub fn advance(&mut self) {
        self.x += self.dx * BALL_SPEED;
        self.y += self.dy * BALL_SPEED;
    }

    /// Whether the ball is inside `side`'s hit zone and strictly within the paddle span
    pub fn touches_paddle(&self, side: Side, paddle_y: f64) -> bool {
        let in_zone = match side {
            Side::Left => self.x < LEFT_HIT_X,
            Side::Right => self.x > RIGHT_HIT_X,
        };
        in_zone && self.y > paddle_y && self.y < paddle_y + PADDLE_HEIGHT
    }

    /// Reflect off `side`'s paddle if touching it. Returns true on a hit.
    pub fn bounce_off_paddle(&mut self, side: Side, paddle_y: f64) -> bool {
        if !self.touches_paddle(side, paddle_y) {
            return false;
        }

        self.dx = side.return_dx();
        self.dy = deflection(self.y, paddle_y);
        true
    }

    /// Invert vertical direction near the top or bottom wall
    pub fn bounce_off_walls(&mut self) {
        if self.y < TOP_WALL_Y || self.y > BOTTOM_WALL_Y {
            self.dy = -self.dy;
        }
    }

    /// Goal line crossed this tick, if any
    pub fn goal(&self) -> Option<Goal> {
        if self.x < LEFT_GOAL_X {
            Some(Goal::Left)
        } else if self.x > RIGHT_GOAL_X {
            Some(Goal::Right)
        } else {
            None
        }
    }

    pub fn snapshot(&self) -> BallSnapshot {
        BallSnapshot {
            x: self.x,
            y: self.y,
            dx: self.dx,
            dy: self.dy,
        }
    }
}

/// Vertical direction after a paddle hit, split at the paddle midpoint
pub fn deflection(ball_y: f64, paddle_y: f64) -> f64 {
    let mid = paddle_y + PADDLE_HEIGHT / 2.0;
    if ball_y < mid {
        -1.0
    } else if ball_y > mid {
        1.0
    } else {
        0.0
    }
}

/// Paddle top edge after one step in `direction`, kept on court
pub fn step_paddle(y: f64, direction: Direction) -> f64 {
    let moved = match direction {
        Direction::Up => y - PADDLE_STEP,
        Direction::Down => y + PADDLE_STEP,
    };
    moved.clamp(0.0, PADDLE_MAX_Y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paddle_step_is_clamped_to_court() {
        assert_eq!(step_paddle(5.0, Direction::Up), 0.0);
        assert_eq!(step_paddle(435.0, Direction::Down), PADDLE_MAX_Y);
        assert_eq!(step_paddle(200.0, Direction::Down), 210.0);
        assert_eq!(PADDLE_MAX_Y, 440.0);
    }

    #[test]
    fn right_paddle_sits_110_from_right_wall() {
        assert_eq!(Side::Right.paddle_x(), 690.0);
        assert_eq!((SERVE_X, SERVE_Y), (395.0, 245.0));
        assert_eq!(Side::Left.paddle_x(), 90.0);
    }

    #[test]
    fn upper_half_hit_sends_ball_up() {
        let mut ball = Ball {
            x: 104.0,
            y: 220.0,
            dx: -1.0,
            dy: 0.0,
        };
        ball.advance();
        assert!(ball.bounce_off_paddle(Side::Left, 200.0));
        assert_eq!(ball.dx, 1.0);
        assert_eq!(ball.dy, -1.0);
    }

    #[test]
    fn deflection_splits_at_midpoint() {
        assert_eq!(deflection(229.0, 200.0), -1.0);
        assert_eq!(deflection(230.0, 200.0), 0.0);
        assert_eq!(deflection(231.0, 200.0), 1.0);
    }

    #[test]
    fn paddle_edges_do_not_count_as_hits() {
        let ball = Ball {
            x: 100.0,
            y: 200.0,
            dx: -1.0,
            dy: 0.0,
        };
        assert!(!ball.touches_paddle(Side::Left, 200.0));
        assert!(!ball.touches_paddle(Side::Left, 140.0));
        assert!(ball.touches_paddle(Side::Left, 150.0));
    }

    #[test]
    fn right_paddle_returns_ball_left() {
        let mut ball = Ball {
            x: 700.0,
            y: 250.0,
            dx: 1.0,
            dy: 1.0,
        };
        assert!(ball.bounce_off_paddle(Side::Right, 200.0));
        assert_eq!(ball.dx, -1.0);
        assert_eq!(ball.dy, 1.0);
    }

    #[test]
    fn ball_outside_hit_zone_passes_paddle() {
        let mut ball = Ball::serve(-1.0);
        assert!(!ball.bounce_off_paddle(Side::Left, 200.0));
        assert_eq!(ball.dx, -1.0);
    }

    #[test]
    fn walls_invert_vertical_direction() {
        let mut ball = Ball {
            x: 300.0,
            y: 4.0,
            dx: 1.0,
            dy: -1.0,
        };
        ball.bounce_off_walls();
        assert_eq!(ball.dy, 1.0);

        ball.y = 491.0;
        ball.bounce_off_walls();
        assert_eq!(ball.dy, -1.0);
    }

    #[test]
    fn goal_lines() {
        let mut ball = Ball::serve(1.0);
        assert_eq!(ball.goal(), None);
        ball.x = 4.0;
        assert_eq!(ball.goal(), Some(Goal::Left));
        assert_eq!(Goal::Left.scorer(), 2);
        ball.x = 796.0;
        assert_eq!(ball.goal(), Some(Goal::Right));
        assert_eq!(Goal::Right.scorer(), 1);
    }
}
