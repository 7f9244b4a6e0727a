// Board geometry: bounds, perimeter rings and the snake's egocentric frame

use serde::{Deserialize, Serialize};

use crate::snake::Snake;
use crate::types::{Direction, Position};

/// Fixed-size rectangular board, cells (0..width, 0..height)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Board {
    pub width: i32,
    pub height: i32,
}

impl Board {
    pub fn new(width: i32, height: i32) -> Self {
        Board { width, height }
    }

    /// Number of cells on the board
    pub fn area(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }

    /// Cell where a fresh snake spawns
    pub fn center(&self) -> Position {
        Position::new(self.width / 2, self.height / 2)
    }

    /// Checks if a position lies outside the board
    pub fn is_out_of_bounds(&self, pos: Position) -> bool {
        pos.x < 0 || pos.x >= self.width || pos.y < 0 || pos.y >= self.height
    }
}

/// Cells at Chebyshev distance `radius` from `center`, starting directly
/// ahead of `heading` and walking clockwise. A ring holds 8 * radius cells;
/// radius 0 yields the center itself.
///
/// Example for radius 1 heading left, `y` is the first cell:
/// ```text
/// x x x
/// y < x
/// x x x
/// ```
pub fn perimeter(center: Position, heading: Direction, radius: i32) -> Vec<Position> {
    if radius <= 0 {
        return vec![center];
    }

    // Start vector and the first clockwise step for each heading
    let ((sx, sy), (mut step_x, mut step_y)) = match heading {
        Direction::Up => ((0, radius), (1, 0)),
        Direction::Right => ((radius, 0), (0, -1)),
        Direction::Down => ((0, -radius), (-1, 0)),
        Direction::Left => ((-radius, 0), (0, 1)),
    };

    let ring_len = (8 * radius) as usize;
    let mut ring = Vec::with_capacity(ring_len);
    let (mut vx, mut vy) = (sx, sy);
    for _ in 0..ring_len {
        ring.push(Position::new(center.x + vx, center.y + vy));
        // Rotate the step a quarter turn clockwise at each corner
        if vx.abs() == vy.abs() {
            let rotated = (step_y, -step_x);
            step_x = rotated.0;
            step_y = rotated.1;
        }
        vx += step_x;
        vy += step_y;
    }
    debug_assert_eq!((vx, vy), (sx, sy), "ring walk must close on its start");
    ring
}

/// Rotates a board position into the snake's frame: head at the origin,
/// current heading along +y.
pub fn to_egocentric(pos: Position, snake: &Snake) -> Position {
    let (x, y) = pos.delta(snake.head());
    let (x, y) = match snake.direction() {
        Direction::Up => (x, y),
        Direction::Right => (-y, x),
        Direction::Down => (-x, -y),
        Direction::Left => (y, -x),
    };
    Position::new(x, y)
}
