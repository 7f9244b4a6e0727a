// Grid primitives: positions, headings and the turn vocabulary

use serde::{Deserialize, Serialize};

/// 2D coordinate on the board, y grows upwards
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// Position `distance` cells away along `direction`
    pub fn offset(&self, direction: Direction, distance: i32) -> Position {
        let (dx, dy) = direction.to_unit_vector();
        Position {
            x: self.x + dx * distance,
            y: self.y + dy * distance,
        }
    }

    /// Component-wise difference `self - other`
    pub fn delta(&self, other: Position) -> (i32, i32) {
        (self.x - other.x, self.y - other.y)
    }
}

/// Absolute heading on the board, listed in clockwise order
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// Returns all possible directions in clockwise order
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Right, Direction::Down, Direction::Left]
    }

    /// Heading after a 90 degree clockwise turn
    pub fn turn_right(&self) -> Direction {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
        }
    }

    /// Heading after a 90 degree counter-clockwise turn
    pub fn turn_left(&self) -> Direction {
        match self {
            Direction::Up => Direction::Left,
            Direction::Right => Direction::Up,
            Direction::Down => Direction::Right,
            Direction::Left => Direction::Down,
        }
    }

    /// Unit step as (dx, dy)
    pub fn to_unit_vector(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Right => (1, 0),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
        }
    }

    /// Heading after applying `turn`
    pub fn apply(&self, turn: Turn) -> Direction {
        match turn {
            Turn::None => *self,
            Turn::Left => self.turn_left(),
            Turn::Right => self.turn_right(),
        }
    }

    /// Which turn reaches `other` from this heading in one step.
    /// Same heading and reversal both map to `Turn::None`.
    pub fn relative_turn(&self, other: Direction) -> Turn {
        if self.turn_right() == other {
            Turn::Right
        } else if self.turn_left() == other {
            Turn::Left
        } else {
            Turn::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        }
    }
}

/// The only input the environment accepts each step
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Turn {
    None,
    Left,
    Right,
}

impl Turn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Turn::None => "none",
            Turn::Left => "left",
            Turn::Right => "right",
        }
    }
}
