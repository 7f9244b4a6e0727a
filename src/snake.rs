// Snake body and heading

use std::collections::VecDeque;

use crate::types::{Direction, Position, Turn};

/// Snake body stored tail-first, head-last, plus the current heading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    body: VecDeque<Position>,
    direction: Direction,
    start: Position,
}

impl Snake {
    /// Creates a single-segment snake at `start` facing up
    pub fn new(start: Position) -> Self {
        let mut body = VecDeque::new();
        body.push_back(start);
        Snake {
            body,
            direction: Direction::Up,
            start,
        }
    }

    /// Returns to the initial single-segment state
    pub fn reset(&mut self) {
        self.body.clear();
        self.body.push_back(self.start);
        self.direction = Direction::Up;
    }

    pub fn head(&self) -> Position {
        // The body is never empty: new/reset push a segment, move pushes before it pops
        self.body[self.body.len() - 1]
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of segments including the head
    pub fn size(&self) -> usize {
        self.body.len()
    }

    /// Segments tail-first, head-last
    pub fn body(&self) -> impl Iterator<Item = &Position> + '_ {
        self.body.iter()
    }

    /// Segments excluding the head
    pub fn tail_segments(&self) -> impl Iterator<Item = &Position> + '_ {
        self.body.iter().take(self.body.len() - 1)
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.body.iter().any(|&p| p == pos)
    }

    pub fn turn(&mut self, turn: Turn) {
        self.direction = self.direction.apply(turn);
    }

    /// Cell the head enters when going straight
    pub fn next_ahead(&self) -> Position {
        self.head().offset(self.direction, 1)
    }

    pub fn next_left(&self) -> Position {
        self.head().offset(self.direction.turn_left(), 1)
    }

    pub fn next_right(&self) -> Position {
        self.head().offset(self.direction.turn_right(), 1)
    }

    /// Slides onto `pos`: the tail is dropped, `pos` becomes the head
    pub fn move_to(&mut self, pos: Position) {
        self.body.push_back(pos);
        self.body.pop_front();
    }

    /// Extends onto `pos`, keeping the tail
    pub fn grow(&mut self, pos: Position) {
        self.body.push_back(pos);
    }

    /// Head hits a segment other than itself
    pub fn head_overlaps_body(&self) -> bool {
        let head = self.head();
        self.tail_segments().any(|&p| p == head)
    }
}
