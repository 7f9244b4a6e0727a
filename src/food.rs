// Single piece of food placed by bounded rejection sampling

use log::warn;
use rand::Rng;

use crate::board::Board;
use crate::error::{EvolutionError, Result};
use crate::snake::Snake;
use crate::types::Position;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Food {
    pos: Option<Position>,
}

impl Food {
    pub fn new() -> Self {
        Food { pos: None }
    }

    pub fn position(&self) -> Option<Position> {
        self.pos
    }

    pub fn place_at(&mut self, pos: Position) {
        self.pos = Some(pos);
    }

    /// Places the food on a random cell not covered by `snake`.
    ///
    /// Draws uniformly over the whole board and retries up to `max_attempts`
    /// times. On failure the food is removed and `BoardFull` is returned.
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        board: &Board,
        snake: &Snake,
        max_attempts: u32,
        rng: &mut R,
    ) -> Result<Position> {
        if board.width > 0 && board.height > 0 {
            for _ in 0..max_attempts {
                let candidate = Position::new(
                    rng.random_range(0..board.width),
                    rng.random_range(0..board.height),
                );
                if !snake.contains(candidate) {
                    self.pos = Some(candidate);
                    return Ok(candidate);
                }
            }
        }

        warn!(
            "Food spawn gave up after {} attempts (snake size {})",
            max_attempts,
            snake.size()
        );
        self.pos = None;
        Err(EvolutionError::BoardFull {
            attempts: max_attempts,
        })
    }
}
