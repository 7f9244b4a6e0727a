// Episode environment: snake, food, hunger and the step transition
//
// A Game owns all state of one episode. It never touches a renderer; callers
// poll `snapshot()` and `collision_at()` after each step instead.

use log::trace;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::Result;
use crate::food::Food;
use crate::snake::Snake;
use crate::types::{Direction, Position, Turn};

/// Why an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum TerminationReason {
    SelfCollision,
    BorderCollision,
    Starved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Status {
    Running,
    Terminated(TerminationReason),
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Terminated(_))
    }
}

/// Static rules of an episode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameRules {
    pub board: Board,
    /// Steps a snake survives without eating
    pub max_hunger: u32,
    /// Retry budget for food placement
    pub food_spawn_attempts: u32,
    /// Weight of the speed bonus, 0 scores pure food count
    pub speed_bonus_alpha: f64,
}

impl GameRules {
    pub fn new(board: Board, max_hunger: u32) -> Self {
        GameRules {
            board,
            max_hunger,
            food_spawn_attempts: 1000,
            speed_bonus_alpha: 0.0,
        }
    }
}

/// Read-only view of the episode for renderers and logs
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Snapshot {
    /// Tail-first, head-last
    pub body: Vec<Position>,
    pub heading: Direction,
    pub food: Option<Position>,
    pub score: f64,
    pub apples: u32,
    pub hunger: u32,
    pub steps: u64,
    pub status: Status,
}

#[derive(Debug, Clone)]
pub struct Game {
    rules: GameRules,
    snake: Snake,
    food: Food,
    hunger: u32,
    score: f64,
    apples: u32,
    steps: u64,
    status: Status,
}

impl Game {
    /// Creates a running episode with the snake centered and food spawned
    pub fn new<R: Rng + ?Sized>(rules: GameRules, rng: &mut R) -> Result<Self> {
        let mut game = Game {
            rules,
            snake: Snake::new(rules.board.center()),
            food: Food::new(),
            hunger: rules.max_hunger,
            score: 0.0,
            apples: 0,
            steps: 0,
            status: Status::Running,
        };
        game.food
            .spawn(&rules.board, &game.snake, rules.food_spawn_attempts, rng)?;
        Ok(game)
    }

    /// Starts a fresh episode on the same rules
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        self.snake.reset();
        self.hunger = self.rules.max_hunger;
        self.score = 0.0;
        self.apples = 0;
        self.steps = 0;
        self.status = Status::Running;
        self.food.spawn(
            &self.rules.board,
            &self.snake,
            self.rules.food_spawn_attempts,
            rng,
        )?;
        Ok(())
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn board(&self) -> &Board {
        &self.rules.board
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn food(&self) -> Option<Position> {
        self.food.position()
    }

    /// Moves the food to a fixed cell, used to set up scenarios
    pub fn set_food(&mut self, pos: Position) {
        self.food.place_at(pos);
    }

    pub fn hunger(&self) -> u32 {
        self.hunger
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// Food items eaten this episode
    pub fn apples(&self) -> u32 {
        self.apples
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// True if `pos` hits the snake's body (head excluded) or lies off the board
    pub fn collision_at(&self, pos: Position) -> bool {
        self.rules.board.is_out_of_bounds(pos) || self.snake.tail_segments().any(|&p| p == pos)
    }

    /// Advances the episode by one step.
    ///
    /// Stepping a terminated episode is a no-op that returns the final status.
    /// `BoardFull` from food respawn is returned as an error; the snake has
    /// already grown at that point.
    pub fn step<R: Rng + ?Sized>(&mut self, turn: Turn, rng: &mut R) -> Result<Status> {
        if self.status.is_terminal() {
            return Ok(self.status);
        }

        self.steps += 1;
        self.snake.turn(turn);
        let next = self.snake.next_ahead();

        if self.food.position() == Some(next) {
            let hunger_at_catch = self.hunger;
            self.snake.grow(next);
            self.apples += 1;
            self.score += 1.0;
            if self.rules.speed_bonus_alpha != 0.0 && hunger_at_catch > 0 {
                self.score += self.rules.speed_bonus_alpha / f64::from(hunger_at_catch);
            }
            self.hunger = self.rules.max_hunger;
            trace!("Step {}: ate food at {:?}, score {}", self.steps, next, self.score);
            self.food.spawn(
                &self.rules.board,
                &self.snake,
                self.rules.food_spawn_attempts,
                rng,
            )?;
        } else {
            self.snake.move_to(next);
            self.hunger = self.hunger.saturating_sub(1);
        }

        self.status = if self.snake.head_overlaps_body() {
            Status::Terminated(TerminationReason::SelfCollision)
        } else if self.rules.board.is_out_of_bounds(next) {
            Status::Terminated(TerminationReason::BorderCollision)
        } else if self.hunger == 0 {
            Status::Terminated(TerminationReason::Starved)
        } else {
            Status::Running
        };

        if let Status::Terminated(reason) = self.status {
            trace!("Episode ended after {} steps: {:?}", self.steps, reason);
        }
        Ok(self.status)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            body: self.snake.body().copied().collect(),
            heading: self.snake.direction(),
            food: self.food.position(),
            score: self.score,
            apples: self.apples,
            hunger: self.hunger,
            steps: self.steps,
            status: self.status,
        }
    }
}
