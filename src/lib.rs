// Library exports for the Snake neuroevolution engine
// Genomes, genetic operators, the simulation and fitness evaluation

pub mod board;
pub mod config;
pub mod debug_logger;
pub mod encoder;
pub mod error;
pub mod evaluator;
pub mod food;
pub mod game;
pub mod genome;
pub mod index;
pub mod operators;
pub mod profiler;
pub mod replay;
pub mod snake;
pub mod types;

pub use config::Config;
pub use error::{EvolutionError, Result};
pub use evaluator::{decode_action, FitnessEvaluator};
pub use game::{Game, GameRules, Snapshot, Status, TerminationReason};
pub use genome::{Activation, Matrix, WeightGenome};
pub use operators::{mutate, recombine, CrossoverStrategy};
pub use types::{Direction, Position, Turn};
