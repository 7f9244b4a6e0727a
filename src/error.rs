// Error types shared by the genome, simulation and evaluation modules

use thiserror::Error;

/// Every failure the engine can report to a caller
#[derive(Debug, Error)]
pub enum EvolutionError {
    /// Forward pass received an input vector of the wrong length
    #[error("shape mismatch: expected {expected} values, got {actual}")]
    Shape { expected: usize, actual: usize },

    /// 1D/2D index mapping was given an index outside the array
    #[error("index {index} out of range for {len} elements")]
    IndexOutOfRange { index: usize, len: usize },

    /// Major-order flag other than 'R' or 'C'
    #[error("unsupported major order flag '{0}', expected 'R' or 'C'")]
    UnsupportedOrder(char),

    /// Food could not be placed within the retry budget
    #[error("board full: no free cell found for food after {attempts} attempts")]
    BoardFull { attempts: u32 },

    /// Network output decoded to an index outside {0, 1, 2}
    #[error("invalid action index {0}, expected 0, 1 or 2")]
    InvalidAction(usize),

    /// Layer list, matrix shapes or bias shapes are inconsistent
    #[error("invalid network layout: {0}")]
    InvalidLayout(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EvolutionError>;
