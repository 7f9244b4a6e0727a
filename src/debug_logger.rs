// Debug logging module for per-step episode logs
//
// Every step of an evaluated episode is written as one JSONL line carrying
// the episode seed, so the replay engine can re-run it exactly. Writes are
// serialized through a mutex; parallel evaluations may interleave lines but
// never split one.

use log::{error, info};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::game::{Game, Snapshot};
use crate::types::Turn;

/// Identifies one episode inside a log file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct EpisodeTag {
    /// Seed of the episode's private generator
    pub seed: u64,
    /// Index of the episode within its evaluation
    pub episode: usize,
}

/// Represents a single debug log entry
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EpisodeLogEntry {
    pub seed: u64,
    pub episode: usize,
    pub step: u64,
    pub turn: Turn,
    /// State after the step was applied
    pub snapshot: Snapshot,
    pub timestamp: String,
}

impl EpisodeLogEntry {
    pub fn tag(&self) -> EpisodeTag {
        EpisodeTag {
            seed: self.seed,
            episode: self.episode,
        }
    }
}

/// Shared debug logger state
#[derive(Clone)]
pub struct DebugLogger {
    file: Arc<Mutex<Option<File>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub fn new<P: AsRef<Path>>(enabled: bool, log_file_path: P) -> Self {
        if !enabled {
            return Self::disabled();
        }

        let path = log_file_path.as_ref();
        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
        {
            Ok(file) => {
                info!("Debug logging enabled: {}", path.display());
                DebugLogger {
                    file: Arc::new(Mutex::new(Some(file))),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create debug log file '{}': {}", path.display(), e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger {
            file: Arc::new(Mutex::new(None)),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Logs the state reached by applying `turn` in the tagged episode
    pub fn log_step(&self, tag: EpisodeTag, turn: Turn, game: &Game) {
        if !self.enabled {
            return;
        }

        let entry = EpisodeLogEntry {
            seed: tag.seed,
            episode: tag.episode,
            step: game.steps(),
            turn,
            snapshot: game.snapshot(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let json_line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize debug log entry: {}", e);
                return;
            }
        };

        let mut file_guard = self.file.lock();
        if let Some(file) = file_guard.as_mut() {
            if let Err(e) = writeln!(file, "{}", json_line) {
                error!("Failed to write debug log entry: {}", e);
            } else if let Err(e) = file.flush() {
                error!("Failed to flush debug log: {}", e);
            }
        }
    }
}
