// Replay module for verifying logged episodes
//
// This module provides functionality to:
// 1. Parse JSONL episode logs written by the debug logger
// 2. Re-run each logged episode from its seed with the same genome
// 3. Compare logged vs replayed turns and states step by step
// 4. Generate match statistics and a report

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::config::Config;
use crate::debug_logger::{EpisodeLogEntry, EpisodeTag};
use crate::encoder::StateEncoder;
use crate::error::{EvolutionError, Result};
use crate::evaluator::FitnessEvaluator;
use crate::game::{Game, GameRules, Snapshot};
use crate::genome::WeightGenome;
use crate::types::Turn;

/// Result of replaying a single step
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub tag: EpisodeTag,
    pub step: u64,
    pub original_turn: Turn,
    pub replayed_turn: Turn,
    pub turn_matches: bool,
    pub state_matches: bool,
}

impl ReplayResult {
    pub fn matches(&self) -> bool {
        self.turn_matches && self.state_matches
    }
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub total_steps: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub match_rate: f64,
}

/// Scores are compared with a tolerance; everything else must be equal
fn snapshots_match(a: &Snapshot, b: &Snapshot) -> bool {
    a.body == b.body
        && a.heading == b.heading
        && a.food == b.food
        && a.apples == b.apples
        && a.hunger == b.hunger
        && a.steps == b.steps
        && a.status == b.status
        && (a.score - b.score).abs() < 1e-9
}

/// Replay engine for verifying episode logs
pub struct ReplayEngine {
    evaluator: FitnessEvaluator,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a replay engine for episodes played under `rules` with `encoder`
    pub fn new(rules: GameRules, encoder: StateEncoder, verbose: bool) -> Self {
        ReplayEngine {
            evaluator: FitnessEvaluator::new(rules, encoder, 1),
            verbose,
        }
    }

    pub fn from_config(config: &Config, verbose: bool) -> Self {
        Self::new(config.game_rules(), config.encoder(), verbose)
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<EpisodeLogEntry>> {
        let file = File::open(log_path.as_ref())?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: EpisodeLogEntry = serde_json::from_str(&line).map_err(|e| {
                warn!("Failed to parse JSON on line {}: {}", line_num + 1, e);
                EvolutionError::from(e)
            })?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Splits entries into episodes, in order of first appearance, each sorted by step
    pub fn group_episodes(entries: &[EpisodeLogEntry]) -> Vec<Vec<EpisodeLogEntry>> {
        let mut episodes: Vec<Vec<EpisodeLogEntry>> = Vec::new();
        for entry in entries {
            match episodes.iter_mut().find(|ep| ep[0].tag() == entry.tag()) {
                Some(episode) => episode.push(entry.clone()),
                None => episodes.push(vec![entry.clone()]),
            }
        }
        for episode in episodes.iter_mut() {
            episode.sort_by_key(|e| e.step);
        }
        episodes
    }

    /// Re-runs one logged episode from its seed and compares every step.
    ///
    /// `entries` must all belong to the same episode. Replay stops early if the
    /// replayed game terminates before the log does.
    pub fn replay_episode(
        &self,
        genome: &WeightGenome,
        entries: &[EpisodeLogEntry],
    ) -> Result<Vec<ReplayResult>> {
        let first = match entries.first() {
            Some(first) => first,
            None => return Ok(Vec::new()),
        };
        let tag = first.tag();
        if entries.iter().any(|e| e.tag() != tag) {
            return Err(EvolutionError::InvalidLayout(format!(
                "entries mix several episodes, expected only seed {} episode {}",
                tag.seed, tag.episode
            )));
        }
        self.evaluator.check_genome(genome)?;

        let mut rng = StdRng::seed_from_u64(tag.seed);
        let mut game = Game::new(*self.evaluator.rules(), &mut rng)?;
        let mut results = Vec::with_capacity(entries.len());

        for entry in entries {
            if game.status().is_terminal() {
                warn!(
                    "Episode {} (seed {}) ended before logged step {}",
                    tag.episode, tag.seed, entry.step
                );
                break;
            }

            let replayed_turn = self.evaluator.choose_turn(genome, &game)?;
            let board_full = match game.step(replayed_turn, &mut rng) {
                Ok(_) => false,
                Err(EvolutionError::BoardFull { .. }) => true,
                Err(e) => return Err(e),
            };

            let result = ReplayResult {
                tag,
                step: entry.step,
                original_turn: entry.turn,
                replayed_turn,
                turn_matches: entry.turn == replayed_turn,
                state_matches: snapshots_match(&entry.snapshot, &game.snapshot()),
            };

            if self.verbose {
                if result.matches() {
                    info!(
                        "Step {}: ✓ MATCH - {} (score: {})",
                        entry.step,
                        replayed_turn.as_str(),
                        game.score()
                    );
                } else {
                    warn!(
                        "Step {}: ✗ MISMATCH - Original: {}, Replayed: {} (state matches: {})",
                        entry.step,
                        entry.turn.as_str(),
                        replayed_turn.as_str(),
                        result.state_matches
                    );
                }
            }

            results.push(result);
            if board_full {
                break;
            }
        }

        Ok(results)
    }

    /// Replays every episode found in `entries`
    pub fn replay_all(
        &self,
        genome: &WeightGenome,
        entries: &[EpisodeLogEntry],
    ) -> Result<Vec<ReplayResult>> {
        let mut results = Vec::new();

        for episode in Self::group_episodes(entries) {
            match self.replay_episode(genome, &episode) {
                Ok(mut r) => results.append(&mut r),
                Err(e) => {
                    warn!(
                        "Failed to replay episode {} (seed {}): {}",
                        episode[0].episode, episode[0].seed, e
                    );
                }
            }
        }

        Ok(results)
    }

    /// Generates statistics from replay results
    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let total_steps = results.len();
        let matches = results.iter().filter(|r| r.matches()).count();
        let mismatches = total_steps - matches;
        let match_rate = if total_steps > 0 {
            (matches as f64 / total_steps as f64) * 100.0
        } else {
            0.0
        };

        ReplayStats {
            total_steps,
            matches,
            mismatches,
            match_rate,
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Total Steps:    {}", stats.total_steps);
        println!("Matches:        {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:     {}", stats.mismatches);
        println!("═══════════════════════════════════════════════════════════\n");

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches()).collect();
        if !mismatches.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED MISMATCHES");
            println!("═══════════════════════════════════════════════════════════");

            for result in mismatches {
                println!(
                    "Episode {} (seed {}) step {}: {} → {} (state matches: {})",
                    result.tag.episode,
                    result.tag.seed,
                    result.step,
                    result.original_turn.as_str(),
                    result.replayed_turn.as_str(),
                    result.state_matches
                );
            }
            println!();
        }
    }
}
