// Integration tests for episode logging and replay
//
// Evaluates a genome with the debug log enabled, then checks that the replay
// engine reproduces every logged step from the episode seeds alone.

use rand::rngs::StdRng;
use rand::SeedableRng;
use snake_evolution::board::Board;
use snake_evolution::debug_logger::DebugLogger;
use snake_evolution::encoder::StateEncoder;
use snake_evolution::replay::ReplayEngine;
use snake_evolution::{Config, FitnessEvaluator, GameRules, Turn, WeightGenome};
use std::path::PathBuf;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Unique log path per test so parallel tests never share a file
fn temp_log(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "snake_evolution_{}_{}.jsonl",
        name,
        std::process::id()
    ))
}

fn logged_run(name: &str, episodes: usize) -> (ReplayEngine, WeightGenome, PathBuf) {
    init_logger();
    let rules = GameRules::new(Board::new(12, 12), 20);
    let encoder = StateEncoder::LocalVision { radius: 2 };
    let path = temp_log(name);

    let logger = DebugLogger::new(true, &path);
    assert!(logger.is_enabled(), "log file {} should open", path.display());
    let evaluator = FitnessEvaluator::new(rules, encoder, episodes).with_logger(logger);
    let genome =
        WeightGenome::new_random(&[28, 10, 3], true, &mut StdRng::seed_from_u64(11)).unwrap();
    evaluator
        .evaluate(&genome, &mut StdRng::seed_from_u64(12))
        .expect("evaluation should succeed");

    (ReplayEngine::new(rules, encoder, true), genome, path)
}

#[test]
fn test_logged_episodes_replay_exactly() {
    let (engine, genome, path) = logged_run("exact", 3);
    let entries = engine.load_log_file(&path).expect("log should load");
    assert!(!entries.is_empty(), "every episode logs at least one step");

    let episodes = ReplayEngine::group_episodes(&entries);
    assert_eq!(episodes.len(), 3);
    for (i, episode) in episodes.iter().enumerate() {
        assert_eq!(episode[0].episode, i);
        assert_eq!(episode[0].step, 1, "steps are numbered from 1");
        assert!(episode.last().map_or(false, |e| e.snapshot.status.is_terminal()));
    }

    let results = engine.replay_all(&genome, &entries).unwrap();
    let stats = engine.generate_stats(&results);
    assert_eq!(stats.total_steps, entries.len());
    assert_eq!(stats.mismatches, 0, "replay diverged from the log");
    assert!((stats.match_rate - 100.0).abs() < 1e-9);
    engine.print_report(&results);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_tampered_turn_is_reported() {
    let (engine, genome, path) = logged_run("tampered", 1);
    let mut entries = engine.load_log_file(&path).expect("log should load");
    entries[0].turn = match entries[0].turn {
        Turn::None => Turn::Left,
        _ => Turn::None,
    };

    let results = engine.replay_episode(&genome, &entries).unwrap();
    assert!(!results[0].turn_matches);
    assert!(results[0].state_matches, "the replayed state is still correct");
    assert_eq!(engine.generate_stats(&results).mismatches, 1);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_other_genome_does_not_replay() {
    let (engine, _, path) = logged_run("other_genome", 2);
    let entries = engine.load_log_file(&path).expect("log should load");

    // A genome that always goes straight while the logged one is random
    let straight = WeightGenome::from_parts(
        vec![28, 3],
        vec![snake_evolution::Matrix::zeros(3, 28)],
        None,
    )
    .unwrap();
    let results = engine.replay_all(&straight, &entries).unwrap();
    let logged_straight = entries.iter().all(|e| e.turn == Turn::None);
    if !logged_straight {
        assert!(engine.generate_stats(&results).mismatches > 0);
    }

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_logger_stays_disabled_when_not_requested() {
    let path = temp_log("not_requested");
    assert!(!DebugLogger::new(false, &path).is_enabled());
    assert!(!path.exists(), "a disabled logger must not create its file");
    assert!(!DebugLogger::disabled().is_enabled());

    let unwritable = temp_log("missing_dir").join("episode.jsonl");
    assert!(!DebugLogger::new(true, &unwritable).is_enabled());
}

#[test]
fn test_missing_log_is_an_error() {
    let engine = ReplayEngine::from_config(&Config::default_hardcoded(), false);
    assert!(engine.load_log_file(temp_log("does_not_exist")).is_err());
}
