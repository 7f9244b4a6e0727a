//! Performance profiling for fitness evaluation
//!
//! Tracks where evaluation time goes: whole episodes, forward passes, and
//! how often food placement gave up. Counters accumulate in a per-evaluation
//! `Profiler` and are merged into a shared `ProfilerAggregator` once the
//! evaluation finishes, so parallel workers never contend per step.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use crate::config::ProfilingConfig;

/// Counters gathered by one evaluation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EvaluationProfile {
    pub genomes: usize,
    pub episodes: usize,
    pub steps: u64,
    pub board_full: usize,
    pub episode_time_ns: u64,
    pub forward_time_ns: u64,
    pub forward_calls: usize,
}

/// Global profiling aggregator (shared across threads)
#[derive(Debug)]
pub struct ProfilerAggregator {
    config: ProfilingConfig,
    genomes: AtomicUsize,
    episodes: AtomicUsize,
    steps: AtomicU64,
    board_full: AtomicUsize,
    episode_time_ns: AtomicU64,
    forward_time_ns: AtomicU64,
    forward_calls: AtomicUsize,
}

impl ProfilerAggregator {
    pub fn new(config: ProfilingConfig) -> Self {
        ProfilerAggregator {
            config,
            genomes: AtomicUsize::new(0),
            episodes: AtomicUsize::new(0),
            steps: AtomicU64::new(0),
            board_full: AtomicUsize::new(0),
            episode_time_ns: AtomicU64::new(0),
            forward_time_ns: AtomicU64::new(0),
            forward_calls: AtomicUsize::new(0),
        }
    }

    /// Aggregator that ignores everything merged into it
    pub fn disabled() -> Self {
        Self::new(ProfilingConfig {
            enabled: false,
            log_to_stderr: false,
        })
    }

    pub fn config(&self) -> &ProfilingConfig {
        &self.config
    }

    /// Merges one evaluation's profile data into the global aggregator
    pub fn merge(&self, local: &EvaluationProfile) {
        if !self.config.enabled {
            return;
        }
        self.genomes.fetch_add(local.genomes, Ordering::Relaxed);
        self.episodes.fetch_add(local.episodes, Ordering::Relaxed);
        self.steps.fetch_add(local.steps, Ordering::Relaxed);
        self.board_full.fetch_add(local.board_full, Ordering::Relaxed);
        self.episode_time_ns
            .fetch_add(local.episode_time_ns, Ordering::Relaxed);
        self.forward_time_ns
            .fetch_add(local.forward_time_ns, Ordering::Relaxed);
        self.forward_calls
            .fetch_add(local.forward_calls, Ordering::Relaxed);
    }

    /// Current totals
    pub fn totals(&self) -> EvaluationProfile {
        EvaluationProfile {
            genomes: self.genomes.load(Ordering::Relaxed),
            episodes: self.episodes.load(Ordering::Relaxed),
            steps: self.steps.load(Ordering::Relaxed),
            board_full: self.board_full.load(Ordering::Relaxed),
            episode_time_ns: self.episode_time_ns.load(Ordering::Relaxed),
            forward_time_ns: self.forward_time_ns.load(Ordering::Relaxed),
            forward_calls: self.forward_calls.load(Ordering::Relaxed),
        }
    }

    /// Prints profiling report to stderr
    pub fn print_report(&self, total_time_ms: u64) {
        if !self.config.enabled || !self.config.log_to_stderr {
            return;
        }

        let t = self.totals();
        let total_time_ns = total_time_ms * 1_000_000;

        let episode_ms = t.episode_time_ns as f64 / 1_000_000.0;
        let forward_ms = t.forward_time_ns as f64 / 1_000_000.0;
        let forward_pct = if t.episode_time_ns > 0 {
            100.0 * t.forward_time_ns as f64 / t.episode_time_ns as f64
        } else {
            0.0
        };
        let episode_pct = if total_time_ns > 0 {
            100.0 * t.episode_time_ns as f64 / total_time_ns as f64
        } else {
            0.0
        };
        let avg_forward_us = if t.forward_calls > 0 {
            t.forward_time_ns as f64 / (t.forward_calls * 1000) as f64
        } else {
            0.0
        };
        let avg_steps = if t.episodes > 0 {
            t.steps as f64 / t.episodes as f64
        } else {
            0.0
        };

        eprintln!("\n═══════════════════════════════════════════════════════════");
        eprintln!("                 EVALUATION PROFILE");
        eprintln!("═══════════════════════════════════════════════════════════");
        eprintln!("Total Time: {}ms\n", total_time_ms);

        eprintln!("Workload:");
        eprintln!("  Genomes:      {}", t.genomes);
        eprintln!("  Episodes:     {}", t.episodes);
        eprintln!("  Steps:        {} ({:.1}/episode)", t.steps, avg_steps);
        eprintln!("  Board Full:   {}", t.board_full);
        eprintln!();

        eprintln!("Episodes:");
        eprintln!(
            "  Time:         {:.2}ms ({:.1}% of wall time, summed over workers)",
            episode_ms, episode_pct
        );
        eprintln!("Forward Pass:");
        eprintln!("  Time:         {:.2}ms ({:.1}% of episode time)", forward_ms, forward_pct);
        eprintln!("  Calls:        {}", t.forward_calls);
        eprintln!("  Avg:          {:.2}µs/call", avg_forward_us);

        eprintln!("═══════════════════════════════════════════════════════════\n");
    }
}

/// Per-evaluation profiler instance
pub struct Profiler {
    enabled: bool,
    local: RefCell<EvaluationProfile>,
}

impl Profiler {
    pub fn new(config: &ProfilingConfig) -> Self {
        Profiler {
            enabled: config.enabled,
            local: RefCell::new(EvaluationProfile::default()),
        }
    }

    /// Tracks time spent in one episode
    pub fn track_episode<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed().as_nanos() as u64;

        let mut local = self.local.borrow_mut();
        local.episode_time_ns += elapsed;
        local.episodes += 1;

        result
    }

    /// Tracks time spent in the network's forward pass
    pub fn track_forward<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed().as_nanos() as u64;

        let mut local = self.local.borrow_mut();
        local.forward_time_ns += elapsed;
        local.forward_calls += 1;

        result
    }

    pub fn record_step(&self) {
        if self.enabled {
            self.local.borrow_mut().steps += 1;
        }
    }

    /// Records an episode cut short because food could not be placed
    pub fn record_board_full(&self) {
        if self.enabled {
            self.local.borrow_mut().board_full += 1;
        }
    }

    pub fn record_genome(&self) {
        if self.enabled {
            self.local.borrow_mut().genomes += 1;
        }
    }

    pub fn profile(&self) -> EvaluationProfile {
        self.local.borrow().clone()
    }

    /// Merges this evaluation's profile data into the global aggregator
    pub fn merge_into(&self, aggregator: &ProfilerAggregator) {
        let local = self.local.borrow().clone();
        aggregator.merge(&local);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled() -> ProfilingConfig {
        ProfilingConfig {
            enabled: true,
            log_to_stderr: false,
        }
    }

    #[test]
    fn test_disabled_profiler_records_nothing() {
        let profiler = Profiler::new(&ProfilingConfig {
            enabled: false,
            log_to_stderr: false,
        });
        let value = profiler.track_episode(|| {
            profiler.record_step();
            profiler.track_forward(|| 7)
        });
        profiler.record_board_full();
        assert_eq!(value, 7);
        assert_eq!(profiler.profile(), EvaluationProfile::default());
    }

    #[test]
    fn test_merge_accumulates_across_profilers() {
        let aggregator = ProfilerAggregator::new(enabled());
        for _ in 0..3 {
            let profiler = Profiler::new(aggregator.config());
            profiler.record_genome();
            profiler.track_episode(|| {
                profiler.record_step();
                profiler.record_step();
                profiler.track_forward(|| ());
            });
            profiler.merge_into(&aggregator);
        }

        let totals = aggregator.totals();
        assert_eq!(totals.genomes, 3);
        assert_eq!(totals.episodes, 3);
        assert_eq!(totals.steps, 6);
        assert_eq!(totals.forward_calls, 3);
        assert_eq!(totals.board_full, 0);
    }

    #[test]
    fn test_disabled_aggregator_ignores_merges() {
        let aggregator = ProfilerAggregator::disabled();
        let profiler = Profiler::new(&enabled());
        profiler.record_board_full();
        profiler.merge_into(&aggregator);
        assert_eq!(aggregator.totals().board_full, 0);
    }

    #[test]
    fn test_print_report_leaves_totals_untouched() {
        let aggregator = ProfilerAggregator::new(ProfilingConfig {
            enabled: true,
            log_to_stderr: true,
        });
        let profiler = Profiler::new(aggregator.config());
        profiler.record_genome();
        profiler.track_episode(|| profiler.record_step());
        profiler.merge_into(&aggregator);

        let before = aggregator.totals();
        aggregator.print_report(0);
        aggregator.print_report(25);
        assert_eq!(aggregator.totals(), before);
    }
}
