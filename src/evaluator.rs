// Fitness evaluation: plays episodes with a genome in control
//
// Each episode gets its own generator seeded from the caller's, so any
// logged episode can be re-run from its seed alone. Batch evaluation runs on
// the rayon pool with one seed per genome; results do not depend on how the
// pool schedules work.

use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::Arc;

use crate::config::{Config, ACTION_COUNT};
use crate::debug_logger::{DebugLogger, EpisodeTag};
use crate::encoder::StateEncoder;
use crate::error::{EvolutionError, Result};
use crate::game::{Game, GameRules};
use crate::genome::WeightGenome;
use crate::profiler::{Profiler, ProfilerAggregator};
use crate::types::Turn;

/// Decodes the network output into a turn.
///
/// The arg-max index maps 0 to `None`, 1 to `Right` and 2 to `Left`; ties go
/// to the lowest index and NaN counts as negative infinity. Any other index means the genome's output layer is
/// malformed and yields `InvalidAction`.
pub fn decode_action(output: &[f32]) -> Result<Turn> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in output.iter().enumerate() {
        let v = if v.is_nan() { f32::NEG_INFINITY } else { v };
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }

    match best {
        None => Err(EvolutionError::Shape {
            expected: ACTION_COUNT,
            actual: 0,
        }),
        Some((0, _)) => Ok(Turn::None),
        Some((1, _)) => Ok(Turn::Right),
        Some((2, _)) => Ok(Turn::Left),
        Some((i, _)) => Err(EvolutionError::InvalidAction(i)),
    }
}

/// Scores genomes by letting them play
pub struct FitnessEvaluator {
    rules: GameRules,
    encoder: StateEncoder,
    episodes: usize,
    base_seed: u64,
    logger: DebugLogger,
    profiler: Arc<ProfilerAggregator>,
}

impl FitnessEvaluator {
    /// Creates an evaluator without logging or profiling
    ///
    /// # Arguments
    /// * `rules` - Board, hunger and scoring rules of every episode
    /// * `encoder` - Layout of the network input
    /// * `episodes` - Episodes averaged per evaluation
    pub fn new(rules: GameRules, encoder: StateEncoder, episodes: usize) -> Self {
        FitnessEvaluator {
            rules,
            encoder,
            episodes,
            base_seed: 0,
            logger: DebugLogger::disabled(),
            profiler: Arc::new(ProfilerAggregator::disabled()),
        }
    }

    /// Creates an evaluator with the debug log and profiler the config asks for
    pub fn from_config(config: &Config) -> Self {
        FitnessEvaluator {
            rules: config.game_rules(),
            encoder: config.encoder(),
            episodes: config.evaluation.episodes,
            base_seed: config.evaluation.base_seed,
            logger: DebugLogger::new(config.debug.enabled, &config.debug.log_file_path),
            profiler: Arc::new(ProfilerAggregator::new(config.profiling.clone())),
        }
    }

    /// Seed of the first genome in `evaluate_generation`
    pub fn with_base_seed(mut self, base_seed: u64) -> Self {
        self.base_seed = base_seed;
        self
    }

    pub fn with_logger(mut self, logger: DebugLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_profiler(mut self, profiler: Arc<ProfilerAggregator>) -> Self {
        self.profiler = profiler;
        self
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn encoder(&self) -> StateEncoder {
        self.encoder
    }

    pub fn episodes(&self) -> usize {
        self.episodes
    }

    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    pub fn profiler(&self) -> &ProfilerAggregator {
        &self.profiler
    }

    /// Checks that the genome reads this encoder's input and emits three actions
    pub fn check_genome(&self, genome: &WeightGenome) -> Result<()> {
        let input_len = self.encoder.input_len(&self.rules.board);
        if genome.input_size() != input_len || genome.output_size() != ACTION_COUNT {
            return Err(EvolutionError::InvalidLayout(format!(
                "genome maps {} inputs to {} outputs, evaluator needs {} to {}",
                genome.input_size(),
                genome.output_size(),
                input_len,
                ACTION_COUNT
            )));
        }
        Ok(())
    }

    /// Turn the genome picks in the current state of `game`
    pub fn choose_turn(&self, genome: &WeightGenome, game: &Game) -> Result<Turn> {
        let state = self.encoder.encode(game);
        let output = genome.forward(&state)?;
        decode_action(&output)
    }

    /// Plays `game` to termination and returns its final score.
    ///
    /// A food respawn that finds no free cell ends the episode with the score
    /// reached so far.
    pub fn run_episode<R: Rng + ?Sized>(
        &self,
        genome: &WeightGenome,
        game: &mut Game,
        rng: &mut R,
    ) -> Result<f64> {
        let profiler = Profiler::new(self.profiler.config());
        let score = self.play(genome, game, rng, None, &profiler)?;
        profiler.merge_into(&self.profiler);
        Ok(score)
    }

    fn play<R: Rng + ?Sized>(
        &self,
        genome: &WeightGenome,
        game: &mut Game,
        rng: &mut R,
        tag: Option<EpisodeTag>,
        profiler: &Profiler,
    ) -> Result<f64> {
        while !game.status().is_terminal() {
            let state = self.encoder.encode(game);
            let output = profiler.track_forward(|| genome.forward(&state))?;
            let turn = decode_action(&output)?;

            let outcome = game.step(turn, rng);
            profiler.record_step();
            if let Some(tag) = tag {
                self.logger.log_step(tag, turn, game);
            }

            match outcome {
                Ok(_) => {}
                Err(EvolutionError::BoardFull { attempts }) => {
                    warn!(
                        "Episode ended early: no free cell for food after {} attempts (score {})",
                        attempts,
                        game.score()
                    );
                    profiler.record_board_full();
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        trace!(
            "Episode finished: score {} after {} steps ({:?})",
            game.score(),
            game.steps(),
            game.status()
        );
        Ok(game.score())
    }

    /// Mean score of `genome` over the configured number of episodes.
    ///
    /// Every episode starts a fresh game on a generator seeded with the next
    /// `u64` drawn from `rng`.
    pub fn evaluate<R: Rng + ?Sized>(&self, genome: &WeightGenome, rng: &mut R) -> Result<f64> {
        self.check_genome(genome)?;
        if self.episodes == 0 {
            return Ok(0.0);
        }

        let profiler = Profiler::new(self.profiler.config());
        profiler.record_genome();

        let mut total = 0.0;
        for episode in 0..self.episodes {
            let seed: u64 = rng.random();
            let mut episode_rng = StdRng::seed_from_u64(seed);
            let tag = EpisodeTag { seed, episode };

            let score = profiler.track_episode(|| -> Result<f64> {
                let mut game = match Game::new(self.rules, &mut episode_rng) {
                    Ok(game) => game,
                    Err(EvolutionError::BoardFull { .. }) => {
                        warn!("Episode {} could not place its first food, scoring 0", episode);
                        profiler.record_board_full();
                        return Ok(0.0);
                    }
                    Err(e) => return Err(e),
                };
                self.play(genome, &mut game, &mut episode_rng, Some(tag), &profiler)
            })?;

            trace!("Episode {} (seed {}) scored {}", episode, seed, score);
            total += score;
        }

        profiler.merge_into(&self.profiler);
        let mean = total / self.episodes as f64;
        debug!(
            "Evaluated genome {:?} over {} episodes: mean score {:.3}",
            genome.layer_sizes(),
            self.episodes,
            mean
        );
        Ok(mean)
    }

    /// Evaluates every genome in parallel.
    ///
    /// Genome `i` is evaluated with a generator seeded `base_seed + i`, so the
    /// returned scores are reproducible for a given population and seed.
    pub fn evaluate_population(&self, genomes: &[WeightGenome], base_seed: u64) -> Result<Vec<f64>> {
        let scores = genomes
            .par_iter()
            .enumerate()
            .map(|(i, genome)| {
                let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(i as u64));
                self.evaluate(genome, &mut rng)
            })
            .collect::<Result<Vec<f64>>>()?;

        debug!(
            "Evaluated population of {} genomes on {} threads",
            genomes.len(),
            rayon::current_num_threads()
        );
        Ok(scores)
    }

    /// Evaluates a population seeded from the evaluator's own `base_seed`
    pub fn evaluate_generation(&self, genomes: &[WeightGenome]) -> Result<Vec<f64>> {
        self.evaluate_population(genomes, self.base_seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::genome::Matrix;
    use crate::types::Position;

    fn zero_genome(sizes: &[usize]) -> WeightGenome {
        let weights = sizes
            .windows(2)
            .map(|p| Matrix::zeros(p[1], p[0]))
            .collect();
        WeightGenome::from_parts(sizes.to_vec(), weights, None).unwrap()
    }

    /// Single-layer genome whose output is always `bias` regardless of input
    fn constant_output(inputs: usize, bias: [f32; 3]) -> WeightGenome {
        WeightGenome::from_parts(
            vec![inputs, 3],
            vec![Matrix::zeros(3, inputs)],
            Some(vec![bias.to_vec()]),
        )
        .unwrap()
    }

    #[test]
    fn test_decode_action_maps_indices() {
        assert_eq!(decode_action(&[1.0, 0.0, 0.0]).unwrap(), Turn::None);
        assert_eq!(decode_action(&[0.0, 1.0, 0.0]).unwrap(), Turn::Right);
        assert_eq!(decode_action(&[0.0, 0.0, 1.0]).unwrap(), Turn::Left);
        assert_eq!(decode_action(&[-3.0, -2.0, -5.0]).unwrap(), Turn::Right);
    }

    #[test]
    fn test_decode_action_ties_pick_lowest_index() {
        assert_eq!(decode_action(&[0.0, 0.0, 0.0]).unwrap(), Turn::None);
        assert_eq!(decode_action(&[0.0, 2.0, 2.0]).unwrap(), Turn::Right);
    }

    #[test]
    fn test_decode_action_skips_nan() {
        assert_eq!(decode_action(&[f32::NAN, 1.0, 0.0]).unwrap(), Turn::Right);
        assert_eq!(decode_action(&[0.0, f32::NAN, -1.0]).unwrap(), Turn::None);
        assert_eq!(decode_action(&[-1.0, -2.0, f32::NAN]).unwrap(), Turn::None);
        assert_eq!(decode_action(&[f32::NAN; 3]).unwrap(), Turn::None);
    }

    #[test]
    fn test_decode_action_rejects_bad_output() {
        assert!(matches!(
            decode_action(&[0.0, 0.0, 0.0, 1.0]),
            Err(EvolutionError::InvalidAction(3))
        ));
        assert!(matches!(
            decode_action(&[]),
            Err(EvolutionError::Shape { .. })
        ));
    }

    #[test]
    fn test_food_ahead_then_starve() {
        // Large board so a respawned food is almost never straight ahead
        let rules = GameRules::new(Board::new(64, 64), 4);
        let encoder = StateEncoder::LocalVision { radius: 1 };
        let evaluator = FitnessEvaluator::new(rules, encoder, 1);
        let genome = zero_genome(&[12, 3]);

        let mut rng = StdRng::seed_from_u64(8);
        let mut game = Game::new(rules, &mut rng).unwrap();
        game.set_food(game.snake().next_ahead());
        assert_eq!(game.food(), Some(Position::new(32, 33)));

        let score = evaluator.run_episode(&genome, &mut game, &mut rng).unwrap();
        assert_eq!(score, 1.0);
        assert_eq!(game.apples(), 1);
        assert_eq!(
            game.status(),
            crate::game::Status::Terminated(crate::game::TerminationReason::Starved)
        );
        // One step to eat, then max_hunger steps to starve
        assert_eq!(game.steps(), 5);
    }

    #[test]
    fn test_evaluate_rejects_mismatched_genome() {
        let rules = GameRules::new(Board::new(10, 10), 10);
        let evaluator = FitnessEvaluator::new(rules, StateEncoder::LocalVision { radius: 2 }, 2);
        let mut rng = StdRng::seed_from_u64(1);

        assert!(matches!(
            evaluator.evaluate(&zero_genome(&[12, 3]), &mut rng),
            Err(EvolutionError::InvalidLayout(_))
        ));
        assert!(matches!(
            evaluator.evaluate(&zero_genome(&[28, 4]), &mut rng),
            Err(EvolutionError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_evaluate_is_reproducible_for_a_seed() {
        let rules = GameRules::new(Board::new(12, 12), 15);
        let evaluator = FitnessEvaluator::new(rules, StateEncoder::LocalVision { radius: 2 }, 4);
        let genome =
            WeightGenome::new_random(&[28, 8, 3], false, &mut StdRng::seed_from_u64(3)).unwrap();

        let a = evaluator
            .evaluate(&genome, &mut StdRng::seed_from_u64(77))
            .unwrap();
        let b = evaluator
            .evaluate(&genome, &mut StdRng::seed_from_u64(77))
            .unwrap();
        assert_eq!(a, b);
        assert!(a >= 0.0);
    }

    #[test]
    fn test_constant_turning_genome_terminates() {
        // Constant right turns trace a 2x2 square until the snake starves
        let rules = GameRules::new(Board::new(30, 30), 6);
        let evaluator = FitnessEvaluator::new(rules, StateEncoder::LocalVision { radius: 1 }, 3);
        let genome = constant_output(12, [0.0, 1.0, 0.0]);
        let score = evaluator
            .evaluate(&genome, &mut StdRng::seed_from_u64(5))
            .unwrap();
        assert!(score >= 0.0);
    }

    #[test]
    fn test_population_scores_match_individual_evaluations() {
        let rules = GameRules::new(Board::new(10, 10), 12);
        let evaluator = FitnessEvaluator::new(rules, StateEncoder::FullBoard, 2);
        let mut rng = StdRng::seed_from_u64(40);
        let genomes: Vec<WeightGenome> = (0..6)
            .map(|_| WeightGenome::new_random(&[208, 6, 3], true, &mut rng).unwrap())
            .collect();

        let scores = evaluator.evaluate_population(&genomes, 1000).unwrap();
        assert_eq!(scores.len(), genomes.len());
        for (i, genome) in genomes.iter().enumerate() {
            let single = evaluator
                .evaluate(genome, &mut StdRng::seed_from_u64(1000 + i as u64))
                .unwrap();
            assert_eq!(scores[i], single, "genome {} scored differently in batch", i);
        }
    }

    #[test]
    fn test_generation_uses_configured_base_seed() {
        let mut config = Config::default_hardcoded();
        config.evaluation.episodes = 2;
        config.evaluation.base_seed = 77;
        let evaluator = FitnessEvaluator::from_config(&config);
        assert_eq!(evaluator.base_seed(), 77);

        let mut rng = StdRng::seed_from_u64(41);
        let genomes: Vec<WeightGenome> = (0..3)
            .map(|_| config.new_genome(&mut rng).unwrap())
            .collect();
        let scores = evaluator.evaluate_generation(&genomes).unwrap();
        assert_eq!(scores, evaluator.evaluate_population(&genomes, 77).unwrap());

        let reseeded = evaluator.with_base_seed(5);
        assert_eq!(
            reseeded.evaluate_generation(&genomes).unwrap(),
            reseeded.evaluate_population(&genomes, 5).unwrap()
        );
    }

    #[test]
    fn test_profiler_counts_episodes() {
        let rules = GameRules::new(Board::new(8, 8), 5);
        let aggregator = Arc::new(ProfilerAggregator::new(crate::config::ProfilingConfig {
            enabled: true,
            log_to_stderr: false,
        }));
        let evaluator = FitnessEvaluator::new(rules, StateEncoder::LocalVision { radius: 1 }, 3)
            .with_profiler(aggregator.clone());
        let genome = zero_genome(&[12, 3]);
        evaluator
            .evaluate(&genome, &mut StdRng::seed_from_u64(2))
            .unwrap();

        let totals = aggregator.totals();
        assert_eq!(totals.genomes, 1);
        assert_eq!(totals.episodes, 3);
        assert!(totals.steps >= 3);
        assert_eq!(totals.forward_calls as u64, totals.steps);
    }

    #[test]
    fn test_board_full_ends_episode_without_error() {
        // 2x1 board: the snake starts at (1, 0) and the only free cell is (0, 0).
        // Turning left eats it and leaves nowhere for the next food.
        let rules = GameRules::new(Board::new(2, 1), 5);
        let aggregator = Arc::new(ProfilerAggregator::new(crate::config::ProfilingConfig {
            enabled: true,
            log_to_stderr: false,
        }));
        let evaluator = FitnessEvaluator::new(rules, StateEncoder::LocalVision { radius: 1 }, 1)
            .with_profiler(aggregator.clone());
        let genome = constant_output(12, [0.0, 0.0, 1.0]);

        let mut rng = StdRng::seed_from_u64(6);
        let mut game = Game::new(rules, &mut rng).unwrap();
        assert_eq!(game.food(), Some(Position::new(0, 0)));

        let score = evaluator.run_episode(&genome, &mut game, &mut rng).unwrap();
        assert_eq!(score, 1.0);
        assert_eq!(game.food(), None);
        assert_eq!(game.snake().size(), 2);
        assert_eq!(aggregator.totals().board_full, 1);
    }
}
