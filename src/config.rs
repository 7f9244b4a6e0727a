// Configuration module for reading Evolution.toml
// Every tunable of the board, network, encoder and genetic operators lives here

use log::warn;
use rand::Rng;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::board::Board;
use crate::encoder::StateEncoder;
use crate::error::{EvolutionError, Result};
use crate::game::GameRules;
use crate::genome::{Activation, WeightGenome};
use crate::operators::CrossoverStrategy;

/// Width of the network's output layer: [None, Right, Left]
pub const ACTION_COUNT: usize = 3;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub board: BoardConfig,
    pub snake: SnakeConfig,
    pub network: NetworkConfig,
    pub encoder: EncoderConfig,
    pub evaluation: EvaluationConfig,
    pub mutation: MutationConfig,
    pub crossover: CrossoverConfig,
    pub debug: DebugConfig,
    pub profiling: ProfilingConfig,
}

/// Board dimensions
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BoardConfig {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SnakeConfig {
    /// Steps without food before starvation
    pub max_hunger: u32,
    /// Outermost perimeter ring the local-vision encoder looks at
    pub vision_radius: u32,
}

/// Hidden layout of the controller network; input and output widths are derived
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct NetworkConfig {
    pub hidden_layers: Vec<usize>,
    pub use_bias: bool,
    #[serde(default)]
    pub activation: Activation,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EncoderKind {
    LocalVision,
    FullBoard,
    Neighbours,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EncoderConfig {
    pub kind: EncoderKind,
}

/// Fitness evaluation parameters
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EvaluationConfig {
    pub episodes: usize,
    pub speed_bonus_alpha: f64,
    pub food_spawn_attempts: u32,
    pub base_seed: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MutationConfig {
    /// Fraction of all weight genes redrawn per mutation call
    pub weight_rate: f64,
    pub bias_genes: usize,
}

impl MutationConfig {
    /// Number of weight genes to redraw for a genome with `total` weights
    ///
    /// # Arguments
    /// * `total` - Total weight count of the genome
    ///
    /// # Returns
    /// `total * weight_rate` rounded down, never negative
    pub fn weight_genes(&self, total: usize) -> usize {
        (total as f64 * self.weight_rate.max(0.0)) as usize
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CrossoverConfig {
    #[serde(default)]
    pub strategy: CrossoverStrategy,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

/// Performance profiling configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ProfilingConfig {
    pub enabled: bool,
    pub log_to_stderr: bool,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Evolution.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config>` - Parsed configuration or a `Config` error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| EvolutionError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parses configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| EvolutionError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads default configuration from Evolution.toml in the project root
    pub fn load_default() -> Result<Self> {
        Self::from_file("Evolution.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Evolution.toml
    pub fn default_hardcoded() -> Self {
        Config {
            board: BoardConfig {
                width: 20,
                height: 20,
            },
            snake: SnakeConfig {
                max_hunger: 30,
                vision_radius: 2,
            },
            network: NetworkConfig {
                hidden_layers: vec![24, 24],
                use_bias: false,
                activation: Activation::Identity,
            },
            encoder: EncoderConfig {
                kind: EncoderKind::LocalVision,
            },
            evaluation: EvaluationConfig {
                episodes: 10,
                speed_bonus_alpha: 0.0,
                food_spawn_attempts: 1000,
                base_seed: 42,
            },
            mutation: MutationConfig {
                weight_rate: 0.05,
                bias_genes: 2,
            },
            crossover: CrossoverConfig {
                strategy: CrossoverStrategy::Uniform,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "evolution_debug.jsonl".to_string(),
            },
            profiling: ProfilingConfig {
                enabled: false,
                log_to_stderr: true,
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            warn!(
                "Could not load Evolution.toml ({}), using hardcoded defaults",
                e
            );
            Self::default_hardcoded()
        })
    }

    /// Rejects values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.board.width <= 0 || self.board.height <= 0 {
            return Err(EvolutionError::Config(format!(
                "board must be at least 1x1, got {}x{}",
                self.board.width, self.board.height
            )));
        }
        if self.snake.max_hunger == 0 {
            return Err(EvolutionError::Config("max_hunger must be positive".to_string()));
        }
        if self.evaluation.episodes == 0 {
            return Err(EvolutionError::Config("episodes must be positive".to_string()));
        }
        if self.network.hidden_layers.iter().any(|&w| w == 0) {
            return Err(EvolutionError::Config(
                "hidden layers must have at least one neuron".to_string(),
            ));
        }
        Ok(())
    }

    pub fn board(&self) -> Board {
        Board::new(self.board.width, self.board.height)
    }

    pub fn encoder(&self) -> StateEncoder {
        match self.encoder.kind {
            EncoderKind::LocalVision => StateEncoder::LocalVision {
                radius: self.snake.vision_radius,
            },
            EncoderKind::FullBoard => StateEncoder::FullBoard,
            EncoderKind::Neighbours => StateEncoder::Neighbours,
        }
    }

    /// Episode rules derived from the board, snake and evaluation sections
    pub fn game_rules(&self) -> GameRules {
        GameRules {
            board: self.board(),
            max_hunger: self.snake.max_hunger,
            food_spawn_attempts: self.evaluation.food_spawn_attempts,
            speed_bonus_alpha: self.evaluation.speed_bonus_alpha,
        }
    }

    /// Full layer list: encoder width, hidden layers, then the three actions
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.network.hidden_layers.len() + 2);
        sizes.push(self.encoder().input_len(&self.board()));
        sizes.extend_from_slice(&self.network.hidden_layers);
        sizes.push(ACTION_COUNT);
        sizes
    }

    /// Draws a fresh genome shaped by the `[network]` and `[encoder]` sections
    ///
    /// # Arguments
    /// * `rng` - Source of the initial U[-1, 1] weights
    ///
    /// # Returns
    /// * Genome with `layer_sizes()`, biases when `use_bias` is set and the
    ///   configured activation
    pub fn new_genome<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<WeightGenome> {
        let genome = WeightGenome::new_random(&self.layer_sizes(), self.network.use_bias, rng)?;
        Ok(genome.with_activation(self.network.activation))
    }
}
