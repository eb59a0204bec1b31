//! Training configuration
//!
//! [`ZeroConfig`] is the flat set of named knobs driving a training run. It is
//! parsed from the command line (flattened into the binary's CLI), can be
//! loaded from or dumped to JSON, and is validated before any work starts.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::{Deserialize, Serialize};
use tch::Device;

use crate::game::GameKind;
use crate::mcts::hyperparameters::MCTSHyperparameters;
use crate::neural::manager::NeuralConfig;
use crate::neural::training::trainer::TrainingParams;
use crate::{Result, ZeroError};

#[derive(Args, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZeroConfig {
    /// Game to train on
    #[arg(long, value_enum, default_value_t = GameKind::TicTacToe)]
    pub game: GameKind,

    /// Outer training iterations
    #[arg(long, default_value_t = 10)]
    pub num_iterations: usize,

    /// Self-play games per iteration
    #[arg(long, default_value_t = 100)]
    pub num_self_play_games: usize,

    /// Passes over each iteration's replay batch
    #[arg(long, default_value_t = 4)]
    pub num_epochs: usize,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// MCTS simulations per move
    #[arg(long, default_value_t = 100)]
    pub num_simulations: u32,

    /// Weight of the root Dirichlet noise during self-play (0 disables it)
    #[arg(long, default_value_t = 0.25)]
    pub dirichlet_epsilon: f32,

    #[arg(long, default_value_t = 0.3)]
    pub dirichlet_alpha: f32,

    /// Self-play move sampling temperature
    #[arg(long, default_value_t = 1.0)]
    pub temperature: f32,

    /// PUCT exploration constant
    #[arg(long, default_value_t = 1.414)]
    pub exploration_constant: f32,

    /// Arena games per iteration
    #[arg(long, default_value_t = 20)]
    pub eval_games: usize,

    /// Fraction of hardware threads used for self-play
    #[arg(long, default_value_t = 0.75)]
    pub thread_factor: f64,

    /// Play the arena and keep a best model
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub evaluate: bool,

    #[arg(long, default_value_t = 1e-3)]
    pub learning_rate: f64,

    /// Adam weight decay
    #[arg(long, default_value_t = 1e-4)]
    pub weight_decay: f64,

    /// Explicit L2 penalty added to the loss
    #[arg(long, default_value_t = 1e-4)]
    pub l2_weight: f64,

    /// Global gradient norm cap (0 disables clipping)
    #[arg(long, default_value_t = 1.0)]
    pub max_grad_norm: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Directory for model and optimizer checkpoints
    #[arg(long, default_value = "checkpoints")]
    pub model_dir: PathBuf,

    /// Per-iteration CSV history
    #[arg(long, default_value = "checkpoints/training_history.csv")]
    pub history_file: PathBuf,

    #[arg(long, default_value_t = 2)]
    pub num_res_blocks: usize,

    /// Channels of the convolutional trunk
    #[arg(long, default_value_t = 32)]
    pub filters: i64,

    /// Width of the shared fully-connected layer
    #[arg(long, default_value_t = 64)]
    pub hidden: i64,
}

impl Default for ZeroConfig {
    fn default() -> Self {
        Self {
            game: GameKind::TicTacToe,
            num_iterations: 10,
            num_self_play_games: 100,
            num_epochs: 4,
            batch_size: 64,
            num_simulations: 100,
            dirichlet_epsilon: 0.25,
            dirichlet_alpha: 0.3,
            temperature: 1.0,
            exploration_constant: 1.414,
            eval_games: 20,
            thread_factor: 0.75,
            evaluate: true,
            learning_rate: 1e-3,
            weight_decay: 1e-4,
            l2_weight: 1e-4,
            max_grad_norm: 1.0,
            seed: 42,
            model_dir: PathBuf::from("checkpoints"),
            history_file: PathBuf::from("checkpoints/training_history.csv"),
            num_res_blocks: 2,
            filters: 32,
            hidden: 64,
        }
    }
}

impl ZeroConfig {
    /// Rejects every invalid knob, naming the first one found.
    pub fn validate(&self) -> Result<()> {
        fn reject(message: String) -> Result<()> {
            Err(ZeroError::Config(message))
        }

        if self.num_iterations == 0 {
            return reject("num_iterations must be at least 1".to_string());
        }
        if self.num_self_play_games == 0 {
            return reject("num_self_play_games must be at least 1".to_string());
        }
        if self.num_epochs == 0 {
            return reject("num_epochs must be at least 1".to_string());
        }
        if self.batch_size == 0 {
            return reject("batch_size must be at least 1".to_string());
        }
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return reject(format!("temperature must be finite and > 0, got {}", self.temperature));
        }
        if self.evaluate && self.eval_games == 0 {
            return reject("eval_games must be at least 1 when evaluation is enabled".to_string());
        }
        if !(self.thread_factor.is_finite() && self.thread_factor > 0.0) {
            return reject(format!("thread_factor must be finite and > 0, got {}", self.thread_factor));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return reject(format!("learning_rate must be finite and > 0, got {}", self.learning_rate));
        }
        if !(self.weight_decay.is_finite() && self.weight_decay >= 0.0) {
            return reject(format!("weight_decay must be finite and >= 0, got {}", self.weight_decay));
        }
        if !(self.l2_weight.is_finite() && self.l2_weight >= 0.0) {
            return reject(format!("l2_weight must be finite and >= 0, got {}", self.l2_weight));
        }
        if !(self.max_grad_norm.is_finite() && self.max_grad_norm >= 0.0) {
            return reject(format!("max_grad_norm must be finite and >= 0, got {}", self.max_grad_norm));
        }
        if self.filters <= 0 || self.hidden <= 0 {
            return reject(format!(
                "filters and hidden must be positive, got {} and {}",
                self.filters, self.hidden
            ));
        }

        self.mcts_params().validate().map_err(ZeroError::Config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        log::debug!("📄 Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Search knobs for self-play, root noise included.
    pub fn mcts_params(&self) -> MCTSHyperparameters {
        MCTSHyperparameters {
            num_simulations: self.num_simulations,
            exploration_constant: self.exploration_constant,
            dirichlet_alpha: self.dirichlet_alpha,
            dirichlet_epsilon: self.dirichlet_epsilon,
        }
    }

    /// Search knobs for arena play.
    pub fn eval_params(&self) -> MCTSHyperparameters {
        self.mcts_params().for_evaluation()
    }

    pub fn training_params(&self) -> TrainingParams {
        TrainingParams {
            num_epochs: self.num_epochs,
            batch_size: self.batch_size,
            l2_weight: self.l2_weight,
            max_grad_norm: self.max_grad_norm,
        }
    }

    /// Network shape for a game with the given encoding and action space.
    pub fn neural_config(&self, input_dim: (i64, i64, i64), action_size: usize) -> NeuralConfig {
        NeuralConfig {
            input_dim,
            action_size: action_size as i64,
            filters: self.filters,
            hidden: self.hidden,
            num_res_blocks: self.num_res_blocks,
            learning_rate: self.learning_rate,
            weight_decay: self.weight_decay,
            device: Device::cuda_if_available(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn test_default_is_valid() {
        assert!(ZeroConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_knobs() {
        let cases: [fn(&mut ZeroConfig); 15] = [
            |c: &mut ZeroConfig| c.num_iterations = 0,
            |c: &mut ZeroConfig| c.num_self_play_games = 0,
            |c: &mut ZeroConfig| c.num_epochs = 0,
            |c: &mut ZeroConfig| c.batch_size = 0,
            |c: &mut ZeroConfig| c.num_simulations = 0,
            |c: &mut ZeroConfig| c.temperature = 0.0,
            |c: &mut ZeroConfig| c.temperature = f32::NAN,
            |c: &mut ZeroConfig| c.exploration_constant = -1.0,
            |c: &mut ZeroConfig| c.dirichlet_epsilon = 1.5,
            |c: &mut ZeroConfig| c.dirichlet_alpha = 0.0,
            |c: &mut ZeroConfig| c.eval_games = 0,
            |c: &mut ZeroConfig| c.thread_factor = 0.0,
            |c: &mut ZeroConfig| c.learning_rate = 0.0,
            |c: &mut ZeroConfig| c.max_grad_norm = -1.0,
            |c: &mut ZeroConfig| c.filters = 0,
        ];
        for (i, mutate) in cases.into_iter().enumerate() {
            let mut config = ZeroConfig::default();
            mutate(&mut config);
            assert_matches!(config.validate(), Err(ZeroError::Config(_)), "case {}", i);
        }
    }

    #[test]
    fn test_eval_games_only_matter_when_evaluating() {
        let config = ZeroConfig {
            evaluate: false,
            eval_games: 0,
            ..ZeroConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_alpha_allowed_without_noise() {
        let config = ZeroConfig {
            dirichlet_epsilon: 0.0,
            dirichlet_alpha: 0.0,
            ..ZeroConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_derived_params() {
        let config = ZeroConfig {
            num_simulations: 25,
            exploration_constant: 2.0,
            ..ZeroConfig::default()
        };
        let search = config.mcts_params();
        assert_eq!(search.num_simulations, 25);
        assert_eq!(search.exploration_constant, 2.0);
        assert_eq!(search.dirichlet_epsilon, 0.25);
        assert_eq!(config.eval_params().dirichlet_epsilon, 0.0);

        let training = config.training_params();
        assert_eq!(training.batch_size, 64);
        assert_eq!(training.num_epochs, 4);

        let neural = config.neural_config((5, 9, 9), 81);
        assert_eq!(neural.action_size, 81);
        assert_eq!(neural.input_dim, (5, 9, 9));
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = ZeroConfig {
            game: GameKind::Ultimate,
            seed: 7,
            evaluate: false,
            ..ZeroConfig::default()
        };
        config.to_json_file(&path).unwrap();
        assert_eq!(ZeroConfig::from_json_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ZeroConfig = serde_json::from_str(r#"{"game": "ultimate", "num_iterations": 3}"#).unwrap();
        assert_eq!(config.game, GameKind::Ultimate);
        assert_eq!(config.num_iterations, 3);
        assert_eq!(config.batch_size, 64);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = ZeroConfig::from_json_file(dir.path().join("absent.json"));
        assert_matches!(result, Err(ZeroError::Io(_)));
    }
}
