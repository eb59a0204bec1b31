//! Neural Network Manager
//!
//! Owns the candidate network (trained every iteration), its optimizer and
//! the best network (the arena champion). Evaluators borrow the networks
//! immutably, so the borrow checker keeps training and inference apart.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tch::nn::OptimizerConfig;
use tch::{nn, Device, Kind, Tensor};

use crate::game::Game;
use crate::neural::evaluator::NetEvaluator;
use crate::neural::model_io::{load_varstore, save_varstore, OptimizerCheckpoint};
use crate::neural::policy_value_net::{NetworkMode, PolicyValueNet};
use crate::neural::training::gradient_clipping::clip_gradients;
use crate::{Result, ZeroError};

/// Configuration for neural network initialization
#[derive(Debug, Clone)]
pub struct NeuralConfig {
    /// Input dimensions (channels, height, width)
    pub input_dim: (i64, i64, i64),
    /// Policy head width
    pub action_size: i64,
    /// Channels of the convolutional trunk
    pub filters: i64,
    /// Width of the shared fully-connected layer
    pub hidden: i64,
    pub num_res_blocks: usize,
    pub learning_rate: f64,
    /// Adam weight decay
    pub weight_decay: f64,
    /// Device to use for computation (CPU/GPU)
    pub device: Device,
}

impl Default for NeuralConfig {
    fn default() -> Self {
        Self {
            input_dim: (3, 3, 3),
            action_size: 9,
            filters: 32,
            hidden: 64,
            num_res_blocks: 2,
            learning_rate: 1e-3,
            weight_decay: 1e-4,
            device: Device::Cpu,
        }
    }
}

impl NeuralConfig {
    /// Default architecture sized for `G`'s encoding and action space.
    pub fn for_game<G: Game>() -> Self {
        Self {
            input_dim: G::ENCODED_SHAPE,
            action_size: G::ACTION_SIZE as i64,
            ..Self::default()
        }
    }
}

/// Per-step loss components, already reduced to scalars.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LossBreakdown {
    pub policy_loss: f64,
    pub value_loss: f64,
    pub l2_loss: f64,
    pub total_loss: f64,
    /// Global gradient norm before clipping
    pub grad_norm: f64,
}

/// Neural Network Manager that encapsulates all network components
pub struct NeuralManager {
    config: NeuralConfig,
    vs: nn::VarStore,
    net: Mutex<PolicyValueNet>,
    optimizer: nn::Optimizer,
    best_vs: nn::VarStore,
    best_net: Mutex<PolicyValueNet>,
    mode: NetworkMode,
    steps: u64,
}

impl NeuralManager {
    pub fn with_config(config: NeuralConfig) -> Result<Self> {
        log::info!("🧠 Initializing neural network manager...");
        log::debug!(
            "Neural config: input_dim={:?}, actions={}, filters={}, blocks={}, device={:?}",
            config.input_dim,
            config.action_size,
            config.filters,
            config.num_res_blocks,
            config.device
        );

        let vs = nn::VarStore::new(config.device);
        let net = PolicyValueNet::new(&vs, &config)?;

        let mut best_vs = nn::VarStore::new(config.device);
        let best_net = PolicyValueNet::new(&best_vs, &config)?;
        best_vs.copy(&vs)?;

        let optimizer = nn::Adam {
            wd: config.weight_decay,
            ..Default::default()
        }
        .build(&vs, config.learning_rate)?;

        log::info!("✅ Neural network manager initialized successfully");

        Ok(Self {
            config,
            vs,
            net: Mutex::new(net),
            optimizer,
            best_vs,
            best_net: Mutex::new(best_net),
            mode: NetworkMode::Inference,
            steps: 0,
        })
    }

    pub fn config(&self) -> &NeuralConfig {
        &self.config
    }

    pub fn varstore(&self) -> &nn::VarStore {
        &self.vs
    }

    pub fn best_varstore(&self) -> &nn::VarStore {
        &self.best_vs
    }

    pub fn mode(&self) -> NetworkMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: NetworkMode) {
        if self.mode != mode {
            log::debug!("🔀 Network mode {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
    }

    /// Optimizer steps taken since construction.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Inference view of the candidate network.
    pub fn evaluator(&self) -> NetEvaluator<'_> {
        NetEvaluator::new(&self.net, self.config.input_dim, self.config.device)
    }

    /// Inference view of the best network.
    pub fn best_evaluator(&self) -> NetEvaluator<'_> {
        NetEvaluator::new(&self.best_net, self.config.input_dim, self.config.device)
    }

    /// One optimizer step on a prepared batch.
    ///
    /// `loss = CE(policy) + MSE(value) + l2_weight * sum(theta^2)`
    pub fn train_step(
        &mut self,
        states: &Tensor,
        policy_targets: &Tensor,
        outcomes: &Tensor,
        l2_weight: f64,
        max_grad_norm: f64,
    ) -> Result<LossBreakdown> {
        if !self.mode.is_training() {
            return Err(ZeroError::Training(
                "train_step called while the network is in inference mode".to_string(),
            ));
        }

        let net = self
            .net
            .get_mut()
            .map_err(|_| ZeroError::Network("network mutex poisoned".to_string()))?;
        let (logits, values) = net.forward_t(states, true);

        let batch_size = logits.size()[0] as f64;
        let log_probs = logits.log_softmax(-1, Kind::Float);
        let policy_loss = -(policy_targets * &log_probs).sum(Kind::Float) / batch_size;
        let value_loss = values.mse_loss(outcomes, tch::Reduction::Mean);

        let mut l2 = Tensor::from(0.0f32).to_device(self.config.device);
        if l2_weight > 0.0 {
            for param in self.vs.trainable_variables() {
                l2 = l2 + (&param * &param).sum(Kind::Float);
            }
        }
        let total = &policy_loss + &value_loss + &l2 * l2_weight;

        let total_value = total.double_value(&[]);
        if !total_value.is_finite() {
            return Err(ZeroError::Training(format!(
                "non-finite loss {total_value} at step {}",
                self.steps
            )));
        }

        self.optimizer.zero_grad();
        total.backward();
        let grad_norm = clip_gradients(&self.vs, max_grad_norm);
        self.optimizer.step();
        self.steps += 1;

        Ok(LossBreakdown {
            policy_loss: policy_loss.double_value(&[]),
            value_loss: value_loss.double_value(&[]),
            l2_loss: l2.double_value(&[]),
            total_loss: total_value,
            grad_norm,
        })
    }

    /// Copies the candidate weights into the best network.
    pub fn promote_candidate(&mut self) -> Result<()> {
        self.best_vs.copy(&self.vs)?;
        log::info!("🏆 Candidate promoted to best model");
        Ok(())
    }

    /// Writes `model_{i}.safetensors` and `optimizer_{i}.json` under `dir`.
    pub fn save_iteration(&self, dir: impl AsRef<Path>, iteration: usize) -> Result<(PathBuf, PathBuf)> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let model_path = dir.join(format!("model_{iteration}.safetensors"));
        save_varstore(&self.vs, &model_path)?;

        let optimizer_path = dir.join(format!("optimizer_{iteration}.json"));
        OptimizerCheckpoint {
            iteration,
            learning_rate: self.config.learning_rate,
            weight_decay: self.config.weight_decay,
            steps: self.steps,
        }
        .save(&optimizer_path)?;

        log::info!(
            "💾 Saved iteration {} checkpoint to {}",
            iteration,
            model_path.display()
        );
        Ok((model_path, optimizer_path))
    }

    /// Writes `best.safetensors` under `dir`.
    pub fn save_best(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join("best.safetensors");
        save_varstore(&self.best_vs, &path)?;
        log::info!("💾 Best model saved to {}", path.display());
        Ok(path)
    }

    /// Replaces the candidate weights with a checkpoint from disk.
    pub fn load_candidate(&mut self, path: impl AsRef<Path>) -> Result<()> {
        load_varstore(&mut self.vs, path.as_ref())?;
        log::info!("📂 Candidate weights loaded from {}", path.as_ref().display());
        Ok(())
    }

    /// Replaces the best-model weights with a checkpoint from disk.
    pub fn load_best(&mut self, path: impl AsRef<Path>) -> Result<()> {
        load_varstore(&mut self.best_vs, path.as_ref())?;
        log::info!("📂 Best weights loaded from {}", path.as_ref().display());
        Ok(())
    }

    pub fn summary(&self) -> NeuralSummary {
        NeuralSummary {
            input_dim: self.config.input_dim,
            action_size: self.config.action_size,
            device: format!("{:?}", self.config.device),
            learning_rate: self.config.learning_rate,
            num_res_blocks: self.config.num_res_blocks,
            parameters: self
                .vs
                .trainable_variables()
                .iter()
                .map(|t| t.numel())
                .sum(),
        }
    }
}

/// Summary information about the networks
#[derive(Debug)]
pub struct NeuralSummary {
    pub input_dim: (i64, i64, i64),
    pub action_size: i64,
    pub device: String,
    pub learning_rate: f64,
    pub num_res_blocks: usize,
    pub parameters: usize,
}

impl fmt::Display for NeuralSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Neural Network Summary:\n\
             📐 Input Dimensions: {:?}\n\
             🎯 Actions: {}\n\
             💻 Device: {}\n\
             🧱 Residual Blocks: {}\n\
             📉 Learning Rate: {:.2e}\n\
             🔢 Parameters: {}",
            self.input_dim,
            self.action_size,
            self.device,
            self.num_res_blocks,
            self.learning_rate,
            self.parameters
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{TicTacToe, UltimateTicTacToe};
    use crate::neural::evaluator::PolicyValueEvaluator;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn tiny_manager() -> NeuralManager {
        NeuralManager::with_config(NeuralConfig {
            filters: 8,
            hidden: 16,
            num_res_blocks: 1,
            ..NeuralConfig::for_game::<TicTacToe>()
        })
        .unwrap()
    }

    fn tiny_batch() -> (Tensor, Tensor, Tensor) {
        let states = Tensor::rand([4, 3, 3, 3], (Kind::Float, Device::Cpu));
        let policies = Tensor::full([4, 9], 1.0 / 9.0, (Kind::Float, Device::Cpu));
        let outcomes = Tensor::from_slice(&[1.0f32, -1.0, 0.0, 1.0]).view([4, 1]);
        (states, policies, outcomes)
    }

    #[test]
    fn test_neural_config_for_game() {
        let config = NeuralConfig::for_game::<UltimateTicTacToe>();
        assert_eq!(config.input_dim, (5, 9, 9));
        assert_eq!(config.action_size, 81);
        assert_eq!(config.device, Device::Cpu);
    }

    #[test]
    fn test_best_starts_equal_to_candidate() {
        let manager = tiny_manager();
        let planes = vec![0.0; 27];
        let a = manager.evaluator().predict(&planes).unwrap();
        let b = manager.best_evaluator().predict(&planes).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_train_step_requires_training_mode() {
        let mut manager = tiny_manager();
        let (s, p, o) = tiny_batch();
        assert_matches!(
            manager.train_step(&s, &p, &o, 0.0, 1.0),
            Err(ZeroError::Training(_))
        );
    }

    #[test]
    fn test_train_step_updates_candidate_only() {
        let mut manager = tiny_manager();
        manager.set_mode(NetworkMode::Training);
        let (s, p, o) = tiny_batch();

        let loss = manager.train_step(&s, &p, &o, 1e-4, 1.0).unwrap();
        assert!(loss.total_loss.is_finite());
        assert!(loss.policy_loss > 0.0);
        assert!(loss.l2_loss > 0.0);
        assert_eq!(manager.steps(), 1);

        manager.set_mode(NetworkMode::Inference);
        let planes = vec![0.5; 27];
        let candidate = manager.evaluator().predict(&planes).unwrap();
        let best = manager.best_evaluator().predict(&planes).unwrap();
        assert_ne!(candidate, best);

        manager.promote_candidate().unwrap();
        let best = manager.best_evaluator().predict(&planes).unwrap();
        assert_eq!(candidate, best);
    }

    #[test]
    fn test_save_and_load_iteration() {
        let dir = tempdir().unwrap();
        let mut manager = tiny_manager();
        manager.set_mode(NetworkMode::Training);
        let (s, p, o) = tiny_batch();
        manager.train_step(&s, &p, &o, 0.0, 0.0).unwrap();
        manager.set_mode(NetworkMode::Inference);

        let (model_path, optimizer_path) = manager.save_iteration(dir.path(), 0).unwrap();
        assert!(model_path.ends_with("model_0.safetensors"));
        let checkpoint = OptimizerCheckpoint::load(&optimizer_path).unwrap();
        assert_eq!(checkpoint.iteration, 0);
        assert_eq!(checkpoint.steps, 1);

        let planes = vec![0.25; 27];
        let before = manager.evaluator().predict(&planes).unwrap();

        let mut fresh = tiny_manager();
        fresh.load_candidate(&model_path).unwrap();
        let after = fresh.evaluator().predict(&planes).unwrap();
        for (a, b) in before.policy.iter().zip(&after.policy) {
            assert!((a - b).abs() < 1e-6);
        }
        assert!((before.value - after.value).abs() < 1e-6);

        assert!(manager.save_best(dir.path()).unwrap().exists());
    }

    #[test]
    fn test_summary_display() {
        let summary = tiny_manager().summary();
        let display = format!("{}", summary);
        assert!(display.contains("Neural Network Summary"));
        assert!(display.contains("Input Dimensions: (3, 3, 3)"));
        assert!(summary.parameters > 0);
    }
}
