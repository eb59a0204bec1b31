//! MCTS Hyperparameters Configuration
//!
//! Knobs consumed by a single [`search`](crate::mcts::algorithm::search) call.
//! Self-play and the arena derive their own copies from
//! [`ZeroConfig`](crate::config::ZeroConfig).

use serde::{Deserialize, Serialize};

/// MCTS hyperparameters configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MCTSHyperparameters {
    /// Simulations per move, not counting the initial root expansion
    /// Default: 100
    pub num_simulations: u32,

    /// PUCT exploration constant c
    /// Higher values = more exploration
    /// Default: 1.414
    pub exploration_constant: f32,

    /// Concentration of the root Dirichlet noise
    /// Default: 0.3
    pub dirichlet_alpha: f32,

    /// Weight of the root noise in the mixed prior, 0 disables it
    /// Default: 0.25
    pub dirichlet_epsilon: f32,
}

impl Default for MCTSHyperparameters {
    fn default() -> Self {
        Self {
            num_simulations: 100,
            exploration_constant: 1.414,
            dirichlet_alpha: 0.3,
            dirichlet_epsilon: 0.25,
        }
    }
}

impl MCTSHyperparameters {
    /// Same search budget with root noise switched off (arena play).
    pub fn for_evaluation(&self) -> Self {
        Self {
            dirichlet_epsilon: 0.0,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.num_simulations == 0 {
            return Err("num_simulations must be at least 1".to_string());
        }
        if !(self.exploration_constant.is_finite() && self.exploration_constant > 0.0) {
            return Err(format!(
                "exploration_constant must be finite and > 0, got {}",
                self.exploration_constant
            ));
        }
        if !(0.0..=1.0).contains(&self.dirichlet_epsilon) {
            return Err(format!(
                "dirichlet_epsilon must be in [0, 1], got {}",
                self.dirichlet_epsilon
            ));
        }
        if self.dirichlet_epsilon > 0.0
            && !(self.dirichlet_alpha.is_finite() && self.dirichlet_alpha > 0.0)
        {
            return Err(format!(
                "dirichlet_alpha must be > 0 when noise is enabled, got {}",
                self.dirichlet_alpha
            ));
        }
        Ok(())
    }

    /// Compact form for log lines.
    pub fn to_config_string(&self) -> String {
        format!(
            "sims={}_c={:.3}_dir[{:.2},{:.2}]",
            self.num_simulations,
            self.exploration_constant,
            self.dirichlet_alpha,
            self.dirichlet_epsilon
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let params = MCTSHyperparameters::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.num_simulations, 100);
        assert!((params.exploration_constant - 1.414).abs() < 1e-6);
    }

    #[test]
    fn test_for_evaluation_disables_noise() {
        let params = MCTSHyperparameters::default().for_evaluation();
        assert_eq!(params.dirichlet_epsilon, 0.0);
        assert_eq!(params.num_simulations, 100);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut params = MCTSHyperparameters::default();
        params.num_simulations = 0;
        assert!(params.validate().is_err());

        let mut params = MCTSHyperparameters::default();
        params.exploration_constant = -1.0;
        assert!(params.validate().is_err());

        let mut params = MCTSHyperparameters::default();
        params.dirichlet_epsilon = 1.5;
        assert!(params.validate().is_err());

        let mut params = MCTSHyperparameters::default();
        params.dirichlet_alpha = 0.0;
        assert!(params.validate().is_err());
        params.dirichlet_epsilon = 0.0;
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_config_string() {
        let config = MCTSHyperparameters::default().to_config_string();
        assert_eq!(config, "sims=100_c=1.414_dir[0.30,0.25]");
    }
}
