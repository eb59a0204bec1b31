//! Policy/value evaluation seam between the search and the network.
//!
//! The search only needs "planes in, (policy, value) out". Keeping that behind
//! a trait lets tests and the uniform baseline run without libtorch tensors.

use std::sync::Mutex;

use tch::{Device, Kind};

use crate::neural::policy_value_net::PolicyValueNet;
use crate::neural::tensor_conversion::planes_to_tensor;
use crate::{Result, ZeroError};

/// Network output for one position.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// One probability per action id, sums to 1
    pub policy: Vec<f32>,
    /// In [-1, 1], from the point of view of the player to move
    pub value: f32,
}

/// Anything that maps encoded planes to a [`Prediction`].
///
/// Shared by reference across self-play threads, hence `Send + Sync`.
pub trait PolicyValueEvaluator: Send + Sync {
    fn predict(&self, planes: &[f32]) -> Result<Prediction>;
}

/// Uniform policy and a neutral value. Baseline opponent and test double.
#[derive(Debug, Clone, Copy)]
pub struct UniformEvaluator {
    pub action_size: usize,
}

impl UniformEvaluator {
    pub fn new(action_size: usize) -> Self {
        Self { action_size }
    }
}

impl PolicyValueEvaluator for UniformEvaluator {
    fn predict(&self, _planes: &[f32]) -> Result<Prediction> {
        if self.action_size == 0 {
            return Err(ZeroError::Network("uniform evaluator with empty action space".to_string()));
        }
        Ok(Prediction {
            policy: vec![1.0 / self.action_size as f32; self.action_size],
            value: 0.0,
        })
    }
}

/// Runs a [`PolicyValueNet`] in inference mode.
///
/// The network sits behind a `Mutex`: libtorch modules are not assumed to be
/// safe for concurrent forward passes, so worker threads take turns.
pub struct NetEvaluator<'a> {
    net: &'a Mutex<PolicyValueNet>,
    input_dim: (i64, i64, i64),
    device: Device,
}

impl<'a> NetEvaluator<'a> {
    pub fn new(net: &'a Mutex<PolicyValueNet>, input_dim: (i64, i64, i64), device: Device) -> Self {
        Self {
            net,
            input_dim,
            device,
        }
    }
}

impl PolicyValueEvaluator for NetEvaluator<'_> {
    fn predict(&self, planes: &[f32]) -> Result<Prediction> {
        let input = planes_to_tensor(planes, self.input_dim, self.device)?;
        let net = self
            .net
            .lock()
            .map_err(|_| ZeroError::Network("network mutex poisoned".to_string()))?;

        // Grad mode is thread-local in libtorch
        let (policy, value) = tch::no_grad(|| {
            let (logits, value) = net.forward_t(&input, false);
            (logits.softmax(-1, Kind::Float), value)
        });
        drop(net);

        let policy = Vec::<f32>::try_from(&policy.to_device(Device::Cpu).view([-1]))?;
        let value = value.double_value(&[0, 0]) as f32;
        Ok(Prediction { policy, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::manager::NeuralConfig;
    use tch::nn;

    #[test]
    fn test_uniform_evaluator() {
        let eval = UniformEvaluator::new(4);
        let pred = eval.predict(&[0.0; 27]).unwrap();
        assert_eq!(pred.policy, vec![0.25; 4]);
        assert_eq!(pred.value, 0.0);

        assert!(UniformEvaluator::new(0).predict(&[]).is_err());
    }

    #[test]
    fn test_net_evaluator_outputs_distribution() {
        let config = NeuralConfig {
            filters: 8,
            hidden: 16,
            num_res_blocks: 1,
            ..NeuralConfig::default()
        };
        let vs = nn::VarStore::new(Device::Cpu);
        let net = Mutex::new(PolicyValueNet::new(&vs, &config).unwrap());
        let eval = NetEvaluator::new(&net, config.input_dim, Device::Cpu);

        let pred = eval.predict(&[0.0; 27]).unwrap();
        assert_eq!(pred.policy.len(), 9);
        assert!((pred.policy.iter().sum::<f32>() - 1.0).abs() < 1e-4);
        assert!(pred.policy.iter().all(|&p| p >= 0.0));
        assert!((-1.0..=1.0).contains(&pred.value));
    }

    #[test]
    fn test_net_evaluator_rejects_wrong_plane_count() {
        let config = NeuralConfig {
            filters: 8,
            hidden: 16,
            num_res_blocks: 0,
            ..NeuralConfig::default()
        };
        let vs = nn::VarStore::new(Device::Cpu);
        let net = Mutex::new(PolicyValueNet::new(&vs, &config).unwrap());
        let eval = NetEvaluator::new(&net, config.input_dim, Device::Cpu);
        assert!(eval.predict(&[0.0; 10]).is_err());
    }
}
