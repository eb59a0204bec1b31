use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::neural::manager::{LossBreakdown, NeuralManager};
use crate::neural::tensor_conversion::batch_to_tensors;
use crate::training::sample::{ReplayBatch, TrainingSample};
use crate::{Result, ZeroError};

/// Knobs for one round of network updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingParams {
    pub num_epochs: usize,
    pub batch_size: usize,
    pub l2_weight: f64,
    /// 0 disables clipping
    pub max_grad_norm: f64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            num_epochs: 4,
            batch_size: 64,
            l2_weight: 1e-4,
            max_grad_norm: 1.0,
        }
    }
}

/// Mean losses of the last epoch plus counters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EpochReport {
    pub epochs: usize,
    pub batches: usize,
    pub samples: usize,
    pub policy_loss: f64,
    pub value_loss: f64,
    pub total_loss: f64,
}

/// Runs `num_epochs` passes over `batch`: shuffle, chunk by `batch_size`,
/// one optimizer step per chunk. The manager must be in training mode.
pub fn train_on_batch<R: Rng + ?Sized>(
    manager: &mut NeuralManager,
    batch: &ReplayBatch,
    params: &TrainingParams,
    rng: &mut R,
) -> Result<EpochReport> {
    if params.batch_size == 0 {
        return Err(ZeroError::Config("batch_size must be at least 1".to_string()));
    }
    let mut report = EpochReport {
        samples: batch.len(),
        ..EpochReport::default()
    };
    if batch.is_empty() {
        log::warn!("⚠️ Empty replay batch, skipping training");
        return Ok(report);
    }

    let input_dim = manager.config().input_dim;
    let action_size = manager.config().action_size as usize;
    let device = manager.config().device;
    let samples = batch.samples();
    let mut order: Vec<usize> = (0..samples.len()).collect();

    for epoch in 0..params.num_epochs {
        order.shuffle(rng);

        let mut epoch_loss = LossBreakdown::default();
        let mut batches = 0usize;
        for chunk in order.chunks(params.batch_size) {
            let chunk_samples: Vec<&TrainingSample> = chunk.iter().map(|&i| &samples[i]).collect();
            let (states, policies, outcomes) =
                batch_to_tensors(&chunk_samples, input_dim, action_size, device)?;

            let loss = manager.train_step(
                &states,
                &policies,
                &outcomes,
                params.l2_weight,
                params.max_grad_norm,
            )?;
            epoch_loss.policy_loss += loss.policy_loss;
            epoch_loss.value_loss += loss.value_loss;
            epoch_loss.total_loss += loss.total_loss;
            batches += 1;
        }

        let n = batches.max(1) as f64;
        report.epochs = epoch + 1;
        report.batches += batches;
        report.policy_loss = epoch_loss.policy_loss / n;
        report.value_loss = epoch_loss.value_loss / n;
        report.total_loss = epoch_loss.total_loss / n;

        log::info!(
            "📉 Epoch {}/{} | policy {:.4} | value {:.4} | total {:.4} ({} batches)",
            epoch + 1,
            params.num_epochs,
            report.policy_loss,
            report.value_loss,
            report.total_loss,
            batches
        );
    }

    Ok(report)
}
