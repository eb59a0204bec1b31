use tch::{Device, Tensor};

use crate::training::sample::TrainingSample;
use crate::{Result, ZeroError};

/// Wraps one encoded position as a `[1, C, H, W]` tensor.
pub fn planes_to_tensor(planes: &[f32], input_dim: (i64, i64, i64), device: Device) -> Result<Tensor> {
    let (c, h, w) = input_dim;
    let expected = (c * h * w) as usize;
    if planes.len() != expected {
        return Err(ZeroError::Network(format!(
            "expected {} input values for shape {:?}, got {}",
            expected,
            input_dim,
            planes.len()
        )));
    }
    Ok(Tensor::from_slice(planes).view([1, c, h, w]).to_device(device))
}

/// Stacks samples into `(states [B, C, H, W], policy targets [B, A], outcomes [B, 1])`.
pub fn batch_to_tensors(
    samples: &[&TrainingSample],
    input_dim: (i64, i64, i64),
    action_size: usize,
    device: Device,
) -> Result<(Tensor, Tensor, Tensor)> {
    if samples.is_empty() {
        return Err(ZeroError::Network("cannot build tensors from an empty batch".to_string()));
    }

    let (c, h, w) = input_dim;
    let plane_len = (c * h * w) as usize;
    let batch = samples.len();

    let mut states = Vec::with_capacity(batch * plane_len);
    let mut policies = Vec::with_capacity(batch * action_size);
    let mut outcomes = Vec::with_capacity(batch);

    for (idx, sample) in samples.iter().enumerate() {
        if sample.encoded_state.len() != plane_len {
            return Err(ZeroError::Network(format!(
                "sample {idx}: state has {} values, expected {plane_len}",
                sample.encoded_state.len()
            )));
        }
        if sample.policy_target.len() != action_size {
            return Err(ZeroError::Network(format!(
                "sample {idx}: policy target has {} entries, expected {action_size}",
                sample.policy_target.len()
            )));
        }
        states.extend_from_slice(&sample.encoded_state);
        policies.extend_from_slice(&sample.policy_target);
        outcomes.push(sample.outcome);
    }

    let b = batch as i64;
    Ok((
        Tensor::from_slice(&states).view([b, c, h, w]).to_device(device),
        Tensor::from_slice(&policies)
            .view([b, action_size as i64])
            .to_device(device),
        Tensor::from_slice(&outcomes).view([b, 1]).to_device(device),
    ))
}
