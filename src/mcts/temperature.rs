//! Turning a visit distribution into a move.

use rand::Rng;

use crate::{Result, ZeroError};

/// Sharpens (T < 1) or flattens (T > 1) `policy` as `p^(1/T)`, renormalised.
///
/// Computed as `(p / p_max)^(1/T)` so small temperatures do not underflow to
/// an all-zero vector. Zero entries stay exactly zero. A policy with no mass
/// falls back to uniform over `legal_moves`.
pub fn apply_temperature(policy: &[f32], temperature: f32, legal_moves: &[usize]) -> Result<Vec<f32>> {
    if !(temperature.is_finite() && temperature > 0.0) {
        return Err(ZeroError::Config(format!(
            "temperature must be finite and > 0, got {temperature}"
        )));
    }

    let p_max = policy
        .iter()
        .copied()
        .filter(|p| p.is_finite())
        .fold(0.0f32, f32::max);

    if p_max <= 0.0 {
        if legal_moves.is_empty() {
            return Err(ZeroError::Search(
                "empty policy and no legal moves to fall back on".to_string(),
            ));
        }
        log::warn!(
            "⚠️ Visit distribution has no mass, sampling uniformly over {} legal moves",
            legal_moves.len()
        );
        let mut uniform = vec![0.0f32; policy.len()];
        let p = 1.0 / legal_moves.len() as f32;
        for &a in legal_moves {
            if let Some(slot) = uniform.get_mut(a) {
                *slot = p;
            }
        }
        return Ok(uniform);
    }

    let inv_t = 1.0 / temperature as f64;
    let shaped: Vec<f64> = policy
        .iter()
        .map(|&p| {
            if p.is_finite() && p > 0.0 {
                ((p / p_max) as f64).powf(inv_t)
            } else {
                0.0
            }
        })
        .collect();
    // The max entry contributes exactly 1.0, so the sum is never zero
    let sum: f64 = shaped.iter().sum();
    Ok(shaped.iter().map(|&p| (p / sum) as f32).collect())
}

/// Draws an index from `probs` by walking the cumulative sum.
///
/// Rounding that leaves the draw past the end picks the last positive entry.
pub fn sample_action<R: Rng + ?Sized>(probs: &[f32], rng: &mut R) -> Result<usize> {
    let last_positive = probs
        .iter()
        .rposition(|&p| p > 0.0)
        .ok_or_else(|| ZeroError::Search("cannot sample from an all-zero distribution".to_string()))?;

    let total: f32 = probs.iter().filter(|p| **p > 0.0).sum();
    let threshold = rng.random::<f32>() * total;
    let mut cumsum = 0.0f32;
    for (action, &p) in probs.iter().enumerate() {
        if p <= 0.0 {
            continue;
        }
        cumsum += p;
        if threshold < cumsum {
            return Ok(action);
        }
    }
    Ok(last_positive)
}

/// Index of the first maximum.
pub fn argmax(probs: &[f32]) -> usize {
    let mut best = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (i, &p) in probs.iter().enumerate() {
        if p > best_value {
            best_value = p;
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_temperature_one_is_identity() {
        let policy = vec![0.0, 0.25, 0.75];
        let shaped = apply_temperature(&policy, 1.0, &[1, 2]).unwrap();
        for (a, b) in policy.iter().zip(&shaped) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_low_temperature_sharpens_without_underflow() {
        let policy = vec![0.1, 0.2, 0.7, 0.0];
        let shaped = apply_temperature(&policy, 0.01, &[0, 1, 2]).unwrap();
        assert!((shaped.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(shaped[2] > 0.999);
        assert_eq!(shaped[3], 0.0);
    }

    #[test]
    fn test_high_temperature_flattens() {
        let policy = vec![0.2, 0.8];
        let shaped = apply_temperature(&policy, 4.0, &[0, 1]).unwrap();
        assert!(shaped[0] > 0.2 && shaped[1] < 0.8);
    }

    #[test]
    fn test_invalid_temperature_is_rejected() {
        assert!(apply_temperature(&[1.0], 0.0, &[0]).is_err());
        assert!(apply_temperature(&[1.0], -1.0, &[0]).is_err());
        assert!(apply_temperature(&[1.0], f32::NAN, &[0]).is_err());
    }

    #[test]
    fn test_zero_policy_falls_back_to_uniform_legal() {
        let shaped = apply_temperature(&[0.0; 4], 1.0, &[1, 3]).unwrap();
        assert_eq!(shaped, vec![0.0, 0.5, 0.0, 0.5]);
    }

    #[test]
    fn test_sample_action_never_picks_zero_entries() {
        let mut rng = StdRng::seed_from_u64(42);
        let probs = vec![0.0, 0.3, 0.0, 0.7];
        let mut counts = [0usize; 4];
        for _ in 0..2000 {
            counts[sample_action(&probs, &mut rng).unwrap()] += 1;
        }
        assert_eq!(counts[0], 0);
        assert_eq!(counts[2], 0);
        assert!(counts[3] > counts[1]);
    }

    #[test]
    fn test_sample_action_all_zero_is_error() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(sample_action(&[0.0, 0.0], &mut rng).is_err());
    }

    #[test]
    fn test_argmax_first_maximum() {
        assert_eq!(argmax(&[0.1, 0.4, 0.4, 0.1]), 1);
        assert_eq!(argmax(&[0.0; 3]), 0);
    }
}
