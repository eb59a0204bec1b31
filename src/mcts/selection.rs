//! Selection scores and prior shaping.

use rand::Rng;
use rand_distr::{Distribution, Gamma};

use crate::game::Game;
use crate::mcts::node::Node;
use crate::{Result, ZeroError};

/// PUCT score of `child` as seen from its parent.
///
/// `UCB = Q(child) + c * sqrt(N(parent)) / (1 + N(child)) * P(child)`
///
/// Takes the pre-computed square root so callers comparing siblings pay for it once.
#[inline]
pub fn ucb_score<G: Game>(parent_visits_sqrt: f32, child: &Node<G>, exploration_constant: f32) -> f32 {
    let exploration =
        exploration_constant * parent_visits_sqrt / (1.0 + child.visit_count as f32) * child.prior;
    child.mean_value() + exploration
}

/// Restricts `policy` to `legal_moves` and renormalises.
///
/// Returns one prior per legal move, in the order of `legal_moves`. A masked
/// sum that is zero or not finite falls back to a uniform distribution.
pub fn masked_priors(policy: &[f32], legal_moves: &[usize]) -> Result<Vec<f32>> {
    if legal_moves.is_empty() {
        return Err(ZeroError::Search(
            "cannot build priors for a position without legal moves".to_string(),
        ));
    }
    if let Some(&bad) = legal_moves.iter().find(|&&a| a >= policy.len()) {
        return Err(ZeroError::Search(format!(
            "legal move {bad} outside policy of length {}",
            policy.len()
        )));
    }

    let masked: Vec<f32> = legal_moves
        .iter()
        .map(|&a| {
            let p = policy[a];
            if p.is_finite() && p > 0.0 {
                p
            } else {
                0.0
            }
        })
        .collect();
    let sum: f32 = masked.iter().sum();

    if sum <= 0.0 || !sum.is_finite() {
        log::warn!(
            "⚠️ Degenerate policy over {} legal moves (masked sum {}), using uniform priors",
            legal_moves.len(),
            sum
        );
        let uniform = 1.0 / legal_moves.len() as f32;
        return Ok(vec![uniform; legal_moves.len()]);
    }

    Ok(masked.into_iter().map(|p| p / sum).collect())
}

/// Samples a Dirichlet(alpha, .., alpha) vector of length `n` through
/// normalised Gamma(alpha, 1) draws.
pub fn dirichlet_noise<R: Rng + ?Sized>(n: usize, alpha: f32, rng: &mut R) -> Result<Vec<f32>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    let gamma = Gamma::new(alpha as f64, 1.0)
        .map_err(|e| ZeroError::Config(format!("invalid Dirichlet alpha {alpha}: {e}")))?;

    let samples: Vec<f64> = (0..n).map(|_| gamma.sample(rng)).collect();
    let sum: f64 = samples.iter().sum();

    if sum <= 0.0 || !sum.is_finite() {
        // Every draw underflowed (tiny alpha)
        return Ok(vec![1.0 / n as f32; n]);
    }
    Ok(samples.iter().map(|&s| (s / sum) as f32).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Game, TicTacToe};
    use crate::mcts::node::NodeId;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_ucb_score() {
        let mut child = Node::new_child(TicTacToe::new_game(), NodeId::ROOT, 0, 0.5);
        child.visit_count = 10;
        child.value_sum = 5.0;

        // 0.5 + 1.0 * 10 / 11 * 0.5
        let score = ucb_score(10.0, &child, 1.0);
        assert!((score - (0.5 + 5.0 / 11.0)).abs() < 1e-5);
    }

    #[test]
    fn test_unvisited_child_is_pure_exploration() {
        let child = Node::new_child(TicTacToe::new_game(), NodeId::ROOT, 0, 0.25);
        let score = ucb_score(4.0, &child, 2.0);
        assert!((score - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_masked_priors_renormalises() {
        let policy = vec![0.1, 0.2, 0.3, 0.4];
        let priors = masked_priors(&policy, &[1, 3]).unwrap();
        assert_eq!(priors.len(), 2);
        assert!((priors[0] - 0.2 / 0.6).abs() < 1e-6);
        assert!((priors[1] - 0.4 / 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_masked_priors_zero_mass_falls_back_to_uniform() {
        let policy = vec![1.0, 0.0, 0.0, 0.0];
        let priors = masked_priors(&policy, &[1, 2, 3]).unwrap();
        for p in priors {
            assert!((p - 1.0 / 3.0).abs() < 1e-6);
        }

        let nan_policy = vec![f32::NAN; 4];
        let priors = masked_priors(&nan_policy, &[0, 2]).unwrap();
        assert_eq!(priors, vec![0.5, 0.5]);
    }

    #[test]
    fn test_masked_priors_rejects_empty_or_out_of_range() {
        assert!(masked_priors(&[1.0], &[]).is_err());
        assert!(masked_priors(&[1.0], &[3]).is_err());
    }

    #[test]
    fn test_dirichlet_noise_is_a_distribution() {
        let mut rng = StdRng::seed_from_u64(7);
        let noise = dirichlet_noise(TicTacToe::ACTION_SIZE, 0.3, &mut rng).unwrap();
        assert_eq!(noise.len(), 9);
        assert!(noise.iter().all(|&x| x >= 0.0));
        assert!((noise.iter().sum::<f32>() - 1.0).abs() < 1e-5);

        assert!(dirichlet_noise(0, 0.3, &mut rng).unwrap().is_empty());
        assert!(dirichlet_noise(3, 0.0, &mut rng).is_err());
    }
}
