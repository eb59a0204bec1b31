//! Single-game self-play.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::game::{Game, Player};
use crate::mcts::algorithm::search;
use crate::mcts::hyperparameters::MCTSHyperparameters;
use crate::mcts::temperature::{apply_temperature, sample_action};
use crate::neural::evaluator::PolicyValueEvaluator;
use crate::training::sample::{assign_outcomes, PendingRecord, TrainingSample};
use crate::Result;

/// How a self-play game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSummary {
    pub plies: usize,
    /// `None` for a draw
    pub winner: Option<Player>,
}

/// Plays games against itself with one seeded RNG.
pub struct SelfPlayWorker {
    params: MCTSHyperparameters,
    temperature: f32,
    rng: StdRng,
}

impl SelfPlayWorker {
    pub fn new(params: MCTSHyperparameters, temperature: f32, seed: u64) -> Self {
        Self {
            params,
            temperature,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn play_game<G, E>(&mut self, start: G, evaluator: &E) -> Result<Vec<TrainingSample>>
    where
        G: Game,
        E: PolicyValueEvaluator + ?Sized,
    {
        self.play_game_with_summary(start, evaluator)
            .map(|(samples, _)| samples)
    }

    /// Plays `start` to the end. Every position gets the search policy as its
    /// target and the final result from its mover's point of view.
    pub fn play_game_with_summary<G, E>(
        &mut self,
        start: G,
        evaluator: &E,
    ) -> Result<(Vec<TrainingSample>, GameSummary)>
    where
        G: Game,
        E: PolicyValueEvaluator + ?Sized,
    {
        let mut state = start;
        let mut records = Vec::new();

        loop {
            let (value, terminated) = state.value_and_terminated();
            if terminated {
                let final_player = state.current_player();
                let winner = if value > 0.0 {
                    Some(final_player)
                } else if value < 0.0 {
                    Some(final_player.opponent())
                } else {
                    None
                };
                let summary = GameSummary {
                    plies: records.len(),
                    winner,
                };
                log::debug!(
                    "🎲 {} self-play game over after {} plies, winner {:?}",
                    G::NAME,
                    summary.plies,
                    winner
                );
                return Ok((assign_outcomes(records, value, final_player), summary));
            }

            let result = search(&state, evaluator, &self.params, &mut self.rng)?;
            let legal_moves = state.legal_moves();
            let shaped = apply_temperature(&result.policy, self.temperature, &legal_moves)?;
            let action = sample_action(&shaped, &mut self.rng)?;

            records.push(PendingRecord {
                encoded_state: state.encode(),
                policy: result.policy,
                player: state.current_player(),
            });
            state = state.apply_move(action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::TicTacToe;
    use crate::neural::evaluator::UniformEvaluator;

    fn params() -> MCTSHyperparameters {
        MCTSHyperparameters {
            num_simulations: 16,
            ..MCTSHyperparameters::default()
        }
    }

    #[test]
    fn test_play_game_produces_consistent_samples() {
        let mut worker = SelfPlayWorker::new(params(), 1.0, 7);
        let eval = UniformEvaluator::new(9);
        let (samples, summary) = worker
            .play_game_with_summary(TicTacToe::new_game(), &eval)
            .unwrap();

        assert_eq!(samples.len(), summary.plies);
        assert!((5..=9).contains(&samples.len()));
        for sample in &samples {
            assert_eq!(sample.encoded_state.len(), 27);
            assert!((sample.policy_target.iter().sum::<f32>() - 1.0).abs() < 1e-5);
            assert!([-1.0, 0.0, 1.0].contains(&sample.outcome));
        }

        match summary.winner {
            None => assert!(samples.iter().all(|s| s.outcome == 0.0)),
            Some(_) => {
                // the last mover won; outcomes alternate backwards from +1
                let last = samples.len() - 1;
                for (i, sample) in samples.iter().enumerate() {
                    let expected = if (last - i) % 2 == 0 { 1.0 } else { -1.0 };
                    assert_eq!(sample.outcome, expected);
                }
            }
        }
    }

    #[test]
    fn test_same_seed_same_game() {
        let eval = UniformEvaluator::new(9);
        let a = SelfPlayWorker::new(params(), 1.0, 11)
            .play_game(TicTacToe::new_game(), &eval)
            .unwrap();
        let b = SelfPlayWorker::new(params(), 1.0, 11)
            .play_game(TicTacToe::new_game(), &eval)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_terminal_start_yields_no_samples() {
        let mut worker = SelfPlayWorker::new(params(), 1.0, 0);
        let eval = UniformEvaluator::new(9);
        let finished = TicTacToe::from_cells("XXX OO. ...").unwrap();
        let (samples, summary) = worker.play_game_with_summary(finished, &eval).unwrap();
        assert!(samples.is_empty());
        assert_eq!(summary.winner, Some(Player::X));
    }

    #[test]
    fn test_invalid_temperature_fails_fast() {
        let mut worker = SelfPlayWorker::new(params(), 0.0, 0);
        let eval = UniformEvaluator::new(9);
        assert!(worker.play_game(TicTacToe::new_game(), &eval).is_err());
    }
}
