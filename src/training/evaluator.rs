//! Model-vs-model arena.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::game::{Game, Player};
use crate::mcts::algorithm::search;
use crate::mcts::hyperparameters::MCTSHyperparameters;
use crate::mcts::temperature::argmax;
use crate::neural::evaluator::PolicyValueEvaluator;
use crate::{Result, ZeroError};

/// Score the candidate needs against the best model to replace it.
pub const PROMOTION_THRESHOLD: f64 = 0.5;

/// Tally of an arena run, from the new model's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArenaResult {
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    pub games: usize,
}

impl ArenaResult {
    /// `(wins + 0.5 * draws) / games`, 0 when nothing was played.
    pub fn score(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        (self.wins as f64 + 0.5 * self.draws as f64) / self.games as f64
    }

    pub fn should_promote(&self) -> bool {
        self.games > 0 && self.score() >= PROMOTION_THRESHOLD
    }
}

/// Plays `num_games` greedy games between `new` and `old`.
///
/// The new model takes X on even games and O on odd ones. Every ply is a full
/// search for the side to move with root noise off, followed by the most
/// visited move.
pub fn evaluate_models<G, A, B>(
    new: &A,
    old: &B,
    num_games: usize,
    params: &MCTSHyperparameters,
    seed: u64,
) -> Result<ArenaResult>
where
    G: Game,
    A: PolicyValueEvaluator + ?Sized,
    B: PolicyValueEvaluator + ?Sized,
{
    if num_games == 0 {
        return Err(ZeroError::Config("arena needs at least one game".to_string()));
    }

    let params = params.for_evaluation();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut result = ArenaResult::default();

    for game_index in 0..num_games {
        let new_side = if game_index % 2 == 0 { Player::X } else { Player::O };
        let mut state = G::new_game();
        let mut plies = 0;

        let winner = loop {
            let (value, terminated) = state.value_and_terminated();
            if terminated {
                break if value > 0.0 {
                    Some(state.current_player())
                } else if value < 0.0 {
                    Some(state.current_player().opponent())
                } else {
                    None
                };
            }

            let searched = if state.current_player() == new_side {
                search(&state, new, &params, &mut rng)?
            } else {
                search(&state, old, &params, &mut rng)?
            };
            state = state.apply_move(argmax(&searched.policy));
            plies += 1;
        };

        match winner {
            Some(player) if player == new_side => result.wins += 1,
            Some(_) => result.losses += 1,
            None => result.draws += 1,
        }
        result.games += 1;

        log::debug!(
            "⚔️ Arena game {}: new model as {}, {} plies, winner {:?}",
            game_index,
            new_side,
            plies,
            winner
        );
    }

    log::info!(
        "🏆 Arena: {} W / {} L / {} D over {} games, score {:.3}",
        result.wins,
        result.losses,
        result.draws,
        result.games,
        result.score()
    );
    Ok(result)
}
