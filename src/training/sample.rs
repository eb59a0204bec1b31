//! Replay data produced by self-play.

use serde::{Deserialize, Serialize};

use crate::game::Player;

/// One training position. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    /// Encoded position, relative to the player to move
    pub encoded_state: Vec<f32>,
    /// Search visit distribution over the action space
    pub policy_target: Vec<f32>,
    /// Final result from the point of view of the player to move: -1, 0 or 1
    pub outcome: f32,
}

/// Position recorded during a game, waiting for the final result.
#[derive(Debug, Clone)]
pub struct PendingRecord {
    pub encoded_state: Vec<f32>,
    pub policy: Vec<f32>,
    pub player: Player,
}

/// Turns a game's records into samples once the game has ended.
///
/// `final_value` is the terminal value from the point of view of
/// `final_player`, the player to move in the terminal position. Records made
/// by that player get `final_value`, the others get `-final_value`.
pub fn assign_outcomes(records: Vec<PendingRecord>, final_value: f32, final_player: Player) -> Vec<TrainingSample> {
    records
        .into_iter()
        .map(|record| TrainingSample {
            outcome: if record.player == final_player {
                final_value
            } else {
                -final_value
            },
            encoded_state: record.encoded_state,
            policy_target: record.policy,
        })
        .collect()
}

/// Samples of one self-play round, in game order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayBatch {
    samples: Vec<TrainingSample>,
}

impl ReplayBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn extend(&mut self, samples: impl IntoIterator<Item = TrainingSample>) {
        self.samples.extend(samples);
    }

    pub fn samples(&self) -> &[TrainingSample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<TrainingSample> {
        self.samples
    }
}

impl From<Vec<TrainingSample>> for ReplayBatch {
    fn from(samples: Vec<TrainingSample>) -> Self {
        Self { samples }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(player: Player) -> PendingRecord {
        PendingRecord {
            encoded_state: vec![0.0; 3],
            policy: vec![1.0, 0.0],
            player,
        }
    }

    #[test]
    fn test_assign_outcomes_x_wins() {
        // X, O, X moved; X's last move won, so O is to move with value -1
        let records = vec![record(Player::X), record(Player::O), record(Player::X)];
        let samples = assign_outcomes(records, -1.0, Player::O);

        let outcomes: Vec<f32> = samples.iter().map(|s| s.outcome).collect();
        assert_eq!(outcomes, vec![1.0, -1.0, 1.0]);
    }

    #[test]
    fn test_assign_outcomes_draw() {
        let records = vec![record(Player::X), record(Player::O)];
        let samples = assign_outcomes(records, 0.0, Player::X);
        assert!(samples.iter().all(|s| s.outcome == 0.0));
    }

    #[test]
    fn test_replay_batch() {
        let mut batch = ReplayBatch::new();
        assert!(batch.is_empty());
        batch.extend(assign_outcomes(vec![record(Player::X)], 1.0, Player::X));
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.samples()[0].policy_target, vec![1.0, 0.0]);
        assert_eq!(batch.into_samples().len(), 1);
    }
}
