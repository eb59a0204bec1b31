//! Two-player, zero-sum, perfect-information games searched by the MCTS engine.
//!
//! Every game is an immutable-per-ply value: [`Game::apply_move`] returns the
//! advanced position and leaves the receiver untouched, so tree nodes can own
//! plain snapshots.

pub mod tic_tac_toe;
pub mod ultimate_tic_tac_toe;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use tic_tac_toe::TicTacToe;
pub use ultimate_tic_tac_toe::UltimateTicTacToe;

/// Side identifier. X always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    X,
    O,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::X => write!(f, "X"),
            Player::O => write!(f, "O"),
        }
    }
}

/// Contract between the search/training core and a concrete board game.
pub trait Game: Clone + fmt::Debug + Send + Sync + 'static {
    /// Identifier used in logs and checkpoint names.
    const NAME: &'static str;

    /// Size of the fixed action space the network predicts over.
    const ACTION_SIZE: usize;

    /// `(channels, height, width)` of [`Game::encode`].
    const ENCODED_SHAPE: (i64, i64, i64);

    /// Starting position, X to move.
    fn new_game() -> Self;

    /// Legal action ids in ascending order. Empty iff the game is over.
    fn legal_moves(&self) -> Vec<usize>;

    /// Returns the position after `action`.
    ///
    /// # Panics
    /// If `action` is not legal in this position.
    fn apply_move(&self, action: usize) -> Self;

    /// `(value, terminated)` where value is in {-1, 0, 1} from the point of
    /// view of the player about to move. `(0.0, false)` while running.
    fn value_and_terminated(&self) -> (f32, bool);

    /// Flattened input planes of shape [`Game::ENCODED_SHAPE`], relative to
    /// the player about to move.
    fn encode(&self) -> Vec<f32>;

    fn current_player(&self) -> Player;

    fn is_terminal(&self) -> bool {
        self.value_and_terminated().1
    }

    /// Number of `f32` values produced by [`Game::encode`].
    fn encoded_len() -> usize {
        let (c, h, w) = Self::ENCODED_SHAPE;
        (c * h * w) as usize
    }
}

/// Runtime game selector used by the CLI and the config file.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    /// Classic 3×3 tic-tac-toe
    #[value(name = "tictactoe")]
    #[serde(rename = "tictactoe")]
    TicTacToe,
    /// 9×9 ultimate tic-tac-toe
    #[value(name = "ultimate")]
    Ultimate,
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameKind::TicTacToe => write!(f, "{}", TicTacToe::NAME),
            GameKind::Ultimate => write!(f, "{}", UltimateTicTacToe::NAME),
        }
    }
}

/// Bitmasks of the eight winning lines on a 3×3 board (bit `row * 3 + col`).
pub(crate) const WINNING_LINES: [u16; 8] = [
    0b000_000_111,
    0b000_111_000,
    0b111_000_000,
    0b001_001_001,
    0b010_010_010,
    0b100_100_100,
    0b100_010_001,
    0b001_010_100,
];

/// Mask of the nine cells of a 3×3 board.
pub(crate) const BOARD_MASK: u16 = 0b111_111_111;

pub(crate) fn has_line(board: u16) -> bool {
    WINNING_LINES.iter().any(|&line| board & line == line)
}
