//! # Tictac Zero
//!
//! AlphaZero-style training for small two-player board games.
//!
//! ## Features
//!
//! - **Game Engine**: tic-tac-toe and ultimate tic-tac-toe behind one [`game::Game`] contract
//! - **MCTS Engine**: arena-backed PUCT search with root-only Dirichlet noise
//! - **Self-Play**: temperature-sampled games fanned out over a fork/join worker pool
//! - **Training System**: policy/value network (libtorch via `tch`) trained on self-play batches
//! - **Arena**: greedy model-vs-model matches deciding which network becomes the best model
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tictac_zero::{
//!     config::ZeroConfig,
//!     game::TicTacToe,
//!     training::session::TrainingSession,
//! };
//!
//! let config = ZeroConfig::default();
//! let mut session = TrainingSession::<TicTacToe>::new(config)?;
//! let report = session.run()?;
//! ```

// ============================================================================
// PUBLIC API MODULES
// ============================================================================

/// Flat set of named training knobs
pub mod config;

/// Board games (GameState collaborators)
pub mod game;

/// Monte Carlo Tree Search engine
pub mod mcts;

/// Policy/value network, evaluator seam and optimizer plumbing
pub mod neural;

/// Self-play, scheduling, arena and the outer training loop
pub mod training;

/// Logger bootstrap shared by the binary and tests
pub mod logging;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use config::ZeroConfig;
pub use game::{Game, GameKind, Player, TicTacToe, UltimateTicTacToe};
pub use mcts::algorithm::{search, SearchResult};
pub use mcts::hyperparameters::MCTSHyperparameters;
pub use neural::evaluator::{PolicyValueEvaluator, Prediction, UniformEvaluator};
pub use training::sample::{ReplayBatch, TrainingSample};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Main error type for the crate.
///
/// Tree-construction bugs (selecting from a leaf, double expansion, more
/// children than actions) are not represented here: they panic.
#[derive(Debug, thiserror::Error)]
pub enum ZeroError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Game error: {0}")]
    Game(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Torch error: {0}")]
    Tch(#[from] tch::TchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Safetensors error: {0}")]
    SafeTensors(#[from] safetensors::SafeTensorError),

    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ZeroError>;

// ============================================================================
// LIBRARY VERSION INFO
// ============================================================================

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
