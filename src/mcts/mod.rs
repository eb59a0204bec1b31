pub mod algorithm;
pub mod hyperparameters;
pub mod node;
pub mod selection;
pub mod temperature;
pub mod tree;

pub use algorithm::{search, SearchResult};
pub use hyperparameters::MCTSHyperparameters;
pub use tree::{SearchTree, TreeStats};
