pub mod evaluator;
pub mod manager;
pub mod model_io;
pub mod policy_value_net;
pub mod res_net_block;
pub mod tensor_conversion;
pub mod training;

// Re-export key components for convenience
pub use evaluator::{NetEvaluator, PolicyValueEvaluator, Prediction, UniformEvaluator};
pub use manager::{LossBreakdown, NeuralConfig, NeuralManager};
pub use policy_value_net::{NetworkMode, PolicyValueNet};
