pub mod evaluator;
pub mod history;
pub mod sample;
pub mod scheduler;
pub mod self_play;
pub mod session;

pub use evaluator::{evaluate_models, ArenaResult};
pub use history::HistoryRecord;
pub use sample::{ReplayBatch, TrainingSample};
pub use scheduler::SelfPlayScheduler;
pub use self_play::SelfPlayWorker;
pub use session::{SessionReport, TrainingSession};
