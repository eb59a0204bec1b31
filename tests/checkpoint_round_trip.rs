//! Checkpoint and configuration files on disk.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

use tictac_zero::neural::model_io::OptimizerCheckpoint;
use tictac_zero::neural::training::trainer::{train_on_batch, TrainingParams};
use tictac_zero::neural::{NetworkMode, NeuralConfig, NeuralManager};
use tictac_zero::training::scheduler::SelfPlayScheduler;
use tictac_zero::{
    GameKind, MCTSHyperparameters, PolicyValueEvaluator, TicTacToe, UltimateTicTacToe,
    UniformEvaluator, ZeroConfig, ZeroError,
};

fn tiny<G: tictac_zero::Game>() -> NeuralManager {
    NeuralManager::with_config(NeuralConfig {
        filters: 4,
        hidden: 8,
        num_res_blocks: 1,
        ..NeuralConfig::for_game::<G>()
    })
    .unwrap()
}

#[test]
fn test_trained_model_survives_reload() {
    let dir = tempdir().unwrap();
    let batch = SelfPlayScheduler::<TicTacToe>::with_workers(
        MCTSHyperparameters {
            num_simulations: 8,
            ..MCTSHyperparameters::default()
        },
        1.0,
        2,
        5,
    )
    .run(4, &UniformEvaluator::new(9))
    .unwrap();

    let mut manager = tiny::<TicTacToe>();
    manager.set_mode(NetworkMode::Training);
    let report = train_on_batch(
        &mut manager,
        &batch,
        &TrainingParams {
            num_epochs: 2,
            batch_size: 8,
            ..TrainingParams::default()
        },
        &mut StdRng::seed_from_u64(0),
    )
    .unwrap();
    assert!(report.total_loss.is_finite());
    manager.set_mode(NetworkMode::Inference);

    let (model_path, optimizer_path) = manager.save_iteration(dir.path(), 3).unwrap();
    let checkpoint = OptimizerCheckpoint::load(&optimizer_path).unwrap();
    assert_eq!(checkpoint.iteration, 3);
    assert_eq!(checkpoint.steps, manager.steps());

    let mut restored = tiny::<TicTacToe>();
    restored.load_candidate(&model_path).unwrap();

    let planes = batch.samples()[0].encoded_state.clone();
    let original = manager.evaluator().predict(&planes).unwrap();
    let reloaded = restored.evaluator().predict(&planes).unwrap();
    for (a, b) in original.policy.iter().zip(&reloaded.policy) {
        assert!((a - b).abs() < 1e-6);
    }
    assert!((original.value - reloaded.value).abs() < 1e-6);
}

#[test]
fn test_loading_into_wrong_architecture_fails() {
    let dir = tempdir().unwrap();
    let path = tiny::<TicTacToe>().save_best(dir.path()).unwrap();

    let mut other = tiny::<UltimateTicTacToe>();
    assert!(matches!(other.load_candidate(&path), Err(ZeroError::Network(_))));
}

#[test]
fn test_config_file_round_trip_and_rejection() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.json");

    let config = ZeroConfig {
        game: GameKind::Ultimate,
        num_simulations: 400,
        ..ZeroConfig::default()
    };
    config.to_json_file(&path).unwrap();
    let loaded = ZeroConfig::from_json_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert!(loaded.validate().is_ok());

    std::fs::write(&path, r#"{"temperature": -1.0}"#).unwrap();
    let bad = ZeroConfig::from_json_file(&path).unwrap();
    assert!(matches!(bad.validate(), Err(ZeroError::Config(_))));

    std::fs::write(&path, "not json").unwrap();
    assert!(matches!(ZeroConfig::from_json_file(&path), Err(ZeroError::Json(_))));
}
