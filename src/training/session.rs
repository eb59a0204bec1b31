//! Outer training loop
//!
//! Each iteration: self-play with the candidate network, train on the fresh
//! replay batch, checkpoint, optionally pit the candidate against the best
//! model, then append a history row.

use std::marker::PhantomData;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::ZeroConfig;
use crate::game::{Game, GameKind, TicTacToe, UltimateTicTacToe};
use crate::neural::manager::NeuralManager;
use crate::neural::policy_value_net::NetworkMode;
use crate::neural::training::trainer::train_on_batch;
use crate::training::evaluator::evaluate_models;
use crate::training::history::{append_history, HistoryRecord};
use crate::training::scheduler::SelfPlayScheduler;
use crate::Result;

/// What a finished run did.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionReport {
    pub iterations: usize,
    pub promotions: usize,
    /// Arena score of the last iteration that played one
    pub last_score: Option<f64>,
}

pub struct TrainingSession<G: Game> {
    config: ZeroConfig,
    manager: NeuralManager,
    rng: StdRng,
    _game: PhantomData<fn() -> G>,
}

impl<G: Game> TrainingSession<G> {
    /// Validates `config` and builds fresh networks seeded from `config.seed`.
    pub fn new(config: ZeroConfig) -> Result<Self> {
        config.validate()?;
        tch::manual_seed(config.seed as i64);

        let manager = NeuralManager::with_config(config.neural_config(G::ENCODED_SHAPE, G::ACTION_SIZE))?;
        log::info!("{}", manager.summary());

        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            manager,
            _game: PhantomData,
        })
    }

    pub fn config(&self) -> &ZeroConfig {
        &self.config
    }

    pub fn manager(&self) -> &NeuralManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut NeuralManager {
        &mut self.manager
    }

    pub fn run(&mut self) -> Result<SessionReport> {
        let mut report = SessionReport::default();
        let model_dir = self.config.model_dir.clone();
        let search_params = self.config.mcts_params();
        let eval_params = self.config.eval_params();
        let training_params = self.config.training_params();

        log::info!(
            "🚀 Training {} for {} iterations ({} games/iter, {})",
            G::NAME,
            self.config.num_iterations,
            self.config.num_self_play_games,
            search_params.to_config_string()
        );

        if self.config.evaluate {
            self.manager.save_best(&model_dir)?;
        }

        for iteration in 0..self.config.num_iterations {
            let started = Instant::now();
            log::info!("🔁 Iteration {}/{}", iteration + 1, self.config.num_iterations);

            self.manager.set_mode(NetworkMode::Inference);
            let games = self.config.num_self_play_games;
            let scheduler = SelfPlayScheduler::<G>::new(
                search_params.clone(),
                self.config.temperature,
                self.config.thread_factor,
                self.config.seed.wrapping_add((iteration * games) as u64),
            );
            let batch = {
                let evaluator = self.manager.evaluator();
                scheduler.run(games, &evaluator)?
            };
            log::info!(
                "📦 Collected {} samples from {} games on {} workers",
                batch.len(),
                games,
                scheduler.workers()
            );

            self.manager.set_mode(NetworkMode::Training);
            let epochs = train_on_batch(&mut self.manager, &batch, &training_params, &mut self.rng)?;
            log::info!(
                "📉 policy loss {:.4}, value loss {:.4}, total {:.4} ({} steps)",
                epochs.policy_loss,
                epochs.value_loss,
                epochs.total_loss,
                epochs.batches
            );

            self.manager.save_iteration(&model_dir, iteration)?;

            let mut arena_score = None;
            let mut promoted = false;
            if self.config.evaluate {
                self.manager.set_mode(NetworkMode::Inference);
                let result = {
                    let candidate = self.manager.evaluator();
                    let best = self.manager.best_evaluator();
                    evaluate_models::<G, _, _>(
                        &candidate,
                        &best,
                        self.config.eval_games,
                        &eval_params,
                        self.config.seed.wrapping_add(iteration as u64),
                    )?
                };
                arena_score = Some(result.score());
                if result.should_promote() {
                    self.manager.promote_candidate()?;
                    self.manager.save_best(&model_dir)?;
                    promoted = true;
                    report.promotions += 1;
                } else {
                    log::info!("🥈 Candidate kept out, score {:.3}", result.score());
                }
                report.last_score = arena_score;
            }

            append_history(
                &self.config.history_file,
                &HistoryRecord::new(
                    iteration,
                    batch.len(),
                    epochs.policy_loss,
                    epochs.value_loss,
                    arena_score,
                    promoted,
                    started.elapsed().as_secs_f64(),
                ),
            )?;
            report.iterations += 1;
        }

        self.manager.set_mode(NetworkMode::Inference);
        log::info!(
            "🏁 Done: {} iterations, {} promotions",
            report.iterations,
            report.promotions
        );
        Ok(report)
    }
}

/// Builds and runs a session for the game named in `config`.
pub fn run_configured(config: ZeroConfig) -> Result<SessionReport> {
    match config.game {
        GameKind::TicTacToe => TrainingSession::<TicTacToe>::new(config)?.run(),
        GameKind::Ultimate => TrainingSession::<UltimateTicTacToe>::new(config)?.run(),
    }
}
