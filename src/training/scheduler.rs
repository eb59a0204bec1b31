//! Fork/join self-play over a per-batch rayon pool.
//!
//! Games run in batches of `worker_count` threads. Each game gets its own
//! worker, tree and RNG seeded with `base_seed + game_index`, so the replay
//! batch only depends on the seed and the worker count.

use std::marker::PhantomData;

use rayon::prelude::*;

use crate::game::{Game, Player};
use crate::mcts::hyperparameters::MCTSHyperparameters;
use crate::neural::evaluator::PolicyValueEvaluator;
use crate::training::sample::ReplayBatch;
use crate::training::self_play::SelfPlayWorker;
use crate::Result;

/// `max(1, floor(hardware_threads * thread_factor))`
pub fn worker_count_for(hardware_threads: usize, thread_factor: f64) -> usize {
    let scaled = (hardware_threads as f64 * thread_factor).floor();
    if scaled.is_finite() && scaled >= 1.0 {
        scaled as usize
    } else {
        1
    }
}

/// Worker count for this machine.
pub fn worker_count(thread_factor: f64) -> usize {
    let hardware_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    worker_count_for(hardware_threads, thread_factor)
}

/// Tallies of one self-play round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelfPlayStats {
    pub games: usize,
    pub samples: usize,
    pub x_wins: usize,
    pub o_wins: usize,
    pub draws: usize,
}

pub struct SelfPlayScheduler<G: Game> {
    params: MCTSHyperparameters,
    temperature: f32,
    workers: usize,
    base_seed: u64,
    _game: PhantomData<fn() -> G>,
}

impl<G: Game> SelfPlayScheduler<G> {
    pub fn new(params: MCTSHyperparameters, temperature: f32, thread_factor: f64, base_seed: u64) -> Self {
        Self::with_workers(params, temperature, worker_count(thread_factor), base_seed)
    }

    pub fn with_workers(params: MCTSHyperparameters, temperature: f32, workers: usize, base_seed: u64) -> Self {
        Self {
            params,
            temperature,
            workers: workers.max(1),
            base_seed,
            _game: PhantomData,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn run<E>(&self, num_games: usize, evaluator: &E) -> Result<ReplayBatch>
    where
        E: PolicyValueEvaluator + ?Sized,
    {
        self.run_with_stats(num_games, evaluator).map(|(batch, _)| batch)
    }

    /// Plays `num_games` games and concatenates their samples in game order.
    ///
    /// The first error from any game aborts the round. A panic in a worker
    /// resurfaces here when the batch is joined.
    pub fn run_with_stats<E>(&self, num_games: usize, evaluator: &E) -> Result<(ReplayBatch, SelfPlayStats)>
    where
        E: PolicyValueEvaluator + ?Sized,
    {
        let mut batch = ReplayBatch::new();
        let mut stats = SelfPlayStats::default();
        let mut next_game = 0;

        while next_game < num_games {
            let width = self.workers.min(num_games - next_game);
            let pool = rayon::ThreadPoolBuilder::new().num_threads(width).build()?;
            let game_indices: Vec<usize> = (next_game..next_game + width).collect();

            let results = pool.install(|| {
                game_indices
                    .par_iter()
                    .map(|&game_index| {
                        let seed = self.base_seed.wrapping_add(game_index as u64);
                        let mut worker = SelfPlayWorker::new(self.params.clone(), self.temperature, seed);
                        worker.play_game_with_summary(G::new_game(), evaluator)
                    })
                    .collect::<Result<Vec<_>>>()
            })?;

            for (samples, summary) in results {
                stats.games += 1;
                stats.samples += samples.len();
                match summary.winner {
                    Some(Player::X) => stats.x_wins += 1,
                    Some(Player::O) => stats.o_wins += 1,
                    None => stats.draws += 1,
                }
                batch.extend(samples);
            }

            log::debug!(
                "🧵 Self-play batch {}..{} done on {} threads",
                next_game,
                next_game + width,
                width
            );
            next_game += width;
        }

        log::info!(
            "🎮 Self-play: {} games, {} samples (X {} / O {} / draw {})",
            stats.games,
            stats.samples,
            stats.x_wins,
            stats.o_wins,
            stats.draws
        );
        Ok((batch, stats))
    }
}
