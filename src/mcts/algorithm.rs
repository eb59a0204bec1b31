//! MCTS search driver.
//!
//! One call runs a full search from a root position:
//! 1. Expand the root from one evaluation (not counted as a simulation), then
//!    mix in Dirichlet noise when enabled
//! 2. Per simulation: select a leaf by PUCT, evaluate it (terminal value or
//!    network), expand it, backpropagate the value with alternating sign
//! 3. Return the root visit distribution

use rand::Rng;

use crate::game::Game;
use crate::mcts::hyperparameters::MCTSHyperparameters;
use crate::mcts::node::NodeId;
use crate::mcts::selection::{dirichlet_noise, masked_priors};
use crate::mcts::tree::SearchTree;
use crate::neural::evaluator::PolicyValueEvaluator;
use crate::{Result, ZeroError};

/// Outcome of one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Root visit distribution over the action space; zeros at a terminal root
    pub policy: Vec<f32>,
    /// Mean backed-up value from the point of view of the player to move at the root
    pub root_value: f32,
    /// Simulations actually run
    pub simulations: u32,
}

/// Runs `params.num_simulations` simulations from `root_state`.
pub fn search<G, E, R>(
    root_state: &G,
    evaluator: &E,
    params: &MCTSHyperparameters,
    rng: &mut R,
) -> Result<SearchResult>
where
    G: Game,
    E: PolicyValueEvaluator + ?Sized,
    R: Rng + ?Sized,
{
    params.validate().map_err(ZeroError::Config)?;

    if root_state.is_terminal() {
        return Ok(SearchResult {
            policy: vec![0.0; G::ACTION_SIZE],
            root_value: root_state.value_and_terminated().0,
            simulations: 0,
        });
    }

    let mut tree = SearchTree::new(root_state.clone());
    let c = params.exploration_constant;

    let root = tree.root();
    expand_with_model(&mut tree, root, evaluator)?;

    if params.dirichlet_epsilon > 0.0 {
        let n = tree.get(root).children.len();
        let noise = dirichlet_noise(n, params.dirichlet_alpha, rng)?;
        tree.add_root_noise(&noise, params.dirichlet_epsilon);
    }

    for _ in 0..params.num_simulations {
        let leaf = tree.select_leaf(c);
        let (terminal_value, terminated) = tree.get(leaf).state.value_and_terminated();

        // Values are from the leaf's player to move; the node stores the
        // view of the player who moved into it.
        let value = if terminated {
            -terminal_value
        } else {
            -expand_with_model(&mut tree, leaf, evaluator)?
        };
        tree.backpropagate(leaf, value);
    }

    let stats = tree.stats();
    log::trace!(
        "🌲 search done: {} nodes, depth {}, {} root visits",
        stats.total_nodes,
        stats.max_depth,
        stats.root_visits
    );

    Ok(SearchResult {
        policy: tree.visit_distribution(),
        root_value: -tree.get(root).mean_value(),
        simulations: params.num_simulations,
    })
}

/// Evaluates `id`, expands it with masked priors and returns the network
/// value (player-to-move perspective).
fn expand_with_model<G, E>(tree: &mut SearchTree<G>, id: NodeId, evaluator: &E) -> Result<f32>
where
    G: Game,
    E: PolicyValueEvaluator + ?Sized,
{
    let state = &tree.get(id).state;
    let legal_moves = state.legal_moves();
    let prediction = evaluator.predict(&state.encode())?;

    if prediction.policy.len() != G::ACTION_SIZE {
        return Err(ZeroError::Network(format!(
            "policy has {} entries, {} expects {}",
            prediction.policy.len(),
            G::NAME,
            G::ACTION_SIZE
        )));
    }
    if !prediction.value.is_finite() {
        return Err(ZeroError::Network(format!(
            "non-finite value {} from evaluator",
            prediction.value
        )));
    }

    let priors = masked_priors(&prediction.policy, &legal_moves)?;
    let children: Vec<(usize, f32)> = legal_moves.into_iter().zip(priors).collect();
    tree.expand(id, &children);

    Ok(prediction.value.clamp(-1.0, 1.0))
}
