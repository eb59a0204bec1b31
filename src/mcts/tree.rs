//! Arena-backed search tree.
//!
//! Nodes live in one contiguous `Vec` and refer to each other by [`NodeId`].
//! The arena owns every node; parent links are plain indices. Dropping the
//! tree drops the vector, so teardown never recurses however deep the game is.

use crate::game::Game;
use crate::mcts::node::{Node, NodeId};
use crate::mcts::selection::ucb_score;

/// Shape summary for debug logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    pub max_depth: usize,
}

#[derive(Debug)]
pub struct SearchTree<G: Game> {
    nodes: Vec<Node<G>>,
}

impl<G: Game> SearchTree<G> {
    pub fn new(root_state: G) -> Self {
        Self {
            nodes: vec![Node::new_root(root_state)],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &Node<G> {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<G> {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Child of `id` with the highest PUCT score. Ties keep the first child.
    ///
    /// # Panics
    /// If `id` has not been expanded.
    pub fn select_child(&self, id: NodeId, exploration_constant: f32) -> NodeId {
        let node = self.get(id);
        assert!(
            node.is_expanded(),
            "select_child called on unexpanded node {:?}",
            id
        );

        let parent_sqrt = (node.visit_count as f32).sqrt();
        let mut best = node.children[0];
        let mut best_score = f32::NEG_INFINITY;
        for &child_id in &node.children {
            let score = ucb_score(parent_sqrt, self.get(child_id), exploration_constant);
            if score > best_score {
                best_score = score;
                best = child_id;
            }
        }
        best
    }

    /// Descends from the root until it reaches a node without children.
    pub fn select_leaf(&self, exploration_constant: f32) -> NodeId {
        let mut current = self.root();
        while self.get(current).is_expanded() {
            current = self.select_child(current, exploration_constant);
        }
        current
    }

    /// Adds one child per `(action, prior)` pair.
    ///
    /// # Panics
    /// If the node already has children or more than `G::ACTION_SIZE` are supplied.
    pub fn expand(&mut self, id: NodeId, priors: &[(usize, f32)]) {
        assert!(
            !self.get(id).is_expanded(),
            "node {:?} expanded twice",
            id
        );
        assert!(
            priors.len() <= G::ACTION_SIZE,
            "{} children exceed the action space of {}",
            priors.len(),
            G::ACTION_SIZE
        );

        let parent_state = self.get(id).state.clone();
        let mut children = Vec::with_capacity(priors.len());
        for &(action, prior) in priors {
            let child_id = NodeId(self.nodes.len() as u32);
            let state = parent_state.apply_move(action);
            self.nodes.push(Node::new_child(state, id, action, prior));
            children.push(child_id);
        }
        self.get_mut(id).children = children;
    }

    /// Walks from `id` up to the root inclusive, adding `value` and flipping
    /// its sign at every level.
    pub fn backpropagate(&mut self, id: NodeId, value: f32) {
        let mut current = Some(id);
        let mut value = value;
        while let Some(node_id) = current {
            let node = self.get_mut(node_id);
            node.value_sum += value;
            node.visit_count += 1;
            value = -value;
            current = node.parent;
        }
    }

    /// Mixes `noise` into the root priors:
    /// `prior' = (1 - epsilon) * prior + epsilon * noise`, then renormalises.
    ///
    /// `noise` is indexed by root child order.
    pub fn add_root_noise(&mut self, noise: &[f32], epsilon: f32) {
        let children = self.get(self.root()).children.clone();
        if children.is_empty() || noise.len() != children.len() {
            log::warn!(
                "⚠️ Skipping root noise: {} children, {} noise samples",
                children.len(),
                noise.len()
            );
            return;
        }

        let mut total = 0.0;
        for (&child_id, &eta) in children.iter().zip(noise) {
            let child = self.get_mut(child_id);
            child.prior = (1.0 - epsilon) * child.prior + epsilon * eta;
            total += child.prior;
        }
        if total > 0.0 && total.is_finite() {
            for &child_id in &children {
                self.get_mut(child_id).prior /= total;
            }
        }
    }

    /// Root child visit counts normalised over the action space.
    ///
    /// All zeros when the root has no children or none were visited.
    pub fn visit_distribution(&self) -> Vec<f32> {
        let mut policy = vec![0.0f32; G::ACTION_SIZE];
        let root = self.get(self.root());
        let total: u32 = root
            .children
            .iter()
            .map(|&c| self.get(c).visit_count)
            .sum();
        if total == 0 {
            return policy;
        }

        for &child_id in &root.children {
            let child = self.get(child_id);
            if let Some(action) = child.action {
                policy[action] = child.visit_count as f32 / total as f32;
            }
        }
        policy
    }

    pub fn stats(&self) -> TreeStats {
        let mut max_depth = 0;
        let mut stack = vec![(self.root(), 0usize)];
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            for &child in &self.get(id).children {
                stack.push((child, depth + 1));
            }
        }

        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: self.get(self.root()).visit_count,
            max_depth,
        }
    }
}
