//! Search tree node stored in the [`SearchTree`](crate::mcts::tree::SearchTree) arena.

use crate::game::Game;

/// Index into the node arena. The root is always `NodeId(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One position in the search tree.
///
/// `value_sum` is accumulated from the point of view of the player who made
/// the move *into* this node, so a parent compares `Q(child)` directly.
#[derive(Debug, Clone)]
pub struct Node<G: Game> {
    pub state: G,

    /// Non-owning back link, `None` at the root
    pub parent: Option<NodeId>,

    /// Move that led here from the parent, `None` at the root
    pub action: Option<usize>,

    pub visit_count: u32,
    pub value_sum: f32,

    /// P(s, a) from the masked network policy (1.0 at the root)
    pub prior: f32,

    /// Empty until expanded
    pub children: Vec<NodeId>,
}

impl<G: Game> Node<G> {
    pub fn new_root(state: G) -> Self {
        Self {
            state,
            parent: None,
            action: None,
            visit_count: 0,
            value_sum: 0.0,
            prior: 1.0,
            children: Vec::new(),
        }
    }

    pub fn new_child(state: G, parent: NodeId, action: usize, prior: f32) -> Self {
        Self {
            state,
            parent: Some(parent),
            action: Some(action),
            visit_count: 0,
            value_sum: 0.0,
            prior,
            children: Vec::new(),
        }
    }

    /// Q = value_sum / visit_count, 0.0 when unvisited.
    #[inline]
    pub fn mean_value(&self) -> f32 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.value_sum / self.visit_count as f32
        }
    }

    #[inline]
    pub fn is_expanded(&self) -> bool {
        !self.children.is_empty()
    }
}
