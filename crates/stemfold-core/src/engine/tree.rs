use super::env::Action;
use slotmap::{SlotMap, new_key_type};
use std::collections::HashMap;

new_key_type! {
    /// A unique identifier for a node in a [`SearchTree`].
    pub struct NodeId;
}

/// Visit statistics and expansion data of one search node.
#[derive(Debug, Clone, Default)]
pub struct SearchNode {
    visits: u32,
    value_sum: f64,
    mean_value: f64,
    priors: Vec<(Action, f64)>,
    children: HashMap<Action, NodeId>,
    expanded: bool,
    terminal: bool,
}

impl SearchNode {
    pub fn visits(&self) -> u32 {
        self.visits
    }

    pub fn value_sum(&self) -> f64 {
        self.value_sum
    }

    /// `W / N`, or 0 for an unvisited node.
    pub fn mean_value(&self) -> f64 {
        self.mean_value
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn priors(&self) -> &[(Action, f64)] {
        &self.priors
    }

    pub fn prior(&self, action: Action) -> f64 {
        self.priors
            .iter()
            .find(|(a, _)| *a == action)
            .map_or(0.0, |(_, p)| *p)
    }

    pub fn child(&self, action: Action) -> Option<NodeId> {
        self.children.get(&action).copied()
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub(crate) fn expand(&mut self, actions: &[Action], priors: Vec<f64>) {
        debug_assert_eq!(actions.len(), priors.len());
        self.priors = actions.iter().copied().zip(priors).collect();
        self.expanded = true;
    }

    pub(crate) fn mark_terminal(&mut self) {
        self.terminal = true;
    }

    pub(crate) fn record(&mut self, value: f64) {
        self.visits += 1;
        self.value_sum += value;
        self.mean_value = self.value_sum / self.visits as f64;
    }
}

/// Arena of search nodes for a single search call.
#[derive(Debug, Clone)]
pub struct SearchTree {
    nodes: SlotMap<NodeId, SearchNode>,
    root: NodeId,
}

impl Default for SearchTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchTree {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(SearchNode::default());
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&SearchNode> {
        self.nodes.get(id)
    }

    pub fn root_node(&self) -> &SearchNode {
        &self.nodes[self.root]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut SearchNode {
        &mut self.nodes[id]
    }

    /// Returns the child reached by `action`, creating an empty one first if
    /// needed.
    pub(crate) fn child_or_insert(&mut self, parent: NodeId, action: Action) -> NodeId {
        if let Some(child) = self.nodes[parent].child(action) {
            return child;
        }
        let child = self.nodes.insert(SearchNode::default());
        self.nodes[parent].children.insert(action, child);
        child
    }

    /// Adds `value` to every node on `path`, root first.
    pub(crate) fn backup(&mut self, path: &[NodeId], value: f64) {
        for &id in path {
            self.nodes[id].record(value);
        }
    }
}
