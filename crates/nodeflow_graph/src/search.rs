// SPDX-License-Identifier: MIT OR Apache-2.0
//! Visited-set state for recursive graph walks.
//!
//! Graphs may contain legal loops, so every recursive walk threads a
//! [`RecursiveSearch`] through its calls. The first node entered becomes the
//! start node; entering a node twice reports it as already visited. The state
//! lives only as long as the walk that created it.

use crate::node::NodeId;
use std::collections::HashSet;

/// Transient state of one recursive walk
#[derive(Debug, Default)]
pub struct RecursiveSearch {
    start: Option<NodeId>,
    visited: HashSet<NodeId>,
}

impl RecursiveSearch {
    /// Start an empty walk
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter `node`. Returns `true` if it was already visited on this walk.
    pub fn begin(&mut self, node: NodeId) -> bool {
        if self.start.is_none() {
            self.start = Some(node);
        }
        !self.visited.insert(node)
    }

    /// Node the walk started on
    pub fn start(&self) -> Option<NodeId> {
        self.start
    }

    /// Whether `node` is the start node
    pub fn is_start(&self, node: NodeId) -> bool {
        self.start == Some(node)
    }

    /// Number of nodes entered so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_node_is_start() {
        let a = NodeId::new();
        let b = NodeId::new();
        let mut search = RecursiveSearch::new();

        assert!(!search.begin(a));
        assert!(!search.begin(b));
        assert!(search.is_start(a));
        assert!(search.begin(a));
        assert_eq!(search.visited_count(), 2);
    }
}
