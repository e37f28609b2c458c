// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and their knobs.
//!
//! The graph owns every node and every knob. Connections are stored on both
//! knobs involved: the input's `connection` and the output's `connections`.
//! Only the crate mutates those fields, always both halves together.
//!
//! The recursive queries here (`is_child_of`, `is_in_loop`,
//! `allows_loop_recursion`, `clear_calculation`) walk graphs that may already
//! contain legal loops, so each one threads a [`RecursiveSearch`].

use crate::error::{GraphError, Result};
use crate::evaluation::PendingPass;
use crate::knob::{self, Knob, KnobId, KnobMap};
use crate::node::{Node, NodeId};
use crate::search::RecursiveSearch;
use crate::types::{KnobData, TypeRegistry};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphId(pub Uuid);

impl GraphId {
    /// Create a new random graph ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GraphId {
    fn default() -> Self {
        Self::new()
    }
}

/// A node graph
#[derive(Debug)]
pub struct Graph {
    /// Unique graph ID
    pub id: GraphId,
    /// Graph name
    pub name: String,
    pub(crate) nodes: IndexMap<NodeId, Node>,
    pub(crate) knobs: KnobMap,
    pub(crate) current_node: Option<NodeId>,
    pub(crate) pending: Option<PendingPass>,
    pub(crate) compressed: bool,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GraphId::new(),
            name: name.into(),
            nodes: IndexMap::new(),
            knobs: KnobMap::new(),
            current_node: None,
            pending: None,
            compressed: false,
        }
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Get a node by ID, failing if it is not in the graph
    pub fn require_node(&self, node_id: NodeId) -> Result<&Node> {
        self.nodes.get(&node_id).ok_or(GraphError::NotInGraph(node_id))
    }

    /// Whether the node is a member of this graph
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Get all nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get a knob by ID
    pub fn knob(&self, knob_id: KnobId) -> Option<&Knob> {
        self.knobs.get(&knob_id)
    }

    /// Get a knob by ID, failing if it does not exist
    pub fn require_knob(&self, knob_id: KnobId) -> Result<&Knob> {
        self.knobs.get(&knob_id).ok_or(GraphError::KnobNotFound(knob_id))
    }

    /// Get all knobs
    pub fn knobs(&self) -> impl Iterator<Item = &Knob> {
        self.knobs.values()
    }

    /// Get the number of knobs
    pub fn knob_count(&self) -> usize {
        self.knobs.len()
    }

    /// Find a knob on a node by display name
    pub fn find_knob(&self, node_id: NodeId, name: &str) -> Option<KnobId> {
        let node = self.nodes.get(&node_id)?;
        node.knobs
            .iter()
            .copied()
            .find(|id| self.knobs.get(id).is_some_and(|k| k.name == name))
    }

    /// Number of connections in the graph
    pub fn connection_count(&self) -> usize {
        self.knobs.values().filter(|k| k.connection().is_some()).count()
    }

    /// Node currently being calculated by a transitioning pass
    pub fn current_node(&self) -> Option<NodeId> {
        self.current_node
    }

    /// Whether this is a compressed copy with empty input/output views
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Rebuild every node's input/output views from its knob list
    pub fn expand(&mut self) {
        let knobs = &self.knobs;
        for node in self.nodes.values_mut() {
            node.rebuild_views(|id| knobs.get(id).map(Knob::direction));
        }
        self.compressed = false;
    }

    /// Add a node together with the knobs it declared
    pub(crate) fn insert_node(&mut self, mut node: Node, knobs: Vec<Knob>) {
        node.knobs = knobs.iter().map(|k| k.id).collect();
        for knob in knobs {
            self.knobs.insert(knob.id, knob);
        }
        let store = &self.knobs;
        node.rebuild_views(|id| store.get(id).map(Knob::direction));
        self.nodes.insert(node.id, node);
    }

    /// Link both halves of a connection. The input must be unconnected.
    pub(crate) fn attach(&mut self, input: KnobId, output: KnobId) {
        if let Some(knob) = self.knobs.get_mut(&input) {
            knob.set_connection(Some(output));
        }
        if let Some(connections) = self.knobs.get_mut(&output).and_then(Knob::connections_mut) {
            connections.push(input);
        }
    }

    /// Unlink both halves of an input's connection, returning the old output
    pub(crate) fn detach(&mut self, input: KnobId) -> Option<KnobId> {
        let output = self.knobs.get(&input)?.connection()?;
        if let Some(connections) = self.knobs.get_mut(&output).and_then(Knob::connections_mut) {
            connections.retain(|id| *id != input);
        }
        if let Some(knob) = self.knobs.get_mut(&input) {
            knob.set_connection(None);
        }
        Some(output)
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    /// Read an output's value; an output that was never written reads as zero
    pub fn output_value<T: KnobData>(&self, output: KnobId) -> Result<T> {
        knob::output_value(&self.knobs, output)
    }

    /// Write an output's value
    pub fn set_output_value<T: KnobData>(&mut self, output: KnobId, value: T) -> Result<()> {
        knob::set_output_value(&mut self.knobs, output, value)
    }

    /// Read an input's value: the connected output's value, or the type default
    pub fn input_value<T: KnobData>(&self, types: &TypeRegistry, input: KnobId) -> Result<T> {
        knob::input_value(&self.knobs, types, input)
    }

    /// Write through an input to its connected output; no-op when unconnected
    pub fn set_input_value<T: KnobData>(&mut self, input: KnobId, value: T) -> Result<()> {
        knob::set_input_value(&mut self.knobs, input, value)
    }

    // ------------------------------------------------------------------
    // Connection validation
    // ------------------------------------------------------------------

    /// Check whether `output` can be connected to `input`.
    ///
    /// Rejects unknown knobs, wrong directions, connections within one node,
    /// the current connection, mismatched types and loops in which no node
    /// allows recursion. A compressed copy accepts no connections until it is
    /// expanded.
    pub fn can_apply_connection(&self, input: KnobId, output: KnobId) -> bool {
        if self.compressed {
            return false;
        }
        let (Some(input_knob), Some(output_knob)) = (self.knobs.get(&input), self.knobs.get(&output)) else {
            return false;
        };
        if !input_knob.is_input() || !output_knob.is_output() {
            return false;
        }
        if input_knob.owner == output_knob.owner
            || input_knob.connection() == Some(output)
            || input_knob.value_type != output_knob.value_type
        {
            return false;
        }

        if self.is_child_of(output_knob.owner, input_knob.owner)
            && !self.allows_loop_recursion(output_knob.owner, Some(input_knob.owner))
        {
            tracing::warn!("Cannot apply connection: Recursion detected!");
            return false;
        }
        true
    }

    // ------------------------------------------------------------------
    // Node queries
    // ------------------------------------------------------------------

    /// Owners of the outputs connected to this node's inputs, in input order
    pub fn upstream_nodes(&self, node_id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get(&node_id) else {
            return Vec::new();
        };
        node.inputs
            .iter()
            .filter_map(|id| self.knobs.get(id)?.connection())
            .filter_map(|output| self.knobs.get(&output).map(|k| k.owner))
            .collect()
    }

    /// Owners of the inputs connected to this node's outputs, without repeats
    pub fn downstream_nodes(&self, node_id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get(&node_id) else {
            return Vec::new();
        };
        let mut result = Vec::new();
        for output in &node.outputs {
            let Some(knob) = self.knobs.get(output) else {
                continue;
            };
            for input in knob.connections() {
                if let Some(owner) = self.knobs.get(input).map(|k| k.owner) {
                    if !result.contains(&owner) {
                        result.push(owner);
                    }
                }
            }
        }
        result
    }

    /// Every input is connected and its output holds a value
    pub fn all_inputs_ready(&self, node_id: NodeId) -> bool {
        self.inputs_of(node_id).all(|input| {
            input
                .connection()
                .and_then(|output| self.knobs.get(&output))
                .is_some_and(|output| !output.is_value_null())
        })
    }

    /// Some input is unconnected
    pub fn has_unassigned_inputs(&self, node_id: NodeId) -> bool {
        self.inputs_of(node_id).any(|input| input.connection().is_none())
    }

    /// Every connected upstream node is calculated
    pub fn descendants_calculated(&self, node_id: NodeId) -> bool {
        self.upstream_nodes(node_id)
            .iter()
            .all(|id| self.nodes.get(id).is_some_and(|n| n.calculated))
    }

    /// No input is connected, so the node is a source of the graph
    pub fn is_input(&self, node_id: NodeId) -> bool {
        self.inputs_of(node_id).all(|input| input.connection().is_none())
    }

    fn inputs_of(&self, node_id: NodeId) -> impl Iterator<Item = &Knob> + '_ {
        self.nodes
            .get(&node_id)
            .into_iter()
            .flat_map(|node| node.inputs.iter())
            .filter_map(|id| self.knobs.get(id))
    }

    /// Whether `other` is reachable upstream of `node_id`
    pub fn is_child_of(&self, node_id: NodeId, other: NodeId) -> bool {
        self.is_child_of_inner(node_id, other, &mut RecursiveSearch::new())
    }

    fn is_child_of_inner(&self, node_id: NodeId, other: NodeId, search: &mut RecursiveSearch) -> bool {
        if other == node_id {
            return false;
        }
        if search.begin(node_id) {
            return false;
        }
        for parent in self.upstream_nodes(node_id) {
            if search.is_start(parent) {
                continue;
            }
            if parent == other || self.is_child_of_inner(parent, other, search) {
                return true;
            }
        }
        false
    }

    /// Whether `node_id` is reachable from itself upstream
    pub fn is_in_loop(&self, node_id: NodeId) -> bool {
        self.is_in_loop_inner(node_id, &mut RecursiveSearch::new())
    }

    fn is_in_loop_inner(&self, node_id: NodeId, search: &mut RecursiveSearch) -> bool {
        if search.begin(node_id) {
            return search.is_start(node_id);
        }
        self.upstream_nodes(node_id)
            .into_iter()
            .any(|parent| self.is_in_loop_inner(parent, search))
    }

    /// Whether the loop to be closed from `node_id` back to `other` contains a
    /// node that allows recursion. Only meaningful once `is_child_of` holds.
    pub fn allows_loop_recursion(&self, node_id: NodeId, other: Option<NodeId>) -> bool {
        self.allows_loop_recursion_inner(node_id, other, &mut RecursiveSearch::new())
    }

    fn allows_loop_recursion_inner(
        &self,
        node_id: NodeId,
        other: Option<NodeId>,
        search: &mut RecursiveSearch,
    ) -> bool {
        if self.nodes.get(&node_id).is_some_and(Node::allows_recursion) {
            return true;
        }
        if other.is_none() {
            return false;
        }
        if search.begin(node_id) {
            return false;
        }
        for parent in self.upstream_nodes(node_id) {
            if search.is_start(parent) {
                continue;
            }
            if self.allows_loop_recursion_inner(parent, other, search) {
                return true;
            }
        }
        false
    }

    /// Mark this node and everything downstream as not calculated
    pub fn clear_calculation(&mut self, node_id: NodeId) {
        let mut search = RecursiveSearch::new();
        self.clear_calculation_inner(node_id, &mut search);
    }

    fn clear_calculation_inner(&mut self, node_id: NodeId, search: &mut RecursiveSearch) {
        if search.begin(node_id) {
            return;
        }
        match self.nodes.get_mut(&node_id) {
            Some(node) => node.calculated = false,
            None => return,
        }
        for child in self.downstream_nodes(node_id) {
            self.clear_calculation_inner(child, search);
        }
    }

    // ------------------------------------------------------------------
    // Invariants
    // ------------------------------------------------------------------

    /// Verify knob ownership, view membership and that both halves of every
    /// connection agree
    pub fn check_consistency(&self) -> Result<()> {
        let corrupt = |msg: String| -> Result<()> { Err(GraphError::CorruptDocument(msg)) };

        for node in self.nodes.values() {
            for id in &node.knobs {
                match self.knobs.get(id) {
                    Some(knob) if knob.owner == node.id => {}
                    Some(_) => return corrupt(format!("knob {id:?} listed on a node that does not own it")),
                    None => return corrupt(format!("node {:?} lists missing knob {id:?}", node.id)),
                }
            }
            for id in node.inputs.iter().chain(&node.outputs) {
                if node.knobs.iter().filter(|k| *k == id).count() != 1 {
                    return corrupt(format!("view entry {id:?} not in the knob list exactly once"));
                }
            }
        }

        for knob in self.knobs.values() {
            let Some(owner) = self.nodes.get(&knob.owner) else {
                return corrupt(format!("knob {:?} owned by a node outside the graph", knob.id));
            };
            if !owner.knobs.contains(&knob.id) {
                return corrupt(format!("knob {:?} missing from its owner's list", knob.id));
            }
            if let Some(output) = knob.connection() {
                let listed = self
                    .knobs
                    .get(&output)
                    .is_some_and(|o| o.connections().contains(&knob.id));
                if !listed {
                    return corrupt(format!("input {:?} not listed by its output", knob.id));
                }
            }
            for input in knob.connections() {
                if self.knobs.get(input).and_then(Knob::connection) != Some(knob.id) {
                    return corrupt(format!("output {:?} lists an input that does not point back", knob.id));
                }
            }
        }
        Ok(())
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("New Canvas")
    }
}
