// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor context and the operations that mutate a graph.
//!
//! [`NodeEditor`] bundles everything a mutation needs besides the graph
//! itself: the connection type registry, the node catalog, the observer set
//! and the configuration. Every operation takes the graph it acts on
//! explicitly, so one editor can serve any number of graphs.

use crate::callbacks::Callbacks;
use crate::catalog::NodeCatalog;
use crate::config::{EditorConfig, RecalculationMode};
use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::knob::KnobId;
use crate::node::{Node, NodeBuilder, NodeId};
use crate::types::TypeRegistry;

/// Editor context shared by all graph operations
#[derive(Debug)]
pub struct NodeEditor {
    /// Connection types
    pub types: TypeRegistry,
    /// Node variants
    pub catalog: NodeCatalog,
    /// Event observers
    pub callbacks: Callbacks,
    /// Configuration
    pub config: EditorConfig,
}

impl NodeEditor {
    /// Create an editor context
    pub fn new(types: TypeRegistry, catalog: NodeCatalog, config: EditorConfig) -> Self {
        Self {
            types,
            catalog,
            callbacks: Callbacks::new(),
            config,
        }
    }

    /// Notify observers that the editor is ready
    pub fn start_up(&self) {
        tracing::info!(
            "Node editor started with {} connection types and {} node types",
            self.types.types().count(),
            self.catalog.types().count()
        );
        self.callbacks.issue(|o| o.on_editor_start_up());
    }

    /// Create an empty graph
    pub fn new_graph(&self, name: impl Into<String>) -> Graph {
        Graph::new(name)
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Create a node of a catalog type at `position`.
    ///
    /// The variant declares its knobs, the node joins the graph and is
    /// calculated once, then observers are notified.
    pub fn create_node(&self, graph: &mut Graph, type_id: &str, position: [f32; 2]) -> Result<NodeId> {
        let info = self.catalog.resolve(type_id)?;
        let mut behavior = info.instantiate();
        let id = NodeId::new();

        let mut builder = NodeBuilder::new(id, &info.name, &self.types);
        behavior.create(&mut builder)?;

        let mut node = Node::new(id, type_id, behavior);
        node.name = builder.name;
        node.size = builder.size;
        node.position = position;
        // Inserted before the first calculation so `calculate` reads the node's knobs from the graph
        graph.insert_node(node, builder.knobs);
        graph.calculate_node(&self.types, id);
        tracing::debug!("Created node {:?} of type {}", id, type_id);
        self.callbacks.issue(|o| o.on_add_node(&*graph, id));
        Ok(id)
    }

    /// Delete a node, severing every connection it takes part in.
    ///
    /// Fails without touching the graph if the node is not a member.
    pub fn delete_node(&self, graph: &mut Graph, node_id: NodeId) -> Result<()> {
        if !graph.contains_node(node_id) {
            return Err(GraphError::NotInGraph(node_id));
        }
        self.callbacks.issue(|o| o.on_delete_node(&*graph, node_id));

        let Some(mut node) = graph.nodes.shift_remove(&node_id) else {
            return Err(GraphError::NotInGraph(node_id));
        };
        node.behavior.on_delete();
        if graph.current_node == Some(node_id) {
            graph.current_node = None;
        }

        // Walk the full knob list so compressed copies are handled too
        let mut affected = Vec::new();
        for knob_id in &node.knobs {
            let Some(knob) = graph.knob(*knob_id) else {
                continue;
            };
            if knob.is_output() {
                for input in knob.connections().to_vec() {
                    self.callbacks.issue(|o| o.on_remove_connection(&*graph, input));
                    graph.detach(input);
                    if let Some(owner) = graph.knob(input).map(|k| k.owner) {
                        if !affected.contains(&owner) {
                            affected.push(owner);
                        }
                    }
                }
            } else if knob.connection().is_some() {
                self.callbacks.issue(|o| o.on_remove_connection(&*graph, *knob_id));
                graph.detach(*knob_id);
            }
        }
        for knob_id in &node.knobs {
            graph.knobs.shift_remove(knob_id);
        }
        tracing::debug!("Deleted node {} ({} knobs)", node.name, node.knobs.len());

        for owner in affected {
            self.recalculate_from(graph, owner);
        }
        Ok(())
    }

    /// Move a node
    pub fn move_node(&self, graph: &mut Graph, node_id: NodeId, position: [f32; 2]) -> Result<()> {
        let node = graph.node_mut(node_id).ok_or(GraphError::NotInGraph(node_id))?;
        node.position = position;
        self.callbacks.issue(|o| o.on_move_node(&*graph, node_id));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------

    /// Check whether `output` can be connected to `input`
    pub fn can_apply_connection(&self, graph: &Graph, input: KnobId, output: KnobId) -> bool {
        graph.can_apply_connection(input, output)
    }

    /// Connect `output` to `input`, replacing the input's current connection.
    ///
    /// Callers are expected to have checked
    /// [`can_apply_connection`](Self::can_apply_connection) first.
    pub fn apply_connection(&self, graph: &mut Graph, input: KnobId, output: KnobId) -> Result<()> {
        let input_knob = graph.require_knob(input)?;
        if !input_knob.is_input() {
            return Err(GraphError::WrongKnobDirection(input));
        }
        let input_owner = input_knob.owner;
        let had_connection = input_knob.connection().is_some();
        let output_knob = graph.require_knob(output)?;
        if !output_knob.is_output() {
            return Err(GraphError::WrongKnobDirection(output));
        }
        let output_owner = output_knob.owner;

        if had_connection {
            self.callbacks.issue(|o| o.on_remove_connection(&*graph, input));
            graph.detach(input);
        }
        graph.attach(input, output);
        tracing::debug!("Connected {:?} -> {:?}", output, input);

        self.recalculate_from(graph, input_owner);
        if let Some(node) = graph.node_mut(output_owner) {
            node.behavior.on_add_output_connection(output);
        }
        if let Some(node) = graph.node_mut(input_owner) {
            node.behavior.on_add_input_connection(input);
        }
        self.callbacks.issue(|o| o.on_add_connection(&*graph, input));
        Ok(())
    }

    /// Connect if allowed. Returns whether the connection was made.
    pub fn try_connect(&self, graph: &mut Graph, input: KnobId, output: KnobId) -> Result<bool> {
        if !graph.can_apply_connection(input, output) {
            return Ok(false);
        }
        self.apply_connection(graph, input, output)?;
        Ok(true)
    }

    /// Connect output `output_index` of `from` to input `input_index` of `to`,
    /// if allowed. Returns whether the connection was made.
    pub fn connect_nodes(
        &self,
        graph: &mut Graph,
        from: NodeId,
        output_index: usize,
        to: NodeId,
        input_index: usize,
    ) -> Result<bool> {
        let output = graph
            .require_node(from)?
            .output(output_index)
            .ok_or(GraphError::KnobIndexOutOfRange {
                node: from,
                index: output_index,
            })?;
        let input = graph
            .require_node(to)?
            .input(input_index)
            .ok_or(GraphError::KnobIndexOutOfRange {
                node: to,
                index: input_index,
            })?;
        self.try_connect(graph, input, output)
    }

    /// Disconnect an input. No-op when it is not connected.
    pub fn remove_connection(&self, graph: &mut Graph, input: KnobId) -> Result<()> {
        let knob = graph.require_knob(input)?;
        if knob.connection().is_none() {
            return Ok(());
        }
        let owner = knob.owner;

        self.callbacks.issue(|o| o.on_remove_connection(&*graph, input));
        graph.detach(input);
        tracing::debug!("Disconnected {:?}", input);
        self.recalculate_from(graph, owner);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Recalculation
    // ------------------------------------------------------------------

    /// Recalculate the whole graph from its source nodes
    pub fn recalculate_all(&self, graph: &mut Graph) {
        graph.schedule_all();
        self.run_if_immediate(graph);
    }

    /// Recalculate `node_id` and everything depending on it
    pub fn recalculate_from(&self, graph: &mut Graph, node_id: NodeId) {
        graph.schedule_from(node_id);
        self.run_if_immediate(graph);
    }

    /// Advance a transitioning pass by `steps_per_tick` calculations.
    /// Returns the number of nodes calculated.
    pub fn step(&self, graph: &mut Graph) -> usize {
        graph.run_pending(&self.types, Some(self.config.steps_per_tick.max(1)))
    }

    /// Whether `graph` has a pass pending
    pub fn is_transitioning(&self, graph: &Graph) -> bool {
        graph.is_transitioning()
    }

    /// Cancel the pending pass of `graph`
    pub fn stop_transitioning(&self, graph: &mut Graph) {
        graph.stop_transitioning();
    }

    fn run_if_immediate(&self, graph: &mut Graph) {
        if self.config.recalculation == RecalculationMode::Immediate {
            graph.run_pending(&self.types, None);
        }
    }
}

impl Default for NodeEditor {
    fn default() -> Self {
        Self::new(
            TypeRegistry::with_builtin_types(),
            NodeCatalog::with_builtin_nodes(),
            EditorConfig::default(),
        )
    }
}
