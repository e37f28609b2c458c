// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph evaluation and incremental recalculation.
//!
//! A recalculation pass is a queue of nodes to calculate. Seeds are either
//! every source node (a full recalculation) or a single node whose inputs
//! changed. Each successful calculation enqueues the node's dependents, and a
//! dependent is only calculated once everything it reads from is calculated.
//! A node is calculated at most once per pass, so a pass over `k` nodes ends
//! after at most `k` calculations even when the graph contains legal loops.
//! A seed whose upstream nodes are still waiting in the same pass is deferred
//! until they are calculated.
//!
//! The pass is stored on the graph. It either runs to completion inside the
//! triggering call or, while transitioning, is advanced a few nodes at a time
//! by the caller. Seeding a graph that already has a pass pending extends that
//! pass instead of starting a second one.

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::knob::{self, KnobId, KnobMap};
use crate::node::{Node, NodeId};
use crate::types::{KnobData, TypeRegistry};
use std::collections::VecDeque;

/// Node I/O available to [`NodeBehavior::calculate`](crate::node::NodeBehavior::calculate)
pub struct Calculation<'a> {
    node: NodeId,
    inputs: &'a [KnobId],
    outputs: &'a [KnobId],
    knobs: &'a mut KnobMap,
    types: &'a TypeRegistry,
}

impl<'a> Calculation<'a> {
    /// Node being calculated
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Number of inputs
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Number of outputs
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Knob ID of the input at `index`
    pub fn input_knob(&self, index: usize) -> Result<KnobId> {
        self.inputs.get(index).copied().ok_or(GraphError::KnobIndexOutOfRange {
            node: self.node,
            index,
        })
    }

    /// Knob ID of the output at `index`
    pub fn output_knob(&self, index: usize) -> Result<KnobId> {
        self.outputs.get(index).copied().ok_or(GraphError::KnobIndexOutOfRange {
            node: self.node,
            index,
        })
    }

    /// Value of the input at `index`, or its type default when unconnected
    pub fn input<T: KnobData>(&self, index: usize) -> Result<T> {
        knob::input_value(self.knobs, self.types, self.input_knob(index)?)
    }

    /// Whether the input at `index` is connected
    pub fn input_connected(&self, index: usize) -> bool {
        self.inputs
            .get(index)
            .and_then(|id| self.knobs.get(id))
            .is_some_and(|k| k.connection().is_some())
    }

    /// Value currently held by the output at `index`
    pub fn output<T: KnobData>(&self, index: usize) -> Result<T> {
        knob::output_value(self.knobs, self.output_knob(index)?)
    }

    /// Write the output at `index`
    pub fn set_output<T: KnobData>(&mut self, index: usize, value: T) -> Result<()> {
        let id = self.output_knob(index)?;
        knob::set_output_value(self.knobs, id, value)
    }

    /// Every input is connected to an output holding a value
    pub fn all_inputs_ready(&self) -> bool {
        self.inputs.iter().all(|id| {
            self.knobs
                .get(id)
                .and_then(|k| k.connection())
                .and_then(|output| self.knobs.get(&output))
                .is_some_and(|output| !output.is_value_null())
        })
    }

    /// Some input is unconnected
    pub fn has_unassigned_inputs(&self) -> bool {
        self.inputs
            .iter()
            .any(|id| self.knobs.get(id).is_some_and(|k| k.connection().is_none()))
    }
}

/// Queued entry of a pass
#[derive(Debug, Clone, Copy)]
struct Scheduled {
    node: NodeId,
    // Seeds are calculated without waiting for their upstream nodes
    forced: bool,
}

/// Work remaining in a recalculation pass
#[derive(Debug, Default)]
pub struct PendingPass {
    queue: VecDeque<Scheduled>,
}

impl PendingPass {
    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Graph {
    /// Calculate one node. Returns whether it succeeded.
    pub fn calculate_node(&mut self, types: &TypeRegistry, node_id: NodeId) -> bool {
        let Graph { nodes, knobs, .. } = self;
        let Some(node) = nodes.get_mut(&node_id) else {
            return false;
        };
        let Node {
            behavior,
            inputs,
            outputs,
            calculated,
            name,
            ..
        } = node;

        let mut calc = Calculation {
            node: node_id,
            inputs: inputs.as_slice(),
            outputs: outputs.as_slice(),
            knobs,
            types,
        };
        match behavior.calculate(&mut calc) {
            Ok(()) => {
                *calculated = true;
                tracing::trace!("Calculated node {}", name);
                true
            }
            Err(err) => {
                *calculated = false;
                tracing::debug!("Node {} did not calculate: {}", name, err);
                false
            }
        }
    }

    /// Whether a pass is pending
    pub fn is_transitioning(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of queued entries of the pending pass
    pub fn pending_len(&self) -> usize {
        self.pending.as_ref().map_or(0, PendingPass::len)
    }

    /// Drop the pending pass. Nodes keep whatever state they reached.
    pub fn stop_transitioning(&mut self) {
        if let Some(pass) = self.pending.take() {
            tracing::debug!("Stopped transitioning with {} queued nodes", pass.len());
        }
        self.current_node = None;
    }

    /// Mark every node dirty and seed a pass from every source node
    pub(crate) fn schedule_all(&mut self) {
        for node in self.nodes.values_mut() {
            node.calculated = false;
        }
        let sources: Vec<NodeId> = self.node_ids().filter(|id| self.is_input(*id)).collect();
        let pass = self.pending.get_or_insert_with(PendingPass::default);
        pass.queue.extend(sources.into_iter().map(|node| Scheduled { node, forced: true }));
    }

    /// Mark `node_id` and its dependents dirty and seed a pass from it
    pub(crate) fn schedule_from(&mut self, node_id: NodeId) {
        if !self.contains_node(node_id) {
            return;
        }
        self.clear_calculation(node_id);
        self.pending
            .get_or_insert_with(PendingPass::default)
            .queue
            .push_back(Scheduled {
                node: node_id,
                forced: true,
            });
    }

    /// Advance the pending pass by at most `limit` node calculations, or to the
    /// end when `limit` is `None`. Returns the number of calculations made.
    pub(crate) fn run_pending(&mut self, types: &TypeRegistry, limit: Option<usize>) -> usize {
        let mut steps = 0;
        while limit.map_or(true, |limit| steps < limit) {
            let Some(entry) = self.pending.as_mut().and_then(|p| p.queue.pop_front()) else {
                break;
            };
            let Some(node) = self.nodes.get(&entry.node) else {
                continue;
            };
            if node.calculated {
                continue;
            }
            let ready = if entry.forced {
                !self.awaits_queued_upstream(entry.node)
            } else {
                self.upstream_ready(entry.node)
            };
            if !ready {
                // The upstream node re-queues this one once it is calculated
                tracing::trace!("Deferred node {}", node.name);
                continue;
            }
            let continues = node.continues_calculation();

            self.current_node = Some(entry.node);
            steps += 1;
            if self.calculate_node(types, entry.node) && continues {
                let ready: Vec<NodeId> = self
                    .downstream_nodes(entry.node)
                    .into_iter()
                    .filter(|id| self.nodes.get(id).is_some_and(|n| !n.calculated))
                    .collect();
                if let Some(pass) = self.pending.as_mut() {
                    pass.queue
                        .extend(ready.into_iter().map(|node| Scheduled { node, forced: false }));
                }
            }
        }

        if self.pending.as_ref().is_some_and(PendingPass::is_empty) {
            self.pending = None;
            self.current_node = None;
        }
        steps
    }

    /// Some dirty upstream node will still be calculated by the pending pass,
    /// either because it is queued or because a queued node feeds it.
    /// Feedback edges are ignored.
    fn awaits_queued_upstream(&self, node_id: NodeId) -> bool {
        let Some(pass) = &self.pending else {
            return false;
        };
        let queued: Vec<NodeId> = pass
            .queue
            .iter()
            .map(|e| e.node)
            .filter(|id| *id != node_id && self.nodes.get(id).is_some_and(|n| !n.calculated))
            .collect();
        self.upstream_nodes(node_id).into_iter().any(|parent| {
            self.nodes.get(&parent).is_some_and(|n| !n.calculated)
                && !self.is_child_of(parent, node_id)
                && queued
                    .iter()
                    .any(|q| *q == parent || self.is_child_of(parent, *q))
        })
    }

    /// Every upstream node is calculated, ignoring feedback edges that come
    /// back from this node's own dependents
    fn upstream_ready(&self, node_id: NodeId) -> bool {
        self.upstream_nodes(node_id).into_iter().all(|parent| {
            self.nodes.get(&parent).is_some_and(|n| n.calculated) || self.is_child_of(parent, node_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::editor::NodeEditor;
    use crate::nodes::{AddNode, FloatValueNode, RelayNode};

    #[test]
    fn test_full_pass_calculates_chain() {
        let editor = NodeEditor::default();
        let mut graph = editor.new_graph("Chain");
        let a = editor.create_node(&mut graph, FloatValueNode::TYPE_ID, [0.0, 0.0]).unwrap();
        let b = editor.create_node(&mut graph, FloatValueNode::TYPE_ID, [0.0, 0.0]).unwrap();
        let sum = editor.create_node(&mut graph, AddNode::TYPE_ID, [0.0, 0.0]).unwrap();

        FloatValueNode::set(&mut graph, a, 1.5).unwrap();
        FloatValueNode::set(&mut graph, b, 2.0).unwrap();
        editor.connect_nodes(&mut graph, a, 0, sum, 0).unwrap();
        editor.connect_nodes(&mut graph, b, 0, sum, 1).unwrap();

        editor.recalculate_all(&mut graph);
        assert!(graph.nodes().all(|n| n.is_calculated()));
        let out = graph.node(sum).unwrap().output(0).unwrap();
        assert_eq!(graph.output_value::<f32>(out).unwrap(), 3.5);
        assert!(!graph.is_transitioning());
    }

    #[test]
    fn test_relay_stops_propagation() {
        let editor = NodeEditor::default();
        let mut graph = editor.new_graph("Relay");
        let source = editor.create_node(&mut graph, FloatValueNode::TYPE_ID, [0.0, 0.0]).unwrap();
        let relay = editor.create_node(&mut graph, RelayNode::TYPE_ID, [0.0, 0.0]).unwrap();
        let tail = editor.create_node(&mut graph, RelayNode::TYPE_ID, [0.0, 0.0]).unwrap();
        editor.connect_nodes(&mut graph, source, 0, relay, 0).unwrap();
        editor.connect_nodes(&mut graph, relay, 0, tail, 0).unwrap();

        editor.recalculate_all(&mut graph);
        assert!(graph.node(source).unwrap().is_calculated());
        assert!(graph.node(relay).unwrap().is_calculated());
        assert!(!graph.node(tail).unwrap().is_calculated());
    }
}
