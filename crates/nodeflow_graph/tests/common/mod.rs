// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared fixtures for integration tests.

#![allow(dead_code)]

use nodeflow_graph::nodes::{AllAroundNode, FloatValueNode, RelayNode};
use nodeflow_graph::{Graph, KnobId, NodeEditor, NodeId};

/// Install a test subscriber honoring `RUST_LOG`. Repeated calls are no-ops.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Editor with the built-in types and nodes
pub fn editor() -> NodeEditor {
    init_logging();
    NodeEditor::default()
}

/// Add a float source emitting `value`
pub fn float_source(editor: &NodeEditor, graph: &mut Graph, value: f32) -> NodeId {
    let id = editor
        .create_node(graph, FloatValueNode::TYPE_ID, [0.0, 0.0])
        .unwrap();
    FloatValueNode::set(graph, id, value).unwrap();
    id
}

/// Add a pass-through node that allows recursion
pub fn all_around(editor: &NodeEditor, graph: &mut Graph) -> NodeId {
    editor
        .create_node(graph, AllAroundNode::TYPE_ID, [100.0, 0.0])
        .unwrap()
}

/// Add a relay node, which does not allow recursion
pub fn relay(editor: &NodeEditor, graph: &mut Graph) -> NodeId {
    editor
        .create_node(graph, RelayNode::TYPE_ID, [100.0, 0.0])
        .unwrap()
}

/// Output `index` of `node`
pub fn output(graph: &Graph, node: NodeId, index: usize) -> KnobId {
    graph.node(node).unwrap().output(index).unwrap()
}

/// Input `index` of `node`
pub fn input(graph: &Graph, node: NodeId, index: usize) -> KnobId {
    graph.node(node).unwrap().input(index).unwrap()
}

/// Every input's connection is listed by its output and the reverse
pub fn assert_connections_consistent(graph: &Graph) {
    for knob in graph.knobs() {
        if let Some(output) = knob.connection() {
            assert!(graph.knob(output).unwrap().connections().contains(&knob.id));
        }
        for input in knob.connections() {
            assert_eq!(graph.knob(*input).unwrap().connection(), Some(knob.id));
        }
    }
    graph.check_consistency().unwrap();
}
