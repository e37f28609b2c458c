// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connecting, disconnecting and deleting nodes.

mod common;

use common::*;
use nodeflow_graph::evaluation::Calculation;
use nodeflow_graph::nodes::AllAroundNode;
use nodeflow_graph::{
    ConnectionType, GraphError, NodeBehavior, NodeBuilder, NodeTypeInfo, Result, ValueType,
};

/// Source with a single Int output
#[derive(Debug, Clone, Default)]
struct IntSource;

impl NodeBehavior for IntSource {
    fn create(&mut self, node: &mut NodeBuilder<'_>) -> Result<()> {
        node.create_output("Count", "Int")?;
        Ok(())
    }

    fn calculate(&mut self, calc: &mut Calculation<'_>) -> Result<()> {
        calc.set_output(0, 7i32)
    }
}

#[test]
fn test_connections_stay_bidirectional() {
    let editor = editor();
    let mut graph = editor.new_graph("Bidirectional");
    let a = float_source(&editor, &mut graph, 1.0);
    let b = float_source(&editor, &mut graph, 2.0);
    let hub = all_around(&editor, &mut graph);
    let tail = all_around(&editor, &mut graph);

    for i in 0..4 {
        assert!(editor.connect_nodes(&mut graph, a, 0, hub, i).unwrap());
        assert_connections_consistent(&graph);
    }
    assert_eq!(graph.knob(output(&graph, a, 0)).unwrap().connections().len(), 4);

    // Rewire two inputs to another source
    assert!(editor.connect_nodes(&mut graph, b, 0, hub, 1).unwrap());
    assert!(editor.connect_nodes(&mut graph, b, 0, hub, 3).unwrap());
    assert_connections_consistent(&graph);
    assert_eq!(graph.knob(output(&graph, a, 0)).unwrap().connections().len(), 2);

    assert!(editor.connect_nodes(&mut graph, hub, 2, tail, 0).unwrap());
    let hub_in = input(&graph, hub, 0);
    editor.remove_connection(&mut graph, hub_in).unwrap();
    assert_connections_consistent(&graph);
    assert_eq!(graph.connection_count(), 4);

    let tail_in = input(&graph, tail, 0);
    let hub_out = output(&graph, hub, 2);
    assert!(!editor.try_connect(&mut graph, tail_in, hub_out).unwrap());
}

#[test]
fn test_type_mismatch_rejected_without_mutation() {
    let mut editor = editor();
    editor
        .catalog
        .register(NodeTypeInfo::new("int_source", "Int Source", || -> Box<dyn NodeBehavior> {
            Box::new(IntSource)
        }))
        .unwrap();
    let mut graph = editor.new_graph("Mismatch");
    let ints = editor.create_node(&mut graph, "int_source", [0.0, 0.0]).unwrap();
    let hub = all_around(&editor, &mut graph);

    let int_out = output(&graph, ints, 0);
    let float_in = input(&graph, hub, 0);
    assert!(!editor.can_apply_connection(&graph, float_in, int_out));
    assert!(!editor.try_connect(&mut graph, float_in, int_out).unwrap());
    assert!(!editor.connect_nodes(&mut graph, ints, 0, hub, 0).unwrap());

    assert_eq!(graph.connection_count(), 0);
    assert!(graph.knob(int_out).unwrap().connections().is_empty());
    assert_eq!(graph.knob(float_in).unwrap().connection(), None);
}

#[test]
fn test_registering_duplicate_type_key_fails() {
    let mut editor = editor();
    editor
        .types
        .register(ConnectionType::new("Weight", ValueType::Float))
        .unwrap();
    assert!(matches!(
        editor.types.register(ConnectionType::new("Weight", ValueType::Int)),
        Err(GraphError::DuplicateKey(_))
    ));
}

#[test]
fn test_direct_cycle_rejected() {
    let editor = editor();
    let mut graph = editor.new_graph("Cycle");
    let a = relay(&editor, &mut graph);
    let b = relay(&editor, &mut graph);

    assert!(editor.connect_nodes(&mut graph, a, 0, b, 0).unwrap());
    let a_in = input(&graph, a, 0);
    let b_out = output(&graph, b, 0);
    assert!(!editor.can_apply_connection(&graph, a_in, b_out));
    assert!(!editor.connect_nodes(&mut graph, b, 0, a, 0).unwrap());

    assert_eq!(graph.knob(a_in).unwrap().connection(), None);
    assert!(graph.knob(b_out).unwrap().connections().is_empty());
    assert_eq!(graph.connection_count(), 1);
}

#[test]
fn test_cycle_allowed_when_any_node_permits_recursion() {
    let editor = editor();
    let mut graph = editor.new_graph("Legal cycle");
    let a = relay(&editor, &mut graph);
    let hub = all_around(&editor, &mut graph);

    assert!(editor.connect_nodes(&mut graph, a, 0, hub, 0).unwrap());
    assert!(editor.connect_nodes(&mut graph, hub, 0, a, 0).unwrap());
    assert!(graph.is_in_loop(a));
    assert!(graph.is_in_loop(hub));
    assert_connections_consistent(&graph);
}

#[test]
fn test_cycle_allowed_when_permitting_node_is_mid_loop() {
    let editor = editor();
    let mut graph = editor.new_graph("Mid loop");
    let first = relay(&editor, &mut graph);
    let hub = all_around(&editor, &mut graph);
    let last = relay(&editor, &mut graph);

    assert!(editor.connect_nodes(&mut graph, first, 0, hub, 0).unwrap());
    assert!(editor.connect_nodes(&mut graph, hub, 0, last, 0).unwrap());
    assert!(!graph.allows_loop_recursion(last, None));
    assert!(graph.allows_loop_recursion(last, Some(first)));
    assert!(editor.connect_nodes(&mut graph, last, 0, first, 0).unwrap());
    assert!(graph.is_in_loop(first));
    assert_connections_consistent(&graph);
}

#[test]
fn test_cycle_allowed_when_only_input_side_permits_recursion() {
    let editor = editor();
    let mut graph = editor.new_graph("Input side");
    let hub = all_around(&editor, &mut graph);
    let gate = relay(&editor, &mut graph);

    assert!(editor.connect_nodes(&mut graph, hub, 0, gate, 0).unwrap());
    // The output's owner is a relay, the input's owner allows recursion
    assert!(editor.connect_nodes(&mut graph, gate, 0, hub, 1).unwrap());
    assert!(graph.is_in_loop(gate));
    assert_connections_consistent(&graph);
}

#[test]
fn test_cycle_of_relays_rejected() {
    let editor = editor();
    let mut graph = editor.new_graph("Relay ring");
    let nodes: Vec<_> = (0..3).map(|_| relay(&editor, &mut graph)).collect();
    assert!(editor.connect_nodes(&mut graph, nodes[0], 0, nodes[1], 0).unwrap());
    assert!(editor.connect_nodes(&mut graph, nodes[1], 0, nodes[2], 0).unwrap());

    assert!(!editor.connect_nodes(&mut graph, nodes[2], 0, nodes[0], 0).unwrap());
    assert_eq!(graph.connection_count(), 2);
    assert!(!graph.is_in_loop(nodes[0]));
}

#[test]
fn test_same_node_and_repeat_connections_rejected() {
    let editor = editor();
    let mut graph = editor.new_graph("Self");
    let hub = all_around(&editor, &mut graph);
    let source = float_source(&editor, &mut graph, 1.0);

    assert!(!editor.connect_nodes(&mut graph, hub, 0, hub, 1).unwrap());
    assert!(editor.connect_nodes(&mut graph, source, 0, hub, 1).unwrap());
    assert!(!editor.connect_nodes(&mut graph, source, 0, hub, 1).unwrap());
    assert!(matches!(
        editor.connect_nodes(&mut graph, source, 3, hub, 0),
        Err(GraphError::KnobIndexOutOfRange { index: 3, .. })
    ));
}

#[test]
fn test_delete_leaves_no_dangling_connections() {
    let editor = editor();
    let mut graph = editor.new_graph("Delete");
    let hub = all_around(&editor, &mut graph);
    let mut partners = Vec::new();
    for i in 0..4 {
        let source = float_source(&editor, &mut graph, i as f32);
        assert!(editor.connect_nodes(&mut graph, source, 0, hub, i).unwrap());
        let sink = relay(&editor, &mut graph);
        assert!(editor.connect_nodes(&mut graph, hub, i, sink, 0).unwrap());
        partners.push((output(&graph, source, 0), input(&graph, sink, 0)));
    }
    let hub_knobs = graph.node(hub).unwrap().knobs().to_vec();
    let knobs_before = graph.knob_count();
    assert_eq!(graph.connection_count(), 8);

    editor.delete_node(&mut graph, hub).unwrap();

    assert!(!graph.contains_node(hub));
    assert_eq!(graph.knob_count(), knobs_before - hub_knobs.len());
    assert!(hub_knobs.iter().all(|id| graph.knob(*id).is_none()));
    assert_eq!(graph.connection_count(), 0);
    for (source_out, sink_in) in partners {
        assert!(graph.knob(source_out).unwrap().connections().is_empty());
        assert_eq!(graph.knob(sink_in).unwrap().connection(), None);
    }
    assert_connections_consistent(&graph);
}

#[test]
fn test_delete_non_member_leaves_graph_untouched() {
    let editor = editor();
    let mut graph = editor.new_graph("Delete twice");
    let mut other = editor.new_graph("Other");
    let source = float_source(&editor, &mut graph, 1.0);
    let foreign = editor
        .create_node(&mut other, AllAroundNode::TYPE_ID, [0.0, 0.0])
        .unwrap();

    assert!(matches!(
        editor.delete_node(&mut graph, foreign),
        Err(GraphError::NotInGraph(_))
    ));
    assert_eq!(graph.node_count(), 1);

    editor.delete_node(&mut graph, source).unwrap();
    assert!(matches!(
        editor.delete_node(&mut graph, source),
        Err(GraphError::NotInGraph(_))
    ));
    assert_eq!(graph.knob_count(), 0);
}
