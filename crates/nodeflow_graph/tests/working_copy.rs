// SPDX-License-Identifier: MIT OR Apache-2.0
//! Working copies and document round trips.

mod common;

use common::*;
use nodeflow_graph::{create_working_copy, EditorState, Graph, NodeEditor, NodeId, Side};
use std::collections::HashSet;

/// Four sources feeding the sides of one pass-through node
fn all_sides(editor: &NodeEditor, graph: &mut Graph) -> NodeId {
    let hub = all_around(editor, graph);
    for (index, value) in [1.0, 2.0, 3.0, 4.0].into_iter().enumerate() {
        let source = float_source(editor, graph, value);
        assert!(editor.connect_nodes(graph, source, 0, hub, index).unwrap());
    }
    hub
}

fn side_outputs(graph: &Graph, hub: NodeId) -> Vec<(Side, f32)> {
    graph
        .node(hub)
        .unwrap()
        .outputs()
        .iter()
        .map(|id| {
            let knob = graph.knob(*id).unwrap();
            (knob.side, graph.output_value::<f32>(*id).unwrap())
        })
        .collect()
}

#[test]
fn test_copy_shares_no_ids_with_original() {
    let editor = editor();
    let mut graph = editor.new_graph("Original");
    all_sides(&editor, &mut graph);
    let (copy, _) = create_working_copy(&graph, &[], false).unwrap();

    let original_nodes: HashSet<_> = graph.node_ids().collect();
    let original_knobs: HashSet<_> = graph.knobs().map(|k| k.id).collect();
    for knob in copy.knobs() {
        assert!(!original_knobs.contains(&knob.id));
        assert!(!original_nodes.contains(&knob.owner));
        assert!(copy.contains_node(knob.owner));
        if let Some(output) = knob.connection() {
            assert!(!original_knobs.contains(&output));
        }
        assert!(knob.connections().iter().all(|id| !original_knobs.contains(id)));
    }
    assert_eq!(copy.connection_count(), graph.connection_count());
    assert_connections_consistent(&copy);
}

#[test]
fn test_round_trip_reproduces_outputs() {
    let editor = editor();
    let mut graph = editor.new_graph("Sides");
    let hub = all_sides(&editor, &mut graph);
    editor.recalculate_all(&mut graph);
    let expected = vec![
        (Side::Top, 1.0),
        (Side::Bottom, 2.0),
        (Side::Right, 3.0),
        (Side::Left, 4.0),
    ];
    assert_eq!(side_outputs(&graph, hub), expected);

    let (copy, _) = create_working_copy(&graph, &[], false).unwrap();
    let text = editor.save_graph(&copy, &[]).unwrap();
    let (mut loaded, _) = editor.load_graph(&text).unwrap();
    editor.recalculate_all(&mut loaded);

    let loaded_hub = loaded
        .nodes()
        .find(|n| n.inputs().len() == 4)
        .map(|n| n.id)
        .unwrap();
    assert_eq!(side_outputs(&loaded, loaded_hub), expected);
}

#[test]
fn test_file_round_trip_with_states() {
    let editor = editor();
    let mut graph = editor.new_graph("On disk");
    let hub = all_sides(&editor, &mut graph);
    let mut state = EditorState::new("MainEditorState", graph.id);
    state.selected_node = Some(hub);
    state.pan_offset = [12.0, -4.0];

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.ron");
    editor.save_to_path(&path, &graph, &[state]).unwrap();
    let (loaded, states) = editor.load_from_path(&path).unwrap();

    assert_eq!(loaded.node_count(), graph.node_count());
    let main = editor.pick_main_state(&states).unwrap();
    assert_eq!(main.canvas, Some(loaded.id));
    assert_eq!(main.pan_offset, [12.0, -4.0]);
    let selected = loaded.node(main.selected_node.unwrap()).unwrap();
    assert_eq!(selected.inputs().len(), 4);
    assert_connections_consistent(&loaded);
}

#[test]
fn test_missing_file_is_io_error() {
    let editor = editor();
    let dir = tempfile::tempdir().unwrap();
    let result = editor.load_from_path(&dir.path().join("missing.ron"));
    assert!(matches!(result, Err(nodeflow_graph::GraphError::Io(_))));
}
