// SPDX-License-Identifier: MIT OR Apache-2.0
//! Working copies of graphs and editor states.
//!
//! A working copy is a deep duplicate in which every node, knob and the graph
//! itself receive fresh IDs. References between them are rewritten through an
//! [`IdMap`] built in a first pass, so the copy never points back into the
//! original. A reference without a mapping is reported as
//! [`GraphError::UnmappedReference`].

use crate::error::{GraphError, Result};
use crate::graph::{Graph, GraphId};
use crate::knob::{Knob, KnobId, KnobKind, KnobMap};
use crate::node::{Node, NodeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Original-to-copy ID mapping built while cloning
#[derive(Debug, Clone, Default)]
pub struct IdMap {
    graphs: HashMap<GraphId, GraphId>,
    nodes: HashMap<NodeId, NodeId>,
    knobs: HashMap<KnobId, KnobId>,
}

impl IdMap {
    /// Copy of a graph
    pub fn graph(&self, id: &GraphId) -> Result<GraphId> {
        self.graphs
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnmappedReference(format!("graph {id:?}")))
    }

    /// Copy of a node
    pub fn node(&self, id: &NodeId) -> Result<NodeId> {
        self.nodes
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnmappedReference(format!("node {id:?}")))
    }

    /// Copy of a knob
    pub fn knob(&self, id: &KnobId) -> Result<KnobId> {
        self.knobs
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnmappedReference(format!("knob {id:?}")))
    }

    /// Copy of an optional node reference
    pub fn optional_node(&self, id: Option<NodeId>) -> Result<Option<NodeId>> {
        id.map(|id| self.node(&id)).transpose()
    }

    /// Number of mapped nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of mapped knobs
    pub fn knob_count(&self) -> usize {
        self.knobs.len()
    }
}

/// Editor-side view of a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorState {
    /// State name
    pub name: String,
    /// Graph shown by this state
    pub canvas: Option<GraphId>,
    /// Selected node
    pub selected_node: Option<NodeId>,
    /// Node with keyboard focus
    pub focused_node: Option<NodeId>,
    /// Output a connection is being dragged from
    pub connect_output: Option<KnobId>,
    /// Canvas pan
    pub pan_offset: [f32; 2],
    /// Canvas zoom
    pub zoom: f32,
}

impl EditorState {
    /// Create a state showing `canvas`
    pub fn new(name: impl Into<String>, canvas: GraphId) -> Self {
        Self {
            name: name.into(),
            canvas: Some(canvas),
            ..Self::default()
        }
    }

    /// Drop in-progress interaction
    fn clear_transient(&mut self) {
        self.focused_node = None;
        self.connect_output = None;
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            name: "MainEditorState".to_string(),
            canvas: None,
            selected_node: None,
            focused_node: None,
            connect_output: None,
            pan_offset: [0.0, 0.0],
            zoom: 1.0,
        }
    }
}

/// Copy a state on its own, without a graph. Graph references are kept; the
/// selection and in-progress interaction are cleared.
pub fn working_copy_state(state: &EditorState) -> EditorState {
    let mut copy = state.clone();
    copy.selected_node = None;
    copy.clear_transient();
    copy
}

/// Deep-copy `graph` and the editor states referring to it.
///
/// When `compressed` is set the copy's node input/output views are left empty;
/// call [`Graph::expand`] before using it for anything but storage.
pub fn create_working_copy(
    graph: &Graph,
    states: &[EditorState],
    compressed: bool,
) -> Result<(Graph, Vec<EditorState>)> {
    let map = build_id_map(graph);
    let id = map.graph(&graph.id)?;

    let mut nodes = IndexMap::with_capacity(graph.nodes.len());
    let mut knobs = KnobMap::with_capacity(map.knob_count());
    for node in graph.nodes.values() {
        for knob_id in &node.knobs {
            let knob = graph.require_knob(*knob_id)?;
            let copy = copy_knob(knob, &map)?;
            knobs.insert(copy.id, copy);
        }
        let copy = copy_node(node, &map)?;
        nodes.insert(copy.id, copy);
    }

    let mut copy = Graph {
        id,
        name: graph.name.clone(),
        nodes,
        knobs,
        current_node: map.optional_node(graph.current_node)?,
        pending: None,
        compressed: false,
    };
    if compressed {
        for node in copy.nodes.values_mut() {
            node.inputs.clear();
            node.outputs.clear();
        }
        copy.compressed = true;
    } else {
        copy.expand();
    }

    let states = states
        .iter()
        .map(|state| copy_state(state, graph.id, &map))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        "Created working copy of {} with {} nodes and {} knobs",
        graph.name,
        map.node_count(),
        map.knob_count()
    );
    Ok((copy, states))
}

fn build_id_map(graph: &Graph) -> IdMap {
    let mut map = IdMap::default();
    map.graphs.insert(graph.id, GraphId::new());
    for node in graph.nodes.values() {
        map.nodes.insert(node.id, NodeId::new());
        for knob in &node.knobs {
            map.knobs.insert(*knob, KnobId::new());
        }
    }
    map
}

fn copy_node(node: &Node, map: &IdMap) -> Result<Node> {
    let mut copy = node.clone();
    copy.id = map.node(&node.id)?;
    copy.knobs = node
        .knobs
        .iter()
        .map(|id| map.knob(id))
        .collect::<Result<_>>()?;
    copy.inputs.clear();
    copy.outputs.clear();
    copy.behavior.remap_references(map)?;
    Ok(copy)
}

fn copy_knob(knob: &Knob, map: &IdMap) -> Result<Knob> {
    let mut copy = knob.clone();
    copy.id = map.knob(&knob.id)?;
    copy.owner = map.node(&knob.owner)?;
    copy.kind = match &knob.kind {
        KnobKind::Input { connection } => KnobKind::Input {
            connection: connection.map(|id| map.knob(&id)).transpose()?,
        },
        KnobKind::Output { connections, value } => KnobKind::Output {
            connections: connections
                .iter()
                .map(|id| map.knob(id))
                .collect::<Result<_>>()?,
            value: value.clone(),
        },
    };
    Ok(copy)
}

fn copy_state(state: &EditorState, source: GraphId, map: &IdMap) -> Result<EditorState> {
    let mut copy = state.clone();
    // A state without a canvas is attached to the graph being copied
    copy.canvas = Some(map.graph(&state.canvas.unwrap_or(source))?);
    copy.selected_node = map.optional_node(state.selected_node)?;
    copy.clear_transient();
    Ok(copy)
}
