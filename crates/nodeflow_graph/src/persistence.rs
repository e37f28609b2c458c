// SPDX-License-Identifier: MIT OR Apache-2.0
//! Versioned RON documents for graphs and their editor states.
//!
//! Saving writes a working copy, never the live graph, so the stored IDs are
//! independent of the graph still open in the editor. Loading rebuilds nodes
//! through the catalog, validates every reference and hands back a fresh
//! working copy of the result.

use crate::editor::NodeEditor;
use crate::error::{GraphError, Result};
use crate::graph::{Graph, GraphId};
use crate::knob::Knob;
use crate::node::{Node, NodeId};
use crate::working_copy::{create_working_copy, EditorState};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current document format version
pub const DOCUMENT_FORMAT_VERSION: u32 = 1;

/// Stored form of a node and the knobs it owns
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NodeRecord {
    id: NodeId,
    type_id: String,
    name: String,
    position: [f32; 2],
    size: [f32; 2],
    calculated: bool,
    #[serde(default)]
    state: Option<String>,
    knobs: Vec<Knob>,
}

/// Stored form of a graph
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GraphDocument {
    version: u32,
    id: GraphId,
    name: String,
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    states: Vec<EditorState>,
}

impl GraphDocument {
    fn from_graph(graph: &Graph, states: Vec<EditorState>) -> Result<Self> {
        let mut nodes = Vec::with_capacity(graph.node_count());
        for node in graph.nodes() {
            let knobs = node
                .knobs()
                .iter()
                .map(|id| graph.require_knob(*id).cloned())
                .collect::<Result<Vec<_>>>()?;
            nodes.push(NodeRecord {
                id: node.id,
                type_id: node.type_id.clone(),
                name: node.name.clone(),
                position: node.position,
                size: node.size,
                calculated: node.is_calculated(),
                state: node.behavior().save_state()?,
                knobs,
            });
        }
        Ok(Self {
            version: DOCUMENT_FORMAT_VERSION,
            id: graph.id,
            name: graph.name.clone(),
            nodes,
            states,
        })
    }

    fn into_graph(self, editor: &NodeEditor) -> Result<(Graph, Vec<EditorState>)> {
        let mut graph = Graph::new(self.name);
        graph.id = self.id;

        for record in self.nodes {
            if graph.contains_node(record.id) {
                return Err(GraphError::CorruptDocument(format!("duplicate node {:?}", record.id)));
            }
            for knob in &record.knobs {
                if knob.owner != record.id {
                    return Err(GraphError::CorruptDocument(format!(
                        "knob {:?} stored under a node that does not own it",
                        knob.id
                    )));
                }
                if graph.knob(knob.id).is_some() {
                    return Err(GraphError::CorruptDocument(format!("duplicate knob {:?}", knob.id)));
                }
                let resolved = editor.types.resolve(&knob.type_key)?.value_type;
                if resolved != knob.value_type {
                    return Err(GraphError::TypeMismatch {
                        expected: resolved,
                        found: knob.value_type,
                    });
                }
            }

            let mut behavior = editor.catalog.instantiate(&record.type_id)?;
            if let Some(state) = &record.state {
                behavior.restore_state(state)?;
            }
            let mut node = Node::new(record.id, record.type_id, behavior);
            node.name = record.name;
            node.position = record.position;
            node.size = record.size;
            node.calculated = record.calculated;
            graph.insert_node(node, record.knobs);
        }

        graph.expand();
        graph.check_consistency()?;
        for knob in graph.knobs() {
            let Some(output) = knob.connection().and_then(|id| graph.knob(id)) else {
                continue;
            };
            if !output.is_output() || output.value_type != knob.value_type {
                return Err(GraphError::CorruptDocument(format!(
                    "input {:?} connected to an incompatible knob",
                    knob.id
                )));
            }
        }
        Ok((graph, self.states))
    }
}

impl NodeEditor {
    /// Serialize a working copy of `graph` and `states` to a RON document
    pub fn save_graph(&self, graph: &Graph, states: &[EditorState]) -> Result<String> {
        let (copy, states) = create_working_copy(graph, states, self.config.compress_saved_copies)?;

        self.callbacks.issue(|o| o.on_save_canvas(&copy));
        for state in &states {
            self.callbacks.issue(|o| o.on_save_editor_state(state));
        }

        let document = GraphDocument::from_graph(&copy, states)?;
        let pretty = ron::ser::PrettyConfig::default().struct_names(true);
        let text = ron::ser::to_string_pretty(&document, pretty)?;
        tracing::info!("Saved graph {} ({} nodes)", graph.name, copy.node_count());
        Ok(text)
    }

    /// Rebuild a graph and its states from a RON document.
    ///
    /// The returned graph is a working copy with fresh IDs. Documents that
    /// reference missing objects or break the connection invariants fail with
    /// [`GraphError::CorruptDocument`].
    pub fn load_graph(&self, text: &str) -> Result<(Graph, Vec<EditorState>)> {
        let document: GraphDocument = ron::from_str(text)?;
        if document.version > DOCUMENT_FORMAT_VERSION {
            return Err(GraphError::UnsupportedVersion {
                found: document.version,
                supported: DOCUMENT_FORMAT_VERSION,
            });
        }

        let (stored, states) = document.into_graph(self)?;
        let (graph, states) = create_working_copy(&stored, &states, false)?;

        self.callbacks.issue(|o| o.on_load_canvas(&graph));
        for state in &states {
            self.callbacks.issue(|o| o.on_load_editor_state(state));
        }
        tracing::info!("Loaded graph {} ({} nodes)", graph.name, graph.node_count());
        Ok((graph, states))
    }

    /// Save to a file
    pub fn save_to_path(&self, path: &Path, graph: &Graph, states: &[EditorState]) -> Result<()> {
        let text = self.save_graph(graph, states)?;
        std::fs::write(path, text)?;
        tracing::info!("Wrote graph document to {:?}", path);
        Ok(())
    }

    /// Load from a file
    pub fn load_from_path(&self, path: &Path) -> Result<(Graph, Vec<EditorState>)> {
        let text = std::fs::read_to_string(path)?;
        self.load_graph(&text)
    }

    /// State named after `main_state_name`, or the first state
    pub fn pick_main_state<'s>(&self, states: &'s [EditorState]) -> Option<&'s EditorState> {
        states
            .iter()
            .find(|s| s.name == self.config.main_state_name)
            .or_else(|| states.first())
    }
}
