// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph dataflow core for `NodeFlow`.
//!
//! Nodes own typed input and output knobs. Connections link one output to any
//! number of inputs, and values flow along them when the graph is
//! recalculated.
//!
//! ## Architecture
//!
//! - [`TypeRegistry`] resolves knob type keys to native value types
//! - [`Graph`] owns nodes and knobs and answers structural queries
//! - [`NodeEditor`] is the context every mutating operation runs in: it holds
//!   the registry, the [`NodeCatalog`], the observer [`Callbacks`] and the
//!   [`EditorConfig`]
//! - Working copies duplicate a graph with fresh IDs for storage or isolated
//!   editing, and persistence stores them as RON documents

pub mod callbacks;
pub mod catalog;
pub mod config;
pub mod editor;
pub mod error;
pub mod evaluation;
pub mod graph;
pub mod knob;
pub mod node;
pub mod nodes;
pub mod persistence;
pub mod search;
pub mod types;
pub mod working_copy;

pub use callbacks::{Callbacks, GraphObserver};
pub use catalog::{NodeCatalog, NodeFactory, NodeTypeInfo};
pub use config::{EditorConfig, RecalculationMode};
pub use editor::NodeEditor;
pub use error::{GraphError, Result};
pub use evaluation::Calculation;
pub use graph::{Graph, GraphId};
pub use knob::{Knob, KnobDirection, KnobId, KnobKind, Side};
pub use node::{Node, NodeBehavior, NodeBuilder, NodeId};
pub use search::RecursiveSearch;
pub use types::{ConnectionType, KnobData, KnobValue, TypeRegistry, ValueType};
pub use working_copy::{create_working_copy, working_copy_state, EditorState, IdMap};
