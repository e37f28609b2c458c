// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types shared by every graph operation.

use crate::knob::KnobId;
use crate::node::NodeId;
use crate::types::ValueType;
use thiserror::Error;

/// Errors raised by the graph core
#[derive(Debug, Error)]
pub enum GraphError {
    /// No connection type is registered under this key
    #[error("Unknown connection type: {0}")]
    UnknownType(String),

    /// A connection type with this key is already registered
    #[error("Connection type already registered: {0}")]
    DuplicateKey(String),

    /// A value was read or written as the wrong native type
    #[error("Type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch {
        /// Type backing the knob
        expected: ValueType,
        /// Type requested by the caller
        found: ValueType,
    },

    /// The node is not a member of the graph
    #[error("Node not in graph: {0:?}")]
    NotInGraph(NodeId),

    /// A reference pointed at an object that was never copied
    #[error("Unmapped reference: {0}")]
    UnmappedReference(String),

    /// A node could not calculate its outputs
    #[error("Calculation failed: {0}")]
    CalculationFailure(String),

    /// No node variant is registered under this type id
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// A node variant with this type id is already registered
    #[error("Node type already registered: {0}")]
    DuplicateNodeType(String),

    /// The node is not of the variant an operation expected
    #[error("Node {node:?} is not a {expected} node")]
    UnexpectedNodeType {
        /// Node that was checked
        node: NodeId,
        /// Expected type id
        expected: &'static str,
    },

    /// Knob not found in the graph
    #[error("Knob not found: {0:?}")]
    KnobNotFound(KnobId),

    /// Knob index past the end of a node's input or output list
    #[error("Knob index {index} out of range on node {node:?}")]
    KnobIndexOutOfRange {
        /// Node that was indexed
        node: NodeId,
        /// Requested index
        index: usize,
    },

    /// An input was used where an output was expected, or the reverse
    #[error("Wrong knob direction: {0:?}")]
    WrongKnobDirection(KnobId),

    /// A loaded document violates a graph invariant
    #[error("Corrupt document: {0}")]
    CorruptDocument(String),

    /// Document was written by a newer format version
    #[error("Document version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the document
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },

    /// RON serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// RON parse error
    #[error("Deserialization error: {0}")]
    Deserialize(#[from] ron::error::SpannedError),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;
