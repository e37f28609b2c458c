// SPDX-License-Identifier: MIT OR Apache-2.0
//! Knob definitions for node inputs/outputs.
//!
//! A knob is a typed connection point owned by a node. Inputs hold at most one
//! connection to an output; outputs hold any number of inputs plus the last
//! value their node calculated. Both halves of a connection are stored and kept
//! in sync by the graph.

use crate::error::{GraphError, Result};
use crate::node::NodeId;
use crate::types::{KnobData, KnobValue, TypeRegistry, ValueType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a knob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KnobId(pub Uuid);

impl KnobId {
    /// Create a new random knob ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for KnobId {
    fn default() -> Self {
        Self::new()
    }
}

/// Side of the node a knob is laid out on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Top edge
    Top,
    /// Bottom edge
    Bottom,
    /// Left edge
    Left,
    /// Right edge
    Right,
}

/// Knob direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnobDirection {
    /// Input knob
    Input,
    /// Output knob
    Output,
}

impl KnobDirection {
    /// Side used when a declaration does not name one
    pub fn default_side(self) -> Side {
        match self {
            Self::Input => Side::Left,
            Self::Output => Side::Right,
        }
    }
}

/// Offset along the side used when a declaration does not name one
pub const DEFAULT_SIDE_POSITION: f32 = 20.0;

/// Direction-specific knob state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KnobKind {
    /// Accepts one connection
    Input {
        /// Connected output, if any
        connection: Option<KnobId>,
    },
    /// Feeds any number of inputs
    Output {
        /// Connected inputs, in connection order
        connections: Vec<KnobId>,
        /// Last calculated value, `None` until first written
        value: Option<KnobValue>,
    },
}

/// A knob on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Knob {
    /// Unique knob ID
    pub id: KnobId,
    /// Display label
    pub name: String,
    /// Owning node
    pub owner: NodeId,
    /// Connection type key
    pub type_key: String,
    /// Native type the key resolved to on creation
    pub value_type: ValueType,
    /// Layout side
    pub side: Side,
    /// Layout offset along the side
    pub side_position: f32,
    /// Input or output state
    pub kind: KnobKind,
}

impl Knob {
    /// Create an unconnected knob
    pub fn new(
        owner: NodeId,
        name: impl Into<String>,
        type_key: impl Into<String>,
        value_type: ValueType,
        direction: KnobDirection,
    ) -> Self {
        let kind = match direction {
            KnobDirection::Input => KnobKind::Input { connection: None },
            KnobDirection::Output => KnobKind::Output {
                connections: Vec::new(),
                value: None,
            },
        };
        Self {
            id: KnobId::new(),
            name: name.into(),
            owner,
            type_key: type_key.into(),
            value_type,
            side: direction.default_side(),
            side_position: DEFAULT_SIDE_POSITION,
            kind,
        }
    }

    /// Set the layout side and offset
    pub fn with_side(mut self, side: Side, side_position: f32) -> Self {
        self.side = side;
        self.side_position = side_position;
        self
    }

    /// Knob direction
    pub fn direction(&self) -> KnobDirection {
        match self.kind {
            KnobKind::Input { .. } => KnobDirection::Input,
            KnobKind::Output { .. } => KnobDirection::Output,
        }
    }

    /// Whether this is an input knob
    pub fn is_input(&self) -> bool {
        self.direction() == KnobDirection::Input
    }

    /// Whether this is an output knob
    pub fn is_output(&self) -> bool {
        self.direction() == KnobDirection::Output
    }

    /// Connected output of an input knob
    pub fn connection(&self) -> Option<KnobId> {
        match &self.kind {
            KnobKind::Input { connection } => *connection,
            KnobKind::Output { .. } => None,
        }
    }

    /// Connected inputs of an output knob; empty for inputs
    pub fn connections(&self) -> &[KnobId] {
        match &self.kind {
            KnobKind::Output { connections, .. } => connections,
            KnobKind::Input { .. } => &[],
        }
    }

    /// Stored value of an output knob
    pub fn value(&self) -> Option<&KnobValue> {
        match &self.kind {
            KnobKind::Output { value, .. } => value.as_ref(),
            KnobKind::Input { .. } => None,
        }
    }

    /// Whether an output holds no value yet
    pub fn is_value_null(&self) -> bool {
        self.value().is_none()
    }

    /// Whether this knob takes part in any connection
    pub fn is_connected(&self) -> bool {
        match &self.kind {
            KnobKind::Input { connection } => connection.is_some(),
            KnobKind::Output { connections, .. } => !connections.is_empty(),
        }
    }

    pub(crate) fn set_connection(&mut self, output: Option<KnobId>) {
        if let KnobKind::Input { connection } = &mut self.kind {
            *connection = output;
        }
    }

    pub(crate) fn connections_mut(&mut self) -> Option<&mut Vec<KnobId>> {
        match &mut self.kind {
            KnobKind::Output { connections, .. } => Some(connections),
            KnobKind::Input { .. } => None,
        }
    }

    pub(crate) fn set_stored_value(&mut self, new_value: KnobValue) {
        if let KnobKind::Output { value, .. } = &mut self.kind {
            *value = Some(new_value);
        }
    }
}

/// Storage for every knob of a graph
pub(crate) type KnobMap = IndexMap<KnobId, Knob>;

fn typed_knob<T: KnobData>(knobs: &KnobMap, knob_id: KnobId) -> Result<&Knob> {
    let knob = knobs.get(&knob_id).ok_or(GraphError::KnobNotFound(knob_id))?;
    if knob.value_type != T::VALUE_TYPE {
        return Err(GraphError::TypeMismatch {
            expected: knob.value_type,
            found: T::VALUE_TYPE,
        });
    }
    Ok(knob)
}

pub(crate) fn output_value<T: KnobData>(knobs: &KnobMap, output: KnobId) -> Result<T> {
    let knob = typed_knob::<T>(knobs, output)?;
    if !knob.is_output() {
        return Err(GraphError::WrongKnobDirection(output));
    }
    let value = knob
        .value()
        .cloned()
        .unwrap_or_else(|| knob.value_type.default_value());
    T::from_value(&value).ok_or(GraphError::TypeMismatch {
        expected: knob.value_type,
        found: value.value_type(),
    })
}

pub(crate) fn set_output_value<T: KnobData>(knobs: &mut KnobMap, output: KnobId, value: T) -> Result<()> {
    if !typed_knob::<T>(knobs, output)?.is_output() {
        return Err(GraphError::WrongKnobDirection(output));
    }
    if let Some(knob) = knobs.get_mut(&output) {
        knob.set_stored_value(value.into_value());
    }
    Ok(())
}

pub(crate) fn input_value<T: KnobData>(knobs: &KnobMap, types: &TypeRegistry, input: KnobId) -> Result<T> {
    let knob = typed_knob::<T>(knobs, input)?;
    match &knob.kind {
        KnobKind::Input { connection: Some(output) } => output_value(knobs, *output),
        KnobKind::Input { connection: None } => {
            let value = types.default_value(&knob.type_key)?;
            T::from_value(&value).ok_or(GraphError::TypeMismatch {
                expected: value.value_type(),
                found: T::VALUE_TYPE,
            })
        }
        KnobKind::Output { .. } => Err(GraphError::WrongKnobDirection(input)),
    }
}

pub(crate) fn set_input_value<T: KnobData>(knobs: &mut KnobMap, input: KnobId, value: T) -> Result<()> {
    let knob = typed_knob::<T>(knobs, input)?;
    if !knob.is_input() {
        return Err(GraphError::WrongKnobDirection(input));
    }
    match knob.connection() {
        Some(output) => set_output_value(knobs, output, value),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_input_defaults() {
        let knob = Knob::new(NodeId::new(), "In", "Float", ValueType::Float, KnobDirection::Input);
        assert!(knob.is_input());
        assert_eq!(knob.side, Side::Left);
        assert_eq!(knob.side_position, DEFAULT_SIDE_POSITION);
        assert_eq!(knob.connection(), None);
        assert!(knob.connections().is_empty());
        assert!(!knob.is_connected());
    }

    #[test]
    fn test_output_value() {
        let mut knob = Knob::new(NodeId::new(), "Out", "Float", ValueType::Float, KnobDirection::Output)
            .with_side(Side::Top, 40.0);
        assert_eq!(knob.side, Side::Top);
        assert!(knob.is_value_null());

        knob.set_stored_value(KnobValue::Float(3.0));
        assert_eq!(knob.value(), Some(&KnobValue::Float(3.0)));

        // Inputs ignore value writes
        let mut input = Knob::new(NodeId::new(), "In", "Float", ValueType::Float, KnobDirection::Input);
        input.set_stored_value(KnobValue::Float(1.0));
        assert_eq!(input.value(), None);
    }
}
