// SPDX-License-Identifier: MIT OR Apache-2.0
//! Constant float source.

use crate::error::{GraphError, Result};
use crate::evaluation::Calculation;
use crate::graph::Graph;
use crate::node::{NodeBehavior, NodeBuilder, NodeId};

/// Source node emitting a stored float parameter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloatValueNode {
    /// Emitted value
    pub value: f32,
}

impl FloatValueNode {
    /// Catalog type ID
    pub const TYPE_ID: &'static str = "float_value";

    /// Catalog factory
    pub fn boxed() -> Box<dyn NodeBehavior> {
        Box::new(Self::default())
    }

    /// Change the parameter of a float value node and write it to its output.
    ///
    /// Dependents are not recalculated.
    pub fn set(graph: &mut Graph, node_id: NodeId, value: f32) -> Result<()> {
        let node = graph.node_mut(node_id).ok_or(GraphError::NotInGraph(node_id))?;
        let behavior = node
            .behavior_as_mut::<Self>()
            .ok_or(GraphError::UnexpectedNodeType {
                node: node_id,
                expected: Self::TYPE_ID,
            })?;
        behavior.value = value;

        let output = node.output(0).ok_or(GraphError::KnobIndexOutOfRange {
            node: node_id,
            index: 0,
        })?;
        graph.set_output_value(output, value)
    }
}

impl NodeBehavior for FloatValueNode {
    fn create(&mut self, node: &mut NodeBuilder<'_>) -> Result<()> {
        node.set_size(100.0, 50.0);
        node.create_output("Value", "Float")?;
        Ok(())
    }

    fn calculate(&mut self, calc: &mut Calculation<'_>) -> Result<()> {
        calc.set_output(0, self.value)
    }

    fn save_state(&self) -> Result<Option<String>> {
        Ok(Some(ron::to_string(&self.value)?))
    }

    fn restore_state(&mut self, state: &str) -> Result<()> {
        self.value = ron::from_str(state)?;
        Ok(())
    }
}
