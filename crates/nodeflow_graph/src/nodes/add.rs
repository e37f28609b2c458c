// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sum of two floats.

use crate::error::{GraphError, Result};
use crate::evaluation::Calculation;
use crate::node::{NodeBehavior, NodeBuilder};

/// Adds its two inputs. Fails until both are connected and hold values.
#[derive(Debug, Clone, Default)]
pub struct AddNode;

impl AddNode {
    /// Catalog type ID
    pub const TYPE_ID: &'static str = "add";

    /// Catalog factory
    pub fn boxed() -> Box<dyn NodeBehavior> {
        Box::new(Self)
    }
}

impl NodeBehavior for AddNode {
    fn create(&mut self, node: &mut NodeBuilder<'_>) -> Result<()> {
        node.create_input("A", "Float")?;
        node.create_input("B", "Float")?;
        node.create_output("Sum", "Float")?;
        Ok(())
    }

    fn calculate(&mut self, calc: &mut Calculation<'_>) -> Result<()> {
        if !calc.all_inputs_ready() {
            return Err(GraphError::CalculationFailure("inputs not ready".into()));
        }
        let a: f32 = calc.input(0)?;
        let b: f32 = calc.input(1)?;
        calc.set_output(0, a + b)
    }
}
