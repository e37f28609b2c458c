// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pass-through that ends propagation.

use crate::error::Result;
use crate::evaluation::Calculation;
use crate::node::{NodeBehavior, NodeBuilder};

/// Copies its input to its output without recalculating dependents
#[derive(Debug, Clone, Default)]
pub struct RelayNode;

impl RelayNode {
    /// Catalog type ID
    pub const TYPE_ID: &'static str = "relay";

    /// Catalog factory
    pub fn boxed() -> Box<dyn NodeBehavior> {
        Box::new(Self)
    }
}

impl NodeBehavior for RelayNode {
    fn create(&mut self, node: &mut NodeBuilder<'_>) -> Result<()> {
        node.create_input("In", "Float")?;
        node.create_output("Out", "Float")?;
        Ok(())
    }

    fn calculate(&mut self, calc: &mut Calculation<'_>) -> Result<()> {
        let value: f32 = calc.input(0)?;
        calc.set_output(0, value)
    }

    fn continues_calculation(&self) -> bool {
        false
    }
}
