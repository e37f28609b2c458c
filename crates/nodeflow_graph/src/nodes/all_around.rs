// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pass-through node with a knob pair on every side.

use crate::error::Result;
use crate::evaluation::Calculation;
use crate::knob::Side;
use crate::node::{NodeBehavior, NodeBuilder};

const SIDES: [(Side, &str); 4] = [
    (Side::Top, "Top"),
    (Side::Bottom, "Bottom"),
    (Side::Right, "Right"),
    (Side::Left, "Left"),
];

/// Copies each Float input to the output on the same side.
/// Loops through this node are legal.
#[derive(Debug, Clone, Default)]
pub struct AllAroundNode;

impl AllAroundNode {
    /// Catalog type ID
    pub const TYPE_ID: &'static str = "all_around";

    /// Catalog factory
    pub fn boxed() -> Box<dyn NodeBehavior> {
        Box::new(Self)
    }
}

impl NodeBehavior for AllAroundNode {
    fn create(&mut self, node: &mut NodeBuilder<'_>) -> Result<()> {
        node.set_name("AllAround Node");
        node.set_size(60.0, 60.0);
        for (side, label) in SIDES {
            node.create_input_at(&format!("Input {label}"), "Float", side, 20.0)?;
        }
        for (side, label) in SIDES {
            node.create_output_at(&format!("Output {label}"), "Float", side, 40.0)?;
        }
        Ok(())
    }

    fn calculate(&mut self, calc: &mut Calculation<'_>) -> Result<()> {
        for index in 0..SIDES.len() {
            let value: f32 = calc.input(index)?;
            calc.set_output(index, value)?;
        }
        Ok(())
    }

    fn allows_recursion(&self) -> bool {
        true
    }
}
