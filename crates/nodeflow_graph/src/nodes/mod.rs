// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node variants.

mod add;
mod all_around;
mod float_value;
mod relay;

pub use add::AddNode;
pub use all_around::AllAroundNode;
pub use float_value::FloatValueNode;
pub use relay::RelayNode;

use crate::catalog::{NodeCatalog, NodeTypeInfo};

/// Register every built-in variant with `catalog`
pub fn register_builtin(catalog: &mut NodeCatalog) {
    let builtin = [
        NodeTypeInfo::new(AllAroundNode::TYPE_ID, "AllAround Node", AllAroundNode::boxed),
        NodeTypeInfo::new(FloatValueNode::TYPE_ID, "Float Value", FloatValueNode::boxed),
        NodeTypeInfo::new(AddNode::TYPE_ID, "Add", AddNode::boxed),
        NodeTypeInfo::new(RelayNode::TYPE_ID, "Relay", RelayNode::boxed),
    ];
    for info in builtin {
        if let Err(err) = catalog.register(info) {
            tracing::warn!("Skipping built-in node: {}", err);
        }
    }
}
