// SPDX-License-Identifier: MIT OR Apache-2.0
//! Catalog of node variants available for creation.
//!
//! Node variants register themselves explicitly with a type ID and a factory
//! function; there is no runtime discovery.

use crate::error::{GraphError, Result};
use crate::node::NodeBehavior;
use indexmap::IndexMap;

/// Factory producing a fresh behavior for a node variant
pub type NodeFactory = fn() -> Box<dyn NodeBehavior>;

/// Catalog entry for a node variant
#[derive(Debug, Clone)]
pub struct NodeTypeInfo {
    /// Unique type identifier
    pub id: String,
    /// Display name, used as the default node name
    pub name: String,
    /// Hidden from listings such as context menus
    pub hidden: bool,
    factory: NodeFactory,
}

impl NodeTypeInfo {
    /// Create an entry
    pub fn new(id: impl Into<String>, name: impl Into<String>, factory: NodeFactory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            hidden: false,
            factory,
        }
    }

    /// Hide from listings
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Instantiate a new behavior
    pub fn instantiate(&self) -> Box<dyn NodeBehavior> {
        (self.factory)()
    }
}

/// Registry of available node variants
#[derive(Debug, Clone, Default)]
pub struct NodeCatalog {
    types: IndexMap<String, NodeTypeInfo>,
}

impl NodeCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding the built-in node variants
    pub fn with_builtin_nodes() -> Self {
        let mut catalog = Self::new();
        crate::nodes::register_builtin(&mut catalog);
        catalog
    }

    /// Register a node variant
    pub fn register(&mut self, info: NodeTypeInfo) -> Result<()> {
        if self.types.contains_key(&info.id) {
            return Err(GraphError::DuplicateNodeType(info.id));
        }
        self.types.insert(info.id.clone(), info);
        Ok(())
    }

    /// Get a node variant by type ID
    pub fn get(&self, id: &str) -> Option<&NodeTypeInfo> {
        self.types.get(id)
    }

    /// Look up a node variant, failing if it is not registered
    pub fn resolve(&self, id: &str) -> Result<&NodeTypeInfo> {
        self.get(id)
            .ok_or_else(|| GraphError::UnknownNodeType(id.to_string()))
    }

    /// Instantiate a behavior for a type ID
    pub fn instantiate(&self, id: &str) -> Result<Box<dyn NodeBehavior>> {
        self.resolve(id).map(NodeTypeInfo::instantiate)
    }

    /// All registered variants
    pub fn types(&self) -> impl Iterator<Item = &NodeTypeInfo> {
        self.types.values()
    }

    /// Variants that are not hidden
    pub fn visible_types(&self) -> impl Iterator<Item = &NodeTypeInfo> {
        self.types.values().filter(|t| !t.hidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{AllAroundNode, FloatValueNode};

    #[test]
    fn test_builtin_catalog() {
        let catalog = NodeCatalog::with_builtin_nodes();
        assert!(catalog.get(AllAroundNode::TYPE_ID).is_some());
        assert!(catalog.instantiate(FloatValueNode::TYPE_ID).is_ok());
        assert!(matches!(
            catalog.instantiate("missing"),
            Err(GraphError::UnknownNodeType(_))
        ));
    }

    #[test]
    fn test_duplicate_and_hidden() {
        let mut catalog = NodeCatalog::new();
        catalog
            .register(NodeTypeInfo::new("value", "Value", FloatValueNode::boxed))
            .unwrap();
        catalog
            .register(NodeTypeInfo::new("internal", "Internal", FloatValueNode::boxed).hidden())
            .unwrap();

        let err = catalog
            .register(NodeTypeInfo::new("value", "Other", FloatValueNode::boxed))
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateNodeType(_)));

        let visible: Vec<_> = catalog.visible_types().map(|t| t.id.as_str()).collect();
        assert_eq!(visible, vec!["value"]);
        assert_eq!(catalog.types().count(), 2);
    }
}
