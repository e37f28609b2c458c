// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph framework.
//!
//! A [`Node`] is the graph-side record: identity, layout, the ordered list of
//! knobs it owns and the calculation flag. What a node actually computes lives
//! in its [`NodeBehavior`], the per-variant object created by the
//! [`NodeCatalog`](crate::catalog::NodeCatalog).

use crate::error::Result;
use crate::evaluation::Calculation;
use crate::knob::{Knob, KnobDirection, KnobId, Side, DEFAULT_SIDE_POSITION};
use crate::types::TypeRegistry;
use crate::working_copy::IdMap;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Object-safe cloning and downcasting for boxed behaviors.
///
/// Implemented automatically for every `NodeBehavior + Clone`.
pub trait BehaviorBase {
    /// Clone into a new box
    fn clone_box(&self) -> Box<dyn NodeBehavior>;
    /// Borrow as `Any` for downcasting
    fn as_any(&self) -> &dyn Any;
    /// Mutably borrow as `Any` for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T> BehaviorBase for T
where
    T: NodeBehavior + Clone + 'static,
{
    fn clone_box(&self) -> Box<dyn NodeBehavior> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Clone for Box<dyn NodeBehavior> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Behavior of a concrete node variant.
///
/// Variants implement `create`, `calculate` and, when they differ from the
/// defaults, `allows_recursion` and `continues_calculation`. The remaining
/// hooks have no-op defaults.
pub trait NodeBehavior: BehaviorBase + fmt::Debug {
    /// Declare knobs, name and size of a freshly created node
    fn create(&mut self, node: &mut NodeBuilder<'_>) -> Result<()>;

    /// Calculate outputs from inputs.
    ///
    /// An error marks the node as not calculated and stops propagation along
    /// this path; it never aborts the surrounding pass.
    fn calculate(&mut self, calc: &mut Calculation<'_>) -> Result<()>;

    /// Whether a loop through this node is legal
    fn allows_recursion(&self) -> bool {
        false
    }

    /// Whether a successful calculation propagates to dependents
    fn continues_calculation(&self) -> bool {
        true
    }

    /// Called once while the node is being deleted
    fn on_delete(&mut self) {}

    /// Called after one of this node's inputs was connected
    fn on_add_input_connection(&mut self, _input: KnobId) {}

    /// Called after one of this node's outputs gained a connection
    fn on_add_output_connection(&mut self, _output: KnobId) {}

    /// Rewrite node or knob references held by the behavior during cloning
    fn remap_references(&mut self, _map: &IdMap) -> Result<()> {
        Ok(())
    }

    /// Parameters to persist, as a RON string
    fn save_state(&self) -> Result<Option<String>> {
        Ok(None)
    }

    /// Restore parameters written by [`save_state`](Self::save_state)
    fn restore_state(&mut self, _state: &str) -> Result<()> {
        Ok(())
    }
}

/// A node instance in the graph
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Catalog type ID
    pub type_id: String,
    /// Display name
    pub name: String,
    /// Position in the editor
    pub position: [f32; 2],
    /// Size in the editor
    pub size: [f32; 2],
    pub(crate) knobs: Vec<KnobId>,
    pub(crate) inputs: Vec<KnobId>,
    pub(crate) outputs: Vec<KnobId>,
    pub(crate) calculated: bool,
    pub(crate) behavior: Box<dyn NodeBehavior>,
}

impl Node {
    pub(crate) fn new(id: NodeId, type_id: impl Into<String>, behavior: Box<dyn NodeBehavior>) -> Self {
        Self {
            id,
            type_id: type_id.into(),
            name: String::new(),
            position: [0.0, 0.0],
            size: [100.0, 60.0],
            knobs: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            calculated: false,
            behavior,
        }
    }

    /// All knobs in creation order
    pub fn knobs(&self) -> &[KnobId] {
        &self.knobs
    }

    /// Input knobs in creation order
    pub fn inputs(&self) -> &[KnobId] {
        &self.inputs
    }

    /// Output knobs in creation order
    pub fn outputs(&self) -> &[KnobId] {
        &self.outputs
    }

    /// Get an input knob by index
    pub fn input(&self, index: usize) -> Option<KnobId> {
        self.inputs.get(index).copied()
    }

    /// Get an output knob by index
    pub fn output(&self, index: usize) -> Option<KnobId> {
        self.outputs.get(index).copied()
    }

    /// Whether the outputs reflect the current inputs
    pub fn is_calculated(&self) -> bool {
        self.calculated
    }

    /// Whether a loop through this node is legal
    pub fn allows_recursion(&self) -> bool {
        self.behavior.allows_recursion()
    }

    /// Whether a successful calculation propagates to dependents
    pub fn continues_calculation(&self) -> bool {
        self.behavior.continues_calculation()
    }

    /// Variant behavior
    pub fn behavior(&self) -> &dyn NodeBehavior {
        self.behavior.as_ref()
    }

    /// Mutable variant behavior
    pub fn behavior_mut(&mut self) -> &mut dyn NodeBehavior {
        self.behavior.as_mut()
    }

    /// Behavior as a concrete variant
    pub fn behavior_as<T: NodeBehavior + 'static>(&self) -> Option<&T> {
        self.behavior.as_ref().as_any().downcast_ref()
    }

    /// Mutable behavior as a concrete variant
    pub fn behavior_as_mut<T: NodeBehavior + 'static>(&mut self) -> Option<&mut T> {
        self.behavior.as_mut().as_any_mut().downcast_mut()
    }

    /// Rebuild the input/output views from `knobs`
    pub(crate) fn rebuild_views(&mut self, direction_of: impl Fn(&KnobId) -> Option<KnobDirection>) {
        self.inputs.clear();
        self.outputs.clear();
        for id in &self.knobs {
            match direction_of(id) {
                Some(KnobDirection::Input) => self.inputs.push(*id),
                Some(KnobDirection::Output) => self.outputs.push(*id),
                None => {}
            }
        }
    }
}

/// Collects the knobs a node variant declares in [`NodeBehavior::create`]
pub struct NodeBuilder<'a> {
    node: NodeId,
    types: &'a TypeRegistry,
    pub(crate) name: String,
    pub(crate) size: [f32; 2],
    pub(crate) knobs: Vec<Knob>,
}

impl<'a> NodeBuilder<'a> {
    pub(crate) fn new(node: NodeId, default_name: &str, types: &'a TypeRegistry) -> Self {
        Self {
            node,
            types,
            name: default_name.to_string(),
            size: [100.0, 60.0],
            knobs: Vec::new(),
        }
    }

    /// ID the node will have once created
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Set the display name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Set the node size
    pub fn set_size(&mut self, width: f32, height: f32) {
        self.size = [width, height];
    }

    /// Create an input on the default side
    pub fn create_input(&mut self, name: &str, type_key: &str) -> Result<KnobId> {
        self.create_knob(name, type_key, KnobDirection::Input, None)
    }

    /// Create an input on the given side and offset
    pub fn create_input_at(&mut self, name: &str, type_key: &str, side: Side, side_position: f32) -> Result<KnobId> {
        self.create_knob(name, type_key, KnobDirection::Input, Some((side, side_position)))
    }

    /// Create an output on the default side
    pub fn create_output(&mut self, name: &str, type_key: &str) -> Result<KnobId> {
        self.create_knob(name, type_key, KnobDirection::Output, None)
    }

    /// Create an output on the given side and offset
    pub fn create_output_at(&mut self, name: &str, type_key: &str, side: Side, side_position: f32) -> Result<KnobId> {
        self.create_knob(name, type_key, KnobDirection::Output, Some((side, side_position)))
    }

    fn create_knob(
        &mut self,
        name: &str,
        type_key: &str,
        direction: KnobDirection,
        layout: Option<(Side, f32)>,
    ) -> Result<KnobId> {
        let value_type = self.types.resolve(type_key)?.value_type;
        let (side, side_position) = layout.unwrap_or((direction.default_side(), DEFAULT_SIDE_POSITION));
        let knob = Knob::new(self.node, name, type_key, value_type, direction).with_side(side, side_position);
        let id = knob.id;
        self.knobs.push(knob);
        Ok(id)
    }
}
