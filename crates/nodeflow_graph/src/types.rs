// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection types and the registry that resolves knob type keys.
//!
//! Every knob names its type with a string key. The key resolves through a
//! [`TypeRegistry`] to a [`ConnectionType`] describing the native value type,
//! display color and default value. Two knobs may only be connected when their
//! keys resolve to the same [`ValueType`].

use crate::error::{GraphError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Native type of the values carried by a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Boolean value
    Bool,
    /// Integer value
    Int,
    /// Floating point value
    Float,
    /// 2D vector
    Vector2,
    /// 3D vector
    Vector3,
    /// Color (RGBA)
    Color,
    /// String value
    String,
}

impl ValueType {
    /// Zero value of this type
    pub fn default_value(self) -> KnobValue {
        match self {
            Self::Bool => KnobValue::Bool(false),
            Self::Int => KnobValue::Int(0),
            Self::Float => KnobValue::Float(0.0),
            Self::Vector2 => KnobValue::Vector2([0.0; 2]),
            Self::Vector3 => KnobValue::Vector3([0.0; 3]),
            Self::Color => KnobValue::Color([0.0, 0.0, 0.0, 1.0]),
            Self::String => KnobValue::String(String::new()),
        }
    }

    /// Display color for connections of this type
    pub fn color(self) -> [u8; 3] {
        match self {
            Self::Bool => [200, 80, 80],
            Self::Int => [80, 200, 200],
            Self::Float => [80, 200, 80],
            Self::Vector2 => [200, 200, 80],
            Self::Vector3 => [200, 150, 80],
            Self::Color => [255, 200, 100],
            Self::String => [200, 180, 150],
        }
    }
}

/// Value carried by an output knob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KnobValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i32),
    /// Float
    Float(f32),
    /// 2D vector
    Vector2([f32; 2]),
    /// 3D vector
    Vector3([f32; 3]),
    /// Color
    Color([f32; 4]),
    /// String
    String(String),
}

impl KnobValue {
    /// Native type of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Vector2(_) => ValueType::Vector2,
            Self::Vector3(_) => ValueType::Vector3,
            Self::Color(_) => ValueType::Color,
            Self::String(_) => ValueType::String,
        }
    }
}

/// Rust types that can be read from and written to knobs
pub trait KnobData: Sized {
    /// Native type backing this Rust type
    const VALUE_TYPE: ValueType;

    /// Extract from a knob value, `None` if the variant differs
    fn from_value(value: &KnobValue) -> Option<Self>;

    /// Wrap into a knob value
    fn into_value(self) -> KnobValue;
}

macro_rules! impl_knob_data {
    ($ty:ty, $variant:ident) => {
        impl KnobData for $ty {
            const VALUE_TYPE: ValueType = ValueType::$variant;

            fn from_value(value: &KnobValue) -> Option<Self> {
                match value {
                    KnobValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }

            fn into_value(self) -> KnobValue {
                KnobValue::$variant(self)
            }
        }
    };
}

impl_knob_data!(bool, Bool);
impl_knob_data!(i32, Int);
impl_knob_data!(f32, Float);
impl_knob_data!([f32; 2], Vector2);
impl_knob_data!([f32; 3], Vector3);
impl_knob_data!([f32; 4], Color);
impl_knob_data!(String, String);

/// Descriptor for a named connection type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionType {
    /// Unique key knobs refer to
    pub key: String,
    /// Native value type
    pub value_type: ValueType,
    /// Display color
    pub color: [u8; 3],
    /// Value read from unconnected inputs of this type
    pub default_value: KnobValue,
    /// Icon name for input knobs
    pub input_icon: String,
    /// Icon name for output knobs
    pub output_icon: String,
}

impl ConnectionType {
    /// Create a descriptor using the native type's color and zero value
    pub fn new(key: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            key: key.into(),
            value_type,
            color: value_type.color(),
            default_value: value_type.default_value(),
            input_icon: "knob_in".to_string(),
            output_icon: "knob_out".to_string(),
        }
    }

    /// Set the display color
    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }

    /// Set the icon names
    pub fn with_icons(mut self, input: impl Into<String>, output: impl Into<String>) -> Self {
        self.input_icon = input.into();
        self.output_icon = output.into();
        self
    }
}

/// Registry of connection types by key
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, ConnectionType>,
}

impl TypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding one type per native value type
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        for (key, value_type) in [
            ("Float", ValueType::Float),
            ("Int", ValueType::Int),
            ("Bool", ValueType::Bool),
            ("String", ValueType::String),
            ("Vector2", ValueType::Vector2),
            ("Vector3", ValueType::Vector3),
            ("Color", ValueType::Color),
        ] {
            registry.types.insert(key.to_string(), ConnectionType::new(key, value_type));
        }
        registry
    }

    /// Register a connection type
    pub fn register(&mut self, descriptor: ConnectionType) -> Result<()> {
        if self.types.contains_key(&descriptor.key) {
            return Err(GraphError::DuplicateKey(descriptor.key));
        }
        self.types.insert(descriptor.key.clone(), descriptor);
        Ok(())
    }

    /// Resolve a key to its descriptor
    pub fn resolve(&self, key: &str) -> Result<&ConnectionType> {
        self.types
            .get(key)
            .ok_or_else(|| GraphError::UnknownType(key.to_string()))
    }

    /// Default value for the type registered under `key`
    pub fn default_value(&self, key: &str) -> Result<KnobValue> {
        self.resolve(key).map(|t| t.default_value.clone())
    }

    /// Check whether a key is registered
    pub fn contains(&self, key: &str) -> bool {
        self.types.contains_key(key)
    }

    /// All registered descriptors, in registration order
    pub fn types(&self) -> impl Iterator<Item = &ConnectionType> {
        self.types.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let mut registry = TypeRegistry::new();
        registry
            .register(ConnectionType::new("Weight", ValueType::Float))
            .unwrap();

        let resolved = registry.resolve("Weight").unwrap();
        assert_eq!(resolved.value_type, ValueType::Float);
        assert_eq!(registry.default_value("Weight").unwrap(), KnobValue::Float(0.0));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut registry = TypeRegistry::with_builtin_types();
        let err = registry
            .register(ConnectionType::new("Float", ValueType::Float))
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateKey(key) if key == "Float"));
    }

    #[test]
    fn test_unknown_type() {
        let registry = TypeRegistry::new();
        assert!(matches!(
            registry.resolve("Texture"),
            Err(GraphError::UnknownType(_))
        ));
        assert!(registry.default_value("Texture").is_err());
    }

    #[test]
    fn test_knob_data_conversion() {
        assert_eq!(f32::from_value(&KnobValue::Float(2.5)), Some(2.5));
        assert_eq!(f32::from_value(&KnobValue::Int(2)), None);
        assert_eq!(
            String::from("hi").into_value().value_type(),
            ValueType::String
        );
        assert_eq!(<[f32; 4]>::VALUE_TYPE, ValueType::Color);
    }
}
