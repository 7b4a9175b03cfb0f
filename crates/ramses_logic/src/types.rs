//! Property types and values
//!
//! Values are a closed sum type over the supported primitives. Typed access
//! goes through [`PropertyValueType`], which every supported Rust type
//! implements, so a mismatch is reported as `None`/`false` instead of a panic.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type Vec2f = [f32; 2];
pub type Vec3f = [f32; 3];
pub type Vec4f = [f32; 4];
pub type Vec2i = [i32; 2];
pub type Vec3i = [i32; 3];
pub type Vec4i = [i32; 4];

/// Runtime type of a property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    Bool,
    Int32,
    Int64,
    Float,
    String,
    Vec2f,
    Vec3f,
    Vec4f,
    Vec2i,
    Vec3i,
    Vec4i,
    Struct,
    Array,
}

impl PropertyType {
    /// Whether values of this type can be read, set and linked directly
    pub fn is_primitive(self) -> bool {
        !matches!(self, PropertyType::Struct | PropertyType::Array)
    }

    /// Value a freshly created property of this type holds
    pub fn default_value(self) -> Option<PropertyValue> {
        let value = match self {
            PropertyType::Bool => PropertyValue::Bool(false),
            PropertyType::Int32 => PropertyValue::Int32(0),
            PropertyType::Int64 => PropertyValue::Int64(0),
            PropertyType::Float => PropertyValue::Float(0.0),
            PropertyType::String => PropertyValue::String(String::new()),
            PropertyType::Vec2f => PropertyValue::Vec2f([0.0; 2]),
            PropertyType::Vec3f => PropertyValue::Vec3f([0.0; 3]),
            PropertyType::Vec4f => PropertyValue::Vec4f([0.0; 4]),
            PropertyType::Vec2i => PropertyValue::Vec2i([0; 2]),
            PropertyType::Vec3i => PropertyValue::Vec3i([0; 3]),
            PropertyType::Vec4i => PropertyValue::Vec4i([0; 4]),
            PropertyType::Struct | PropertyType::Array => return None,
        };
        Some(value)
    }

    pub fn name(self) -> &'static str {
        match self {
            PropertyType::Bool => "Bool",
            PropertyType::Int32 => "Int32",
            PropertyType::Int64 => "Int64",
            PropertyType::Float => "Float",
            PropertyType::String => "String",
            PropertyType::Vec2f => "Vec2f",
            PropertyType::Vec3f => "Vec3f",
            PropertyType::Vec4f => "Vec4f",
            PropertyType::Vec2i => "Vec2i",
            PropertyType::Vec3i => "Vec3i",
            PropertyType::Vec4i => "Vec4i",
            PropertyType::Struct => "Struct",
            PropertyType::Array => "Array",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value of a primitive property
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float(f32),
    String(String),
    Vec2f(Vec2f),
    Vec3f(Vec3f),
    Vec4f(Vec4f),
    Vec2i(Vec2i),
    Vec3i(Vec3i),
    Vec4i(Vec4i),
}

impl PropertyValue {
    pub fn property_type(&self) -> PropertyType {
        match self {
            PropertyValue::Bool(_) => PropertyType::Bool,
            PropertyValue::Int32(_) => PropertyType::Int32,
            PropertyValue::Int64(_) => PropertyType::Int64,
            PropertyValue::Float(_) => PropertyType::Float,
            PropertyValue::String(_) => PropertyType::String,
            PropertyValue::Vec2f(_) => PropertyType::Vec2f,
            PropertyValue::Vec3f(_) => PropertyType::Vec3f,
            PropertyValue::Vec4f(_) => PropertyType::Vec4f,
            PropertyValue::Vec2i(_) => PropertyType::Vec2i,
            PropertyValue::Vec3i(_) => PropertyType::Vec3i,
            PropertyValue::Vec4i(_) => PropertyType::Vec4i,
        }
    }

    /// Typed copy of the value, `None` on type mismatch
    pub fn get<T: PropertyValueType>(&self) -> Option<T> {
        T::from_value(self)
    }

    /// Equality with floats compared bitwise, so NaN equals itself
    pub(crate) fn is_identical(&self, other: &PropertyValue) -> bool {
        fn bits<const N: usize>(a: &[f32; N], b: &[f32; N]) -> bool {
            a.iter().zip(b).all(|(a, b)| a.to_bits() == b.to_bits())
        }
        match (self, other) {
            (PropertyValue::Float(a), PropertyValue::Float(b)) => a.to_bits() == b.to_bits(),
            (PropertyValue::Vec2f(a), PropertyValue::Vec2f(b)) => bits(a, b),
            (PropertyValue::Vec3f(a), PropertyValue::Vec3f(b)) => bits(a, b),
            (PropertyValue::Vec4f(a), PropertyValue::Vec4f(b)) => bits(a, b),
            _ => self == other,
        }
    }
}

/// Rust types that map onto exactly one primitive [`PropertyType`]
pub trait PropertyValueType: Sized {
    const PROPERTY_TYPE: PropertyType;

    fn into_value(self) -> PropertyValue;

    fn from_value(value: &PropertyValue) -> Option<Self>;
}

macro_rules! impl_property_value_type {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl PropertyValueType for $ty {
                const PROPERTY_TYPE: PropertyType = PropertyType::$variant;

                fn into_value(self) -> PropertyValue {
                    PropertyValue::$variant(self)
                }

                fn from_value(value: &PropertyValue) -> Option<Self> {
                    match value {
                        PropertyValue::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    PropertyValue::$variant(value)
                }
            }
        )*
    };
}

impl_property_value_type! {
    bool => Bool,
    i32 => Int32,
    i64 => Int64,
    f32 => Float,
    String => String,
    Vec2f => Vec2f,
    Vec3f => Vec3f,
    Vec4f => Vec4f,
    Vec2i => Vec2i,
    Vec3i => Vec3i,
    Vec4i => Vec4i,
}

/// Shape of a property tree, used to create node interfaces
///
/// Array elements carry an empty name.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDecl {
    pub name: String,
    pub property_type: PropertyType,
    pub children: Vec<PropertyDecl>,
}

impl PropertyDecl {
    /// Primitive property
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            children: Vec::new(),
        }
    }

    pub fn structure(name: impl Into<String>, children: Vec<PropertyDecl>) -> Self {
        Self {
            name: name.into(),
            property_type: PropertyType::Struct,
            children,
        }
    }

    /// Array of `len` copies of `element`
    pub fn array(name: impl Into<String>, len: usize, element: PropertyDecl) -> Self {
        let element = PropertyDecl {
            name: String::new(),
            ..element
        };
        Self {
            name: name.into(),
            property_type: PropertyType::Array,
            children: vec![element; len],
        }
    }
}
