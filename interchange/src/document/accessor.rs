//! Accessors: typed views over buffer views

use serde::{Deserialize, Serialize};

use super::{JsonObject, is_false, is_zero};
use crate::ids::BufferViewId;

/// Numeric type of each component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    /// Size of one component in bytes
    pub const fn size(self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::U32 | ComponentType::F32 => 4,
        }
    }

    pub const fn as_gl_enum(self) -> u32 {
        match self {
            ComponentType::I8 => 5120,
            ComponentType::U8 => 5121,
            ComponentType::I16 => 5122,
            ComponentType::U16 => 5123,
            ComponentType::U32 => 5125,
            ComponentType::F32 => 5126,
        }
    }

    /// Whether this type may be used for indices (mesh or sparse)
    pub const fn is_index_type(self) -> bool {
        matches!(
            self,
            ComponentType::U8 | ComponentType::U16 | ComponentType::U32
        )
    }
}

impl From<ComponentType> for u32 {
    fn from(value: ComponentType) -> u32 {
        value.as_gl_enum()
    }
}

impl TryFrom<u32> for ComponentType {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            5120 => Ok(ComponentType::I8),
            5121 => Ok(ComponentType::U8),
            5122 => Ok(ComponentType::I16),
            5123 => Ok(ComponentType::U16),
            5125 => Ok(ComponentType::U32),
            5126 => Ok(ComponentType::F32),
            other => Err(format!("invalid componentType {other}")),
        }
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ComponentType::I8 => "BYTE",
            ComponentType::U8 => "UNSIGNED_BYTE",
            ComponentType::I16 => "SHORT",
            ComponentType::U16 => "UNSIGNED_SHORT",
            ComponentType::U32 => "UNSIGNED_INT",
            ComponentType::F32 => "FLOAT",
        };
        f.write_str(name)
    }
}

/// Element shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessorType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl AccessorType {
    /// Number of components per element
    pub const fn component_count(self) -> usize {
        match self {
            AccessorType::Scalar => 1,
            AccessorType::Vec2 => 2,
            AccessorType::Vec3 => 3,
            AccessorType::Vec4 | AccessorType::Mat2 => 4,
            AccessorType::Mat3 => 9,
            AccessorType::Mat4 => 16,
        }
    }

    /// Shape holding `n` floats per element, as used for animation outputs
    pub const fn from_component_count(n: usize) -> Option<Self> {
        match n {
            1 => Some(AccessorType::Scalar),
            2 => Some(AccessorType::Vec2),
            3 => Some(AccessorType::Vec3),
            4 => Some(AccessorType::Vec4),
            16 => Some(AccessorType::Mat4),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccessorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AccessorType::Scalar => "SCALAR",
            AccessorType::Vec2 => "VEC2",
            AccessorType::Vec3 => "VEC3",
            AccessorType::Vec4 => "VEC4",
            AccessorType::Mat2 => "MAT2",
            AccessorType::Mat3 => "MAT3",
            AccessorType::Mat4 => "MAT4",
        };
        f.write_str(name)
    }
}

/// Location of sparse indices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseIndices {
    pub buffer_view: BufferViewId,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub byte_offset: u32,
    pub component_type: ComponentType,
}

/// Location of sparse replacement values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseValues {
    pub buffer_view: BufferViewId,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub byte_offset: u32,
}

/// Sparse overlay replacing `count` elements of the base array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sparse {
    pub count: u32,
    pub indices: SparseIndices,
    pub values: SparseValues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    /// Absent for accessors whose base array is all zeros
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_view: Option<BufferViewId>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub byte_offset: u32,
    pub component_type: ComponentType,
    #[serde(default, skip_serializing_if = "is_false")]
    pub normalized: bool,
    pub count: u32,
    #[serde(rename = "type")]
    pub accessor_type: AccessorType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub min: Vec<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub max: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparse: Option<Sparse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extensions: JsonObject,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extras: JsonObject,
}

impl Accessor {
    pub fn new(
        buffer_view: Option<BufferViewId>,
        component_type: ComponentType,
        accessor_type: AccessorType,
        count: u32,
    ) -> Self {
        Self {
            buffer_view,
            byte_offset: 0,
            component_type,
            normalized: false,
            count,
            accessor_type,
            min: Vec::new(),
            max: Vec::new(),
            sparse: None,
            name: None,
            extensions: JsonObject::new(),
            extras: JsonObject::new(),
        }
    }

    /// Size of one tightly packed element in bytes
    pub fn element_size(&self) -> usize {
        self.component_type.size() * self.accessor_type.component_count()
    }
}
