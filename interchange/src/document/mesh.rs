//! Meshes, primitives and morph targets

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use super::JsonObject;
use crate::ids::{AccessorId, MaterialId};

/// Semantic name (`POSITION`, `TEXCOORD_0`, ...) to accessor
pub type Attributes = BTreeMap<String, AccessorId>;

pub const POSITION: &str = "POSITION";
pub const NORMAL: &str = "NORMAL";
pub const TANGENT: &str = "TANGENT";
pub const TEXCOORD_0: &str = "TEXCOORD_0";
pub const COLOR_0: &str = "COLOR_0";
pub const JOINTS_0: &str = "JOINTS_0";
pub const WEIGHTS_0: &str = "WEIGHTS_0";

/// Primitive topology
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Mode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl From<Mode> for u32 {
    fn from(mode: Mode) -> u32 {
        match mode {
            Mode::Points => 0,
            Mode::Lines => 1,
            Mode::LineLoop => 2,
            Mode::LineStrip => 3,
            Mode::Triangles => 4,
            Mode::TriangleStrip => 5,
            Mode::TriangleFan => 6,
        }
    }
}

impl TryFrom<u32> for Mode {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Mode::Points,
            1 => Mode::Lines,
            2 => Mode::LineLoop,
            3 => Mode::LineStrip,
            4 => Mode::Triangles,
            5 => Mode::TriangleStrip,
            6 => Mode::TriangleFan,
            other => return Err(format!("invalid primitive mode {other}")),
        })
    }
}

fn is_triangles(mode: &Mode) -> bool {
    *mode == Mode::Triangles
}

/// Primitive `extras`, with the morph target names pulled out
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveExtras {
    #[serde(
        rename = "targetNames",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub target_names: Vec<String>,
    #[serde(flatten)]
    pub other: JsonObject,
}

impl PrimitiveExtras {
    pub fn is_empty(&self) -> bool {
        self.target_names.is_empty() && self.other.is_empty()
    }
}

/// Older files put non-accessor entries (e.g. `extra`) inside morph targets.
/// Only integer entries are attribute references.
fn deserialize_targets<'de, D>(deserializer: D) -> Result<Vec<Attributes>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<BTreeMap<String, serde_json::Value>> = Vec::deserialize(deserializer)?;
    raw.into_iter()
        .map(|target| {
            target
                .into_iter()
                .filter_map(|(semantic, value)| value.as_u64().map(|index| (semantic, index)))
                .map(|(semantic, index)| {
                    let index = u32::try_from(index).map_err(|_| {
                        D::Error::custom(format!(
                            "morph target {semantic} index {index} is out of range"
                        ))
                    })?;
                    Ok((semantic, AccessorId(index)))
                })
                .collect()
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Primitive {
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<AccessorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<MaterialId>,
    #[serde(default, skip_serializing_if = "is_triangles")]
    pub mode: Mode,
    #[serde(
        default,
        deserialize_with = "deserialize_targets",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub targets: Vec<Attributes>,
    #[serde(default, skip_serializing_if = "PrimitiveExtras::is_empty")]
    pub extras: PrimitiveExtras,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extensions: JsonObject,
}

impl Primitive {
    pub fn attribute(&self, semantic: &str) -> Option<AccessorId> {
        self.attributes.get(semantic).copied()
    }

    pub fn has_vertex_color(&self) -> bool {
        self.attributes.contains_key(COLOR_0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
    /// Default morph weights
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weights: Vec<f32>,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extensions: JsonObject,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extras: JsonObject,
}
