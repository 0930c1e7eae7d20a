//! Buffers and buffer views

use serde::{Deserialize, Serialize};

use super::{JsonObject, is_zero};
use crate::ids::BufferId;

/// Raw byte store, optionally backed by a URI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub byte_length: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extensions: JsonObject,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extras: JsonObject,
}

/// Intended GPU binding of a buffer view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Target {
    ArrayBuffer,
    ElementArrayBuffer,
}

impl From<Target> for u32 {
    fn from(target: Target) -> u32 {
        match target {
            Target::ArrayBuffer => 34962,
            Target::ElementArrayBuffer => 34963,
        }
    }
}

impl TryFrom<u32> for Target {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            34962 => Ok(Target::ArrayBuffer),
            34963 => Ok(Target::ElementArrayBuffer),
            other => Err(format!("invalid bufferView target {other}")),
        }
    }
}

/// Byte range of a buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    pub buffer: BufferId,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub byte_offset: u32,
    pub byte_length: u32,
    /// Distance between element starts. `None` means tightly packed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_stride: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extensions: JsonObject,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extras: JsonObject,
}

impl BufferView {
    pub fn new(buffer: BufferId, byte_offset: u32, byte_length: u32) -> Self {
        Self {
            buffer,
            byte_offset,
            byte_length,
            byte_stride: None,
            target: None,
            name: None,
            extensions: JsonObject::new(),
            extras: JsonObject::new(),
        }
    }

    /// One past the last byte of this view within its buffer
    pub fn end(&self) -> u64 {
        self.byte_offset as u64 + self.byte_length as u64
    }
}
