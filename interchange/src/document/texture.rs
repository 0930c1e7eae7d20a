//! Images, samplers and textures

use serde::{Deserialize, Serialize};

use super::JsonObject;
use crate::ids::{BufferViewId, ImageId, SamplerId};

pub const REPEAT: u32 = 10497;
pub const CLAMP_TO_EDGE: u32 = 33071;
pub const MIRRORED_REPEAT: u32 = 33648;
pub const NEAREST: u32 = 9728;
pub const LINEAR: u32 = 9729;
pub const LINEAR_MIPMAP_LINEAR: u32 = 9987;

/// Encoded image, stored either behind a URI or in a buffer view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_view: Option<BufferViewId>,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extensions: JsonObject,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extras: JsonObject,
}

impl Image {
    /// Display name: explicit name, else derived from where the bytes live
    pub fn display_name(&self, index: ImageId) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        match self.uri.as_deref() {
            None => format!("{:02}#GLB", index.0),
            Some(uri) if uri.starts_with("data:") => format!("{:02}#Base64Embedded", index.0),
            Some(uri) => std::path::Path::new(uri)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("{:02}", index.0)),
        }
    }

    /// File extension for the encoded bytes (with leading dot)
    pub fn file_extension(&self) -> &str {
        match self.mime_type.as_deref() {
            Some("image/png") => return ".png",
            Some("image/jpeg") => return ".jpg",
            _ => {}
        }
        match self.uri.as_deref() {
            Some(uri) if !uri.starts_with("data:") => uri
                .rfind('.')
                .filter(|&dot| !uri[dot..].contains('/'))
                .map_or(".png", |dot| &uri[dot..]),
            _ => ".png",
        }
    }
}

fn is_repeat(wrap: &u32) -> bool {
    *wrap == REPEAT
}

fn repeat() -> u32 {
    REPEAT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sampler {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mag_filter: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_filter: Option<u32>,
    #[serde(default = "repeat", skip_serializing_if = "is_repeat")]
    pub wrap_s: u32,
    #[serde(default = "repeat", skip_serializing_if = "is_repeat")]
    pub wrap_t: u32,
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            name: None,
            mag_filter: Some(LINEAR),
            min_filter: Some(LINEAR_MIPMAP_LINEAR),
            wrap_s: REPEAT,
            wrap_t: REPEAT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampler: Option<SamplerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ImageId>,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extensions: JsonObject,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extras: JsonObject,
}
