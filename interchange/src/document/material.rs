//! Materials

use serde::{Deserialize, Serialize};

use super::{JsonObject, is_zero};
use crate::ids::TextureId;

pub const KHR_MATERIALS_UNLIT: &str = "KHR_materials_unlit";

/// Reference to a texture and the UV set it samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureInfo {
    pub index: TextureId,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub tex_coord: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f32>,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extensions: JsonObject,
}

impl TextureInfo {
    pub fn new(index: TextureId) -> Self {
        Self {
            index,
            tex_coord: 0,
            scale: None,
            strength: None,
            extensions: JsonObject::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PbrMetallicRoughness {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_color_factor: Option<[f32; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_color_texture: Option<TextureInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metallic_factor: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roughness_factor: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metallic_roughness_texture: Option<TextureInfo>,
}

impl PbrMetallicRoughness {
    pub fn base_color(&self) -> [f32; 4] {
        self.base_color_factor.unwrap_or([1.0; 4])
    }

    pub fn metallic(&self) -> f32 {
        self.metallic_factor.unwrap_or(1.0)
    }

    pub fn roughness(&self) -> f32 {
        self.roughness_factor.unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

fn is_opaque(mode: &AlphaMode) -> bool {
    *mode == AlphaMode::Opaque
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pbr_metallic_roughness: Option<PbrMetallicRoughness>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal_texture: Option<TextureInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occlusion_texture: Option<TextureInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissive_texture: Option<TextureInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissive_factor: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "is_opaque")]
    pub alpha_mode: AlphaMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha_cutoff: Option<f32>,
    /// Always written, even when false
    #[serde(default)]
    pub double_sided: bool,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extensions: JsonObject,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extras: JsonObject,
}

impl Material {
    pub fn is_unlit(&self) -> bool {
        self.extensions.contains_key(KHR_MATERIALS_UNLIT)
    }

    /// Effective alpha cutoff for `MASK` materials
    pub fn cutoff(&self) -> f32 {
        self.alpha_cutoff.unwrap_or(0.5)
    }
}
