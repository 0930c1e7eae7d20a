//! Mapping between host shading models and glTF materials
//!
//! Host materials are described by a [`ShadingModel`] tag. Each tag has a
//! fixed [`Strategy`] saying whether it exports as `KHR_materials_unlit` and
//! which alpha mode it forces. Host shader names are resolved to tags through
//! a [`ShadingRegistry`]; unregistered names fall back to
//! [`ShadingModel::Unknown`], which exports like a lit material.

use hashbrown::HashMap;
use serde_json::json;

use crate::document::{AlphaMode, KHR_MATERIALS_UNLIT, Material, PbrMetallicRoughness, TextureInfo};
use crate::ids::TextureId;

/// Material capability tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadingModel {
    UnlitOpaque,
    UnlitCutout,
    UnlitTransparent,
    MetallicRoughness,
    Unknown,
}

/// How a shading model maps onto glTF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    pub unlit: bool,
    /// `None` keeps the host material's own blend mode
    pub alpha_mode: Option<AlphaMode>,
}

impl ShadingModel {
    pub const fn strategy(self) -> Strategy {
        match self {
            ShadingModel::UnlitOpaque => Strategy {
                unlit: true,
                alpha_mode: Some(AlphaMode::Opaque),
            },
            ShadingModel::UnlitCutout => Strategy {
                unlit: true,
                alpha_mode: Some(AlphaMode::Mask),
            },
            ShadingModel::UnlitTransparent => Strategy {
                unlit: true,
                alpha_mode: Some(AlphaMode::Blend),
            },
            ShadingModel::MetallicRoughness | ShadingModel::Unknown => Strategy {
                unlit: false,
                alpha_mode: None,
            },
        }
    }

    /// Shading model a glTF material asks for
    pub fn classify(material: &Material) -> ShadingModel {
        if !material.is_unlit() {
            return ShadingModel::MetallicRoughness;
        }
        match material.alpha_mode {
            AlphaMode::Opaque => ShadingModel::UnlitOpaque,
            AlphaMode::Mask => ShadingModel::UnlitCutout,
            AlphaMode::Blend => ShadingModel::UnlitTransparent,
        }
    }
}

/// Host shader name to shading model
#[derive(Debug, Clone)]
pub struct ShadingRegistry {
    models: HashMap<String, ShadingModel>,
}

impl Default for ShadingRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("Unlit/Color", ShadingModel::UnlitOpaque);
        registry.register("Unlit/Texture", ShadingModel::UnlitOpaque);
        registry.register("Unlit/Transparent", ShadingModel::UnlitTransparent);
        registry.register("Unlit/Transparent Cutout", ShadingModel::UnlitCutout);
        registry.register("Standard", ShadingModel::MetallicRoughness);
        registry
    }
}

impl ShadingRegistry {
    pub fn empty() -> Self {
        Self {
            models: HashMap::new(),
        }
    }

    pub fn register(&mut self, shader: impl Into<String>, model: ShadingModel) {
        self.models.insert(shader.into(), model);
    }

    pub fn resolve(&self, shader: &str) -> ShadingModel {
        self.models
            .get(shader)
            .copied()
            .unwrap_or(ShadingModel::Unknown)
    }
}

/// Host-side material parameters
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDescription {
    pub name: String,
    pub shading: ShadingModel,
    /// Blend mode of lit materials
    pub alpha_mode: AlphaMode,
    pub alpha_cutoff: f32,
    pub double_sided: bool,
    pub color: [f32; 4],
    pub color_texture: Option<TextureId>,
    pub metallic: f32,
    /// `1 - roughness`
    pub smoothness: f32,
    pub metallic_roughness_texture: Option<TextureId>,
    pub normal_texture: Option<(TextureId, f32)>,
    pub occlusion_texture: Option<(TextureId, f32)>,
    pub emission: Option<[f32; 3]>,
    pub emission_texture: Option<TextureId>,
}

impl Default for MaterialDescription {
    fn default() -> Self {
        Self {
            name: String::new(),
            shading: ShadingModel::MetallicRoughness,
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: 0.5,
            double_sided: false,
            color: [1.0; 4],
            color_texture: None,
            metallic: 0.0,
            smoothness: 0.5,
            metallic_roughness_texture: None,
            normal_texture: None,
            occlusion_texture: None,
            emission: None,
            emission_texture: None,
        }
    }
}

/// Unlit material with the defaults other readers expect for its PBR fallback
fn unlit_default() -> Material {
    let mut material = Material {
        pbr_metallic_roughness: Some(PbrMetallicRoughness {
            base_color_factor: Some([1.0; 4]),
            roughness_factor: Some(0.9),
            metallic_factor: Some(0.0),
            ..Default::default()
        }),
        ..Default::default()
    };
    material
        .extensions
        .insert(KHR_MATERIALS_UNLIT.to_string(), json!({}));
    material
}

/// Build the glTF material for a host description
pub fn export_material(description: &MaterialDescription) -> Material {
    let strategy = description.shading.strategy();
    if description.shading == ShadingModel::Unknown {
        tracing::debug!(
            "material {:?}: unknown shading model, exporting as metallic-roughness",
            description.name
        );
    }

    let mut material = if strategy.unlit {
        unlit_default()
    } else {
        let mut lit = Material {
            pbr_metallic_roughness: Some(PbrMetallicRoughness::default()),
            ..Default::default()
        };
        if let Some(pbr) = lit.pbr_metallic_roughness.as_mut() {
            pbr.metallic_factor = Some(description.metallic);
            pbr.roughness_factor = Some(1.0 - description.smoothness);
            pbr.metallic_roughness_texture =
                description.metallic_roughness_texture.map(TextureInfo::new);
        }
        lit
    };

    material.name = Some(description.name.clone()).filter(|n| !n.is_empty());
    material.alpha_mode = strategy.alpha_mode.unwrap_or(description.alpha_mode);
    if material.alpha_mode == AlphaMode::Mask {
        material.alpha_cutoff = Some(description.alpha_cutoff);
    }
    material.double_sided = description.double_sided;

    if let Some(pbr) = material.pbr_metallic_roughness.as_mut() {
        pbr.base_color_factor = Some(description.color);
        pbr.base_color_texture = description.color_texture.map(TextureInfo::new);
    }
    material.normal_texture = description.normal_texture.map(|(index, scale)| TextureInfo {
        scale: Some(scale),
        ..TextureInfo::new(index)
    });
    material.occlusion_texture = description
        .occlusion_texture
        .map(|(index, strength)| TextureInfo {
            strength: Some(strength),
            ..TextureInfo::new(index)
        });
    material.emissive_factor = description.emission;
    material.emissive_texture = description.emission_texture.map(TextureInfo::new);

    material
}

/// Host description of an imported glTF material
pub fn describe_material(material: &Material, name: String) -> MaterialDescription {
    let pbr = material.pbr_metallic_roughness.clone().unwrap_or_default();
    MaterialDescription {
        name,
        shading: ShadingModel::classify(material),
        alpha_mode: material.alpha_mode,
        alpha_cutoff: material.cutoff(),
        double_sided: material.double_sided,
        color: pbr.base_color(),
        color_texture: pbr.base_color_texture.as_ref().map(|t| t.index),
        metallic: pbr.metallic(),
        smoothness: 1.0 - pbr.roughness(),
        metallic_roughness_texture: pbr.metallic_roughness_texture.as_ref().map(|t| t.index),
        normal_texture: material
            .normal_texture
            .as_ref()
            .map(|t| (t.index, t.scale.unwrap_or(1.0))),
        occlusion_texture: material
            .occlusion_texture
            .as_ref()
            .map(|t| (t.index, t.strength.unwrap_or(1.0))),
        emission: material.emissive_factor,
        emission_texture: material.emissive_texture.as_ref().map(|t| t.index),
    }
}
