//! In-memory glTF document
//!
//! Every cross-reference is a typed index into one of the root's flat lists.
//! Parsing applies the version gate and legacy backfill; serialization drops
//! implied `byteStride` values and extension objects that are not declared in
//! `extensionsUsed`.

mod accessor;
mod animation;
mod buffer;
mod camera;
mod material;
mod mesh;
mod scene;
mod texture;

pub use accessor::{Accessor, AccessorType, ComponentType, Sparse, SparseIndices, SparseValues};
pub use animation::{Animation, AnimationSampler, Channel, ChannelTarget, Interpolation, Path};
pub use buffer::{Buffer, BufferView, Target};
pub use camera::{Camera, CameraType, Orthographic, Perspective};
pub use material::{AlphaMode, KHR_MATERIALS_UNLIT, Material, PbrMetallicRoughness, TextureInfo};
pub use mesh::{
    Attributes, COLOR_0, JOINTS_0, Mesh, Mode, NORMAL, POSITION, Primitive, PrimitiveExtras,
    TANGENT, TEXCOORD_0, WEIGHTS_0,
};
pub use scene::{Node, Scene, Skin};
pub use texture::{Image, Sampler, Texture};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::compat;
use crate::error::{GltfError, Result};
use crate::ids::*;

/// Raw `extensions` / `extras` object
pub type JsonObject = serde_json::Map<String, Value>;

/// The only asset version this codec reads
pub const GLTF_VERSION: &str = "2.0";

pub(crate) fn is_zero(value: &u32) -> bool {
    *value == 0
}

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extensions: JsonObject,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extras: JsonObject,
}

impl Default for Asset {
    fn default() -> Self {
        Self {
            version: GLTF_VERSION.to_string(),
            generator: None,
            copyright: None,
            min_version: None,
            extensions: JsonObject::new(),
            extras: JsonObject::new(),
        }
    }
}

/// Root of a glTF document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub asset: Asset,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions_used: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions_required: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffers: Vec<Buffer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffer_views: Vec<BufferView>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessors: Vec<Accessor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Image>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samplers: Vec<Sampler>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub textures: Vec<Texture>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<Material>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meshes: Vec<Mesh>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skins: Vec<Skin>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cameras: Vec<Camera>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
    /// Active scene
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<SceneId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenes: Vec<Scene>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub animations: Vec<Animation>,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extensions: JsonObject,
    #[serde(default, skip_serializing_if = "JsonObject::is_empty")]
    pub extras: JsonObject,
}

macro_rules! lookups {
    ($($method:ident: $field:ident[$id:ty] -> $item:ty;)*) => {
        $(
            pub fn $method(&self, id: $id) -> Result<&$item> {
                self.$field.get(id.index()).ok_or(GltfError::IndexOutOfRange {
                    list: <$id>::LIST,
                    index: id.0,
                    len: self.$field.len(),
                })
            }
        )*
    };
}

fn check_index(list: &'static str, index: u32, len: usize) -> Result<()> {
    if (index as usize) < len {
        Ok(())
    } else {
        Err(GltfError::IndexOutOfRange { list, index, len })
    }
}

impl Document {
    /// Create an empty 2.0 document
    pub fn new(generator: impl Into<String>) -> Self {
        Self {
            asset: Asset {
                generator: Some(generator.into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    lookups! {
        buffer: buffers[BufferId] -> Buffer;
        buffer_view: buffer_views[BufferViewId] -> BufferView;
        accessor: accessors[AccessorId] -> Accessor;
        image: images[ImageId] -> Image;
        sampler: samplers[SamplerId] -> Sampler;
        texture: textures[TextureId] -> Texture;
        material: materials[MaterialId] -> Material;
        mesh: meshes[MeshId] -> Mesh;
        skin: skins[SkinId] -> Skin;
        camera: cameras[CameraId] -> Camera;
        node: nodes[NodeId] -> Node;
        scene_at: scenes[SceneId] -> Scene;
        animation: animations[AnimationId] -> Animation;
    }

    /// Parse JSON text, reject non-2.0 assets and recover legacy fields
    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(text.trim_start_matches('\u{feff}'))?;
        // Older versions use a different layout, so gate before the typed decode
        if let Some(version) = raw.pointer("/asset/version").and_then(Value::as_str) {
            if version != GLTF_VERSION {
                return Err(GltfError::UnsupportedVersion(version.to_string()));
            }
        }
        let mut document = Document::deserialize(&raw)?;

        compat::apply_legacy_backfill(&mut document, &raw);
        tracing::debug!(
            "parsed glTF document: {} nodes, {} meshes, {} accessors",
            document.nodes.len(),
            document.meshes.len(),
            document.accessors.len()
        );
        Ok(document)
    }

    /// Parse UTF-8 JSON bytes (e.g. a GLB JSON chunk)
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Self::from_json_str(std::str::from_utf8(bytes)?)
    }

    /// Serialize to a JSON tree with the output filters applied
    pub fn to_json_value(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self)?;
        self.strip_implied_strides(&mut value);
        retain_used_extensions(&mut value, &self.extensions_used);
        Ok(value)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_json_value()?)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_json_value()?)?)
    }

    /// `byteStride` is written only where a reader could not infer it: views
    /// shared by several accessors, or views whose stride differs from the
    /// element size of the accessor reading them.
    fn strip_implied_strides(&self, value: &mut Value) {
        let Some(views) = value.get_mut("bufferViews").and_then(Value::as_array_mut) else {
            return;
        };

        let mut element_sizes: Vec<Vec<usize>> = vec![Vec::new(); self.buffer_views.len()];
        for accessor in &self.accessors {
            if let Some(sizes) = accessor
                .buffer_view
                .and_then(|view| element_sizes.get_mut(view.index()))
            {
                sizes.push(accessor.element_size());
            }
        }

        for (index, view) in views.iter_mut().enumerate() {
            let required = match self.buffer_views.get(index).and_then(|v| v.byte_stride) {
                Some(stride) => {
                    let sizes = &element_sizes[index];
                    sizes.len() > 1 || sizes.first().is_some_and(|&size| size != stride as usize)
                }
                None => false,
            };
            if !required {
                if let Some(object) = view.as_object_mut() {
                    object.retain(|key, _| key != "byteStride");
                }
            }
        }
    }

    /// Check every cross-reference and the buffer layout rules
    pub fn validate(&self) -> Result<()> {
        if let Some(scene) = self.scene {
            check_index(SceneId::LIST, scene.0, self.scenes.len())?;
        }
        for scene in &self.scenes {
            for node in &scene.nodes {
                check_index(NodeId::LIST, node.0, self.nodes.len())?;
            }
        }

        self.validate_node_tree()?;
        for node in &self.nodes {
            if let Some(mesh) = node.mesh {
                check_index(MeshId::LIST, mesh.0, self.meshes.len())?;
            }
            if let Some(skin) = node.skin {
                check_index(SkinId::LIST, skin.0, self.skins.len())?;
            }
            if let Some(camera) = node.camera {
                check_index(CameraId::LIST, camera.0, self.cameras.len())?;
            }
        }

        let accessors = self.accessors.len();
        for mesh in &self.meshes {
            for primitive in &mesh.primitives {
                let attributes = primitive
                    .attributes
                    .values()
                    .chain(primitive.targets.iter().flat_map(|t| t.values()))
                    .chain(primitive.indices.iter());
                for accessor in attributes {
                    check_index(AccessorId::LIST, accessor.0, accessors)?;
                }
                if let Some(material) = primitive.material {
                    check_index(MaterialId::LIST, material.0, self.materials.len())?;
                }
            }
        }

        for skin in &self.skins {
            for joint in skin.joints.iter().chain(skin.skeleton.iter()) {
                check_index(NodeId::LIST, joint.0, self.nodes.len())?;
            }
            if let Some(ibm) = skin.inverse_bind_matrices {
                check_index(AccessorId::LIST, ibm.0, accessors)?;
            }
        }

        for material in &self.materials {
            let pbr = material.pbr_metallic_roughness.as_ref();
            let infos = [
                pbr.and_then(|p| p.base_color_texture.as_ref()),
                pbr.and_then(|p| p.metallic_roughness_texture.as_ref()),
                material.normal_texture.as_ref(),
                material.occlusion_texture.as_ref(),
                material.emissive_texture.as_ref(),
            ];
            for info in infos.into_iter().flatten() {
                check_index(TextureId::LIST, info.index.0, self.textures.len())?;
            }
        }

        for texture in &self.textures {
            if let Some(sampler) = texture.sampler {
                check_index(SamplerId::LIST, sampler.0, self.samplers.len())?;
            }
            if let Some(source) = texture.source {
                check_index(ImageId::LIST, source.0, self.images.len())?;
            }
        }
        for image in &self.images {
            if let Some(view) = image.buffer_view {
                check_index(BufferViewId::LIST, view.0, self.buffer_views.len())?;
            }
        }

        for animation in &self.animations {
            for channel in &animation.channels {
                check_index(AnimationSamplerId::LIST, channel.sampler.0, animation.samplers.len())?;
                if let Some(node) = channel.target.node {
                    check_index(NodeId::LIST, node.0, self.nodes.len())?;
                }
            }
            for sampler in &animation.samplers {
                check_index(AccessorId::LIST, sampler.input.0, accessors)?;
                check_index(AccessorId::LIST, sampler.output.0, accessors)?;
            }
        }

        self.validate_buffer_views()?;
        self.validate_accessors()
    }

    /// Each node has at most one parent and no node is its own ancestor
    fn validate_node_tree(&self) -> Result<()> {
        let mut parent: Vec<Option<usize>> = vec![None; self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate() {
            for child in &node.children {
                check_index(NodeId::LIST, child.0, self.nodes.len())?;
                if parent[child.index()].replace(index).is_some() {
                    return Err(GltfError::Invalid(format!(
                        "node {} has more than one parent",
                        child.0
                    )));
                }
            }
        }

        for start in 0..self.nodes.len() {
            let mut current = parent[start];
            let mut steps = 0;
            while let Some(p) = current {
                steps += 1;
                if p == start || steps > self.nodes.len() {
                    return Err(GltfError::Invalid(format!(
                        "node {start} is its own ancestor"
                    )));
                }
                current = parent[p];
            }
        }
        Ok(())
    }

    fn validate_buffer_views(&self) -> Result<()> {
        for (index, view) in self.buffer_views.iter().enumerate() {
            let buffer = self.buffer(view.buffer)?;
            if view.end() > buffer.byte_length as u64 {
                return Err(GltfError::Invalid(format!(
                    "bufferView {index} ends at {} past buffer {} length {}",
                    view.end(),
                    view.buffer.0,
                    buffer.byte_length
                )));
            }
            if let Some(stride) = view.byte_stride {
                let indexed = view.target == Some(Target::ElementArrayBuffer);
                if indexed || stride % 4 != 0 || !(4..=252).contains(&stride) {
                    return Err(GltfError::InvalidByteStride {
                        view: index as u32,
                        stride,
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_accessors(&self) -> Result<()> {
        for (index, accessor) in self.accessors.iter().enumerate() {
            if let Some(view_id) = accessor.buffer_view {
                let view = self.buffer_view(view_id)?;
                let element = accessor.element_size() as u64;
                let stride = view.byte_stride.map_or(element, u64::from);
                let needed = match accessor.count {
                    0 => 0,
                    n => accessor.byte_offset as u64 + stride * (n as u64 - 1) + element,
                };
                if needed > view.byte_length as u64 {
                    return Err(GltfError::AccessorOutOfBounds {
                        accessor: index as u32,
                        buffer: view.buffer.0,
                    });
                }
            }

            if let Some(sparse) = &accessor.sparse {
                if sparse.count > accessor.count {
                    return Err(GltfError::Invalid(format!(
                        "accessor {index}: sparse count {} exceeds count {}",
                        sparse.count, accessor.count
                    )));
                }
                if !sparse.indices.component_type.is_index_type() {
                    return Err(GltfError::UnsupportedComponentType {
                        accessor: index as u32,
                        component_type: sparse.indices.component_type.as_gl_enum(),
                    });
                }
                self.buffer_view(sparse.indices.buffer_view)?;
                self.buffer_view(sparse.values.buffer_view)?;
            }
        }
        Ok(())
    }

    /// Value equality over the content lists. Buffers and buffer views are
    /// layout details and are not compared.
    pub fn content_eq(&self, other: &Document) -> bool {
        self.textures == other.textures
            && self.samplers == other.samplers
            && self.images == other.images
            && self.materials == other.materials
            && self.meshes == other.meshes
            && self.nodes == other.nodes
            && self.skins == other.skins
            && self.scene == other.scene
            && self.scenes == other.scenes
            && self.animations == other.animations
            && self.accessors == other.accessors
    }

    /// Root nodes of the active scene (or the first scene)
    pub fn root_nodes(&self) -> &[NodeId] {
        let scene = self.scene.map_or(0, SceneId::index);
        self.scenes
            .get(scene)
            .map_or(&[][..], |scene| scene.nodes.as_slice())
    }

    /// Material name unique within the document. Names are prefixed with the
    /// index when any name is missing or duplicated.
    pub fn unique_material_name(&self, id: MaterialId) -> Result<String> {
        let material = self.material(id)?;
        let name = material.name.as_deref().unwrap_or("");

        let any_missing = self
            .materials
            .iter()
            .any(|m| m.name.as_deref().is_none_or(str::is_empty));
        let mut names: Vec<&str> = self
            .materials
            .iter()
            .map(|m| m.name.as_deref().unwrap_or(""))
            .collect();
        names.sort_unstable();
        names.dedup();
        let duplicated = names.len() != self.materials.len();

        if any_missing || duplicated {
            Ok(format!("{:02}_{}", id.0, name))
        } else {
            Ok(name.to_string())
        }
    }

    /// Whether any primitive using this material carries `COLOR_0`
    pub fn material_has_vertex_color(&self, id: MaterialId) -> bool {
        self.meshes
            .iter()
            .flat_map(|mesh| &mesh.primitives)
            .any(|p| p.material == Some(id) && p.has_vertex_color())
    }

    /// Declare an extension in `extensionsUsed` if not yet present
    pub fn use_extension(&mut self, name: &str) {
        if !self.extensions_used.iter().any(|e| e == name) {
            self.extensions_used.push(name.to_string());
        }
    }
}

/// Drop every `extensions` entry whose key is not declared in `used`
fn retain_used_extensions(value: &mut Value, used: &[String]) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Object(extensions)) = map.get_mut("extensions") {
                extensions.retain(|key, _| used.iter().any(|u| u == key));
            }
            map.retain(|key, child| {
                key != "extensions" || child.as_object().is_none_or(|e| !e.is_empty())
            });
            for (key, child) in map.iter_mut() {
                if key != "extras" {
                    retain_used_extensions(child, used);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                retain_used_extensions(item, used);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Document {
        let mut document = Document::new("test");
        document.buffers.push(Buffer {
            byte_length: 48,
            ..Default::default()
        });
        document
    }

    #[test]
    fn test_version_gate() {
        let err = Document::from_json_str(r#"{"asset":{"version":"1.0"}}"#).unwrap_err();
        assert_eq!(err.to_string(), "unknown gltf version 1.0");
    }

    #[test]
    fn test_version_gate_runs_before_layout_decode() {
        // 1.0 keys every list by name, which the 2.0 model cannot decode
        let text = r#"{
            "asset": {"version": "1.0"},
            "meshes": {"mesh_0": {"primitives": [{"attributes": {"POSITION": "acc_0"}}]}},
            "nodes": {"node_0": {"meshes": ["mesh_0"]}},
            "scene": "default"
        }"#;
        let err = Document::from_json_str(text).unwrap_err();
        assert!(matches!(&err, GltfError::UnsupportedVersion(v) if v == "1.0"));
        assert_eq!(err.to_string(), "unknown gltf version 1.0");
    }

    #[test]
    fn test_parse_minimal() {
        let document = Document::from_json_str(r#"{"asset":{"version":"2.0"}}"#).unwrap();
        assert!(document.nodes.is_empty());
        assert!(document.validate().is_ok());
    }

    #[test]
    fn test_bom_is_ignored() {
        let text = "\u{feff}{\"asset\":{\"version\":\"2.0\"}}";
        assert!(Document::from_json_str(text).is_ok());
    }

    #[test]
    fn test_serialize_omits_empty_lists() {
        let value = Document::new("gen").to_json_value().unwrap();
        assert_eq!(value, json!({"asset": {"version": "2.0", "generator": "gen"}}));
    }

    #[test]
    fn test_extension_filter() {
        let mut document = minimal();
        let mut material = Material::default();
        material
            .extensions
            .insert(KHR_MATERIALS_UNLIT.into(), json!({}));
        material
            .extensions
            .insert("VENDOR_stale".into(), json!({"x": 1}));
        document.materials.push(material);
        document.use_extension(KHR_MATERIALS_UNLIT);

        let value = document.to_json_value().unwrap();
        assert_eq!(
            value["materials"][0]["extensions"],
            json!({"KHR_materials_unlit": {}})
        );

        document.extensions_used.clear();
        let value = document.to_json_value().unwrap();
        assert!(value["materials"][0].get("extensions").is_none());
    }

    #[test]
    fn test_filter_leaves_extras_alone() {
        let mut value = json!({"extras": {"extensions": {"a": 1}}, "extensions": {"b": 2}});
        retain_used_extensions(&mut value, &[]);
        assert_eq!(value, json!({"extras": {"extensions": {"a": 1}}}));
    }

    #[test]
    fn test_implied_stride_is_omitted() {
        let mut document = minimal();
        let mut view = BufferView::new(BufferId(0), 0, 48);
        view.byte_stride = Some(12);
        document.buffer_views.push(view);
        document.accessors.push(Accessor::new(
            Some(BufferViewId(0)),
            ComponentType::F32,
            AccessorType::Vec3,
            4,
        ));

        let value = document.to_json_value().unwrap();
        assert!(value["bufferViews"][0].get("byteStride").is_none());
    }

    #[test]
    fn test_shared_view_keeps_stride() {
        let mut document = minimal();
        let mut view = BufferView::new(BufferId(0), 0, 48);
        view.byte_stride = Some(24);
        document.buffer_views.push(view);
        let position = Accessor::new(Some(BufferViewId(0)), ComponentType::F32, AccessorType::Vec3, 2);
        let mut normal = position.clone();
        normal.byte_offset = 12;
        document.accessors.extend([position, normal]);

        let value = document.to_json_value().unwrap();
        assert_eq!(value["bufferViews"][0]["byteStride"], json!(24));
        assert!(document.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_reference() {
        let mut document = minimal();
        document.nodes.push(Node {
            mesh: Some(MeshId(3)),
            ..Default::default()
        });
        let err = document.validate().unwrap_err();
        assert!(matches!(
            err,
            GltfError::IndexOutOfRange { list: "meshes", index: 3, len: 0 }
        ));
    }

    #[test]
    fn test_validate_rejects_two_parents() {
        let mut document = minimal();
        document.nodes = vec![
            Node { children: vec![NodeId(2)], ..Default::default() },
            Node { children: vec![NodeId(2)], ..Default::default() },
            Node::default(),
        ];
        assert!(matches!(document.validate(), Err(GltfError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_cycle() {
        let mut document = minimal();
        document.nodes = vec![
            Node { children: vec![NodeId(1)], ..Default::default() },
            Node { children: vec![NodeId(0)], ..Default::default() },
        ];
        assert!(matches!(document.validate(), Err(GltfError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_index_stride() {
        let mut document = minimal();
        let mut view = BufferView::new(BufferId(0), 0, 12);
        view.byte_stride = Some(4);
        view.target = Some(Target::ElementArrayBuffer);
        document.buffer_views.push(view);
        assert!(matches!(
            document.validate(),
            Err(GltfError::InvalidByteStride { view: 0, stride: 4 })
        ));
    }

    #[test]
    fn test_validate_rejects_view_past_buffer() {
        let mut document = minimal();
        document.buffer_views.push(BufferView::new(BufferId(0), 40, 16));
        assert!(matches!(document.validate(), Err(GltfError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_oversized_sparse() {
        let mut document = minimal();
        document.buffer_views.push(BufferView::new(BufferId(0), 0, 48));
        let mut accessor = Accessor::new(None, ComponentType::F32, AccessorType::Vec3, 1);
        accessor.sparse = Some(Sparse {
            count: 2,
            indices: SparseIndices {
                buffer_view: BufferViewId(0),
                byte_offset: 0,
                component_type: ComponentType::U32,
            },
            values: SparseValues {
                buffer_view: BufferViewId(0),
                byte_offset: 0,
            },
        });
        document.accessors.push(accessor);
        assert!(matches!(document.validate(), Err(GltfError::Invalid(_))));
    }

    #[test]
    fn test_unique_material_names() {
        let mut document = minimal();
        document.materials = vec![
            Material { name: Some("a".into()), ..Default::default() },
            Material { name: Some("b".into()), ..Default::default() },
        ];
        assert_eq!(document.unique_material_name(MaterialId(1)).unwrap(), "b");

        document.materials[1].name = Some("a".into());
        assert_eq!(document.unique_material_name(MaterialId(1)).unwrap(), "01_a");
        assert!(document.unique_material_name(MaterialId(5)).is_err());
    }

    #[test]
    fn test_root_nodes_of_active_scene() {
        let mut document = minimal();
        document.scenes = vec![
            Scene { nodes: vec![NodeId(0)], ..Default::default() },
            Scene { nodes: vec![NodeId(1), NodeId(2)], ..Default::default() },
        ];
        assert_eq!(document.root_nodes(), &[NodeId(0)]);
        document.scene = Some(SceneId(1));
        assert_eq!(document.root_nodes(), &[NodeId(1), NodeId(2)]);
    }
}
