//! Export pipeline
//!
//! Turns a host-convention scene description into a glTF document plus one
//! binary buffer. Every array crosses the coordinate conversion exactly once
//! on its way into the buffer.

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use crate::accessor::AccessorElement;
use crate::assembly::{Assembly, compute_bounds};
use crate::config::{Container, ExportOptions};
use crate::coords::{ReverseZ, flip_triangles, flip_uv, reverse_z_all, reverse_z_quat_components};
use crate::document::{
    Animation, Attributes, COLOR_0, Document, Image, Interpolation, JOINTS_0, KHR_MATERIALS_UNLIT,
    Mesh, NORMAL, Node, POSITION, Path, Primitive, PrimitiveExtras, Sampler, Scene, Skin, TANGENT,
    TEXCOORD_0, Target, Texture, WEIGHTS_0,
};
use crate::error::{GltfError, Result};
use crate::glb;
use crate::ids::{
    AccessorId, BufferId, ImageId, MaterialId, MeshId, NodeId, SamplerId, SceneId, SkinId,
    TextureId,
};
use crate::material::{MaterialDescription, export_material};
use crate::storage::encode_data_uri;

#[derive(Debug, Clone, PartialEq)]
pub struct ExportNode {
    pub name: String,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// Indices into `ExportScene::nodes`
    pub children: Vec<usize>,
    pub mesh: Option<usize>,
    pub skin: Option<usize>,
}

impl ExportNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            children: Vec::new(),
            mesh: None,
            skin: None,
        }
    }
}

/// Triangle list drawn with one material
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSubmesh {
    pub indices: Vec<u32>,
    /// Index into `ExportScene::materials`
    pub material: Option<usize>,
}

/// Blend shape deltas; empty streams are omitted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportMorphTarget {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec3>,
}

/// Vertex streams shared by every submesh. Optional streams are either
/// empty or as long as `positions`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec4>,
    pub uvs: Vec<Vec2>,
    pub colors: Vec<Vec4>,
    pub joints: Vec<[u16; 4]>,
    pub weights: Vec<Vec4>,
    pub submeshes: Vec<ExportSubmesh>,
    pub morph_targets: Vec<ExportMorphTarget>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSkin {
    pub name: String,
    /// Node indices, one per bone
    pub joints: Vec<usize>,
    pub root: Option<usize>,
    /// Inverse bind matrices in the host convention, one per joint
    pub bind_poses: Vec<Mat4>,
}

/// Keyframes of one node property. `values` holds the flat components of
/// each key (three elements per key for cubic splines).
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTrack {
    pub node: usize,
    pub path: Path,
    pub interpolation: Interpolation,
    pub times: Vec<f32>,
    pub values: Vec<f32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportAnimation {
    pub name: String,
    pub tracks: Vec<ExportTrack>,
}

/// Encoded image bytes (PNG or JPEG)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportImage {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportTexture {
    /// Index into `ExportScene::images`
    pub image: usize,
    pub sampler: Sampler,
}

/// A complete host scene. Material texture ids index `textures`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportScene {
    pub name: Option<String>,
    pub nodes: Vec<ExportNode>,
    pub roots: Vec<usize>,
    pub meshes: Vec<ExportMesh>,
    pub skins: Vec<ExportSkin>,
    pub materials: Vec<MaterialDescription>,
    pub images: Vec<ExportImage>,
    pub textures: Vec<ExportTexture>,
    pub animations: Vec<ExportAnimation>,
}

/// Output of an export: the document and the bytes of its single buffer
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedDocument {
    pub document: Document,
    pub binary: Vec<u8>,
}

impl ExportedDocument {
    fn with_buffer_uri(&self, uri: Option<String>) -> Document {
        let mut document = self.document.clone();
        if let Some(buffer) = document.buffers.first_mut() {
            buffer.uri = uri;
        }
        document
    }

    pub fn to_glb(&self) -> Result<Vec<u8>> {
        let json = self.with_buffer_uri(None).to_json_string()?;
        Ok(glb::write_glb(json.as_bytes(), &self.binary))
    }

    /// `.gltf` text with the buffer embedded as a base64 data URI
    pub fn to_gltf_embedded(&self) -> Result<String> {
        let uri = encode_data_uri("application/octet-stream", &self.binary);
        self.with_buffer_uri(Some(uri)).to_json_pretty()
    }

    /// `.gltf` text referencing `bin_uri`, plus the bytes to store there
    pub fn to_gltf_separate(&self, bin_uri: &str) -> Result<(String, Vec<u8>)> {
        let json = self.with_buffer_uri(Some(bin_uri.to_string())).to_json_pretty()?;
        Ok((json, self.binary.clone()))
    }

    /// Main file bytes for `container`, plus the side `.bin` for
    /// `GltfSeparate`
    pub fn to_container(
        &self,
        container: Container,
        bin_uri: &str,
    ) -> Result<(Vec<u8>, Option<Vec<u8>>)> {
        match container {
            Container::Glb => Ok((self.to_glb()?, None)),
            Container::GltfEmbedded => Ok((self.to_gltf_embedded()?.into_bytes(), None)),
            Container::GltfSeparate => {
                let (json, bin) = self.to_gltf_separate(bin_uri)?;
                Ok((json.into_bytes(), Some(bin)))
            }
        }
    }
}

fn check_stream_len(mesh: &str, stream: &str, len: usize, expected: usize) -> Result<()> {
    if len != 0 && len != expected {
        return Err(GltfError::Invalid(format!(
            "mesh {mesh:?}: {stream} has {len} entries for {expected} vertices"
        )));
    }
    Ok(())
}

fn check_index(list: &'static str, index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(GltfError::IndexOutOfRange {
            list,
            index: index as u32,
            len,
        })
    }
}

fn optional_name(name: &str) -> Option<String> {
    Some(name.to_string()).filter(|n| !n.is_empty())
}

/// Builds one document from an [`ExportScene`]
pub struct Exporter<'a> {
    options: &'a ExportOptions,
    assembly: Assembly,
    buffer: BufferId,
}

impl<'a> Exporter<'a> {
    pub fn new(options: &'a ExportOptions) -> Self {
        let mut document = Document::new(options.generator.clone());
        document.use_extension(KHR_MATERIALS_UNLIT);
        for name in &options.extensions_used {
            document.use_extension(name);
        }
        let mut assembly = Assembly::new(document);
        let buffer = assembly.add_buffer();
        Self {
            options,
            assembly,
            buffer,
        }
    }

    pub fn export(mut self, scene: &ExportScene) -> Result<ExportedDocument> {
        self.export_images(scene)?;
        self.export_materials(scene)?;
        for mesh in &scene.meshes {
            self.export_mesh(mesh, scene.materials.len())?;
        }
        for skin in &scene.skins {
            self.export_skin(skin, scene.nodes.len())?;
        }
        self.export_nodes(scene)?;
        for animation in &scene.animations {
            self.export_animation(animation, scene.nodes.len())?;
        }

        let (document, mut buffers) = self.assembly.finish();
        // Same checks the importer applies, so every export reads back
        document.validate()?;
        let binary = buffers.pop().unwrap_or_default();
        tracing::debug!(
            "exported {} nodes, {} meshes, {} bytes of binary data",
            document.nodes.len(),
            document.meshes.len(),
            binary.len()
        );
        Ok(ExportedDocument { document, binary })
    }

    fn export_images(&mut self, scene: &ExportScene) -> Result<()> {
        for image in &scene.images {
            let view = self
                .assembly
                .extend_bytes_and_get_view(self.buffer, &image.bytes)?;
            self.assembly.document_mut().images.push(Image {
                name: optional_name(&image.name),
                mime_type: Some(image.mime_type.clone()),
                buffer_view: Some(view),
                ..Default::default()
            });
        }

        for texture in &scene.textures {
            check_index(ImageId::LIST, texture.image, scene.images.len())?;
            let document = self.assembly.document_mut();
            let sampler = match document.samplers.iter().position(|s| *s == texture.sampler) {
                Some(existing) => existing,
                None => {
                    document.samplers.push(texture.sampler.clone());
                    document.samplers.len() - 1
                }
            };
            document.textures.push(Texture {
                sampler: Some(SamplerId::from_index(sampler)),
                source: Some(ImageId::from_index(texture.image)),
                ..Default::default()
            });
        }
        Ok(())
    }

    fn export_materials(&mut self, scene: &ExportScene) -> Result<()> {
        let texture_count = scene.textures.len();
        for description in &scene.materials {
            let textures = [
                description.color_texture,
                description.metallic_roughness_texture,
                description.normal_texture.map(|(id, _)| id),
                description.occlusion_texture.map(|(id, _)| id),
                description.emission_texture,
            ];
            for texture in textures.into_iter().flatten() {
                check_index(TextureId::LIST, texture.index(), texture_count)?;
            }
            let material = export_material(description);
            self.assembly.document_mut().materials.push(material);
        }
        Ok(())
    }

    fn vertex_accessor<T: AccessorElement>(&mut self, data: &[T]) -> Result<Option<AccessorId>> {
        self.assembly
            .extend_and_get_accessor(self.buffer, data, Some(Target::ArrayBuffer))
    }

    fn positions_accessor(&mut self, positions: &[Vec3]) -> Result<Option<AccessorId>> {
        let Some(id) = self.vertex_accessor(positions)? else {
            return Ok(None);
        };
        let points: Vec<[f32; 3]> = positions.iter().map(|p| p.to_array()).collect();
        let (min, max) = compute_bounds(&points);
        self.assembly.set_bounds(id, &min, &max)?;
        Ok(Some(id))
    }

    fn export_mesh(&mut self, mesh: &ExportMesh, material_count: usize) -> Result<()> {
        let vertex_count = mesh.positions.len();
        check_stream_len(&mesh.name, NORMAL, mesh.normals.len(), vertex_count)?;
        check_stream_len(&mesh.name, TANGENT, mesh.tangents.len(), vertex_count)?;
        check_stream_len(&mesh.name, TEXCOORD_0, mesh.uvs.len(), vertex_count)?;
        check_stream_len(&mesh.name, COLOR_0, mesh.colors.len(), vertex_count)?;
        check_stream_len(&mesh.name, JOINTS_0, mesh.joints.len(), vertex_count)?;
        check_stream_len(&mesh.name, WEIGHTS_0, mesh.weights.len(), vertex_count)?;

        let mut positions = mesh.positions.clone();
        reverse_z_all(&mut positions);
        let mut normals = mesh.normals.clone();
        reverse_z_all(&mut normals);
        let mut tangents = mesh.tangents.clone();
        reverse_z_all(&mut tangents);
        let uvs: Vec<Vec2> = if self.options.flip_uv {
            mesh.uvs.iter().copied().map(flip_uv).collect()
        } else {
            mesh.uvs.clone()
        };

        let mut attributes = Attributes::new();
        let streams = [
            (POSITION, self.positions_accessor(&positions)?),
            (NORMAL, self.vertex_accessor(&normals)?),
            (TANGENT, self.vertex_accessor(&tangents)?),
            (TEXCOORD_0, self.vertex_accessor(&uvs)?),
            (COLOR_0, self.vertex_accessor(&mesh.colors)?),
            (JOINTS_0, self.vertex_accessor(&mesh.joints)?),
            (WEIGHTS_0, self.vertex_accessor(&mesh.weights)?),
        ];
        for (semantic, accessor) in streams {
            if let Some(accessor) = accessor {
                attributes.insert(semantic.to_string(), accessor);
            }
        }

        let mut targets = Vec::with_capacity(mesh.morph_targets.len());
        for target in &mesh.morph_targets {
            targets.push(self.export_morph_target(&mesh.name, target, vertex_count)?);
        }
        let target_names: Vec<String> = mesh.morph_targets.iter().map(|t| t.name.clone()).collect();

        let mut primitives = Vec::with_capacity(mesh.submeshes.len());
        for submesh in &mesh.submeshes {
            if let Some(bad) = submesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(GltfError::Invalid(format!(
                    "mesh {:?}: index {} out of range for {} vertices",
                    mesh.name, bad, vertex_count
                )));
            }
            if let Some(material) = submesh.material {
                check_index(MaterialId::LIST, material, material_count)?;
            }

            let mut indices = submesh.indices.clone();
            flip_triangles(&mut indices);
            let indices = self.assembly.extend_and_get_accessor(
                self.buffer,
                &indices,
                Some(Target::ElementArrayBuffer),
            )?;

            primitives.push(Primitive {
                attributes: attributes.clone(),
                indices,
                material: submesh.material.map(MaterialId::from_index),
                targets: targets.clone(),
                extras: PrimitiveExtras {
                    target_names: target_names.clone(),
                    ..Default::default()
                },
                ..Default::default()
            });
        }

        tracing::trace!(
            "mesh {:?}: {} vertices, {} primitives",
            mesh.name,
            vertex_count,
            primitives.len()
        );
        self.assembly.document_mut().meshes.push(Mesh {
            name: optional_name(&mesh.name),
            primitives,
            ..Default::default()
        });
        Ok(())
    }

    fn export_morph_target(
        &mut self,
        mesh: &str,
        target: &ExportMorphTarget,
        vertex_count: usize,
    ) -> Result<Attributes> {
        check_stream_len(mesh, "morph POSITION", target.positions.len(), vertex_count)?;
        check_stream_len(mesh, "morph NORMAL", target.normals.len(), vertex_count)?;
        check_stream_len(mesh, "morph TANGENT", target.tangents.len(), vertex_count)?;

        let mut positions = target.positions.clone();
        reverse_z_all(&mut positions);
        let mut normals = target.normals.clone();
        reverse_z_all(&mut normals);
        let mut tangents = target.tangents.clone();
        reverse_z_all(&mut tangents);

        let mut attributes = Attributes::new();
        let sparse = if self.options.use_sparse_morph_targets {
            let changed: Vec<u32> = (0..vertex_count)
                .filter(|&v| {
                    [&positions, &normals, &tangents]
                        .iter()
                        .any(|stream| stream.get(v).is_some_and(|d| *d != Vec3::ZERO))
                })
                .map(|v| v as u32)
                .collect();
            self.assembly
                .extend_sparse_indices(self.buffer, &changed)?
                .map(|view| (view, changed))
        } else {
            None
        };

        let streams = [(POSITION, &positions), (NORMAL, &normals), (TANGENT, &tangents)];
        for (semantic, deltas) in streams {
            let accessor = match &sparse {
                Some((view, changed)) if !deltas.is_empty() => {
                    let values: Vec<Vec3> = changed.iter().map(|&v| deltas[v as usize]).collect();
                    self.assembly.extend_sparse_and_get_accessor(
                        self.buffer,
                        vertex_count,
                        *view,
                        &values,
                        None,
                    )?
                }
                Some(_) => None,
                None => self.vertex_accessor(deltas)?,
            };
            let Some(accessor) = accessor else { continue };
            if semantic == POSITION {
                let points: Vec<[f32; 3]> = deltas.iter().map(|p| p.to_array()).collect();
                let (min, max) = compute_bounds(&points);
                self.assembly.set_bounds(accessor, &min, &max)?;
            }
            attributes.insert(semantic.to_string(), accessor);
        }
        Ok(attributes)
    }

    fn export_skin(&mut self, skin: &ExportSkin, node_count: usize) -> Result<()> {
        for &joint in &skin.joints {
            check_index(NodeId::LIST, joint, node_count)?;
        }
        if let Some(root) = skin.root {
            check_index(NodeId::LIST, root, node_count)?;
        }
        if skin.bind_poses.len() != skin.joints.len() {
            return Err(GltfError::Invalid(format!(
                "skin {:?}: {} bind poses for {} joints",
                skin.name,
                skin.bind_poses.len(),
                skin.joints.len()
            )));
        }

        let mut bind_poses = skin.bind_poses.clone();
        reverse_z_all(&mut bind_poses);
        let inverse_bind_matrices =
            self.assembly
                .extend_and_get_accessor(self.buffer, &bind_poses, None)?;

        self.assembly.document_mut().skins.push(Skin {
            name: optional_name(&skin.name),
            joints: skin.joints.iter().copied().map(NodeId::from_index).collect(),
            skeleton: skin.root.map(NodeId::from_index),
            inverse_bind_matrices,
            ..Default::default()
        });
        Ok(())
    }

    fn export_nodes(&mut self, scene: &ExportScene) -> Result<()> {
        let node_count = scene.nodes.len();
        let mesh_count = self.assembly.document().meshes.len();
        let skin_count = self.assembly.document().skins.len();

        for node in &scene.nodes {
            for &child in &node.children {
                check_index(NodeId::LIST, child, node_count)?;
            }
            if let Some(mesh) = node.mesh {
                check_index(MeshId::LIST, mesh, mesh_count)?;
            }
            if let Some(skin) = node.skin {
                check_index(SkinId::LIST, skin, skin_count)?;
            }
            self.assembly.document_mut().nodes.push(Node {
                name: optional_name(&node.name),
                children: node.children.iter().copied().map(NodeId::from_index).collect(),
                translation: Some(node.translation.reverse_z().to_array()),
                rotation: Some(node.rotation.reverse_z().to_array()),
                scale: Some(node.scale.to_array()),
                mesh: node.mesh.map(MeshId::from_index),
                skin: node.skin.map(SkinId::from_index),
                ..Default::default()
            });
        }

        for &root in &scene.roots {
            check_index(NodeId::LIST, root, node_count)?;
        }
        let document = self.assembly.document_mut();
        document.scenes.push(Scene {
            name: scene.name.clone(),
            nodes: scene.roots.iter().copied().map(NodeId::from_index).collect(),
            ..Default::default()
        });
        document.scene = Some(SceneId(0));
        Ok(())
    }

    fn export_animation(&mut self, animation: &ExportAnimation, node_count: usize) -> Result<()> {
        let mut gltf_animation = Animation {
            name: optional_name(&animation.name),
            ..Default::default()
        };

        for track in &animation.tracks {
            check_index(NodeId::LIST, track.node, node_count)?;
            let per_key = if track.interpolation == Interpolation::CubicSpline { 3 } else { 1 };
            if let Some(n) = track.path.component_count() {
                if track.values.len() != track.times.len() * per_key * n {
                    return Err(GltfError::Invalid(format!(
                        "animation {:?}: {} track has {} values for {} keys",
                        animation.name,
                        track.path.as_str(),
                        track.values.len(),
                        track.times.len()
                    )));
                }
            }

            let input = self
                .assembly
                .extend_and_get_accessor(self.buffer, &track.times, None)?;
            let output = match &track.path {
                Path::Translation => {
                    let mut values: Vec<Vec3> =
                        track.values.chunks_exact(3).map(Vec3::from_slice).collect();
                    reverse_z_all(&mut values);
                    self.assembly.extend_and_get_accessor(self.buffer, &values, None)?
                }
                Path::Rotation => {
                    let values: Vec<Vec4> = track
                        .values
                        .chunks_exact(4)
                        .enumerate()
                        .map(|(i, q)| {
                            let q = Quat::from_slice(q);
                            let is_value = per_key == 1 || i % 3 == 1;
                            if is_value {
                                Vec4::from(q.reverse_z().to_array())
                            } else {
                                Vec4::from(reverse_z_quat_components(q.to_array()))
                            }
                        })
                        .collect();
                    self.assembly.extend_and_get_accessor(self.buffer, &values, None)?
                }
                Path::Scale => {
                    let values: Vec<Vec3> =
                        track.values.chunks_exact(3).map(Vec3::from_slice).collect();
                    self.assembly.extend_and_get_accessor(self.buffer, &values, None)?
                }
                Path::Weights | Path::Other(_) => {
                    self.assembly
                        .extend_and_get_accessor(self.buffer, &track.values, None)?
                }
            };

            let (Some(input), Some(output)) = (input, output) else {
                tracing::debug!(
                    "skipping empty {} track on node {}",
                    track.path.as_str(),
                    track.node
                );
                continue;
            };
            let node = NodeId::from_index(track.node);
            let sampler = gltf_animation.channel_sampler(node, track.path.clone());
            sampler.input = input;
            sampler.output = output;
            sampler.interpolation = track.interpolation;
        }

        if !gltf_animation.channels.is_empty() {
            self.assembly.document_mut().animations.push(gltf_animation);
        }
        Ok(())
    }
}

/// Export `scene` with `options`
pub fn export_scene(scene: &ExportScene, options: &ExportOptions) -> Result<ExportedDocument> {
    Exporter::new(options).export(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::AccessorReader;
    use crate::material::ShadingModel;

    const EPSILON: f32 = 1e-5;

    fn quad() -> ExportMesh {
        ExportMesh {
            name: "quad".into(),
            positions: vec![
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(1.0, 1.0, 2.0),
                Vec3::new(0.0, 1.0, 2.0),
            ],
            normals: vec![Vec3::Z; 4],
            uvs: vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y],
            submeshes: vec![ExportSubmesh {
                indices: vec![0, 1, 2, 0, 2, 3],
                material: Some(0),
            }],
            ..Default::default()
        }
    }

    fn scene_with(mesh: ExportMesh) -> ExportScene {
        let mut node = ExportNode::new("root");
        node.translation = Vec3::new(1.0, 2.0, 3.0);
        node.mesh = Some(0);
        ExportScene {
            nodes: vec![node],
            roots: vec![0],
            meshes: vec![mesh],
            materials: vec![MaterialDescription {
                name: "unlit".into(),
                shading: ShadingModel::UnlitOpaque,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_export_converts_geometry_once() {
        let exported = export_scene(&scene_with(quad()), &ExportOptions::default()).unwrap();
        let document = &exported.document;
        assert!(document.validate().is_ok());

        let buffers = vec![exported.binary.clone()];
        let reader = AccessorReader::new(document, &buffers);
        let primitive = &document.meshes[0].primitives[0];

        let positions: Vec<Vec3> = reader.read_typed(primitive.attribute(POSITION).unwrap()).unwrap();
        assert_eq!(positions[2], Vec3::new(1.0, 1.0, -2.0));
        let stored = reader.read_index_values(primitive.indices.unwrap()).unwrap();
        assert_eq!(stored, vec![2, 1, 0, 3, 2, 0]);
        let uvs: Vec<Vec2> = reader.read_typed(primitive.attribute(TEXCOORD_0).unwrap()).unwrap();
        assert_eq!(uvs[0], Vec2::new(0.0, 1.0));

        let node = &document.nodes[0];
        assert_eq!(node.translation, Some([1.0, 2.0, -3.0]));
        assert_eq!(document.root_nodes(), &[NodeId(0)]);
    }

    #[test]
    fn test_position_bounds() {
        let exported = export_scene(&scene_with(quad()), &ExportOptions::default()).unwrap();
        let id = exported.document.meshes[0].primitives[0].attribute(POSITION).unwrap();
        let accessor = exported.document.accessor(id).unwrap();
        assert_eq!(accessor.min, vec![0.0, 0.0, -2.0]);
        assert_eq!(accessor.max, vec![1.0, 1.0, -1.0]);
    }

    #[test]
    fn test_unlit_extension_always_declared() {
        let options = ExportOptions {
            extensions_used: vec!["KHR_texture_transform".into()],
            ..Default::default()
        };
        let exported = export_scene(&ExportScene::default(), &options).unwrap();
        assert_eq!(
            exported.document.extensions_used,
            vec![KHR_MATERIALS_UNLIT.to_string(), "KHR_texture_transform".to_string()]
        );
    }

    #[test]
    fn test_inconsistent_streams_rejected() {
        let mut mesh = quad();
        mesh.normals.pop();
        let err = export_scene(&scene_with(mesh), &ExportOptions::default()).unwrap_err();
        assert!(matches!(err, GltfError::Invalid(_)));
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let mut mesh = quad();
        mesh.submeshes[0].indices.push(9);
        assert!(export_scene(&scene_with(mesh), &ExportOptions::default()).is_err());
    }

    #[test]
    fn test_shared_child_rejected() {
        let mut scene = scene_with(quad());
        let mut first = ExportNode::new("a");
        first.children = vec![1];
        let mut second = ExportNode::new("c");
        second.children = vec![1];
        scene.nodes = vec![first, ExportNode::new("b"), second];
        scene.roots = vec![0, 2];

        let err = export_scene(&scene, &ExportOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "invalid document: node 1 has more than one parent");
    }

    #[test]
    fn test_node_cycle_rejected() {
        let mut scene = scene_with(quad());
        let mut first = ExportNode::new("a");
        first.children = vec![1];
        let mut second = ExportNode::new("b");
        second.children = vec![0];
        scene.nodes = vec![first, second];
        scene.roots = vec![0];

        let err = export_scene(&scene, &ExportOptions::default()).unwrap_err();
        assert!(matches!(err, GltfError::Invalid(_)), "{err}");
    }

    #[test]
    fn test_sparse_morph_targets_share_indices() {
        let mut mesh = quad();
        mesh.morph_targets.push(ExportMorphTarget {
            name: "smile".into(),
            positions: vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 0.5), Vec3::ZERO, Vec3::ZERO],
            normals: vec![Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, Vec3::X],
            ..Default::default()
        });
        let options = ExportOptions {
            use_sparse_morph_targets: true,
            ..Default::default()
        };
        let exported = export_scene(&scene_with(mesh), &options).unwrap();
        let document = &exported.document;
        assert!(document.validate().is_ok());

        let primitive = &document.meshes[0].primitives[0];
        assert_eq!(primitive.extras.target_names, vec!["smile"]);
        let target = &primitive.targets[0];
        let position = document.accessor(target[POSITION]).unwrap();
        let normal = document.accessor(target[NORMAL]).unwrap();
        let position_sparse = position.sparse.as_ref().unwrap();
        let normal_sparse = normal.sparse.as_ref().unwrap();
        assert_eq!(position.count, 4);
        assert_eq!(position_sparse.count, 2);
        assert_eq!(
            position_sparse.indices.buffer_view,
            normal_sparse.indices.buffer_view
        );
        assert!(!target.contains_key(TANGENT));

        let buffers = vec![exported.binary.clone()];
        let reader = AccessorReader::new(document, &buffers);
        let deltas: Vec<Vec3> = reader.read_typed(target[POSITION]).unwrap();
        assert_eq!(deltas, vec![Vec3::ZERO, Vec3::new(0.0, 0.0, -0.5), Vec3::ZERO, Vec3::ZERO]);
        let normals: Vec<Vec3> = reader.read_typed(target[NORMAL]).unwrap();
        assert_eq!(normals[3], Vec3::X);
    }

    #[test]
    fn test_dense_morph_targets() {
        let mut mesh = quad();
        mesh.morph_targets.push(ExportMorphTarget {
            name: "blink".into(),
            positions: vec![Vec3::Y; 4],
            ..Default::default()
        });
        let exported = export_scene(&scene_with(mesh), &ExportOptions::default()).unwrap();
        let target = &exported.document.meshes[0].primitives[0].targets[0];
        let accessor = exported.document.accessor(target[POSITION]).unwrap();
        assert!(accessor.sparse.is_none());
        assert!(accessor.buffer_view.is_some());
        assert_eq!(accessor.min, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_animation_output_types() {
        let mut scene = scene_with(quad());
        scene.animations.push(ExportAnimation {
            name: "idle".into(),
            tracks: vec![
                ExportTrack {
                    node: 0,
                    path: Path::Translation,
                    interpolation: Interpolation::Linear,
                    times: vec![0.0, 1.0],
                    values: vec![0.0, 0.0, 1.0, 0.0, 0.0, 2.0],
                },
                ExportTrack {
                    node: 0,
                    path: Path::Rotation,
                    interpolation: Interpolation::Step,
                    times: vec![0.0],
                    values: Quat::from_rotation_y(0.4).to_array().to_vec(),
                },
            ],
        });
        let exported = export_scene(&scene, &ExportOptions::default()).unwrap();
        let document = &exported.document;
        let animation = &document.animations[0];
        assert_eq!(animation.channels.len(), 2);

        let buffers = vec![exported.binary.clone()];
        let reader = AccessorReader::new(document, &buffers);
        let translation: Vec<Vec3> = reader.read_typed(animation.samplers[0].output).unwrap();
        assert_eq!(translation[1], Vec3::new(0.0, 0.0, -2.0));

        let rotation: Vec<Quat> = reader.read_typed(animation.samplers[1].output).unwrap();
        assert!(rotation[0].abs_diff_eq(Quat::from_rotation_y(0.4).reverse_z(), EPSILON));
        assert_eq!(animation.samplers[1].interpolation, Interpolation::Step);
    }

    #[test]
    fn test_animation_value_count_checked() {
        let mut scene = scene_with(quad());
        scene.animations.push(ExportAnimation {
            name: "broken".into(),
            tracks: vec![ExportTrack {
                node: 0,
                path: Path::Scale,
                interpolation: Interpolation::Linear,
                times: vec![0.0, 1.0],
                values: vec![1.0, 1.0, 1.0],
            }],
        });
        assert!(export_scene(&scene, &ExportOptions::default()).is_err());
    }

    #[test]
    fn test_skin_bind_poses() {
        let mut scene = scene_with(quad());
        scene.nodes[0].skin = Some(0);
        scene.skins.push(ExportSkin {
            name: "rig".into(),
            joints: vec![0],
            root: Some(0),
            bind_poses: vec![Mat4::from_translation(Vec3::new(0.0, 0.0, 4.0))],
        });
        let exported = export_scene(&scene, &ExportOptions::default()).unwrap();
        let document = &exported.document;
        let skin = &document.skins[0];
        assert_eq!(skin.skeleton, Some(NodeId(0)));

        let buffers = vec![exported.binary.clone()];
        let reader = AccessorReader::new(document, &buffers);
        let matrices: Vec<Mat4> = reader.read_typed(skin.inverse_bind_matrices.unwrap()).unwrap();
        assert!((matrices[0].w_axis.z + 4.0).abs() < EPSILON);
    }

    #[test]
    fn test_images_go_into_buffer_views() {
        let mut scene = scene_with(quad());
        scene.images.push(ExportImage {
            name: "albedo".into(),
            mime_type: "image/png".into(),
            bytes: vec![0x89, b'P', b'N', b'G', 1, 2],
        });
        scene.textures.push(ExportTexture {
            image: 0,
            sampler: Sampler::default(),
        });
        scene.textures.push(ExportTexture {
            image: 0,
            sampler: Sampler::default(),
        });
        scene.materials[0].color_texture = Some(TextureId(1));

        let exported = export_scene(&scene, &ExportOptions::default()).unwrap();
        let document = &exported.document;
        assert_eq!(document.samplers.len(), 1);
        assert_eq!(document.textures.len(), 2);
        let image = &document.images[0];
        assert_eq!(image.mime_type.as_deref(), Some("image/png"));

        let buffers = vec![exported.binary.clone()];
        let reader = AccessorReader::new(document, &buffers);
        assert_eq!(
            reader.view_bytes(image.buffer_view.unwrap()).unwrap(),
            &[0x89, b'P', b'N', b'G', 1, 2]
        );
    }

    #[test]
    fn test_bad_texture_reference() {
        let mut scene = scene_with(quad());
        scene.materials[0].color_texture = Some(TextureId(3));
        assert!(matches!(
            export_scene(&scene, &ExportOptions::default()),
            Err(GltfError::IndexOutOfRange { list: "textures", .. })
        ));
    }

    #[test]
    fn test_containers() {
        let exported = export_scene(&scene_with(quad()), &ExportOptions::default()).unwrap();

        let glb_bytes = exported.to_glb().unwrap();
        let parsed = glb::parse_glb(&glb_bytes).unwrap();
        assert_eq!(&parsed.bin[..exported.binary.len()], exported.binary.as_slice());

        let embedded = exported.to_gltf_embedded().unwrap();
        assert!(embedded.contains("data:application/octet-stream;base64,"));

        let (json, bin) = exported.to_gltf_separate("scene.bin").unwrap();
        assert!(json.contains("\"uri\": \"scene.bin\""));
        assert_eq!(bin, exported.binary);

        let (main, side) = exported.to_container(Container::GltfSeparate, "scene.bin").unwrap();
        assert_eq!(main, json.into_bytes());
        assert_eq!(side, Some(bin));
    }
}
