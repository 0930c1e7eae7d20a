//! Import pipeline
//!
//! Parses a `.gltf`, `.glb` or `.zip` container, resolves every buffer and
//! image through a [`Storage`], and exposes the decoded data already converted to
//! the host convention (Z mirrored, triangles flipped once, V flipped when
//! configured). Engine objects are built by the caller from these arrays.

use std::path::Path as FsPath;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use crate::accessor::AccessorReader;
use crate::config::ImportOptions;
use crate::coords::{ReverseZ, flip_triangles, flip_uv, reverse_z_quat_components};
use crate::document::{
    AccessorType, COLOR_0, Document, Interpolation, JOINTS_0, Mode, NORMAL, POSITION, Path,
    TANGENT, TEXCOORD_0, WEIGHTS_0,
};
use crate::error::{GltfError, Result};
use crate::glb;
use crate::ids::{
    AccessorId, AnimationId, AnimationSamplerId, ImageId, MaterialId, MeshId, NodeId, SkinId,
};
use crate::material::{MaterialDescription, describe_material};
use crate::storage::{Bytes, Progress, Storage, ZipStorage, decode_data_uri, no_progress};

/// Container format of the input bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Gltf,
    Glb,
    /// Archive holding a `.gltf` and its side files. Import only.
    Zip,
}

/// Local file header signature that starts a `.zip` archive
const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";

impl ContainerKind {
    /// Kind implied by a file extension, `None` when the extension says nothing
    pub fn from_extension(path: &FsPath) -> Option<Self> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        match extension.as_deref() {
            Some("gltf") => Some(ContainerKind::Gltf),
            Some("glb") => Some(ContainerKind::Glb),
            Some("zip") => Some(ContainerKind::Zip),
            _ => None,
        }
    }

    /// Kind from the extension if known, else from the GLB or zip magic
    pub fn detect(path: Option<&FsPath>, bytes: &[u8]) -> Self {
        if let Some(kind) = path.and_then(Self::from_extension) {
            return kind;
        }
        if glb::is_glb(bytes) {
            ContainerKind::Glb
        } else if bytes.starts_with(ZIP_MAGIC) {
            ContainerKind::Zip
        } else {
            ContainerKind::Gltf
        }
    }
}

/// Parse `.gltf` JSON text
pub fn parse_gltf(json: &str, options: &ImportOptions) -> Result<Document> {
    let document = Document::from_json_str(json)?;
    if options.validate_references {
        document.validate()?;
    }
    Ok(document)
}

/// Parse a `.glb` container, returning the document and the BIN chunk
pub fn parse_glb<'a>(bytes: &'a [u8], options: &ImportOptions) -> Result<(Document, &'a [u8])> {
    let glb = glb::parse_glb(bytes)?;
    let document = Document::from_slice(glb.json)?;
    if options.validate_references {
        document.validate()?;
    }
    Ok((document, glb.bin))
}

/// Cooperative cancellation shared between the caller and a running load
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Result of an operation that may be cancelled. Cancellation is not an error.
#[derive(Debug)]
pub enum Outcome<T> {
    Completed(T),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Cancelled => None,
        }
    }
}

macro_rules! check_cancelled {
    ($cancel:expr) => {
        if $cancel.is_cancelled() {
            tracing::debug!("import cancelled");
            return Ok(Outcome::Cancelled);
        }
    };
}

/// Parse `bytes` and resolve every buffer and image.
///
/// Yields between loads; `cancel` is checked at each of those points.
/// A `.zip` archive resolves its URIs from its own entries, not `storage`.
pub async fn load<S: Storage>(
    bytes: &[u8],
    kind: ContainerKind,
    storage: &S,
    options: &ImportOptions,
    cancel: &CancelFlag,
    progress: Progress<'_>,
) -> Result<Outcome<ImportedDocument>> {
    match kind {
        ContainerKind::Gltf => {
            let document = parse_gltf(std::str::from_utf8(bytes)?, options)?;
            check_cancelled!(cancel);
            resolve(document, None, storage, options, cancel, progress).await
        }
        ContainerKind::Glb => {
            let (document, bin) = parse_glb(bytes, options)?;
            check_cancelled!(cancel);
            resolve(document, Some(bin), storage, options, cancel, progress).await
        }
        ContainerKind::Zip => {
            let archive = ZipStorage::parse(bytes)?;
            let (name, json) = archive.gltf_entry()?;
            tracing::debug!("loading {} from zip archive", name);
            let document = parse_gltf(std::str::from_utf8(&json)?, options)?;
            check_cancelled!(cancel);
            resolve(document, None, &archive, options, cancel, progress).await
        }
    }
}

/// Fetch the bytes behind every buffer and image of a parsed document
async fn resolve<S: Storage>(
    document: Document,
    bin: Option<&[u8]>,
    storage: &S,
    options: &ImportOptions,
    cancel: &CancelFlag,
    progress: Progress<'_>,
) -> Result<Outcome<ImportedDocument>> {
    let steps = (document.buffers.len() + document.images.len()).max(1) as f32;
    let mut buffers = Vec::with_capacity(document.buffers.len());
    for (index, buffer) in document.buffers.iter().enumerate() {
        let step = |p: f32| progress((index as f32 + p) / steps);
        let mut data = match buffer.uri.as_deref() {
            None => match bin {
                Some(bin) if index == 0 => bin.to_vec(),
                _ => return Err(GltfError::MissingBufferData(index as u32)),
            },
            Some(uri) if uri.starts_with("data:") => decode_data_uri(uri)?,
            Some(uri) => storage.load_binary(uri, &step).await?.to_vec(),
        };

        let declared = buffer.byte_length as usize;
        if data.len() < declared {
            return Err(GltfError::Truncated {
                offset: 0,
                needed: declared,
                available: data.len(),
            });
        }
        data.truncate(declared);
        tracing::trace!("buffer {}: {} bytes", index, data.len());
        buffers.push(data);

        step(1.0);
        tokio::task::yield_now().await;
        check_cancelled!(cancel);
    }
    tracing::debug!("resolved {} buffers", buffers.len());

    let mut images = Vec::with_capacity(document.images.len());
    for (index, image) in document.images.iter().enumerate() {
        let done = document.buffers.len() + index;
        let step = |p: f32| progress((done as f32 + p) / steps);
        let data = match (image.buffer_view, image.uri.as_deref()) {
            (Some(view), _) => {
                Some(Bytes::from(AccessorReader::new(&document, &buffers).view_bytes(view)?))
            }
            (None, Some(uri)) if uri.starts_with("data:") => {
                Some(Bytes::from(decode_data_uri(uri)?))
            }
            (None, Some(uri)) => Some(storage.load_binary(uri, &step).await?),
            (None, None) => {
                tracing::warn!("image {} has neither uri nor bufferView", index);
                None
            }
        };
        images.push(data);

        step(1.0);
        tokio::task::yield_now().await;
        check_cancelled!(cancel);
    }

    Ok(Outcome::Completed(ImportedDocument {
        document,
        buffers,
        images,
        options: options.clone(),
    }))
}

/// Local transform in the host convention
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTransform {
    pub name: Option<String>,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

/// One morph target's deltas
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MorphTarget {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec3>,
}

/// Vertex streams of one primitive. Streams absent from the file are empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedPrimitive {
    pub mode: Mode,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec4>,
    pub uvs: Vec<Vec2>,
    pub colors: Vec<Vec4>,
    pub joints: Vec<[u16; 4]>,
    pub weights: Vec<Vec4>,
    pub indices: Vec<u32>,
    pub material: Option<MaterialId>,
    pub morph_targets: Vec<MorphTarget>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedMesh {
    pub name: Option<String>,
    pub primitives: Vec<ImportedPrimitive>,
    pub weights: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedSkin {
    pub name: Option<String>,
    pub joints: Vec<NodeId>,
    pub skeleton: Option<NodeId>,
    pub inverse_bind_matrices: Vec<Mat4>,
}

/// Keyframes of one channel. `values` holds `components` floats per
/// element; cubic spline channels store `(in, value, out)` per key.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedChannel {
    pub node: Option<NodeId>,
    pub path: Path,
    pub interpolation: Interpolation,
    pub times: Vec<f32>,
    pub values: Vec<f32>,
    pub components: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedAnimation {
    pub name: Option<String>,
    pub channels: Vec<ImportedChannel>,
}

/// A parsed document with all of its bytes resolved
#[derive(Debug)]
pub struct ImportedDocument {
    document: Document,
    buffers: Vec<Vec<u8>>,
    images: Vec<Option<Bytes>>,
    options: ImportOptions,
}

impl ImportedDocument {
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Resolved bytes, one entry per document buffer
    pub fn buffers(&self) -> &[Vec<u8>] {
        &self.buffers
    }

    pub fn reader(&self) -> AccessorReader<'_> {
        AccessorReader::new(&self.document, &self.buffers)
    }

    /// Encoded bytes of an image, `None` when the image has no source
    pub fn image_bytes(&self, id: ImageId) -> Result<Option<&[u8]>> {
        self.document.image(id)?;
        Ok(self.images.get(id.index()).and_then(|b| b.as_deref()))
    }

    pub fn node_transforms(&self) -> Vec<NodeTransform> {
        self.document
            .nodes
            .iter()
            .map(|node| {
                let (translation, rotation, scale) = node.trs();
                NodeTransform {
                    name: node.name.clone(),
                    translation: translation.reverse_z(),
                    rotation: rotation.reverse_z(),
                    scale,
                }
            })
            .collect()
    }

    /// Host descriptions of every material, with unique names
    pub fn materials(&self) -> Result<Vec<MaterialDescription>> {
        self.document
            .materials
            .iter()
            .enumerate()
            .map(|(index, material)| {
                let name = self.document.unique_material_name(MaterialId::from_index(index))?;
                Ok(describe_material(material, name))
            })
            .collect()
    }

    fn read_floats(&self, id: AccessorId, expected: &[AccessorType]) -> Result<Vec<f32>> {
        let accessor = self.document.accessor(id)?;
        if !expected.contains(&accessor.accessor_type) {
            return Err(GltfError::AccessorTypeMismatch {
                accessor: id.0,
                actual: accessor.accessor_type.to_string(),
                requested: expected
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" or "),
            });
        }
        self.reader().read_float_array(id)
    }

    fn read_vec3(&self, id: Option<AccessorId>) -> Result<Vec<Vec3>> {
        let Some(id) = id else { return Ok(Vec::new()) };
        let flat = self.read_floats(id, &[AccessorType::Vec3])?;
        Ok(flat
            .chunks_exact(3)
            .map(|v| Vec3::from_slice(v).reverse_z())
            .collect())
    }

    fn read_vec4(&self, id: Option<AccessorId>) -> Result<Vec<Vec4>> {
        let Some(id) = id else { return Ok(Vec::new()) };
        let flat = self.read_floats(id, &[AccessorType::Vec4])?;
        Ok(flat.chunks_exact(4).map(Vec4::from_slice).collect())
    }

    fn read_colors(&self, id: Option<AccessorId>) -> Result<Vec<Vec4>> {
        let Some(id) = id else { return Ok(Vec::new()) };
        let n = self.document.accessor(id)?.accessor_type.component_count();
        let flat = self.read_floats(id, &[AccessorType::Vec3, AccessorType::Vec4])?;
        Ok(flat
            .chunks_exact(n)
            .map(|c| Vec4::new(c[0], c[1], c[2], c.get(3).copied().unwrap_or(1.0)))
            .collect())
    }

    fn read_uvs(&self, id: Option<AccessorId>) -> Result<Vec<Vec2>> {
        let Some(id) = id else { return Ok(Vec::new()) };
        let flat = self.read_floats(id, &[AccessorType::Vec2])?;
        Ok(flat
            .chunks_exact(2)
            .map(Vec2::from_slice)
            .map(|uv| if self.options.flip_uv { flip_uv(uv) } else { uv })
            .collect())
    }

    pub fn mesh(&self, id: MeshId) -> Result<ImportedMesh> {
        let mesh = self.document.mesh(id)?;
        let reader = self.reader();
        let mut primitives = Vec::with_capacity(mesh.primitives.len());

        for primitive in &mesh.primitives {
            let positions = self.read_vec3(primitive.attribute(POSITION))?;

            let indices = match primitive.indices {
                Some(indices) if primitive.mode == Mode::Triangles => reader.read_indices(indices)?,
                Some(indices) => reader.read_index_values(indices)?,
                None => {
                    let mut sequential: Vec<u32> = (0..positions.len() as u32).collect();
                    if primitive.mode == Mode::Triangles {
                        flip_triangles(&mut sequential);
                    }
                    sequential
                }
            };

            let morph_targets = primitive
                .targets
                .iter()
                .enumerate()
                .map(|(k, target)| {
                    Ok(MorphTarget {
                        name: primitive
                            .extras
                            .target_names
                            .get(k)
                            .cloned()
                            .unwrap_or_else(|| k.to_string()),
                        positions: self.read_vec3(target.get(POSITION).copied())?,
                        normals: self.read_vec3(target.get(NORMAL).copied())?,
                        tangents: self.read_vec3(target.get(TANGENT).copied())?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            primitives.push(ImportedPrimitive {
                mode: primitive.mode,
                normals: self.read_vec3(primitive.attribute(NORMAL))?,
                tangents: self
                    .read_vec4(primitive.attribute(TANGENT))?
                    .into_iter()
                    .map(ReverseZ::reverse_z)
                    .collect(),
                uvs: self.read_uvs(primitive.attribute(TEXCOORD_0))?,
                colors: self.read_colors(primitive.attribute(COLOR_0))?,
                joints: match primitive.attribute(JOINTS_0) {
                    Some(joints) => reader.read_joints(joints)?,
                    None => Vec::new(),
                },
                weights: self.read_vec4(primitive.attribute(WEIGHTS_0))?,
                positions,
                indices,
                material: primitive.material,
                morph_targets,
            });
        }

        tracing::trace!("decoded mesh {} ({} primitives)", id.0, primitives.len());
        Ok(ImportedMesh {
            name: mesh.name.clone(),
            primitives,
            weights: mesh.weights.clone(),
        })
    }

    pub fn skin(&self, id: SkinId) -> Result<ImportedSkin> {
        let skin = self.document.skin(id)?;
        let inverse_bind_matrices = match skin.inverse_bind_matrices {
            Some(accessor) => {
                let matrices: Vec<Mat4> = self.reader().read_typed(accessor)?;
                if matrices.len() != skin.joints.len() {
                    tracing::warn!(
                        "skin {}: {} inverse bind matrices for {} joints",
                        id.0,
                        matrices.len(),
                        skin.joints.len()
                    );
                }
                matrices.into_iter().map(ReverseZ::reverse_z).collect()
            }
            None => vec![Mat4::IDENTITY; skin.joints.len()],
        };

        Ok(ImportedSkin {
            name: skin.name.clone(),
            joints: skin.joints.clone(),
            skeleton: skin.skeleton,
            inverse_bind_matrices,
        })
    }

    pub fn animation(&self, id: AnimationId) -> Result<ImportedAnimation> {
        let animation = self.document.animation(id)?;
        let reader = self.reader();
        let mut channels = Vec::with_capacity(animation.channels.len());

        for channel in &animation.channels {
            let sampler = animation.samplers.get(channel.sampler.index()).ok_or(
                GltfError::IndexOutOfRange {
                    list: AnimationSamplerId::LIST,
                    index: channel.sampler.0,
                    len: animation.samplers.len(),
                },
            )?;
            let times = reader.read_float_array(sampler.input)?;
            let mut values = reader.read_float_array(sampler.output)?;

            let per_key = if sampler.interpolation == Interpolation::CubicSpline { 3 } else { 1 };
            let components = match channel.target.path.component_count() {
                Some(n) => n,
                None if times.is_empty() => 0,
                None => values.len() / (times.len() * per_key),
            };
            if components > 0 && values.len() != times.len() * per_key * components {
                return Err(GltfError::Invalid(format!(
                    "animation {} sampler {}: {} output values for {} keys",
                    id.0,
                    channel.sampler.0,
                    values.len(),
                    times.len()
                )));
            }

            convert_channel_values(&channel.target.path, sampler.interpolation, &mut values);
            channels.push(ImportedChannel {
                node: channel.target.node,
                path: channel.target.path.clone(),
                interpolation: sampler.interpolation,
                times,
                values,
                components,
            });
        }

        Ok(ImportedAnimation {
            name: animation.name.clone(),
            channels,
        })
    }
}

/// Mirror keyframe values in place. Rotation keys are kept on the shortest
/// path from the previous key, starting from identity.
fn convert_channel_values(path: &Path, interpolation: Interpolation, values: &mut [f32]) {
    match path {
        Path::Translation => {
            for v in values.chunks_exact_mut(3) {
                v[2] = -v[2];
            }
        }
        Path::Rotation => {
            let per_key = if interpolation == Interpolation::CubicSpline { 3 } else { 1 };
            let mut last = Quat::IDENTITY;
            for key in values.chunks_exact_mut(4 * per_key) {
                let value_at = if per_key == 3 { 4 } else { 0 };
                let mut q = Quat::from_slice(&key[value_at..value_at + 4]).reverse_z();
                let negate = last.dot(q) <= 0.0;
                if negate {
                    q = -q;
                }
                last = q;

                for (i, element) in key.chunks_exact_mut(4).enumerate() {
                    let converted = if i * 4 == value_at {
                        q.to_array()
                    } else {
                        let raw = [element[0], element[1], element[2], element[3]];
                        let tangent = reverse_z_quat_components(raw);
                        if negate { tangent.map(|c| -c) } else { tangent }
                    };
                    element.copy_from_slice(&converted);
                }
            }
        }
        Path::Scale | Path::Weights | Path::Other(_) => {}
    }
}

/// Load with no progress reporting and no cancellation
pub async fn load_simple<S: Storage>(
    bytes: &[u8],
    kind: ContainerKind,
    storage: &S,
    options: &ImportOptions,
) -> Result<ImportedDocument> {
    match load(bytes, kind, storage, options, &CancelFlag::new(), &no_progress).await? {
        Outcome::Completed(imported) => Ok(imported),
        Outcome::Cancelled => Err(GltfError::Invalid("load cancelled".to_string())),
    }
}
