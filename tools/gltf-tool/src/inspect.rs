//! Document summaries and full decode checks

use anyhow::{Context, Result};
use gltf_interchange::ImportedDocument;
use gltf_interchange::document::Document;
use gltf_interchange::ids::{AccessorId, AnimationId, ImageId, MeshId, SkinId};

/// Element counts of a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub version: String,
    pub generator: Option<String>,
    pub extensions_used: Vec<String>,
    pub buffers: usize,
    pub buffer_bytes: u64,
    pub buffer_views: usize,
    pub accessors: usize,
    pub sparse_accessors: usize,
    pub meshes: usize,
    pub primitives: usize,
    pub morph_targets: usize,
    pub materials: usize,
    pub textures: usize,
    pub images: usize,
    pub nodes: usize,
    pub skins: usize,
    pub animations: usize,
    pub scenes: usize,
}

impl Summary {
    pub fn from_document(document: &Document) -> Self {
        let primitives = document.meshes.iter().flat_map(|m| &m.primitives);
        Self {
            version: document.asset.version.clone(),
            generator: document.asset.generator.clone(),
            extensions_used: document.extensions_used.clone(),
            buffers: document.buffers.len(),
            buffer_bytes: document.buffers.iter().map(|b| b.byte_length as u64).sum(),
            buffer_views: document.buffer_views.len(),
            accessors: document.accessors.len(),
            sparse_accessors: document.accessors.iter().filter(|a| a.sparse.is_some()).count(),
            meshes: document.meshes.len(),
            primitives: primitives.clone().count(),
            morph_targets: primitives.map(|p| p.targets.len()).sum(),
            materials: document.materials.len(),
            textures: document.textures.len(),
            images: document.images.len(),
            nodes: document.nodes.len(),
            skins: document.skins.len(),
            animations: document.animations.len(),
            scenes: document.scenes.len(),
        }
    }

    pub fn log(&self) {
        tracing::info!(
            "glTF {} ({})",
            self.version,
            self.generator.as_deref().unwrap_or("unknown generator")
        );
        if !self.extensions_used.is_empty() {
            tracing::info!("  extensions: {}", self.extensions_used.join(", "));
        }
        tracing::info!(
            "  {} buffers ({} bytes), {} views, {} accessors ({} sparse)",
            self.buffers,
            self.buffer_bytes,
            self.buffer_views,
            self.accessors,
            self.sparse_accessors
        );
        tracing::info!(
            "  {} meshes, {} primitives, {} morph targets",
            self.meshes,
            self.primitives,
            self.morph_targets
        );
        tracing::info!(
            "  {} materials, {} textures, {} images",
            self.materials,
            self.textures,
            self.images
        );
        tracing::info!(
            "  {} nodes, {} skins, {} animations, {} scenes",
            self.nodes,
            self.skins,
            self.animations,
            self.scenes
        );
    }
}

/// What a successful check decoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub accessors: usize,
    pub values: usize,
    pub meshes: usize,
    pub skins: usize,
    pub animations: usize,
    pub missing_images: usize,
}

/// Decode every accessor, mesh, skin and animation; the first failure is
/// returned with the element it came from.
pub fn check(imported: &ImportedDocument) -> Result<CheckReport> {
    let document = imported.document();
    document.validate().context("Document failed validation")?;

    let mut report = CheckReport::default();
    let reader = imported.reader();
    for index in 0..document.accessors.len() {
        let values = reader
            .read_float_array(AccessorId::from_index(index))
            .with_context(|| format!("Failed to decode accessor {}", index))?;
        report.accessors += 1;
        report.values += values.len();
    }

    for index in 0..document.meshes.len() {
        imported
            .mesh(MeshId::from_index(index))
            .with_context(|| format!("Failed to convert mesh {}", index))?;
        report.meshes += 1;
    }
    for index in 0..document.skins.len() {
        imported
            .skin(SkinId::from_index(index))
            .with_context(|| format!("Failed to convert skin {}", index))?;
        report.skins += 1;
    }
    for index in 0..document.animations.len() {
        imported
            .animation(AnimationId::from_index(index))
            .with_context(|| format!("Failed to convert animation {}", index))?;
        report.animations += 1;
    }

    for index in 0..document.images.len() {
        if imported.image_bytes(ImageId::from_index(index))?.is_none() {
            tracing::warn!("Image {} has no data", index);
            report.missing_images += 1;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use gltf_interchange::export::{ExportMesh, ExportNode, ExportSubmesh};
    use gltf_interchange::{
        ContainerKind, ExportOptions, ExportScene, ImportOptions, MemoryStorage, export_scene,
    };

    fn triangle_scene() -> ExportScene {
        let mut node = ExportNode::new("tri");
        node.mesh = Some(0);
        ExportScene {
            nodes: vec![node],
            roots: vec![0],
            meshes: vec![ExportMesh {
                name: "tri".into(),
                positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
                submeshes: vec![ExportSubmesh {
                    indices: vec![0, 1, 2],
                    material: None,
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    async fn imported_triangle() -> ImportedDocument {
        let glb = export_scene(&triangle_scene(), &ExportOptions::default())
            .unwrap()
            .to_glb()
            .unwrap();
        gltf_interchange::import::load_simple(
            &glb,
            ContainerKind::Glb,
            &MemoryStorage::new(),
            &ImportOptions::default(),
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_summary_counts() {
        let exported = export_scene(&triangle_scene(), &ExportOptions::default()).unwrap();
        let summary = Summary::from_document(&exported.document);
        assert_eq!(summary.version, "2.0");
        assert_eq!(summary.meshes, 1);
        assert_eq!(summary.primitives, 1);
        assert_eq!(summary.nodes, 1);
        assert_eq!(summary.scenes, 1);
        assert_eq!(summary.sparse_accessors, 0);
        assert_eq!(summary.buffer_bytes, exported.binary.len() as u64);
    }

    #[tokio::test]
    async fn test_check_decodes_everything() {
        let imported = imported_triangle().await;
        let report = check(&imported).unwrap();
        assert_eq!(report.accessors, imported.document().accessors.len());
        assert_eq!(report.meshes, 1);
        // 3 positions (9 floats) + 3 indices
        assert_eq!(report.values, 12);
        assert_eq!(report.missing_images, 0);
    }
}
