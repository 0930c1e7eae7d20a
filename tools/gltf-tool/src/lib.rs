//! gltf-tool library
//!
//! Loading, inspection and container conversion used by the `gltf-tool`
//! binary.

pub mod inspect;
pub mod repack;

use std::path::Path;

use anyhow::{Context, Result};
use gltf_interchange::import::load_simple;
use gltf_interchange::{ContainerKind, FileSystemStorage, ImportOptions, ImportedDocument};

/// Load a `.gltf`, `.glb` or `.zip` file. Side files are read next to it,
/// or from the archive for `.zip`.
pub async fn load_file(path: &Path, options: &ImportOptions) -> Result<ImportedDocument> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;
    let kind = ContainerKind::detect(Some(path), &bytes);
    let root = path.parent().unwrap_or_else(|| Path::new("."));
    let storage = FileSystemStorage::new(root);

    tracing::debug!("Loading {:?} as {:?}", path, kind);
    load_simple(&bytes, kind, &storage, options)
        .await
        .with_context(|| format!("Failed to load glTF: {:?}", path))
}
