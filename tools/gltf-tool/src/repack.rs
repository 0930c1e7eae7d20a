//! Container conversion
//!
//! Every buffer of a loaded document is merged into one, with each source
//! buffer starting on a 4-byte boundary and its views rebased. Images that
//! lived behind URIs move into buffer views of the merged buffer, so the
//! result is self-contained apart from the optional side `.bin`.

use anyhow::{Context, Result};
use gltf_interchange::buffer::ByteBuffer;
use gltf_interchange::export::ExportedDocument;
use gltf_interchange::ids::{BufferId, BufferViewId, ImageId};
use gltf_interchange::storage::data_uri_mime;
use gltf_interchange::{Container, ImportedDocument};

/// Single-buffer copy of `imported`
pub fn merge_buffers(imported: &ImportedDocument) -> Result<ExportedDocument> {
    let mut document = imported.document().clone();
    let mut merged = ByteBuffer::new(BufferId(0));

    let mut bases = Vec::with_capacity(imported.buffers().len());
    for bytes in imported.buffers() {
        let view = merged.append_bytes(bytes, 4, None)?;
        bases.push(view.byte_offset);
    }
    for (index, view) in document.buffer_views.iter_mut().enumerate() {
        let base = bases
            .get(view.buffer.index())
            .with_context(|| format!("bufferView {} references missing buffer", index))?;
        view.byte_offset += *base;
        view.buffer = BufferId(0);
    }

    for index in 0..document.images.len() {
        let id = ImageId::from_index(index);
        let image = &document.images[index];
        if image.buffer_view.is_some() {
            continue;
        }
        let Some(bytes) = imported.image_bytes(id)? else {
            continue;
        };

        let mime_type = image
            .mime_type
            .clone()
            .or_else(|| image.uri.as_deref().and_then(data_uri_mime).map(str::to_string))
            .unwrap_or_else(|| mime_for_extension(image.file_extension()).to_string());

        let mut view = merged.append_bytes(bytes, 1, None)?;
        view.byte_stride = None;
        document.buffer_views.push(view);
        let view_id = BufferViewId::from_index(document.buffer_views.len() - 1);

        let image = &mut document.images[index];
        tracing::debug!("Embedding image {} ({} bytes)", image.display_name(id), bytes.len());
        image.buffer_view = Some(view_id);
        image.uri = None;
        image.mime_type = Some(mime_type);
    }

    merged.align_end();
    document.buffers = if merged.is_empty() {
        Vec::new()
    } else {
        vec![merged.to_gltf_buffer(None)]
    };

    Ok(ExportedDocument {
        document,
        binary: merged.into_bytes(),
    })
}

fn mime_for_extension(extension: &str) -> &'static str {
    match extension {
        ".jpg" | ".jpeg" => "image/jpeg",
        _ => "image/png",
    }
}

/// Main file bytes and optional side `.bin` for `container`
pub fn repack(
    imported: &ImportedDocument,
    container: Container,
    bin_uri: &str,
) -> Result<(Vec<u8>, Option<Vec<u8>>)> {
    let merged = merge_buffers(imported)?;
    let (main, side) = merged.to_container(container, bin_uri)?;
    // Nothing references the side file when there is no buffer
    let side = side.filter(|_| !merged.document.buffers.is_empty());
    Ok((main, side))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gltf_interchange::assembly::Assembly;
    use gltf_interchange::document::{Buffer, Document, Image, Target};
    use gltf_interchange::ids::AccessorId;
    use gltf_interchange::import::load_simple;
    use gltf_interchange::storage::encode_data_uri;
    use gltf_interchange::{ContainerKind, ImportOptions, MemoryStorage};

    /// Two buffers, the second external, plus one external image
    async fn two_buffer_document() -> ImportedDocument {
        let mut assembly = Assembly::new(Document::new("repack"));
        let first = assembly.add_buffer();
        let second = assembly.add_buffer();
        assembly
            .extend_and_get_accessor(first, &[1u32, 2, 3], Some(Target::ElementArrayBuffer))
            .unwrap();
        assembly
            .extend_and_get_accessor(second, &[0.5f32, 1.5], None)
            .unwrap();
        let (mut document, buffers) = assembly.finish();

        document.buffers[0].uri = Some(encode_data_uri("application/octet-stream", &buffers[0]));
        document.buffers[1] = Buffer {
            uri: Some("second.bin".into()),
            byte_length: buffers[1].len() as u32,
            ..Default::default()
        };
        document.images.push(Image {
            uri: Some("albedo.jpg".into()),
            ..Default::default()
        });

        let mut storage = MemoryStorage::new();
        storage.insert("second.bin", buffers[1].clone());
        storage.insert("albedo.jpg", vec![0xFFu8, 0xD8, 0xFF]);

        let text = document.to_json_string().unwrap();
        load_simple(
            text.as_bytes(),
            ContainerKind::Gltf,
            &storage,
            &ImportOptions::default(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_merge_rebases_views() {
        let imported = two_buffer_document().await;
        let merged = merge_buffers(&imported).unwrap();

        assert_eq!(merged.document.buffers.len(), 1);
        assert_eq!(merged.binary.len() % 4, 0);
        for view in &merged.document.buffer_views {
            assert_eq!(view.buffer, BufferId(0));
        }
        // 12 bytes of indices, then the floats at the next 4-byte boundary
        assert_eq!(merged.document.buffer_views[1].byte_offset, 12);

        let image = &merged.document.images[0];
        assert_eq!(image.uri, None);
        assert_eq!(image.mime_type.as_deref(), Some("image/jpeg"));
        let view = &merged.document.buffer_views[image.buffer_view.unwrap().index()];
        let start = view.byte_offset as usize;
        assert_eq!(&merged.binary[start..start + 3], &[0xFF, 0xD8, 0xFF]);
    }

    #[tokio::test]
    async fn test_repack_to_glb_loads_standalone() {
        let imported = two_buffer_document().await;
        let (glb, side) = repack(&imported, Container::Glb, "unused.bin").unwrap();
        assert!(side.is_none());

        let storage = MemoryStorage::new();
        let reloaded = load_simple(&glb, ContainerKind::Glb, &storage, &ImportOptions::default())
            .await
            .unwrap();
        let floats = reloaded.reader().read_float_array(AccessorId(1)).unwrap();
        assert_eq!(floats, vec![0.5, 1.5]);
        let image = reloaded.image_bytes(ImageId(0)).unwrap().unwrap();
        assert_eq!(image, &[0xFF, 0xD8, 0xFF]);
    }

    #[tokio::test]
    async fn test_repack_separate_writes_side_file() {
        let imported = two_buffer_document().await;
        let (json, side) = repack(&imported, Container::GltfSeparate, "out.bin").unwrap();
        let text = String::from_utf8(json).unwrap();
        assert!(text.contains("\"out.bin\""));
        assert!(side.is_some());
    }
}
