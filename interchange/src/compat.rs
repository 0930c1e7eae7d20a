//! Backfill of fields written by older exporters
//!
//! Older files stored image names and morph target names under an `extra`
//! object that the typed model does not read. After parsing, the raw JSON is
//! walked once to recover them. Recovery is best effort: anything missing or
//! of the wrong type leaves the field at its default.

use serde_json::Value;

use crate::document::Document;

/// String at a JSON pointer, if present and non-empty
pub fn try_recover_legacy_field(raw: &Value, pointer: &str) -> Option<String> {
    raw.pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn apply_legacy_backfill(document: &mut Document, raw: &Value) {
    for (i, image) in document.images.iter_mut().enumerate() {
        if image.name.as_deref().is_some_and(|n| !n.is_empty()) {
            continue;
        }
        if let Some(name) = try_recover_legacy_field(raw, &format!("/images/{i}/extra/name")) {
            tracing::trace!("recovered legacy name {:?} for image {}", name, i);
            image.name = Some(name);
        }
    }

    for (m, mesh) in document.meshes.iter_mut().enumerate() {
        for (p, primitive) in mesh.primitives.iter_mut().enumerate() {
            if primitive.targets.is_empty() || !primitive.extras.target_names.is_empty() {
                continue;
            }
            let names: Option<Vec<String>> = (0..primitive.targets.len())
                .map(|t| {
                    let pointer = format!("/meshes/{m}/primitives/{p}/targets/{t}/extra/name");
                    try_recover_legacy_field(raw, &pointer)
                })
                .collect();
            if let Some(names) = names {
                tracing::trace!("recovered {} legacy target names for mesh {}", names.len(), m);
                primitive.extras.target_names = names;
            }
        }
    }
}
