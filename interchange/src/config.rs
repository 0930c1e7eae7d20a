//! Codec configuration (`gltf-interchange.toml`)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodecConfig {
    #[serde(default)]
    pub import: ImportOptions,
    #[serde(default)]
    pub export: ExportOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Flip texture V at the boundary
    #[serde(default = "default_true")]
    pub flip_uv: bool,
    /// Run `Document::validate` after parsing
    #[serde(default = "default_true")]
    pub validate_references: bool,
}

/// Output container written by the exporter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Container {
    #[default]
    Glb,
    GltfEmbedded,
    GltfSeparate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    #[serde(default = "default_generator")]
    pub generator: String,
    /// Store morph target deltas as sparse accessors
    #[serde(default)]
    pub use_sparse_morph_targets: bool,
    #[serde(default = "default_true")]
    pub flip_uv: bool,
    /// Declared in `extensionsUsed` in addition to `KHR_materials_unlit`
    #[serde(default)]
    pub extensions_used: Vec<String>,
    #[serde(default)]
    pub container: Container,
}

fn default_true() -> bool { true }
fn default_generator() -> String { format!("gltf-interchange {}", env!("CARGO_PKG_VERSION")) }

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            flip_uv: true,
            validate_references: true,
        }
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            generator: default_generator(),
            use_sparse_morph_targets: false,
            flip_uv: true,
            extensions_used: Vec::new(),
            container: Container::Glb,
        }
    }
}

impl CodecConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("loaded codec config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CodecConfig::default();
        assert!(config.import.flip_uv);
        assert!(config.import.validate_references);
        assert!(!config.export.use_sparse_morph_targets);
        assert_eq!(config.export.container, Container::Glb);
        assert!(config.export.generator.starts_with("gltf-interchange"));
    }

    #[test]
    fn test_config_deserialize_empty() {
        // Empty TOML should produce defaults
        let config = CodecConfig::from_toml_str("").unwrap();
        assert_eq!(config, CodecConfig::default());
    }

    #[test]
    fn test_config_deserialize_partial_export() {
        let toml_str = r#"
[export]
use_sparse_morph_targets = true
container = "gltf-separate"
extensions_used = ["KHR_texture_transform"]
"#;
        let config = CodecConfig::from_toml_str(toml_str).unwrap();
        assert!(config.export.use_sparse_morph_targets);
        assert_eq!(config.export.container, Container::GltfSeparate);
        assert_eq!(config.export.extensions_used, vec!["KHR_texture_transform"]);
        assert!(config.export.flip_uv); // default
        assert!(config.import.validate_references); // default
    }

    #[test]
    fn test_config_rejects_unknown_container() {
        let toml_str = r#"
[export]
container = "zip"
"#;
        assert!(matches!(
            CodecConfig::from_toml_str(toml_str),
            Err(crate::error::GltfError::Config(_))
        ));
    }

    #[test]
    fn test_config_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codec.toml");
        std::fs::write(&path, "[import]\nflip_uv = false\n").unwrap();
        let config = CodecConfig::load(&path).unwrap();
        assert!(!config.import.flip_uv);

        assert!(CodecConfig::load(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_config_serialize_roundtrip() {
        let mut config = CodecConfig::default();
        config.export.container = Container::GltfEmbedded;
        config.export.generator = "tests".into();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("container = \"gltf-embedded\""));
        assert_eq!(CodecConfig::from_toml_str(&toml_str).unwrap(), config);
    }
}
