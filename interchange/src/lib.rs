//! glTF 2.0 / GLB interchange codec
//!
//! Reads and writes glTF documents and the binary data behind them, and
//! converts between glTF's right-handed convention and a left-handed host.
//!
//! # Modules
//!
//! - [`document`] - JSON document model with typed indices and validation
//! - [`glb`] - GLB container framing
//! - [`buffer`] - Growable export buffer with per-view alignment
//! - [`accessor`] - Typed accessor reads, sparse overlay, index winding
//! - [`assembly`] - Export-side buffer view and accessor construction
//! - [`coords`] - Handedness conversion
//! - [`material`] - Shading model strategies
//! - [`storage`] - Byte sources for external, embedded and zipped URIs
//! - [`import`] / [`export`] - End-to-end pipelines
//! - [`config`] - TOML codec options

pub mod accessor;
pub mod assembly;
pub mod buffer;
pub mod compat;
pub mod config;
pub mod coords;
pub mod document;
pub mod error;
pub mod export;
pub mod glb;
pub mod ids;
pub mod import;
pub mod material;
pub mod storage;

pub use accessor::{AccessorElement, AccessorReader};
pub use assembly::Assembly;
pub use buffer::ByteBuffer;
pub use config::{CodecConfig, Container, ExportOptions, ImportOptions};
pub use coords::ReverseZ;
pub use document::Document;
pub use error::{GltfError, Result};
pub use export::{ExportScene, ExportedDocument, export_scene};
pub use import::{CancelFlag, ContainerKind, ImportedDocument, Outcome, load, parse_glb, parse_gltf};
pub use material::{MaterialDescription, ShadingModel, ShadingRegistry};
pub use storage::{FileSystemStorage, LoadCache, MemoryStorage, Storage, ZipStorage};
