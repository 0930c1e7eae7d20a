//! Error type shared by every stage of the codec

use thiserror::Error;

/// Errors raised while parsing, validating, reading or assembling a document
#[derive(Debug, Error)]
pub enum GltfError {
    #[error("empty input")]
    EmptyInput,

    #[error("invalid GLB magic: expected \"glTF\", found {0:?}")]
    InvalidMagic([u8; 4]),

    #[error("unsupported GLB container version {0}")]
    UnsupportedGlbVersion(u32),

    #[error("unknown chunk type: {0}")]
    UnknownChunkType(String),

    #[error("unknown chunk count: {0}")]
    UnknownChunkCount(usize),

    #[error("chunk 0 is not JSON")]
    FirstChunkNotJson,

    #[error("chunk 1 is not BIN")]
    SecondChunkNotBin,

    #[error("truncated data: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("unknown gltf version {0}")]
    UnsupportedVersion(String),

    #[error("unsupported container: {0}")]
    UnsupportedContainer(String),

    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON chunk is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("{list}[{index}] is out of range (len {len})")]
    IndexOutOfRange {
        list: &'static str,
        index: u32,
        len: usize,
    },

    #[error("invalid document: {0}")]
    Invalid(String),

    #[error("invalid byteStride {stride} on bufferView {view}")]
    InvalidByteStride { view: u32, stride: u32 },

    #[error("accessor {accessor} is {actual}, requested {requested}")]
    AccessorTypeMismatch {
        accessor: u32,
        actual: String,
        requested: String,
    },

    #[error("accessor {accessor}: unsupported component type {component_type} for this read")]
    UnsupportedComponentType { accessor: u32, component_type: u32 },

    #[error("accessor {accessor} reads past the end of buffer {buffer}")]
    AccessorOutOfBounds { accessor: u32, buffer: u32 },

    #[error("sparse data length mismatch: {indices} indices, {values} values")]
    SparseLengthMismatch { indices: usize, values: usize },

    #[error("buffer {0} would grow past the 4 GiB glTF limit")]
    BufferOverflow(u32),

    #[error("buffer {0} has no loaded data")]
    MissingBufferData(u32),

    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error for {uri}: {message}")]
    Storage { uri: String, message: String },

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, GltfError>;
