//! GLB container framing
//!
//! Layout: `magic("glTF") | version(u32) | totalLength(u32)` followed by chunks
//! of `length(u32) | type(4 bytes) | data`. A conformant file carries exactly
//! one JSON chunk followed by one BIN chunk. Chunk data is padded to a 4-byte
//! boundary with spaces (JSON) or zeros (BIN).

use crate::error::{GltfError, Result};

pub const GLB_MAGIC: [u8; 4] = *b"glTF";
pub const GLB_VERSION: u32 = 2;
pub const HEADER_SIZE: usize = 12;
pub const CHUNK_HEADER_SIZE: usize = 8;

/// Chunk type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkType {
    Json,
    Bin,
}

impl ChunkType {
    /// Little-endian tag value as stored in the file
    pub const fn to_u32(self) -> u32 {
        match self {
            ChunkType::Json => 0x4E4F534A, // "JSON"
            ChunkType::Bin => 0x004E4942,  // "BIN\0"
        }
    }

    /// Byte used to pad this chunk's data to 4-byte alignment
    pub const fn padding_byte(self) -> u8 {
        match self {
            ChunkType::Json => 0x20,
            ChunkType::Bin => 0x00,
        }
    }

    /// Parse a 4-byte tag, ignoring NUL padding
    pub fn from_tag(tag: [u8; 4]) -> Result<Self> {
        let name: String = tag
            .iter()
            .filter(|&&b| b != 0)
            .map(|&b| b as char)
            .collect();
        match name.as_str() {
            "JSON" => Ok(ChunkType::Json),
            "BIN" => Ok(ChunkType::Bin),
            _ => Err(GltfError::UnknownChunkType(name)),
        }
    }
}

/// One framed chunk, borrowed from the container bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlbChunk<'a> {
    pub chunk_type: ChunkType,
    pub data: &'a [u8],
}

/// The two payloads of a conformant GLB file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glb<'a> {
    /// JSON text with trailing space padding removed
    pub json: &'a [u8],
    /// BIN chunk data including its zero padding. The document's
    /// `buffers[0].byteLength` gives the meaningful length.
    pub bin: &'a [u8],
}

/// Returns true if `bytes` starts with the GLB magic
pub fn is_glb(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && bytes[0..4] == GLB_MAGIC
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    bytes
        .get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(GltfError::Truncated {
            offset,
            needed: 4,
            available: bytes.len().saturating_sub(offset),
        })
}

/// Validate the header and read every chunk until the end of input
pub fn parse_chunks(bytes: &[u8]) -> Result<Vec<GlbChunk<'_>>> {
    if bytes.is_empty() {
        return Err(GltfError::EmptyInput);
    }
    if bytes.len() < HEADER_SIZE {
        return Err(GltfError::Truncated {
            offset: 0,
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let magic = [bytes[0], bytes[1], bytes[2], bytes[3]];
    if magic != GLB_MAGIC {
        return Err(GltfError::InvalidMagic(magic));
    }
    let version = read_u32(bytes, 4)?;
    if version != GLB_VERSION {
        return Err(GltfError::UnsupportedGlbVersion(version));
    }
    let total_length = read_u32(bytes, 8)? as usize;
    if total_length != bytes.len() {
        tracing::debug!(
            "GLB header length {} differs from input length {}",
            total_length,
            bytes.len()
        );
    }

    let mut chunks = Vec::with_capacity(2);
    let mut offset = HEADER_SIZE;
    while offset < bytes.len() {
        let length = read_u32(bytes, offset)? as usize;
        let tag = bytes
            .get(offset + 4..offset + 8)
            .ok_or(GltfError::Truncated {
                offset: offset + 4,
                needed: 4,
                available: bytes.len().saturating_sub(offset + 4),
            })?;
        let chunk_type = ChunkType::from_tag([tag[0], tag[1], tag[2], tag[3]])?;

        let start = offset + CHUNK_HEADER_SIZE;
        let data = bytes
            .get(start..start + length)
            .ok_or(GltfError::Truncated {
                offset: start,
                needed: length,
                available: bytes.len().saturating_sub(start),
            })?;
        tracing::trace!("GLB chunk {:?}: {} bytes at {}", chunk_type, length, start);

        chunks.push(GlbChunk { chunk_type, data });
        offset = start + length;
    }

    Ok(chunks)
}

/// Parse a GLB file into its JSON and BIN payloads
pub fn parse_glb(bytes: &[u8]) -> Result<Glb<'_>> {
    let chunks = parse_chunks(bytes)?;
    if chunks.len() != 2 {
        return Err(GltfError::UnknownChunkCount(chunks.len()));
    }
    if chunks[0].chunk_type != ChunkType::Json {
        return Err(GltfError::FirstChunkNotJson);
    }
    if chunks[1].chunk_type != ChunkType::Bin {
        return Err(GltfError::SecondChunkNotBin);
    }

    let json = chunks[0].data;
    let trimmed = json
        .iter()
        .rposition(|&b| b != ChunkType::Json.padding_byte())
        .map_or(0, |last| last + 1);

    Ok(Glb {
        json: &json[..trimmed],
        bin: chunks[1].data,
    })
}

fn push_chunk(glb: &mut Vec<u8>, chunk_type: ChunkType, data: &[u8]) {
    let padding = (4 - data.len() % 4) % 4;
    glb.extend_from_slice(&((data.len() + padding) as u32).to_le_bytes());
    glb.extend_from_slice(&chunk_type.to_u32().to_le_bytes());
    glb.extend_from_slice(data);
    glb.resize(glb.len() + padding, chunk_type.padding_byte());
}

/// Assemble a GLB file from JSON text and binary buffer data
pub fn write_glb(json: &[u8], bin: &[u8]) -> Vec<u8> {
    let capacity = HEADER_SIZE + 2 * CHUNK_HEADER_SIZE + json.len() + bin.len() + 6;
    let mut glb = Vec::with_capacity(capacity);

    // Header; total length is patched once both chunks are written
    glb.extend_from_slice(&GLB_MAGIC);
    glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
    glb.extend_from_slice(&0u32.to_le_bytes());

    push_chunk(&mut glb, ChunkType::Json, json);
    push_chunk(&mut glb, ChunkType::Bin, bin);

    let total_length = glb.len() as u32;
    glb[8..12].copy_from_slice(&total_length.to_le_bytes());

    glb
}
