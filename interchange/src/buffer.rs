//! Growable binary buffer for export
//!
//! Each append is aligned to its element stride so every view starts at an
//! offset that is a multiple of the element size.

use bytemuck::Pod;

use crate::document::{Buffer, BufferView, Target};
use crate::error::{GltfError, Result};
use crate::ids::BufferId;

/// Zero bytes needed before appending at `used` with element `stride`
pub fn alignment_padding(used: usize, stride: usize) -> usize {
    if stride == 0 || used % stride == 0 {
        0
    } else {
        stride - used % stride
    }
}

/// Byte store backing one glTF buffer
#[derive(Debug, Clone)]
pub struct ByteBuffer {
    id: BufferId,
    bytes: Vec<u8>,
}

impl ByteBuffer {
    pub fn new(id: BufferId) -> Self {
        Self {
            id,
            bytes: Vec::new(),
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Append raw element bytes aligned to `stride`.
    ///
    /// The returned view records `stride` as its byteStride; views holding
    /// index data must have it cleared by the caller.
    pub fn append_bytes(
        &mut self,
        bytes: &[u8],
        stride: usize,
        target: Option<Target>,
    ) -> Result<BufferView> {
        let used = self.bytes.len();
        let padding = alignment_padding(used, stride);
        let end = used as u64 + padding as u64 + bytes.len() as u64;
        if end > u32::MAX as u64 {
            return Err(GltfError::BufferOverflow(self.id.0));
        }

        self.bytes.resize(used + padding, 0);
        let offset = self.bytes.len();
        self.bytes.extend_from_slice(bytes);
        tracing::trace!(
            "buffer {}: appended {} bytes at {} (stride {}, padding {})",
            self.id.0,
            bytes.len(),
            offset,
            stride,
            padding
        );

        let mut view = BufferView::new(self.id, offset as u32, bytes.len() as u32);
        view.byte_stride = (stride > 0).then_some(stride as u32);
        view.target = target;
        Ok(view)
    }

    /// Append a typed slice, aligned to the element size
    pub fn append<T: Pod>(&mut self, data: &[T], target: Option<Target>) -> Result<BufferView> {
        self.append_bytes(bytemuck::cast_slice(data), size_of::<T>(), target)
    }

    /// Pad the end to a 4-byte boundary
    pub fn align_end(&mut self) {
        let padding = alignment_padding(self.bytes.len(), 4);
        self.bytes.resize(self.bytes.len() + padding, 0);
    }

    /// glTF buffer entry describing the current contents
    pub fn to_gltf_buffer(&self, uri: Option<String>) -> Buffer {
        Buffer {
            uri,
            byte_length: self.bytes.len() as u32,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_padding() {
        assert_eq!(alignment_padding(0, 12), 0);
        assert_eq!(alignment_padding(6, 12), 6);
        assert_eq!(alignment_padding(12, 12), 0);
        assert_eq!(alignment_padding(3, 4), 1);
        assert_eq!(alignment_padding(5, 0), 0);
    }

    #[test]
    fn test_append_aligns_to_stride() {
        let mut buffer = ByteBuffer::new(BufferId(0));

        let a = buffer.append(&[1u16, 2, 3], None).unwrap();
        assert_eq!(a.byte_offset, 0);
        assert_eq!(a.byte_length, 6);

        let b = buffer.append(&[[1.0f32, 2.0, 3.0]], Some(Target::ArrayBuffer)).unwrap();
        assert_eq!(b.byte_offset, 12);
        assert_eq!(b.byte_offset % 12, 0);
        assert_eq!(b.byte_stride, Some(12));
        assert_eq!(b.target, Some(Target::ArrayBuffer));

        // Padding bytes are zero
        assert_eq!(&buffer.as_bytes()[6..12], &[0u8; 6]);
        assert_eq!(buffer.len(), 24);
    }

    #[test]
    fn test_alignment_invariant_over_mixed_appends() {
        let mut buffer = ByteBuffer::new(BufferId(0));
        let strides = [1usize, 12, 2, 16, 4, 64, 3, 8];
        for (i, &stride) in strides.iter().enumerate() {
            let data = vec![0xAAu8; stride * (i + 1)];
            let view = buffer.append_bytes(&data, stride, None).unwrap();
            assert_eq!(view.byte_offset as usize % stride, 0, "stride {stride}");
            assert_eq!(view.byte_length as usize, data.len());
        }
    }

    #[test]
    fn test_empty_append() {
        let mut buffer = ByteBuffer::new(BufferId(1));
        let view = buffer.append::<u32>(&[], None).unwrap();
        assert_eq!(view.byte_length, 0);
        assert_eq!(view.buffer, BufferId(1));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_align_end_and_gltf_buffer() {
        let mut buffer = ByteBuffer::new(BufferId(0));
        buffer.append(&[7u8], None).unwrap();
        buffer.align_end();
        assert_eq!(buffer.as_bytes(), &[7, 0, 0, 0]);
        assert_eq!(buffer.to_gltf_buffer(None).byte_length, 4);
    }
}
