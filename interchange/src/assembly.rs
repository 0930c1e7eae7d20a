//! Export-side buffer assembly
//!
//! Appends typed arrays to growable buffers and registers the matching
//! bufferViews and accessors. Indices are assigned in append order, so the
//! same sequence of calls always produces the same document.

use bytemuck::Pod;

use crate::accessor::AccessorElement;
use crate::buffer::ByteBuffer;
use crate::document::{
    Accessor, BufferView, ComponentType, Document, Sparse, SparseIndices, SparseValues, Target,
};
use crate::error::{GltfError, Result};
use crate::ids::{AccessorId, BufferId, BufferViewId};

/// Component-wise bounds of a position array
pub fn compute_bounds(positions: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];

    for pos in positions {
        for i in 0..3 {
            min[i] = min[i].min(pos[i]);
            max[i] = max[i].max(pos[i]);
        }
    }

    (min, max)
}

/// Sparse index list written once and shared by the accessors that use it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparseIndexView {
    pub view: BufferViewId,
    pub count: u32,
}

/// A document under construction plus the bytes of its buffers
#[derive(Debug, Default)]
pub struct Assembly {
    document: Document,
    buffers: Vec<ByteBuffer>,
}

impl Assembly {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            buffers: Vec::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Add an empty growable buffer
    pub fn add_buffer(&mut self) -> BufferId {
        let id = BufferId::from_index(self.document.buffers.len());
        let buffer = ByteBuffer::new(id);
        self.document.buffers.push(buffer.to_gltf_buffer(None));
        self.buffers.push(buffer);
        id
    }

    fn byte_buffer(&mut self, id: BufferId) -> Result<&mut ByteBuffer> {
        let len = self.buffers.len();
        self.buffers
            .get_mut(id.index())
            .ok_or(GltfError::IndexOutOfRange {
                list: BufferId::LIST,
                index: id.0,
                len,
            })
    }

    fn push_view(&mut self, view: BufferView) -> BufferViewId {
        self.document.buffer_views.push(view);
        BufferViewId::from_index(self.document.buffer_views.len() - 1)
    }

    /// Append a typed array and register its view. Only vertex attribute
    /// views keep their stride.
    pub fn extend_and_get_view<T: Pod>(
        &mut self,
        buffer: BufferId,
        data: &[T],
        target: Option<Target>,
    ) -> Result<BufferViewId> {
        let mut view = self.byte_buffer(buffer)?.append(data, target)?;
        if target != Some(Target::ArrayBuffer) {
            view.byte_stride = None;
        }
        Ok(self.push_view(view))
    }

    /// Append opaque bytes (encoded images)
    pub fn extend_bytes_and_get_view(
        &mut self,
        buffer: BufferId,
        bytes: &[u8],
    ) -> Result<BufferViewId> {
        let mut view = self.byte_buffer(buffer)?.append_bytes(bytes, 1, None)?;
        view.byte_stride = None;
        Ok(self.push_view(view))
    }

    /// Append `data` and create an accessor over it.
    ///
    /// Returns `None` without touching the document when `data` is empty.
    pub fn extend_and_get_accessor<T: AccessorElement>(
        &mut self,
        buffer: BufferId,
        data: &[T],
        target: Option<Target>,
    ) -> Result<Option<AccessorId>> {
        if data.is_empty() {
            return Ok(None);
        }
        let view = self.extend_and_get_view(buffer, data, target)?;
        let accessor = Accessor::new(
            Some(view),
            T::COMPONENT_TYPE,
            T::ACCESSOR_TYPE,
            data.len() as u32,
        );
        Ok(Some(self.push_accessor(accessor)))
    }

    /// Append sparse indices as `UNSIGNED_INT`
    pub fn extend_sparse_indices(
        &mut self,
        buffer: BufferId,
        indices: &[u32],
    ) -> Result<Option<SparseIndexView>> {
        if indices.is_empty() {
            return Ok(None);
        }
        let view = self.extend_and_get_view(buffer, indices, None)?;
        Ok(Some(SparseIndexView {
            view,
            count: indices.len() as u32,
        }))
    }

    /// Create an accessor of `count` elements that are zero except at the
    /// positions listed in `indices`, which take `values` in order.
    ///
    /// The accessor has no base view. Returns `None` when `values` is empty.
    pub fn extend_sparse_and_get_accessor<T: AccessorElement>(
        &mut self,
        buffer: BufferId,
        count: usize,
        indices: SparseIndexView,
        values: &[T],
        target: Option<Target>,
    ) -> Result<Option<AccessorId>> {
        if values.is_empty() {
            return Ok(None);
        }
        if values.len() != indices.count as usize {
            return Err(GltfError::SparseLengthMismatch {
                indices: indices.count as usize,
                values: values.len(),
            });
        }
        if values.len() > count {
            return Err(GltfError::Invalid(format!(
                "sparse accessor with {} values exceeds count {}",
                values.len(),
                count
            )));
        }

        let values_view = self.extend_and_get_view(buffer, values, target)?;
        let mut accessor = Accessor::new(None, T::COMPONENT_TYPE, T::ACCESSOR_TYPE, count as u32);
        accessor.sparse = Some(Sparse {
            count: indices.count,
            indices: SparseIndices {
                buffer_view: indices.view,
                byte_offset: 0,
                component_type: ComponentType::U32,
            },
            values: SparseValues {
                buffer_view: values_view,
                byte_offset: 0,
            },
        });
        Ok(Some(self.push_accessor(accessor)))
    }

    pub fn push_accessor(&mut self, accessor: Accessor) -> AccessorId {
        self.document.accessors.push(accessor);
        AccessorId::from_index(self.document.accessors.len() - 1)
    }

    /// Record `min`/`max` on an accessor (required for `POSITION`)
    pub fn set_bounds(&mut self, id: AccessorId, min: &[f32], max: &[f32]) -> Result<()> {
        let len = self.document.accessors.len();
        let accessor = self
            .document
            .accessors
            .get_mut(id.index())
            .ok_or(GltfError::IndexOutOfRange {
                list: AccessorId::LIST,
                index: id.0,
                len,
            })?;
        accessor.min = min.to_vec();
        accessor.max = max.to_vec();
        Ok(())
    }

    /// Fix every buffer's byteLength and hand out the document and bytes
    pub fn finish(mut self) -> (Document, Vec<Vec<u8>>) {
        for (entry, buffer) in self.document.buffers.iter_mut().zip(&self.buffers) {
            entry.byte_length = buffer.len() as u32;
        }
        tracing::debug!(
            "assembled {} buffers, {} views, {} accessors",
            self.buffers.len(),
            self.document.buffer_views.len(),
            self.document.accessors.len()
        );
        let bytes = self.buffers.into_iter().map(ByteBuffer::into_bytes).collect();
        (self.document, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::AccessorReader;
    use crate::document::AccessorType;
    use glam::Vec3;

    #[test]
    fn test_compute_bounds_simple() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 2.0, 3.0], [-1.0, -2.0, -3.0]];
        let (min, max) = compute_bounds(&positions);
        assert_eq!(min, [-1.0, -2.0, -3.0]);
        assert_eq!(max, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_empty_array_returns_none() {
        let mut assembly = Assembly::new(Document::new("test"));
        let buffer = assembly.add_buffer();
        let id = assembly
            .extend_and_get_accessor::<Vec3>(buffer, &[], Some(Target::ArrayBuffer))
            .unwrap();
        assert_eq!(id, None);

        let (document, bytes) = assembly.finish();
        assert!(document.accessors.is_empty());
        assert!(document.buffer_views.is_empty());
        assert!(bytes[0].is_empty());
        assert_eq!(document.buffers[0].byte_length, 0);
    }

    #[test]
    fn test_type_table() {
        let mut assembly = Assembly::new(Document::new("test"));
        let buffer = assembly.add_buffer();
        let indices = assembly
            .extend_and_get_accessor(buffer, &[0u32, 1, 2], Some(Target::ElementArrayBuffer))
            .unwrap()
            .unwrap();
        let joints = assembly
            .extend_and_get_accessor(buffer, &[[0u16, 1, 2, 3]], Some(Target::ArrayBuffer))
            .unwrap()
            .unwrap();
        let matrices = assembly
            .extend_and_get_accessor(buffer, &[glam::Mat4::IDENTITY], None)
            .unwrap()
            .unwrap();

        let document = assembly.document();
        let indices = document.accessor(indices).unwrap();
        assert_eq!(indices.component_type, ComponentType::U32);
        assert_eq!(indices.accessor_type, AccessorType::Scalar);
        let index_view = document.buffer_view(indices.buffer_view.unwrap()).unwrap();
        assert_eq!(index_view.byte_stride, None);

        let joints = document.accessor(joints).unwrap();
        assert_eq!(joints.component_type, ComponentType::U16);
        assert_eq!(joints.accessor_type, AccessorType::Vec4);
        let joint_view = document.buffer_view(joints.buffer_view.unwrap()).unwrap();
        assert_eq!(joint_view.byte_stride, Some(8));

        let matrices = document.accessor(matrices).unwrap();
        assert_eq!(matrices.accessor_type, AccessorType::Mat4);
        assert_eq!(matrices.count, 1);
    }

    #[test]
    fn test_sparse_accessor_reads_back() {
        let mut assembly = Assembly::new(Document::new("test"));
        let buffer = assembly.add_buffer();
        let indices = assembly
            .extend_sparse_indices(buffer, &[1, 3])
            .unwrap()
            .unwrap();
        let id = assembly
            .extend_sparse_and_get_accessor(
                buffer,
                5,
                indices,
                &[Vec3::splat(9.0), Vec3::splat(7.0)],
                None,
            )
            .unwrap()
            .unwrap();

        let (document, buffers) = assembly.finish();
        let accessor = document.accessor(id).unwrap();
        assert_eq!(accessor.count, 5);
        assert_eq!(accessor.buffer_view, None);
        assert_eq!(accessor.sparse.as_ref().unwrap().count, 2);
        assert!(document.validate().is_ok());

        let reader = AccessorReader::new(&document, &buffers);
        let values: Vec<Vec3> = reader.read_typed(id).unwrap();
        assert_eq!(values[1], Vec3::splat(9.0));
        assert_eq!(values[3], Vec3::splat(7.0));
        assert_eq!(values[4], Vec3::ZERO);
    }

    #[test]
    fn test_sparse_length_mismatch() {
        let mut assembly = Assembly::new(Document::new("test"));
        let buffer = assembly.add_buffer();
        let indices = assembly
            .extend_sparse_indices(buffer, &[0, 1, 2])
            .unwrap()
            .unwrap();
        let err = assembly
            .extend_sparse_and_get_accessor(buffer, 4, indices, &[Vec3::ONE], None)
            .unwrap_err();
        assert!(matches!(
            err,
            GltfError::SparseLengthMismatch { indices: 3, values: 1 }
        ));
    }

    #[test]
    fn test_finish_sets_byte_length() {
        let mut assembly = Assembly::new(Document::new("test"));
        let buffer = assembly.add_buffer();
        assembly
            .extend_and_get_accessor(buffer, &[1.0f32, 2.0], None)
            .unwrap();
        let (document, bytes) = assembly.finish();
        assert_eq!(document.buffers[0].byte_length, 8);
        assert_eq!(bytes[0].len(), 8);
    }

    #[test]
    fn test_unknown_buffer() {
        let mut assembly = Assembly::new(Document::new("test"));
        assert!(matches!(
            assembly.extend_and_get_accessor(BufferId(2), &[1.0f32], None),
            Err(GltfError::IndexOutOfRange { list: "buffers", .. })
        ));
    }
}
