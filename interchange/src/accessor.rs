//! Typed reads over accessors
//!
//! Reads resolve the base array (zeros when there is no buffer view), honor
//! `byteStride`, and then apply the sparse overlay in index order so a
//! duplicated index keeps the last value written.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use crate::coords::flip_triangles;
use crate::document::{Accessor, AccessorType, ComponentType, Document, Sparse};
use crate::error::{GltfError, Result};
use crate::ids::{AccessorId, BufferViewId};

/// Largest byte size an accessor may describe, the glTF buffer limit
const MAX_ACCESSOR_BYTES: usize = u32::MAX as usize;

/// Element type with a fixed accessor layout
pub trait AccessorElement: Pod + Zeroable {
    const COMPONENT_TYPE: ComponentType;
    const ACCESSOR_TYPE: AccessorType;
}

macro_rules! accessor_elements {
    ($($ty:ty => $component:ident, $shape:ident;)*) => {
        $(
            impl AccessorElement for $ty {
                const COMPONENT_TYPE: ComponentType = ComponentType::$component;
                const ACCESSOR_TYPE: AccessorType = AccessorType::$shape;
            }
        )*
    };
}

accessor_elements! {
    f32 => F32, Scalar;
    u32 => U32, Scalar;
    [f32; 2] => F32, Vec2;
    [f32; 3] => F32, Vec3;
    [f32; 4] => F32, Vec4;
    [u16; 4] => U16, Vec4;
    [f32; 16] => F32, Mat4;
    Vec2 => F32, Vec2;
    Vec3 => F32, Vec3;
    Vec4 => F32, Vec4;
    Quat => F32, Vec4;
    Mat4 => F32, Mat4;
}

/// Decode one component as a float, applying normalization
fn decode_f32(component_type: ComponentType, normalized: bool, bytes: &[u8]) -> f32 {
    match component_type {
        ComponentType::F32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        ComponentType::U32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32,
        ComponentType::I8 => {
            let v = bytes[0] as i8 as f32;
            if normalized { (v / 127.0).max(-1.0) } else { v }
        }
        ComponentType::U8 => {
            let v = bytes[0] as f32;
            if normalized { v / 255.0 } else { v }
        }
        ComponentType::I16 => {
            let v = i16::from_le_bytes([bytes[0], bytes[1]]) as f32;
            if normalized { (v / 32767.0).max(-1.0) } else { v }
        }
        ComponentType::U16 => {
            let v = u16::from_le_bytes([bytes[0], bytes[1]]) as f32;
            if normalized { v / 65535.0 } else { v }
        }
    }
}

/// Decode one unsigned index component
fn decode_index(component_type: ComponentType, bytes: &[u8]) -> u32 {
    match component_type {
        ComponentType::U8 => bytes[0] as u32,
        ComponentType::U16 => u16::from_le_bytes([bytes[0], bytes[1]]) as u32,
        _ => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}

/// Reads accessor data from loaded buffers
pub struct AccessorReader<'a> {
    document: &'a Document,
    buffers: &'a [Vec<u8>],
}

impl<'a> AccessorReader<'a> {
    /// `buffers[i]` holds the bytes of `document.buffers[i]`
    pub fn new(document: &'a Document, buffers: &'a [Vec<u8>]) -> Self {
        Self { document, buffers }
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    /// Bytes covered by a buffer view
    pub fn view_bytes(&self, id: BufferViewId) -> Result<&'a [u8]> {
        let view = self.document.buffer_view(id)?;
        let buffer = self
            .buffers
            .get(view.buffer.index())
            .ok_or(GltfError::MissingBufferData(view.buffer.0))?;
        let start = view.byte_offset as usize;
        let end = start + view.byte_length as usize;
        buffer.get(start..end).ok_or_else(|| {
            GltfError::Invalid(format!(
                "bufferView {} range {}..{} exceeds buffer {} ({} bytes)",
                id.0,
                start,
                end,
                view.buffer.0,
                buffer.len()
            ))
        })
    }

    /// Byte slices of `count` elements starting at `byte_offset` in a view
    fn elements(
        &self,
        accessor: AccessorId,
        view: BufferViewId,
        byte_offset: u32,
        stride: Option<usize>,
        element_size: usize,
        count: usize,
    ) -> Result<Vec<&'a [u8]>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let bytes = self.view_bytes(view)?;
        let stride = stride.unwrap_or(element_size);
        let offset = byte_offset as usize;
        let needed = offset + stride * (count - 1) + element_size;
        if needed > bytes.len() {
            return Err(GltfError::AccessorOutOfBounds {
                accessor: accessor.0,
                buffer: self.document.buffer_view(view)?.buffer.0,
            });
        }
        Ok((0..count)
            .map(|i| {
                let start = offset + i * stride;
                &bytes[start..start + element_size]
            })
            .collect())
    }

    fn view_stride(&self, view: BufferViewId) -> Result<Option<usize>> {
        Ok(self
            .document
            .buffer_view(view)?
            .byte_stride
            .map(|s| s as usize))
    }

    /// Element count of `accessor`, refusing counts that describe more bytes
    /// than a glTF buffer can hold
    fn element_count(&self, id: AccessorId, accessor: &Accessor) -> Result<usize> {
        let count = accessor.count as usize;
        count
            .checked_mul(accessor.element_size())
            .filter(|&bytes| bytes <= MAX_ACCESSOR_BYTES)
            .map(|_| count)
            .ok_or_else(|| {
                GltfError::Invalid(format!(
                    "accessor {}: count {} exceeds the {} byte limit",
                    id.0, accessor.count, MAX_ACCESSOR_BYTES
                ))
            })
    }

    /// Element positions replaced by a sparse overlay
    fn sparse_indices(
        &self,
        accessor: AccessorId,
        base: &Accessor,
        sparse: &Sparse,
    ) -> Result<Vec<usize>> {
        let component_type = sparse.indices.component_type;
        if !component_type.is_index_type() {
            return Err(GltfError::UnsupportedComponentType {
                accessor: accessor.0,
                component_type: component_type.as_gl_enum(),
            });
        }
        let indices: Vec<usize> = self
            .elements(
                accessor,
                sparse.indices.buffer_view,
                sparse.indices.byte_offset,
                None,
                component_type.size(),
                sparse.count as usize,
            )?
            .into_iter()
            .map(|bytes| decode_index(component_type, bytes) as usize)
            .collect();

        if let Some(&bad) = indices.iter().find(|&&i| i >= base.count as usize) {
            return Err(GltfError::Invalid(format!(
                "accessor {}: sparse index {} out of range (count {})",
                accessor.0, bad, base.count
            )));
        }
        Ok(indices)
    }

    /// Read an accessor whose layout matches `T` exactly
    pub fn read_typed<T: AccessorElement>(&self, id: AccessorId) -> Result<Vec<T>> {
        let accessor = self.document.accessor(id)?;
        if accessor.component_type != T::COMPONENT_TYPE
            || accessor.accessor_type != T::ACCESSOR_TYPE
        {
            return Err(GltfError::AccessorTypeMismatch {
                accessor: id.0,
                actual: format!("{}/{}", accessor.component_type, accessor.accessor_type),
                requested: format!("{}/{}", T::COMPONENT_TYPE, T::ACCESSOR_TYPE),
            });
        }

        let count = self.element_count(id, accessor)?;
        let mut values = match accessor.buffer_view {
            None => vec![T::zeroed(); count],
            Some(view) => self
                .elements(
                    id,
                    view,
                    accessor.byte_offset,
                    self.view_stride(view)?,
                    size_of::<T>(),
                    count,
                )?
                .into_iter()
                .map(bytemuck::pod_read_unaligned)
                .collect(),
        };

        if let Some(sparse) = &accessor.sparse {
            let indices = self.sparse_indices(id, accessor, sparse)?;
            let replacements = self.elements(
                id,
                sparse.values.buffer_view,
                sparse.values.byte_offset,
                None,
                size_of::<T>(),
                sparse.count as usize,
            )?;
            for (index, bytes) in indices.into_iter().zip(replacements) {
                values[index] = bytemuck::pod_read_unaligned(bytes);
            }
        }

        tracing::trace!("read accessor {}: {} elements", id.0, values.len());
        Ok(values)
    }

    /// Flat components of every element, decoded with `decode`
    fn read_components<V: Clone + Default>(
        &self,
        id: AccessorId,
        decode: impl Fn(ComponentType, bool, &[u8]) -> V,
    ) -> Result<Vec<V>> {
        let accessor = self.document.accessor(id)?;
        let component_type = accessor.component_type;
        let size = component_type.size();
        let n = accessor.accessor_type.component_count();
        let count = self.element_count(id, accessor)?;

        let decode_element = |bytes: &[u8], out: &mut [V]| {
            for (c, slot) in out.iter_mut().enumerate() {
                let component = &bytes[c * size..(c + 1) * size];
                *slot = decode(component_type, accessor.normalized, component);
            }
        };

        let mut values = vec![V::default(); count * n];
        if let Some(view) = accessor.buffer_view {
            let elements = self.elements(
                id,
                view,
                accessor.byte_offset,
                self.view_stride(view)?,
                accessor.element_size(),
                count,
            )?;
            for (element, out) in elements.into_iter().zip(values.chunks_mut(n)) {
                decode_element(element, out);
            }
        }

        if let Some(sparse) = &accessor.sparse {
            let indices = self.sparse_indices(id, accessor, sparse)?;
            let replacements = self.elements(
                id,
                sparse.values.buffer_view,
                sparse.values.byte_offset,
                None,
                accessor.element_size(),
                sparse.count as usize,
            )?;
            for (index, element) in indices.into_iter().zip(replacements) {
                decode_element(element, &mut values[index * n..(index + 1) * n]);
            }
        }

        Ok(values)
    }

    /// Every component as `f32`, regardless of the element shape
    pub fn read_float_array(&self, id: AccessorId) -> Result<Vec<f32>> {
        self.read_components(id, decode_f32)
    }

    /// Scalar index values in stored order
    pub fn read_index_values(&self, id: AccessorId) -> Result<Vec<u32>> {
        let accessor = self.document.accessor(id)?;
        if accessor.accessor_type != AccessorType::Scalar {
            return Err(GltfError::AccessorTypeMismatch {
                accessor: id.0,
                actual: accessor.accessor_type.to_string(),
                requested: AccessorType::Scalar.to_string(),
            });
        }
        if !accessor.component_type.is_index_type() {
            return Err(GltfError::UnsupportedComponentType {
                accessor: id.0,
                component_type: accessor.component_type.as_gl_enum(),
            });
        }
        self.read_components(id, |component_type, _, bytes| {
            decode_index(component_type, bytes)
        })
    }

    /// Triangle indices with winding converted to the host convention
    pub fn read_indices(&self, id: AccessorId) -> Result<Vec<u32>> {
        let mut indices = self.read_index_values(id)?;
        if indices.len() % 3 != 0 {
            tracing::warn!(
                "accessor {}: index count {} is not a multiple of 3",
                id.0,
                indices.len()
            );
        }
        flip_triangles(&mut indices);
        Ok(indices)
    }

    /// Integer vectors such as `JOINTS_0`, widened to `u16`
    pub fn read_joints(&self, id: AccessorId) -> Result<Vec<[u16; 4]>> {
        let accessor = self.document.accessor(id)?;
        if accessor.accessor_type != AccessorType::Vec4
            || !matches!(accessor.component_type, ComponentType::U8 | ComponentType::U16)
        {
            return Err(GltfError::AccessorTypeMismatch {
                accessor: id.0,
                actual: format!("{}/{}", accessor.component_type, accessor.accessor_type),
                requested: "UNSIGNED_BYTE or UNSIGNED_SHORT/VEC4".to_string(),
            });
        }
        let flat = self.read_components(id, |component_type, _, bytes| {
            decode_index(component_type, bytes) as u16
        })?;
        Ok(flat.chunks_exact(4).map(|c| [c[0], c[1], c[2], c[3]]).collect())
    }
}
