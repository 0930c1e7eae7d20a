//! Handedness conversion between glTF (right-handed) and the host
//! (left-handed) convention.
//!
//! The conversion mirrors the Z axis. Every transform here is its own
//! inverse, so the same call is used on import and on export. Triangle
//! winding must be flipped together with the mirror, exactly once per
//! direction.

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

/// Mirror across the XY plane
pub trait ReverseZ {
    fn reverse_z(self) -> Self;
}

impl ReverseZ for Vec3 {
    fn reverse_z(self) -> Self {
        Vec3::new(self.x, self.y, -self.z)
    }
}

/// Tangents keep their `w` handedness sign
impl ReverseZ for Vec4 {
    fn reverse_z(self) -> Self {
        Vec4::new(self.x, self.y, -self.z, self.w)
    }
}

/// Mirrored rotation: same angle about the mirrored axis, opposite sense.
impl ReverseZ for Quat {
    fn reverse_z(self) -> Self {
        let (axis, angle) = self.to_axis_angle();
        Quat::from_axis_angle(axis.reverse_z(), -angle)
    }
}

/// Component form of `Quat::reverse_z`: `(x, y, z, w)` becomes
/// `(-x, -y, z, w)`. Being linear, it also applies to quaternion-valued
/// spline tangents, which are not unit rotations.
pub fn reverse_z_quat_components(q: [f32; 4]) -> [f32; 4] {
    [-q[0], -q[1], q[2], q[3]]
}

/// Decompose, mirror translation and rotation, recompose. Scale is
/// unaffected by the mirror.
impl ReverseZ for Mat4 {
    fn reverse_z(self) -> Self {
        let (scale, rotation, translation) = self.to_scale_rotation_translation();
        Mat4::from_scale_rotation_translation(
            scale,
            rotation.reverse_z(),
            translation.reverse_z(),
        )
    }
}

impl ReverseZ for [f32; 3] {
    fn reverse_z(self) -> Self {
        Vec3::from_array(self).reverse_z().to_array()
    }
}

impl ReverseZ for [f32; 4] {
    fn reverse_z(self) -> Self {
        Vec4::from_array(self).reverse_z().to_array()
    }
}

/// Convert every element in place
pub fn reverse_z_all<T: ReverseZ + Copy>(values: &mut [T]) {
    for value in values {
        *value = value.reverse_z();
    }
}

/// Reverse the winding of each complete triangle: `(i0, i1, i2)` becomes
/// `(i2, i1, i0)`. Trailing indices that do not form a triangle are kept.
pub fn flip_triangles<T>(indices: &mut [T]) {
    for triangle in indices.chunks_exact_mut(3) {
        triangle.swap(0, 2);
    }
}

/// Texture V axis flip between top-left and bottom-left origins
pub fn flip_uv(uv: Vec2) -> Vec2 {
    Vec2::new(uv.x, 1.0 - uv.y)
}
