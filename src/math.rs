//! Linear algebra helpers on top of glam.
//!
//! Column-vector convention throughout: a child's absolute transform is
//! `parent_absolute * child_local`.

pub use glam::{Mat3, Mat4, Quat, Vec3, Vec4};

/// Build a bone-local transform from a rotation followed by a translation
#[inline]
pub fn compose_transform(rotation: Quat, translation: Vec3) -> Mat4 {
    Mat4::from_rotation_translation(rotation, translation)
}

/// Extension trait for decomposing authored transforms into keyframe data.
pub trait Mat4Ext {
    /// Copy of the matrix with each of its three basis vectors scaled to unit length.
    /// The translation column is left untouched.
    fn with_normalized_basis(&self) -> Mat4;

    /// Rotation and translation of a rigid transform, normalizing the basis first
    /// so accumulated scale or drift does not leak into the quaternion.
    fn to_rotation_translation(&self) -> (Quat, Vec3);
}

impl Mat4Ext for Mat4 {
    fn with_normalized_basis(&self) -> Mat4 {
        let x = self.x_axis.truncate().normalize_or_zero();
        let y = self.y_axis.truncate().normalize_or_zero();
        let z = self.z_axis.truncate().normalize_or_zero();

        Mat4::from_cols(
            x.extend(self.x_axis.w),
            y.extend(self.y_axis.w),
            z.extend(self.z_axis.w),
            self.w_axis,
        )
    }

    fn to_rotation_translation(&self) -> (Quat, Vec3) {
        let normalized = self.with_normalized_basis();
        let rotation = Quat::from_mat3(&Mat3::from_mat4(normalized)).normalize();

        // A collapsed basis has no meaningful rotation
        let rotation = if rotation.is_finite() {
            rotation
        } else {
            Quat::IDENTITY
        };

        (rotation, normalized.w_axis.truncate())
    }
}
