use crate::math::{compose_transform, Mat4Ext};
use glam::{Mat4, Quat, Vec3};

/// A rotation and translation for one bone at a moment in time.
///
/// Keyframes are immutable once loaded; a clip shared between players is
/// only ever read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    time: f64,
    rotation: Quat,
    translation: Vec3,
}

impl Keyframe {
    pub fn new(time: f64, rotation: Quat, translation: Vec3) -> Self {
        Self {
            time,
            rotation,
            translation,
        }
    }

    /// Build a keyframe from an authored transform.
    ///
    /// The basis vectors are normalized before the quaternion is extracted,
    /// so scale and floating drift in the source matrix are discarded.
    pub fn from_transform(time: f64, transform: Mat4) -> Self {
        let (rotation, translation) = transform.to_rotation_translation();
        Self {
            time,
            rotation,
            translation,
        }
    }

    /// Keyframe time in seconds from the start of the clip
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    /// Rotation followed by translation, as a bone-local matrix
    pub fn transform(&self) -> Mat4 {
        compose_transform(self.rotation, self.translation)
    }
}
