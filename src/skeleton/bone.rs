use glam::Mat4;
use serde::{Deserialize, Serialize};

/// Index of a bone in its skeleton's bone array.
///
/// Bones are stored in topological order (parents before children), so a
/// parent's index is always smaller than any of its children's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoneIndex(usize);

impl BoneIndex {
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Convert to array index
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for BoneIndex {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// A node in the runtime bone hierarchy.
///
/// The parent link is an index back into the owning skeleton's array, never
/// an owning pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonBone {
    name: String,
    parent: Option<BoneIndex>,
    /// Rest transform relative to the parent
    bind_local_transform: Mat4,
    /// Current transform relative to the parent, written by animation
    animated_local_transform: Mat4,
    /// Transform relative to the model, derived each frame
    absolute_transform: Mat4,
    /// Maps a bind-pose vertex into this bone's space
    skin_transform: Mat4,
}

impl SkeletonBone {
    pub(crate) fn new(
        name: String,
        parent: Option<BoneIndex>,
        bind_local_transform: Mat4,
        absolute_transform: Mat4,
        skin_transform: Mat4,
    ) -> Self {
        Self {
            name,
            parent,
            bind_local_transform,
            animated_local_transform: bind_local_transform,
            absolute_transform,
            skin_transform,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent bone (None for a root)
    #[inline]
    pub fn parent(&self) -> Option<BoneIndex> {
        self.parent
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[inline]
    pub fn bind_local_transform(&self) -> Mat4 {
        self.bind_local_transform
    }

    #[inline]
    pub fn animated_local_transform(&self) -> Mat4 {
        self.animated_local_transform
    }

    /// Overwrite the local transform. Takes effect at the next
    /// `compute_absolute_transforms`.
    #[inline]
    pub fn set_animated_local_transform(&mut self, transform: Mat4) {
        self.animated_local_transform = transform;
    }

    /// Absolute transform as of the last `compute_absolute_transforms`
    #[inline]
    pub fn absolute_transform(&self) -> Mat4 {
        self.absolute_transform
    }

    #[inline]
    pub fn skin_transform(&self) -> Mat4 {
        self.skin_transform
    }

    /// Matrix handed to the renderer for vertices skinned to this bone
    #[inline]
    pub fn skin_matrix(&self) -> Mat4 {
        self.absolute_transform * self.skin_transform
    }

    #[inline]
    pub(crate) fn set_absolute_transform(&mut self, transform: Mat4) {
        self.absolute_transform = transform;
    }
}
