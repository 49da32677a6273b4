//! Runtime bone hierarchy.
//!
//! Bones live in a flat array in topological order (roots first, every
//! parent before its children). That order is what lets absolute transforms
//! be computed in a single forward pass.

pub mod bone;
pub mod descriptor;

pub use bone::*;
pub use descriptor::*;

use crate::error::{LoadError, Result};
use glam::Mat4;

/// Owns every bone of one model instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkeletonHierarchy {
    bones: Vec<SkeletonBone>,
}

impl SkeletonHierarchy {
    /// Build the hierarchy from loader descriptors.
    ///
    /// Fails if any bone references a parent that does not precede it. Each
    /// bone's skin transform is its explicit inverse bind matrix, or the
    /// inverse of its bind-pose absolute transform.
    pub fn from_descriptors(descriptors: Vec<BoneDescriptor>) -> Result<Self> {
        let mut bones: Vec<SkeletonBone> = Vec::with_capacity(descriptors.len());

        for (index, desc) in descriptors.into_iter().enumerate() {
            let parent_absolute = match desc.parent {
                Some(parent) if parent < index => bones[parent].absolute_transform(),
                Some(parent) => {
                    return Err(LoadError::ParentOrder {
                        bone: desc.name,
                        index,
                        parent,
                    });
                }
                None => Mat4::IDENTITY,
            };

            let bind_absolute = parent_absolute * desc.transform;
            let skin_transform = match desc.inverse_bind {
                Some(inverse_bind) => inverse_bind,
                None => inverse_bind_pose(&desc.name, bind_absolute),
            };

            bones.push(SkeletonBone::new(
                desc.name,
                desc.parent.map(BoneIndex::new),
                desc.transform,
                bind_absolute,
                skin_transform,
            ));
        }

        Ok(Self { bones })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    #[inline]
    pub fn bones(&self) -> &[SkeletonBone] {
        &self.bones
    }

    #[inline]
    pub fn bone(&self, index: BoneIndex) -> Option<&SkeletonBone> {
        self.bones.get(index.index())
    }

    #[inline]
    pub fn bone_mut(&mut self, index: BoneIndex) -> Option<&mut SkeletonBone> {
        self.bones.get_mut(index.index())
    }

    /// First bone with exactly this name (case-sensitive)
    pub fn find_bone_by_name(&self, name: &str) -> Option<&SkeletonBone> {
        self.bones.iter().find(|b| b.name() == name)
    }

    /// Index of the first bone with exactly this name (case-sensitive)
    pub fn find_bone_index(&self, name: &str) -> Option<BoneIndex> {
        self.bones
            .iter()
            .position(|b| b.name() == name)
            .map(BoneIndex::new)
    }

    pub fn parent_of(&self, index: BoneIndex) -> Option<BoneIndex> {
        self.bone(index).and_then(SkeletonBone::parent)
    }

    /// Direct children of a bone, in array order
    pub fn children_of(&self, index: BoneIndex) -> impl Iterator<Item = BoneIndex> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(move |(_, b)| b.parent() == Some(index))
            .map(|(i, _)| BoneIndex::new(i))
    }

    /// Put every bone back to its bind-pose local transform
    pub fn reset_to_bind_pose(&mut self) {
        for bone in &mut self.bones {
            bone.set_animated_local_transform(bone.bind_local_transform());
        }
    }

    /// Recompute absolute transforms from the current local transforms.
    ///
    /// Call once per frame, after every player has advanced and before the
    /// skin palette is read.
    pub fn compute_absolute_transforms(&mut self) {
        for i in 0..self.bones.len() {
            let local = self.bones[i].animated_local_transform();
            let absolute = match self.bones[i].parent() {
                Some(parent) => self.bones[parent.index()].absolute_transform() * local,
                None => local,
            };
            self.bones[i].set_absolute_transform(absolute);
        }
    }

    /// Validate a render-skin slot list against this skeleton
    pub fn render_skeleton(&self, slots: &[usize]) -> Result<RenderSkeleton> {
        RenderSkeleton::validated(slots, self.bones.len())
    }

    /// One skin matrix per render slot, from the current absolute transforms
    pub fn skin_palette(&self, render_skeleton: &RenderSkeleton) -> Vec<Mat4> {
        let mut palette = vec![Mat4::IDENTITY; render_skeleton.len()];
        self.write_skin_palette(render_skeleton, &mut palette);
        palette
    }

    /// Fill `out` with skin matrices; slots beyond `out.len()` are skipped
    pub fn write_skin_palette(&self, render_skeleton: &RenderSkeleton, out: &mut [Mat4]) {
        for (dst, slot) in out.iter_mut().zip(render_skeleton.slots()) {
            *dst = self
                .bone(*slot)
                .map_or(Mat4::IDENTITY, SkeletonBone::skin_matrix);
        }
    }
}

impl SkeletonJson {
    /// Validate and build the hierarchy and its render skeleton
    pub fn into_parts(self) -> Result<(SkeletonHierarchy, RenderSkeleton)> {
        let descriptors = self.bones.into_iter().map(BoneDescriptor::from).collect();
        let skeleton = SkeletonHierarchy::from_descriptors(descriptors)?;
        let render_skeleton = skeleton.render_skeleton(&self.skeleton)?;
        Ok((skeleton, render_skeleton))
    }

    /// Export a hierarchy in its bind pose. Skin transforms are written as
    /// explicit inverse bind matrices so they survive a reload unchanged.
    pub fn from_parts(skeleton: &SkeletonHierarchy, render_skeleton: &RenderSkeleton) -> Self {
        let bones = skeleton
            .bones()
            .iter()
            .map(|bone| BoneJson {
                name: bone.name().to_string(),
                parent: bone.parent().map(BoneIndex::index),
                transform: bone.bind_local_transform().to_cols_array(),
                inverse_bind: Some(bone.skin_transform().to_cols_array()),
            })
            .collect();

        Self {
            bones,
            skeleton: render_skeleton.slots().iter().map(|s| s.index()).collect(),
        }
    }
}

impl SkeletonHierarchy {
    /// Parse and validate a skeleton document, returning the hierarchy and its render skeleton
    pub fn from_json(json: &str) -> Result<(Self, RenderSkeleton)> {
        let doc: SkeletonJson = serde_json::from_str(json)?;
        doc.into_parts()
    }

    /// Convert to a pretty-printed JSON string
    pub fn to_json_string(
        &self,
        render_skeleton: &RenderSkeleton,
    ) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&SkeletonJson::from_parts(self, render_skeleton))
    }
}

/// Inverse of a bind-pose absolute transform. A singular bind pose (a bone
/// collapsed to zero scale) has no inverse and skins with identity instead.
fn inverse_bind_pose(name: &str, bind_absolute: Mat4) -> Mat4 {
    let inverse = bind_absolute.inverse();
    if bind_absolute.determinant() != 0.0 && inverse.is_finite() {
        inverse
    } else {
        log::warn!("Bone '{name}' has a singular bind pose, using identity skin transform");
        Mat4::IDENTITY
    }
}
