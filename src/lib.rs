//! Skinned Playback - CPU skeletal animation engine
//!
//! Plays keyframed bone clips against a bone hierarchy and produces the
//! per-bone skin matrices a renderer binds for skinned meshes.
//!
//! A frame runs in two phases:
//! 1. `AnimatedModel::update` (or `AnimationPlayer::advance`) writes local bone transforms
//! 2. `AnimatedModel::pose` (or `SkeletonHierarchy::compute_absolute_transforms`) composes
//!    them into absolute transforms and skin matrices

pub mod binding;
pub mod clip;
pub mod error;
pub mod library;
pub mod math;
pub mod model;
pub mod player;
pub mod skeleton;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

/// Tolerance for floating point comparisons on transforms
pub const EPSILON: f32 = 1e-5;

pub use binding::{BoneAnimationBinding, BoneTarget, SeekStrategy};
pub use clip::{AnimatedBoneTrack, AnimationClip, Keyframe};
pub use error::{LoadError, Result};
pub use glam::{Mat4, Quat, Vec3};
pub use library::ClipLibrary;
pub use math::Mat4Ext;
pub use model::{AnimatedModel, FramePose, MeshPart};
pub use player::{AnimationPlayer, PlaybackMode, PlaybackSettings, PlaybackStatus};
pub use skeleton::{
    BoneDescriptor, BoneIndex, RenderSkeleton, SkeletonBone, SkeletonHierarchy, SkeletonJson,
};
