//! A skeleton plus the clips and mesh attachments loaded with it.
//!
//! `AnimatedModel` splits a frame into two calls:
//! 1. `update` advances the active player, writing local bone transforms
//! 2. `pose` composes absolute transforms and produces the matrices to draw with
//!
//! Keeping them separate means several players can write into the same
//! skeleton before anything reads absolute transforms.

use crate::clip::{AnimationClip, AnimationClipJson};
use crate::error::{LoadError, Result};
use crate::library::ClipLibrary;
use crate::player::{AnimationPlayer, PlaybackSettings};
use crate::skeleton::{BoneIndex, RenderSkeleton, SkeletonHierarchy, SkeletonJson};
use glam::Mat4;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;
use std::sync::Arc;

// Skin palettes are uploaded as tightly packed column-major f32x16
const_assert_eq!(std::mem::size_of::<Mat4>(), 16 * std::mem::size_of::<f32>());

/// A piece of mesh rigidly attached to one bone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshPart {
    pub name: String,
    /// Bone whose absolute transform places this part
    pub bone: BoneIndex,
}

/// JSON format for a model document
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelJson {
    #[serde(rename = "$schema", skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default = "default_version")]
    pub version: u32,
    /// `bones` and `skeleton` (render slots) at the top level of the document
    #[serde(flatten)]
    pub skeleton: SkeletonJson,
    #[serde(default)]
    pub mesh_parts: Vec<MeshPart>,
    #[serde(default)]
    pub clips: Vec<AnimationClipJson>,
    #[serde(default)]
    pub settings: PlaybackSettings,
}

fn default_version() -> u32 {
    1
}

/// Matrices produced by one call to `AnimatedModel::pose`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FramePose {
    /// One skin matrix per render slot
    pub skin: Vec<Mat4>,
    /// World matrix per mesh part
    pub mesh_world: Vec<Mat4>,
}

impl FramePose {
    /// Skin palette as flat column-major floats, ready for a uniform/storage buffer
    pub fn skin_as_f32(&self) -> &[f32] {
        bytemuck::cast_slice(&self.skin)
    }

    pub fn mesh_world_as_f32(&self) -> &[f32] {
        bytemuck::cast_slice(&self.mesh_world)
    }
}

#[derive(Debug, Clone)]
pub struct AnimatedModel {
    skeleton: SkeletonHierarchy,
    render_skeleton: RenderSkeleton,
    mesh_parts: Vec<MeshPart>,
    clips: ClipLibrary,
    player: Option<AnimationPlayer>,
    settings: PlaybackSettings,
}

impl AnimatedModel {
    /// Assemble a model, checking render slots and mesh attachments against the skeleton
    pub fn new(
        skeleton: SkeletonHierarchy,
        render_slots: &[usize],
        mesh_parts: Vec<MeshPart>,
    ) -> Result<Self> {
        let render_skeleton = skeleton.render_skeleton(render_slots)?;
        Self::from_parts(skeleton, render_skeleton, mesh_parts)
    }

    fn from_parts(
        skeleton: SkeletonHierarchy,
        render_skeleton: RenderSkeleton,
        mesh_parts: Vec<MeshPart>,
    ) -> Result<Self> {
        if let Some(part) = mesh_parts
            .iter()
            .find(|p| p.bone.index() >= skeleton.len())
        {
            return Err(LoadError::MeshPartOutOfRange {
                part: part.name.clone(),
                bone: part.bone.index(),
                bone_count: skeleton.len(),
            });
        }

        Ok(Self {
            skeleton,
            render_skeleton,
            mesh_parts,
            clips: ClipLibrary::new(),
            player: None,
            settings: PlaybackSettings::default(),
        })
    }

    /// Load a model document: bones, render slots, mesh parts and embedded clips
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: ModelJson = serde_json::from_str(json)?;

        let (skeleton, render_skeleton) = doc.skeleton.into_parts()?;

        let mut model = Self::from_parts(skeleton, render_skeleton, doc.mesh_parts)?;
        model.settings = doc.settings;
        for clip in doc.clips {
            model.clips.add(clip.into_clip()?);
        }

        log::info!(
            "Loaded model: {} bones, {} skin slots, {} mesh parts, {} clips",
            model.skeleton.len(),
            model.render_skeleton.len(),
            model.mesh_parts.len(),
            model.clips.len()
        );

        Ok(model)
    }

    #[inline]
    pub fn skeleton(&self) -> &SkeletonHierarchy {
        &self.skeleton
    }

    /// Direct access for hand-posing bones between `update` and `pose`
    #[inline]
    pub fn skeleton_mut(&mut self) -> &mut SkeletonHierarchy {
        &mut self.skeleton
    }

    #[inline]
    pub fn render_skeleton(&self) -> &RenderSkeleton {
        &self.render_skeleton
    }

    #[inline]
    pub fn mesh_parts(&self) -> &[MeshPart] {
        &self.mesh_parts
    }

    #[inline]
    pub fn clips(&self) -> &ClipLibrary {
        &self.clips
    }

    #[inline]
    pub fn clips_mut(&mut self) -> &mut ClipLibrary {
        &mut self.clips
    }

    #[inline]
    pub fn settings(&self) -> PlaybackSettings {
        self.settings
    }

    /// Settings used by the next `play_clip`. The active player keeps its own.
    pub fn set_settings(&mut self, settings: PlaybackSettings) {
        self.settings = settings;
    }

    #[inline]
    pub fn player(&self) -> Option<&AnimationPlayer> {
        self.player.as_ref()
    }

    #[inline]
    pub fn player_mut(&mut self) -> Option<&mut AnimationPlayer> {
        self.player.as_mut()
    }

    /// Start playing `clip` from t=0, replacing the active player.
    ///
    /// The skeleton goes back to its bind pose first so bones the new clip
    /// does not animate do not keep the previous clip's pose.
    pub fn play_clip(&mut self, clip: Arc<AnimationClip>) -> &mut AnimationPlayer {
        log::info!(
            "Model starting clip '{}' (looping: {})",
            clip.name(),
            self.settings.looping
        );

        self.skeleton.reset_to_bind_pose();
        let player = AnimationPlayer::with_settings(clip, &mut self.skeleton, self.settings);
        self.player.insert(player)
    }

    /// Play a clip from this model's library
    pub fn play_named(&mut self, name: &str) -> Result<&mut AnimationPlayer> {
        let clip = match self.clips.get(name) {
            Some(clip) => Arc::clone(clip),
            None => {
                log::warn!("No clip named '{name}' in model");
                return Err(LoadError::UnknownClip(name.to_string()));
            }
        };
        Ok(self.play_clip(clip))
    }

    /// Drop the active player, leaving the skeleton in its current pose
    pub fn stop(&mut self) -> Option<AnimationPlayer> {
        self.player.take()
    }

    /// Phase one: advance the active player by `delta_seconds`
    pub fn update(&mut self, delta_seconds: f32) {
        if let Some(player) = self.player.as_mut() {
            player.advance(delta_seconds, &mut self.skeleton);
        }
    }

    pub fn rewind(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.rewind(&mut self.skeleton);
        }
    }

    pub fn seek(&mut self, position: f32) {
        if let Some(player) = self.player.as_mut() {
            player.seek(position, &mut self.skeleton);
        }
    }

    /// Phase two: compose absolute transforms and produce the frame's matrices
    pub fn pose(&mut self, world: Mat4) -> FramePose {
        let mut pose = FramePose::default();
        self.write_pose(world, &mut pose);
        pose
    }

    /// Same as `pose`, reusing the buffers in `out`
    pub fn write_pose(&mut self, world: Mat4, out: &mut FramePose) {
        self.skeleton.compute_absolute_transforms();

        out.skin.resize(self.render_skeleton.len(), Mat4::IDENTITY);
        self.skeleton
            .write_skin_palette(&self.render_skeleton, &mut out.skin);

        out.mesh_world.clear();
        out.mesh_world.extend(self.mesh_parts.iter().map(|part| {
            self.skeleton
                .bone(part.bone)
                .map_or(world, |bone| world * bone.absolute_transform())
        }));
    }
}
