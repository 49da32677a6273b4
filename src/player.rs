use crate::binding::{BoneAnimationBinding, SeekStrategy};
use crate::clip::AnimationClip;
use crate::skeleton::SkeletonHierarchy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Player configuration, loadable from JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Initial value of the looping flag
    pub looping: bool,
    /// How bindings locate keyframes
    pub seek: SeekStrategy,
}

impl PlaybackSettings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn looping(self, looping: bool) -> Self {
        Self { looping, ..self }
    }

    pub fn seek(self, seek: SeekStrategy) -> Self {
        Self { seek, ..self }
    }
}

/// What happens when playback reaches the end of the clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    /// Clamp at the duration and hold the final pose
    Once,
    /// Wrap back to zero at or after the duration
    Looping,
}

/// Snapshot of a player for hosts and diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackStatus {
    pub clip: String,
    pub position: f32,
    pub duration: f32,
    pub mode: PlaybackMode,
    pub finished: bool,
}

/// Plays one clip against one skeleton.
///
/// The player owns a binding per clip track and its own playback position.
/// It never owns the skeleton: every call that moves the position takes the
/// skeleton it writes local transforms into, and only touches the bones its
/// tracks are bound to.
#[derive(Debug, Clone)]
pub struct AnimationPlayer {
    clip: Arc<AnimationClip>,
    bindings: Vec<BoneAnimationBinding>,
    position: f32,
    looping: bool,
}

impl AnimationPlayer {
    /// Bind `clip` to `skeleton` with default settings and apply the pose at t=0
    pub fn new(clip: Arc<AnimationClip>, skeleton: &mut SkeletonHierarchy) -> Self {
        Self::with_settings(clip, skeleton, PlaybackSettings::default())
    }

    pub fn with_settings(
        clip: Arc<AnimationClip>,
        skeleton: &mut SkeletonHierarchy,
        settings: PlaybackSettings,
    ) -> Self {
        let bindings: Vec<_> = clip
            .tracks()
            .iter()
            .enumerate()
            .map(|(index, track)| {
                BoneAnimationBinding::bind(index, track, skeleton, settings.seek)
            })
            .collect();

        let bound = bindings.iter().filter(|b| b.is_bound()).count();
        log::info!(
            "Playing clip '{}': {}/{} tracks bound",
            clip.name(),
            bound,
            bindings.len()
        );

        let mut player = Self {
            clip,
            bindings,
            position: 0.0,
            looping: settings.looping,
        };
        player.rewind(skeleton);
        player
    }

    #[inline]
    pub fn clip(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    #[inline]
    pub fn bindings(&self) -> &[BoneAnimationBinding] {
        &self.bindings
    }

    /// Number of tracks that drive a bone of the skeleton
    pub fn bound_count(&self) -> usize {
        self.bindings.iter().filter(|b| b.is_bound()).count()
    }

    /// Current position in seconds
    #[inline]
    pub fn position(&self) -> f32 {
        self.position
    }

    #[inline]
    pub fn duration(&self) -> f32 {
        self.clip.duration() as f32
    }

    #[inline]
    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Switch between looping and play-once. Position is kept.
    #[inline]
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn mode(&self) -> PlaybackMode {
        if self.looping {
            PlaybackMode::Looping
        } else {
            PlaybackMode::Once
        }
    }

    /// True once a play-once clip is holding its final pose
    pub fn is_finished(&self) -> bool {
        !self.looping && self.position >= self.duration()
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            clip: self.clip.name().to_string(),
            position: self.position,
            duration: self.duration(),
            mode: self.mode(),
            finished: self.is_finished(),
        }
    }

    /// Advance playback by one tick and pose the bound bones.
    ///
    /// Looping playback wraps to zero at or after the duration; play-once
    /// playback clamps to the duration and holds the final pose.
    pub fn advance(&mut self, delta_seconds: f32, skeleton: &mut SkeletonHierarchy) {
        let delta_seconds = if delta_seconds.is_finite() {
            delta_seconds
        } else {
            log::debug!("Ignoring non-finite time step {delta_seconds}");
            0.0
        };

        let duration = self.duration();
        let mut position = self.position + delta_seconds;
        if self.looping && position >= duration {
            position = 0.0;
        }

        self.position = position.clamp(0.0, duration.max(0.0));
        self.apply(skeleton);
    }

    /// Go back to t=0 and pose the bound bones immediately
    pub fn rewind(&mut self, skeleton: &mut SkeletonHierarchy) {
        self.seek(0.0, skeleton);
    }

    /// Jump to `position` seconds, clamped to [0, duration], and pose the bound bones.
    /// Seeking never wraps, even when looping.
    pub fn seek(&mut self, position: f32, skeleton: &mut SkeletonHierarchy) {
        let position = if position.is_nan() { 0.0 } else { position };
        self.position = position.clamp(0.0, self.duration().max(0.0));
        self.apply(skeleton);
    }

    fn apply(&mut self, skeleton: &mut SkeletonHierarchy) {
        let tracks = self.clip.tracks();
        let position = f64::from(self.position);

        for binding in &mut self.bindings {
            if let Some(track) = tracks.get(binding.track_index()) {
                binding.set_position(track, position, skeleton);
            }
        }
    }
}
