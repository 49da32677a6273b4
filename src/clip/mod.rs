pub mod json;
pub mod keyframe;
pub mod track;

pub use json::*;
pub use keyframe::*;
pub use track::*;

/// A named, fixed-duration set of per-bone keyframe tracks.
///
/// Clips are immutable after load and are shared read-only (usually behind
/// an `Arc`) by every player that plays them.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    name: String,
    duration: f64,
    tracks: Vec<AnimatedBoneTrack>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, duration: f64, tracks: Vec<AnimatedBoneTrack>) -> Self {
        Self {
            name: name.into(),
            duration,
            tracks,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Clip length in seconds
    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[inline]
    pub fn tracks(&self) -> &[AnimatedBoneTrack] {
        &self.tracks
    }

    #[inline]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// First track animating the named bone
    pub fn track(&self, bone_name: &str) -> Option<&AnimatedBoneTrack> {
        self.tracks.iter().find(|t| t.bone_name() == bone_name)
    }
}
