use super::keyframe::Keyframe;

/// The keyframes for one named bone within a clip.
///
/// Keyframes are sorted by non-decreasing time. The loader enforces this;
/// playback relies on it and never re-sorts. A track may be empty, in which
/// case it never contributes a pose.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedBoneTrack {
    bone_name: String,
    keyframes: Vec<Keyframe>,
}

impl AnimatedBoneTrack {
    pub fn new(bone_name: impl Into<String>, keyframes: Vec<Keyframe>) -> Self {
        Self {
            bone_name: bone_name.into(),
            keyframes,
        }
    }

    /// Name used to associate this track with a skeleton bone
    #[inline]
    pub fn bone_name(&self) -> &str {
        &self.bone_name
    }

    #[inline]
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Time of the first keyframe, if any
    pub fn start_time(&self) -> Option<f64> {
        self.keyframes.first().map(Keyframe::time)
    }

    /// Time of the last keyframe, if any
    pub fn end_time(&self) -> Option<f64> {
        self.keyframes.last().map(Keyframe::time)
    }
}
