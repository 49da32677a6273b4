use super::keyframe::Keyframe;
use super::track::AnimatedBoneTrack;
use super::AnimationClip;
use crate::error::{LoadError, Result};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

// ============================================================================
// Clip interchange format
// ============================================================================

/// JSON format for a single keyframe
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeyframeJson {
    pub time: f64,
    /// Quaternion as [x, y, z, w]
    pub rotation: [f32; 4],
    #[serde(default)]
    pub translation: [f32; 3],
}

/// JSON format for one bone's keyframes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BoneTrackJson {
    pub name: String,
    #[serde(default)]
    pub keyframes: Vec<KeyframeJson>,
}

/// JSON format for an animation clip
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnimationClipJson {
    #[serde(
        rename = "$schema",
        default,
        skip_deserializing,
        skip_serializing_if = "Option::is_none"
    )]
    pub schema: Option<String>,
    #[serde(default = "default_version")]
    pub version: u32,
    pub name: String,
    pub duration: f64,
    #[serde(default)]
    pub bones: Vec<BoneTrackJson>,
}

fn default_version() -> u32 {
    1
}

/// Authored quaternions are not always unit length; a zero quaternion means "no rotation"
fn normalized_rotation(xyzw: [f32; 4]) -> Quat {
    let q = Quat::from_array(xyzw);
    if q.length_squared() > f32::EPSILON {
        q.normalize()
    } else {
        Quat::IDENTITY
    }
}

impl AnimationClipJson {
    /// Validate and convert into a runtime clip.
    ///
    /// Rejects negative or NaN durations, negative keyframe times and tracks
    /// whose keyframes are not sorted by time. Rotations are normalized.
    pub fn into_clip(self) -> Result<AnimationClip> {
        if self.duration.is_nan() || self.duration < 0.0 {
            return Err(LoadError::NegativeDuration {
                clip: self.name,
                duration: self.duration,
            });
        }

        let mut tracks = Vec::with_capacity(self.bones.len());
        for bone in self.bones {
            let mut keyframes = Vec::with_capacity(bone.keyframes.len());
            let mut previous_time = 0.0;

            for (index, kf) in bone.keyframes.iter().enumerate() {
                if kf.time.is_nan() || kf.time < 0.0 {
                    return Err(LoadError::NegativeKeyframeTime {
                        clip: self.name,
                        bone: bone.name,
                        index,
                    });
                }
                if kf.time < previous_time {
                    return Err(LoadError::UnsortedKeyframes {
                        clip: self.name,
                        bone: bone.name,
                        index,
                    });
                }
                previous_time = kf.time;

                keyframes.push(Keyframe::new(
                    kf.time,
                    normalized_rotation(kf.rotation),
                    Vec3::from_array(kf.translation),
                ));
            }

            tracks.push(AnimatedBoneTrack::new(bone.name, keyframes));
        }

        Ok(AnimationClip::new(self.name, self.duration, tracks))
    }

    /// Create from a runtime clip
    pub fn from_clip(clip: &AnimationClip) -> Self {
        let bones = clip
            .tracks()
            .iter()
            .map(|track| BoneTrackJson {
                name: track.bone_name().to_string(),
                keyframes: track
                    .keyframes()
                    .iter()
                    .map(|kf| KeyframeJson {
                        time: kf.time(),
                        rotation: kf.rotation().to_array(),
                        translation: kf.translation().to_array(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            schema: None,
            version: default_version(),
            name: clip.name().to_string(),
            duration: clip.duration(),
            bones,
        }
    }
}

impl AnimationClip {
    /// Parse and validate a clip from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let clip_json: AnimationClipJson = serde_json::from_str(json)?;
        clip_json.into_clip()
    }

    /// Convert to a pretty-printed JSON string
    pub fn to_json_string(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&AnimationClipJson::from_clip(self))
    }
}
