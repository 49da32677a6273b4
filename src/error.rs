//! Errors raised at the loading boundary.
//!
//! Playback itself never fails: unmatched bones, empty tracks and
//! out-of-range positions all degrade to "no visible pose change".

use thiserror::Error;

/// Rejections produced while turning interchange data into clips, skeletons and models
#[derive(Error, Debug)]
pub enum LoadError {
    /// Malformed JSON document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Clip duration is negative or not a number
    #[error("Clip '{clip}' has invalid duration {duration}")]
    NegativeDuration { clip: String, duration: f64 },

    /// Keyframe times within a track go backwards
    #[error("Clip '{clip}', bone '{bone}': keyframe {index} is earlier than the keyframe before it")]
    UnsortedKeyframes {
        clip: String,
        bone: String,
        index: usize,
    },

    /// Keyframe placed before the start of the clip
    #[error("Clip '{clip}', bone '{bone}': keyframe {index} has a negative time")]
    NegativeKeyframeTime {
        clip: String,
        bone: String,
        index: usize,
    },

    /// Bone array is not ordered parents-before-children
    #[error("Bone '{bone}' at index {index} references parent {parent}, which does not precede it")]
    ParentOrder {
        bone: String,
        index: usize,
        parent: usize,
    },

    /// Render skeleton slot points outside the bone array
    #[error("Render skeleton slot {slot} references bone {index}, but the skeleton has {bone_count} bones")]
    RenderSlotOutOfRange {
        slot: usize,
        index: usize,
        bone_count: usize,
    },

    /// Mesh part attached to a bone that does not exist
    #[error("Mesh part '{part}' is attached to bone {bone}, but the skeleton has {bone_count} bones")]
    MeshPartOutOfRange {
        part: String,
        bone: usize,
        bone_count: usize,
    },

    /// Requested clip is not in the library
    #[error("Unknown clip: {0}")]
    UnknownClip(String),
}

/// Result type using LoadError
pub type Result<T> = std::result::Result<T, LoadError>;
