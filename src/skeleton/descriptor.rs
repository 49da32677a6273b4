use super::bone::BoneIndex;
use crate::error::{LoadError, Result};
use glam::Mat4;
use serde::{Deserialize, Serialize};

/// Load-time description of one bone, as handed over by the asset loader
#[derive(Debug, Clone, PartialEq)]
pub struct BoneDescriptor {
    pub name: String,
    /// Index of the parent in the same descriptor list; must precede this bone
    pub parent: Option<usize>,
    /// Bind-pose transform relative to the parent
    pub transform: Mat4,
    /// Explicit inverse bind matrix. When absent it is derived from the bind pose.
    pub inverse_bind: Option<Mat4>,
}

impl BoneDescriptor {
    pub fn new(name: impl Into<String>, parent: Option<usize>, transform: Mat4) -> Self {
        Self {
            name: name.into(),
            parent,
            transform,
            inverse_bind: None,
        }
    }

    pub fn with_inverse_bind(mut self, inverse_bind: Mat4) -> Self {
        self.inverse_bind = Some(inverse_bind);
        self
    }
}

/// JSON format for a bone. Matrices are 16 floats, column-major.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BoneJson {
    pub name: String,
    #[serde(default)]
    pub parent: Option<usize>,
    #[serde(default = "identity_cols")]
    pub transform: [f32; 16],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse_bind: Option<[f32; 16]>,
}

fn identity_cols() -> [f32; 16] {
    Mat4::IDENTITY.to_cols_array()
}

impl From<BoneJson> for BoneDescriptor {
    fn from(json: BoneJson) -> Self {
        Self {
            name: json.name,
            parent: json.parent,
            transform: Mat4::from_cols_array(&json.transform),
            inverse_bind: json.inverse_bind.as_ref().map(Mat4::from_cols_array),
        }
    }
}

impl From<&BoneDescriptor> for BoneJson {
    fn from(desc: &BoneDescriptor) -> Self {
        Self {
            name: desc.name.clone(),
            parent: desc.parent,
            transform: desc.transform.to_cols_array(),
            inverse_bind: desc.inverse_bind.map(|m| m.to_cols_array()),
        }
    }
}

/// JSON format for a skeleton: bones in parent-before-child order plus the
/// render skin slots
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SkeletonJson {
    pub bones: Vec<BoneJson>,
    /// Render skin slots, each an index into `bones`
    #[serde(default)]
    pub skeleton: Vec<usize>,
}

/// Ordered map from render-skin slot to skeleton bone.
///
/// Slot `s` of the skin palette is produced from bone `slots[s]`. Built
/// through `SkeletonHierarchy::render_skeleton`, which checks every index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSkeleton {
    slots: Vec<BoneIndex>,
}

impl RenderSkeleton {
    pub(crate) fn validated(slots: &[usize], bone_count: usize) -> Result<Self> {
        let slots = slots
            .iter()
            .enumerate()
            .map(|(slot, &index)| {
                if index < bone_count {
                    Ok(BoneIndex::new(index))
                } else {
                    Err(LoadError::RenderSlotOutOfRange {
                        slot,
                        index,
                        bone_count,
                    })
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { slots })
    }

    #[inline]
    pub fn slots(&self) -> &[BoneIndex] {
        &self.slots
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
