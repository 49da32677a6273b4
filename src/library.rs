use crate::clip::AnimationClip;
use crate::error::Result;
use std::sync::Arc;

/// Named collection of loaded clips.
///
/// Clips are shared: a player holds an `Arc` to the clip it plays, so the
/// library can be modified while players keep running.
#[derive(Debug, Clone, Default)]
pub struct ClipLibrary {
    // Insertion order, names unique
    clips: Vec<Arc<AnimationClip>>,
}

impl ClipLibrary {
    /// Create empty clip library
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clip, replacing any clip with the same name.
    /// Returns the shared handle now stored in the library.
    pub fn add(&mut self, clip: AnimationClip) -> Arc<AnimationClip> {
        let clip = Arc::new(clip);

        match self.get_index(clip.name()) {
            Some(index) => {
                log::warn!("Replacing clip '{}'", clip.name());
                self.clips[index] = Arc::clone(&clip);
            }
            None => {
                log::info!(
                    "Added clip '{}' ({:.2}s, {} tracks)",
                    clip.name(),
                    clip.duration(),
                    clip.track_count()
                );
                self.clips.push(Arc::clone(&clip));
            }
        }

        clip
    }

    /// Parse a clip document and add it
    pub fn add_json(&mut self, json: &str) -> Result<Arc<AnimationClip>> {
        let clip = AnimationClip::from_json(json)?;
        Ok(self.add(clip))
    }

    /// Get a clip by name
    pub fn get(&self, name: &str) -> Option<&Arc<AnimationClip>> {
        self.clips.iter().find(|c| c.name() == name)
    }

    pub fn get_index(&self, name: &str) -> Option<usize> {
        self.clips.iter().position(|c| c.name() == name)
    }

    /// Check if a clip exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<AnimationClip>> {
        let index = self.get_index(name)?;
        Some(self.clips.remove(index))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<AnimationClip>> {
        self.clips.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clips.iter().map(|c| c.name())
    }
}
