//! Per-track playback cursor.
//!
//! A `BoneAnimationBinding` connects one track of a clip to one bone of a
//! skeleton. It keeps the bracketing keyframe pair for the current position,
//! interpolates between them, and writes the result into the bound bone.

use crate::clip::{AnimatedBoneTrack, Keyframe};
use crate::math::compose_transform;
use crate::skeleton::{BoneIndex, SkeletonHierarchy};
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Skeleton bone a track drives, resolved once at bind time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoneTarget {
    Bound(BoneIndex),
    /// The skeleton has no bone with the track's name. The track is still
    /// sampled but never changes a pose.
    Unbound,
}

/// How the cursor finds the bracket for a new position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekStrategy {
    /// Step from the previous bracket one keyframe at a time.
    /// Cost is the distance moved, which is tiny for per-frame ticking.
    #[default]
    Incremental,
    /// Binary search over keyframe times on every call.
    /// Cost is O(log n) regardless of how far the position jumped.
    Binary,
}

#[derive(Debug, Clone)]
pub struct BoneAnimationBinding {
    track_index: usize,
    target: BoneTarget,
    strategy: SeekStrategy,
    /// Position satisfies keyframes[current].time <= position < keyframes[current + 1].time,
    /// except at the ends of the track
    current_keyframe: usize,
    /// Indices of the bracketing keyframes; equal for a single-keyframe track
    bracket: Option<(usize, usize)>,
    rotation: Quat,
    translation: Vec3,
    /// False until a pose has been sampled. Never true for an empty track.
    valid: bool,
}

impl BoneAnimationBinding {
    /// Create a binding for `track` (the clip's track number `track_index`) with an explicit target
    pub fn new(
        track_index: usize,
        track: &AnimatedBoneTrack,
        target: BoneTarget,
        strategy: SeekStrategy,
    ) -> Self {
        Self {
            track_index,
            target,
            strategy,
            current_keyframe: 0,
            bracket: bracket_at(0, track.len()),
            rotation: Quat::IDENTITY,
            translation: Vec3::ZERO,
            valid: false,
        }
    }

    /// Create a binding, resolving the target by exact bone name
    pub fn bind(
        track_index: usize,
        track: &AnimatedBoneTrack,
        skeleton: &SkeletonHierarchy,
        strategy: SeekStrategy,
    ) -> Self {
        let target = match skeleton.find_bone_index(track.bone_name()) {
            Some(index) => BoneTarget::Bound(index),
            None => {
                log::debug!(
                    "No bone named '{}' in skeleton, track left unbound",
                    track.bone_name()
                );
                BoneTarget::Unbound
            }
        };

        if track.is_empty() {
            log::debug!("Track '{}' has no keyframes", track.bone_name());
        }

        Self::new(track_index, track, target, strategy)
    }

    /// Index of the driven track within its clip
    #[inline]
    pub fn track_index(&self) -> usize {
        self.track_index
    }

    #[inline]
    pub fn target(&self) -> BoneTarget {
        self.target
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        matches!(self.target, BoneTarget::Bound(_))
    }

    #[inline]
    pub fn strategy(&self) -> SeekStrategy {
        self.strategy
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    #[inline]
    pub fn current_keyframe(&self) -> usize {
        self.current_keyframe
    }

    /// Indices of the current bracketing keyframes
    #[inline]
    pub fn bracket_indices(&self) -> Option<(usize, usize)> {
        self.bracket
    }

    /// The current bracketing keyframes within `track`
    pub fn bracket<'a>(
        &self,
        track: &'a AnimatedBoneTrack,
    ) -> Option<(&'a Keyframe, &'a Keyframe)> {
        let (first, second) = self.bracket?;
        let keyframes = track.keyframes();
        Some((keyframes.get(first)?, keyframes.get(second)?))
    }

    /// Interpolated rotation from the last sample
    #[inline]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Interpolated translation from the last sample
    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    /// Interpolated local transform, once a pose has been sampled
    pub fn local_transform(&self) -> Option<Mat4> {
        self.valid
            .then(|| compose_transform(self.rotation, self.translation))
    }

    /// Move to `position` seconds and push the interpolated pose into the bound bone.
    ///
    /// Empty tracks and unbound targets leave the skeleton untouched.
    pub fn set_position(
        &mut self,
        track: &AnimatedBoneTrack,
        position: f64,
        skeleton: &mut SkeletonHierarchy,
    ) {
        if !self.sample(track, position) {
            return;
        }

        if let BoneTarget::Bound(index) = self.target {
            if let Some(bone) = skeleton.bone_mut(index) {
                bone.set_animated_local_transform(compose_transform(
                    self.rotation,
                    self.translation,
                ));
            }
        }
    }

    /// Update the bracket and interpolated pose without touching any skeleton.
    /// Returns false for an empty track or a NaN position; the previous
    /// bracket and pose are kept.
    pub fn sample(&mut self, track: &AnimatedBoneTrack, position: f64) -> bool {
        let keyframes = track.keyframes();
        if keyframes.is_empty() || position.is_nan() {
            return false;
        }

        self.seek(keyframes, position);

        let (first, second) = match self.bracket {
            Some(bracket) => bracket,
            None => return false,
        };
        let k1 = &keyframes[first];
        let k2 = &keyframes[second];

        if first == second {
            self.rotation = k1.rotation();
            self.translation = k1.translation();
        } else {
            let amount = interpolation_amount(k1.time(), k2.time(), position);
            self.rotation = k1.rotation().slerp(k2.rotation(), amount);
            self.translation = k1.translation().lerp(k2.translation(), amount);
        }

        self.valid = true;
        true
    }

    fn seek(&mut self, keyframes: &[Keyframe], position: f64) {
        // Last index a bracket may start at
        let last_start = keyframes.len().saturating_sub(2);

        match self.strategy {
            SeekStrategy::Incremental => {
                let mut current = self.current_keyframe.min(last_start);

                // Moving backward in time
                while current > 0 && position < keyframes[current].time() {
                    current -= 1;
                }

                // Moving forward in time
                while current < last_start && position >= keyframes[current + 1].time() {
                    current += 1;
                }

                self.current_keyframe = current;
            }
            SeekStrategy::Binary => {
                let next = keyframes.partition_point(|kf| kf.time() <= position);
                self.current_keyframe = next.saturating_sub(1).min(last_start);
            }
        }

        self.bracket = bracket_at(self.current_keyframe, keyframes.len());
    }
}

/// Bracket starting at `current` in a track of `count` keyframes
fn bracket_at(current: usize, count: usize) -> Option<(usize, usize)> {
    match count {
        0 => None,
        1 => Some((0, 0)),
        _ => Some((current, current + 1)),
    }
}

/// Normalized position between two keyframe times, held within [0, 1]
/// so positions outside the keyed range hold the nearest keyframe
fn interpolation_amount(start: f64, end: f64, position: f64) -> f32 {
    let span = end - start;
    if span > 0.0 {
        ((position - start) / span).clamp(0.0, 1.0) as f32
    } else if position >= end {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::BoneDescriptor;
    use crate::EPSILON;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn keyframe(time: f64, translation: Vec3) -> Keyframe {
        Keyframe::new(time, Quat::IDENTITY, translation)
    }

    fn ramp_track(times: &[f64]) -> AnimatedBoneTrack {
        let keyframes = times
            .iter()
            .enumerate()
            .map(|(i, &t)| {
                Keyframe::new(
                    t,
                    Quat::from_rotation_y(i as f32 * 0.3),
                    Vec3::new(i as f32, 0.0, 0.0),
                )
            })
            .collect();
        AnimatedBoneTrack::new("Root", keyframes)
    }

    fn unbound(track: &AnimatedBoneTrack, strategy: SeekStrategy) -> BoneAnimationBinding {
        BoneAnimationBinding::new(0, track, BoneTarget::Unbound, strategy)
    }

    fn single_bone_skeleton(name: &str) -> SkeletonHierarchy {
        SkeletonHierarchy::from_descriptors(vec![BoneDescriptor::new(name, None, Mat4::IDENTITY)])
            .unwrap()
    }

    fn assert_bracket_contains(binding: &BoneAnimationBinding, track: &AnimatedBoneTrack, t: f64) {
        let (k1, k2) = binding.bracket(track).unwrap();
        assert!(k1.time() <= t, "bracket start {} is after {}", k1.time(), t);
        assert!(
            t <= k2.time() || std::ptr::eq(k1, k2),
            "bracket end {} is before {}",
            k2.time(),
            t
        );
    }

    #[test]
    fn test_midpoint_translation() {
        let track = AnimatedBoneTrack::new(
            "Root",
            vec![
                keyframe(0.0, Vec3::ZERO),
                keyframe(1.0, Vec3::new(0.0, 10.0, 0.0)),
            ],
        );
        let mut skeleton = single_bone_skeleton("Root");
        let mut binding =
            BoneAnimationBinding::bind(0, &track, &skeleton, SeekStrategy::Incremental);

        binding.set_position(&track, 0.5, &mut skeleton);

        assert!((binding.translation() - Vec3::new(0.0, 5.0, 0.0)).length() < EPSILON);
        assert!(binding.rotation().angle_between(Quat::IDENTITY) < EPSILON);

        let local = skeleton.bones()[0].animated_local_transform();
        assert!(local.abs_diff_eq(Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0)), EPSILON));
    }

    #[test]
    fn test_slerp_halfway_rotation() {
        let track = AnimatedBoneTrack::new(
            "Root",
            vec![
                Keyframe::new(0.0, Quat::IDENTITY, Vec3::ZERO),
                Keyframe::new(
                    2.0,
                    Quat::from_rotation_x(std::f32::consts::FRAC_PI_2),
                    Vec3::ZERO,
                ),
            ],
        );
        let mut binding = unbound(&track, SeekStrategy::Incremental);

        assert!(binding.sample(&track, 1.0));

        let expected = Quat::from_rotation_x(std::f32::consts::FRAC_PI_4);
        assert!(binding.rotation().angle_between(expected) < 1e-4);
    }

    #[test]
    fn test_slerp_takes_shortest_arc() {
        // Same orientation expressed with opposite signs
        let q = Quat::from_rotation_z(0.2);
        let track = AnimatedBoneTrack::new(
            "Root",
            vec![
                Keyframe::new(0.0, q, Vec3::ZERO),
                Keyframe::new(1.0, -q, Vec3::ZERO),
            ],
        );
        let mut binding = unbound(&track, SeekStrategy::Incremental);

        binding.sample(&track, 0.5);
        assert!(
            binding.rotation().angle_between(q) < 1e-3,
            "should not swing the long way round"
        );
    }

    #[test]
    fn test_exact_keyframe_times_reproduce_keyframes() {
        let track = ramp_track(&[0.0, 0.25, 0.5, 1.0, 1.75]);
        let mut binding = unbound(&track, SeekStrategy::Incremental);

        for kf in track.keyframes() {
            binding.sample(&track, kf.time());
            assert!(
                (binding.translation() - kf.translation()).length() < EPSILON,
                "translation mismatch at t={}",
                kf.time()
            );
            assert!(
                binding.rotation().angle_between(kf.rotation()) < 1e-3,
                "rotation mismatch at t={}",
                kf.time()
            );
        }
    }

    #[test]
    fn test_single_keyframe_holds_pose() {
        let kf = Keyframe::new(0.5, Quat::from_rotation_y(1.0), Vec3::new(1.0, 2.0, 3.0));
        let track = AnimatedBoneTrack::new("Root", vec![kf]);
        let mut binding = unbound(&track, SeekStrategy::Incremental);

        for t in [0.0, 0.5, 3.0] {
            assert!(binding.sample(&track, t));
            assert_eq!(binding.bracket_indices(), Some((0, 0)));
            assert_eq!(binding.rotation(), kf.rotation());
            assert_eq!(binding.translation(), kf.translation());
        }
    }

    #[test]
    fn test_empty_track_is_inert() {
        let track = AnimatedBoneTrack::new("Root", Vec::new());
        let mut skeleton = single_bone_skeleton("Root");
        let before = skeleton.clone();
        let mut binding =
            BoneAnimationBinding::bind(0, &track, &skeleton, SeekStrategy::Incremental);

        binding.set_position(&track, 0.3, &mut skeleton);

        assert!(binding.is_bound());
        assert!(!binding.is_valid());
        assert_eq!(binding.bracket_indices(), None);
        assert_eq!(binding.local_transform(), None);
        assert_eq!(skeleton, before);
    }

    #[test]
    fn test_unbound_track_samples_without_writing() {
        let track = AnimatedBoneTrack::new(
            "Tail",
            vec![keyframe(0.0, Vec3::ZERO), keyframe(1.0, Vec3::X)],
        );
        let mut skeleton = single_bone_skeleton("Root");
        let before = skeleton.clone();
        let mut binding =
            BoneAnimationBinding::bind(0, &track, &skeleton, SeekStrategy::Incremental);

        binding.set_position(&track, 0.5, &mut skeleton);

        assert_eq!(binding.target(), BoneTarget::Unbound);
        assert!(binding.is_valid());
        assert!((binding.translation() - Vec3::new(0.5, 0.0, 0.0)).length() < EPSILON);
        assert_eq!(skeleton, before);
    }

    #[test]
    fn test_forward_sweep_visits_every_bracket_in_order() {
        let times = [0.0, 0.1, 0.35, 0.4, 0.9, 1.0];
        let track = ramp_track(&times);
        let mut binding = unbound(&track, SeekStrategy::Incremental);

        let mut visited = Vec::new();
        let mut t = 0.0;
        while t <= 1.0 {
            binding.sample(&track, t);
            assert_bracket_contains(&binding, &track, t);
            if visited.last() != Some(&binding.current_keyframe()) {
                visited.push(binding.current_keyframe());
            }
            t += 1.0 / 120.0;
        }

        assert_eq!(visited, (0..times.len() - 1).collect::<Vec<_>>());
    }

    #[test]
    fn test_backward_seek_steps_back() {
        let track = ramp_track(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let mut binding = unbound(&track, SeekStrategy::Incremental);

        binding.sample(&track, 3.5);
        assert_eq!(binding.current_keyframe(), 3);

        binding.sample(&track, 0.5);
        assert_eq!(binding.current_keyframe(), 0);
        assert!((binding.translation() - Vec3::new(0.5, 0.0, 0.0)).length() < EPSILON);
    }

    #[test]
    fn test_positions_outside_keyed_range_hold_end_poses() {
        let track = ramp_track(&[0.5, 1.0, 1.5]);
        let mut binding = unbound(&track, SeekStrategy::Incremental);

        binding.sample(&track, 0.0);
        assert_eq!(binding.bracket_indices(), Some((0, 1)));
        assert!((binding.translation() - Vec3::ZERO).length() < EPSILON);

        binding.sample(&track, 10.0);
        assert_eq!(binding.bracket_indices(), Some((1, 2)));
        assert!((binding.translation() - Vec3::new(2.0, 0.0, 0.0)).length() < EPSILON);
    }

    #[test]
    fn test_duplicate_keyframe_times_do_not_divide_by_zero() {
        let track = ramp_track(&[0.0, 1.0, 1.0, 2.0]);
        let mut binding = unbound(&track, SeekStrategy::Incremental);

        binding.sample(&track, 1.0);
        assert!(binding.translation().is_finite());
        assert!(binding.rotation().is_finite());
        assert_eq!(binding.current_keyframe(), 2);

        let track = ramp_track(&[0.0, 1.0, 1.0]);
        binding.sample(&track, 1.0);
        assert_eq!(binding.bracket_indices(), Some((1, 2)));
        assert!((binding.translation() - Vec3::new(2.0, 0.0, 0.0)).length() < EPSILON);
    }

    #[test]
    fn test_strategies_select_identical_brackets() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        let mut time = 0.0;
        let times: Vec<f64> = (0..40)
            .map(|_| {
                time += rng.random_range(0.0..0.2);
                time
            })
            .collect();
        let track = ramp_track(&times);
        let end = *times.last().unwrap();

        let mut incremental = unbound(&track, SeekStrategy::Incremental);
        let mut binary = unbound(&track, SeekStrategy::Binary);

        for _ in 0..500 {
            let t = rng.random_range(-0.5..end + 0.5);
            incremental.sample(&track, t);
            binary.sample(&track, t);

            assert_eq!(
                incremental.bracket_indices(),
                binary.bracket_indices(),
                "strategies disagree at t={t}"
            );
            assert_eq!(incremental.translation(), binary.translation());

            if (times[0]..=end).contains(&t) {
                assert_bracket_contains(&incremental, &track, t);
            }
        }
    }

    #[test]
    fn test_random_forward_sweep_never_skips() {
        let mut rng = StdRng::seed_from_u64(7);
        let times: Vec<f64> = (0..25).map(|i| i as f64 * 0.04).collect();
        let track = ramp_track(&times);
        let mut binding = unbound(&track, SeekStrategy::Incremental);

        let mut t = 0.0;
        let mut last = 0;
        while t < 1.0 {
            binding.sample(&track, t);
            let current = binding.current_keyframe();
            assert!(current >= last, "cursor moved backward during a forward sweep");
            assert!(current - last <= 1, "skipped from {last} to {current} at t={t}");
            last = current;
            // Steps shorter than the keyframe spacing
            t += rng.random_range(0.001..0.039);
        }
    }

    #[test]
    fn test_nan_position_keeps_previous_pose() {
        let track = ramp_track(&[0.0, 1.0, 2.0, 3.0]);

        for strategy in [SeekStrategy::Incremental, SeekStrategy::Binary] {
            let mut skeleton = single_bone_skeleton("Root");
            let mut binding = BoneAnimationBinding::bind(0, &track, &skeleton, strategy);

            binding.set_position(&track, 1.5, &mut skeleton);
            let posed = skeleton.clone();

            assert!(!binding.sample(&track, f64::NAN), "{strategy:?} accepted NaN");
            binding.set_position(&track, f64::NAN, &mut skeleton);

            assert_eq!(binding.bracket_indices(), Some((1, 2)), "{strategy:?}");
            assert!(binding.translation().is_finite());
            assert_eq!(skeleton, posed, "{strategy:?} wrote a pose for NaN");
        }
    }

    #[test]
    fn test_infinite_positions_hold_end_poses() {
        let track = ramp_track(&[0.0, 1.0, 2.0]);
        let mut incremental = unbound(&track, SeekStrategy::Incremental);
        let mut binary = unbound(&track, SeekStrategy::Binary);

        for t in [f64::INFINITY, f64::NEG_INFINITY] {
            assert!(incremental.sample(&track, t));
            assert!(binary.sample(&track, t));
            assert_eq!(incremental.bracket_indices(), binary.bracket_indices());
            assert_eq!(incremental.translation(), binary.translation());
        }
        assert_eq!(incremental.translation(), Vec3::ZERO);
    }
}
