//! Drives the full load, play, update, pose loop over the bundled assets.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skinned_playback::{
    AnimatedModel, AnimationClip, FramePose, Mat4, PlaybackMode, PlaybackSettings, SeekStrategy,
    Vec3,
};

const ARM_MODEL: &str = include_str!("../assets/models/arm.json");
const WAVE_CLIP: &str = include_str!("../assets/clips/wave.json");

const TOLERANCE: f32 = 1e-4;

fn arm_with_wave() -> AnimatedModel {
    let mut model = AnimatedModel::from_json(ARM_MODEL).unwrap();
    model.clips_mut().add_json(WAVE_CLIP).unwrap();
    model
}

fn bone_position(model: &AnimatedModel, name: &str) -> Vec3 {
    model
        .skeleton()
        .find_bone_by_name(name)
        .map(|b| b.absolute_transform().transform_point3(Vec3::ZERO))
        .unwrap()
}

fn assert_near(actual: Vec3, expected: Vec3) {
    assert!(
        (actual - expected).length() < TOLERANCE,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_assets_load() {
    let model = arm_with_wave();

    assert_eq!(model.skeleton().len(), 4);
    assert_eq!(model.render_skeleton().len(), 3);
    assert_eq!(model.clips().names().collect::<Vec<_>>(), vec!["reach", "wave"]);

    let wave = model.clips().get("wave").unwrap();
    assert_eq!(wave.duration(), 2.0);
    assert_eq!(wave.track_count(), 3);
}

#[test]
fn test_wave_midpoint_pose() {
    let mut model = arm_with_wave();
    let player = model.play_named("wave").unwrap();
    // Tail has no bone in the arm skeleton
    assert_eq!(player.bound_count(), 2);

    for _ in 0..4 {
        model.update(0.25);
    }
    let pose = model.pose(Mat4::IDENTITY);

    // UpperArm turned 90 degrees about Z, Forearm back to straight
    assert_near(bone_position(&model, "UpperArm"), Vec3::new(0.0, 1.0, 0.0));
    assert_near(bone_position(&model, "Forearm"), Vec3::new(-1.0, 1.0, 0.0));
    assert_near(bone_position(&model, "Hand"), Vec3::new(-2.0, 1.0, 0.0));

    // A vertex bound at the hand's rest position follows the hand
    let vertex = pose.skin[2].transform_point3(Vec3::new(0.0, 3.0, 0.0));
    assert_near(vertex, Vec3::new(-2.0, 1.0, 0.0));
}

#[test]
fn test_reach_once_holds_last_pose() {
    let mut model = arm_with_wave();
    model.play_named("reach").unwrap();

    for _ in 0..120 {
        model.update(1.0 / 60.0);
    }
    model.update(5.0);

    let player = model.player().unwrap();
    assert_eq!(player.mode(), PlaybackMode::Once);
    assert!(player.is_finished());

    let world = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
    let pose = model.pose(world);

    assert_near(bone_position(&model, "Hand"), Vec3::new(0.0, 1.0, 2.0));
    let prop = pose.mesh_world[1].transform_point3(Vec3::ZERO);
    assert_near(prop, Vec3::new(10.0, 1.0, 2.0));
    let base = pose.mesh_world[0].transform_point3(Vec3::ZERO);
    assert_near(base, Vec3::new(10.0, 0.0, 0.0));
}

#[test]
fn test_looping_frame_loop_stays_in_range() {
    let mut model = arm_with_wave();
    model.set_settings(PlaybackSettings::default().looping(true));
    model.play_named("wave").unwrap();

    let mut pose = FramePose::default();
    for _ in 0..600 {
        model.update(1.0 / 60.0);
        model.write_pose(Mat4::IDENTITY, &mut pose);

        let position = model.player().map(|p| p.position()).unwrap();
        assert!((0.0..2.0).contains(&position), "position {position} out of range");
        assert!(pose.skin.iter().all(|m| m.is_finite()));
    }
}

#[test]
fn test_switching_clips_mid_play() {
    let mut model = arm_with_wave();
    model.play_named("wave").unwrap();
    model.update(0.5);

    model.play_named("reach").unwrap();
    model.pose(Mat4::IDENTITY);

    // Forearm is not animated by "reach", so it is back at its bind pose
    let forearm = model.skeleton().find_bone_by_name("Forearm").unwrap();
    assert_eq!(forearm.animated_local_transform(), forearm.bind_local_transform());
    assert_near(bone_position(&model, "Hand"), Vec3::new(0.0, 3.0, 0.0));
}

#[test]
fn test_seek_strategies_pose_identically() {
    let mut incremental = arm_with_wave();
    let mut binary = arm_with_wave();
    binary.set_settings(PlaybackSettings::default().seek(SeekStrategy::Binary));
    incremental.play_named("wave").unwrap();
    binary.play_named("wave").unwrap();

    let mut rng = StdRng::seed_from_u64(0xa11ce);
    for _ in 0..200 {
        let t = rng.random_range(-0.5..2.5f32);
        incremental.seek(t);
        binary.seek(t);

        let a = incremental.pose(Mat4::IDENTITY);
        let b = binary.pose(Mat4::IDENTITY);
        assert_eq!(a, b, "poses differ at t={t}");
    }
}

#[test]
fn test_clip_document_round_trip() {
    let clip = AnimationClip::from_json(WAVE_CLIP).unwrap();
    let json = clip.to_json_string().unwrap();
    let reloaded = AnimationClip::from_json(&json).unwrap();

    assert_eq!(reloaded.name(), "wave");
    assert_eq!(reloaded.track_count(), clip.track_count());
    for (a, b) in clip.tracks().iter().zip(reloaded.tracks()) {
        assert_eq!(a.bone_name(), b.bone_name());
        assert_eq!(a.len(), b.len());
    }
}
