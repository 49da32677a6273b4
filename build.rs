//! Build script for animation clip validation
//!
//! Runs at compile time over every clip document in `assets/clips` and
//! rejects files the runtime loader would refuse: negative durations,
//! negative keyframe times and keyframes out of time order.

use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct Keyframe {
    time: f64,
    rotation: [f32; 4],
}

#[derive(Debug, Deserialize)]
struct BoneTrack {
    name: String,
    #[serde(default)]
    keyframes: Vec<Keyframe>,
}

#[derive(Debug, Deserialize)]
struct AnimationClip {
    name: String,
    duration: f64,
    #[serde(default)]
    bones: Vec<BoneTrack>,
}

/// Validate one bone track, returning a line per problem
fn validate_track(track: &BoneTrack, duration: f64) -> Vec<String> {
    let mut errors = Vec::new();
    let mut previous = f64::NEG_INFINITY;

    for (i, kf) in track.keyframes.iter().enumerate() {
        if kf.time.is_nan() || kf.time < 0.0 {
            errors.push(format!("  keyframe {} has invalid time {}", i, kf.time));
        } else if kf.time < previous {
            errors.push(format!(
                "  keyframe {} at t={:.3}s comes before t={:.3}s",
                i, kf.time, previous
            ));
        }
        if kf.time > duration {
            println!(
                "cargo:warning={}: keyframe {} at t={:.3}s is past the clip end",
                track.name, i, kf.time
            );
        }
        if kf.rotation.iter().all(|c| *c == 0.0) {
            println!(
                "cargo:warning={}: keyframe {} has a zero rotation, treated as identity",
                track.name, i
            );
        }
        previous = previous.max(kf.time);
    }

    errors
}

/// Validate a clip file
fn validate_clip_file(path: &Path) -> Result<(), String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let clip: AnimationClip = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;

    if clip.duration.is_nan() || clip.duration < 0.0 {
        return Err(format!(
            "Clip '{}' has invalid duration {}",
            clip.name, clip.duration
        ));
    }

    let mut all_errors = Vec::new();
    for track in &clip.bones {
        let errors = validate_track(track, clip.duration);
        if !errors.is_empty() {
            all_errors.push(format!("Bone '{}':\n{}", track.name, errors.join("\n")));
        }
    }

    if all_errors.is_empty() {
        let keyframes: usize = clip.bones.iter().map(|b| b.keyframes.len()).sum();
        println!(
            "cargo:warning=✓ {} validated ({} tracks, {} keyframes)",
            clip.name,
            clip.bones.len(),
            keyframes
        );
        Ok(())
    } else {
        Err(format!(
            "Clip '{}' has invalid keyframes:\n{}",
            clip.name,
            all_errors.join("\n\n")
        ))
    }
}

fn main() {
    // Clip files to validate (relative to crate root)
    let clip_dir = Path::new("assets/clips");

    if !clip_dir.exists() {
        println!("cargo:warning=Clip directory not found, skipping validation");
        return;
    }

    let mut has_errors = false;

    if let Ok(entries) = fs::read_dir(clip_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                println!("cargo:rerun-if-changed={}", path.display());

                if let Err(e) = validate_clip_file(&path) {
                    println!("cargo:warning=VALIDATION ERROR: {}", e);
                    has_errors = true;
                }
            }
        }
    }

    if has_errors {
        panic!("Clip validation failed! Fix the keyframe files in assets/clips.");
    }

    println!("cargo:rerun-if-changed={}", clip_dir.display());
}
