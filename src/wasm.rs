//! Browser bindings.
//!
//! `Viewer` is a thin wrapper around `AnimatedModel`: JavaScript drives the
//! frame loop (`advance_time`, then `skin_matrices`) and uploads the returned
//! floats to its own GPU buffers.

use crate::model::AnimatedModel;
use crate::player::PlaybackStatus;
use glam::Mat4;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Install console logging and the panic hook. Runs when the module is instantiated.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
}

fn js_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{context}: {err}"))
}

#[wasm_bindgen]
pub struct Viewer {
    model: AnimatedModel,
    world: Mat4,
}

#[wasm_bindgen]
impl Viewer {
    /// Load a model document
    #[wasm_bindgen(constructor)]
    pub fn new(model_json: &str) -> Result<Viewer, JsValue> {
        Self::from_json(model_json)
    }

    pub fn from_json(model_json: &str) -> Result<Viewer, JsValue> {
        let model =
            AnimatedModel::from_json(model_json).map_err(|e| js_error("Failed to load model", e))?;
        Ok(Self {
            model,
            world: Mat4::IDENTITY,
        })
    }

    /// Add a clip document to the model's library. Returns the clip name.
    pub fn load_clip(&mut self, clip_json: &str) -> Result<String, JsValue> {
        let clip = self
            .model
            .clips_mut()
            .add_json(clip_json)
            .map_err(|e| js_error("Failed to load clip", e))?;
        Ok(clip.name().to_string())
    }

    pub fn clip_names(&self) -> Vec<String> {
        self.model.clips().names().map(str::to_string).collect()
    }

    /// Start a clip from the beginning
    pub fn play(&mut self, name: &str) -> Result<(), JsValue> {
        self.model
            .play_named(name)
            .map(|_| ())
            .map_err(|e| js_error("Failed to play clip", e))
    }

    /// Applies to the active player and to clips started later
    pub fn set_looping(&mut self, looping: bool) {
        let settings = self.model.settings().looping(looping);
        self.model.set_settings(settings);
        if let Some(player) = self.model.player_mut() {
            player.set_looping(looping);
        }
    }

    /// Advance playback (call each frame with delta time)
    pub fn advance_time(&mut self, delta_ms: f32) {
        self.model.update(delta_ms / 1000.0);
    }

    pub fn rewind(&mut self) {
        self.model.rewind();
    }

    pub fn seek(&mut self, seconds: f32) {
        self.model.seek(seconds);
    }

    /// Column-major world matrix the mesh parts are placed with
    pub fn set_world(&mut self, cols: &[f32]) -> Result<(), JsValue> {
        let cols: &[f32; 16] = cols
            .try_into()
            .map_err(|_| JsValue::from_str("World matrix needs 16 floats"))?;
        self.world = Mat4::from_cols_array(cols);
        Ok(())
    }

    /// Skin palette for the current frame, 16 floats per render slot
    pub fn skin_matrices(&mut self) -> Vec<f32> {
        self.model.pose(self.world).skin_as_f32().to_vec()
    }

    /// World matrix of every mesh part, 16 floats each
    pub fn mesh_world_matrices(&mut self) -> Vec<f32> {
        self.model.pose(self.world).mesh_world_as_f32().to_vec()
    }

    /// `PlaybackStatus` as a JS object, or null when nothing is playing
    pub fn playback_state(&self) -> Result<JsValue, JsValue> {
        let status: Option<PlaybackStatus> = self.model.player().map(|p| p.status());
        let serializer = serde_wasm_bindgen::Serializer::new().serialize_missing_as_null(true);
        status
            .serialize(&serializer)
            .map_err(|e| js_error("Failed to serialize state", e))
    }
}
