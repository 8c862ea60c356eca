//! Runtime settings
//!
//! Read once at start up from `settings.json` next to the page. Every field
//! is optional, anything missing keeps its default. Game rules are not in
//! here, only how the game is shown and controlled.

use crate::engine::input::InputSnapshot;
use crate::world::{Controls, FLASHLIGHT_RADIUS};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SCALE: f64 = 2.0;
pub const DEFAULT_SPRITE: &str = "https://cdn.jsdelivr.net/gh/Stinkalistic/zombie-game@main/zombguy.png";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Display pixels per game unit
    pub scale: f64,
    /// Where the flashlight fades to full darkness, game units
    pub flashlight_radius: f64,
    /// Player sprite url, relative to the page or absolute
    pub sprite: String,
    pub keys: KeyBindings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            scale: DEFAULT_SCALE,
            flashlight_radius: FLASHLIGHT_RADIUS,
            sprite: DEFAULT_SPRITE.to_string(),
            keys: KeyBindings::default(),
        }
    }
}

impl Settings {
    /// Replace values the renderer can't use with their defaults
    pub fn sanitized(mut self) -> Self {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            self.scale = DEFAULT_SCALE;
        }
        if !(self.flashlight_radius.is_finite() && self.flashlight_radius > 0.0) {
            self.flashlight_radius = FLASHLIGHT_RADIUS;
        }
        if self.sprite.trim().is_empty() {
            self.sprite = DEFAULT_SPRITE.to_string();
        }
        self
    }
}

/// DOM `KeyboardEvent.key` values for each action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub up: String,
    pub down: String,
    pub left: String,
    pub right: String,
    pub reload: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        KeyBindings {
            up: "w".to_string(),
            down: "s".to_string(),
            left: "a".to_string(),
            right: "d".to_string(),
            reload: "r".to_string(),
        }
    }
}

impl KeyBindings {
    pub fn controls(&self, input: &InputSnapshot) -> Controls {
        Controls {
            up: input.keys.is_pressed(&self.up),
            down: input.keys.is_pressed(&self.down),
            left: input.keys.is_pressed(&self.left),
            right: input.keys.is_pressed(&self.right),
            reload: input.keys.is_pressed(&self.reload),
            aim: input.pointer,
            shots: input.clicks.clone(),
        }
    }
}
