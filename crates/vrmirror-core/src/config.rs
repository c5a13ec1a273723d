use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{CropRegion, Eye};

pub const KEY_RIGHT_EYE: &str = "righteye";
pub const KEY_CROP_PRESET: &str = "croppreset";
pub const KEY_CROP_LEFT: &str = "cropleft";
pub const KEY_CROP_RIGHT: &str = "cropright";
pub const KEY_CROP_TOP: &str = "croptop";
pub const KEY_CROP_BOTTOM: &str = "cropbottom";

/// Preset index meaning "no preset, sliders set by hand".
pub const PRESET_NONE: i64 = 0;

// MARK: - SettingsSource

/// Typed read access to the host's settings object.
///
/// Getters return `None` for absent or mistyped keys; callers fall back to
/// [`SourceSettings::default`].
pub trait SettingsSource {
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn get_int(&self, key: &str) -> Option<i64>;
}

/// Host settings as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSettings(Map<String, Value>);

impl RawSettings {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json).map(Self)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_owned(), value.into());
    }
}

impl SettingsSource for RawSettings {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key)?.as_bool()
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        // Sliders written by the preset list may come back as doubles.
        let value = self.0.get(key)?;
        value.as_i64().or_else(|| value.as_f64().map(|v| v.round() as i64))
    }
}

// MARK: - SourceSettings

/// Per-source settings as stored by the host.
///
/// Crop sliders are eye-relative: they apply as-is to the right eye and are
/// mirrored for the left eye (see [`MirrorConfig::from_settings`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    #[serde(rename = "righteye")]
    pub right_eye: bool,
    #[serde(rename = "croppreset")]
    pub crop_preset: i64,
    #[serde(rename = "cropleft")]
    pub crop_left: i64,
    #[serde(rename = "cropright")]
    pub crop_right: i64,
    #[serde(rename = "croptop")]
    pub crop_top: i64,
    #[serde(rename = "cropbottom")]
    pub crop_bottom: i64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            right_eye: true,
            crop_preset: PRESET_NONE,
            crop_left: 0,
            crop_right: 0,
            crop_top: 0,
            crop_bottom: 0,
        }
    }
}

impl SourceSettings {
    /// Overwrite every field from `raw`, using defaults for missing keys.
    pub fn apply_from(&mut self, raw: &impl SettingsSource) {
        let defaults = Self::default();
        self.right_eye = raw.get_bool(KEY_RIGHT_EYE).unwrap_or(defaults.right_eye);
        self.crop_preset = raw.get_int(KEY_CROP_PRESET).unwrap_or(defaults.crop_preset);
        self.crop_left = raw.get_int(KEY_CROP_LEFT).unwrap_or(defaults.crop_left);
        self.crop_right = raw.get_int(KEY_CROP_RIGHT).unwrap_or(defaults.crop_right);
        self.crop_top = raw.get_int(KEY_CROP_TOP).unwrap_or(defaults.crop_top);
        self.crop_bottom = raw.get_int(KEY_CROP_BOTTOM).unwrap_or(defaults.crop_bottom);
    }

    pub fn from_source(raw: &impl SettingsSource) -> Self {
        let mut settings = Self::default();
        settings.apply_from(raw);
        settings
    }

    /// Host representation, for writing edited values back.
    pub fn to_raw(&self) -> RawSettings {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => RawSettings(map),
            _ => RawSettings::default(),
        }
    }
}

// MARK: - MirrorConfig

/// What the capture session needs: which eye and which region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorConfig {
    pub eye: Eye,
    pub crop: CropRegion,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self { eye: Eye::Right, crop: CropRegion::NONE }
    }
}

impl MirrorConfig {
    pub fn from_settings(settings: &SourceSettings) -> Self {
        let crop = CropRegion {
            top: pixel_offset(settings.crop_top),
            left: pixel_offset(settings.crop_left),
            bottom: pixel_offset(settings.crop_bottom),
            right: pixel_offset(settings.crop_right),
        };
        let eye = Eye::from_right_eye(settings.right_eye);
        let crop = match eye {
            Eye::Right => crop,
            Eye::Left => crop.mirrored(),
        };
        Self { eye, crop }
    }
}

impl From<&SourceSettings> for MirrorConfig {
    fn from(settings: &SourceSettings) -> Self {
        Self::from_settings(settings)
    }
}

fn pixel_offset(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
