//! Property panel model and its modified-callbacks.
//!
//! The host renders a [`PropertySheet`] and calls back into the functions
//! below when a control changes. Each callback takes the current settings
//! and returns the settings to store, or `None` when nothing changes.

use vrmirror_core::config::{
    KEY_CROP_BOTTOM, KEY_CROP_LEFT, KEY_CROP_PRESET, KEY_CROP_RIGHT, KEY_CROP_TOP, KEY_RIGHT_EYE,
    PRESET_NONE,
};
use vrmirror_core::{CropPreset, Extent, SourceSettings};

/// Key of the "Reinitialize OpenVR Source" button.
pub const KEY_RESET: &str = "resetsteamvr";

const LABEL_CROP_LEFT: &str = "Crop Left";
const LABEL_CROP_RIGHT: &str = "Crop Right";

// MARK: - Model

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    Toggle,
    /// Integer-valued drop-down; `(label, value)` pairs.
    List { items: Vec<(String, i64)> },
    Slider { min: i64, max: i64, step: i64 },
    Button,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub key:     &'static str,
    pub label:   String,
    pub kind:    PropertyKind,
    pub visible: bool,
}

impl Property {
    fn new(key: &'static str, label: impl Into<String>, kind: PropertyKind) -> Self {
        Self { key, label: label.into(), kind, visible: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySheet {
    pub properties: Vec<Property>,
}

impl PropertySheet {
    pub fn get(&self, key: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.key == key)
    }
}

// MARK: - Panel

/// Build the panel for a source.
///
/// Crop sliders are hidden until the mirror texture size is known; their
/// limits then span the full texture.
pub fn build(settings: &SourceSettings, live: Extent, presets: &[CropPreset]) -> PropertySheet {
    let mut items = vec![("none".to_owned(), PRESET_NONE)];
    items.extend(presets.iter().zip(1..).map(|(preset, value)| (preset.name.clone(), value)));

    let (left_label, right_label) = crop_labels(settings.right_eye);
    let visible = !live.is_empty();
    let slider = |key, label: &str, max: u32| Property {
        visible,
        ..Property::new(key, label, PropertyKind::Slider { min: 0, max: i64::from(max), step: 1 })
    };

    PropertySheet {
        properties: vec![
            Property::new(KEY_RIGHT_EYE, "Right Eye", PropertyKind::Toggle),
            Property::new(KEY_CROP_PRESET, "Preset", PropertyKind::List { items }),
            slider(KEY_CROP_TOP, "Crop Top", live.height),
            slider(KEY_CROP_BOTTOM, "Crop Bottom", live.height),
            slider(KEY_CROP_LEFT, left_label, live.width),
            slider(KEY_CROP_RIGHT, right_label, live.width),
            Property::new(KEY_RESET, "Reinitialize OpenVR Source", PropertyKind::Button),
        ],
    }
}

// MARK: - Callbacks

/// Preset list changed: copy the chosen preset into the crop sliders.
///
/// Values are written as stored; [`vrmirror_core::MirrorConfig`] mirrors
/// them when the left eye is captured.
pub fn select_preset(settings: &SourceSettings, presets: &[CropPreset]) -> Option<SourceSettings> {
    let index = usize::try_from(settings.crop_preset.checked_sub(1)?).ok()?;
    let region = presets.get(index)?.region;
    Some(SourceSettings {
        crop_left: i64::from(region.left),
        crop_right: i64::from(region.right),
        crop_top: i64::from(region.top),
        crop_bottom: i64::from(region.bottom),
        ..settings.clone()
    })
}

/// A crop slider was moved by hand: drop back to "none".
pub fn crop_edited(settings: &SourceSettings) -> Option<SourceSettings> {
    (settings.crop_preset != PRESET_NONE)
        .then(|| SourceSettings { crop_preset: PRESET_NONE, ..settings.clone() })
}

/// Captions for the `cropleft` and `cropright` sliders. The left eye's
/// image is mirrored, so the captions swap with it.
pub fn crop_labels(right_eye: bool) -> (&'static str, &'static str) {
    if right_eye {
        (LABEL_CROP_LEFT, LABEL_CROP_RIGHT)
    } else {
        (LABEL_CROP_RIGHT, LABEL_CROP_LEFT)
    }
}
