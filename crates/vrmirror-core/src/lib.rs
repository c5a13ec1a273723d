pub mod config;
pub mod errors;
pub mod presets;
pub mod types;

pub use config::{MirrorConfig, RawSettings, SettingsSource, SourceSettings};
pub use errors::{CaptureError, PresetError, Severity};
pub use presets::{load_presets, parse_presets, CropPreset, PRESETS_FILE};
pub use types::*;
