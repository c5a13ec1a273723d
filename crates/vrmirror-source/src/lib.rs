//! vrmirror-source: the "OpenVR Capture" video source as seen by the host.
//!
//! [`PluginModule`] is created once when the host loads the module and owns
//! what every source shares: the VR runtime gate and the crop presets.
//! Each [`MirrorSource`] maps the host's lifecycle callbacks onto a
//! [`vrmirror_capture::MirrorSession`]; the property panel is described by
//! pure functions in [`properties`].

pub mod module;
pub mod properties;
pub mod source;

pub use module::PluginModule;
pub use properties::{crop_edited, crop_labels, select_preset, Property, PropertyKind, PropertySheet};
pub use source::{MirrorSource, DISPLAY_NAME, SOURCE_ID};
