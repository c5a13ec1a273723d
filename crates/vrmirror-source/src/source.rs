//! `MirrorSource`: one "OpenVR Capture" source instance.
//!
//! ```text
//! host callback        session
//! ─────────────        ──────────────────────────────
//! create / update  ─►  configure(MirrorConfig)
//! show             ─►  activate(forced)
//! hide / destroy   ─►  deactivate
//! video_tick       ─►  tick      (retry, quit watch)
//! video_render     ─►  render    (crop copy + flush)
//! reset button     ─►  reset     (debounced)
//! ```

use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, info};
use vrmirror_capture::{Host, MirrorBackend, MirrorSession, RuntimeGate};
use vrmirror_core::{CropPreset, MirrorConfig, SettingsSource, SourceSettings};

use crate::properties::{self, PropertySheet};

/// Identifier the source is registered under.
pub const SOURCE_ID: &str = "openvr_capture";

pub const DISPLAY_NAME: &str = "OpenVR Capture";

pub struct MirrorSource<B: MirrorBackend, H: Host> {
    settings: SourceSettings,
    presets:  Arc<[CropPreset]>,
    session:  MirrorSession<B, H>,
}

impl<B: MirrorBackend, H: Host> MirrorSource<B, H> {
    pub fn display_name() -> &'static str {
        DISPLAY_NAME
    }

    pub fn create(
        name: impl Into<String>,
        raw: &impl SettingsSource,
        gate: Rc<RuntimeGate<B>>,
        host: H,
        presets: Arc<[CropPreset]>,
    ) -> Self {
        let settings = SourceSettings::from_source(raw);
        let session = MirrorSession::new(name, gate, host, MirrorConfig::from(&settings));
        info!("[{}] created ({} eye)", session.name(), session.config().eye);
        Self { settings, presets, session }
    }

    /// Consume the source, releasing everything it holds.
    pub fn destroy(mut self) {
        self.session.deactivate();
        debug!("[{}] destroyed", self.session.name());
    }

    /// Settings changed in the host; a live mirror is rebuilt with them.
    pub fn update(&mut self, raw: &impl SettingsSource) {
        self.settings.apply_from(raw);
        self.session.configure(MirrorConfig::from(&self.settings));
    }

    pub fn show(&mut self) {
        // Errors are already logged by the session; the next tick retries.
        let _ = self.session.activate(true);
    }

    pub fn hide(&mut self) {
        self.session.deactivate();
    }

    pub fn video_tick(&mut self, _seconds: f32) {
        self.session.tick();
    }

    pub fn video_render(&self) -> Option<&H::Texture> {
        self.session.render()
    }

    pub fn width(&self) -> u32 {
        self.session.output_extent().width
    }

    pub fn height(&self) -> u32 {
        self.session.output_extent().height
    }

    pub fn properties(&self) -> PropertySheet {
        properties::build(&self.settings, self.session.live_extent(), &self.presets)
    }

    /// "Reinitialize OpenVR Source". Returns `false` when debounced.
    pub fn reset_clicked(&mut self) -> bool {
        self.session.reset()
    }

    pub fn settings(&self) -> &SourceSettings {
        &self.settings
    }

    pub fn session(&self) -> &MirrorSession<B, H> {
        &self.session
    }
}
