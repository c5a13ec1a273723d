//! vrmirror-probe: drive one OpenVR Capture source without a host.
//!
//! Stands in for the host application: the source is shown, ticked and
//! rendered at roughly 30 Hz, and the shared texture handle it produces is
//! logged instead of drawn. Useful for checking a SteamVR install and a
//! preset file before loading the module into the host.
//!
//! # Environment
//!
//! | variable                 | meaning                                    | default   |
//! |--------------------------|--------------------------------------------|-----------|
//! | `VRMIRROR_SETTINGS`      | source settings as a JSON object           | `{}`      |
//! | `VRMIRROR_PRESETS_DIR`   | directory holding `win-openvr-presets.ini` | `./data`  |
//! | `VRMIRROR_SECONDS`       | how long to run                            | `10`      |
//! | `RUST_LOG`               | tracing filter                             | `info`    |

use std::cell::Cell;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vrmirror_capture::{Host, SteamVrBackend};
use vrmirror_core::{RawSettings, SharedHandle};
use vrmirror_source::{PluginModule, DISPLAY_NAME};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Host double that "opens" a shared texture by keeping its handle.
struct ProbeHost {
    in_graphics: Cell<bool>,
}

impl Host for ProbeHost {
    type Texture = SharedHandle;

    fn source_active(&self) -> bool {
        true
    }

    fn enter_graphics(&self) {
        self.in_graphics.set(true);
    }

    fn leave_graphics(&self) {
        self.in_graphics.set(false);
    }

    fn open_shared_texture(&self, handle: SharedHandle) -> Option<SharedHandle> {
        if !self.in_graphics.get() {
            warn!("shared texture opened outside the graphics scope");
        }
        Some(handle)
    }

    fn destroy_texture(&self, _texture: SharedHandle) {}
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("{} probe v{}", DISPLAY_NAME, env!("CARGO_PKG_VERSION"));

    // ── Read configuration from environment ───────────────────────────────
    let settings_json = std::env::var("VRMIRROR_SETTINGS").unwrap_or_else(|_| "{}".to_owned());
    let raw = RawSettings::from_json(&settings_json)
        .with_context(|| format!("VRMIRROR_SETTINGS is not a JSON object: {settings_json}"))?;

    let presets_dir = std::env::var_os("VRMIRROR_PRESETS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));

    let seconds: u64 = std::env::var("VRMIRROR_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(10)
        .max(1);

    // ── Load module + create the source ───────────────────────────────────
    let module = PluginModule::load(SteamVrBackend::new(), Some(&presets_dir));
    for (index, preset) in module.presets().iter().enumerate() {
        info!("  preset {}: {}", index + 1, preset.name);
    }

    let host = ProbeHost { in_graphics: Cell::new(false) };
    let mut source = module.create_source("probe", &raw, host);
    source.show();

    // ── Tick / render loop ────────────────────────────────────────────────
    let deadline = Instant::now() + Duration::from_secs(seconds);
    let mut frames: u64 = 0;
    let mut last_report = Instant::now();

    while Instant::now() < deadline {
        let started = Instant::now();
        source.video_tick(FRAME_INTERVAL.as_secs_f32());
        if source.video_render().is_some() {
            frames += 1;
        }

        if last_report.elapsed() >= Duration::from_secs(1) {
            let session = source.session();
            match session.current_frame() {
                Some(handle) => info!(
                    "{}x{} from {} eye, handle {:#x}, {} frames",
                    source.width(),
                    source.height(),
                    session.config().eye,
                    handle.0,
                    frames,
                ),
                None => info!("waiting for SteamVR ({:?})", session.phase()),
            }
            last_report = Instant::now();
        }

        std::thread::sleep(FRAME_INTERVAL.saturating_sub(started.elapsed()));
    }

    source.hide();
    info!("Probe finished: {} frames in {}s", frames, seconds);
    source.destroy();
    Ok(())
}
