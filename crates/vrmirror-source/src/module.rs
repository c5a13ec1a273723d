//! Module-level state shared by every source.

use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use tracing::{info, warn};
use vrmirror_capture::{Host, MirrorBackend, RuntimeGate};
use vrmirror_core::{load_presets, CropPreset, SettingsSource, PRESETS_FILE};

use crate::source::{MirrorSource, SOURCE_ID};

/// Created once when the host loads the module.
pub struct PluginModule<B: MirrorBackend> {
    gate:    Rc<RuntimeGate<B>>,
    presets: Arc<[CropPreset]>,
}

impl<B: MirrorBackend> PluginModule<B> {
    /// `module_dir` is the host's data directory for this module, if it
    /// could be resolved; the preset file is looked up inside it.
    pub fn load(backend: B, module_dir: Option<&Path>) -> Self {
        let presets = match module_dir {
            Some(dir) => load_presets(&dir.join(PRESETS_FILE)),
            None => {
                warn!("Failed to load presets file '{}': module data directory unknown", PRESETS_FILE);
                Vec::new()
            }
        };
        info!("Registered source '{}' with {} crop presets", SOURCE_ID, presets.len());
        Self::with_presets(backend, presets)
    }

    pub fn with_presets(backend: B, presets: Vec<CropPreset>) -> Self {
        Self { gate: RuntimeGate::new(backend), presets: presets.into() }
    }

    pub fn presets(&self) -> &[CropPreset] {
        &self.presets
    }

    pub fn gate(&self) -> &Rc<RuntimeGate<B>> {
        &self.gate
    }

    pub fn create_source<H: Host>(
        &self,
        name: impl Into<String>,
        raw: &impl SettingsSource,
        host: H,
    ) -> MirrorSource<B, H> {
        MirrorSource::create(name, raw, Rc::clone(&self.gate), host, Arc::clone(&self.presets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    use vrmirror_capture::fake::{CallLog, FakeHost, FakeRuntime};
    use vrmirror_core::{CaptureError, CropRegion, RawSettings};

    fn scratch_dir(test: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vrmirror-{}-{}", test, std::process::id()));
        fs::create_dir_all(&dir).expect("scratch dir");
        dir
    }

    #[test]
    fn loads_presets_next_to_module() {
        let dir = scratch_dir("presets");
        fs::write(dir.join(PRESETS_FILE), "10,20,30,40,Headset A\n1,2,3,4,Headset B\n").unwrap();

        let module = PluginModule::load(FakeRuntime::new(), Some(&dir));
        assert_eq!(module.presets().len(), 2);
        assert_eq!(module.presets()[0].name, "Headset A");
        assert_eq!(module.presets()[0].region, CropRegion::new(10, 30, 20, 40));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_preset_file_gives_empty_list() {
        let dir = scratch_dir("missing");
        let module = PluginModule::load(FakeRuntime::new(), Some(&dir));
        assert!(module.presets().is_empty());

        let module = PluginModule::load(FakeRuntime::new(), None);
        assert!(module.presets().is_empty());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn sources_share_one_runtime_connection() {
        let module = PluginModule::with_presets(FakeRuntime::new(), Vec::new());
        let log = module.gate().backend().log();
        let host_a = FakeHost::new(log.clone());
        let host_b = FakeHost::new(CallLog::default());
        host_a.set_active(true);
        host_b.set_active(true);

        let raw = RawSettings::default();
        let mut first = module.create_source("first", &raw, host_a);
        let mut second = module.create_source("second", &raw, host_b);

        first.show();
        assert!(first.session().is_ready());

        second.show();
        assert!(!second.session().is_ready());
        assert!(matches!(second.session().gate().acquire(), Err(CaptureError::RuntimeBusy)));

        first.hide();
        second.show();
        assert!(second.session().is_ready());
    }
}
