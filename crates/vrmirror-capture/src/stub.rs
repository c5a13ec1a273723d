//! Non-Windows stub for SteamVrBackend (CI + cross-compilation).
//!
//! The compositor only shares its mirror texture through Direct3D 11, so
//! every connection attempt reports the runtime as unavailable.

use std::convert::Infallible;

use vrmirror_core::{CaptureError, CropRect, Extent, Eye, SharedHandle};

use crate::backend::{MirrorBackend, RuntimeEvent};

#[derive(Debug, Default)]
pub struct SteamVrBackend;

impl SteamVrBackend {
    pub fn new() -> Self {
        tracing::info!("SteamVrBackend stub (non-Windows): mirror capture unavailable");
        Self
    }
}

impl MirrorBackend for SteamVrBackend {
    type Device = Infallible;
    type MirrorView = Infallible;
    type Resource = Infallible;
    type Texture = Infallible;

    fn connect(&self) -> Result<(), CaptureError> {
        Err(CaptureError::RuntimeUnavailable {
            reason: "SteamVR mirror capture requires Windows".into(),
        })
    }

    fn shutdown(&self) {}

    fn system_available(&self) -> bool {
        false
    }

    fn poll_event(&self) -> Option<RuntimeEvent> {
        None
    }

    fn create_device(&self) -> Result<Infallible, CaptureError> {
        Err(CaptureError::DeviceCreation { reason: "no Direct3D 11 on this platform".into() })
    }

    fn mirror_view(&self, device: &Infallible, _eye: Eye) -> Result<Infallible, CaptureError> {
        match *device {}
    }

    fn mirror_resource(&self, view: &Infallible) -> Result<(Infallible, Extent), CaptureError> {
        match *view {}
    }

    fn create_crop_texture(
        &self,
        device: &Infallible,
        _source: &Infallible,
        _extent: Extent,
    ) -> Result<Infallible, CaptureError> {
        match *device {}
    }

    fn shared_handle(&self, texture: &Infallible) -> Result<SharedHandle, CaptureError> {
        match *texture {}
    }

    fn copy_region(&self, device: &Infallible, _dst: &Infallible, _src: &Infallible, _rect: CropRect) {
        match *device {}
    }

    fn flush(&self, device: &Infallible) {
        match *device {}
    }

    fn release_device(&self, device: Infallible) -> u32 {
        match device {}
    }
}
