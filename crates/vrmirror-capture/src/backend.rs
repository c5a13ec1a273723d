//! Seams between the session and the outside world: the VR runtime + GPU
//! backend it drives, and the host application it draws into.

use vrmirror_core::{CaptureError, CropRect, Extent, Eye, SharedHandle};

/// Event drained from the runtime's queue while a session is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// The runtime wants every application to exit.
    Quit,
    Other(u32),
}

/// The VR runtime connection plus the GPU calls needed to share its mirror
/// texture.
///
/// Handle types release themselves on drop, except `MirrorView`, which is
/// owned by the runtime and becomes invalid once [`MirrorBackend::shutdown`]
/// has run. `Device` is released explicitly so its outstanding reference
/// count can be reported.
pub trait MirrorBackend {
    /// Auxiliary GPU device and its immediate context.
    type Device;
    /// Compositor-owned view of the mirror texture (never released here).
    type MirrorView;
    /// Underlying texture resource resolved from the view.
    type Resource;
    /// Private cropped texture created on `Device`.
    type Texture;

    /// Connect to the runtime as a background application.
    fn connect(&self) -> Result<(), CaptureError>;
    fn shutdown(&self);
    /// Whether the runtime's system interface can still be reached.
    fn system_available(&self) -> bool;
    /// Non-blocking: `None` once the queue is empty.
    fn poll_event(&self) -> Option<RuntimeEvent>;

    fn create_device(&self) -> Result<Self::Device, CaptureError>;
    fn mirror_view(&self, device: &Self::Device, eye: Eye) -> Result<Self::MirrorView, CaptureError>;
    fn mirror_resource(&self, view: &Self::MirrorView) -> Result<(Self::Resource, Extent), CaptureError>;
    /// Linear (non-sRGB) shareable texture of `extent`, described after `source`.
    fn create_crop_texture(
        &self,
        device: &Self::Device,
        source: &Self::Resource,
        extent: Extent,
    ) -> Result<Self::Texture, CaptureError>;
    fn shared_handle(&self, texture: &Self::Texture) -> Result<SharedHandle, CaptureError>;
    fn copy_region(&self, device: &Self::Device, dst: &Self::Texture, src: &Self::Resource, rect: CropRect);
    fn flush(&self, device: &Self::Device);
    /// Release the device, returning its remaining reference count.
    fn release_device(&self, device: Self::Device) -> u32;
}

/// Host application services used by a capture source.
pub trait Host {
    /// Texture object living in the host's own graphics device.
    type Texture;

    /// Is the source currently shown or otherwise in use?
    fn source_active(&self) -> bool;
    fn enter_graphics(&self);
    fn leave_graphics(&self);
    /// Open a shared texture in the host device. Call inside a [`GraphicsScope`].
    fn open_shared_texture(&self, handle: SharedHandle) -> Option<Self::Texture>;
    /// Call inside a [`GraphicsScope`].
    fn destroy_texture(&self, texture: Self::Texture);
}

/// Holds the host graphics context for as long as it lives.
pub struct GraphicsScope<'a, H: Host> {
    host: &'a H,
}

impl<'a, H: Host> GraphicsScope<'a, H> {
    pub fn enter(host: &'a H) -> Self {
        host.enter_graphics();
        Self { host }
    }
}

impl<H: Host> Drop for GraphicsScope<'_, H> {
    fn drop(&mut self) {
        self.host.leave_graphics();
    }
}
