//! In-memory runtime, GPU and host doubles.
//!
//! Every call is appended to a shared [`CallLog`] so tests can assert on
//! which native operations ran and in which order.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use vrmirror_core::{CaptureError, CropRect, Extent, Eye, SharedHandle};

use crate::backend::{Host, MirrorBackend, RuntimeEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect,
    Shutdown,
    CreateDevice,
    MirrorView(Eye),
    MirrorResource,
    CreateCropTexture(Extent),
    SharedHandle,
    CopyRegion(CropRect),
    Flush,
    DropResource,
    DropTexture,
    ReleaseDevice,
    EnterGraphics,
    LeaveGraphics,
    OpenShared(SharedHandle),
    DestroyHostTexture,
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.0.borrow().iter().filter(|c| *c == call).count()
    }

    /// Index of the last occurrence of `call`.
    pub fn last_position(&self, call: &Call) -> Option<usize> {
        self.0.borrow().iter().rposition(|c| c == call)
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Where the next activation attempt should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Connect,
    Device,
    MirrorView,
    MirrorResource,
    EmptyTexture,
    CropTexture,
    SharedHandle,
}

// ── FakeRuntime ───────────────────────────────────────────────────────────────

pub struct FakeRuntime {
    log:         CallLog,
    fail:        Cell<Option<FailPoint>>,
    extent:      Cell<Extent>,
    events:      RefCell<VecDeque<RuntimeEvent>>,
    available:   Cell<bool>,
    leaked_refs: Cell<u32>,
    next_handle: Cell<u64>,
}

impl Default for FakeRuntime {
    fn default() -> Self {
        Self::with_log(CallLog::default())
    }
}

impl FakeRuntime {
    pub const DEFAULT_EXTENT: Extent = Extent::new(1920, 1080);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            fail:        Cell::new(None),
            extent:      Cell::new(Self::DEFAULT_EXTENT),
            events:      RefCell::new(VecDeque::new()),
            available:   Cell::new(false),
            leaked_refs: Cell::new(0),
            next_handle: Cell::new(0x100),
        }
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    pub fn fail_at(&self, point: FailPoint) {
        self.fail.set(Some(point));
    }

    pub fn clear_failure(&self) {
        self.fail.set(None);
    }

    pub fn set_extent(&self, extent: Extent) {
        self.extent.set(extent);
    }

    pub fn push_event(&self, event: RuntimeEvent) {
        self.events.borrow_mut().push_back(event);
    }

    pub fn pending_events(&self) -> usize {
        self.events.borrow().len()
    }

    /// Simulate the runtime disappearing underneath a connected session.
    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }

    /// Reference count reported by the next device release.
    pub fn leak_refs(&self, refs: u32) {
        self.leaked_refs.set(refs);
    }

    fn fails_at(&self, point: FailPoint) -> bool {
        self.fail.get() == Some(point)
    }
}

pub struct FakeDevice;

pub struct FakeView;

pub struct FakeResource {
    log: CallLog,
}

impl Drop for FakeResource {
    fn drop(&mut self) {
        self.log.push(Call::DropResource);
    }
}

pub struct FakeTexture {
    log: CallLog,
}

impl Drop for FakeTexture {
    fn drop(&mut self) {
        self.log.push(Call::DropTexture);
    }
}

fn fake_error(point: FailPoint) -> CaptureError {
    let reason = format!("injected failure at {point:?}");
    match point {
        FailPoint::Connect => CaptureError::RuntimeUnavailable { reason },
        FailPoint::Device => CaptureError::DeviceCreation { reason },
        FailPoint::MirrorView => CaptureError::MirrorTexture { eye: Eye::Right, reason },
        FailPoint::MirrorResource => CaptureError::MirrorResource { reason },
        FailPoint::EmptyTexture => CaptureError::EmptyMirrorTexture { width: 0, height: 0 },
        FailPoint::CropTexture => CaptureError::TextureCreation { reason },
        FailPoint::SharedHandle => CaptureError::SharedHandle { reason },
    }
}

impl MirrorBackend for FakeRuntime {
    type Device = FakeDevice;
    type MirrorView = FakeView;
    type Resource = FakeResource;
    type Texture = FakeTexture;

    fn connect(&self) -> Result<(), CaptureError> {
        self.log.push(Call::Connect);
        if self.fails_at(FailPoint::Connect) {
            return Err(fake_error(FailPoint::Connect));
        }
        self.available.set(true);
        Ok(())
    }

    fn shutdown(&self) {
        self.log.push(Call::Shutdown);
        self.available.set(false);
        self.events.borrow_mut().clear();
    }

    fn system_available(&self) -> bool {
        self.available.get()
    }

    fn poll_event(&self) -> Option<RuntimeEvent> {
        self.events.borrow_mut().pop_front()
    }

    fn create_device(&self) -> Result<FakeDevice, CaptureError> {
        self.log.push(Call::CreateDevice);
        if self.fails_at(FailPoint::Device) {
            return Err(fake_error(FailPoint::Device));
        }
        Ok(FakeDevice)
    }

    fn mirror_view(&self, _device: &FakeDevice, eye: Eye) -> Result<FakeView, CaptureError> {
        self.log.push(Call::MirrorView(eye));
        if self.fails_at(FailPoint::MirrorView) {
            return Err(fake_error(FailPoint::MirrorView));
        }
        Ok(FakeView)
    }

    fn mirror_resource(&self, _view: &FakeView) -> Result<(FakeResource, Extent), CaptureError> {
        self.log.push(Call::MirrorResource);
        if self.fails_at(FailPoint::MirrorResource) {
            return Err(fake_error(FailPoint::MirrorResource));
        }
        let extent = if self.fails_at(FailPoint::EmptyTexture) { Extent::ZERO } else { self.extent.get() };
        Ok((FakeResource { log: self.log.clone() }, extent))
    }

    fn create_crop_texture(
        &self,
        _device: &FakeDevice,
        _source: &FakeResource,
        extent: Extent,
    ) -> Result<FakeTexture, CaptureError> {
        self.log.push(Call::CreateCropTexture(extent));
        if self.fails_at(FailPoint::CropTexture) {
            return Err(fake_error(FailPoint::CropTexture));
        }
        Ok(FakeTexture { log: self.log.clone() })
    }

    fn shared_handle(&self, _texture: &FakeTexture) -> Result<SharedHandle, CaptureError> {
        self.log.push(Call::SharedHandle);
        if self.fails_at(FailPoint::SharedHandle) {
            return Err(fake_error(FailPoint::SharedHandle));
        }
        let handle = self.next_handle.get();
        self.next_handle.set(handle + 1);
        Ok(SharedHandle(handle))
    }

    fn copy_region(&self, _device: &FakeDevice, _dst: &FakeTexture, _src: &FakeResource, rect: CropRect) {
        self.log.push(Call::CopyRegion(rect));
    }

    fn flush(&self, _device: &FakeDevice) {
        self.log.push(Call::Flush);
    }

    fn release_device(&self, _device: FakeDevice) -> u32 {
        self.log.push(Call::ReleaseDevice);
        self.leaked_refs.replace(0)
    }
}

// ── FakeHost ──────────────────────────────────────────────────────────────────

struct HostInner {
    log:         CallLog,
    active:      Cell<bool>,
    refuse_open: Cell<bool>,
    in_graphics: Cell<bool>,
}

/// Cloneable handle; clones share state so tests can flip `active` after the
/// host has been moved into a session.
#[derive(Clone)]
pub struct FakeHost {
    inner: Rc<HostInner>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct FakeHostTexture(pub SharedHandle);

impl FakeHost {
    pub fn new(log: CallLog) -> Self {
        Self {
            inner: Rc::new(HostInner {
                log,
                active:      Cell::new(false),
                refuse_open: Cell::new(false),
                in_graphics: Cell::new(false),
            }),
        }
    }

    pub fn set_active(&self, active: bool) {
        self.inner.active.set(active);
    }

    pub fn refuse_open(&self, refuse: bool) {
        self.inner.refuse_open.set(refuse);
    }
}

impl Host for FakeHost {
    type Texture = FakeHostTexture;

    fn source_active(&self) -> bool {
        self.inner.active.get()
    }

    fn enter_graphics(&self) {
        self.inner.log.push(Call::EnterGraphics);
        self.inner.in_graphics.set(true);
    }

    fn leave_graphics(&self) {
        self.inner.log.push(Call::LeaveGraphics);
        self.inner.in_graphics.set(false);
    }

    fn open_shared_texture(&self, handle: SharedHandle) -> Option<FakeHostTexture> {
        assert!(self.inner.in_graphics.get(), "opened shared texture outside graphics scope");
        self.inner.log.push(Call::OpenShared(handle));
        if self.inner.refuse_open.get() {
            return None;
        }
        Some(FakeHostTexture(handle))
    }

    fn destroy_texture(&self, _texture: FakeHostTexture) {
        assert!(self.inner.in_graphics.get(), "destroyed texture outside graphics scope");
        self.inner.log.push(Call::DestroyHostTexture);
    }
}

/// Runtime gate and host sharing one call log.
pub fn rig() -> (Rc<crate::RuntimeGate<FakeRuntime>>, FakeHost, CallLog) {
    let log = CallLog::default();
    let gate = crate::RuntimeGate::new(FakeRuntime::with_log(log.clone()));
    (gate, FakeHost::new(log.clone()), log)
}
