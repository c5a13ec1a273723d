//! `MirrorSession`: connect, share, crop and tear down one eye's mirror texture.
//!
//! # Activation chain
//!
//! ```text
//! RuntimeGate::acquire            (VR_Init, background application)
//!   │  MirrorBackend::create_device
//!   ▼
//! auxiliary D3D11 device + context
//!   │  mirror_view(eye) → mirror_resource → live extent
//!   ▼
//! CropRegion::resolve → CropRect
//!   │  create_crop_texture (R8G8B8A8_UNORM) → shared_handle
//!   ▼
//! Host::open_shared_texture → drawable handed to the host every frame
//! ```
//!
//! Teardown walks the chain backwards: host texture, cropped texture, mirror
//! resource, runtime shutdown, and only then the device.

use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};
use vrmirror_core::{CaptureError, CropRect, Extent, MirrorConfig, Severity};

use crate::backend::{GraphicsScope, Host, MirrorBackend, RuntimeEvent};
use crate::gate::{RuntimeGate, RuntimeLease};

/// Minimum spacing between unforced activation attempts after a failure.
/// Every runtime init cycle leaks a little inside the runtime.
pub const ACTIVATION_COOLDOWN: Duration = Duration::from_secs(1);

/// Minimum spacing between manual resets.
pub const RESET_DEBOUNCE: Duration = Duration::from_secs(2);

/// Output size reported before the first successful activation.
pub const PLACEHOLDER_EXTENT: Extent = Extent::new(100, 100);

// ── Public types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    pub runtime_connected: bool,
    pub device_ready:      bool,
    pub texture_ready:     bool,
    /// Last value reported by [`Host::source_active`].
    pub active:            bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Connecting,
    Ready,
}

/// Outcome of an activation request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Started,
    AlreadyReady,
    /// Skipped: the last failure is more recent than [`ACTIVATION_COOLDOWN`].
    CoolingDown,
}

// ── Owned handles ─────────────────────────────────────────────────────────────

struct Chain<B: MirrorBackend, H: Host> {
    host_texture: Option<H::Texture>,
    crop_texture: Option<B::Texture>,
    resource:     Option<B::Resource>,
    view:         Option<B::MirrorView>,
    lease:        Option<RuntimeLease<B>>,
    device:       Option<B::Device>,
}

impl<B: MirrorBackend, H: Host> Chain<B, H> {
    fn new() -> Self {
        Self {
            host_texture: None,
            crop_texture: None,
            resource:     None,
            view:         None,
            lease:        None,
            device:       None,
        }
    }

    fn is_empty(&self) -> bool {
        self.host_texture.is_none()
            && self.crop_texture.is_none()
            && self.resource.is_none()
            && self.view.is_none()
            && self.lease.is_none()
            && self.device.is_none()
    }
}

// ── MirrorSession ─────────────────────────────────────────────────────────────

pub struct MirrorSession<B: MirrorBackend, H: Host> {
    name:          String,
    gate:          Rc<RuntimeGate<B>>,
    host:          H,
    config:        MirrorConfig,
    phase:         SessionPhase,
    state:         SessionState,
    chain:         Chain<B, H>,
    live_extent:   Extent,
    crop_rect:     CropRect,
    output_extent: Extent,
    last_failure:  Option<Instant>,
    last_reset:    Option<Instant>,
}

impl<B: MirrorBackend, H: Host> MirrorSession<B, H> {
    pub fn new(name: impl Into<String>, gate: Rc<RuntimeGate<B>>, host: H, config: MirrorConfig) -> Self {
        Self {
            name: name.into(),
            gate,
            host,
            config,
            phase:         SessionPhase::Idle,
            state:         SessionState::default(),
            chain:         Chain::new(),
            live_extent:   Extent::ZERO,
            crop_rect:     CropRect::default(),
            output_extent: PLACEHOLDER_EXTENT,
            last_failure:  None,
            last_reset:    None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    pub fn activate(&mut self, forced: bool) -> Result<Activation, CaptureError> {
        self.activate_at(Instant::now(), forced)
    }

    /// Build the whole chain or nothing. Unless `forced`, attempts within
    /// [`ACTIVATION_COOLDOWN`] of the last failure are skipped.
    pub fn activate_at(&mut self, now: Instant, forced: bool) -> Result<Activation, CaptureError> {
        if self.phase == SessionPhase::Ready {
            return Ok(Activation::AlreadyReady);
        }
        if !forced && self.cooling_down(now) {
            return Ok(Activation::CoolingDown);
        }

        self.phase = SessionPhase::Connecting;
        match self.build_chain() {
            Ok(()) => {
                self.phase = SessionPhase::Ready;
                self.last_failure = None;
                info!(
                    "[{}] mirroring {} eye: {} cropped to {} at ({}, {})",
                    self.name,
                    self.config.eye,
                    self.live_extent,
                    self.crop_rect.extent(),
                    self.crop_rect.x,
                    self.crop_rect.y,
                );
                Ok(Activation::Started)
            }
            Err(err) => {
                self.log_failure(&err);
                self.release_chain();
                self.last_failure = Some(now);
                self.phase = SessionPhase::Idle;
                Err(err)
            }
        }
    }

    /// Release everything this session holds. Safe to call in any phase.
    pub fn deactivate(&mut self) {
        if !self.chain.is_empty() {
            self.release_chain();
            debug!("[{}] mirror released", self.name);
        }
        self.phase = SessionPhase::Idle;
        self.state = SessionState::default();
    }

    /// Store a new eye/crop; a ready session is rebuilt immediately.
    pub fn configure(&mut self, config: MirrorConfig) {
        self.config = config;
        if self.phase == SessionPhase::Ready {
            let active = self.state.active;
            self.deactivate();
            self.state.active = active;
            let _ = self.activate(false);
        }
    }

    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Once per host frame: retry while shown, watch the runtime while ready.
    pub fn tick_at(&mut self, now: Instant) {
        let active = self.host.source_active();
        self.state.active = active;

        if self.phase != SessionPhase::Ready {
            if active {
                let _ = self.activate_at(now, false);
            }
            return;
        }

        let runtime_alive = self.chain.lease.as_ref().map_or(false, RuntimeLease::system_available);
        if runtime_alive {
            while let Some(event) = self.chain.lease.as_ref().and_then(RuntimeLease::poll_event) {
                if event == RuntimeEvent::Quit {
                    // The runtime kills processes that keep it open past quit.
                    info!("[{}] VR runtime is quitting, releasing mirror", self.name);
                    self.deactivate();
                    self.last_failure = Some(now);
                    return;
                }
            }
        } else if active {
            warn!("[{}] VR runtime connection went stale, reinitialising", self.name);
            self.deactivate();
            self.state.active = active;
            let _ = self.activate_at(now, false);
        }
    }

    pub fn reset(&mut self) -> bool {
        self.reset_at(Instant::now())
    }

    /// Manual reinitialisation bypassing the cooldown. Returns `false` when
    /// debounced.
    pub fn reset_at(&mut self, now: Instant) -> bool {
        let debounced = self
            .last_reset
            .map_or(false, |at| now.saturating_duration_since(at) < RESET_DEBOUNCE);
        if debounced {
            return false;
        }
        self.last_reset = Some(now);

        info!("[{}] manual reinitialisation", self.name);
        self.deactivate();
        self.state.active = self.host.source_active();
        if self.state.active {
            let _ = self.activate_at(now, true);
        }
        true
    }

    // ── Per frame ─────────────────────────────────────────────────────────

    /// Copy the crop rectangle into the shared texture and return the host
    /// drawable. `None` unless ready and active.
    pub fn render(&self) -> Option<&H::Texture> {
        if !self.is_drawable() {
            return None;
        }
        let (Some(device), Some(dst), Some(src)) =
            (self.chain.device.as_ref(), self.chain.crop_texture.as_ref(), self.chain.resource.as_ref())
        else {
            return None;
        };

        let backend = self.gate.backend();
        backend.copy_region(device, dst, src, self.crop_rect);
        // The host reads the shared texture through another device.
        backend.flush(device);
        self.chain.host_texture.as_ref()
    }

    /// The host drawable without copying a new frame.
    pub fn current_frame(&self) -> Option<&H::Texture> {
        if !self.is_drawable() {
            return None;
        }
        self.chain.host_texture.as_ref()
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.phase == SessionPhase::Ready
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Size of the compositor's mirror texture; zero while not ready.
    pub fn live_extent(&self) -> Extent {
        self.live_extent
    }

    pub fn crop_rect(&self) -> CropRect {
        self.crop_rect
    }

    /// Size of the drawable: the last cropped size, or [`PLACEHOLDER_EXTENT`].
    pub fn output_extent(&self) -> Extent {
        self.output_extent
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn gate(&self) -> &Rc<RuntimeGate<B>> {
        &self.gate
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn is_drawable(&self) -> bool {
        self.phase == SessionPhase::Ready && self.state.active
    }

    fn cooling_down(&self, now: Instant) -> bool {
        self.last_failure
            .map_or(false, |at| now.saturating_duration_since(at) < ACTIVATION_COOLDOWN)
    }

    fn build_chain(&mut self) -> Result<(), CaptureError> {
        let gate = Rc::clone(&self.gate);
        let backend = gate.backend();

        self.chain.lease = Some(gate.acquire()?);
        self.state.runtime_connected = true;

        let device = &*self.chain.device.insert(backend.create_device()?);
        self.state.device_ready = true;

        let view = &*self.chain.view.insert(backend.mirror_view(device, self.config.eye)?);
        let (resource, live) = backend.mirror_resource(view)?;
        if live.is_empty() {
            return Err(CaptureError::EmptyMirrorTexture { width: live.width, height: live.height });
        }
        let resource = &*self.chain.resource.insert(resource);
        self.live_extent = live;

        let rect = self.config.crop.resolve(live);
        let crop_texture = &*self
            .chain
            .crop_texture
            .insert(backend.create_crop_texture(device, resource, rect.extent())?);
        let handle = backend.shared_handle(crop_texture)?;

        let host_texture = {
            let _scope = GraphicsScope::enter(&self.host);
            self.host.open_shared_texture(handle)
        };
        self.chain.host_texture = Some(host_texture.ok_or(CaptureError::HostOpenShared)?);
        self.state.texture_ready = true;

        self.crop_rect = rect;
        self.output_extent = rect.extent();
        Ok(())
    }

    /// Release in strict order. Keeps `state.active`, clears everything else.
    fn release_chain(&mut self) {
        if let Some(texture) = self.chain.host_texture.take() {
            let _scope = GraphicsScope::enter(&self.host);
            self.host.destroy_texture(texture);
        }
        drop(self.chain.crop_texture.take());
        drop(self.chain.resource.take());
        // Owned by the runtime; shutdown below invalidates it.
        drop(self.chain.view.take());
        if let Some(mut lease) = self.chain.lease.take() {
            lease.release();
        }
        if let Some(device) = self.chain.device.take() {
            let remaining = self.gate.backend().release_device(device);
            if remaining != 0 {
                warn!("[{}] D3D11 device refcount not zero after release ({})", self.name, remaining);
            }
        }

        self.state = SessionState { active: self.state.active, ..SessionState::default() };
        self.live_extent = Extent::ZERO;
        self.crop_rect = CropRect::default();
    }

    fn log_failure(&self, err: &CaptureError) {
        match err.severity() {
            Severity::Transient => debug!("[{}] {}", self.name, err),
            Severity::Operational => warn!("[{}] activation failed: {}", self.name, err),
            Severity::Compositor => error!("[{}] activation failed: {}", self.name, err),
        }
    }
}

impl<B: MirrorBackend, H: Host> Drop for MirrorSession<B, H> {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{rig, Call, CallLog, FailPoint, FakeHost, FakeHostTexture, FakeRuntime};
    use vrmirror_core::{CropRegion, Eye, SharedHandle};

    type TestSession = MirrorSession<FakeRuntime, FakeHost>;

    fn session() -> (TestSession, CallLog) {
        let (gate, host, log) = rig();
        host.set_active(true);
        (MirrorSession::new("test", gate, host, MirrorConfig::default()), log)
    }

    fn ready_session() -> (TestSession, CallLog) {
        let (mut session, log) = session();
        session.activate(true).expect("activation");
        session.tick();
        log.clear();
        (session, log)
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn activation_builds_chain_in_order() {
        let (mut session, log) = session();
        assert_eq!(session.activate(true).unwrap(), Activation::Started);

        assert_eq!(
            log.calls(),
            vec![
                Call::Connect,
                Call::CreateDevice,
                Call::MirrorView(Eye::Right),
                Call::MirrorResource,
                Call::CreateCropTexture(FakeRuntime::DEFAULT_EXTENT),
                Call::SharedHandle,
                Call::EnterGraphics,
                Call::OpenShared(SharedHandle(0x100)),
                Call::LeaveGraphics,
            ]
        );
        assert!(session.is_ready());
        let state = session.state();
        assert!(state.runtime_connected && state.device_ready && state.texture_ready);
        assert_eq!(session.live_extent(), FakeRuntime::DEFAULT_EXTENT);
    }

    #[test]
    fn activate_when_ready_is_a_noop() {
        let (mut session, log) = ready_session();
        assert_eq!(session.activate(true).unwrap(), Activation::AlreadyReady);
        assert!(log.is_empty());
    }

    #[test]
    fn deactivate_releases_in_strict_order() {
        let (mut session, log) = ready_session();
        session.deactivate();

        assert_eq!(
            log.calls(),
            vec![
                Call::EnterGraphics,
                Call::DestroyHostTexture,
                Call::LeaveGraphics,
                Call::DropTexture,
                Call::DropResource,
                Call::Shutdown,
                Call::ReleaseDevice,
            ]
        );
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.state(), SessionState::default());
        assert_eq!(session.live_extent(), Extent::ZERO);
        assert!(session.current_frame().is_none());
        assert!(!session.gate().is_held());
    }

    #[test]
    fn deactivate_when_idle_is_a_noop() {
        let (mut session, log) = session();
        session.deactivate();
        session.deactivate();
        assert!(log.is_empty());
        assert_eq!(session.state(), SessionState::default());
    }

    #[test]
    fn cooldown_gates_unforced_attempts() {
        let (mut session, log) = session();
        session.gate().backend().fail_at(FailPoint::Connect);
        let t0 = Instant::now();

        assert!(session.activate_at(t0, false).is_err());
        assert_eq!(log.len(), 1);

        assert_eq!(session.activate_at(t0 + secs(0.1), false).unwrap(), Activation::CoolingDown);
        assert_eq!(log.len(), 1, "no runtime calls inside cooldown");

        assert!(session.activate_at(t0 + secs(1.2), false).is_err());
        assert_eq!(log.count(&Call::Connect), 2);
    }

    #[test]
    fn forced_activation_ignores_cooldown() {
        let (mut session, log) = session();
        session.gate().backend().fail_at(FailPoint::Connect);
        let t0 = Instant::now();

        assert!(session.activate_at(t0, false).is_err());
        session.gate().backend().clear_failure();
        assert_eq!(session.activate_at(t0 + secs(0.01), true).unwrap(), Activation::Started);
        assert_eq!(log.count(&Call::Connect), 2);
    }

    #[test]
    fn runtime_unavailable_is_transient() {
        let (mut session, _log) = session();
        session.gate().backend().fail_at(FailPoint::Connect);
        let err = session.activate(true).unwrap_err();
        assert!(err.is_transient());
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[test]
    fn failure_at_any_step_releases_everything() {
        let cases = [
            (FailPoint::Device, Severity::Operational),
            (FailPoint::MirrorView, Severity::Compositor),
            (FailPoint::MirrorResource, Severity::Compositor),
            (FailPoint::EmptyTexture, Severity::Compositor),
            (FailPoint::CropTexture, Severity::Operational),
            (FailPoint::SharedHandle, Severity::Operational),
        ];

        for (point, severity) in cases {
            let (mut session, log) = session();
            session.gate().backend().fail_at(point);

            let err = session.activate(true).unwrap_err();
            assert_eq!(err.severity(), severity, "{point:?}");
            assert_eq!(session.phase(), SessionPhase::Idle, "{point:?}");
            assert!(!session.state().runtime_connected, "{point:?}");
            assert!(!session.state().texture_ready, "{point:?}");
            assert!(!session.gate().is_held(), "{point:?}");
            assert_eq!(log.count(&Call::Shutdown), 1, "{point:?}");

            let expected_device_releases = usize::from(point != FailPoint::Device);
            assert_eq!(log.count(&Call::ReleaseDevice), expected_device_releases, "{point:?}");
            assert!(
                log.last_position(&Call::Shutdown) < log.last_position(&Call::ReleaseDevice)
                    || expected_device_releases == 0,
                "{point:?}: device released before runtime shutdown"
            );
        }
    }

    #[test]
    fn host_refusing_shared_texture_aborts_activation() {
        let (mut session, log) = session();
        session.host().refuse_open(true);

        assert!(matches!(session.activate(true), Err(CaptureError::HostOpenShared)));
        assert_eq!(log.count(&Call::DropTexture), 1);
        assert_eq!(log.count(&Call::ReleaseDevice), 1);
        assert_eq!(log.count(&Call::DestroyHostTexture), 0);
        assert!(!session.is_ready());
    }

    #[test]
    fn oversized_crop_is_clamped_before_texture_creation() {
        let (gate, host, log) = rig();
        let config = MirrorConfig { eye: Eye::Right, crop: CropRegion::new(0, 2000, 0, 0) };
        let mut session = MirrorSession::new("test", gate, host, config);

        session.activate(true).unwrap();
        assert_eq!(session.crop_rect(), CropRect { x: 1919, y: 0, width: 1, height: 1080 });
        assert_eq!(log.count(&Call::CreateCropTexture(Extent::new(1, 1080))), 1);
        assert_eq!(session.output_extent(), Extent::new(1, 1080));
    }

    #[test]
    fn small_mirror_texture_clamps_configured_crop() {
        let (gate, host, log) = rig();
        gate.backend().set_extent(Extent::new(800, 600));
        let config = MirrorConfig { eye: Eye::Right, crop: CropRegion::new(100, 1000, 0, 0) };
        let mut session = MirrorSession::new("test", gate, host, config);

        session.activate(true).unwrap();
        assert_eq!(session.live_extent(), Extent::new(800, 600));
        assert_eq!(session.crop_rect(), CropRect { x: 799, y: 100, width: 1, height: 500 });
        assert_eq!(log.count(&Call::CreateCropTexture(Extent::new(1, 500))), 1);
    }

    #[test]
    fn render_copies_and_flushes_when_active() {
        let (session, log) = ready_session();

        let frame = session.render().expect("drawable");
        assert_eq!(frame, &FakeHostTexture(SharedHandle(0x100)));
        assert_eq!(
            log.calls(),
            vec![Call::CopyRegion(CropRect { x: 0, y: 0, width: 1920, height: 1080 }), Call::Flush]
        );
    }

    #[test]
    fn render_is_empty_unless_ready_and_active() {
        let (mut session, log) = session();
        assert!(session.render().is_none());

        session.activate(true).unwrap();
        session.host().set_active(false);
        session.tick();
        log.clear();
        assert!(session.render().is_none());
        assert!(session.current_frame().is_none());
        assert!(log.is_empty());
    }

    #[test]
    fn tick_retries_while_active() {
        let (mut session, log) = session();
        session.gate().backend().fail_at(FailPoint::Connect);
        let t0 = Instant::now();

        session.tick_at(t0);
        session.tick_at(t0 + secs(0.5));
        assert_eq!(log.count(&Call::Connect), 1);

        session.gate().backend().clear_failure();
        session.tick_at(t0 + secs(1.5));
        assert!(session.is_ready());
        assert!(session.render().is_some());
    }

    #[test]
    fn tick_does_not_activate_hidden_source() {
        let (mut session, log) = session();
        session.host().set_active(false);
        session.tick();
        assert!(log.is_empty());
        assert!(!session.is_ready());
    }

    #[test]
    fn quit_event_tears_down_within_the_tick() {
        let (mut session, log) = ready_session();
        session.gate().backend().push_event(RuntimeEvent::Other(7));
        session.gate().backend().push_event(RuntimeEvent::Quit);

        session.tick();
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(session.render().is_none());
        assert_eq!(log.count(&Call::Shutdown), 1);
        assert_eq!(log.count(&Call::ReleaseDevice), 1);
    }

    #[test]
    fn quit_arms_the_cooldown() {
        let (mut session, log) = ready_session();
        session.gate().backend().push_event(RuntimeEvent::Quit);
        let t0 = Instant::now();

        session.tick_at(t0);
        session.tick_at(t0 + secs(0.2));
        assert_eq!(log.count(&Call::Connect), 0);

        session.tick_at(t0 + secs(1.1));
        assert_eq!(log.count(&Call::Connect), 1);
        assert!(session.is_ready());
    }

    #[test]
    fn ordinary_events_are_drained_without_teardown() {
        let (mut session, log) = ready_session();
        session.gate().backend().push_event(RuntimeEvent::Other(1));
        session.gate().backend().push_event(RuntimeEvent::Other(2));

        session.tick();
        assert!(session.is_ready());
        assert_eq!(session.gate().backend().pending_events(), 0);
        assert!(log.is_empty());
    }

    #[test]
    fn stale_runtime_is_reinitialised() {
        let (mut session, log) = ready_session();
        session.gate().backend().set_available(false);

        session.tick();
        assert_eq!(log.count(&Call::Shutdown), 1);
        assert_eq!(log.count(&Call::Connect), 1);
        assert!(session.is_ready());
        assert!(session.state().active);
        assert!(session.render().is_some());
    }

    #[test]
    fn configure_rebuilds_ready_session() {
        let (mut session, log) = ready_session();
        session.configure(MirrorConfig { eye: Eye::Left, crop: CropRegion::new(10, 0, 10, 0) });

        assert!(session.is_ready());
        assert_eq!(log.count(&Call::Shutdown), 1);
        assert_eq!(log.count(&Call::MirrorView(Eye::Left)), 1);
        assert_eq!(session.output_extent(), Extent::new(1920, 1060));
        assert!(session.render().is_some(), "active flag survives reconfiguration");
    }

    #[test]
    fn configure_while_idle_only_stores() {
        let (mut session, log) = session();
        let config = MirrorConfig { eye: Eye::Left, crop: CropRegion::NONE };
        session.configure(config);
        assert!(log.is_empty());
        assert_eq!(session.config(), &config);
    }

    #[test]
    fn leaked_device_refs_are_reported_not_fatal() {
        let (mut session, _log) = ready_session();
        session.gate().backend().leak_refs(2);
        session.deactivate();
        assert_eq!(session.state(), SessionState::default());
        assert!(session.activate(true).is_ok());
    }

    #[test]
    fn sessions_share_one_runtime_connection() {
        let (gate, host, log) = rig();
        let mut first = MirrorSession::new("first", Rc::clone(&gate), host, MirrorConfig::default());
        let mut second = MirrorSession::new("second", Rc::clone(&gate), FakeHost::new(log.clone()), MirrorConfig::default());

        first.activate(true).unwrap();
        let err = second.activate(true).unwrap_err();
        assert!(matches!(err, CaptureError::RuntimeBusy));
        assert!(err.is_transient());
        assert_eq!(log.count(&Call::Connect), 1);
        assert_eq!(log.count(&Call::Shutdown), 0, "busy session must not shut the runtime down");

        first.deactivate();
        assert_eq!(log.count(&Call::Shutdown), 1);
        second.activate(true).unwrap();
        assert!(second.is_ready());
    }

    #[test]
    fn reset_is_debounced() {
        let (mut session, log) = ready_session();
        let t0 = Instant::now();

        assert!(session.reset_at(t0));
        assert_eq!(log.count(&Call::Connect), 1);
        assert!(!session.reset_at(t0 + secs(1.0)));
        assert_eq!(log.count(&Call::Connect), 1);
        assert!(session.reset_at(t0 + secs(2.5)));
        assert_eq!(log.count(&Call::Connect), 2);
        assert!(session.is_ready());
    }

    #[test]
    fn reset_bypasses_activation_cooldown() {
        let (mut session, _log) = session();
        session.gate().backend().fail_at(FailPoint::Connect);
        let t0 = Instant::now();

        session.tick_at(t0);
        session.gate().backend().clear_failure();
        assert!(session.reset_at(t0 + secs(0.05)));
        assert!(session.is_ready());
    }

    #[test]
    fn output_extent_survives_deactivate() {
        let (gate, host, _log) = rig();
        let config = MirrorConfig { eye: Eye::Right, crop: CropRegion::new(0, 0, 80, 920) };
        let mut session = MirrorSession::new("test", gate, host, config);
        assert_eq!(session.output_extent(), PLACEHOLDER_EXTENT);

        session.activate(true).unwrap();
        session.deactivate();
        assert_eq!(session.output_extent(), Extent::new(1000, 1000));
    }

    #[test]
    fn dropping_a_ready_session_releases_it() {
        let (session, log) = ready_session();
        let gate = Rc::clone(session.gate());
        drop(session);
        assert_eq!(log.count(&Call::Shutdown), 1);
        assert!(!gate.is_held());
    }
}
