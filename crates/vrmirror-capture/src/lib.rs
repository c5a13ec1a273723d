//! vrmirror-capture: SteamVR compositor mirror texture as a host video source.
//!
//! Connects to a running SteamVR as a background application, opens the
//! compositor's mirror texture for one eye on a private D3D11 device, crops
//! it into a shareable linear texture and hands that texture to the host's
//! own graphics device. On non-Windows targets a stub backend is compiled
//! that never connects.
//!
//! # Pipeline
//!
//! ```text
//! VR_Init(Background) ─► IVRCompositor::GetMirrorTextureD3D11(eye, aux device)
//!   │                         │  ID3D11ShaderResourceView (runtime-owned)
//!   │                         ▼
//!   │                   ID3D11Resource ── CopySubresourceRegion(crop) ──┐
//!   │                                                                   ▼
//!   │                                         ID3D11Texture2D R8G8B8A8_UNORM
//!   │                                                                   │
//!   │                                               IDXGIResource::GetSharedHandle
//!   ▼                                                                   ▼
//! PollNextEvent(Quit) ─► teardown                 host device opens the handle
//! ```

pub mod backend;
pub mod gate;
pub mod session;

pub use backend::{GraphicsScope, Host, MirrorBackend, RuntimeEvent};
pub use gate::{RuntimeGate, RuntimeLease};
pub use session::{
    Activation, MirrorSession, SessionPhase, SessionState, ACTIVATION_COOLDOWN, PLACEHOLDER_EXTENT,
    RESET_DEBOUNCE,
};

#[cfg(any(test, feature = "fake"))]
pub mod fake;

// ── Platform split ─────────────────────────────────────────────────────────────

#[cfg(target_os = "windows")]
mod steamvr;
#[cfg(target_os = "windows")]
pub use steamvr::SteamVrBackend;

#[cfg(not(target_os = "windows"))]
mod stub;
#[cfg(not(target_os = "windows"))]
pub use stub::SteamVrBackend;
