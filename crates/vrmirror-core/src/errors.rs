use thiserror::Error;

use crate::types::Eye;

/// How a failed activation step should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Runtime not running (or held by another source). Retry after cooldown.
    Transient,
    /// A GPU or texture-sharing call failed.
    Operational,
    /// The compositor handed back nothing usable: runtime or driver problem.
    Compositor,
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("VR runtime not available: {reason}")]
    RuntimeUnavailable { reason: String },

    #[error("VR runtime connection is held by another source")]
    RuntimeBusy,

    #[error("D3D11 device creation failed: {reason}")]
    DeviceCreation { reason: String },

    #[error("Compositor returned no mirror texture for the {eye} eye: {reason}")]
    MirrorTexture { eye: Eye, reason: String },

    #[error("Mirror texture resource query failed: {reason}")]
    MirrorResource { reason: String },

    #[error("Mirror texture is empty ({width}x{height})")]
    EmptyMirrorTexture { width: u32, height: u32 },

    #[error("Cropped texture creation failed: {reason}")]
    TextureCreation { reason: String },

    #[error("Shared handle unavailable: {reason}")]
    SharedHandle { reason: String },

    #[error("Host could not open the shared texture")]
    HostOpenShared,
}

impl CaptureError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::RuntimeUnavailable { .. } | Self::RuntimeBusy => Severity::Transient,
            Self::MirrorTexture { .. }
            | Self::MirrorResource { .. }
            | Self::EmptyMirrorTexture { .. } => Severity::Compositor,
            Self::DeviceCreation { .. }
            | Self::TextureCreation { .. }
            | Self::SharedHandle { .. }
            | Self::HostOpenShared => Severity::Operational,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.severity() == Severity::Transient
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PresetError {
    #[error("line {line}: expected `top,bottom,left,right,name`")]
    MissingField { line: usize },

    #[error("line {line}: `{value}` is not a pixel offset")]
    InvalidOffset { line: usize, value: String },

    #[error("line {line}: preset name is empty")]
    EmptyName { line: usize },
}
