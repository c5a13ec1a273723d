use serde::{Deserialize, Serialize};

// MARK: - Eye

/// Which half of the compositor's stereo mirror texture is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub fn from_right_eye(right_eye: bool) -> Self {
        if right_eye { Self::Right } else { Self::Left }
    }
}

impl std::fmt::Display for Eye {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

// MARK: - Extent

/// Width × height of a GPU texture in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const ZERO: Self = Self { width: 0, height: 0 };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Extent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}×{}", self.width, self.height)
    }
}

// MARK: - CropRegion

/// Pixel offsets trimmed inward from each edge of the mirror texture.
///
/// Values may be larger than the live texture; [`CropRegion::resolve`]
/// clamps them so the result is never smaller than one pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropRegion {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

impl CropRegion {
    pub const NONE: Self = Self { top: 0, left: 0, bottom: 0, right: 0 };

    pub const fn new(top: u32, left: u32, bottom: u32, right: u32) -> Self {
        Self { top, left, bottom, right }
    }

    /// Same region seen from the other eye: left and right edges swap.
    pub fn mirrored(&self) -> Self {
        Self { left: self.right, right: self.left, ..*self }
    }

    /// Compute the copy rectangle for a live texture of size `live`.
    ///
    /// The origin is clamped into the texture first, then the far edges are
    /// clamped against whatever remains, so `width` and `height` stay in
    /// `1..=remaining` whatever the requested offsets are. `live` must not be
    /// empty; an empty extent yields an empty rectangle.
    pub fn resolve(&self, live: Extent) -> CropRect {
        if live.is_empty() {
            return CropRect::default();
        }

        let x = self.left.min(live.width - 1);
        let y = self.top.min(live.height - 1);
        let remaining_width = live.width - x;
        let remaining_height = live.height - y;

        CropRect {
            x,
            y,
            width: remaining_width - self.right.min(remaining_width - 1),
            height: remaining_height - self.bottom.min(remaining_height - 1),
        }
    }
}

// MARK: - CropRect

/// Source rectangle copied out of the mirror texture every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn extent(&self) -> Extent {
        Extent::new(self.width, self.height)
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

// MARK: - SharedHandle

/// Cross-process texture handle value (a DXGI shared handle on Windows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SharedHandle(pub u64);
