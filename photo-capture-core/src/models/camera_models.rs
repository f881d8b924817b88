/// Physical position of a camera on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DevicePosition {
    Back,
    Front,
    Unspecified,
}

/// A video capture device available to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDeviceInfo {
    pub id: String,
    pub name: String,
    pub position: DevicePosition,
}

/// Quality preset applied to a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPreset {
    /// High-quality video output.
    High,
    /// Full-resolution photo capture.
    Photo,
}

/// How preview video is fitted into its surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoGravity {
    /// Preserve aspect ratio, fit within the surface.
    ResizeAspect,
    /// Preserve aspect ratio, fill the surface (may crop).
    ResizeAspectFill,
    /// Stretch to the surface bounds.
    Resize,
}

/// Rotation applied to preview video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoOrientation {
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

/// Pixel bounds of a preview surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceBounds {
    pub width: u32,
    pub height: u32,
}

impl SurfaceBounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
