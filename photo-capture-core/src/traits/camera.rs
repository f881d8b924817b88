use std::sync::Weak;

use crate::models::camera_models::VideoDeviceInfo;
use crate::models::error::CaptureError;
use crate::models::formats::RawPixelFormat;
use crate::models::photo::CapturedPhoto;
use crate::models::settings::{PhotoCaptureSettings, ResolvedCaptureSettings};
use crate::traits::thumbnail::ThumbnailCustomizer;

/// A camera device that can be attached to a capture session.
pub trait VideoDevice: Send + Sync {
    /// Identifying information about this device.
    fn info(&self) -> VideoDeviceInfo;

    /// Whether the device is currently connected and usable.
    fn is_connected(&self) -> bool;
}

/// Event sink for a single in-flight capture request.
///
/// All methods are called from the output's delivery thread, not the UI
/// thread. Implementations should marshal to the UI thread if needed.
/// Per request, photo deliveries arrive first (one per artifact, RAW and
/// processed in either order) and `on_capture_finished` arrives exactly once
/// after them.
pub trait PhotoCaptureDelegate: Send + Sync {
    /// Called when the output has finished processing one photo.
    ///
    /// `error` set means the delivery failed and `photo` carries no usable
    /// data beyond its identity.
    fn on_photo_processed(
        &self,
        output: &dyn PhotoOutput,
        photo: CapturedPhoto,
        error: Option<CaptureError>,
    );

    /// Called once when the whole capture request has finished.
    fn on_capture_finished(
        &self,
        output: &dyn PhotoOutput,
        settings: &ResolvedCaptureSettings,
        error: Option<CaptureError>,
    );
}

/// Interface for platform-specific photo outputs.
///
/// Implemented by backends that own the actual camera pipeline. The core
/// talks to the output for three things: format discovery, triggering a
/// capture, and flattening delivered photos into container bytes.
pub trait PhotoOutput: Send + Sync {
    /// RAW pixel formats this output can deliver, in preference order.
    fn available_raw_formats(&self) -> Vec<RawPixelFormat>;

    /// Begin an asynchronous capture for `settings`.
    ///
    /// Events are delivered to `delegate` from a background thread. The
    /// output holds only the weak reference; if the delegate is dropped
    /// mid-capture the remaining events are discarded.
    fn capture_photo(
        &self,
        settings: &PhotoCaptureSettings,
        delegate: Weak<dyn PhotoCaptureDelegate>,
    ) -> Result<(), CaptureError>;

    /// Flatten `photo` into its container bytes (DNG for RAW payloads, the
    /// processed codec otherwise), consulting `customizer` for the embedded
    /// thumbnail. Returns `None` when no container could be produced.
    fn file_data_representation(
        &self,
        photo: &CapturedPhoto,
        customizer: &dyn ThumbnailCustomizer,
    ) -> Option<Vec<u8>>;
}
