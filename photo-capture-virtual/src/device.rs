//! Virtual camera device.
//!
//! Stands in for a real camera module so the capture pipeline can run on
//! machines without one. The device is always connected and sits at the
//! back position, like the rear module of a phone.

use photo_capture_core::models::camera_models::{DevicePosition, VideoDeviceInfo};
use photo_capture_core::models::error::CaptureError;
use photo_capture_core::traits::camera::VideoDevice;

/// The synthetic back camera.
#[derive(Debug, Clone)]
pub struct VirtualVideoDevice {
    info: VideoDeviceInfo,
}

impl VirtualVideoDevice {
    /// The default (and only) camera of this backend.
    pub fn default_device() -> Result<Self, CaptureError> {
        Ok(Self {
            info: VideoDeviceInfo {
                id: "virtual-back-0".into(),
                name: "Virtual Back Camera".into(),
                position: DevicePosition::Back,
            },
        })
    }

    /// All cameras this backend exposes.
    pub fn list_devices() -> Vec<VideoDeviceInfo> {
        VirtualVideoDevice::default_device()
            .map(|d| vec![d.info()])
            .unwrap_or_default()
    }
}

impl VideoDevice for VirtualVideoDevice {
    fn info(&self) -> VideoDeviceInfo {
        self.info.clone()
    }

    fn is_connected(&self) -> bool {
        true
    }
}
