use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::camera_models::{
    SessionPreset, SurfaceBounds, VideoDeviceInfo, VideoGravity, VideoOrientation,
};
use crate::models::error::CaptureError;
use crate::traits::camera::{PhotoOutput, VideoDevice};

/// A video device wrapped for attachment to a session.
pub struct DeviceInput {
    device: Arc<dyn VideoDevice>,
}

impl DeviceInput {
    /// Wrap `device` as a session input.
    ///
    /// Fails when the device is no longer connected.
    pub fn new(device: Arc<dyn VideoDevice>) -> Result<Self, CaptureError> {
        if !device.is_connected() {
            return Err(CaptureError::SetupFailed(format!(
                "device is not connected: {}",
                device.info().name
            )));
        }
        Ok(Self { device })
    }

    pub fn device(&self) -> &Arc<dyn VideoDevice> {
        &self.device
    }
}

/// Surface mirroring the session's video feed for on-screen preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSurface {
    pub gravity: VideoGravity,
    pub orientation: VideoOrientation,
    /// Visible bounds, set once the hosting view has laid out.
    pub frame: Option<SurfaceBounds>,
}

impl PreviewSurface {
    pub fn new() -> Self {
        Self {
            gravity: VideoGravity::ResizeAspect,
            orientation: VideoOrientation::Portrait,
            frame: None,
        }
    }
}

impl Default for PreviewSurface {
    fn default() -> Self {
        Self::new()
    }
}

/// Changes staged between `begin_configuration` and `commit_configuration`.
#[derive(Default)]
struct PendingChanges {
    preset: Option<SessionPreset>,
    input: Option<DeviceInput>,
    output: Option<Arc<dyn PhotoOutput>>,
}

struct SessionInner {
    preset: SessionPreset,
    input: Option<DeviceInput>,
    output: Option<Arc<dyn PhotoOutput>>,
    running: bool,
    /// `Some` while a configuration block is open.
    pending: Option<PendingChanges>,
}

/// Camera capture session holding at most one video input and one photo
/// output.
///
/// Configuration changes are bracketed: stage them between
/// `begin_configuration` and `commit_configuration`, and they become visible
/// atomically at the commit. Capacity violations and bracketing mistakes
/// surface as `SetupFailed` and leave the session consistent.
pub struct CameraSession {
    inner: Mutex<SessionInner>,
}

impl CameraSession {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SessionInner {
                preset: SessionPreset::High,
                input: None,
                output: None,
                running: false,
                pending: None,
            }),
        }
    }

    /// Open a configuration block.
    pub fn begin_configuration(&self) -> Result<(), CaptureError> {
        let mut inner = self.inner.lock();
        if inner.pending.is_some() {
            return Err(CaptureError::SetupFailed(
                "configuration already in progress".into(),
            ));
        }
        inner.pending = Some(PendingChanges::default());
        Ok(())
    }

    /// Apply all staged changes and close the configuration block.
    pub fn commit_configuration(&self) -> Result<(), CaptureError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let Some(pending) = inner.pending.take() else {
            return Err(CaptureError::SetupFailed(
                "no configuration in progress".into(),
            ));
        };
        if let Some(preset) = pending.preset {
            inner.preset = preset;
        }
        if let Some(input) = pending.input {
            inner.input = Some(input);
        }
        if let Some(output) = pending.output {
            inner.output = Some(output);
        }
        Ok(())
    }

    /// Set the session preset. Staged when a configuration block is open,
    /// immediate otherwise.
    pub fn set_preset(&self, preset: SessionPreset) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        match inner.pending.as_mut() {
            Some(pending) => pending.preset = Some(preset),
            None => inner.preset = preset,
        }
    }

    pub fn preset(&self) -> SessionPreset {
        self.inner.lock().preset
    }

    /// Whether `input` could be attached right now.
    pub fn can_add_input(&self, input: &DeviceInput) -> bool {
        if !input.device().is_connected() {
            return false;
        }
        let inner = self.inner.lock();
        let staged = inner
            .pending
            .as_ref()
            .map(|p| p.input.is_some())
            .unwrap_or(false);
        inner.input.is_none() && !staged
    }

    /// Stage `input` for attachment. Requires an open configuration block
    /// and a free input slot.
    pub fn add_input(&self, input: DeviceInput) -> Result<(), CaptureError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let Some(pending) = inner.pending.as_mut() else {
            return Err(CaptureError::SetupFailed(
                "no configuration in progress".into(),
            ));
        };
        if inner.input.is_some() || pending.input.is_some() {
            return Err(CaptureError::SetupFailed(
                "session already has a video input".into(),
            ));
        }
        pending.input = Some(input);
        Ok(())
    }

    /// Whether a photo output could be attached right now.
    pub fn can_add_output(&self) -> bool {
        let inner = self.inner.lock();
        let staged = inner
            .pending
            .as_ref()
            .map(|p| p.output.is_some())
            .unwrap_or(false);
        inner.output.is_none() && !staged
    }

    /// Stage a photo output for attachment. Requires an open configuration
    /// block and a free output slot.
    pub fn add_output(&self, output: Arc<dyn PhotoOutput>) -> Result<(), CaptureError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let Some(pending) = inner.pending.as_mut() else {
            return Err(CaptureError::SetupFailed(
                "no configuration in progress".into(),
            ));
        };
        if inner.output.is_some() || pending.output.is_some() {
            return Err(CaptureError::SetupFailed(
                "session already has a photo output".into(),
            ));
        }
        pending.output = Some(output);
        Ok(())
    }

    pub fn start_running(&self) -> Result<(), CaptureError> {
        let mut inner = self.inner.lock();
        if inner.running {
            return Err(CaptureError::SetupFailed("session is already running".into()));
        }
        inner.running = true;
        log::debug!("Capture session started (preset: {:?})", inner.preset);
        Ok(())
    }

    pub fn stop_running(&self) -> Result<(), CaptureError> {
        let mut inner = self.inner.lock();
        if !inner.running {
            return Err(CaptureError::SessionNotRunning);
        }
        inner.running = false;
        log::debug!("Capture session stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    pub fn is_configuring(&self) -> bool {
        self.inner.lock().pending.is_some()
    }

    /// Info of the attached input device, if any.
    pub fn input_device(&self) -> Option<VideoDeviceInfo> {
        self.inner.lock().input.as_ref().map(|i| i.device().info())
    }

    pub fn has_output(&self) -> bool {
        self.inner.lock().output.is_some()
    }
}

impl Default for CameraSession {
    fn default() -> Self {
        Self::new()
    }
}
