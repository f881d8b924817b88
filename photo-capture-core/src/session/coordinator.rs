use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::library::photo_library::PhotoLibrary;
use crate::models::camera_models::{SessionPreset, SurfaceBounds};
use crate::models::config::CoordinatorConfig;
use crate::models::error::CaptureError;
use crate::models::formats::ProcessedCodec;
use crate::models::settings::{CaptureRequestId, PhotoCaptureSettings};
use crate::session::camera_session::{CameraSession, DeviceInput, PreviewSurface};
use crate::session::delegate::RawCaptureDelegate;
use crate::sharing::exporter;
use crate::sharing::presenter::SharePresenter;
use crate::traits::camera::{PhotoCaptureDelegate, PhotoOutput, VideoDevice};

/// Notified with the request id each time a capture request fully finishes.
pub type CaptureObserver = Arc<dyn Fn(CaptureRequestId) + Send + Sync + 'static>;

/// Owner of the capture session and of every in-flight capture request.
///
/// The coordinator wires a camera device and a photo output into a session,
/// runs the preview, and triggers RAW + processed captures. Each trigger
/// allocates a [`RawCaptureDelegate`] kept alive in a registry keyed by
/// request id; the photo output only holds the delegate weakly, so dropping
/// the registry entry ends the request's lifetime.
pub struct CaptureCoordinator<O: PhotoOutput + 'static> {
    session: CameraSession,
    output: Arc<O>,
    library: Arc<dyn PhotoLibrary>,
    config: CoordinatorConfig,
    preview: Mutex<PreviewSurface>,
    delegates: Arc<Mutex<HashMap<CaptureRequestId, Arc<RawCaptureDelegate>>>>,
    capture_observer: Mutex<Option<CaptureObserver>>,
}

impl<O: PhotoOutput + 'static> CaptureCoordinator<O> {
    /// Configure a photo session around `device` and `output`.
    ///
    /// With no device available the session is still committed with the
    /// photo preset, a warning is logged, and the coordinator comes up
    /// without attached IO.
    pub fn new(
        device: Option<Arc<dyn VideoDevice>>,
        output: Arc<O>,
        library: Arc<dyn PhotoLibrary>,
        config: CoordinatorConfig,
    ) -> Result<Self, CaptureError> {
        let session = CameraSession::new();
        session.begin_configuration()?;
        session.set_preset(SessionPreset::Photo);
        let attached = match device {
            Some(device) => Self::attach_io(&session, device, output.clone()),
            None => {
                log::warn!("Unable to access a back camera; starting without attached IO");
                Ok(())
            }
        };
        // The configuration block is closed even when attachment failed, so
        // the session never leaks an open block.
        session.commit_configuration()?;
        attached?;

        Ok(Self {
            session,
            output,
            library,
            config,
            preview: Mutex::new(PreviewSurface::new()),
            delegates: Arc::new(Mutex::new(HashMap::new())),
            capture_observer: Mutex::new(None),
        })
    }

    fn attach_io(
        session: &CameraSession,
        device: Arc<dyn VideoDevice>,
        output: Arc<dyn PhotoOutput>,
    ) -> Result<(), CaptureError> {
        let input = DeviceInput::new(device)?;
        if !session.can_add_input(&input) {
            return Err(CaptureError::SetupFailed(
                "unable to attach the video input".into(),
            ));
        }
        session.add_input(input)?;
        if !session.can_add_output() {
            return Err(CaptureError::SetupFailed(
                "unable to attach the photo output".into(),
            ));
        }
        session.add_output(output)?;
        Ok(())
    }

    /// Start the session and aim the preview at `bounds`.
    ///
    /// Empty bounds are tolerated: the preview simply has no visible frame
    /// until the hosting view reports a real size.
    pub fn start_preview(&self, bounds: SurfaceBounds) -> Result<(), CaptureError> {
        self.session.start_running()?;
        let mut preview = self.preview.lock();
        if bounds.is_empty() {
            log::warn!(
                "Preview surface has no visible area yet ({}x{})",
                bounds.width,
                bounds.height
            );
            preview.frame = None;
        } else {
            preview.frame = Some(bounds);
        }
        Ok(())
    }

    /// Stop the session and drop the preview frame.
    pub fn stop_preview(&self) -> Result<(), CaptureError> {
        self.session.stop_running()?;
        self.preview.lock().frame = None;
        Ok(())
    }

    pub fn preview_surface(&self) -> PreviewSurface {
        self.preview.lock().clone()
    }

    /// Trigger one RAW + processed capture.
    ///
    /// Picks the first Bayer RAW format the output advertises, pairs it with
    /// a JPEG processed photo, registers a delegate for the request, and
    /// dispatches it to the output. The returned id stays in
    /// [`in_flight_captures`](Self::in_flight_captures) until the request
    /// finishes.
    ///
    /// # Panics
    ///
    /// Panics when the output advertises no Bayer RAW format. A camera
    /// whose output cannot produce RAW captures is a configuration this
    /// pipeline does not support.
    pub fn take_photo(&self) -> Result<CaptureRequestId, CaptureError> {
        if !self.session.is_running() {
            return Err(CaptureError::SessionNotRunning);
        }
        let format = self
            .output
            .available_raw_formats()
            .into_iter()
            .find(|f| f.is_bayer())
            .expect("no Bayer RAW format available on this photo output");
        let settings = PhotoCaptureSettings::raw_with_processed(format, ProcessedCodec::Jpeg);
        let request_id = settings.id;

        let delegate = Arc::new(RawCaptureDelegate::new(
            Arc::clone(&self.library),
            self.config.staging_dir.clone(),
        ));
        let delegates = Arc::clone(&self.delegates);
        let observer = self.capture_observer.lock().clone();
        delegate.set_did_finish(move || {
            delegates.lock().remove(&request_id);
            if let Some(observer) = observer {
                observer(request_id);
            }
        });

        // The registry holds the only strong reference for the lifetime of
        // the request; the output observes the delegate weakly.
        self.delegates
            .lock()
            .insert(request_id, Arc::clone(&delegate));
        let weak = Arc::downgrade(&delegate) as Weak<dyn PhotoCaptureDelegate>;
        if let Err(e) = self.output.capture_photo(&settings, weak) {
            self.delegates.lock().remove(&request_id);
            return Err(e);
        }
        log::debug!("Capture request {} dispatched", request_id);
        Ok(request_id)
    }

    /// Ids of capture requests still waiting to finish, ascending.
    pub fn in_flight_captures(&self) -> Vec<CaptureRequestId> {
        let mut ids: Vec<_> = self.delegates.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Install an observer notified whenever a capture request finishes.
    pub fn set_capture_observer(
        &self,
        observer: impl Fn(CaptureRequestId) + Send + Sync + 'static,
    ) {
        *self.capture_observer.lock() = Some(Arc::new(observer));
    }

    /// Export the newest RAW asset and hand it to `presenter`.
    pub fn share_latest_raw(&self, presenter: &Arc<dyn SharePresenter>) {
        exporter::share_latest_raw(&self.library, &self.config.export_dir, presenter);
    }

    pub fn session(&self) -> &CameraSession {
        &self.session
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }
}
