use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::library::asset::{
    AccessLevel, AssetCreationRequest, AuthorizationStatus, ResourceCreationOptions, ResourceKind,
};
use crate::library::photo_library::PhotoLibrary;
use crate::models::error::CaptureError;
use crate::models::photo::CapturedPhoto;
use crate::models::settings::{CaptureRequestId, ResolvedCaptureSettings};
use crate::models::state::ArtifactState;
use crate::traits::camera::{PhotoCaptureDelegate, PhotoOutput};
use crate::traits::thumbnail::PreserveEmbeddedThumbnail;

/// Invoked once when a capture request has fully finished, after any photo
/// library work for it has been handed off.
pub type DidFinishHandler = Box<dyn FnOnce() + Send + 'static>;

/// Capture delegate for one RAW + processed photo request.
///
/// The photo output delivers the RAW and the processed photo separately and
/// in no guaranteed order. This delegate stages the RAW container on disk,
/// holds the processed container in memory, and once the capture finishes
/// with both artifacts present, saves them to the photo library as a single
/// asset: the processed photo as the primary resource, the RAW file as its
/// alternate.
///
/// One delegate serves exactly one request; the coordinator keeps it alive
/// in its registry until `did_finish` fires.
pub struct RawCaptureDelegate {
    library: Arc<dyn PhotoLibrary>,
    staging_dir: PathBuf,
    customizer: PreserveEmbeddedThumbnail,
    state: Mutex<ArtifactState>,
    did_finish: Mutex<Option<DidFinishHandler>>,
}

impl RawCaptureDelegate {
    pub fn new(library: Arc<dyn PhotoLibrary>, staging_dir: PathBuf) -> Self {
        Self {
            library,
            staging_dir,
            customizer: PreserveEmbeddedThumbnail,
            state: Mutex::new(ArtifactState::AwaitingArtifacts),
            did_finish: Mutex::new(None),
        }
    }

    /// Install the handler fired when this request completes. Replaces any
    /// previous handler.
    pub fn set_did_finish(&self, handler: impl FnOnce() + Send + 'static) {
        *self.did_finish.lock() = Some(Box::new(handler));
    }

    fn fire_did_finish(&self) {
        if let Some(handler) = self.did_finish.lock().take() {
            handler();
        }
    }

    fn unique_dng_path(&self) -> PathBuf {
        self.staging_dir.join(format!("{}.dng", Uuid::new_v4()))
    }

    /// Hand both artifacts to the photo library as one asset.
    ///
    /// Authorization and the change itself run asynchronously; failures
    /// beyond this point are logged, not propagated.
    fn save_asset(&self, raw_file: PathBuf, compressed: Vec<u8>, request_id: CaptureRequestId) {
        let mut request = AssetCreationRequest::new();
        request.add_resource_data(
            ResourceKind::Photo,
            compressed,
            ResourceCreationOptions::default(),
        );
        request.add_resource_file(
            ResourceKind::AlternatePhoto,
            raw_file,
            ResourceCreationOptions {
                should_move_file: true,
                ..Default::default()
            },
        );

        let library = Arc::clone(&self.library);
        self.library.request_authorization(
            AccessLevel::AddOnly,
            Box::new(move |status| {
                if status != AuthorizationStatus::Authorized {
                    log::warn!(
                        "Photo library access was not granted; dropping capture {}",
                        request_id
                    );
                    return;
                }
                library.perform_changes(
                    request,
                    Box::new(move |result| match result {
                        Ok(asset_id) => {
                            log::info!("Saved capture {} as asset {}", request_id, asset_id)
                        }
                        Err(e) => log::error!(
                            "Error saving capture {} to the photo library: {}",
                            request_id,
                            e
                        ),
                    }),
                );
            }),
        );
    }
}

impl PhotoCaptureDelegate for RawCaptureDelegate {
    fn on_photo_processed(
        &self,
        output: &dyn PhotoOutput,
        photo: CapturedPhoto,
        error: Option<CaptureError>,
    ) {
        if let Some(error) = error {
            log::error!("Error capturing photo: {}", error);
            return;
        }
        let request_id = photo.request_id;
        let Some(data) = output.file_data_representation(&photo, &self.customizer) else {
            log::error!("No data representation for photo of request {}", request_id);
            return;
        };

        if photo.is_raw_photo() {
            // The lock spans the staged write so a concurrent finish cannot
            // orphan the file between the check and the record.
            let mut state = self.state.lock();
            if state.is_finalized() {
                log::warn!("RAW photo for request {} arrived after the capture finished", request_id);
                return;
            }
            let path = self.unique_dng_path();
            if let Err(e) = fs::write(&path, &data) {
                // A capture whose RAW bytes cannot even be staged is
                // unrecoverable for this app.
                panic!("couldn't write DNG file to {}: {}", path.display(), e);
            }
            log::debug!("Staged RAW photo for request {} at {}", request_id, path.display());
            state.record_raw_file(path);
        } else {
            let mut state = self.state.lock();
            if state.is_finalized() {
                log::warn!(
                    "Processed photo for request {} arrived after the capture finished",
                    request_id
                );
                return;
            }
            state.record_compressed(data);
        }
    }

    fn on_capture_finished(
        &self,
        _output: &dyn PhotoOutput,
        settings: &ResolvedCaptureSettings,
        error: Option<CaptureError>,
    ) {
        // Finalize first so late deliveries can no longer mutate the state.
        let accumulated = self.state.lock().finalize();

        if let Some(error) = error {
            log::error!("Error capturing photo: {}", error);
            self.fire_did_finish();
            return;
        }

        match accumulated {
            ArtifactState::Both { raw_file, compressed } => {
                self.save_asset(raw_file, compressed, settings.id);
            }
            other => {
                log::error!(
                    "The expected photo data isn't available for request {} ({:?})",
                    settings.id,
                    other
                );
            }
        }
        self.fire_did_finish();
    }
}
