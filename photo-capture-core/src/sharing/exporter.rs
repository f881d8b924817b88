use std::path::Path;
use std::sync::Arc;

use crate::library::asset::{AccessLevel, AuthorizationStatus};
use crate::library::photo_library::{PhotoLibrary, ResourceRequestOptions};

use super::presenter::{ShareCompletion, SharePresenter, ShareRequest, ShareTarget};

/// Share the newest RAW capture in the photo library.
///
/// Resolves library authorization first (prompting when undetermined), then
/// exports the RAW resource of the newest image asset into `export_dir` and
/// hands the exported file to `presenter`. Every reason not to share (no
/// access, empty library, newest asset has no RAW resource) is a logged
/// no-op, never an error surfaced to the caller.
pub fn share_latest_raw(
    library: &Arc<dyn PhotoLibrary>,
    export_dir: &Path,
    presenter: &Arc<dyn SharePresenter>,
) {
    match library.authorization_status(AccessLevel::AddOnly) {
        AuthorizationStatus::Authorized => export_and_present(library, export_dir, presenter),
        AuthorizationStatus::NotDetermined => {
            let callback_library = Arc::clone(library);
            let export_dir = export_dir.to_path_buf();
            let callback_presenter = Arc::clone(presenter);
            library.request_authorization(
                AccessLevel::AddOnly,
                Box::new(move |status| {
                    if status == AuthorizationStatus::Authorized {
                        export_and_present(&callback_library, &export_dir, &callback_presenter);
                    } else {
                        log::warn!("Photo library access was not granted; nothing to share");
                    }
                }),
            );
        }
        AuthorizationStatus::Denied => {
            log::warn!("Photo library access is denied; nothing to share");
        }
    }
}

fn export_and_present(
    library: &Arc<dyn PhotoLibrary>,
    export_dir: &Path,
    presenter: &Arc<dyn SharePresenter>,
) {
    let assets = match library.fetch_image_assets() {
        Ok(assets) => assets,
        Err(e) => {
            log::error!("Error fetching assets to share: {}", e);
            return;
        }
    };
    // Records come back sorted by creation date, so the newest is last.
    let Some(newest) = assets.last().cloned() else {
        log::debug!("The photo library holds no image assets; nothing to share");
        return;
    };
    let resources = match library.asset_resources(&newest) {
        Ok(resources) => resources,
        Err(e) => {
            log::error!("Error loading resources of asset {}: {}", newest.id, e);
            return;
        }
    };
    let Some(raw) = resources
        .into_iter()
        .find(|r| r.type_identifier.contains("raw"))
    else {
        log::debug!("Newest asset {} carries no RAW resource; nothing to share", newest.id);
        return;
    };

    let destination = export_dir.join(&raw.original_filename);
    // RAW originals may live off-device; allow the library to pull them.
    let options = ResourceRequestOptions {
        network_access_allowed: true,
    };
    let presenter = Arc::clone(presenter);
    let export_path = destination.clone();
    library.write_resource_data(
        &raw,
        &export_path,
        &options,
        Box::new(move |result| match result {
            Ok(()) => {
                log::info!("Exported RAW resource to {}", destination.display());
                let request = ShareRequest {
                    items: vec![destination],
                    excluded_targets: vec![
                        ShareTarget::EbookReader,
                        ShareTarget::PdfMarkup,
                        ShareTarget::PhotoLibraryImport,
                    ],
                };
                let dismisser = Arc::clone(&presenter);
                let completion: ShareCompletion = Box::new(move || dismisser.dismiss());
                presenter.present(request, completion);
            }
            Err(e) => log::error!("Error exporting RAW resource for sharing: {}", e),
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use crate::library::asset::{
        AssetCreationRequest, AssetId, AssetRecord, AssetResource, MediaKind, ResourceKind,
    };
    use crate::library::photo_library::{
        AuthorizationHandler, ChangeCompletion, ResourceDataCompletion,
    };
    use crate::models::error::CaptureError;

    /// Library fake with a fixed asset listing and a synchronous export
    /// path that records what was requested.
    struct ScriptedLibrary {
        status: AuthorizationStatus,
        grants_on_request: bool,
        assets: Vec<AssetRecord>,
        resources_by_asset: HashMap<AssetId, Vec<AssetResource>>,
        exports: Mutex<Vec<(String, PathBuf, bool)>>,
    }

    impl ScriptedLibrary {
        fn authorized() -> Self {
            Self {
                status: AuthorizationStatus::Authorized,
                grants_on_request: false,
                assets: Vec::new(),
                resources_by_asset: HashMap::new(),
                exports: Mutex::new(Vec::new()),
            }
        }

        fn add_asset(&mut self, id: &str, created_at: &str, resources: Vec<AssetResource>) {
            self.assets.push(AssetRecord {
                id: AssetId(id.into()),
                created_at: created_at.into(),
                media_kind: MediaKind::Image,
            });
            self.resources_by_asset.insert(AssetId(id.into()), resources);
        }
    }

    impl PhotoLibrary for ScriptedLibrary {
        fn authorization_status(&self, _access: AccessLevel) -> AuthorizationStatus {
            self.status
        }

        fn request_authorization(&self, _access: AccessLevel, handler: AuthorizationHandler) {
            handler(if self.grants_on_request {
                AuthorizationStatus::Authorized
            } else {
                AuthorizationStatus::Denied
            });
        }

        fn perform_changes(&self, _request: AssetCreationRequest, completion: ChangeCompletion) {
            completion(Err(CaptureError::StorageError("read-only fake".into())));
        }

        fn fetch_image_assets(&self) -> Result<Vec<AssetRecord>, CaptureError> {
            Ok(self.assets.clone())
        }

        fn asset_resources(&self, asset: &AssetRecord) -> Result<Vec<AssetResource>, CaptureError> {
            Ok(self
                .resources_by_asset
                .get(&asset.id)
                .cloned()
                .unwrap_or_default())
        }

        fn write_resource_data(
            &self,
            resource: &AssetResource,
            destination: &Path,
            options: &ResourceRequestOptions,
            completion: ResourceDataCompletion,
        ) {
            self.exports.lock().push((
                resource.file_name.clone(),
                destination.to_path_buf(),
                options.network_access_allowed,
            ));
            completion(Ok(()));
        }

        fn delete_asset(&self, _id: &AssetId) -> Result<(), CaptureError> {
            Ok(())
        }
    }

    struct RecordingPresenter {
        presented: Mutex<Vec<ShareRequest>>,
        dismissed: AtomicUsize,
    }

    impl RecordingPresenter {
        fn new() -> Self {
            Self {
                presented: Mutex::new(Vec::new()),
                dismissed: AtomicUsize::new(0),
            }
        }
    }

    impl SharePresenter for RecordingPresenter {
        fn present(&self, request: ShareRequest, completion: ShareCompletion) {
            self.presented.lock().push(request);
            completion();
        }

        fn dismiss(&self) {
            self.dismissed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn resource(asset_id: &str, file_name: &str, type_identifier: &str) -> AssetResource {
        AssetResource {
            asset_id: AssetId(asset_id.into()),
            kind: if type_identifier.contains("raw") {
                ResourceKind::AlternatePhoto
            } else {
                ResourceKind::Photo
            },
            type_identifier: type_identifier.into(),
            original_filename: file_name.into(),
            file_name: file_name.into(),
            byte_count: 128,
            checksum: "00".repeat(32),
        }
    }

    fn share(
        library: ScriptedLibrary,
    ) -> (Arc<ScriptedLibrary>, Arc<RecordingPresenter>) {
        let library = Arc::new(library);
        let presenter = Arc::new(RecordingPresenter::new());
        let dyn_library: Arc<dyn PhotoLibrary> = library.clone();
        let dyn_presenter: Arc<dyn SharePresenter> = presenter.clone();
        share_latest_raw(&dyn_library, Path::new("/tmp/raw-exports"), &dyn_presenter);
        (library, presenter)
    }

    #[test]
    fn empty_library_shares_nothing() {
        let (library, presenter) = share(ScriptedLibrary::authorized());
        assert!(library.exports.lock().is_empty());
        assert!(presenter.presented.lock().is_empty());
    }

    #[test]
    fn newest_raw_asset_is_exported_and_presented() {
        let mut scripted = ScriptedLibrary::authorized();
        scripted.add_asset(
            "older",
            "2025-08-01T09:00:00+00:00",
            vec![
                resource("older", "IMG_0001.jpg", "public.jpeg"),
                resource("older", "IMG_0001.dng", "com.adobe.raw-image"),
            ],
        );
        scripted.add_asset(
            "newer",
            "2025-08-02T09:00:00+00:00",
            vec![
                resource("newer", "IMG_0002.jpg", "public.jpeg"),
                resource("newer", "IMG_0002.dng", "com.adobe.raw-image"),
            ],
        );

        let (library, presenter) = share(scripted);

        let exports = library.exports.lock();
        assert_eq!(exports.len(), 1);
        let (file_name, destination, network_allowed) = &exports[0];
        assert_eq!(file_name, "IMG_0002.dng");
        assert_eq!(destination, &PathBuf::from("/tmp/raw-exports/IMG_0002.dng"));
        assert!(*network_allowed);

        let presented = presenter.presented.lock();
        assert_eq!(presented.len(), 1);
        assert_eq!(presented[0].items, vec![PathBuf::from("/tmp/raw-exports/IMG_0002.dng")]);
        assert_eq!(
            presented[0].excluded_targets,
            vec![
                ShareTarget::EbookReader,
                ShareTarget::PdfMarkup,
                ShareTarget::PhotoLibraryImport,
            ]
        );
        assert_eq!(presenter.dismissed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn asset_without_raw_resource_is_skipped() {
        let mut scripted = ScriptedLibrary::authorized();
        scripted.add_asset(
            "jpeg-only",
            "2025-08-01T09:00:00+00:00",
            vec![resource("jpeg-only", "IMG_0001.jpg", "public.jpeg")],
        );

        let (library, presenter) = share(scripted);
        assert!(library.exports.lock().is_empty());
        assert!(presenter.presented.lock().is_empty());
    }

    #[test]
    fn denied_access_shares_nothing() {
        let mut scripted = ScriptedLibrary::authorized();
        scripted.status = AuthorizationStatus::Denied;
        scripted.add_asset(
            "hidden",
            "2025-08-01T09:00:00+00:00",
            vec![resource("hidden", "IMG_0001.dng", "com.adobe.raw-image")],
        );

        let (library, presenter) = share(scripted);
        assert!(library.exports.lock().is_empty());
        assert!(presenter.presented.lock().is_empty());
    }

    #[test]
    fn undetermined_access_prompts_then_shares() {
        let mut scripted = ScriptedLibrary::authorized();
        scripted.status = AuthorizationStatus::NotDetermined;
        scripted.grants_on_request = true;
        scripted.add_asset(
            "fresh",
            "2025-08-01T09:00:00+00:00",
            vec![resource("fresh", "IMG_0001.dng", "com.adobe.raw-image")],
        );

        let (library, presenter) = share(scripted);
        assert_eq!(library.exports.lock().len(), 1);
        assert_eq!(presenter.presented.lock().len(), 1);
    }

    #[test]
    fn undetermined_access_denied_at_prompt_stays_silent() {
        let mut scripted = ScriptedLibrary::authorized();
        scripted.status = AuthorizationStatus::NotDetermined;
        scripted.grants_on_request = false;
        scripted.add_asset(
            "fresh",
            "2025-08-01T09:00:00+00:00",
            vec![resource("fresh", "IMG_0001.dng", "com.adobe.raw-image")],
        );

        let (library, presenter) = share(scripted);
        assert!(library.exports.lock().is_empty());
        assert!(presenter.presented.lock().is_empty());
    }
}
