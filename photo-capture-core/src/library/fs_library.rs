use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::library::asset::{
    AccessLevel, AssetCreationRequest, AssetId, AssetManifest, AssetRecord, AssetResource,
    AuthorizationStatus, MediaKind, PendingResource, ResourceCreationOptions, ResourceKind,
};
use crate::library::photo_library::{
    AuthorizationHandler, ChangeCompletion, PhotoLibrary, ResourceDataCompletion,
    ResourceRequestOptions,
};
use crate::models::error::CaptureError;

const ASSETS_DIR: &str = "assets";
const MANIFEST_FILE: &str = "asset.json";

/// How the library answers authorization requests.
///
/// Stands in for the user's consent dialog so denial paths stay testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationResponse {
    Grant,
    Deny,
}

struct AuthorizationState {
    add_only: AuthorizationStatus,
    read_write: AuthorizationStatus,
    response: AuthorizationResponse,
}

/// Filesystem-backed photo library.
///
/// ## Layout
///
/// ```text
/// <root>/
/// └── assets/
///     └── <asset uuid>/
///         ├── asset.json      ← manifest: id, timestamps, resource table
///         ├── IMG_*.jpg       ← data resources, named by capture time
///         └── *.dng           ← file resources under their original names
/// ```
///
/// Change requests, exports, and authorization callbacks run on named
/// worker threads; completions fire there.
pub struct FsPhotoLibrary {
    root: PathBuf,
    authorization: Mutex<AuthorizationState>,
}

impl FsPhotoLibrary {
    /// Open (creating if needed) a library rooted at `root`.
    pub fn open(root: PathBuf) -> Result<Self, CaptureError> {
        fs::create_dir_all(root.join(ASSETS_DIR)).map_err(|e| {
            CaptureError::StorageError(format!("failed to create library directories: {}", e))
        })?;
        Ok(Self {
            root,
            authorization: Mutex::new(AuthorizationState {
                add_only: AuthorizationStatus::NotDetermined,
                read_write: AuthorizationStatus::NotDetermined,
                response: AuthorizationResponse::Grant,
            }),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Choose how future authorization requests are answered.
    pub fn set_authorization_response(&self, response: AuthorizationResponse) {
        self.authorization.lock().response = response;
    }

    fn assets_dir(&self) -> PathBuf {
        self.root.join(ASSETS_DIR)
    }

    fn asset_dir(&self, id: &AssetId) -> PathBuf {
        self.assets_dir().join(id.as_str())
    }

    fn can_add(&self) -> bool {
        let auth = self.authorization.lock();
        auth.add_only == AuthorizationStatus::Authorized
            || auth.read_write == AuthorizationStatus::Authorized
    }
}

impl PhotoLibrary for FsPhotoLibrary {
    fn authorization_status(&self, access: AccessLevel) -> AuthorizationStatus {
        let auth = self.authorization.lock();
        match access {
            AccessLevel::AddOnly => auth.add_only,
            AccessLevel::ReadWrite => auth.read_write,
        }
    }

    fn request_authorization(&self, access: AccessLevel, handler: AuthorizationHandler) {
        let status = {
            let mut auth = self.authorization.lock();
            let response = auth.response;
            let slot = match access {
                AccessLevel::AddOnly => &mut auth.add_only,
                AccessLevel::ReadWrite => &mut auth.read_write,
            };
            if *slot == AuthorizationStatus::NotDetermined {
                *slot = match response {
                    AuthorizationResponse::Grant => AuthorizationStatus::Authorized,
                    AuthorizationResponse::Deny => AuthorizationStatus::Denied,
                };
            }
            *slot
        };

        thread::Builder::new()
            .name("library-authorization".into())
            .spawn(move || handler(status))
            .expect("failed to spawn library authorization thread");
    }

    fn perform_changes(&self, request: AssetCreationRequest, completion: ChangeCompletion) {
        let authorized = self.can_add();
        let root = self.root.clone();

        thread::Builder::new()
            .name("library-changes".into())
            .spawn(move || {
                if !authorized {
                    completion(Err(CaptureError::PermissionDenied));
                    return;
                }
                completion(store_asset(&root, request));
            })
            .expect("failed to spawn library changes thread");
    }

    fn fetch_image_assets(&self) -> Result<Vec<AssetRecord>, CaptureError> {
        let entries = fs::read_dir(self.assets_dir()).map_err(|e| {
            CaptureError::StorageError(format!("failed to read the assets directory: {}", e))
        })?;

        let mut records = Vec::new();
        for entry in entries.flatten() {
            let dir = entry.path();
            if !dir.is_dir() {
                continue;
            }
            match read_manifest(&dir) {
                Ok(manifest) if manifest.media_kind == MediaKind::Image => {
                    records.push(manifest.record());
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Skipping unreadable asset manifest in {}: {}", dir.display(), e);
                }
            }
        }

        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    fn asset_resources(&self, asset: &AssetRecord) -> Result<Vec<AssetResource>, CaptureError> {
        let dir = self.asset_dir(&asset.id);
        if !dir.is_dir() {
            return Err(CaptureError::AssetNotFound(asset.id.to_string()));
        }
        Ok(read_manifest(&dir)?.resources)
    }

    fn write_resource_data(
        &self,
        resource: &AssetResource,
        destination: &Path,
        options: &ResourceRequestOptions,
        completion: ResourceDataCompletion,
    ) {
        log::debug!(
            "Exporting resource {} of asset {} to {} (network access allowed: {})",
            resource.file_name,
            resource.asset_id,
            destination.display(),
            options.network_access_allowed
        );

        let source = self.asset_dir(&resource.asset_id).join(&resource.file_name);
        let destination = destination.to_path_buf();

        thread::Builder::new()
            .name("library-export".into())
            .spawn(move || completion(export_resource(&source, &destination)))
            .expect("failed to spawn library export thread");
    }

    fn delete_asset(&self, id: &AssetId) -> Result<(), CaptureError> {
        let assets_dir = self
            .assets_dir()
            .canonicalize()
            .map_err(|e| CaptureError::StorageError(format!("failed to resolve library root: {}", e)))?;
        let dir = self
            .assets_dir()
            .join(id.as_str())
            .canonicalize()
            .map_err(|_| CaptureError::AssetNotFound(id.to_string()))?;

        // Refuse ids that resolve outside (or onto) the assets directory.
        if !dir.starts_with(&assets_dir) || dir == assets_dir {
            return Err(CaptureError::InvalidRequest(format!(
                "asset id escapes the library: {}",
                id
            )));
        }

        fs::remove_dir_all(&dir)
            .map_err(|e| CaptureError::StorageError(format!("failed to delete asset: {}", e)))?;
        Ok(())
    }
}

/// Uniform type identifier for a container file extension.
pub fn type_identifier_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "dng" => "com.adobe.raw-image",
        "jpg" | "jpeg" => "public.jpeg",
        "png" => "public.png",
        _ => "public.data",
    }
}

fn store_asset(root: &Path, request: AssetCreationRequest) -> Result<AssetId, CaptureError> {
    request.validate().map_err(CaptureError::InvalidRequest)?;

    let id = AssetId(uuid::Uuid::new_v4().to_string());
    let dir = root.join(ASSETS_DIR).join(id.as_str());
    fs::create_dir_all(&dir).map_err(|e| {
        CaptureError::StorageError(format!("failed to create asset directory: {}", e))
    })?;

    let result = store_resources(&dir, &id, request).and_then(|resources| {
        let manifest = AssetManifest {
            id: id.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
            media_kind: MediaKind::Image,
            resources,
        };
        write_manifest(&dir, &manifest)?;
        Ok(id.clone())
    });

    // A half-written asset must not become visible to fetches.
    if result.is_err() {
        fs::remove_dir_all(&dir).ok();
    }
    result
}

fn store_resources(
    dir: &Path,
    asset_id: &AssetId,
    request: AssetCreationRequest,
) -> Result<Vec<AssetResource>, CaptureError> {
    let mut stored = Vec::new();
    for pending in request.resources() {
        let resource = match pending {
            PendingResource::Data { kind, data, options } => {
                store_data_resource(dir, asset_id, *kind, data, options)?
            }
            PendingResource::File { kind, path, options } => {
                store_file_resource(dir, asset_id, *kind, path, options)?
            }
        };
        stored.push(resource);
    }
    Ok(stored)
}

fn store_data_resource(
    dir: &Path,
    asset_id: &AssetId,
    kind: ResourceKind,
    data: &[u8],
    options: &ResourceCreationOptions,
) -> Result<AssetResource, CaptureError> {
    let stem = format!("IMG_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let file_name = unique_file_name(dir, &stem, sniff_extension(data));
    let path = dir.join(&file_name);
    fs::write(&path, data)
        .map_err(|e| CaptureError::StorageError(format!("failed to write resource: {}", e)))?;
    finish_resource(asset_id, kind, &path, file_name, options.original_filename.clone())
}

fn store_file_resource(
    dir: &Path,
    asset_id: &AssetId,
    kind: ResourceKind,
    source: &Path,
    options: &ResourceCreationOptions,
) -> Result<AssetResource, CaptureError> {
    let source_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            CaptureError::StorageError(format!(
                "resource path has no file name: {}",
                source.display()
            ))
        })?;

    let destination = dir.join(&source_name);
    if destination.exists() {
        return Err(CaptureError::StorageError(format!(
            "duplicate resource file name: {}",
            source_name
        )));
    }

    if options.should_move_file {
        move_file(source, &destination)?;
    } else {
        fs::copy(source, &destination).map_err(|e| {
            CaptureError::StorageError(format!("failed to copy resource into the library: {}", e))
        })?;
    }

    finish_resource(asset_id, kind, &destination, source_name, options.original_filename.clone())
}

/// Move `source` to `destination`, falling back to copy + remove when the
/// rename crosses filesystems.
fn move_file(source: &Path, destination: &Path) -> Result<(), CaptureError> {
    if fs::rename(source, destination).is_ok() {
        return Ok(());
    }
    fs::copy(source, destination).map_err(|e| {
        CaptureError::StorageError(format!("failed to copy resource into the library: {}", e))
    })?;
    fs::remove_file(source).map_err(|e| {
        CaptureError::StorageError(format!("failed to remove moved source file: {}", e))
    })?;
    Ok(())
}

/// Copy a stored resource out to `destination`, creating missing parents of
/// the export location.
fn export_resource(source: &Path, destination: &Path) -> Result<(), CaptureError> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            CaptureError::StorageError(format!("failed to create export directory: {}", e))
        })?;
    }
    fs::copy(source, destination)
        .map_err(|e| CaptureError::StorageError(format!("failed to export resource: {}", e)))?;
    Ok(())
}

fn finish_resource(
    asset_id: &AssetId,
    kind: ResourceKind,
    path: &Path,
    file_name: String,
    original_filename: Option<String>,
) -> Result<AssetResource, CaptureError> {
    let byte_count = fs::metadata(path)
        .map_err(|e| CaptureError::StorageError(format!("failed to stat resource: {}", e)))?
        .len();
    let checksum = sha256_file(path)?;
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    Ok(AssetResource {
        asset_id: asset_id.clone(),
        kind,
        type_identifier: type_identifier_for_extension(extension).to_string(),
        original_filename: original_filename.unwrap_or_else(|| file_name.clone()),
        file_name,
        byte_count,
        checksum,
    })
}

/// First file name of the form `{stem}.{ext}` or `{stem}_{n}.{ext}` that is
/// free in `dir`.
fn unique_file_name(dir: &Path, stem: &str, extension: &str) -> String {
    let candidate = format!("{}.{}", stem, extension);
    if !dir.join(&candidate).exists() {
        return candidate;
    }
    let mut index = 1;
    loop {
        let candidate = format!("{}_{}.{}", stem, index, extension);
        if !dir.join(&candidate).exists() {
            return candidate;
        }
        index += 1;
    }
}

/// Guess a file extension from container magic bytes.
fn sniff_extension(data: &[u8]) -> &'static str {
    if data.starts_with(&[0xFF, 0xD8]) {
        "jpg"
    } else if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        "png"
    } else if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
        "dng"
    } else {
        "bin"
    }
}

fn read_manifest(dir: &Path) -> Result<AssetManifest, CaptureError> {
    let json = fs::read_to_string(dir.join(MANIFEST_FILE))
        .map_err(|e| CaptureError::StorageError(format!("failed to read manifest: {}", e)))?;
    let manifest: AssetManifest = serde_json::from_str(&json)
        .map_err(|e| CaptureError::StorageError(format!("failed to parse manifest: {}", e)))?;
    Ok(manifest)
}

fn write_manifest(dir: &Path, manifest: &AssetManifest) -> Result<(), CaptureError> {
    let json = serde_json::to_string_pretty(manifest)
        .map_err(|e| CaptureError::StorageError(format!("failed to serialize manifest: {}", e)))?;
    fs::write(dir.join(MANIFEST_FILE), json)
        .map_err(|e| CaptureError::StorageError(format!("failed to write manifest: {}", e)))?;
    Ok(())
}

/// Compute SHA-256 hex digest of a file.
fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let data = fs::read(path).map_err(|e| {
        CaptureError::StorageError(format!("failed to read file for checksum: {}", e))
    })?;
    let digest = Sha256::digest(&data);
    Ok(hex_encode(&digest))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
