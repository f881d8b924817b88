use std::fs;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use photo_capture_core::{
    AssetId, AuthorizationResponse, CaptureCoordinator, CoordinatorConfig, FsPhotoLibrary,
    PhotoLibrary, ShareCompletion, SharePresenter, ShareRequest, SurfaceBounds, VideoDevice,
    VideoDeviceInfo,
};
use photo_capture_virtual::{VirtualCaptureConfig, VirtualPhotoOutput, VirtualVideoDevice};

fn default_library_dir() -> PathBuf {
    dirs_next::picture_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("PhotoCaptureKit Library")
}

fn default_export_dir() -> PathBuf {
    dirs_next::document_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("PhotoCaptureKit Exports")
}

fn open_library(dir: Option<PathBuf>) -> Result<Arc<FsPhotoLibrary>, String> {
    let dir = dir.unwrap_or_else(default_library_dir);
    let library = FsPhotoLibrary::open(dir).map_err(|e| e.to_string())?;
    library.set_authorization_response(AuthorizationResponse::Grant);
    Ok(Arc::new(library))
}

fn build_coordinator(
    library: Arc<FsPhotoLibrary>,
    export_dir: PathBuf,
) -> Result<(CaptureCoordinator<VirtualPhotoOutput>, VideoDeviceInfo), String> {
    let staging = std::env::temp_dir().join("photo-capture-staging");
    fs::create_dir_all(&staging).map_err(|e| e.to_string())?;

    let device = Arc::new(VirtualVideoDevice::default_device().map_err(|e| e.to_string())?);
    let info = device.info();
    let output = Arc::new(VirtualPhotoOutput::new(
        info.clone(),
        VirtualCaptureConfig::default(),
    ));

    let coordinator = CaptureCoordinator::new(
        Some(device),
        output,
        library,
        CoordinatorConfig {
            staging_dir: staging,
            export_dir,
        },
    )
    .map_err(|e| e.to_string())?;

    Ok((coordinator, info))
}

pub fn devices() -> Result<(), String> {
    let devices = VirtualVideoDevice::list_devices();
    if devices.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    for info in devices {
        println!("  {} ({}, {:?})", info.name, info.id, info.position);
    }
    Ok(())
}

pub fn capture(library_dir: Option<PathBuf>, count: u32) -> Result<(), String> {
    let library = open_library(library_dir)?;
    let before = library.fetch_image_assets().map_err(|e| e.to_string())?.len();

    let (coordinator, camera) = build_coordinator(library.clone(), default_export_dir())?;
    println!("Using camera: {}", camera.name);

    let (tx, rx) = mpsc::channel();
    coordinator.set_capture_observer(move |id| {
        let _ = tx.send(id);
    });

    coordinator
        .start_preview(SurfaceBounds::new(390, 844))
        .map_err(|e| e.to_string())?;

    for _ in 0..count {
        let id = coordinator.take_photo().map_err(|e| e.to_string())?;
        println!("Capturing request {}...", id);
    }
    for _ in 0..count {
        let id = rx
            .recv_timeout(Duration::from_secs(10))
            .map_err(|_| "timed out waiting for a capture to finish".to_string())?;
        println!("Finished request {}", id);
    }

    coordinator.stop_preview().map_err(|e| e.to_string())?;

    // Saves land on library worker threads after the capture callback fires.
    let expected = before + count as usize;
    let deadline = Instant::now() + Duration::from_secs(10);
    let records = loop {
        let records = library.fetch_image_assets().map_err(|e| e.to_string())?;
        if records.len() >= expected {
            break records;
        }
        if Instant::now() >= deadline {
            log::warn!("Timed out waiting for the library to finish saving");
            break records;
        }
        std::thread::sleep(Duration::from_millis(50));
    };

    for record in records.iter().skip(before) {
        println!("Saved asset {}", record.id);
    }
    println!(
        "Saved {} of {} captures to {}",
        records.len().saturating_sub(before),
        count,
        library.root().display()
    );
    Ok(())
}

pub fn list(library_dir: Option<PathBuf>) -> Result<(), String> {
    let library = open_library(library_dir)?;
    let records = library.fetch_image_assets().map_err(|e| e.to_string())?;

    if records.is_empty() {
        println!("The photo library is empty.");
        return Ok(());
    }

    println!("Assets in {}:", library.root().display());
    for record in &records {
        println!("  {} ({})", record.id, record.created_at);
        let resources = library.asset_resources(record).map_err(|e| e.to_string())?;
        for resource in resources {
            println!(
                "      {:?}: {} ({}, {} bytes)",
                resource.kind,
                resource.original_filename,
                resource.type_identifier,
                resource.byte_count
            );
        }
    }
    Ok(())
}

struct ConsolePresenter {
    done: mpsc::Sender<()>,
}

impl SharePresenter for ConsolePresenter {
    fn present(&self, request: ShareRequest, completion: ShareCompletion) {
        println!("Share sheet:");
        for item in &request.items {
            println!("  {}", item.display());
        }
        println!(
            "  (excluding {} activity types)",
            request.excluded_targets.len()
        );
        completion();
        let _ = self.done.send(());
    }

    fn dismiss(&self) {
        println!("Share sheet dismissed.");
    }
}

pub fn share(library_dir: Option<PathBuf>, export_dir: Option<PathBuf>) -> Result<(), String> {
    let library = open_library(library_dir)?;
    let export_dir = export_dir.unwrap_or_else(default_export_dir);
    fs::create_dir_all(&export_dir).map_err(|e| e.to_string())?;

    let (coordinator, _camera) = build_coordinator(library, export_dir)?;

    let (tx, rx) = mpsc::channel();
    let presenter: Arc<dyn SharePresenter> = Arc::new(ConsolePresenter { done: tx });
    coordinator.share_latest_raw(&presenter);

    match rx.recv_timeout(Duration::from_secs(5)) {
        Ok(()) => Ok(()),
        Err(_) => Err("nothing was shared; capture a photo first".to_string()),
    }
}

pub fn delete(library_dir: Option<PathBuf>, asset_id: String) -> Result<(), String> {
    let library = open_library(library_dir)?;
    let id = AssetId(asset_id);
    library.delete_asset(&id).map_err(|e| e.to_string())?;
    println!("Deleted asset {}", id);
    Ok(())
}
