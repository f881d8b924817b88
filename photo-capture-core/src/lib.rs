//! # photo-capture-core
//!
//! Platform-agnostic photo capture core library.
//!
//! Provides capture session orchestration, RAW + processed artifact
//! accumulation, photo library storage, and RAW export for sharing.
//! Platform-specific backends implement the `PhotoOutput` and `VideoDevice`
//! traits and plug into the generic `CaptureCoordinator`.
//!
//! ## Architecture
//!
//! ```text
//! photo-capture-core (this crate)
//! ├── traits/    ← PhotoOutput, VideoDevice, PhotoCaptureDelegate, ThumbnailCustomizer
//! ├── models/    ← CaptureError, ArtifactState, PhotoCaptureSettings, RawPixelFormat, etc.
//! ├── session/   ← CameraSession, RawCaptureDelegate, CaptureCoordinator (generic orchestrator)
//! ├── library/   ← PhotoLibrary trait, FsPhotoLibrary, asset manifests
//! └── sharing/   ← SharePresenter, newest-RAW export flow
//! ```

pub mod library;
pub mod models;
pub mod session;
pub mod sharing;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use library::asset::{
    AccessLevel, AssetCreationRequest, AssetId, AssetManifest, AssetRecord, AssetResource,
    AuthorizationStatus, MediaKind, PendingResource, ResourceCreationOptions, ResourceKind,
};
pub use library::fs_library::{AuthorizationResponse, FsPhotoLibrary};
pub use library::photo_library::{
    AuthorizationHandler, ChangeCompletion, PhotoLibrary, ResourceDataCompletion,
    ResourceRequestOptions,
};
pub use models::camera_models::{
    DevicePosition, SessionPreset, SurfaceBounds, VideoDeviceInfo, VideoGravity, VideoOrientation,
};
pub use models::config::CoordinatorConfig;
pub use models::error::CaptureError;
pub use models::formats::{BayerPattern, ProcessedCodec, RawPixelFormat, ThumbnailFormat};
pub use models::photo::{CapturedPhoto, PhotoPayload, PreviewImage};
pub use models::settings::{CaptureRequestId, PhotoCaptureSettings, ResolvedCaptureSettings};
pub use models::state::ArtifactState;
pub use session::camera_session::{CameraSession, DeviceInput, PreviewSurface};
pub use session::coordinator::{CaptureCoordinator, CaptureObserver};
pub use session::delegate::{DidFinishHandler, RawCaptureDelegate};
pub use sharing::exporter::share_latest_raw;
pub use sharing::presenter::{ShareCompletion, SharePresenter, ShareRequest, ShareTarget};
pub use traits::camera::{PhotoCaptureDelegate, PhotoOutput, VideoDevice};
pub use traits::thumbnail::{PreserveEmbeddedThumbnail, ThumbnailCustomizer};
