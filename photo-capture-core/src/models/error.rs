use thiserror::Error;

/// Errors that can occur during photo capture operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("device not available")]
    DeviceNotAvailable,

    #[error("setup failed: {0}")]
    SetupFailed(String),

    #[error("session is not running")]
    SessionNotRunning,

    #[error("invalid capture request: {0}")]
    InvalidRequest(String),

    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("asset not found: {0}")]
    AssetNotFound(String),
}
