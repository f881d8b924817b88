use std::path::PathBuf;

/// Filesystem locations used by a capture coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Directory where RAW containers are staged before they are moved into
    /// the photo library.
    pub staging_dir: PathBuf,

    /// Directory where resources are exported for sharing.
    pub export_dir: PathBuf,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            staging_dir: std::env::temp_dir(),
            export_dir: std::env::temp_dir(),
        }
    }
}
