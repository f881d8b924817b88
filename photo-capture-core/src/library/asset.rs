use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Access level an app can hold on a photo library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessLevel {
    /// May create new assets but not read existing ones.
    AddOnly,
    /// Full read and write access.
    ReadWrite,
}

/// Authorization state for one access level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    NotDetermined,
    Denied,
    Authorized,
}

/// Kind of media an asset holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// Role a resource plays inside an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// The primary photo container.
    Photo,
    /// An alternate rendition of the same photo (typically the RAW).
    AlternatePhoto,
}

/// Identifier of a stored asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored asset as returned by library fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: AssetId,
    /// RFC 3339 creation timestamp. Fetches sort on this string.
    pub created_at: String,
    pub media_kind: MediaKind,
}

/// One resource backing an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetResource {
    pub asset_id: AssetId,
    pub kind: ResourceKind,
    /// Uniform type identifier of the container, e.g. `public.jpeg` or
    /// `com.adobe.raw-image`.
    pub type_identifier: String,
    /// File name the resource had when it entered the library.
    pub original_filename: String,
    /// File name inside the asset directory.
    pub file_name: String,
    pub byte_count: u64,
    /// SHA-256 hex digest of the stored file.
    pub checksum: String,
}

/// Sidecar manifest stored as `asset.json` inside each asset directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetManifest {
    pub id: AssetId,
    pub created_at: String,
    pub media_kind: MediaKind,
    pub resources: Vec<AssetResource>,
}

impl AssetManifest {
    pub fn record(&self) -> AssetRecord {
        AssetRecord {
            id: self.id.clone(),
            created_at: self.created_at.clone(),
            media_kind: self.media_kind,
        }
    }
}

/// Options for adding one resource to a creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceCreationOptions {
    /// File name to record as the resource's original name. Defaults to the
    /// name the library derives from the content or source file.
    pub original_filename: Option<String>,
    /// Move the source file into the library instead of copying it.
    pub should_move_file: bool,
}

/// One staged resource inside an [`AssetCreationRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingResource {
    Data {
        kind: ResourceKind,
        data: Vec<u8>,
        options: ResourceCreationOptions,
    },
    File {
        kind: ResourceKind,
        path: PathBuf,
        options: ResourceCreationOptions,
    },
}

impl PendingResource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Data { kind, .. } | Self::File { kind, .. } => *kind,
        }
    }
}

/// Staged content for one new library asset.
///
/// Resources are written in the order they were added when the request is
/// performed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetCreationRequest {
    resources: Vec<PendingResource>,
}

impl AssetCreationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage in-memory container bytes as a resource.
    pub fn add_resource_data(
        &mut self,
        kind: ResourceKind,
        data: Vec<u8>,
        options: ResourceCreationOptions,
    ) {
        self.resources.push(PendingResource::Data { kind, data, options });
    }

    /// Stage an on-disk container file as a resource.
    pub fn add_resource_file(
        &mut self,
        kind: ResourceKind,
        path: PathBuf,
        options: ResourceCreationOptions,
    ) {
        self.resources.push(PendingResource::File { kind, path, options });
    }

    pub fn resources(&self) -> &[PendingResource] {
        &self.resources
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.resources.is_empty() {
            return Err("asset creation request has no resources".into());
        }
        let primaries = self
            .resources
            .iter()
            .filter(|r| r.kind() == ResourceKind::Photo)
            .count();
        if primaries > 1 {
            return Err(format!("asset has {} primary photo resources", primaries));
        }
        Ok(())
    }
}
