use std::path::Path;

use crate::library::asset::{
    AccessLevel, AssetCreationRequest, AssetId, AssetRecord, AssetResource, AuthorizationStatus,
};
use crate::models::error::CaptureError;

/// Callback receiving the outcome of an authorization request.
pub type AuthorizationHandler = Box<dyn FnOnce(AuthorizationStatus) + Send + 'static>;

/// Callback receiving the outcome of a change request.
pub type ChangeCompletion = Box<dyn FnOnce(Result<AssetId, CaptureError>) + Send + 'static>;

/// Callback receiving the outcome of a resource export.
pub type ResourceDataCompletion = Box<dyn FnOnce(Result<(), CaptureError>) + Send + 'static>;

/// Options for reading a resource's data out of the library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceRequestOptions {
    /// Allow fetching resource data that is not available locally.
    pub network_access_allowed: bool,
}

/// Interface to a photo library holding multi-resource assets.
///
/// Completions are invoked from library worker threads, not the caller's
/// thread. Implementations must not assume a UI context.
pub trait PhotoLibrary: Send + Sync {
    /// Current authorization for `access`.
    fn authorization_status(&self, access: AccessLevel) -> AuthorizationStatus;

    /// Ask the user for `access`, reporting the resulting status.
    ///
    /// If authorization was already determined the handler receives the
    /// existing status.
    fn request_authorization(&self, access: AccessLevel, handler: AuthorizationHandler);

    /// Atomically create one asset from `request`.
    ///
    /// All staged resources are stored together; the completion receives the
    /// new asset's id, or the first error encountered.
    fn perform_changes(&self, request: AssetCreationRequest, completion: ChangeCompletion);

    /// All image assets, sorted ascending by creation date.
    fn fetch_image_assets(&self) -> Result<Vec<AssetRecord>, CaptureError>;

    /// The resources backing `asset`, in storage order.
    fn asset_resources(&self, asset: &AssetRecord) -> Result<Vec<AssetResource>, CaptureError>;

    /// Export a resource's bytes to `destination`.
    fn write_resource_data(
        &self,
        resource: &AssetResource,
        destination: &Path,
        options: &ResourceRequestOptions,
        completion: ResourceDataCompletion,
    );

    /// Remove an asset and its resources from the library.
    fn delete_asset(&self, id: &AssetId) -> Result<(), CaptureError>;
}
