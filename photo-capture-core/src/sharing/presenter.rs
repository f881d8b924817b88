use std::path::PathBuf;

/// Share destinations that can be excluded from a share request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareTarget {
    /// Ebook reader apps. RAW containers are not reading material.
    EbookReader,
    /// PDF markup flows.
    PdfMarkup,
    /// Re-importing into the photo library the file just came from.
    PhotoLibraryImport,
}

/// A set of files to offer for sharing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRequest {
    pub items: Vec<PathBuf>,
    pub excluded_targets: Vec<ShareTarget>,
}

/// Invoked once the user has finished interacting with the share surface.
pub type ShareCompletion = Box<dyn FnOnce() + Send + 'static>;

/// UI seam that shows a share surface for exported files.
///
/// The capture core never draws UI itself; a frontend implements this trait
/// (an activity sheet on a phone, a console prompt in the demo) and the
/// exporter drives it.
pub trait SharePresenter: Send + Sync {
    /// Show the share surface for `request`. `completion` must be called
    /// exactly once when the interaction ends.
    fn present(&self, request: ShareRequest, completion: ShareCompletion);

    /// Tear the share surface down.
    fn dismiss(&self);
}
