use crate::models::formats::ThumbnailFormat;
use crate::models::photo::{CapturedPhoto, PreviewImage};

/// Decides the thumbnail embedded in a photo container while the photo is
/// flattened to bytes.
pub trait ThumbnailCustomizer: Send + Sync {
    /// Return replacement thumbnail pixels for `photo`, or `None` to keep
    /// the photo's own embedded thumbnail.
    ///
    /// `format_out` receives the container format the thumbnail should be
    /// encoded with. It is only consulted when a replacement is returned.
    fn replacement_embedded_thumbnail(
        &self,
        photo: &CapturedPhoto,
        format_out: &mut Option<ThumbnailFormat>,
    ) -> Option<PreviewImage>;
}

/// Customizer that keeps the photo's embedded thumbnail untouched.
///
/// Echoes the photo's own thumbnail format through `format_out` and never
/// supplies replacement pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreserveEmbeddedThumbnail;

impl ThumbnailCustomizer for PreserveEmbeddedThumbnail {
    fn replacement_embedded_thumbnail(
        &self,
        photo: &CapturedPhoto,
        format_out: &mut Option<ThumbnailFormat>,
    ) -> Option<PreviewImage> {
        *format_out = photo.embedded_thumbnail_format;
        None
    }
}
