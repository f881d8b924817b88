use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::formats::{ProcessedCodec, RawPixelFormat};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a capture request.
///
/// Assigned when the settings are created, and used as the registry key for
/// the delegate handling that request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaptureRequestId(u64);

impl CaptureRequestId {
    /// Allocate the next unique request id.
    pub fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CaptureRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settings for a single photo capture request pairing a RAW format with a
/// processed container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoCaptureSettings {
    pub id: CaptureRequestId,
    pub raw_format: RawPixelFormat,
    pub processed_codec: ProcessedCodec,
}

impl PhotoCaptureSettings {
    /// Create settings requesting `raw_format` plus a processed photo in
    /// `processed_codec`. A fresh request id is assigned.
    pub fn raw_with_processed(raw_format: RawPixelFormat, processed_codec: ProcessedCodec) -> Self {
        Self {
            id: CaptureRequestId::next(),
            raw_format,
            processed_codec,
        }
    }
}

/// The settings a photo output actually used for a finished capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCaptureSettings {
    pub id: CaptureRequestId,
    pub raw_format: RawPixelFormat,
    pub processed_codec: ProcessedCodec,
    pub width: u32,
    pub height: u32,
}

impl ResolvedCaptureSettings {
    pub fn from_settings(settings: &PhotoCaptureSettings, width: u32, height: u32) -> Self {
        Self {
            id: settings.id,
            raw_format: settings.raw_format,
            processed_codec: settings.processed_codec,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::formats::BayerPattern;

    fn bayer12() -> RawPixelFormat {
        RawPixelFormat::Bayer {
            pattern: BayerPattern::Rggb,
            bits_per_sample: 12,
        }
    }

    #[test]
    fn request_ids_are_unique_and_increasing() {
        let a = PhotoCaptureSettings::raw_with_processed(bayer12(), ProcessedCodec::Jpeg);
        let b = PhotoCaptureSettings::raw_with_processed(bayer12(), ProcessedCodec::Jpeg);
        assert_ne!(a.id, b.id);
        assert!(b.id.value() > a.id.value());
    }

    #[test]
    fn resolved_settings_echo_the_request() {
        let settings = PhotoCaptureSettings::raw_with_processed(bayer12(), ProcessedCodec::Jpeg);
        let resolved = ResolvedCaptureSettings::from_settings(&settings, 320, 240);
        assert_eq!(resolved.id, settings.id);
        assert_eq!(resolved.raw_format, settings.raw_format);
        assert_eq!(resolved.processed_codec, ProcessedCodec::Jpeg);
        assert_eq!((resolved.width, resolved.height), (320, 240));
    }
}
