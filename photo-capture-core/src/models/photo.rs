use std::fmt;

use super::formats::{BayerPattern, ProcessedCodec, ThumbnailFormat};
use super::settings::CaptureRequestId;

/// A small RGB8 image embedded in a photo container as its preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub width: u32,
    pub height: u32,
    /// Interleaved RGB8, row-major.
    pub pixels: Vec<u8>,
}

/// Pixel data carried by a captured photo.
#[derive(Clone, PartialEq, Eq)]
pub enum PhotoPayload {
    /// Single-plane CFA samples straight off the sensor, row-major.
    Bayer {
        samples: Vec<u16>,
        pattern: BayerPattern,
        bits_per_sample: u8,
        black_level: u16,
        white_level: u16,
    },
    /// Demosaiced linear RGB, 16 bits per sample, interleaved.
    LinearRgb16 { samples: Vec<u16> },
    /// Display-referred RGB8, interleaved, destined for `codec`.
    Rgb8 { pixels: Vec<u8>, codec: ProcessedCodec },
}

impl fmt::Debug for PhotoPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bayer {
                samples,
                pattern,
                bits_per_sample,
                ..
            } => f
                .debug_struct("Bayer")
                .field("samples", &samples.len())
                .field("pattern", pattern)
                .field("bits_per_sample", bits_per_sample)
                .finish(),
            Self::LinearRgb16 { samples } => f
                .debug_struct("LinearRgb16")
                .field("samples", &samples.len())
                .finish(),
            Self::Rgb8 { pixels, codec } => f
                .debug_struct("Rgb8")
                .field("pixels", &pixels.len())
                .field("codec", codec)
                .finish(),
        }
    }
}

/// One photo delivered by a photo output for a capture request.
///
/// A single request produces several of these: one per RAW format and one
/// per processed format the request asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPhoto {
    pub request_id: CaptureRequestId,
    pub width: u32,
    pub height: u32,
    pub payload: PhotoPayload,
    /// Preview pixels the backend embedded, if any.
    pub embedded_thumbnail: Option<PreviewImage>,
    /// Container format of the embedded preview.
    pub embedded_thumbnail_format: Option<ThumbnailFormat>,
}

impl CapturedPhoto {
    /// Whether this photo carries RAW (scene-referred) data.
    pub fn is_raw_photo(&self) -> bool {
        matches!(
            self.payload,
            PhotoPayload::Bayer { .. } | PhotoPayload::LinearRgb16 { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo_with(payload: PhotoPayload) -> CapturedPhoto {
        CapturedPhoto {
            request_id: CaptureRequestId::next(),
            width: 4,
            height: 2,
            payload,
            embedded_thumbnail: None,
            embedded_thumbnail_format: None,
        }
    }

    #[test]
    fn raw_detection() {
        let bayer = photo_with(PhotoPayload::Bayer {
            samples: vec![0; 8],
            pattern: BayerPattern::Rggb,
            bits_per_sample: 12,
            black_level: 64,
            white_level: 4095,
        });
        let linear = photo_with(PhotoPayload::LinearRgb16 { samples: vec![0; 24] });
        let processed = photo_with(PhotoPayload::Rgb8 {
            pixels: vec![0; 24],
            codec: ProcessedCodec::Jpeg,
        });
        assert!(bayer.is_raw_photo());
        assert!(linear.is_raw_photo());
        assert!(!processed.is_raw_photo());
    }

    #[test]
    fn payload_debug_elides_sample_data() {
        let payload = PhotoPayload::Rgb8 {
            pixels: vec![7; 1024],
            codec: ProcessedCodec::Jpeg,
        };
        let printed = format!("{:?}", payload);
        assert!(printed.contains("1024"));
        assert!(!printed.contains("7, 7"));
    }
}
