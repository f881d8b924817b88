use serde::{Deserialize, Serialize};

/// 2x2 color filter array layout of a Bayer sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BayerPattern {
    Rggb,
    Bggr,
    Grbg,
    Gbrg,
}

impl BayerPattern {
    /// Row-major 2x2 CFA layout. 0 = red, 1 = green, 2 = blue.
    pub fn cfa_layout(&self) -> [u8; 4] {
        match self {
            Self::Rggb => [0, 1, 1, 2],
            Self::Bggr => [2, 1, 1, 0],
            Self::Grbg => [1, 0, 2, 1],
            Self::Gbrg => [1, 2, 0, 1],
        }
    }

    /// CFA color index at pixel `(x, y)`. 0 = red, 1 = green, 2 = blue.
    pub fn color_at(&self, x: u32, y: u32) -> u8 {
        let layout = self.cfa_layout();
        layout[((y % 2) * 2 + (x % 2)) as usize]
    }
}

/// A RAW pixel format a photo output can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawPixelFormat {
    /// Single-plane sensor samples behind a color filter array.
    Bayer {
        pattern: BayerPattern,
        bits_per_sample: u8,
    },
    /// Demosaiced linear RGB samples, still scene-referred.
    Linear { bits_per_sample: u8 },
}

impl RawPixelFormat {
    pub fn is_bayer(&self) -> bool {
        matches!(self, Self::Bayer { .. })
    }

    pub fn bits_per_sample(&self) -> u8 {
        match self {
            Self::Bayer { bits_per_sample, .. } | Self::Linear { bits_per_sample } => {
                *bits_per_sample
            }
        }
    }
}

/// Codec used for the processed (non-RAW) photo container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessedCodec {
    Jpeg,
    Png,
}

impl ProcessedCodec {
    /// File extension for this codec.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    /// Uniform type identifier for containers of this codec.
    pub fn type_identifier(&self) -> &'static str {
        match self {
            Self::Jpeg => "public.jpeg",
            Self::Png => "public.png",
        }
    }
}

/// Format of a thumbnail embedded in a photo container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailFormat {
    pub codec: ProcessedCodec,
    pub max_width: u32,
    pub max_height: u32,
}
