//! Container flattening.
//!
//! Turns captured photos into the bytes of their on-disk containers. RAW
//! payloads become DNG: a TIFF IFD chain whose last entry carries the
//! sensor samples, preceded by an RGB preview IFD when the capture embeds a
//! thumbnail. Processed payloads become JPEG or PNG.

use std::io::{Cursor, Write};
use std::sync::Arc;

use dng::ifd::{Ifd, IfdValue, Offsets};
use dng::tags::ifd as tiff_tags;
use dng::{DngWriter, FileType};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageFormat, RgbImage};

use photo_capture_core::models::camera_models::VideoDeviceInfo;
use photo_capture_core::models::error::CaptureError;
use photo_capture_core::models::formats::ProcessedCodec;
use photo_capture_core::models::photo::{CapturedPhoto, PhotoPayload, PreviewImage};

const JPEG_QUALITY: u8 = 92;

/// TIFF photometric interpretation for CFA sample data.
const PHOTOMETRIC_CFA: u16 = 32803;
/// TIFF photometric interpretation for RGB sample data.
const PHOTOMETRIC_RGB: u16 = 2;

/// Write a RAW photo as a DNG container.
///
/// `preview` is embedded as an RGB IFD ahead of the sample IFD. The preview
/// is always stored uncompressed, whatever codec the thumbnail customizer
/// asked for.
pub fn encode_dng(
    photo: &CapturedPhoto,
    preview: Option<&PreviewImage>,
    camera: &VideoDeviceInfo,
) -> Result<Vec<u8>, CaptureError> {
    let raw_ifd = match &photo.payload {
        PhotoPayload::Bayer { samples, .. } => cfa_ifd(photo.width, photo.height, samples, camera),
        PhotoPayload::LinearRgb16 { samples } => {
            linear_ifd(photo.width, photo.height, samples, camera)
        }
        PhotoPayload::Rgb8 { .. } => {
            return Err(CaptureError::EncodingFailed(
                "a processed payload cannot be written as RAW".into(),
            ))
        }
    };

    let mut chain = Vec::new();
    if let Some(preview) = preview {
        chain.push(preview_ifd(preview));
    }
    chain.push(raw_ifd);

    let mut buffer = Vec::new();
    let cursor = Cursor::new(&mut buffer);
    DngWriter::write_dng(cursor, true, FileType::Dng, chain)
        .map_err(|e| CaptureError::EncodingFailed(format!("DNG encoding failed: {:?}", e)))?;
    Ok(buffer)
}

/// Write a processed photo as the container its payload names.
pub fn encode_processed(photo: &CapturedPhoto) -> Result<Vec<u8>, CaptureError> {
    let PhotoPayload::Rgb8 { pixels, codec } = &photo.payload else {
        return Err(CaptureError::EncodingFailed(
            "a RAW payload cannot be written as a processed container".into(),
        ));
    };
    match codec {
        ProcessedCodec::Jpeg => encode_jpeg(pixels, photo.width, photo.height),
        ProcessedCodec::Png => encode_png(pixels, photo.width, photo.height),
    }
}

fn base_ifd(width: u32, height: u32, camera: &VideoDeviceInfo) -> Ifd {
    let mut ifd = Ifd::default();
    ifd.insert(tiff_tags::ImageWidth, IfdValue::Long(width));
    ifd.insert(tiff_tags::ImageLength, IfdValue::Long(height));
    ifd.insert(tiff_tags::Compression, IfdValue::Short(1));
    ifd.insert(tiff_tags::RowsPerStrip, IfdValue::Long(height));
    ifd.insert(tiff_tags::PlanarConfiguration, IfdValue::Short(1));
    ifd.insert(
        tiff_tags::Software,
        IfdValue::Ascii(format!("photo-capture-kit v{}", env!("CARGO_PKG_VERSION"))),
    );
    ifd.insert(tiff_tags::Make, IfdValue::Ascii(camera.name.clone()));
    ifd.insert(tiff_tags::Model, IfdValue::Ascii(camera.id.clone()));
    // Fixed exposure: the synthetic sensor has no metering.
    ifd.insert(tiff_tags::ExposureTime, IfdValue::Rational(1, 30));
    ifd.insert(tiff_tags::ISOSpeedRatings, IfdValue::Short(100));
    ifd
}

fn cfa_ifd(width: u32, height: u32, samples: &[u16], camera: &VideoDeviceInfo) -> Ifd {
    let mut ifd = base_ifd(width, height, camera);
    ifd.insert(tiff_tags::BitsPerSample, IfdValue::Short(16));
    ifd.insert(
        tiff_tags::PhotometricInterpretation,
        IfdValue::Short(PHOTOMETRIC_CFA),
    );
    ifd.insert(tiff_tags::SamplesPerPixel, IfdValue::Short(1));
    attach_strip(&mut ifd, samples_to_le_bytes(samples));
    ifd
}

fn linear_ifd(width: u32, height: u32, samples: &[u16], camera: &VideoDeviceInfo) -> Ifd {
    let mut ifd = base_ifd(width, height, camera);
    ifd.insert(
        tiff_tags::BitsPerSample,
        IfdValue::List(vec![
            IfdValue::Short(16),
            IfdValue::Short(16),
            IfdValue::Short(16),
        ]),
    );
    ifd.insert(
        tiff_tags::PhotometricInterpretation,
        IfdValue::Short(PHOTOMETRIC_RGB),
    );
    ifd.insert(tiff_tags::SamplesPerPixel, IfdValue::Short(3));
    attach_strip(&mut ifd, samples_to_le_bytes(samples));
    ifd
}

fn preview_ifd(preview: &PreviewImage) -> Ifd {
    let mut ifd = Ifd::default();
    ifd.insert(tiff_tags::ImageWidth, IfdValue::Long(preview.width));
    ifd.insert(tiff_tags::ImageLength, IfdValue::Long(preview.height));
    ifd.insert(
        tiff_tags::BitsPerSample,
        IfdValue::List(vec![
            IfdValue::Short(8),
            IfdValue::Short(8),
            IfdValue::Short(8),
        ]),
    );
    ifd.insert(tiff_tags::Compression, IfdValue::Short(1));
    ifd.insert(
        tiff_tags::PhotometricInterpretation,
        IfdValue::Short(PHOTOMETRIC_RGB),
    );
    ifd.insert(tiff_tags::SamplesPerPixel, IfdValue::Short(3));
    ifd.insert(tiff_tags::RowsPerStrip, IfdValue::Long(preview.height));
    ifd.insert(tiff_tags::PlanarConfiguration, IfdValue::Short(1));
    attach_strip(&mut ifd, preview.pixels.clone());
    ifd
}

struct StripData {
    data: Vec<u8>,
}

impl Offsets for StripData {
    fn size(&self) -> u32 {
        self.data.len() as u32
    }

    fn write(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        writer.write_all(&self.data)
    }
}

fn attach_strip(ifd: &mut Ifd, data: Vec<u8>) {
    let byte_count = data.len() as u32;
    let offsets: Arc<dyn Offsets + Send + Sync> = Arc::new(StripData { data });
    ifd.insert(tiff_tags::StripOffsets, IfdValue::Offsets(offsets));
    ifd.insert(tiff_tags::StripByteCounts, IfdValue::Long(byte_count));
}

fn samples_to_le_bytes(samples: &[u16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

fn encode_jpeg(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CaptureError> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    let mut encoder = JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
    encoder
        .encode(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| CaptureError::EncodingFailed(format!("JPEG encoding failed: {}", e)))?;
    Ok(buffer)
}

fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CaptureError> {
    let image = RgbImage::from_raw(width, height, pixels.to_vec()).ok_or_else(|| {
        CaptureError::EncodingFailed("pixel buffer does not match the image dimensions".into())
    })?;
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| CaptureError::EncodingFailed(format!("PNG encoding failed: {}", e)))?;
    Ok(buffer)
}
