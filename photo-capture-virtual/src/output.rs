//! Virtual photo output.
//!
//! Serves capture requests from the synthetic sensor. Each request gets a
//! dedicated delivery thread that renders the scene and walks the delegate
//! through the same sequence a real camera stack would: RAW photo,
//! processed photo, capture finished.

use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use photo_capture_core::models::camera_models::VideoDeviceInfo;
use photo_capture_core::models::error::CaptureError;
use photo_capture_core::models::formats::{
    BayerPattern, ProcessedCodec, RawPixelFormat, ThumbnailFormat,
};
use photo_capture_core::models::photo::{CapturedPhoto, PhotoPayload, PreviewImage};
use photo_capture_core::models::settings::{
    CaptureRequestId, PhotoCaptureSettings, ResolvedCaptureSettings,
};
use photo_capture_core::traits::camera::{PhotoCaptureDelegate, PhotoOutput};
use photo_capture_core::traits::thumbnail::ThumbnailCustomizer;

use crate::isp;
use crate::sensor::{self, SensorConfig};

/// Tuning for the virtual output.
#[derive(Debug, Clone)]
pub struct VirtualCaptureConfig {
    pub sensor: SensorConfig,
    /// Artificial delay before a delivery thread starts delivering, to make
    /// in-flight captures observable.
    pub delivery_delay: Duration,
    /// Longest edge of the preview embedded into RAW captures. Zero
    /// disables the embedded preview.
    pub thumbnail_max_dim: u32,
}

impl Default for VirtualCaptureConfig {
    fn default() -> Self {
        Self {
            sensor: SensorConfig::default(),
            delivery_delay: Duration::ZERO,
            thumbnail_max_dim: 160,
        }
    }
}

struct OutputInner {
    camera: VideoDeviceInfo,
    config: VirtualCaptureConfig,
}

/// Photo output backed by the synthetic sensor.
///
/// Advertises a linear format first and a Bayer format second, so format
/// selection by callers is observable. The delegate is only held weakly by
/// the delivery thread; a request whose delegate has been dropped delivers
/// into the void.
pub struct VirtualPhotoOutput {
    inner: Arc<OutputInner>,
    deliveries: Mutex<Vec<thread::JoinHandle<()>>>,
}

impl VirtualPhotoOutput {
    pub fn new(camera: VideoDeviceInfo, config: VirtualCaptureConfig) -> Self {
        Self {
            inner: Arc::new(OutputInner { camera, config }),
            deliveries: Mutex::new(Vec::new()),
        }
    }

    /// Block until every delivery thread spawned so far has exited.
    pub fn drain_deliveries(&self) {
        let handles: Vec<_> = self.deliveries.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.join();
        }
    }

    fn facade(inner: &Arc<OutputInner>) -> Self {
        Self {
            inner: Arc::clone(inner),
            deliveries: Mutex::new(Vec::new()),
        }
    }
}

impl PhotoOutput for VirtualPhotoOutput {
    fn available_raw_formats(&self) -> Vec<RawPixelFormat> {
        vec![
            RawPixelFormat::Linear { bits_per_sample: 16 },
            RawPixelFormat::Bayer {
                pattern: BayerPattern::Rggb,
                bits_per_sample: self.inner.config.sensor.bits_per_sample,
            },
        ]
    }

    fn capture_photo(
        &self,
        settings: &PhotoCaptureSettings,
        delegate: Weak<dyn PhotoCaptureDelegate>,
    ) -> Result<(), CaptureError> {
        if !self.available_raw_formats().contains(&settings.raw_format) {
            return Err(CaptureError::InvalidRequest(format!(
                "RAW format {:?} is not advertised by this output",
                settings.raw_format
            )));
        }

        let inner = Arc::clone(&self.inner);
        let settings = settings.clone();
        let handle = thread::Builder::new()
            .name("photo-delivery".into())
            .spawn(move || deliver_capture(inner, settings, delegate))
            .map_err(|e| {
                CaptureError::ProcessingFailed(format!("failed to spawn delivery thread: {}", e))
            })?;
        let mut deliveries = self.deliveries.lock();
        // Completed deliveries are pruned here so long-lived outputs do not
        // accumulate a handle per capture.
        deliveries.retain(|delivery| !delivery.is_finished());
        deliveries.push(handle);
        Ok(())
    }

    fn file_data_representation(
        &self,
        photo: &CapturedPhoto,
        customizer: &dyn ThumbnailCustomizer,
    ) -> Option<Vec<u8>> {
        let mut replacement_format = None;
        let replacement = customizer.replacement_embedded_thumbnail(photo, &mut replacement_format);

        let result = if photo.is_raw_photo() {
            let preview = replacement.or_else(|| photo.embedded_thumbnail.clone());
            isp::encode_dng(photo, preview.as_ref(), &self.inner.camera)
        } else {
            isp::encode_processed(photo)
        };
        match result {
            Ok(data) => Some(data),
            Err(e) => {
                log::error!("Error flattening photo of request {}: {}", photo.request_id, e);
                None
            }
        }
    }
}

/// Delivery sequence for one capture request.
///
/// 1. Wait out the configured delay
/// 2. Render the scene for the request id
/// 3. Deliver the RAW photo, then the processed photo
/// 4. Deliver the capture-finished event
fn deliver_capture(
    inner: Arc<OutputInner>,
    settings: PhotoCaptureSettings,
    delegate: Weak<dyn PhotoCaptureDelegate>,
) {
    let output = VirtualPhotoOutput::facade(&inner);
    let sensor_config = inner.config.sensor;
    let width = sensor_config.width;
    let height = sensor_config.height;

    if !inner.config.delivery_delay.is_zero() {
        thread::sleep(inner.config.delivery_delay);
    }

    let scene = sensor::render_scene(width, height, settings.id.value());
    let thumbnail = embedded_thumbnail(&inner, &scene);

    let raw_payload = match settings.raw_format {
        RawPixelFormat::Bayer { pattern, bits_per_sample } => PhotoPayload::Bayer {
            samples: sensor::mosaic_bayer(
                &scene,
                width,
                height,
                pattern,
                sensor_config.black_level,
                sensor_config.white_level,
            ),
            pattern,
            bits_per_sample,
            black_level: sensor_config.black_level,
            white_level: sensor_config.white_level,
        },
        RawPixelFormat::Linear { .. } => PhotoPayload::LinearRgb16 {
            samples: sensor::render_linear16(&scene),
        },
    };
    let raw_photo = CapturedPhoto {
        request_id: settings.id,
        width,
        height,
        payload: raw_payload,
        embedded_thumbnail: thumbnail.as_ref().map(|(preview, _)| preview.clone()),
        embedded_thumbnail_format: thumbnail.as_ref().map(|(_, format)| *format),
    };
    deliver_photo(&output, &delegate, raw_photo, settings.id);

    let processed_photo = CapturedPhoto {
        request_id: settings.id,
        width,
        height,
        payload: PhotoPayload::Rgb8 {
            pixels: scene,
            codec: settings.processed_codec,
        },
        embedded_thumbnail: None,
        embedded_thumbnail_format: None,
    };
    deliver_photo(&output, &delegate, processed_photo, settings.id);

    let resolved = ResolvedCaptureSettings::from_settings(&settings, width, height);
    match delegate.upgrade() {
        Some(delegate) => delegate.on_capture_finished(&output, &resolved, None),
        None => log::debug!(
            "Delegate for request {} dropped before the capture finished",
            settings.id
        ),
    }
}

fn deliver_photo(
    output: &VirtualPhotoOutput,
    delegate: &Weak<dyn PhotoCaptureDelegate>,
    photo: CapturedPhoto,
    request_id: CaptureRequestId,
) {
    match delegate.upgrade() {
        Some(delegate) => delegate.on_photo_processed(output, photo, None),
        None => log::debug!("Delegate for request {} dropped; photo discarded", request_id),
    }
}

fn embedded_thumbnail(inner: &OutputInner, scene: &[u8]) -> Option<(PreviewImage, ThumbnailFormat)> {
    let max_dim = inner.config.thumbnail_max_dim;
    if max_dim == 0 {
        return None;
    }
    let (pixels, width, height) = sensor::downscale_rgb(
        scene,
        inner.config.sensor.width,
        inner.config.sensor.height,
        max_dim,
    );
    Some((
        PreviewImage { width, height, pixels },
        ThumbnailFormat {
            codec: ProcessedCodec::Jpeg,
            max_width: max_dim,
            max_height: max_dim,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    use photo_capture_core::models::camera_models::DevicePosition;
    use photo_capture_core::traits::thumbnail::PreserveEmbeddedThumbnail;

    fn camera() -> VideoDeviceInfo {
        VideoDeviceInfo {
            id: "virtual-back-0".into(),
            name: "Virtual Back Camera".into(),
            position: DevicePosition::Back,
        }
    }

    fn small_config() -> VirtualCaptureConfig {
        VirtualCaptureConfig {
            sensor: SensorConfig {
                width: 32,
                height: 24,
                ..SensorConfig::default()
            },
            ..VirtualCaptureConfig::default()
        }
    }

    /// Delegate fake forwarding every event into a channel.
    struct ChannelDelegate {
        events: mpsc::Sender<Event>,
    }

    enum Event {
        Photo(CapturedPhoto),
        Finished(ResolvedCaptureSettings),
    }

    impl PhotoCaptureDelegate for ChannelDelegate {
        fn on_photo_processed(
            &self,
            _output: &dyn PhotoOutput,
            photo: CapturedPhoto,
            error: Option<CaptureError>,
        ) {
            assert!(error.is_none());
            let _ = self.events.send(Event::Photo(photo));
        }

        fn on_capture_finished(
            &self,
            _output: &dyn PhotoOutput,
            settings: &ResolvedCaptureSettings,
            error: Option<CaptureError>,
        ) {
            assert!(error.is_none());
            let _ = self.events.send(Event::Finished(settings.clone()));
        }
    }

    fn capture(
        output: &VirtualPhotoOutput,
        settings: &PhotoCaptureSettings,
    ) -> mpsc::Receiver<Event> {
        let (tx, rx) = mpsc::channel();
        let delegate = Arc::new(ChannelDelegate { events: tx });
        let weak = Arc::downgrade(&delegate) as Weak<dyn PhotoCaptureDelegate>;
        output.capture_photo(settings, weak).unwrap();
        // The delivery thread only holds the delegate weakly; keep it alive
        // until every event has drained.
        output.drain_deliveries();
        drop(delegate);
        rx
    }

    #[test]
    fn advertises_linear_before_bayer() {
        let output = VirtualPhotoOutput::new(camera(), small_config());
        let formats = output.available_raw_formats();
        assert_eq!(formats.len(), 2);
        assert!(!formats[0].is_bayer());
        assert!(formats[1].is_bayer());
    }

    #[test]
    fn delivers_raw_then_processed_then_finished() {
        let output = VirtualPhotoOutput::new(camera(), small_config());
        let format = output.available_raw_formats()[1];
        let settings = PhotoCaptureSettings::raw_with_processed(format, ProcessedCodec::Jpeg);

        let rx = capture(&output, &settings);
        let events: Vec<Event> = rx.try_iter().collect();
        assert_eq!(events.len(), 3);

        match &events[0] {
            Event::Photo(photo) => {
                assert!(photo.is_raw_photo());
                assert_eq!(photo.request_id, settings.id);
                assert_eq!((photo.width, photo.height), (32, 24));
                assert!(photo.embedded_thumbnail.is_some());
            }
            _ => panic!("expected the RAW photo first"),
        }
        match &events[1] {
            Event::Photo(photo) => {
                assert!(!photo.is_raw_photo());
                assert!(matches!(
                    photo.payload,
                    PhotoPayload::Rgb8 { codec: ProcessedCodec::Jpeg, .. }
                ));
            }
            _ => panic!("expected the processed photo second"),
        }
        match &events[2] {
            Event::Finished(resolved) => {
                assert_eq!(resolved.id, settings.id);
                assert_eq!((resolved.width, resolved.height), (32, 24));
            }
            _ => panic!("expected the finish event last"),
        }
    }

    #[test]
    fn unadvertised_format_is_rejected() {
        let output = VirtualPhotoOutput::new(camera(), small_config());
        let settings = PhotoCaptureSettings::raw_with_processed(
            RawPixelFormat::Bayer {
                pattern: BayerPattern::Gbrg,
                bits_per_sample: 10,
            },
            ProcessedCodec::Jpeg,
        );
        let (tx, _rx) = mpsc::channel::<Event>();
        let delegate = Arc::new(ChannelDelegate { events: tx });
        let weak = Arc::downgrade(&delegate) as Weak<dyn PhotoCaptureDelegate>;

        let result = output.capture_photo(&settings, weak);
        assert!(matches!(result, Err(CaptureError::InvalidRequest(_))));
    }

    #[test]
    fn dropped_delegate_discards_the_delivery() {
        let output = VirtualPhotoOutput::new(camera(), small_config());
        let format = output.available_raw_formats()[1];
        let settings = PhotoCaptureSettings::raw_with_processed(format, ProcessedCodec::Jpeg);

        let (tx, rx) = mpsc::channel();
        let delegate = Arc::new(ChannelDelegate { events: tx });
        let weak = Arc::downgrade(&delegate) as Weak<dyn PhotoCaptureDelegate>;
        drop(delegate);

        output.capture_photo(&settings, weak).unwrap();
        output.drain_deliveries();
        assert!(rx.try_iter().next().is_none());
    }

    #[test]
    fn finished_deliveries_are_pruned_on_the_next_capture() {
        let output = VirtualPhotoOutput::new(camera(), small_config());
        let format = output.available_raw_formats()[1];

        let (tx, rx) = mpsc::channel();
        let delegate = Arc::new(ChannelDelegate { events: tx });
        let weak = Arc::downgrade(&delegate) as Weak<dyn PhotoCaptureDelegate>;

        let first = PhotoCaptureSettings::raw_with_processed(format, ProcessedCodec::Jpeg);
        output.capture_photo(&first, weak.clone()).unwrap();
        for _ in 0..3 {
            rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }
        // The last event precedes thread exit; wait the handle out.
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !output.deliveries.lock().iter().all(|h| h.is_finished()) {
            assert!(
                std::time::Instant::now() < deadline,
                "delivery thread never exited"
            );
            thread::sleep(Duration::from_millis(5));
        }

        let second = PhotoCaptureSettings::raw_with_processed(format, ProcessedCodec::Jpeg);
        output.capture_photo(&second, weak).unwrap();
        assert_eq!(output.deliveries.lock().len(), 1);

        output.drain_deliveries();
    }

    #[test]
    fn same_request_renders_the_same_scene() {
        let output = VirtualPhotoOutput::new(camera(), small_config());
        let format = output.available_raw_formats()[1];
        let settings = PhotoCaptureSettings::raw_with_processed(format, ProcessedCodec::Jpeg);

        let first: Vec<Event> = capture(&output, &settings).try_iter().collect();
        let second: Vec<Event> = capture(&output, &settings).try_iter().collect();
        match (&first[0], &second[0]) {
            (Event::Photo(a), Event::Photo(b)) => assert_eq!(a.payload, b.payload),
            _ => panic!("expected RAW photos"),
        }
    }

    #[test]
    fn flattens_raw_photos_with_the_embedded_preview() {
        let output = VirtualPhotoOutput::new(camera(), small_config());
        let format = output.available_raw_formats()[1];
        let settings = PhotoCaptureSettings::raw_with_processed(format, ProcessedCodec::Jpeg);

        let events: Vec<Event> = capture(&output, &settings).try_iter().collect();
        let Event::Photo(raw_photo) = &events[0] else {
            panic!("expected the RAW photo first");
        };
        let data = output
            .file_data_representation(raw_photo, &PreserveEmbeddedThumbnail)
            .unwrap();
        assert_eq!(&data[..4], &[0x49, 0x49, 0x2A, 0x00]);
    }

    /// Customizer that swaps the preview for a single red pixel.
    struct SolidThumbnail;

    impl ThumbnailCustomizer for SolidThumbnail {
        fn replacement_embedded_thumbnail(
            &self,
            _photo: &CapturedPhoto,
            format_out: &mut Option<ThumbnailFormat>,
        ) -> Option<PreviewImage> {
            *format_out = Some(ThumbnailFormat {
                codec: ProcessedCodec::Png,
                max_width: 1,
                max_height: 1,
            });
            Some(PreviewImage {
                width: 1,
                height: 1,
                pixels: vec![255, 0, 0],
            })
        }
    }

    #[test]
    fn replacing_customizer_swaps_the_embedded_preview() {
        let output = VirtualPhotoOutput::new(camera(), small_config());
        let format = output.available_raw_formats()[1];
        let settings = PhotoCaptureSettings::raw_with_processed(format, ProcessedCodec::Jpeg);

        let events: Vec<Event> = capture(&output, &settings).try_iter().collect();
        let Event::Photo(raw_photo) = &events[0] else {
            panic!("expected the RAW photo first");
        };

        let preserved = output
            .file_data_representation(raw_photo, &PreserveEmbeddedThumbnail)
            .unwrap();
        let replaced = output
            .file_data_representation(raw_photo, &SolidThumbnail)
            .unwrap();
        assert_eq!(&replaced[..4], &[0x49, 0x49, 0x2A, 0x00]);
        // A one-pixel preview strip is far smaller than the sensor-sized one.
        assert!(replaced.len() < preserved.len());
    }

    #[test]
    fn zero_thumbnail_dim_disables_the_preview() {
        let mut config = small_config();
        config.thumbnail_max_dim = 0;
        let output = VirtualPhotoOutput::new(camera(), config);
        let format = output.available_raw_formats()[1];
        let settings = PhotoCaptureSettings::raw_with_processed(format, ProcessedCodec::Jpeg);

        let events: Vec<Event> = capture(&output, &settings).try_iter().collect();
        let Event::Photo(raw_photo) = &events[0] else {
            panic!("expected the RAW photo first");
        };
        assert!(raw_photo.embedded_thumbnail.is_none());
        assert!(raw_photo.embedded_thumbnail_format.is_none());
    }
}
