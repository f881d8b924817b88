//! # photo-capture-virtual
//!
//! Virtual camera backend for photo-capture-kit.
//!
//! Provides:
//! - `VirtualVideoDevice` — A synthetic, always-connected back camera
//! - `VirtualPhotoOutput` — Photo output rendering deterministic test scenes
//! - `sensor` — Scene rendering, Bayer mosaicing, linear expansion
//! - `isp` — DNG / JPEG / PNG container flattening
//!
//! ## Usage
//! ```ignore
//! use photo_capture_core::{CaptureCoordinator, CoordinatorConfig, FsPhotoLibrary, VideoDevice};
//! use photo_capture_virtual::{VirtualCaptureConfig, VirtualPhotoOutput, VirtualVideoDevice};
//! use std::sync::Arc;
//!
//! let device = Arc::new(VirtualVideoDevice::default_device().unwrap());
//! let output = Arc::new(VirtualPhotoOutput::new(device.info(), VirtualCaptureConfig::default()));
//! let library = Arc::new(FsPhotoLibrary::open("/tmp/photos".into()).unwrap());
//! let coordinator = CaptureCoordinator::new(
//!     Some(device),
//!     output,
//!     library,
//!     CoordinatorConfig::default(),
//! )
//! .unwrap();
//! ```

pub mod device;
pub mod isp;
pub mod output;
pub mod sensor;

pub use device::VirtualVideoDevice;
pub use output::{VirtualCaptureConfig, VirtualPhotoOutput};
