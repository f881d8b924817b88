pub mod asset;
pub mod fs_library;
pub mod photo_library;
