pub mod camera;
pub mod thumbnail;
