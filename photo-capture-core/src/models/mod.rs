pub mod camera_models;
pub mod config;
pub mod error;
pub mod formats;
pub mod photo;
pub mod settings;
pub mod state;
