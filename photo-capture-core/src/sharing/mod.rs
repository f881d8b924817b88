pub mod exporter;
pub mod presenter;
