pub mod commands;
pub mod import;

pub use import::{import_images, is_supported_image, scan_inputs, ScanResult};
