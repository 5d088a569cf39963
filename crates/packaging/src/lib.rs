pub mod autorest;
pub mod image_builder;
pub mod provision;
pub mod zip_handler;

pub use autorest::*;
pub use image_builder::*;
pub use provision::*;
pub use zip_handler::*;
