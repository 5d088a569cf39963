pub mod ci;
pub mod error;
pub mod image;
pub mod sdk_config;
pub mod settings;

pub use ci::*;
pub use error::*;
pub use image::*;
pub use sdk_config::*;
pub use settings::*;
