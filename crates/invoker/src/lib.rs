pub mod autorest;
pub mod docker;
pub mod git;

pub use autorest::*;
pub use docker::*;
pub use git::*;
