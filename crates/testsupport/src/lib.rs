//! Fakes and fixtures shared by the integration tests of the workspace.

pub mod github;
pub mod helpers;

pub use github::*;
pub use helpers::*;
