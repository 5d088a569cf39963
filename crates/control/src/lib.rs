pub mod branch;
pub mod composite;
pub mod glob;
pub mod initial_pr;
pub mod pipeline;
pub mod publish;
pub mod selection;
pub mod update;
pub mod workspace;

pub use branch::*;
pub use composite::*;
pub use initial_pr::*;
pub use pipeline::*;
pub use publish::*;
pub use selection::*;
pub use update::*;
pub use workspace::*;
