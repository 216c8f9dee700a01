pub mod branch;
pub mod format;
pub mod structure;
pub mod task;

pub use branch::*;
pub use format::*;
pub use structure::*;
pub use task::*;
