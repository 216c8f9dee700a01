pub mod classifier;
pub mod executor;
pub mod judge;
pub mod pipeline;
pub mod scorers;

pub use classifier::*;
pub use executor::*;
pub use judge::*;
pub use pipeline::*;
pub use scorers::*;
