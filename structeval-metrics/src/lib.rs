pub mod aggregators;
pub mod calculators;
pub mod loader;
pub mod statistical;

pub use aggregators::*;
pub use calculators::*;
pub use loader::*;
pub use statistical::*;
