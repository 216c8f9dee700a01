pub mod domain;
pub mod error;
pub mod settings;
pub mod traits;

pub use domain::*;
pub use error::*;
pub use settings::*;
pub use traits::*;
