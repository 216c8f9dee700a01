pub mod extraction;
pub mod keyword;
pub mod path;
pub mod similarity;
pub mod vqa;

pub use extraction::*;
pub use keyword::*;
pub use path::*;
pub use similarity::*;
pub use vqa::*;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricOutput {
    pub score: Decimal,
    pub metadata: serde_json::Value,
}

impl MetricOutput {
    pub fn new(score: f64, metadata: serde_json::Value) -> Self {
        Self {
            score: Decimal::try_from(score).unwrap_or_default(),
            metadata,
        }
    }
}
