use async_trait::async_trait;
use std::path::Path;

use crate::domain::{FormatType, LoadedStructure, Verdict, VqaItem};
use crate::error::Result;

#[async_trait]
pub trait MetricCalculator {
    type Input;
    type Output;

    async fn calculate(&self, input: Self::Input) -> Result<Self::Output>;
}

/// Turns raw payload text into a parsed structure plus a confidence in [0, 1].
///
/// Parse failure is not an error: it is reported as confidence 0.
pub trait StructureLoader: Send + Sync {
    fn load(&self, text: &str, hint: Option<FormatType>) -> LoadedStructure;
}

/// Multimodal judge deciding whether a rendered image shows the expected
/// answer to each question.
///
/// Implementations return one verdict per item, in order.
#[async_trait]
pub trait VqaJudge: Send + Sync {
    async fn judge(&self, image: &Path, items: &[VqaItem]) -> Result<Vec<Verdict>>;

    fn name(&self) -> &str;
}
