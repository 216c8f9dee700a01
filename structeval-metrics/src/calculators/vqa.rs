use async_trait::async_trait;
use serde_json::json;
use structeval_core::{MetricCalculator, Result, Verdict};

pub use structeval_core::parse_verdict;

use super::MetricOutput;

/// Share of `true` among the decided verdicts.
///
/// Undecided (`None`) verdicts are left out of the denominator; with no
/// decided verdict at all the score is 0.
pub fn vqa_score(verdicts: &[Verdict]) -> f64 {
    let decided = verdicts.iter().filter(|verdict| verdict.is_some()).count();
    if decided == 0 {
        return 0.0;
    }

    let accepted = verdicts.iter().filter(|verdict| **verdict == Some(true)).count();
    accepted as f64 / decided as f64
}

#[derive(Debug, Clone, Default)]
pub struct VqaScoreCalculator;

impl VqaScoreCalculator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetricCalculator for VqaScoreCalculator {
    type Input = Vec<Verdict>;
    type Output = MetricOutput;

    async fn calculate(&self, input: Self::Input) -> Result<Self::Output> {
        let score = vqa_score(&input);
        let decided = input.iter().filter(|verdict| verdict.is_some()).count();

        Ok(MetricOutput::new(
            score,
            json!({
                "metric": "vqa",
                "questions": input.len(),
                "decided": decided,
            }),
        ))
    }
}
