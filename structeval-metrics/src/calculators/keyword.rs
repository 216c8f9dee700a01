use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use structeval_core::{MetricCalculator, Result};

use super::MetricOutput;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCoverage {
    pub score: f64,
    /// One verdict per keyword, in checklist order.
    pub verdicts: Vec<bool>,
}

/// Case-insensitive substring coverage of `keywords` in `generation`.
///
/// An empty checklist verifies nothing and scores 0.
pub fn keyword_coverage<S: AsRef<str>>(generation: &str, keywords: &[S]) -> KeywordCoverage {
    let haystack = generation.to_lowercase();
    let verdicts: Vec<bool> = keywords
        .iter()
        .map(|keyword| haystack.contains(&keyword.as_ref().to_lowercase()))
        .collect();

    let score = if verdicts.is_empty() {
        0.0
    } else {
        verdicts.iter().filter(|hit| **hit).count() as f64 / verdicts.len() as f64
    };

    KeywordCoverage { score, verdicts }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordInput {
    pub generation: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct KeywordCalculator;

impl KeywordCalculator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetricCalculator for KeywordCalculator {
    type Input = KeywordInput;
    type Output = MetricOutput;

    async fn calculate(&self, input: Self::Input) -> Result<Self::Output> {
        let coverage = keyword_coverage(&input.generation, &input.keywords);

        Ok(MetricOutput::new(
            coverage.score,
            json!({
                "metric": "keyword_coverage",
                "total_keywords": input.keywords.len(),
                "verdicts": coverage.verdicts,
            }),
        ))
    }
}
