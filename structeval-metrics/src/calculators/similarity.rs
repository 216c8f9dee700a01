use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use structeval_core::{MetricCalculator, Result, Structure, ValueKind};

use super::MetricOutput;

/// Recursive, order-sensitive structural similarity in [0, 1].
///
/// Values of different kinds score 0. Objects weigh the shared-key ratio
/// and the mean similarity of shared values equally; arrays weigh the
/// length ratio and the mean similarity of the zipped prefix equally.
/// Scalars score 1 when equal, else 0.
pub fn structure_similarity(a: &Value, b: &Value) -> f64 {
    if ValueKind::of(a) != ValueKind::of(b) {
        return 0.0;
    }

    match (a, b) {
        (Value::Object(left), Value::Object(right)) => object_similarity(left, right),
        (Value::Array(left), Value::Array(right)) => array_similarity(left, right),
        _ => {
            if a == b {
                1.0
            } else {
                0.0
            }
        }
    }
}

fn object_similarity(left: &Map<String, Value>, right: &Map<String, Value>) -> f64 {
    if left.is_empty() && right.is_empty() {
        return 1.0;
    }

    let shared: Vec<&String> = left.keys().filter(|key| right.contains_key(*key)).collect();
    let key_ratio = shared.len() as f64 / left.len().max(right.len()) as f64;

    if shared.is_empty() {
        return 0.5 * key_ratio;
    }

    let value_sim = shared
        .iter()
        .map(|key| structure_similarity(&left[key.as_str()], &right[key.as_str()]))
        .sum::<f64>()
        / shared.len() as f64;

    0.5 * key_ratio + 0.5 * value_sim
}

fn array_similarity(left: &[Value], right: &[Value]) -> f64 {
    if left.is_empty() && right.is_empty() {
        return 1.0;
    }

    let shorter = left.len().min(right.len());
    let len_ratio = shorter as f64 / left.len().max(right.len()) as f64;

    if shorter == 0 {
        return 0.5 * len_ratio;
    }

    let elem_sim = left
        .iter()
        .zip(right.iter())
        .map(|(l, r)| structure_similarity(l, r))
        .sum::<f64>()
        / shorter as f64;

    0.5 * len_ratio + 0.5 * elem_sim
}

/// Similarity between two parsed payloads. Tables compare as their rows,
/// header row first.
pub fn structures_similarity(a: &Structure, b: &Structure) -> f64 {
    structure_similarity(&a.as_rows_value(), &b.as_rows_value())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityInput {
    pub reference: Structure,
    pub candidate: Structure,
}

#[derive(Debug, Clone, Default)]
pub struct StructureSimilarityCalculator;

impl StructureSimilarityCalculator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetricCalculator for StructureSimilarityCalculator {
    type Input = SimilarityInput;
    type Output = MetricOutput;

    async fn calculate(&self, input: Self::Input) -> Result<Self::Output> {
        let score = structures_similarity(&input.reference, &input.candidate);

        Ok(MetricOutput::new(
            score,
            json!({
                "metric": "structure_similarity",
                "reference_kind": input.reference.kind(),
                "candidate_kind": input.candidate.kind(),
            }),
        ))
    }
}
