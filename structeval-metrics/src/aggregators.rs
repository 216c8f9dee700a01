use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use structeval_core::{Branch, TaskRecord};

/// Per-branch weights of the final score. Fixed constants: changing them
/// breaks comparability with previously published scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub render: f64,
    pub raw_output: f64,
    pub vqa: f64,
    pub structure: f64,
}

pub const RENDERABLE_WEIGHTS: ScoreWeights = ScoreWeights {
    render: 0.4,
    raw_output: 0.2,
    vqa: 0.4,
    structure: 0.0,
};

pub const TEXT_NON_RENDERABLE_WEIGHTS: ScoreWeights = ScoreWeights {
    render: 0.4,
    raw_output: 0.6,
    vqa: 0.0,
    structure: 0.0,
};

pub const NON_TEXT_NON_RENDERABLE_WEIGHTS: ScoreWeights = ScoreWeights {
    render: 0.4,
    raw_output: 0.2,
    vqa: 0.0,
    structure: 0.4,
};

impl ScoreWeights {
    pub fn for_branch(branch: Branch) -> Self {
        match branch {
            Branch::TextToRenderable | Branch::NonTextToRenderable => RENDERABLE_WEIGHTS,
            Branch::TextToNonRenderable => TEXT_NON_RENDERABLE_WEIGHTS,
            Branch::NonTextToNonRenderable => NON_TEXT_NON_RENDERABLE_WEIGHTS,
        }
    }
}

/// The partial signals feeding the final score; absent signals are 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub render: f64,
    pub raw_output: f64,
    pub vqa: f64,
    pub structure: f64,
}

impl ScoreComponents {
    pub fn from_record(record: &TaskRecord) -> Self {
        Self {
            render: record.render_score.unwrap_or(0.0),
            raw_output: record.raw_output_score.unwrap_or(0.0),
            vqa: record.vqa_score.unwrap_or(0.0),
            structure: record.structure_score.unwrap_or(0.0),
        }
    }
}

pub struct ScoreAggregator;

impl ScoreAggregator {
    /// Weighted sum for `branch`, rounded to two decimals.
    pub fn combine(branch: Branch, components: &ScoreComponents) -> f64 {
        let weights = ScoreWeights::for_branch(branch);
        let raw = weights.render * components.render
            + weights.raw_output * components.raw_output
            + weights.vqa * components.vqa
            + weights.structure * components.structure;

        round_score(raw.clamp(0.0, 1.0))
    }

    /// Write `final_eval_score` onto `record` and return it.
    pub fn apply(record: &mut TaskRecord, branch: Branch) -> f64 {
        let score = Self::combine(branch, &ScoreComponents::from_record(record));
        record.final_eval_score = Some(score);
        score
    }
}

/// Round half-to-even at two decimals on the exact binary value, so
/// `0.42500000000000004` goes up and only true ties like `0.125` go to even.
pub fn round_score(value: f64) -> f64 {
    let decimal = Decimal::from_f64_retain(value).unwrap_or_default();
    let rounded = decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    f64::try_from(rounded).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        for branch in Branch::ALL {
            let w = ScoreWeights::for_branch(branch);
            let total = w.render + w.raw_output + w.vqa + w.structure;
            assert!((total - 1.0).abs() < 1e-9, "{branch} weights sum to {total}");
        }
    }
}
