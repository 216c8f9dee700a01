use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use structeval_core::{Branch, FormatType, TaskRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScoreStatistics {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p90: f64,
}

impl ScoreStatistics {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;

        Self {
            count,
            mean,
            median: median(&sorted),
            std_dev: variance.sqrt(),
            min: sorted[0],
            max: sorted[count - 1],
            p90: percentile(&sorted, 90.0),
        }
    }
}

fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn percentile(sorted: &[f64], percentile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = (percentile / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[index.min(sorted.len() - 1)]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub count: usize,
}

/// Fixed-width histogram over [0, 1]; a score of exactly 1 lands in the last bin.
pub fn score_histogram(values: &[f64], num_bins: usize) -> Vec<HistogramBin> {
    if num_bins == 0 {
        return Vec::new();
    }

    let width = 1.0 / num_bins as f64;
    let mut counts = vec![0usize; num_bins];
    for value in values {
        let index = ((value.clamp(0.0, 1.0) / width).floor() as usize).min(num_bins - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower_bound: i as f64 * width,
            upper_bound: (i + 1) as f64 * width,
            count,
        })
        .collect()
}

/// Final-score statistics for a scored batch, overall and per group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BatchSummary {
    pub overall: ScoreStatistics,
    pub by_branch: BTreeMap<Branch, ScoreStatistics>,
    pub by_output_format: BTreeMap<String, ScoreStatistics>,
    pub failed: usize,
    pub unscored: usize,
}

impl BatchSummary {
    pub fn from_records(records: &[TaskRecord]) -> Self {
        let mut overall = Vec::new();
        let mut by_branch: BTreeMap<Branch, Vec<f64>> = BTreeMap::new();
        let mut by_format: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut failed = 0;
        let mut unscored = 0;

        for record in records {
            if record.is_failed() {
                failed += 1;
            }
            let Some(score) = record.final_eval_score else {
                unscored += 1;
                continue;
            };

            overall.push(score);
            if let Some(branch) = record.eval_branch {
                by_branch.entry(branch).or_default().push(score);
            }
            let format = record
                .output_format()
                .map(|format: FormatType| format.name().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            by_format.entry(format).or_default().push(score);
        }

        Self {
            overall: ScoreStatistics::from_values(&overall),
            by_branch: by_branch
                .into_iter()
                .map(|(branch, scores)| (branch, ScoreStatistics::from_values(&scores)))
                .collect(),
            by_output_format: by_format
                .into_iter()
                .map(|(format, scores)| (format, ScoreStatistics::from_values(&scores)))
                .collect(),
            failed,
            unscored,
        }
    }
}
