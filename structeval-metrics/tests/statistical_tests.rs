use approx::assert_relative_eq;
use pretty_assertions::assert_eq;
use structeval_core::{Branch, EvaluationStatus, TaskRecord};
use structeval_metrics::*;

// ===== ScoreStatistics Tests =====

#[test]
fn test_statistics_basic() {
    let stats = ScoreStatistics::from_values(&[0.2, 0.4, 0.6, 0.8, 1.0]);

    assert_eq!(stats.count, 5);
    assert_relative_eq!(stats.mean, 0.6, epsilon = 1e-12);
    assert_relative_eq!(stats.median, 0.6, epsilon = 1e-12);
    assert_eq!(stats.min, 0.2);
    assert_eq!(stats.max, 1.0);
    assert_eq!(stats.p90, 1.0);
    assert_relative_eq!(stats.std_dev, 0.08f64.sqrt(), epsilon = 1e-12);
}

#[test]
fn test_statistics_even_median() {
    let stats = ScoreStatistics::from_values(&[0.1, 0.9, 0.3, 0.5]);
    assert_relative_eq!(stats.median, 0.4, epsilon = 1e-12);
}

#[test]
fn test_statistics_empty() {
    assert_eq!(ScoreStatistics::from_values(&[]), ScoreStatistics::default());
}

// ===== Histogram Tests =====

#[test]
fn test_histogram_bins() {
    let bins = score_histogram(&[0.0, 0.1, 0.5, 0.99, 1.0], 4);

    assert_eq!(bins.len(), 4);
    let counts: Vec<usize> = bins.iter().map(|bin| bin.count).collect();
    assert_eq!(counts, vec![2, 0, 1, 2]);
    assert_eq!(bins[0].lower_bound, 0.0);
    assert_eq!(bins[3].upper_bound, 1.0);
}

#[test]
fn test_histogram_without_bins() {
    assert!(score_histogram(&[0.5], 0).is_empty());
}

// ===== BatchSummary Tests =====

fn scored(task_id: &str, branch: Branch, score: f64) -> TaskRecord {
    let mut record = TaskRecord::new(task_id, "q", "g");
    record.eval_branch = Some(branch);
    record.eval_status = Some(EvaluationStatus::Scored);
    record.final_eval_score = Some(score);
    record
}

#[test]
fn test_batch_summary_groups() {
    let mut failed = scored("0005", Branch::TextToNonRenderable, 0.0);
    failed.record_error("parse failure");

    let records = vec![
        scored("0004", Branch::TextToRenderable, 0.8),
        scored("0004", Branch::TextToRenderable, 0.6),
        scored("0005", Branch::TextToNonRenderable, 1.0),
        failed,
        TaskRecord::new("0018", "q", "g"),
    ];

    let summary = BatchSummary::from_records(&records);

    assert_eq!(summary.overall.count, 4);
    assert_relative_eq!(summary.overall.mean, 0.6, epsilon = 1e-12);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.unscored, 1);

    let renderable = &summary.by_branch[&Branch::TextToRenderable];
    assert_eq!(renderable.count, 2);
    assert_relative_eq!(renderable.mean, 0.7, epsilon = 1e-12);

    assert_eq!(summary.by_output_format["HTML"].count, 2);
    assert_eq!(summary.by_output_format["JSON"].count, 2);
    assert!(!summary.by_output_format.contains_key("YAML"));
}

#[test]
fn test_batch_summary_serializes() {
    let summary = BatchSummary::from_records(&[scored("0005", Branch::TextToNonRenderable, 1.0)]);
    let value = serde_json::to_value(&summary).unwrap();

    assert_eq!(value["by_branch"]["text_to_non_renderable"]["count"], 1);
}
