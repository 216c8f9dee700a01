use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use structeval_core::{
    Branch, CoreError, EvaluationConfig, EvaluationStatus, StructureLoader, TaskRecord,
};
use structeval_metrics::{BatchSummary, FallbackStructureLoader, ScoreAggregator};

use crate::executor::BatchExecutor;
use crate::judge::JudgeConfig;
use crate::scorers::{scorer_for, ScoringContext};

/// Per-task pipeline states. `Scored` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Classify,
    ComputeSignals,
    Aggregate,
    Scored,
    Failed,
}

impl PipelineStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Scored | PipelineStage::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Classify => "classify",
            PipelineStage::ComputeSignals => "compute_signals",
            PipelineStage::Aggregate => "aggregate",
            PipelineStage::Scored => "scored",
            PipelineStage::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scores batches of task records.
///
/// Every record comes back, in input order, with a `final_eval_score`.
/// Problems inside one task are written to that task's record and never
/// abort the batch.
pub struct EvaluationPipeline {
    config: EvaluationConfig,
    loader: Arc<dyn StructureLoader>,
    executor: BatchExecutor,
}

impl EvaluationPipeline {
    pub fn new(config: EvaluationConfig) -> Self {
        Self {
            executor: BatchExecutor::new(config.max_concurrency),
            loader: Arc::new(FallbackStructureLoader::new()),
            config,
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn StructureLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub async fn evaluate(
        &self,
        batch: Vec<TaskRecord>,
        images: HashMap<String, PathBuf>,
        judge: JudgeConfig,
    ) -> Vec<TaskRecord> {
        let judge = match (judge.timeout, self.config.judge_timeout()) {
            (None, Some(timeout)) => judge.with_timeout(timeout),
            _ => judge,
        };

        let context = Arc::new(
            ScoringContext::new(self.config.clone())
                .with_loader(self.loader.clone())
                .with_judge(judge)
                .with_images(images),
        );

        let mut batch = batch;
        for record in &mut batch {
            record.reset_scores();
        }

        let classified = context.classifier.partition(&batch);
        for branch in Branch::ALL {
            tracing::info!(branch = %branch, tasks = classified.count(branch), "classified");
        }
        for (record, branch) in batch.iter_mut().zip(classified.branches()) {
            record.eval_branch = Some(branch);
        }

        let job_context = context.clone();
        let scored = self
            .executor
            .execute_batch(
                batch,
                move |record| score_record(record, job_context.clone()),
                |record, reason| fail_record(record, &context, reason),
            )
            .await;

        let summary = BatchSummary::from_records(&scored);
        tracing::info!(
            tasks = scored.len(),
            failed = summary.failed,
            mean = summary.overall.mean,
            "batch evaluation complete"
        );

        scored
    }
}

impl Default for EvaluationPipeline {
    fn default() -> Self {
        Self::new(EvaluationConfig::default())
    }
}

/// Score a batch with the default configuration and loader.
pub async fn evaluate(
    batch: Vec<TaskRecord>,
    images: HashMap<String, PathBuf>,
    judge: JudgeConfig,
) -> Vec<TaskRecord> {
    EvaluationPipeline::default().evaluate(batch, images, judge).await
}

async fn score_record(mut record: TaskRecord, context: Arc<ScoringContext>) -> TaskRecord {
    let branch = match record.eval_branch {
        Some(branch) => branch,
        None => {
            trace_stage(&record, PipelineStage::Classify);
            let branch = context.classifier.classify(&record);
            record.eval_branch = Some(branch);
            branch
        }
    };

    let scorer = scorer_for(branch);
    trace_stage(&record, PipelineStage::ComputeSignals);
    scorer.score(&mut record, &context).await;

    trace_stage(&record, PipelineStage::Aggregate);
    let score = ScoreAggregator::apply(&mut record, branch);

    let stage = if record.is_failed() {
        PipelineStage::Failed
    } else {
        record.eval_status = Some(EvaluationStatus::Scored);
        PipelineStage::Scored
    };
    tracing::debug!(
        task_id = %record.task_id,
        scorer = scorer.name(),
        stage = %stage,
        score,
        "task finished"
    );

    record
}

fn trace_stage(record: &TaskRecord, stage: PipelineStage) {
    tracing::debug!(task_id = %record.task_id, stage = %stage, "entering stage");
}

/// Zero every signal of a task that could not be scored and aggregate the
/// zeros, so the record still carries a final score.
pub fn fail_record(mut record: TaskRecord, context: &ScoringContext, reason: String) -> TaskRecord {
    let branch = record
        .eval_branch
        .unwrap_or_else(|| context.classifier.classify(&record));

    record.reset_scores();
    record.eval_branch = Some(branch);
    record.raw_output_score = Some(0.0);
    record.raw_output_eval = vec![false; record.raw_output_metric.len()];

    // Only the signals the branch defines; the rest stay null.
    match branch {
        Branch::TextToRenderable | Branch::NonTextToRenderable => {
            record.vqa_score = Some(0.0);
        }
        Branch::TextToNonRenderable => {
            record.key_validation_score = Some(0.0);
            record.output_confidence = Some(0.0);
        }
        Branch::NonTextToNonRenderable => {
            record.key_validation_score = Some(0.0);
            record.output_confidence = Some(0.0);
            record.input_confidence = Some(0.0);
            record.structure_score = Some(0.0);
        }
    }
    record.record_error(CoreError::Internal(reason));

    ScoreAggregator::apply(&mut record, branch);
    record
}
