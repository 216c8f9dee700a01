use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use structeval_core::{
    Branch, CoreError, EvaluationConfig, LoadedStructure, StructureLoader, TaskRecord,
};
use structeval_metrics::{
    keyword_coverage, path_coverage, structures_similarity, FallbackStructureLoader,
    PayloadExtractor,
};

use crate::classifier::TaskClassifier;
use crate::judge::{run_vqa, JudgeConfig, VqaOutcome};

/// Read-only state shared by every task of a batch.
pub struct ScoringContext {
    pub config: EvaluationConfig,
    pub classifier: TaskClassifier,
    pub extractor: PayloadExtractor,
    pub loader: Arc<dyn StructureLoader>,
    pub judge: JudgeConfig,
    /// Rendered screenshot per task id.
    pub images: HashMap<String, PathBuf>,
}

impl ScoringContext {
    pub fn new(config: EvaluationConfig) -> Self {
        Self {
            classifier: TaskClassifier::new(config.extraction.open_marker.clone()),
            extractor: PayloadExtractor::new(config.extraction.clone()),
            loader: Arc::new(FallbackStructureLoader::new()),
            judge: JudgeConfig::unavailable(),
            images: HashMap::new(),
            config,
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn StructureLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_judge(mut self, judge: JudgeConfig) -> Self {
        self.judge = judge;
        self
    }

    pub fn with_images(mut self, images: HashMap<String, PathBuf>) -> Self {
        self.images = images;
        self
    }
}

impl Default for ScoringContext {
    fn default() -> Self {
        Self::new(EvaluationConfig::default())
    }
}

/// Computes the partial signals of one branch onto a record. Scorers never
/// fail: problems are written to the record and the affected signal is 0.
#[async_trait]
pub trait BranchScorer: Send + Sync {
    async fn score(&self, record: &mut TaskRecord, ctx: &ScoringContext);

    fn name(&self) -> &str;
}

pub fn scorer_for(branch: Branch) -> &'static dyn BranchScorer {
    match branch {
        Branch::TextToRenderable | Branch::NonTextToRenderable => &RenderableScorer,
        Branch::TextToNonRenderable => &TextToNonRenderableScorer,
        Branch::NonTextToNonRenderable => &NonTextToNonRenderableScorer,
    }
}

/// Keyword coverage of the generation plus visual question answering.
pub struct RenderableScorer;

#[async_trait]
impl BranchScorer for RenderableScorer {
    async fn score(&self, record: &mut TaskRecord, ctx: &ScoringContext) {
        let coverage = keyword_coverage(&record.generation, &record.raw_output_metric);
        record.raw_output_score = Some(coverage.score);
        record.raw_output_eval = coverage.verdicts;

        let image = ctx.images.get(record.task_id.as_str()).map(PathBuf::as_path);
        let outcome = run_vqa(&ctx.judge, image, &record.vqa_metric).await;
        record.vqa_score = outcome.score();

        match outcome {
            VqaOutcome::Scored { verdicts, .. } => record.vqa_eval = verdicts,
            VqaOutcome::Unavailable => record.vqa_eval.clear(),
            VqaOutcome::Degraded(err) => {
                tracing::warn!(task_id = %record.task_id, error = %err, "VQA degraded to 0");
                record.vqa_eval.clear();
                record.record_error(err);
            }
        }
    }

    fn name(&self) -> &str {
        "renderable"
    }
}

/// Path checklist against the parsed output.
pub struct TextToNonRenderableScorer;

#[async_trait]
impl BranchScorer for TextToNonRenderableScorer {
    async fn score(&self, record: &mut TaskRecord, ctx: &ScoringContext) {
        record.vqa_score = None;
        record.vqa_eval.clear();
        validate_output(record, ctx);
    }

    fn name(&self) -> &str {
        "text_to_non_renderable"
    }
}

/// Path checklist plus similarity between the input and output structures.
pub struct NonTextToNonRenderableScorer;

#[async_trait]
impl BranchScorer for NonTextToNonRenderableScorer {
    async fn score(&self, record: &mut TaskRecord, ctx: &ScoringContext) {
        record.vqa_score = None;
        record.vqa_eval.clear();

        let output = validate_output(record, ctx);
        let input = load_payload(record, ctx, PayloadSide::Input);
        record.input_confidence = Some(input.confidence);

        let threshold = ctx.config.structure_confidence_threshold;
        let score = match (input.trusted(threshold), output.trusted(threshold)) {
            (Some(input), Some(output)) => structures_similarity(input, output),
            _ => 0.0,
        };
        record.structure_score = Some(score);
    }

    fn name(&self) -> &str {
        "non_text_to_non_renderable"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PayloadSide {
    Input,
    Output,
}

fn load_payload(record: &mut TaskRecord, ctx: &ScoringContext, side: PayloadSide) -> LoadedStructure {
    let (text, hint) = match side {
        PayloadSide::Input => (&record.query, record.input_format()),
        PayloadSide::Output => (&record.generation, record.output_format()),
    };

    let payload = match ctx.extractor.extract(text, hint) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(task_id = %record.task_id, ?side, error = %err, "payload extraction failed");
            record.record_error(err);
            return LoadedStructure::failed();
        }
    };

    let loaded = ctx.loader.load(&payload, hint);
    if !loaded.is_parsed() {
        let err = CoreError::ParseFailure(format!("{side:?} payload did not parse"));
        tracing::warn!(task_id = %record.task_id, error = %err, "structure load failed");
        record.record_error(err);
    }
    loaded
}

/// Parse the generation and check its path checklist. Writes the output
/// confidence, the key validation score and the raw output score.
fn validate_output(record: &mut TaskRecord, ctx: &ScoringContext) -> LoadedStructure {
    let loaded = load_payload(record, ctx, PayloadSide::Output);
    record.output_confidence = Some(loaded.confidence);

    let coverage = match (&loaded.structure, record.render_score) {
        // The renderer already rejected this output.
        (_, Some(render)) if render == 0.0 => None,
        (Some(structure), _) if loaded.is_parsed() => {
            Some(path_coverage(structure, &record.raw_output_metric))
        }
        _ => None,
    };

    match coverage {
        Some(coverage) => {
            record.key_validation_score = Some(coverage.score);
            record.raw_output_score = Some(coverage.score);
            record.raw_output_eval = coverage.verdicts;
        }
        None => {
            record.key_validation_score = Some(0.0);
            record.raw_output_score = Some(0.0);
            record.raw_output_eval = vec![false; record.raw_output_metric.len()];
        }
    }

    loaded
}
