use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::branch::Branch;
use super::format::{FormatType, TaskId};

/// Judge verdict for one visual question: `None` means insufficient evidence.
pub type Verdict = Option<bool>;

/// Normalise a judge reply into a verdict.
///
/// Only an unambiguous `true`/`false` (case-insensitive, surrounding
/// punctuation ignored) counts; anything else is insufficient evidence.
pub fn parse_verdict(response: &str) -> Verdict {
    let normalized = response
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();

    match normalized.as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn verdict_of(value: &Value) -> Verdict {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => parse_verdict(text),
        _ => None,
    }
}

fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items),
        _ => Ok(Vec::new()),
    }
}

/// Accepts booleans or `"True"`/`"False"` strings, as older scored datasets
/// wrote them. Anything else reads as `false`.
fn lenient_flags<'de, D>(deserializer: D) -> Result<Vec<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = lenient_items(deserializer)?;
    Ok(items.iter().map(|item| verdict_of(item).unwrap_or(false)).collect())
}

/// Accepts booleans, nulls or raw judge replies such as `"NONE"`.
fn lenient_verdicts<'de, D>(deserializer: D) -> Result<Vec<Verdict>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = lenient_items(deserializer)?;
    Ok(items.iter().map(verdict_of).collect())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VqaItem {
    pub question: String,
    pub answer: String,
}

impl VqaItem {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Scored,
    Failed,
}

/// One task: the model's generation plus its acceptance criteria, enriched
/// in place with scores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    pub task_id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,
    #[serde(default)]
    pub rendering: bool,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub generation: String,
    #[serde(default)]
    pub raw_output_metric: Vec<String>,
    #[serde(rename = "VQAmetric", default)]
    pub vqa_metric: Vec<VqaItem>,

    /// Supplied by the renderer before evaluation; never reset here.
    #[serde(default)]
    pub render_score: Option<f64>,

    #[serde(default)]
    pub raw_output_score: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_flags",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub raw_output_eval: Vec<bool>,
    #[serde(default)]
    pub key_validation_score: Option<f64>,
    #[serde(default)]
    pub structure_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_confidence: Option<f64>,
    #[serde(rename = "VQA_score", default)]
    pub vqa_score: Option<f64>,
    #[serde(rename = "VQAeval", default, deserialize_with = "lenient_verdicts")]
    pub vqa_eval: Vec<Verdict>,
    #[serde(default)]
    pub final_eval_score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_branch: Option<Branch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_status: Option<EvaluationStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub eval_errors: Vec<String>,

    /// Fields this engine does not interpret, carried through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TaskRecord {
    pub fn new(task_id: impl Into<TaskId>, query: impl Into<String>, generation: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            input_type: None,
            output_type: None,
            rendering: false,
            query: query.into(),
            generation: generation.into(),
            raw_output_metric: Vec::new(),
            vqa_metric: Vec::new(),
            render_score: None,
            raw_output_score: None,
            raw_output_eval: Vec::new(),
            key_validation_score: None,
            structure_score: None,
            input_confidence: None,
            output_confidence: None,
            vqa_score: None,
            vqa_eval: Vec::new(),
            final_eval_score: None,
            eval_branch: None,
            eval_status: None,
            eval_errors: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_rendering(mut self, rendering: bool) -> Self {
        self.rendering = rendering;
        self
    }

    pub fn with_types(mut self, input_type: impl Into<String>, output_type: impl Into<String>) -> Self {
        self.input_type = Some(input_type.into());
        self.output_type = Some(output_type.into());
        self
    }

    pub fn with_raw_output_metric<I, S>(mut self, metric: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.raw_output_metric = metric.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_vqa(mut self, items: Vec<VqaItem>) -> Self {
        self.vqa_metric = items;
        self
    }

    pub fn with_render_score(mut self, score: f64) -> Self {
        self.render_score = Some(score);
        self
    }

    /// Output format: the declared `output_type` name, else the task-id code.
    pub fn output_format(&self) -> Option<FormatType> {
        self.output_type
            .as_deref()
            .and_then(FormatType::from_name)
            .or_else(|| self.task_id.output_format())
    }

    pub fn input_format(&self) -> Option<FormatType> {
        self.input_type
            .as_deref()
            .and_then(FormatType::from_name)
            .or_else(|| self.task_id.input_format())
    }

    /// Clear every field the engine writes so a re-run starts clean.
    pub fn reset_scores(&mut self) {
        self.raw_output_score = None;
        self.raw_output_eval.clear();
        self.key_validation_score = None;
        self.structure_score = None;
        self.input_confidence = None;
        self.output_confidence = None;
        self.vqa_score = None;
        self.vqa_eval.clear();
        self.final_eval_score = None;
        self.eval_branch = None;
        self.eval_status = None;
        self.eval_errors.clear();
    }

    pub fn record_error(&mut self, error: impl ToString) {
        self.eval_errors.push(error.to_string());
        self.eval_status = Some(EvaluationStatus::Failed);
    }

    pub fn is_failed(&self) -> bool {
        self.eval_status == Some(EvaluationStatus::Failed)
    }
}
