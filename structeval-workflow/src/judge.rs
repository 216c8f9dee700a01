use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use structeval_core::{CoreError, Verdict, VqaItem, VqaJudge};
use structeval_metrics::vqa_score;

/// Which VQA judge to consult, if any, and how long to wait for it.
#[derive(Clone, Default)]
pub struct JudgeConfig {
    pub judge: Option<Arc<dyn VqaJudge>>,
    pub timeout: Option<Duration>,
}

impl JudgeConfig {
    pub fn new(judge: Arc<dyn VqaJudge>) -> Self {
        Self {
            judge: Some(judge),
            timeout: None,
        }
    }

    /// No judge configured: VQA scores come out null.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn is_available(&self) -> bool {
        self.judge.is_some()
    }
}

impl fmt::Debug for JudgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JudgeConfig")
            .field("judge", &self.judge.as_ref().map(|judge| judge.name().to_string()))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VqaOutcome {
    /// No judge to ask; the score stays null.
    Unavailable,
    Scored { score: f64, verdicts: Vec<Verdict> },
    /// The judge could not be consulted for this task; the score is 0.
    Degraded(CoreError),
}

impl VqaOutcome {
    pub fn score(&self) -> Option<f64> {
        match self {
            VqaOutcome::Unavailable => None,
            VqaOutcome::Scored { score, .. } => Some(*score),
            VqaOutcome::Degraded(_) => Some(0.0),
        }
    }
}

/// Ask the judge about one rendered image.
pub async fn run_vqa(config: &JudgeConfig, image: Option<&Path>, items: &[VqaItem]) -> VqaOutcome {
    let Some(judge) = config.judge.as_ref() else {
        return VqaOutcome::Unavailable;
    };

    if items.is_empty() {
        return VqaOutcome::Scored {
            score: 0.0,
            verdicts: Vec::new(),
        };
    }

    let Some(image) = image else {
        return VqaOutcome::Degraded(CoreError::MissingAsset("no rendered image for task".to_string()));
    };

    let call = judge.judge(image, items);
    let response = match config.timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(response) => response,
            Err(_) => return VqaOutcome::Degraded(CoreError::JudgeTimeout(limit.as_millis() as u64)),
        },
        None => call.await,
    };

    match response {
        Ok(mut verdicts) => {
            if verdicts.len() != items.len() {
                tracing::warn!(
                    judge = judge.name(),
                    expected = items.len(),
                    received = verdicts.len(),
                    "judge returned a mismatched verdict count"
                );
                verdicts.resize(items.len(), None);
            }
            VqaOutcome::Scored {
                score: vqa_score(&verdicts),
                verdicts,
            }
        }
        Err(CoreError::JudgeUnavailable(reason)) => {
            tracing::warn!(judge = judge.name(), %reason, "judge unavailable");
            VqaOutcome::Unavailable
        }
        Err(err) => VqaOutcome::Degraded(err),
    }
}
