use config::{Config as ConfigLoader, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use validator::Validate;

use crate::error::Result;

/// Default payload delimiters.
pub const DEFAULT_OPEN_MARKER: &str = "<code>";
pub const DEFAULT_CLOSE_MARKER: &str = "</code>";

/// Loader confidence needed before two structures are compared.
pub const DEFAULT_STRUCTURE_CONFIDENCE_THRESHOLD: f64 = 0.5;

pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// How payloads are pulled out of free-text responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct ExtractionPolicy {
    #[validate(length(min = 1))]
    pub open_marker: String,
    #[validate(length(min = 1))]
    pub close_marker: String,
    /// When set, text with no marker and no fenced block is an extraction
    /// failure instead of being used whole.
    pub require_marker: bool,
}

impl ExtractionPolicy {
    pub fn lenient() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self {
            require_marker: true,
            ..Self::default()
        }
    }
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self {
            open_marker: DEFAULT_OPEN_MARKER.to_string(),
            close_marker: DEFAULT_CLOSE_MARKER.to_string(),
            require_marker: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(default)]
pub struct EvaluationConfig {
    #[validate(nested)]
    pub extraction: ExtractionPolicy,
    #[validate(range(min = 0.0, max = 1.0))]
    pub structure_confidence_threshold: f64,
    #[validate(range(min = 1, max = 1024))]
    pub max_concurrency: usize,
    pub judge_timeout_secs: Option<u64>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionPolicy::default(),
            structure_confidence_threshold: DEFAULT_STRUCTURE_CONFIDENCE_THRESHOLD,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            judge_timeout_secs: None,
        }
    }
}

impl EvaluationConfig {
    /// Load from `config/structeval.*` (optional) and `STRUCTEVAL__*`
    /// environment variables, over the defaults.
    pub fn load() -> Result<Self> {
        let settings = ConfigLoader::builder()
            .add_source(File::with_name("config/structeval").required(false))
            .add_source(Self::environment())
            .build()?;

        Self::finish(settings)
    }

    /// Load from an explicit file, still honouring environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = ConfigLoader::builder()
            .add_source(File::from(path))
            .add_source(Self::environment())
            .build()?;

        Self::finish(settings)
    }

    pub fn judge_timeout(&self) -> Option<Duration> {
        self.judge_timeout_secs.map(Duration::from_secs)
    }

    fn environment() -> Environment {
        Environment::with_prefix("STRUCTEVAL")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    fn finish(settings: ConfigLoader) -> Result<Self> {
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
