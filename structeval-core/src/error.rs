use thiserror::Error;

/// Failures the scoring engine knows how to recover from.
///
/// None of these is fatal to a batch: the coordinator downgrades each one to
/// a zeroed (or null) signal on the affected record and keeps going.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Malformed path `{path}`: {reason}")]
    MalformedPath { path: String, reason: String },

    #[error("Parse failure: {0}")]
    ParseFailure(String),

    #[error("No payload marker found: {0}")]
    MissingPayload(String),

    #[error("VQA judge unavailable: {0}")]
    JudgeUnavailable(String),

    #[error("VQA judge timed out after {0} ms")]
    JudgeTimeout(u64),

    #[error("Missing asset: {0}")]
    MissingAsset(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn malformed_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::MalformedPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Configuration(err.to_string())
    }
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(err: validator::ValidationErrors) -> Self {
        CoreError::Configuration(err.to_string())
    }
}
