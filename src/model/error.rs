use std::path::PathBuf;
use thiserror::Error;

/// Why a model artifact could not be turned into a [`super::ModelHandle`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Model file not found at {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Model file at {} appears to be corrupted: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Error loading model from {}: {source}", .path.display())]
    Other {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl LoadError {
    pub(crate) fn corrupt(path: &std::path::Path, reason: impl Into<String>) -> Self {
        LoadError::Corrupt {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Failure inside an opaque scorer.
#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("feature width {found} does not match model width {expected}")]
    Width { expected: usize, found: usize },

    #[error("{0}")]
    Runtime(String),
}

/// Server-attributable failure while scoring accepted records. Never retried.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("scorer failed: {0}")]
    Scorer(#[from] ScorerError),

    #[error("scorer returned {returned} probabilities for {expected} records")]
    CountMismatch { expected: usize, returned: usize },

    #[error("scorer returned invalid probability {value} for record {index}")]
    InvalidProbability { index: usize, value: f64 },
}
