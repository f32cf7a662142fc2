//! Service-level error taxonomy and its mapping onto response classes.

use crate::model::ScoringError;
use crate::normalize::ValidationError;
use crate::service::{ErrorClass, Operation};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Artifact missing, corrupt, or not loaded yet. Terminal for the call, not the process.
    #[error("Model not loaded")]
    ModelUnavailable,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("response serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServiceError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ServiceError::Validation(_) => ErrorClass::ClientError,
            ServiceError::ModelUnavailable
            | ServiceError::Scoring(_)
            | ServiceError::Serialization(_) => ErrorClass::ServerError,
        }
    }

    /// Message safe to return to the caller; internal detail stays in the logs.
    pub fn public_message(&self, operation: Operation) -> String {
        match self {
            ServiceError::ModelUnavailable | ServiceError::Validation(_) => self.to_string(),
            ServiceError::Scoring(_) | ServiceError::Serialization(_) => {
                operation.failure_message().to_string()
            }
        }
    }
}
