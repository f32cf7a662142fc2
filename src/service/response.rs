use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Validation or format problem; the caller can fix and resubmit.
    ClientError,
    /// Model unavailable or scoring failure.
    ServerError,
}

impl ErrorClass {
    pub fn status_code(self) -> u16 {
        match self {
            ErrorClass::ClientError => 400,
            ErrorClass::ServerError => 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Single,
    Batch,
}

impl Operation {
    pub fn label(self) -> &'static str {
        match self {
            Operation::Single => "predict",
            Operation::Batch => "batch_predict",
        }
    }

    pub(crate) fn failure_message(self) -> &'static str {
        match self {
            Operation::Single => "Error processing request",
            Operation::Batch => "Error processing batch request",
        }
    }
}

/// Stable error envelope: `{"error": ..., "success": false, "status": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub success: bool,
    pub status: ErrorClass,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, status: ErrorClass) -> Self {
        Self {
            error: error.into(),
            success: false,
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Success(Value),
    Error(ErrorResponse),
}

impl ApiResponse {
    /// Sanitized server failure for `operation`.
    pub fn failure(operation: Operation) -> Self {
        ApiResponse::Error(ErrorResponse::new(
            operation.failure_message(),
            ErrorClass::ServerError,
        ))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Success(_))
    }

    /// HTTP-equivalent status.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiResponse::Success(_) => 200,
            ApiResponse::Error(e) => e.status.status_code(),
        }
    }

    pub fn error(&self) -> Option<&ErrorResponse> {
        match self {
            ApiResponse::Error(e) => Some(e),
            ApiResponse::Success(_) => None,
        }
    }

    pub fn into_body(self) -> Value {
        match self {
            ApiResponse::Success(body) => body,
            ApiResponse::Error(e) => serde_json::json!({
                "error": e.error,
                "success": e.success,
                "status": e.status,
            }),
        }
    }
}
