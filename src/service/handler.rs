//! Request handler: availability check, normalization, scoring, and
//! mapping every outcome onto an [`ApiResponse`].
//!
//! Availability is checked before the payload is looked at, so a service
//! without a model answers `"Model not loaded"` even for malformed input.

use super::health::{HealthReport, API_VERSION};
use super::response::{ApiResponse, ErrorClass, ErrorResponse, Operation};
use crate::error::ServiceError;
use crate::model::{ModelHandle, ModelRegistry};
use crate::normalize::{batch_rows, normalize_batch, normalize_single, ValidationError};
use crate::scoring::ScoringEngine;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub struct RequestHandler {
    registry: Arc<ModelRegistry>,
    engine: ScoringEngine,
}

impl RequestHandler {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            engine: ScoringEngine::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Scores one transaction object.
    pub fn handle_single(&self, raw: &Value) -> ApiResponse {
        self.respond(Operation::Single, |handle| self.single(handle, raw))
    }

    /// Scores a list of transaction objects in one model call.
    pub fn handle_batch(&self, raw: &Value) -> ApiResponse {
        self.respond(Operation::Batch, |handle| self.batch(handle, raw))
    }

    /// Like [`Self::handle_single`], from an undecoded request body.
    pub fn handle_single_body(&self, body: &[u8]) -> ApiResponse {
        self.respond(Operation::Single, |handle| {
            self.single(handle, &parse_body(body)?)
        })
    }

    /// Like [`Self::handle_batch`], from an undecoded request body.
    pub fn handle_batch_body(&self, body: &[u8]) -> ApiResponse {
        self.respond(Operation::Batch, |handle| {
            self.batch(handle, &parse_body(body)?)
        })
    }

    /// Never fails. Re-attempts a missing model, subject to the reload throttle.
    pub fn health(&self) -> HealthReport {
        self.registry.ensure_loaded();
        let status = self.registry.status();
        HealthReport {
            status: "healthy".to_string(),
            model_status: if status.loaded { "loaded" } else { "not_loaded" }.to_string(),
            model_loaded: status.loaded,
            model_path: status.path.display().to_string(),
            model_exists: status.exists,
            model_error: status.last_error,
            model_sha256: status.sha256,
            model_scorer: status.scorer.map(String::from),
            model_name: status.name,
            model_version: status.version,
            loaded_at: status.loaded_at,
            load_attempts: status.attempts,
            api_version: API_VERSION.to_string(),
        }
    }

    fn respond<F>(&self, operation: Operation, run: F) -> ApiResponse
    where
        F: FnOnce(&ModelHandle) -> Result<Value, ServiceError>,
    {
        let request_id = Uuid::new_v4();
        let result = self
            .registry
            .ensure_loaded()
            .ok_or(ServiceError::ModelUnavailable)
            .and_then(|handle| run(&handle));

        match result {
            Ok(body) => {
                debug!(%request_id, operation = operation.label(), "request served");
                ApiResponse::Success(body)
            }
            Err(err) => {
                let class = err.class();
                match (&err, class) {
                    (ServiceError::ModelUnavailable, _) => {
                        warn!(%request_id, operation = operation.label(), "rejected: model not loaded")
                    }
                    (_, ErrorClass::ServerError) => error!(
                        %request_id,
                        operation = operation.label(),
                        error = %err,
                        detail = ?err,
                        "request failed"
                    ),
                    (_, ErrorClass::ClientError) => {
                        debug!(%request_id, operation = operation.label(), error = %err, "invalid request")
                    }
                }
                ApiResponse::Error(ErrorResponse::new(err.public_message(operation), class))
            }
        }
    }

    fn single(&self, handle: &ModelHandle, raw: &Value) -> Result<Value, ServiceError> {
        let record = normalize_single(raw)?;
        let scored = self.engine.score_one(record, handle)?;
        if scored.is_fraud() {
            info!(
                user_id = scored.transaction().user_id(),
                probability = scored.fraud_probability(),
                "transaction flagged"
            );
        }
        Ok(serde_json::to_value(scored)?)
    }

    fn batch(&self, handle: &ModelHandle, raw: &Value) -> Result<Value, ServiceError> {
        let records = normalize_batch(raw)?;
        let rows = batch_rows(raw)?.into_iter().cloned().collect();
        let scored = self.engine.score_rows(&records, rows, handle)?;
        let flagged = scored.iter().filter(|s| s.is_fraud()).count();
        if flagged > 0 {
            info!(records = scored.len(), flagged, "batch contains flagged transactions");
        }
        Ok(serde_json::to_value(scored)?)
    }
}

fn parse_body(body: &[u8]) -> Result<Value, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationError::EmptyInput);
    }
    serde_json::from_slice(body).map_err(|_| ValidationError::InvalidJson)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_body_is_empty_input() {
        assert_eq!(parse_body(b""), Err(ValidationError::EmptyInput));
        assert_eq!(parse_body(b"  \n"), Err(ValidationError::EmptyInput));
    }

    #[test]
    fn malformed_body_is_invalid_json() {
        assert_eq!(parse_body(b"{\"amount\": "), Err(ValidationError::InvalidJson));
        assert_eq!(parse_body(b"amount=5"), Err(ValidationError::InvalidJson));
    }

    #[test]
    fn null_body_parses_and_is_left_to_normalization() {
        assert_eq!(parse_body(b"null"), Ok(Value::Null));
    }
}
