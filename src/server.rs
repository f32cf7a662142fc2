//! HTTP transport: axum router over [`RequestHandler`].
//!
//! Bodies are taken as raw bytes so that JSON syntax errors, and bodies axum
//! refuses to buffer, go through the handler's own error envelope instead of
//! axum's plain-text rejection. Scoring is CPU work and runs on the blocking pool.

use crate::config::ServerConfig;
use crate::service::{ApiResponse, ErrorClass, ErrorResponse, HealthReport, Operation, RequestHandler};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

#[derive(Clone)]
pub struct AppState {
    handler: Arc<RequestHandler>,
}

pub fn router(handler: Arc<RequestHandler>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/predict", post(predict))
        .route("/api/batch-predict", post(batch_predict))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(AppState { handler })
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthReport>, ApiResponse> {
    tokio::task::spawn_blocking(move || state.handler.health())
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %e, "health task failed");
            ApiResponse::Error(ErrorResponse::new(
                "Health check failed",
                ErrorClass::ServerError,
            ))
        })
}

async fn predict(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResponse {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return rejected_body(Operation::Single, rejection),
    };
    run_blocking(Operation::Single, move || {
        state.handler.handle_single_body(&body)
    })
    .await
}

async fn batch_predict(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResponse {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return rejected_body(Operation::Batch, rejection),
    };
    run_blocking(Operation::Batch, move || {
        state.handler.handle_batch_body(&body)
    })
    .await
}

fn rejected_body(operation: Operation, rejection: BytesRejection) -> ApiResponse {
    debug!(operation = operation.label(), error = %rejection, "request body rejected");
    let message = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        "Request body too large"
    } else {
        "Invalid request body"
    };
    ApiResponse::Error(ErrorResponse::new(message, ErrorClass::ClientError))
}

async fn run_blocking<F>(operation: Operation, work: F) -> ApiResponse
where
    F: FnOnce() -> ApiResponse + Send + 'static,
{
    tokio::task::spawn_blocking(work).await.unwrap_or_else(|e| {
        error!(operation = operation.label(), error = %e, "scoring task failed");
        ApiResponse::failure(operation)
    })
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.into_body())).into_response()
    }
}
