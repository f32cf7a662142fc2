//! FraudShield: transaction fraud scoring over a pre-trained classifier.
//!
//! Modular structure:
//! - [`normalize`]: raw JSON → validated transaction records
//! - [`model`]: artifact loading, feature encoding, opaque scorers
//! - [`scoring`]: probability and thresholded decision per record
//! - [`service`]: request handling, error envelope, health
//! - [`server`]: HTTP routes
//! - [`config`], [`logging`]: service configuration and structured logs

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod scoring;
pub mod server;
pub mod service;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use logging::StructuredLogger;
pub use model::{ModelHandle, ModelRegistry};
pub use normalize::{normalize_batch, normalize_single, TransactionRecord, ValidationError};
pub use scoring::{Decision, ScoringEngine, FRAUD_THRESHOLD};
pub use service::{ApiResponse, HealthReport, RequestHandler};
