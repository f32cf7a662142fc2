//! Health document: liveness plus model load status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const API_VERSION: &str = "1.0.0";

/// Liveness plus model status. `status` is always `"healthy"`; model
/// availability is reported separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub model_status: String,
    pub model_loaded: bool,
    pub model_path: String,
    pub model_exists: bool,
    pub model_error: Option<String>,
    pub model_sha256: Option<String>,
    pub model_scorer: Option<String>,
    pub model_name: Option<String>,
    pub model_version: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub load_attempts: u64,
    pub api_version: String,
}
