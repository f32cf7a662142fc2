//! Shared fixtures: artifact bundles on disk and counting scorers.

#![allow(dead_code)]

use fraudshield::model::{EncoderSpec, FeatureEncoder, ModelHandle, Scorer, ScorerError};
use ndarray::ArrayView2;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Encoder with `device_type` one-hot (mobile, desktop) then raw `amount`.
pub fn small_encoder_spec() -> Value {
    json!({
        "categorical": [{"column": "device_type", "categories": ["mobile", "desktop"]}],
        "numeric": [{"column": "amount", "mean": 0.0, "scale": 1.0}]
    })
}

/// p = sigmoid(amount_coef * amount + intercept).
pub fn logistic_bundle(amount_coef: f64, intercept: f64) -> Value {
    json!({
        "name": "test-logistic",
        "version": "0.0.1",
        "pipe": {
            "pre": small_encoder_spec(),
            "clf": {"kind": "logistic", "coef": [0.0, 0.0, amount_coef], "intercept": intercept}
        }
    })
}

pub fn write_bundle(dir: &Path, bundle: &Value) -> PathBuf {
    let path = dir.join("model.json");
    std::fs::write(&path, serde_json::to_vec(bundle).unwrap()).unwrap();
    path
}

pub fn shipped_model_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("models/model.json")
}

pub fn transaction(amount: Value) -> Value {
    json!({
        "amount": amount,
        "merchant_category": "grocery",
        "device_type": "mobile"
    })
}

pub fn batch_row(amount: Value) -> Value {
    json!({
        "amount": amount,
        "merchant_category": "grocery",
        "device_type": "mobile",
        "distance_from_home_km": 1.5,
        "is_foreign": 0,
        "is_high_risk_merchant": 0,
        "has_history_of_chargeback": 0
    })
}

/// Returns a fixed probability per row and counts invocations.
pub struct CountingScorer {
    pub calls: Arc<AtomicUsize>,
    pub probability: f64,
}

impl Scorer for CountingScorer {
    fn predict_proba(&self, features: ArrayView2<'_, f32>) -> Result<Vec<f64>, ScorerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![self.probability; features.nrows()])
    }

    fn kind(&self) -> &'static str {
        "counting"
    }
}

/// Scorer that breaks its contract by returning one probability too many.
pub struct OverflowingScorer;

impl Scorer for OverflowingScorer {
    fn predict_proba(&self, features: ArrayView2<'_, f32>) -> Result<Vec<f64>, ScorerError> {
        Ok(vec![0.1; features.nrows() + 1])
    }

    fn kind(&self) -> &'static str {
        "overflowing"
    }
}

pub fn small_encoder() -> FeatureEncoder {
    let spec: EncoderSpec = serde_json::from_value(small_encoder_spec()).unwrap();
    FeatureEncoder::from_spec(&spec).unwrap()
}

pub fn counting_handle(probability: f64) -> (ModelHandle, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let scorer = CountingScorer {
        calls: calls.clone(),
        probability,
    };
    (ModelHandle::from_parts(small_encoder(), Box::new(scorer)), calls)
}
