//! Applies the model to normalized records and the fixed threshold to its probabilities.

use crate::model::{ModelHandle, ScoringError};
use crate::normalize::TransactionRecord;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

/// Probability at or above which a transaction is flagged.
pub const FRAUD_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Legit,
    Fraud,
}

impl Decision {
    pub fn from_probability(probability: f64) -> Self {
        if probability >= FRAUD_THRESHOLD {
            Decision::Fraud
        } else {
            Decision::Legit
        }
    }

    pub fn is_fraud(self) -> bool {
        self == Decision::Fraud
    }
}

/// A transaction plus its score. Serializes as the transaction's own fields
/// followed by `fraud_probability` and `is_fraud`.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredTransaction<T> {
    #[serde(flatten)]
    transaction: T,
    fraud_probability: f64,
    #[serde(rename = "is_fraud", serialize_with = "decision_as_flag")]
    decision: Decision,
}

fn decision_as_flag<S: Serializer>(decision: &Decision, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_bool(decision.is_fraud())
}

impl<T> ScoredTransaction<T> {
    fn new(transaction: T, fraud_probability: f64) -> Self {
        Self {
            transaction,
            fraud_probability,
            decision: Decision::from_probability(fraud_probability),
        }
    }

    pub fn transaction(&self) -> &T {
        &self.transaction
    }

    pub fn fraud_probability(&self) -> f64 {
        self.fraud_probability
    }

    pub fn is_fraud(&self) -> bool {
        self.decision.is_fraud()
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }
}

/// Stateless; trusts its input to be normalized.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn score_one(
        &self,
        record: TransactionRecord,
        handle: &ModelHandle,
    ) -> Result<ScoredTransaction<TransactionRecord>, ScoringError> {
        let probability = handle
            .predict_proba(std::slice::from_ref(&record))?
            .pop()
            .ok_or(ScoringError::CountMismatch {
                expected: 1,
                returned: 0,
            })?;
        let scored = ScoredTransaction::new(record, probability);
        debug!(
            probability = scored.fraud_probability,
            is_fraud = scored.is_fraud(),
            "scored transaction"
        );
        Ok(scored)
    }

    pub fn score_many(
        &self,
        records: &[TransactionRecord],
        handle: &ModelHandle,
    ) -> Result<Vec<ScoredTransaction<TransactionRecord>>, ScoringError> {
        self.score_with(records, records.to_vec(), handle)
    }

    /// Scores `records` and attaches each result to the raw row it came from.
    /// Existing `fraud_probability`/`is_fraud` keys in a row are replaced.
    pub fn score_rows(
        &self,
        records: &[TransactionRecord],
        rows: Vec<Map<String, Value>>,
        handle: &ModelHandle,
    ) -> Result<Vec<ScoredTransaction<Map<String, Value>>>, ScoringError> {
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.remove("fraud_probability");
                row.remove("is_fraud");
                row
            })
            .collect();
        self.score_with(records, rows, handle)
    }

    /// One model call for the whole slice; `originals[i]` is paired with `records[i]`.
    fn score_with<T>(
        &self,
        records: &[TransactionRecord],
        originals: Vec<T>,
        handle: &ModelHandle,
    ) -> Result<Vec<ScoredTransaction<T>>, ScoringError> {
        if originals.len() != records.len() {
            return Err(ScoringError::CountMismatch {
                expected: records.len(),
                returned: originals.len(),
            });
        }
        let probabilities = handle.predict_proba(records)?;
        let scored: Vec<ScoredTransaction<T>> = originals
            .into_iter()
            .zip(probabilities)
            .map(|(original, p)| ScoredTransaction::new(original, p))
            .collect();
        debug!(
            records = scored.len(),
            flagged = scored.iter().filter(|s| s.is_fraud()).count(),
            "scored"
        );
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EncoderSpec, FeatureEncoder, LogisticScorer};
    use crate::normalize::normalize_batch;
    use serde_json::json;

    /// p = sigmoid(amount - 3)
    fn handle() -> ModelHandle {
        let spec: EncoderSpec = serde_json::from_value(json!({
            "numeric": [{"column": "amount"}]
        }))
        .unwrap();
        let encoder = FeatureEncoder::from_spec(&spec).unwrap();
        let scorer = LogisticScorer::new(&[1.0], -3.0, 1).unwrap();
        ModelHandle::from_parts(encoder, Box::new(scorer))
    }

    fn rows() -> Value {
        let row = |amount: i64| {
            json!({
                "amount": amount,
                "merchant_category": "fuel",
                "device_type": "mobile",
                "distance_from_home_km": 0,
                "is_foreign": 0,
                "is_high_risk_merchant": 0,
                "has_history_of_chargeback": 0
            })
        };
        json!([row(0), row(3), row(6)])
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(Decision::from_probability(0.5), Decision::Fraud);
        assert_eq!(Decision::from_probability(0.4999), Decision::Legit);
        assert!(Decision::from_probability(1.0).is_fraud());
        assert!(!Decision::from_probability(0.0).is_fraud());
    }

    #[test]
    fn score_many_keeps_order() {
        let records = normalize_batch(&rows()).unwrap();
        let scored = ScoringEngine::new().score_many(&records, &handle()).unwrap();
        let decisions: Vec<_> = scored.iter().map(|s| s.decision()).collect();
        assert_eq!(decisions, vec![Decision::Legit, Decision::Fraud, Decision::Fraud]);
        assert_eq!(scored[1].fraud_probability(), 0.5);
        assert_eq!(scored[2].transaction().amount(), 6.0);
    }

    #[test]
    fn score_rows_replaces_existing_score_keys() {
        let raw = rows();
        let records = normalize_batch(&raw).unwrap();
        let originals: Vec<Map<String, Value>> = raw
            .as_array()
            .unwrap()
            .iter()
            .map(|r| {
                let mut r = r.as_object().unwrap().clone();
                r.insert("fraud_probability".into(), json!("old"));
                r
            })
            .collect();

        let scored = ScoringEngine::new()
            .score_rows(&records, originals, &handle())
            .unwrap();
        let out = serde_json::to_value(&scored).unwrap();
        assert!(out[0]["fraud_probability"].is_number());
        assert_eq!(out[0]["is_fraud"], json!(false));
        assert_eq!(out[2]["amount"], json!(6));
    }

    #[test]
    fn decision_serializes_as_is_fraud_flag() {
        let scored = ScoredTransaction::new(json!({"id": 1}), 0.5);
        assert_eq!(scored.decision(), Decision::Fraud);
        assert!(scored.is_fraud());
        assert_eq!(
            serde_json::to_value(&scored).unwrap(),
            json!({"id": 1, "fraud_probability": 0.5, "is_fraud": true})
        );

        let scored = ScoredTransaction::new(json!({"id": 2}), 0.1);
        assert_eq!(serde_json::to_value(&scored).unwrap()["is_fraud"], json!(false));
        assert_eq!(scored.decision(), Decision::Legit);
    }

    #[test]
    fn mismatched_originals_are_rejected() {
        let records = normalize_batch(&rows()).unwrap();
        let err = ScoringEngine::new()
            .score_rows(&records, Vec::new(), &handle())
            .unwrap_err();
        assert!(matches!(err, ScoringError::CountMismatch { .. }));
    }
}
