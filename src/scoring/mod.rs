//! Scoring engine: probability → thresholded decision.

mod engine;

pub use engine::{Decision, ScoredTransaction, ScoringEngine, FRAUD_THRESHOLD};
