//! ONNX Runtime scorer. Input: [N, width] f32, output: `probabilities` ([N, 2] or [N]).
//! Built only with the `onnx` feature; the bundle still supplies the feature encoder.

use super::classifier::Scorer;
use super::error::ScorerError;
use ndarray::ArrayView2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use std::path::Path;

pub struct OnnxScorer {
    // `Session::run` takes `&mut self`
    session: Mutex<Session>,
    output_name: String,
    width: usize,
}

impl OnnxScorer {
    pub fn load(path: &Path, width: usize) -> Result<Self, String> {
        let session = Session::builder()
            .map_err(|e| format!("failed to create session builder: {e}"))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| format!("failed to set optimization level: {e}"))?
            .commit_from_file(path)
            .map_err(|e| format!("failed to load graph {}: {e}", path.display()))?;

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name == "probabilities")
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .ok_or_else(|| "graph defines no outputs".to_string())?;

        tracing::info!(path = %path.display(), output = %output_name, "ONNX graph loaded");

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            width,
        })
    }
}

impl Scorer for OnnxScorer {
    fn predict_proba(&self, features: ArrayView2<'_, f32>) -> Result<Vec<f64>, ScorerError> {
        if features.ncols() != self.width {
            return Err(ScorerError::Width {
                expected: self.width,
                found: features.ncols(),
            });
        }
        let rows = features.nrows();
        let input = Value::from_array(features.to_owned())
            .map_err(|e| ScorerError::Runtime(format!("tensor error: {e}")))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| ScorerError::Runtime(format!("inference failed: {e}")))?;
        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| ScorerError::Runtime(format!("missing output {}", self.output_name)))?;
        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ScorerError::Runtime(format!("extract error: {e}")))?;

        // [N, 2] class probabilities or [N] positive-class probabilities
        let probabilities = if data.len() == rows * 2 {
            data.chunks_exact(2).map(|pair| f64::from(pair[1])).collect()
        } else if data.len() == rows {
            data.iter().map(|&p| f64::from(p)).collect()
        } else {
            return Err(ScorerError::Runtime(format!(
                "output has {} values for {} rows",
                data.len(),
                rows
            )));
        };
        Ok(probabilities)
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}
