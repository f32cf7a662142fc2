//! A loaded model: feature encoder + opaque scorer, immutable after load.

use super::artifact::{parse_bundle, BundleMetadata, ClassifierSpec};
use super::classifier::{ForestScorer, LogisticScorer, Scorer};
use super::encoder::FeatureEncoder;
use super::error::{LoadError, ScoringError};
use crate::normalize::TransactionRecord;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

pub struct ModelHandle {
    encoder: FeatureEncoder,
    scorer: Box<dyn Scorer>,
    path: PathBuf,
    sha256: Option<String>,
    metadata: BundleMetadata,
    loaded_at: DateTime<Utc>,
}

impl ModelHandle {
    /// Load a bundle from disk.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let bytes = std::fs::read(path).map_err(|e| LoadError::Other {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        Self::from_bundle(&bytes, path)
    }

    /// Build from bundle bytes; `origin` names the artifact and anchors relative graph paths.
    pub fn from_bundle(bytes: &[u8], origin: &Path) -> Result<Self, LoadError> {
        let bundle = parse_bundle(bytes).map_err(|reason| LoadError::corrupt(origin, reason))?;
        let encoder = FeatureEncoder::from_spec(&bundle.pipeline.pre)
            .map_err(|reason| LoadError::corrupt(origin, format!("invalid preprocessing: {reason}")))?;
        let scorer = build_scorer(&bundle.pipeline.clf, encoder.width(), origin)?;

        Ok(Self {
            encoder,
            scorer,
            path: origin.to_path_buf(),
            sha256: Some(format!("{:x}", Sha256::digest(bytes))),
            metadata: bundle.metadata,
            loaded_at: Utc::now(),
        })
    }

    /// Wrap an already-built scorer, e.g. one backed by another runtime.
    pub fn from_parts(encoder: FeatureEncoder, scorer: Box<dyn Scorer>) -> Self {
        Self {
            encoder,
            scorer,
            path: PathBuf::from("<memory>"),
            sha256: None,
            metadata: BundleMetadata::default(),
            loaded_at: Utc::now(),
        }
    }

    /// Fraud probability per record, in record order, from a single scorer call.
    pub fn predict_proba(&self, records: &[TransactionRecord]) -> Result<Vec<f64>, ScoringError> {
        let features = self.encoder.encode_batch(records);
        let probabilities = self.scorer.predict_proba(features.view())?;

        if probabilities.len() != records.len() {
            return Err(ScoringError::CountMismatch {
                expected: records.len(),
                returned: probabilities.len(),
            });
        }
        if let Some((index, &value)) = probabilities
            .iter()
            .enumerate()
            .find(|(_, p)| !(0.0..=1.0).contains(*p))
        {
            return Err(ScoringError::InvalidProbability { index, value });
        }
        Ok(probabilities)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sha256(&self) -> Option<&str> {
        self.sha256.as_deref()
    }

    pub fn metadata(&self) -> &BundleMetadata {
        &self.metadata
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn scorer_kind(&self) -> &'static str {
        self.scorer.kind()
    }

    /// Encoded feature names in column order.
    pub fn feature_names(&self) -> Vec<String> {
        self.encoder.feature_names()
    }

    pub fn feature_width(&self) -> usize {
        self.encoder.width()
    }
}

fn build_scorer(
    spec: &ClassifierSpec,
    width: usize,
    origin: &Path,
) -> Result<Box<dyn Scorer>, LoadError> {
    let invalid = |reason: String| LoadError::corrupt(origin, format!("invalid classifier: {reason}"));
    match spec {
        ClassifierSpec::Logistic { coef, intercept } => Ok(Box::new(
            LogisticScorer::new(coef, *intercept, width).map_err(invalid)?,
        )),
        ClassifierSpec::Forest { trees } => {
            Ok(Box::new(ForestScorer::new(trees, width).map_err(invalid)?))
        }
        ClassifierSpec::Onnx { path } => onnx_scorer(path, width, origin),
    }
}

#[cfg(feature = "onnx")]
fn onnx_scorer(graph: &Path, width: usize, origin: &Path) -> Result<Box<dyn Scorer>, LoadError> {
    let graph = origin
        .parent()
        .map(|dir| dir.join(graph))
        .unwrap_or_else(|| graph.to_path_buf());
    if !graph.exists() {
        return Err(LoadError::corrupt(
            origin,
            format!("ONNX graph {} does not exist", graph.display()),
        ));
    }
    let scorer = super::onnx::OnnxScorer::load(&graph, width).map_err(|e| LoadError::Other {
        path: origin.to_path_buf(),
        source: e.into(),
    })?;
    Ok(Box::new(scorer))
}

#[cfg(not(feature = "onnx"))]
fn onnx_scorer(_graph: &Path, _width: usize, origin: &Path) -> Result<Box<dyn Scorer>, LoadError> {
    Err(LoadError::corrupt(
        origin,
        "bundle requires an ONNX scorer but this build lacks the `onnx` feature",
    ))
}
