//! Model artifact bundle: a JSON document whose `pipe` key holds the
//! preprocessing spec and the classifier.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Key under which the bundle stores its scorer.
pub const SCORER_KEY: &str = "pipe";

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSpec {
    pub pre: EncoderSpec,
    pub clf: ClassifierSpec,
}

/// One-hot categorical columns followed by standardized numeric columns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EncoderSpec {
    #[serde(default)]
    pub categorical: Vec<CategoricalColumn>,
    #[serde(default)]
    pub numeric: Vec<NumericColumn>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoricalColumn {
    pub column: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NumericColumn {
    pub column: String,
    #[serde(default)]
    pub mean: f64,
    #[serde(default = "unit_scale")]
    pub scale: f64,
}

fn unit_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierSpec {
    Logistic { coef: Vec<f64>, intercept: f64 },
    Forest { trees: Vec<TreeSpec> },
    /// Graph file path, relative to the bundle.
    Onnx { path: PathBuf },
}

/// Flattened decision tree; node `i` is a leaf when `children_left[i] == -1`.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeSpec {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Fraud probability at each node (only read at leaves).
    pub value: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug)]
pub(crate) struct ArtifactBundle {
    pub pipeline: PipelineSpec,
    pub metadata: BundleMetadata,
}

/// Parses bundle bytes. Errors are reasons for a corrupt artifact.
pub(crate) fn parse_bundle(bytes: &[u8]) -> Result<ArtifactBundle, String> {
    let document: Value =
        serde_json::from_slice(bytes).map_err(|e| format!("not a valid JSON bundle: {e}"))?;
    let Value::Object(mut document) = document else {
        return Err("bundle is not a JSON object".to_string());
    };
    let pipe = document
        .remove(SCORER_KEY)
        .ok_or_else(|| format!("missing the expected '{SCORER_KEY}' key"))?;
    let pipeline: PipelineSpec = serde_json::from_value(pipe)
        .map_err(|e| format!("invalid '{SCORER_KEY}' scorer: {e}"))?;

    let text = |key: &str| document.get(key).and_then(Value::as_str).map(String::from);
    let metadata = BundleMetadata {
        name: text("name"),
        version: text("version"),
    };

    Ok(ArtifactBundle { pipeline, metadata })
}
