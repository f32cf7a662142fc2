//! Model handle: artifact loading, feature encoding and opaque scorers.

mod artifact;
mod classifier;
mod encoder;
mod error;
mod handle;
#[cfg(feature = "onnx")]
mod onnx;
mod registry;

pub use artifact::{
    BundleMetadata, CategoricalColumn, ClassifierSpec, EncoderSpec, NumericColumn, PipelineSpec,
    TreeSpec, SCORER_KEY,
};
pub use classifier::{ForestScorer, LogisticScorer, Scorer};
pub use encoder::FeatureEncoder;
pub use error::{LoadError, ScorerError, ScoringError};
pub use handle::ModelHandle;
#[cfg(feature = "onnx")]
pub use onnx::OnnxScorer;
pub use registry::{ModelRegistry, RegistryStatus};
