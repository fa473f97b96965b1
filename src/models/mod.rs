//! Trained model loading and inference

pub mod artifact;
pub mod inference;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use artifact::{ForestRegressor, LinearRegressor, ModelArtifact};
pub use inference::{BatchOutcome, InferenceEngine};
pub use loader::{LoadedModel, ModelLoader};

use crate::schema::FeatureRow;

/// A trained regression model bound to one feature schema.
///
/// Implementations are read-only after load and shared across requests.
pub trait Regressor: Send + Sync {
    /// Short model kind used in logs and the service banner
    fn name(&self) -> &str;

    /// Predict a single price for a row keyed by the bound schema
    fn predict(&self, row: &FeatureRow) -> anyhow::Result<f64>;
}
