//! Inference engine: readiness gating, normalization and model delegation

use crate::config::{AppConfig, FeatureConfig};
use crate::error::PredictionError;
use crate::feature_extractor::FeatureExtractor;
use crate::models::loader::{LoadedModel, ModelLoader};
use crate::models::Regressor;
use crate::schema::{FeatureRow, FeatureSchema};
use crate::types::input::RawInput;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info};

/// Per-element result of a batch prediction
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub index: usize,
    pub result: Result<f64, PredictionError>,
}

/// Price prediction service.
///
/// Holds the model and its schema, or nothing at all when loading failed.
/// Read-only after construction, so one instance serves concurrent requests
/// behind an `Arc` without locking.
pub struct InferenceEngine {
    loaded: Option<LoadedModel>,
    extractor: FeatureExtractor,
    region_field: String,
}

impl InferenceEngine {
    /// Load model and schema from the configured paths.
    ///
    /// Never fails: a load error is logged and yields an engine that is not
    /// ready and rejects every prediction with `ModelNotLoaded`.
    pub fn load(config: &AppConfig) -> Self {
        let loader = ModelLoader::with_threads(config.model.onnx_threads);
        let loaded = match loader.load(&config.model.model_path, &config.model.columns_path) {
            Ok(loaded) => Some(loaded),
            Err(e) => {
                error!(
                    model_path = %config.model.model_path,
                    columns_path = %config.model.columns_path,
                    error = %format!("{:#}", e),
                    "Failed to load model, serving in unready state"
                );
                None
            }
        };

        Self::from_parts(loaded, &config.features)
    }

    /// Engine around an already constructed model
    pub fn with_model(
        model: Box<dyn Regressor>,
        schema: FeatureSchema,
        features: &FeatureConfig,
    ) -> Self {
        Self::from_parts(Some(LoadedModel::new(model, schema)), features)
    }

    /// Engine with nothing loaded
    pub fn unloaded(features: &FeatureConfig) -> Self {
        Self::from_parts(None, features)
    }

    fn from_parts(loaded: Option<LoadedModel>, features: &FeatureConfig) -> Self {
        let engine = Self {
            loaded,
            extractor: FeatureExtractor::new(features),
            region_field: features.region_field.clone(),
        };

        info!(
            ready = engine.is_ready(),
            model = engine.model_name().unwrap_or("none"),
            columns = engine.schema().map_or(0, FeatureSchema::len),
            "Inference engine initialized"
        );

        engine
    }

    pub fn is_ready(&self) -> bool {
        self.loaded.is_some()
    }

    fn loaded(&self) -> Result<&LoadedModel, PredictionError> {
        self.loaded.as_ref().ok_or(PredictionError::ModelNotLoaded)
    }

    pub fn schema(&self) -> Option<&FeatureSchema> {
        self.loaded.as_ref().map(|l| &l.schema)
    }

    pub fn model_name(&self) -> Option<&str> {
        self.loaded.as_ref().map(|l| l.model.name())
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded.as_ref().map(|l| l.loaded_at)
    }

    /// Known values of the region field, from its one-hot columns
    pub fn regions(&self) -> Result<Vec<String>, PredictionError> {
        let loaded = self.loaded()?;
        Ok(self.extractor.categories(&loaded.schema, &self.region_field))
    }

    /// Build the model input row for `input`
    pub fn normalize(&self, input: &RawInput) -> Result<FeatureRow, PredictionError> {
        let loaded = self.loaded()?;
        self.extractor.extract(&loaded.schema, input)
    }

    /// Run the model on a normalized row
    pub fn predict_row(&self, row: &FeatureRow) -> Result<f64, PredictionError> {
        let loaded = self.loaded()?;
        if !row.matches(&loaded.schema) {
            return Err(PredictionError::PredictionFailure(
                "feature row does not match the model schema".to_string(),
            ));
        }

        let price = loaded.model.predict(row).map_err(|e| {
            error!(
                model = %loaded.model.name(),
                error = %format!("{:#}", e),
                "Model prediction failed"
            );
            PredictionError::PredictionFailure(e.to_string())
        })?;

        if !price.is_finite() {
            error!(model = %loaded.model.name(), price = price, "Model returned a non-finite price");
            return Err(PredictionError::PredictionFailure(
                "modelo retornou um valor não finito".to_string(),
            ));
        }

        debug!(model = %loaded.model.name(), price = price, "Prediction complete");
        Ok(price)
    }

    /// Normalize and predict one record
    pub fn predict(&self, input: &RawInput) -> Result<f64, PredictionError> {
        let row = self.normalize(input)?;
        self.predict_row(&row)
    }

    /// Validate a JSON record and predict it
    pub fn predict_json(&self, value: &Value) -> Result<f64, PredictionError> {
        self.loaded()?;
        let input = RawInput::from_json(value)?;
        self.predict(&input)
    }

    /// Predict every record independently, preserving input order
    pub fn predict_batch(&self, inputs: &[Value]) -> Vec<BatchOutcome> {
        inputs
            .iter()
            .enumerate()
            .map(|(index, value)| BatchOutcome {
                index,
                result: self.predict_json(value),
            })
            .collect()
    }
}
