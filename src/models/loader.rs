//! Model and feature schema loader

use crate::models::artifact::ModelArtifact;
use crate::models::Regressor;
use crate::schema::FeatureSchema;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use tracing::info;

/// Trained model together with the schema it was bound to
pub struct LoadedModel {
    pub model: Box<dyn Regressor>,
    pub schema: FeatureSchema,
    pub loaded_at: DateTime<Utc>,
}

impl LoadedModel {
    pub fn new(model: Box<dyn Regressor>, schema: FeatureSchema) -> Self {
        Self {
            model,
            schema,
            loaded_at: Utc::now(),
        }
    }
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("model", &self.model.name())
            .field("columns", &self.schema.len())
            .field("loaded_at", &self.loaded_at)
            .finish()
    }
}

/// Loader for the persisted model artifact and feature list
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    #[cfg_attr(not(feature = "onnx"), allow(dead_code))]
    onnx_threads: usize,
}

impl ModelLoader {
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    pub fn with_threads(onnx_threads: usize) -> Self {
        Self { onnx_threads }
    }

    /// Load the feature schema, then the model bound to it.
    ///
    /// Nothing is returned unless both load; callers never see half a model.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        model_path: P,
        columns_path: Q,
    ) -> Result<LoadedModel> {
        let schema = self.load_schema(columns_path)?;
        let model = self.load_model(model_path, &schema)?;

        info!(
            model = %model.name(),
            columns = schema.len(),
            "Model and feature schema loaded"
        );

        Ok(LoadedModel::new(model, schema))
    }

    /// Load the ordered feature-name list (a JSON array of strings)
    pub fn load_schema<P: AsRef<Path>>(&self, path: P) -> Result<FeatureSchema> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading feature schema");

        let bytes =
            fs::read(path).with_context(|| format!("Failed to read columns from {:?}", path))?;
        let columns: Vec<String> = serde_json::from_slice(&bytes)
            .with_context(|| format!("Columns file {:?} is not a JSON list of names", path))?;

        FeatureSchema::new(columns).with_context(|| format!("Invalid feature schema in {:?}", path))
    }

    /// Load a model artifact and bind it to `schema`
    pub fn load_model<P: AsRef<Path>>(
        &self,
        path: P,
        schema: &FeatureSchema,
    ) -> Result<Box<dyn Regressor>> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading model");

        if path.extension().is_some_and(|ext| ext == "onnx") {
            return self.load_onnx(path, schema);
        }

        let bytes =
            fs::read(path).with_context(|| format!("Failed to read model from {:?}", path))?;
        ModelArtifact::from_slice(&bytes)?
            .bind(schema)
            .with_context(|| format!("Model in {:?} does not fit the feature schema", path))
    }

    #[cfg(feature = "onnx")]
    fn load_onnx(&self, path: &Path, schema: &FeatureSchema) -> Result<Box<dyn Regressor>> {
        let model = crate::models::onnx::OnnxRegressor::load(path, schema, self.onnx_threads)?;
        Ok(Box::new(model))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx(&self, path: &Path, _schema: &FeatureSchema) -> Result<Box<dyn Regressor>> {
        anyhow::bail!(
            "Cannot load {:?}: built without the `onnx` feature",
            path
        )
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}
