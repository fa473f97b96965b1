//! ONNX Runtime backed regressor, enabled with the `onnx` feature

use crate::models::Regressor;
use crate::schema::{FeatureRow, FeatureSchema, FeatureValue};
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Exported regression model fed a `[1, n]` f32 tensor in schema order
pub struct OnnxRegressor {
    /// Sessions need exclusive access to run
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    columns: Vec<String>,
}

impl OnnxRegressor {
    pub fn load(path: &Path, schema: &FeatureSchema, onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("variable") || o.name.contains("output"))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "variable".to_string());

        info!(
            input = %input_name,
            output = %output_name,
            threads = onnx_threads,
            "ONNX model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            columns: schema.columns().to_vec(),
        })
    }

    fn to_tensor_input(&self, row: &FeatureRow) -> Result<Vec<f32>> {
        anyhow::ensure!(
            row.len() == self.columns.len(),
            "row has {} columns, model expects {}",
            row.len(),
            self.columns.len()
        );

        row.iter()
            .map(|(name, value)| match value {
                FeatureValue::Number(n) => Ok(*n as f32),
                FeatureValue::Missing => Ok(f32::NAN),
                FeatureValue::Text(s) => {
                    anyhow::bail!("feature '{}' has non-numeric value '{}'", name, s)
                }
            })
            .collect()
    }
}

impl Regressor for OnnxRegressor {
    fn name(&self) -> &str {
        "onnx"
    }

    fn predict(&self, row: &FeatureRow) -> Result<f64> {
        let features = self.to_tensor_input(row)?;
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, features)).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;

        let output = outputs
            .get(self.output_name.as_str())
            .with_context(|| format!("Model has no output '{}'", self.output_name))?;
        let (_, data) = output.try_extract_tensor::<f32>()?;
        let price = data
            .first()
            .copied()
            .context("Model returned an empty tensor")?;

        debug!(price = price, "ONNX prediction");
        Ok(price as f64)
    }
}
