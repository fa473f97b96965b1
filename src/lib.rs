//! House Price Service Library
//!
//! Loads a trained house price regression model with its feature schema,
//! normalizes loosely typed client input into the trained column layout and
//! serves predictions over HTTP.

pub mod api;
pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod schema;
pub mod types;

pub use api::{create_router, AppState};
pub use config::AppConfig;
pub use error::{PredictionError, SchemaError};
pub use feature_extractor::FeatureExtractor;
pub use models::{InferenceEngine, Regressor};
pub use schema::{FeatureRow, FeatureSchema, FeatureValue};
pub use types::input::{InputValue, RawInput};
