//! HTTP API for house price prediction
//!
//! ## Endpoints
//!
//! - `GET /` - Service banner and readiness
//! - `GET /health` - Model and column load status
//! - `GET /regioes` - Known values of the region field
//! - `POST /prever` - Predict the price of one house
//! - `POST /prever/batch` - Predict prices for a list of houses
//!
//! ## Example
//!
//! ```rust,ignore
//! let engine = InferenceEngine::load(&config);
//! let app = create_router(AppState::new(engine));
//! axum::serve(listener, app).await?;
//! ```

mod handlers;

use crate::error::PredictionError;
use crate::metrics::ServiceMetrics;
use crate::models::InferenceEngine;
use crate::types::response::ErrorResponse;
use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    engine: Arc<InferenceEngine>,
    metrics: Arc<ServiceMetrics>,
}

impl AppState {
    pub fn new(engine: InferenceEngine) -> Self {
        Self::with_metrics(engine, Arc::new(ServiceMetrics::new()))
    }

    pub fn with_metrics(engine: InferenceEngine, metrics: Arc<ServiceMetrics>) -> Self {
        Self {
            engine: Arc::new(engine),
            metrics,
        }
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    pub fn metrics(&self) -> &Arc<ServiceMetrics> {
        &self.metrics
    }
}

/// Build the service router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root_handler))
        .route("/health", get(handlers::health_handler))
        .route("/regioes", get(handlers::regions_handler))
        .route("/prever", post(handlers::predict_handler))
        .route("/prever/batch", post(handlers::batch_predict_handler))
        .with_state(state)
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

/// Fixed status code for each prediction error kind
pub fn status_for(error: &PredictionError) -> StatusCode {
    match error {
        PredictionError::ModelNotLoaded => StatusCode::INTERNAL_SERVER_ERROR,
        PredictionError::InvalidCategory { .. } => StatusCode::BAD_REQUEST,
        PredictionError::MalformedInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PredictionError::PredictionFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Client-facing detail; model failures stay generic, the cause is logged
pub fn client_detail(error: &PredictionError) -> String {
    match error {
        PredictionError::PredictionFailure(_) => "Erro ao fazer previsão".to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn api_error(error: &PredictionError) -> ApiError {
    let valores_validos = match error {
        PredictionError::InvalidCategory { valid, .. } => Some(valid.clone()),
        _ => None,
    };

    (
        status_for(error),
        Json(ErrorResponse {
            detail: client_detail(error),
            valores_validos,
        }),
    )
}
