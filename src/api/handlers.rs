//! Route handlers

use super::{api_error, client_detail, ApiError, AppState};
use crate::error::PredictionError;
use crate::types::response::{BatchItem, BatchResponse, HealthResponse, PredictionResponse};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{info, info_span, warn};

pub(crate) async fn root_handler(State(state): State<AppState>) -> Json<Value> {
    let engine = state.engine();
    Json(json!({
        "message": "API de Previsão de Preços de Casas",
        "status": "online",
        "versao": env!("CARGO_PKG_VERSION"),
        "modelo_carregado": engine.is_ready(),
        "modelo": engine.model_name(),
        "carregado_em": engine.loaded_at().map(|t| t.to_rfc3339()),
        "endpoints": {
            "prever": "/prever",
            "prever_multiplas": "/prever/batch",
            "regioes_disponiveis": "/regioes",
            "health": "/health"
        }
    }))
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine = state.engine();
    let total_colunas = engine.schema().map_or(0, |s| s.len());

    Json(HealthResponse {
        status: if engine.is_ready() { "healthy" } else { "unhealthy" }.to_string(),
        modelo_carregado: engine.is_ready(),
        colunas_carregadas: engine.schema().is_some(),
        total_colunas,
    })
}

pub(crate) async fn regions_handler(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let regioes = state.engine().regions().map_err(|e| api_error(&e))?;

    Ok(Json(json!({
        "total": regioes.len(),
        "regioes_disponiveis": regioes,
    })))
}

/// Map an axum body rejection onto the standard error body
fn rejected(state: &AppState, rejection: JsonRejection) -> ApiError {
    let err = PredictionError::MalformedInput(rejection.body_text());
    state.metrics().record_failure(err.kind());
    warn!(status = %rejection.status(), error = %err, "Request body rejected");
    api_error(&err)
}

pub(crate) async fn predict_handler(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let request_id = uuid::Uuid::new_v4();
    let span = info_span!("prever", request_id = %request_id);
    let Json(body) = payload.map_err(|e| span.in_scope(|| rejected(&state, e)))?;

    span.in_scope(|| {
        let start = Instant::now();
        match state.engine().predict_json(&body) {
            Ok(price) => {
                state.metrics().record_success(start.elapsed());
                info!(
                    price = price,
                    elapsed_us = start.elapsed().as_micros() as u64,
                    "Prediction served"
                );
                Ok(Json(PredictionResponse::success(price, body)))
            }
            Err(e) => {
                state.metrics().record_failure(e.kind());
                warn!(kind = e.kind(), error = %e, "Prediction rejected");
                Err(api_error(&e))
            }
        }
    })
}

pub(crate) async fn batch_predict_handler(
    State(state): State<AppState>,
    payload: Result<Json<Vec<Value>>, JsonRejection>,
) -> Result<Json<BatchResponse>, ApiError> {
    let request_id = uuid::Uuid::new_v4();
    let span = info_span!("prever_batch", request_id = %request_id);
    let Json(body) = payload.map_err(|e| span.in_scope(|| rejected(&state, e)))?;

    span.in_scope(|| {
        let engine = state.engine();
        if !engine.is_ready() {
            state.metrics().record_failure(PredictionError::ModelNotLoaded.kind());
            return Err(api_error(&PredictionError::ModelNotLoaded));
        }

        let start = Instant::now();
        let outcomes = engine.predict_batch(&body);
        let elapsed = start.elapsed();
        let per_item = elapsed / body.len().max(1) as u32;

        let mut failed = 0;
        let previsoes: Vec<BatchItem> = outcomes
            .into_iter()
            .zip(body)
            .map(|(outcome, dados)| match outcome.result {
                Ok(price) => {
                    state.metrics().record_success(per_item);
                    BatchItem::success(outcome.index, price, dados)
                }
                Err(e) => {
                    failed += 1;
                    state.metrics().record_failure(e.kind());
                    BatchItem::error(outcome.index, client_detail(&e), dados)
                }
            })
            .collect();

        info!(
            total = previsoes.len(),
            failed = failed,
            elapsed_us = elapsed.as_micros() as u64,
            "Batch prediction served"
        );

        Ok(Json(BatchResponse {
            total_casas: previsoes.len(),
            previsoes,
        }))
    })
}
