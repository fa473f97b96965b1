//! Response bodies of the HTTP API

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `POST /prever` success body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub preco_previsto: f64,
    /// Request body echoed back unchanged
    pub dados_entrada: Value,
    pub status: String,
}

impl PredictionResponse {
    pub fn success(preco_previsto: f64, dados_entrada: Value) -> Self {
        Self {
            preco_previsto,
            dados_entrada,
            status: "success".to_string(),
        }
    }
}

/// One element of a batch prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preco_previsto: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erro: Option<String>,
    pub dados: Value,
    pub status: String,
}

impl BatchItem {
    pub fn success(index: usize, preco_previsto: f64, dados: Value) -> Self {
        Self {
            index,
            preco_previsto: Some(preco_previsto),
            erro: None,
            dados,
            status: "success".to_string(),
        }
    }

    pub fn error(index: usize, erro: String, dados: Value) -> Self {
        Self {
            index,
            preco_previsto: None,
            erro: Some(erro),
            dados,
            status: "error".to_string(),
        }
    }
}

/// `POST /prever/batch` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub total_casas: usize,
    pub previsoes: Vec<BatchItem>,
}

/// `GET /health` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub modelo_carregado: bool,
    pub colunas_carregadas: bool,
    pub total_colunas: usize,
}

/// Error body, `detail` mirrors the usual REST convention
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
    /// Accepted values when a categorical field was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valores_validos: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            valores_validos: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_batch_item_omits_absent_fields() {
        let ok = serde_json::to_value(BatchItem::success(0, 250000.0, json!({"area": 80}))).unwrap();
        assert_eq!(ok["status"], "success");
        assert!(ok.get("erro").is_none());

        let err = serde_json::to_value(BatchItem::error(1, "falhou".into(), json!({}))).unwrap();
        assert_eq!(err["status"], "error");
        assert_eq!(err["erro"], "falhou");
        assert!(err.get("preco_previsto").is_none());
    }
}
