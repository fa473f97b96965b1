//! Error types for feature normalization and prediction

use thiserror::Error;

/// Failure of a single prediction request.
///
/// The HTTP layer maps each variant to a fixed status code, see
/// [`crate::api::status_for`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    /// Model and feature schema were never loaded
    #[error("Modelo não carregado. Verifique se os arquivos do modelo existem.")]
    ModelNotLoaded,

    /// Categorical value has no matching one-hot column in the schema
    #[error("Valor '{value}' inválido para '{field}'. Valores válidos: {}", valid.join(", "))]
    InvalidCategory {
        field: String,
        value: String,
        valid: Vec<String>,
    },

    /// Input record is not a flat object of numbers, strings, booleans or nulls
    #[error("Entrada inválida: {0}")]
    MalformedInput(String),

    /// The model call itself failed or produced a non-finite value
    #[error("Erro ao fazer previsão: {0}")]
    PredictionFailure(String),
}

impl PredictionError {
    /// Short stable name, used as a metrics key
    pub fn kind(&self) -> &'static str {
        match self {
            PredictionError::ModelNotLoaded => "model_not_loaded",
            PredictionError::InvalidCategory { .. } => "invalid_category",
            PredictionError::MalformedInput(_) => "malformed_input",
            PredictionError::PredictionFailure(_) => "prediction_failure",
        }
    }
}

/// Persisted feature list failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("feature schema is empty")]
    Empty,

    #[error("feature schema has a blank column name at position {0}")]
    BlankColumn(usize),

    #[error("feature schema lists column '{0}' more than once")]
    DuplicateColumn(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_category_lists_valid_values() {
        let err = PredictionError::InvalidCategory {
            field: "regiao".to_string(),
            value: "leste".to_string(),
            valid: vec!["norte".to_string(), "sul".to_string()],
        };

        let message = err.to_string();
        assert!(message.contains("leste"));
        assert!(message.contains("norte, sul"));
        assert_eq!(err.kind(), "invalid_category");
    }
}
