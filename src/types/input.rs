//! Loosely typed prediction input as sent by API clients

use crate::error::PredictionError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single scalar field of a raw input record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InputValue {
    Number(f64),
    Text(String),
    Bool(bool),
    Null,
}

impl From<f64> for InputValue {
    fn from(value: f64) -> Self {
        InputValue::Number(value)
    }
}

impl From<i64> for InputValue {
    fn from(value: i64) -> Self {
        InputValue::Number(value as f64)
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        InputValue::Text(value.to_string())
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        InputValue::Bool(value)
    }
}

/// Field name to value mapping for one house.
///
/// Any field may be absent or null; nested arrays and objects are rejected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct RawInput {
    #[serde(flatten)]
    fields: BTreeMap<String, InputValue>,
}

impl RawInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion
    pub fn with(mut self, name: &str, value: impl Into<InputValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Convert a JSON body into a raw input record
    pub fn from_json(value: &Value) -> Result<Self, PredictionError> {
        let object = value.as_object().ok_or_else(|| {
            PredictionError::MalformedInput(format!(
                "esperado um objeto JSON, recebido {}",
                json_type_name(value)
            ))
        })?;

        let mut fields = BTreeMap::new();
        for (name, v) in object {
            let field = match v {
                Value::Null => InputValue::Null,
                Value::Bool(b) => InputValue::Bool(*b),
                Value::Number(n) => match n.as_f64() {
                    Some(n) => InputValue::Number(n),
                    None => {
                        return Err(PredictionError::MalformedInput(format!(
                            "campo '{}' não é um número representável",
                            name
                        )))
                    }
                },
                Value::String(s) => InputValue::Text(s.clone()),
                other => {
                    return Err(PredictionError::MalformedInput(format!(
                        "campo '{}' deve ser escalar, recebido {}",
                        name,
                        json_type_name(other)
                    )))
                }
            };
            fields.insert(name.clone(), field);
        }

        Ok(Self { fields })
    }

    /// Value of a field; explicit nulls read as absent
    pub fn get(&self, name: &str) -> Option<&InputValue> {
        self.fields.get(name).filter(|v| **v != InputValue::Null)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl TryFrom<Value> for RawInput {
    type Error = PredictionError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(&value)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "booleano",
        Value::Number(_) => "número",
        Value::String(_) => "texto",
        Value::Array(_) => "lista",
        Value::Object(_) => "objeto",
    }
}
