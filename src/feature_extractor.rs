//! Feature extraction for house price model inference.
//!
//! Turns a loosely typed [`RawInput`] into a [`FeatureRow`] keyed exactly by
//! the trained [`FeatureSchema`]: absent fields are defaulted, sim/não flags
//! become 1/0 and categorical fields are expanded into their one-hot columns.

use crate::config::FeatureConfig;
use crate::error::PredictionError;
use crate::schema::{FeatureRow, FeatureSchema, FeatureValue};
use crate::types::input::{InputValue, RawInput};
use std::collections::HashSet;

/// Canonical encoding of boolean-coded answers
const BOOLEAN_TABLE: &[(&str, f64)] = &[
    ("sim", 1.0),
    ("yes", 1.0),
    ("true", 1.0),
    ("não", 0.0),
    ("nao", 0.0),
    ("no", 0.0),
    ("false", 0.0),
];

/// Map a sim/não style answer to 1/0, case-insensitively
pub fn encode_boolean(text: &str) -> Option<f64> {
    let key = text.trim().to_lowercase();
    BOOLEAN_TABLE
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
}

/// Parse a numeric field sent as text, e.g. `"120.5"`
fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Feature extractor that transforms raw input into model input rows.
///
/// Stateless apart from its field configuration; the schema is passed per
/// call so one extractor serves whatever model is loaded.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    boolean_fields: HashSet<String>,
    numeric_fields: HashSet<String>,
    one_hot_fields: Vec<String>,
}

impl FeatureExtractor {
    pub fn new(config: &FeatureConfig) -> Self {
        Self {
            boolean_fields: config.boolean_fields.iter().cloned().collect(),
            numeric_fields: config.numeric_fields.iter().cloned().collect(),
            one_hot_fields: config.one_hot_fields.clone(),
        }
    }

    /// Extract a feature row for `schema` from `input`.
    ///
    /// The returned row always has exactly the schema's columns in schema
    /// order. Non-numeric text in a numeric field is rejected with
    /// [`PredictionError::MalformedInput`], a categorical value with no
    /// matching one-hot column with [`PredictionError::InvalidCategory`].
    pub fn extract(
        &self,
        schema: &FeatureSchema,
        input: &RawInput,
    ) -> Result<FeatureRow, PredictionError> {
        self.check_numeric(input)?;

        let mut entries: Vec<(String, FeatureValue)> = schema
            .columns()
            .iter()
            .map(|column| {
                let value = if self.owner(schema, column).is_some() {
                    FeatureValue::Number(0.0)
                } else {
                    self.column_value(column, input.get(column))
                };
                (column.clone(), value)
            })
            .collect();

        for field in &self.one_hot_fields {
            if self.categories(schema, field).is_empty() {
                continue;
            }
            if let Some(column) = self.one_hot_column(schema, field, input.get(field))? {
                if let Some(i) = schema.position(&column) {
                    entries[i].1 = FeatureValue::Number(1.0);
                }
            }
        }

        Ok(FeatureRow::from_entries(entries))
    }

    /// Known categories of a one-hot field, in schema order.
    ///
    /// A column shared by two configured prefixes (`tipo_imovel_casa` with
    /// `tipo` and `tipo_imovel`) belongs to the longer one.
    pub fn categories(&self, schema: &FeatureSchema, field: &str) -> Vec<String> {
        let prefix = format!("{}_", field);
        schema
            .columns()
            .iter()
            .filter(|c| self.owner(schema, c) == Some(field))
            .filter_map(|c| c.strip_prefix(&prefix))
            .map(str::to_string)
            .collect()
    }

    /// Configured one-hot field a column belongs to, longest prefix first
    fn owner(&self, schema: &FeatureSchema, column: &str) -> Option<&str> {
        self.one_hot_fields
            .iter()
            .map(String::as_str)
            .filter(|f| schema.is_one_hot_column(f, column))
            .max_by_key(|f| f.len())
    }

    /// Reject text that does not parse as a number in a numeric field
    fn check_numeric(&self, input: &RawInput) -> Result<(), PredictionError> {
        for field in &self.numeric_fields {
            if let Some(InputValue::Text(s)) = input.get(field) {
                if parse_number(s).is_none() {
                    return Err(PredictionError::MalformedInput(format!(
                        "campo '{}' deve ser numérico, recebido '{}'",
                        field, s
                    )));
                }
            }
        }
        Ok(())
    }

    /// Normalize a plain (non one-hot) column value
    fn column_value(&self, column: &str, value: Option<&InputValue>) -> FeatureValue {
        let is_boolean = self.boolean_fields.contains(column);
        match value {
            None | Some(InputValue::Null) => FeatureValue::Missing,
            Some(InputValue::Number(n)) => FeatureValue::Number(*n),
            Some(InputValue::Bool(b)) => FeatureValue::Number(if *b { 1.0 } else { 0.0 }),
            Some(InputValue::Text(s)) if is_boolean => match encode_boolean(s) {
                Some(n) => FeatureValue::Number(n),
                None => FeatureValue::Text(s.clone()),
            },
            Some(InputValue::Text(s)) if self.numeric_fields.contains(column) => {
                parse_number(s).map_or_else(|| FeatureValue::Text(s.clone()), FeatureValue::Number)
            }
            Some(InputValue::Text(s)) => FeatureValue::Text(s.clone()),
        }
    }

    /// Resolve the one-hot column a categorical value selects.
    ///
    /// `Ok(None)` when the field was not supplied.
    fn one_hot_column(
        &self,
        schema: &FeatureSchema,
        field: &str,
        value: Option<&InputValue>,
    ) -> Result<Option<String>, PredictionError> {
        let raw = match value {
            None | Some(InputValue::Null) => return Ok(None),
            Some(InputValue::Text(s)) => s.trim().to_lowercase(),
            Some(InputValue::Number(n)) => n.to_string(),
            Some(InputValue::Bool(b)) => b.to_string(),
        };

        let column = format!("{}_{}", field, raw);
        if schema.contains(&column) && self.owner(schema, &column) == Some(field) {
            Ok(Some(column))
        } else {
            Err(PredictionError::InvalidCategory {
                field: field.to_string(),
                value: raw,
                valid: self.categories(schema, field),
            })
        }
    }

    /// Number of boolean-coded fields recognised
    pub fn boolean_field_count(&self) -> usize {
        self.boolean_fields.len()
    }

    pub fn one_hot_fields(&self) -> &[String] {
        &self.one_hot_fields
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(&FeatureConfig::default())
    }
}
