//! Feature schema and feature rows.
//!
//! The schema is the ordered column list persisted next to the trained model.
//! Every [`FeatureRow`] handed to a model is keyed by exactly these columns,
//! in exactly this order.

use crate::error::SchemaError;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::HashMap;

/// Ordered list of the columns a trained model expects
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
}

impl FeatureSchema {
    /// Validate and build a schema from persisted column names.
    pub fn new(columns: Vec<String>) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut positions = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(SchemaError::BlankColumn(i));
            }
            if positions.insert(name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateColumn(name.clone()));
            }
        }

        Ok(Self { columns, positions })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column, if the schema has it
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Whether `column` is a one-hot column of `field`, i.e. `<field>_<value>`
    /// with a non-empty value.
    pub fn is_one_hot_column(&self, field: &str, column: &str) -> bool {
        self.contains(column)
            && column
                .strip_prefix(field)
                .and_then(|rest| rest.strip_prefix('_'))
                .is_some_and(|v| !v.is_empty())
    }
}

/// Normalized value of one feature column
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    /// Text the normalizer had no canonical encoding for
    Text(String),
    /// Field absent from the input
    Missing,
}

impl FeatureValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl Serialize for FeatureValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FeatureValue::Number(n) => serializer.serialize_f64(*n),
            FeatureValue::Text(s) => serializer.serialize_str(s),
            FeatureValue::Missing => serializer.serialize_none(),
        }
    }
}

/// One fully populated model input, keyed by the schema columns in order.
///
/// Only built by [`crate::feature_extractor::FeatureExtractor`], which
/// guarantees the key set equals the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    entries: Vec<(String, FeatureValue)>,
}

impl FeatureRow {
    pub(crate) fn from_entries(entries: Vec<(String, FeatureValue)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Value at a schema position
    pub fn value_at(&self, index: usize) -> Option<&FeatureValue> {
        self.entries.get(index).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Check the row is keyed exactly by `schema`, in order
    pub fn matches(&self, schema: &FeatureSchema) -> bool {
        self.len() == schema.len() && self.keys().eq(schema.columns().iter().map(String::as_str))
    }
}

impl Serialize for FeatureRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(cols: &[&str]) -> FeatureSchema {
        FeatureSchema::new(cols.iter().map(|c| c.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_schema_validation() {
        assert_eq!(FeatureSchema::new(vec![]), Err(SchemaError::Empty));
        assert_eq!(
            FeatureSchema::new(vec!["area".into(), " ".into()]),
            Err(SchemaError::BlankColumn(1))
        );
        assert_eq!(
            FeatureSchema::new(vec!["area".into(), "area".into()]),
            Err(SchemaError::DuplicateColumn("area".into()))
        );
    }

    #[test]
    fn test_positions() {
        let s = schema(&["area", "quartos", "regiao_norte"]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.position("quartos"), Some(1));
        assert_eq!(s.position("suites"), None);
        assert!(s.contains("regiao_norte"));
    }

    #[test]
    fn test_one_hot_columns() {
        let s = schema(&["area", "regiao_norte", "regiao_sul", "regiaox", "regiao_"]);
        assert!(s.is_one_hot_column("regiao", "regiao_sul"));
        assert!(!s.is_one_hot_column("regiao", "regiao_leste"));
        assert!(s.is_one_hot_column("regiao", "regiao_norte"));
        assert!(!s.is_one_hot_column("regiao", "regiaox"));
        assert!(!s.is_one_hot_column("regiao", "regiao_"));
        assert!(!s.is_one_hot_column("regiao", "area"));
    }

    #[test]
    fn test_row_serializes_in_schema_order() {
        let row = FeatureRow::from_entries(vec![
            ("b".to_string(), FeatureValue::Number(1.0)),
            ("a".to_string(), FeatureValue::Text("x".to_string())),
            ("c".to_string(), FeatureValue::Missing),
        ]);

        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"b":1.0,"a":"x","c":null}"#);
        assert!(row.matches(&schema(&["b", "a", "c"])));
        assert!(!row.matches(&schema(&["a", "b", "c"])));
    }
}
