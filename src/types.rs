use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::aggregate::ReductionKind;

//==============================================================================
// Record Model
//==============================================================================

/// A single field value on a record.
///
/// Deserialized untagged from JSON/YAML scalars. ISO dates (`YYYY-MM-DD`)
/// become [`FieldValue::Date`]; any other string stays text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
    Text(String),
    Null,
}

impl FieldValue {
    /// The numeric value, only when the field is genuinely numeric.
    ///
    /// Booleans, numeric-looking text and dates are not coerced.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Number(_) => "Number",
            FieldValue::Boolean(_) => "Boolean",
            FieldValue::Date(_) => "Date",
            FieldValue::Text(_) => "Text",
            FieldValue::Null => "Null",
        }
    }

    /// Parse a loosely typed command-line value (`key=value` style).
    ///
    /// Tries number, then boolean, then ISO date, falling back to text.
    pub fn parse_loose(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(n) = trimmed.parse::<f64>() {
            return FieldValue::Number(n);
        }
        match trimmed.to_lowercase().as_str() {
            "true" => return FieldValue::Boolean(true),
            "false" => return FieldValue::Boolean(false),
            _ => {}
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return FieldValue::Date(date);
        }
        FieldValue::Text(trimmed.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        FieldValue::Date(d)
    }
}

/// A flat record: field name -> typed value.
///
/// Supplied by the data layer (a deal, account, contact row). Formulas only
/// ever read from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Exact-key lookup (case-sensitive)
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Numeric value of an exact key, if present and numeric
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_number)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

//==============================================================================
// Report Configuration Types
//==============================================================================

/// A named formula evaluated per record, owned by one report configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatedField {
    pub id: String,
    pub name: String,
    pub formula: String,
}

impl CalculatedField {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        formula: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            formula: formula.into(),
        }
    }
}

/// A custom report metric: a formula reduced across all records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub id: String,
    pub name: String,
    pub formula: String,
    #[serde(default)]
    pub kind: ReductionKind,
}
