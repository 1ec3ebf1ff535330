use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::InputError;

/// A single scalar cell. Numbers keep their source spelling so values
/// survive a read/write cycle unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    /// Numeric field, kept exactly as spelled in the source.
    Number(String),
    Text(String),
}

impl Value {
    /// Classify a raw CSV field: empty is null, a field whose canonical
    /// numeric rendering matches its text is a number, anything else is text.
    pub fn from_field(raw: &str) -> Self {
        if raw.is_empty() {
            return Value::Null;
        }
        if let Ok(i) = raw.parse::<i64>() {
            if i.to_string() == raw {
                return Value::Number(raw.to_string());
            }
        }
        if let Ok(f) = raw.parse::<f64>() {
            if f.is_finite() && f.to_string() == raw {
                return Value::Number(raw.to_string());
            }
        }
        Value::Text(raw.to_string())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Null => None,
            Value::Number(s) | Value::Text(s) => Some(s),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_text().unwrap_or(""))
    }
}

/// Ordered column names of one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
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

    /// Position of the first column with this name.
    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Like `index_of`, but a missing column is an input error.
    pub fn require(&self, dataset: &'static str, column: &str) -> Result<usize, InputError> {
        self.index_of(column).ok_or_else(|| InputError::MissingColumn {
            dataset,
            column: column.to_string(),
            available: self.columns.join(", "),
        })
    }

    pub fn with_column(&self, column: impl Into<String>) -> Self {
        let mut columns = self.columns.clone();
        columns.push(column.into());
        Self { columns }
    }
}

/// One row, aligned with its dataset's `Schema`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub schema: Arc<Schema>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(schema: Schema, records: Vec<Record>) -> Self {
        Self {
            schema: Arc::new(schema),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Query fields, then reference fields (or nulls), then the match flag.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub values: Vec<Value>,
    pub matched: bool,
}

impl MatchResult {
    pub fn flag(&self) -> u8 {
        u8::from(self.matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_classification() {
        assert_eq!(Value::from_field(""), Value::Null);
        assert_eq!(Value::from_field("42"), Value::Number("42".into()));
        assert_eq!(Value::from_field("1.5"), Value::Number("1.5".into()));
        assert_eq!(Value::from_field("1.50"), Value::Text("1.50".into()));
        // leading zeros would not survive a numeric rendering
        assert_eq!(Value::from_field("007"), Value::Text("007".into()));
        assert_eq!(Value::from_field("Acme"), Value::Text("Acme".into()));
    }

    #[test]
    fn display_keeps_source_spelling() {
        assert_eq!(Value::from_field("1.5").to_string(), "1.5");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn schema_require_reports_available_columns() {
        let s = Schema::new(["id", "name"]);
        assert_eq!(s.require("query", "name").unwrap(), 1);
        let err = s.require("query", "org").unwrap_err().to_string();
        assert!(err.contains("\"org\""));
        assert!(err.contains("id, name"));
    }
}
