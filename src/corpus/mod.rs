pub mod shared;

use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;

use crate::error::{CorpusError, InputError};
use crate::models::{Dataset, Record, Schema, Value};
use crate::normalize::normalize_value;

pub use shared::{CorpusHandle, KeySegment, KeyView};

/// Normalized reference keys plus the records they came from, index-aligned.
#[derive(Debug, Clone)]
pub struct ReferenceCorpus {
    keys: Vec<String>,
    records: Vec<Record>,
    schema: Arc<Schema>,
}

impl ReferenceCorpus {
    /// Normalize `field` of every reference record. With `keep_key` the key is
    /// also appended to each record under `<field>_std`.
    pub fn build(dataset: Dataset, field: &str, keep_key: bool) -> Result<Self, InputError> {
        let idx = dataset.schema.require("reference", field)?;
        let keys: Vec<String> =
            dataset.records.par_iter().map(|r| normalize_value(r.get(idx))).collect();
        let (schema, records) = if keep_key {
            let schema = Arc::new(dataset.schema.with_column(format!("{field}_std")));
            let records = dataset
                .records
                .into_iter()
                .zip(&keys)
                .map(|(mut r, k)| {
                    r.values.push(Value::Text(k.clone()));
                    r
                })
                .collect();
            (schema, records)
        } else {
            (dataset.schema, dataset.records)
        };
        Ok(Self {
            keys,
            records,
            schema,
        })
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Longest key in bytes; the shared segment's element width.
    pub fn max_key_width(&self) -> usize {
        self.keys.iter().map(String::len).max().unwrap_or(0)
    }

    pub fn publish(&self, dir: Option<&Path>) -> Result<KeySegment, CorpusError> {
        KeySegment::publish(&self.keys, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::new(
            Schema::new(["id", "org"]),
            vec![
                Record::new(vec![Value::from_field("1"), Value::from_field("ACME CORPORATION")]),
                Record::new(vec![Value::from_field("2"), Value::Null]),
            ],
        )
    }

    #[test]
    fn build_normalizes_match_field() {
        let c = ReferenceCorpus::build(dataset(), "org", false).unwrap();
        assert_eq!(c.keys(), ["acme corporation".to_string(), String::new()]);
        assert_eq!(c.schema().columns(), ["id", "org"]);
        assert_eq!(c.max_key_width(), 16);
    }

    #[test]
    fn build_can_keep_normalized_key() {
        let c = ReferenceCorpus::build(dataset(), "org", true).unwrap();
        assert_eq!(c.schema().columns(), ["id", "org", "org_std"]);
        assert_eq!(c.records()[0].values[2], Value::Text("acme corporation".into()));
        assert_eq!(c.records()[1].values[2], Value::Text(String::new()));
    }

    #[test]
    fn build_requires_field() {
        let err = ReferenceCorpus::build(dataset(), "name", false).unwrap_err();
        assert!(matches!(
            err,
            InputError::MissingColumn {
                dataset: "reference",
                ..
            }
        ));
    }
}
