use crate::error::MatchError;
use crate::models::{MatchResult, Record, Schema, Value};

pub const FLAG_COLUMN: &str = "merge_flag";

/// Output header: query columns, reference columns, flag. Duplicate names are kept.
pub fn merged_header(query: &Schema, reference: &Schema) -> Vec<String> {
    let mut header = Vec::with_capacity(query.len() + reference.len() + 1);
    header.extend(query.columns().iter().cloned());
    header.extend(reference.columns().iter().cloned());
    header.push(FLAG_COLUMN.to_string());
    header
}

/// Join a query record with its accepted reference record, or with
/// `reference_width` nulls when there is none.
pub fn merge(
    query: &Record,
    accepted: Option<usize>,
    references: &[Record],
    reference_width: usize,
) -> Result<MatchResult, MatchError> {
    let mut values = Vec::with_capacity(query.len() + reference_width);
    values.extend(query.values.iter().cloned());
    if let Some(index) = accepted {
        let matched = references
            .get(index)
            .ok_or(MatchError::ReferenceOutOfRange {
                index,
                len: references.len(),
            })?;
        values.extend(matched.values.iter().cloned());
    }
    // every row has query + reference arity, matched or not
    values.resize(query.len() + reference_width, Value::Null);
    Ok(MatchResult {
        values,
        matched: accepted.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(vals: &[&str]) -> Record {
        Record::new(vals.iter().map(|v| Value::from_field(v)).collect())
    }

    #[test]
    fn header_keeps_colliding_names() {
        let q = Schema::new(["id", "name"]);
        let r = Schema::new(["id", "org"]);
        assert_eq!(merged_header(&q, &r), vec!["id", "name", "id", "org", "merge_flag"]);
    }

    #[test]
    fn accepted_match_concatenates() {
        let refs = vec![rec(&["r1", "ACME CORPORATION"]), rec(&["r2", "Other Co"])];
        let m = merge(&rec(&["q1", "Acme Corp"]), Some(0), &refs, 2).unwrap();
        assert!(m.matched);
        assert_eq!(m.flag(), 1);
        assert_eq!(m.values, rec(&["q1", "Acme Corp", "r1", "ACME CORPORATION"]).values);
    }

    #[test]
    fn rejected_match_null_fills_reference_columns() {
        let refs = vec![rec(&["r1", "Acme Corp"])];
        let m = merge(&rec(&["q1", "Zzzz Unmatched"]), None, &refs, 2).unwrap();
        assert_eq!(m.flag(), 0);
        assert_eq!(m.values.len(), 4);
        assert!(m.values[2..].iter().all(Value::is_null));
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let err = merge(&rec(&["q"]), Some(5), &[], 1).unwrap_err();
        assert!(matches!(
            err,
            MatchError::ReferenceOutOfRange { index: 5, len: 0 }
        ));
    }
}
