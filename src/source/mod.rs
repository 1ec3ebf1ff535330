//! CSV dataset loading.

use csv::{Reader, ReaderBuilder};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::InputError;
use crate::models::{Dataset, Record, Schema, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetRole {
    Query,
    Reference,
}

impl DatasetRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Reference => "reference",
        }
    }
}

pub fn open_reader(path: &Path) -> Result<Reader<BufReader<File>>, InputError> {
    let file = File::open(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(BufReader::with_capacity(512 * 1024, file)))
}

/// Read only the header row.
pub fn discover_columns(path: &Path) -> Result<Schema, InputError> {
    let mut rdr = open_reader(path)?;
    let headers = rdr.headers().map_err(|source| InputError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Schema::new(headers.iter()))
}

/// Header check for the configured match field, before any rows are read.
pub fn validate_match_field(
    path: &Path,
    role: DatasetRole,
    field: &str,
) -> Result<Schema, InputError> {
    let schema = discover_columns(path)?;
    schema.require(role.as_str(), field)?;
    log::info!(
        "{} dataset {} columns: {:?}",
        role.as_str(),
        path.display(),
        schema.columns()
    );
    Ok(schema)
}

pub fn read_dataset(path: &Path) -> Result<Dataset, InputError> {
    let csv_err = |source| InputError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = open_reader(path)?;
    let schema = Schema::new(rdr.headers().map_err(csv_err)?.iter());
    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row.map_err(csv_err)?;
        records.push(Record::new(row.iter().map(Value::from_field).collect()));
    }
    log::debug!("read {} rows from {}", records.len(), path.display());
    Ok(Dataset::new(schema, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_header_and_typed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_csv(dir.path(), "q.csv", "id,name,score\n1,\"Acme, Inc\",2.5\n2,,\n");
        let ds = read_dataset(&p).unwrap();
        assert_eq!(ds.schema.columns(), ["id", "name", "score"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].values[1], Value::Text("Acme, Inc".into()));
        assert!(ds.records[1].values[1].is_null());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_dataset(Path::new("/nonexistent/q.csv")).unwrap_err();
        assert!(matches!(err, InputError::Io { .. }));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_csv(dir.path(), "bad.csv", "a,b\n1,2\n3\n");
        assert!(matches!(read_dataset(&p).unwrap_err(), InputError::Csv { .. }));
    }

    #[test]
    fn match_field_checked_from_header() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_csv(dir.path(), "r.csv", "org_id,organization\n");
        assert!(validate_match_field(&p, DatasetRole::Reference, "organization").is_ok());
        let err = validate_match_field(&p, DatasetRole::Reference, "name").unwrap_err();
        assert!(matches!(
            err,
            InputError::MissingColumn {
                dataset: "reference",
                ..
            }
        ));
    }
}
