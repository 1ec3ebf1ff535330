use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::export::csv_export::DEFAULT_FLUSH_THRESHOLD_BYTES;
use crate::matching::DEFAULT_THRESHOLD;
use crate::matching::algorithms::ScorerKind;

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct InputConfig {
    pub query_path: PathBuf,
    pub reference_path: PathBuf,
    pub query_field: String,
    pub reference_field: String,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct MatchingConfig {
    pub threshold: f64,
    pub scorer: ScorerKind,
    /// Append the reference key as `<reference_field>_std`.
    pub keep_normalized_key: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            scorer: ScorerKind::default(),
            keep_normalized_key: false,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct StreamingConfig {
    pub batch_size: usize,
    pub workers: Option<usize>, // None: FUZZY_MERGE_WORKERS or core count
    pub in_flight_batches: Option<usize>, // None: 4 x workers
    pub segment_dir: Option<PathBuf>,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            workers: None,
            in_flight_batches: None,
            segment_dir: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ExportConfig {
    pub out_path: PathBuf,
    pub flush_threshold_bytes: usize,
    pub append: bool,
    pub summary_path: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            out_path: PathBuf::new(),
            flush_threshold_bytes: DEFAULT_FLUSH_THRESHOLD_BYTES,
            append: false,
            summary_path: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub streaming: StreamingConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.query_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "input.query_path",
            });
        }
        if self.input.reference_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "input.reference_path",
            });
        }
        if self.input.query_field.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "input.query_field",
            });
        }
        if self.input.reference_field.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "input.reference_field",
            });
        }
        if self.export.out_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "export.out_path",
            });
        }
        if !(0.0..=100.0).contains(&self.matching.threshold) {
            return Err(ConfigError::InvalidValue {
                field: "matching.threshold",
                reason: format!("{} not in 0..=100", self.matching.threshold),
            });
        }
        if self.streaming.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "streaming.batch_size",
                reason: "must be > 0".into(),
            });
        }
        if self.streaming.workers == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "streaming.workers",
                reason: "must be > 0".into(),
            });
        }
        if self.streaming.in_flight_batches == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "streaming.in_flight_batches",
                reason: "must be > 0".into(),
            });
        }
        if self.export.flush_threshold_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "export.flush_threshold_bytes",
                reason: "must be > 0".into(),
            });
        }
        if self.export.out_path == self.input.query_path
            || self.export.out_path == self.input.reference_path
        {
            return Err(ConfigError::InvalidValue {
                field: "export.out_path",
                reason: format!(
                    "{} is also an input dataset",
                    self.export.out_path.display()
                ),
            });
        }
        Ok(())
    }
}
