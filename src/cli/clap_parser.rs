use crate::config::{AppConfig, ExportConfig, InputConfig, MatchingConfig, StreamingConfig};
use crate::error::ConfigError;
use crate::export::csv_export::DEFAULT_FLUSH_THRESHOLD_BYTES;
use crate::matching::algorithms::ScorerKind;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, ValueEnum, Debug)]
pub enum ScorerOpt {
    Ratio,
    PartialRatio,
    JaroWinkler,
    Levenshtein,
}

impl From<ScorerOpt> for ScorerKind {
    fn from(opt: ScorerOpt) -> Self {
        match opt {
            ScorerOpt::Ratio => ScorerKind::Ratio,
            ScorerOpt::PartialRatio => ScorerKind::PartialRatio,
            ScorerOpt::JaroWinkler => ScorerKind::JaroWinkler,
            ScorerOpt::Levenshtein => ScorerKind::Levenshtein,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "fuzzy_merge",
    version,
    about = "Fuzzy-merge a query CSV onto its best-matching reference rows",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Query dataset (CSV with header)
    #[arg(value_name = "QUERY_CSV", required_unless_present = "write_env_template")]
    pub query: Option<PathBuf>,
    /// Reference dataset (CSV with header)
    #[arg(value_name = "REFERENCE_CSV", required_unless_present = "write_env_template")]
    pub reference: Option<PathBuf>,
    /// Output path
    #[arg(value_name = "OUT_PATH", required_unless_present = "write_env_template")]
    pub out_path: Option<PathBuf>,
    /// Query column to match on (env: FUZZY_MERGE_QUERY_FIELD)
    #[arg(long = "query-field", env = "FUZZY_MERGE_QUERY_FIELD", default_value = "")]
    pub query_field: String,
    /// Reference column to match on (env: FUZZY_MERGE_REFERENCE_FIELD)
    #[arg(long = "reference-field", env = "FUZZY_MERGE_REFERENCE_FIELD", default_value = "")]
    pub reference_field: String,
    /// Query records per batch (env: FUZZY_MERGE_BATCH_SIZE)
    #[arg(long = "batch-size", env = "FUZZY_MERGE_BATCH_SIZE", default_value_t = 100)]
    pub batch_size: usize,
    /// Worker threads (env: FUZZY_MERGE_WORKERS, default: available cores)
    #[arg(long = "workers", env = "FUZZY_MERGE_WORKERS")]
    pub workers: Option<usize>,
    /// Batches dispatched per window before draining (default 4 x workers)
    #[arg(long = "in-flight-batches", env = "FUZZY_MERGE_IN_FLIGHT_BATCHES")]
    pub in_flight_batches: Option<usize>,
    /// Minimum score to accept a match, exclusive (env: FUZZY_MERGE_THRESHOLD)
    #[arg(long = "threshold", env = "FUZZY_MERGE_THRESHOLD", default_value_t = 90.0)]
    pub threshold: f64,
    /// Similarity scorer
    #[arg(
        long = "scorer",
        env = "FUZZY_MERGE_SCORER",
        value_enum,
        default_value_t = ScorerOpt::Ratio
    )]
    pub scorer: ScorerOpt,
    /// Buffered output size that triggers a flush (env: FUZZY_MERGE_FLUSH_BYTES)
    #[arg(
        long = "flush-threshold-bytes",
        env = "FUZZY_MERGE_FLUSH_BYTES",
        default_value_t = DEFAULT_FLUSH_THRESHOLD_BYTES
    )]
    pub flush_threshold_bytes: usize,
    /// Directory for the shared key segment (default /dev/shm, else temp dir)
    #[arg(long = "segment-dir", env = "FUZZY_MERGE_SEGMENT_DIR")]
    pub segment_dir: Option<PathBuf>,
    /// Append to OUT_PATH instead of truncating it
    #[arg(long = "append")]
    pub append: bool,
    /// Carry the normalized reference key as an extra `<field>_std` column
    #[arg(long = "keep-normalized-key")]
    pub keep_normalized_key: bool,
    /// Write a one-row run summary CSV here
    #[arg(long = "summary-path", value_name = "PATH")]
    pub summary_path: Option<PathBuf>,
    /// Write a .env template to PATH and exit
    #[arg(long = "write-env-template", value_name = "PATH")]
    pub write_env_template: Option<PathBuf>,
}

impl Cli {
    pub fn to_app_config(&self) -> Result<AppConfig, ConfigError> {
        let cfg = AppConfig {
            input: InputConfig {
                query_path: self.query.clone().unwrap_or_default(),
                reference_path: self.reference.clone().unwrap_or_default(),
                query_field: self.query_field.clone(),
                reference_field: self.reference_field.clone(),
            },
            matching: MatchingConfig {
                threshold: self.threshold,
                scorer: self.scorer.into(),
                keep_normalized_key: self.keep_normalized_key,
            },
            streaming: StreamingConfig {
                batch_size: self.batch_size,
                workers: self.workers,
                in_flight_batches: self.in_flight_batches,
                segment_dir: self.segment_dir.clone(),
            },
            export: ExportConfig {
                out_path: self.out_path.clone().unwrap_or_default(),
                flush_threshold_bytes: self.flush_threshold_bytes,
                append: self.append,
                summary_path: self.summary_path.clone(),
            },
        };
        cfg.validate()?;
        Ok(cfg)
    }
}
