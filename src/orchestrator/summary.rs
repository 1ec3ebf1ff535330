//! Run summary report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use crate::error::ExportError;
use crate::export::csv_export::export_summary_csv;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub query_path: String,
    pub reference_path: String,
    pub out_path: String,
    pub query_rows: usize,
    pub reference_rows: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub batches: usize,
    pub batch_size: usize,
    pub workers: usize,
    pub scorer: &'static str,
    pub threshold: f64,
    pub bytes_written: u64,
    pub flushes: usize,
    pub key_width: usize,
    pub mem_used_start_mb: u64,
    pub mem_used_end_mb: u64,
    pub started_utc: DateTime<Utc>,
    pub ended_utc: DateTime<Utc>,
    pub elapsed_secs: f64,
}

impl RunSummary {
    pub fn match_rate(&self) -> f64 {
        if self.query_rows == 0 {
            0.0
        } else {
            self.matched as f64 / self.query_rows as f64
        }
    }

    pub fn log(&self) {
        log::info!(
            "Merged {} query rows against {} reference rows: {} matched ({:.1}%), {} unmatched",
            self.query_rows,
            self.reference_rows,
            self.matched,
            self.match_rate() * 100.0,
            self.unmatched
        );
        log::info!(
            "{} batches of {} on {} workers, scorer={} threshold>{}",
            self.batches,
            self.batch_size,
            self.workers,
            self.scorer,
            self.threshold
        );
        log::info!(
            "Wrote {} bytes in {} flushes to {}",
            self.bytes_written,
            self.flushes,
            self.out_path
        );
        log::info!(
            "Memory used: {} MB -> {} MB; elapsed {:.3}s",
            self.mem_used_start_mb,
            self.mem_used_end_mb,
            self.elapsed_secs
        );
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), ExportError> {
        export_summary_csv(self, path)
    }
}
