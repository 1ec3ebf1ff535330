use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ExportError;
use crate::models::MatchResult;

/// Reference flush point: roughly 10 MB of serialized CSV.
pub const DEFAULT_FLUSH_THRESHOLD_BYTES: usize = 10_000_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriterStats {
    pub rows: usize,
    pub bytes: u64,
    pub flushes: usize,
}

/// Buffers serialized rows in memory and appends them to the output file
/// whenever the buffer grows past the flush threshold. The header goes out
/// exactly once, ahead of the first row.
pub struct CsvStreamWriter {
    path: PathBuf,
    sink: File,
    buf: Vec<u8>,
    header: Vec<String>,
    header_written: bool,
    flush_threshold: usize,
    stats: WriterStats,
}

impl CsvStreamWriter {
    /// Open `path` for appending. Unless `append` is set, an existing file is
    /// truncated first.
    pub fn create(
        path: &Path,
        header: Vec<String>,
        flush_threshold: usize,
        append: bool,
    ) -> Result<Self, ExportError> {
        let io_err = |source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        if !append {
            File::create(path).map_err(io_err)?;
        }
        let sink = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_err)?;
        Ok(Self {
            path: path.to_path_buf(),
            sink,
            buf: Vec::with_capacity(64 * 1024),
            header,
            header_written: false,
            flush_threshold: flush_threshold.max(1),
            stats: WriterStats::default(),
        })
    }

    fn io_err(&self, source: std::io::Error) -> ExportError {
        ExportError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Serialize `rows` (plus the header, the first time) onto the end of the buffer.
    fn encode(&mut self, rows: &[MatchResult]) -> Result<(), ExportError> {
        let with_header = !self.header_written;
        let mut w = WriterBuilder::new()
            .has_headers(false)
            .from_writer(&mut self.buf);
        if with_header {
            w.write_record(&self.header)?;
        }
        for row in rows {
            let flag = if row.matched { "1" } else { "0" };
            w.write_record(
                row.values
                    .iter()
                    .map(|v| v.as_text().unwrap_or(""))
                    .chain(std::iter::once(flag)),
            )?;
        }
        // csv keeps its own internal buffer; push it into `buf` before dropping
        w.flush().map_err(|source| ExportError::Io {
            path: self.path.clone(),
            source,
        })?;
        drop(w);
        self.header_written = true;
        Ok(())
    }

    /// Serialize one batch's rows into the buffer.
    pub fn write(&mut self, rows: &[MatchResult]) -> Result<(), ExportError> {
        self.encode(rows)?;
        self.stats.rows += rows.len();
        Ok(())
    }

    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// Flush when the buffer has grown past the threshold. Returns whether it flushed.
    pub fn flush_if_large(&mut self) -> Result<bool, ExportError> {
        if self.buffered_len() > self.flush_threshold {
            self.flush()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Append everything buffered to the sink, however small.
    pub fn flush(&mut self) -> Result<(), ExportError> {
        if self.buf.is_empty() {
            return Ok(());
        }
        if let Err(e) = self.sink.write_all(&self.buf) {
            return Err(self.io_err(e));
        }
        let written = self.buf.len();
        self.buf.clear();
        self.stats.bytes += written as u64;
        self.stats.flushes += 1;
        log::debug!(
            "flushed {} bytes to {} (flush #{})",
            written,
            self.path.display(),
            self.stats.flushes
        );
        Ok(())
    }

    /// Final flush. Writes the header even when no rows were produced.
    pub fn finish(mut self) -> Result<WriterStats, ExportError> {
        if !self.header_written {
            self.encode(&[])?;
        }
        self.flush()?;
        if let Err(e) = self.sink.sync_all() {
            return Err(self.io_err(e));
        }
        Ok(self.stats)
    }
}

/// One-row summary CSV with a header derived from `summary`'s fields.
pub fn export_summary_csv<T: Serialize>(summary: &T, path: &Path) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut w = WriterBuilder::new().from_writer(file);
    w.serialize(summary)?;
    w.flush().map_err(io_err)?;
    Ok(())
}
