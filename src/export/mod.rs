pub mod csv_export;

pub use csv_export::{
    CsvStreamWriter, DEFAULT_FLUSH_THRESHOLD_BYTES, WriterStats, export_summary_csv,
};
