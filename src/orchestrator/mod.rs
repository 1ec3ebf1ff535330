//! Orchestrator: wires loading, corpus publication, batching, the worker
//! pool and the streaming writer into one run.
//!
//! The shared key segment is released exactly once, after the pool has
//! returned, on both the success and the error path.

pub mod summary;

use anyhow::{Context, Result};
use log::{info, warn};
use std::time::Instant;

use crate::config::AppConfig;
use crate::corpus::{KeySegment, ReferenceCorpus};
use crate::export::csv_export::{CsvStreamWriter, WriterStats};
use crate::matching::MatchOptions;
use crate::matching::merge::merged_header;
use crate::matching::rayon_pool::{BatchJob, WorkerPool};
use crate::metrics::memory_stats_mb;
use crate::source::{DatasetRole, read_dataset, validate_match_field};
use crate::util::partition::{QueryBatch, partition};
use summary::RunSummary;

#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate {
    pub processed: usize,
    pub total: usize,
    pub percent: f32,
    pub eta_secs: u64,
    pub mem_used_mb: u64,
    pub mem_avail_mb: u64,
    pub stage: &'static str,
}

pub fn log_progress(u: ProgressUpdate) {
    info!(
        "[{}] {}/{} ({:.1}%) eta {}s, mem used {} MB / avail {} MB",
        u.stage,
        u.processed,
        u.total,
        u.percent,
        u.eta_secs,
        u.mem_used_mb,
        u.mem_avail_mb
    );
}

fn progress(
    stage: &'static str,
    processed: usize,
    total: usize,
    start: Instant,
) -> ProgressUpdate {
    let frac = if total == 0 {
        1.0
    } else {
        (processed as f32 / total as f32).clamp(0.0, 1.0)
    };
    let eta_secs = if frac > 0.0 {
        (start.elapsed().as_secs_f32() * (1.0 - frac) / frac) as u64
    } else {
        0
    };
    let mem = memory_stats_mb();
    ProgressUpdate {
        processed,
        total,
        percent: frac * 100.0,
        eta_secs,
        mem_used_mb: mem.used_mb,
        mem_avail_mb: mem.avail_mb,
        stage,
    }
}

struct DrainStats {
    matched: usize,
    writer: WriterStats,
}

/// Dispatch `batches` in windows of `window`, writing each window's result
/// groups in submission order before dispatching the next.
fn drain_batches<F>(
    pool: &WorkerPool,
    batches: &[QueryBatch<'_>],
    window: usize,
    segment: &KeySegment,
    job: &BatchJob<'_>,
    mut writer: CsvStreamWriter,
    on_progress: &F,
) -> Result<DrainStats>
where
    F: Fn(ProgressUpdate),
{
    let total: usize = batches.iter().map(QueryBatch::len).sum();
    let start = Instant::now();
    let mut processed = 0usize;
    let mut matched = 0usize;
    for chunk in batches.chunks(window.max(1)) {
        let first = chunk.first().map(|b| b.index).unwrap_or_default();
        let groups = pool
            .run_all(chunk, segment, job)
            .with_context(|| {
                format!("matching batches {}..{}", first, first + chunk.len())
            })?;
        for group in groups {
            processed += group.len();
            matched += group.iter().filter(|r| r.matched).count();
            writer.write(&group)?;
            writer.flush_if_large()?;
        }
        on_progress(progress("matching", processed, total, start));
    }
    let writer = writer.finish()?;
    Ok(DrainStats { matched, writer })
}

/// Run the whole merge described by `cfg`.
pub fn run<F>(cfg: &AppConfig, on_progress: F) -> Result<RunSummary>
where
    F: Fn(ProgressUpdate),
{
    cfg.validate()?;
    let started_utc = chrono::Utc::now();
    let t0 = Instant::now();
    let mem_start = memory_stats_mb();
    let input = &cfg.input;

    // fail on missing match columns before reading any rows
    validate_match_field(&input.query_path, DatasetRole::Query, &input.query_field)?;
    validate_match_field(
        &input.reference_path,
        DatasetRole::Reference,
        &input.reference_field,
    )?;

    let query = read_dataset(&input.query_path)?;
    let reference = read_dataset(&input.reference_path)?;
    let query_field = query
        .schema
        .require(DatasetRole::Query.as_str(), &input.query_field)?;
    let reference_rows = reference.len();
    info!(
        "Loaded {} query rows and {} reference rows in {:.2?}",
        query.len(),
        reference_rows,
        t0.elapsed()
    );

    let corpus = ReferenceCorpus::build(
        reference,
        &input.reference_field,
        cfg.matching.keep_normalized_key,
    )?;
    let key_width = corpus.max_key_width();
    let segment = corpus
        .publish(cfg.streaming.segment_dir.as_deref())
        .context("publishing reference keys")?;
    info!(
        "Published {} reference keys ({} bytes each) to {}",
        segment.handle().len,
        segment.handle().width,
        segment.handle().name.display()
    );

    let header = merged_header(&query.schema, corpus.schema());
    let scorer = cfg.matching.scorer.build();
    let job = BatchJob {
        references: corpus.records(),
        reference_width: corpus.schema().len(),
        scorer: scorer.as_ref(),
        opts: MatchOptions {
            query_field,
            threshold: cfg.matching.threshold,
        },
    };

    let outcome = WorkerPool::new(cfg.streaming.workers)
        .context("building worker pool")
        .and_then(|pool| {
            let batches = partition(&query.records, cfg.streaming.batch_size);
            let window = cfg.streaming.in_flight_batches.unwrap_or(pool.threads() * 4);
            info!(
                "Matching {} batches of up to {} rows on {} workers (window {})",
                batches.len(),
                cfg.streaming.batch_size,
                pool.threads(),
                window
            );
            let writer = CsvStreamWriter::create(
                &cfg.export.out_path,
                header,
                cfg.export.flush_threshold_bytes,
                cfg.export.append,
            )?;
            let stats = drain_batches(
                &pool,
                &batches,
                window,
                &segment,
                &job,
                writer,
                &on_progress,
            )?;
            Ok((stats, batches.len(), pool.threads()))
        });

    // the pool has returned on every path; no view can still be attached
    let released = segment.release();
    let (stats, batches, workers) = match outcome {
        Ok(v) => v,
        Err(e) => {
            if let Err(re) = released {
                warn!("{}", re);
            }
            return Err(e);
        }
    };
    released.context("releasing reference key segment")?;

    let mem_end = memory_stats_mb();
    let summary = RunSummary {
        query_path: input.query_path.display().to_string(),
        reference_path: input.reference_path.display().to_string(),
        out_path: cfg.export.out_path.display().to_string(),
        query_rows: query.len(),
        reference_rows,
        matched: stats.matched,
        unmatched: stats.writer.rows - stats.matched,
        batches,
        batch_size: cfg.streaming.batch_size,
        workers,
        scorer: cfg.matching.scorer.as_str(),
        threshold: cfg.matching.threshold,
        bytes_written: stats.writer.bytes,
        flushes: stats.writer.flushes,
        key_width,
        mem_used_start_mb: mem_start.used_mb,
        mem_used_end_mb: mem_end.used_mb,
        started_utc,
        ended_utc: chrono::Utc::now(),
        elapsed_secs: t0.elapsed().as_secs_f64(),
    };
    if let Some(path) = &cfg.export.summary_path {
        summary
            .write_csv(path)
            .with_context(|| format!("writing summary to {}", path.display()))?;
    }
    Ok(summary)
}
