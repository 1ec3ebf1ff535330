//! Dedicated Rayon thread pool for batch matching.
//!
//! Each worker task attaches the shared key segment once, matches and merges
//! every batch rayon hands it, then drops the attachment when the task ends.
//! Results come back in submission order regardless of which batch finishes
//! first.
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError};

use crate::corpus::{KeySegment, KeyView};
use crate::error::MatchError;
use crate::matching::algorithms::Scorer;
use crate::matching::merge::merge;
use crate::matching::{MatchOptions, match_batch};
use crate::models::{MatchResult, Record};
use crate::util::partition::QueryBatch;

pub const WORKERS_ENV: &str = "FUZZY_MERGE_WORKERS";

/// Get the optimal thread count for the matching pool
pub fn get_optimal_thread_count(requested: Option<usize>) -> usize {
    if let Some(n) = requested.filter(|n| *n > 0) {
        return n;
    }
    if let Ok(val) = std::env::var(WORKERS_ENV) {
        if let Ok(n) = val.parse::<usize>() {
            if n > 0 {
                log::info!("[Worker Pool] Using {} threads from {}", n, WORKERS_ENV);
                return n;
            }
        }
        log::warn!("[Worker Pool] Ignoring invalid {}={:?}", WORKERS_ENV, val);
    }

    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(8);

    // Reserve one core on high-core machines; otherwise use all cores
    let reserved = if cores > 16 { 1 } else { 0 };
    let threads = cores.saturating_sub(reserved).max(1);

    log::info!(
        "[Worker Pool] Using {} threads (total cores: {}, reserved: {})",
        threads,
        cores,
        reserved
    );
    threads
}

/// Read-only inputs shared by every batch of a run.
#[derive(Clone, Copy)]
pub struct BatchJob<'a> {
    pub references: &'a [Record],
    /// Reference column count, used for null-filled rows.
    pub reference_width: usize,
    pub scorer: &'a dyn Scorer,
    pub opts: MatchOptions,
}

/// Match and merge one batch against an attached key view.
pub fn process_batch(
    batch: &QueryBatch<'_>,
    view: &KeyView,
    job: &BatchJob<'_>,
) -> Result<Vec<MatchResult>, MatchError> {
    let keys = view.keys();
    let best = match_batch(batch.records, &keys, job.scorer, job.opts);
    batch
        .records
        .iter()
        .zip(best)
        .map(|(q, b)| {
            merge(
                q,
                b.accepted(job.opts.threshold),
                job.references,
                job.reference_width,
            )
        })
        .collect()
}

pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    pub fn new(threads: Option<usize>) -> Result<Self, ThreadPoolBuildError> {
        let num_threads = get_optimal_thread_count(threads);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("fuzzy-merge-{}", i))
            .build()?;
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Ordered parallel map of `process_batch` over `batches`. Borrowing the
    /// segment keeps it alive until every worker has returned. The first
    /// failing batch aborts the call.
    pub fn run_all(
        &self,
        batches: &[QueryBatch<'_>],
        segment: &KeySegment,
        job: &BatchJob<'_>,
    ) -> Result<Vec<Vec<MatchResult>>, MatchError> {
        let handle = segment.handle();
        self.pool.install(|| {
            batches
                .par_iter()
                .map_init(
                    || handle.attach(),
                    |view, batch| {
                        let out = match view {
                            Ok(view) => process_batch(batch, view, job),
                            Err(e) => Err(MatchError::Attach {
                                name: handle.name.clone(),
                                reason: e.to_string(),
                            }),
                        };
                        if let Err(e) = &out {
                            log::error!(
                                "batch {} (rows from {}) failed: {}",
                                batch.index,
                                batch.start,
                                e
                            );
                        }
                        out
                    },
                )
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::algorithms::Ratio;
    use crate::models::Value;
    use crate::util::partition::partition;
    use std::time::Duration;

    /// Exact-match scorer that stalls on early keys so later batches finish first.
    struct SlowEarly;
    impl Scorer for SlowEarly {
        fn score(&self, a: &str, b: &str) -> f64 {
            if a.starts_with("k0") {
                std::thread::sleep(Duration::from_millis(2));
            }
            if a == b { 100.0 } else { 0.0 }
        }
        fn name(&self) -> &'static str {
            "slow_early"
        }
    }

    fn records(keys: &[String]) -> Vec<Record> {
        keys.iter()
            .map(|k| Record::new(vec![Value::Text(k.clone())]))
            .collect()
    }

    fn opts() -> MatchOptions {
        MatchOptions {
            query_field: 0,
            threshold: 90.0,
        }
    }

    #[test]
    fn test_pool_creation() {
        let pool = WorkerPool::new(Some(3)).unwrap();
        assert_eq!(pool.threads(), 3);
        let name = pool
            .pool
            .install(|| std::thread::current().name().unwrap_or("").to_string());
        assert!(name.starts_with("fuzzy-merge-"));
    }

    #[test]
    fn results_follow_submission_order() {
        let dir = tempfile::tempdir().unwrap();
        let keys: Vec<String> = (0..40).map(|i| format!("k{:02}", i)).collect();
        let refs = records(&keys);
        let segment = KeySegment::publish(&keys, Some(dir.path())).unwrap();
        let queries = records(&keys);
        let batches = partition(&queries, 3);
        let job = BatchJob {
            references: &refs,
            reference_width: 1,
            scorer: &SlowEarly,
            opts: opts(),
        };
        let pool = WorkerPool::new(Some(4)).unwrap();
        let groups = pool.run_all(&batches, &segment, &job).unwrap();
        assert_eq!(groups.len(), batches.len());
        let rows: Vec<MatchResult> = groups.into_iter().flatten().collect();
        assert_eq!(rows.len(), keys.len());
        for (row, key) in rows.iter().zip(&keys) {
            assert!(row.matched);
            let expected = vec![Value::Text(key.clone()), Value::Text(key.clone())];
            assert_eq!(row.values, expected);
        }
        segment.release().unwrap();
    }

    #[test]
    fn one_view_serves_many_batches() {
        let dir = tempfile::tempdir().unwrap();
        let keys: Vec<String> = ["acme", "globex", "initech"].map(String::from).to_vec();
        let refs = records(&keys);
        let segment = KeySegment::publish(&keys, Some(dir.path())).unwrap();
        let view = segment.handle().attach().unwrap();
        let queries = records(&["initech".to_string(), "nobody".to_string()]);
        let job = BatchJob {
            references: &refs,
            reference_width: 1,
            scorer: &Ratio,
            opts: opts(),
        };
        for batch in partition(&queries, 1) {
            let rows = process_batch(&batch, &view, &job).unwrap();
            assert_eq!(rows.len(), 1);
        }
        let all = partition(&queries, 2);
        let rows = process_batch(&all[0], &view, &job).unwrap();
        let flags: Vec<u8> = rows.iter().map(MatchResult::flag).collect();
        assert_eq!(flags, [1, 0]);
        drop(view);
        segment.release().unwrap();
    }

    #[test]
    fn attach_failure_aborts_run() {
        let dir = tempfile::tempdir().unwrap();
        let keys = vec!["acme".to_string()];
        let segment = KeySegment::publish(&keys, Some(dir.path())).unwrap();
        std::fs::remove_file(&segment.handle().name).unwrap();
        let queries = records(&keys);
        let batches = partition(&queries, 1);
        let job = BatchJob {
            references: &[],
            reference_width: 1,
            scorer: &Ratio,
            opts: opts(),
        };
        let pool = WorkerPool::new(Some(2)).unwrap();
        let err = pool.run_all(&batches, &segment, &job).unwrap_err();
        assert!(matches!(err, MatchError::Attach { .. }), "{err}");
    }

    #[test]
    fn worker_error_aborts_run() {
        let dir = tempfile::tempdir().unwrap();
        let keys = vec!["acme".to_string()];
        let segment = KeySegment::publish(&keys, Some(dir.path())).unwrap();
        let queries = records(&keys);
        let batches = partition(&queries, 1);
        // reference table shorter than the key segment
        let job = BatchJob {
            references: &[],
            reference_width: 1,
            scorer: &Ratio,
            opts: opts(),
        };
        let pool = WorkerPool::new(Some(2)).unwrap();
        let err = pool.run_all(&batches, &segment, &job).unwrap_err();
        assert!(matches!(
            err,
            MatchError::ReferenceOutOfRange { index: 0, len: 0 }
        ));
    }

    #[test]
    fn explicit_thread_count_wins() {
        assert_eq!(get_optimal_thread_count(Some(5)), 5);
        assert!(get_optimal_thread_count(None) >= 1);
    }
}
