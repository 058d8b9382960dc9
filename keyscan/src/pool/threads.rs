use std::any::Any;
use std::io;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

use super::WorkerPool;
use crate::config::{EncodingMode, ScanMode};
use crate::errors::{SearchError, SearchResult};
use crate::merge::ResultMerger;
use crate::metrics::ScanMetrics;
use crate::partition::{partition, split_slices};
use crate::results::{FinalResult, KeywordSet, PartialResult};
use crate::search::scanner::KeywordScanner;

/// Shared-memory pool: one rayon thread per slice.
///
/// Scanning happens without any synchronization. Each worker takes the merger
/// lock exactly once, to deposit its finished partial result.
pub struct ThreadPool {
    pool: rayon::ThreadPool,
    workers: NonZeroUsize,
    encoding_mode: EncodingMode,
    metrics: ScanMetrics,
}

impl ThreadPool {
    pub fn new(workers: NonZeroUsize, encoding_mode: EncodingMode) -> SearchResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.get())
            .thread_name(|i| format!("keyscan-worker-{}", i))
            .build()
            .map_err(|e| SearchError::worker_spawn(0, io::Error::other(e)))?;

        Ok(Self {
            pool,
            workers,
            encoding_mode,
            metrics: ScanMetrics::new(),
        })
    }

    /// Counters accumulated by every run of this pool
    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    fn run_with<F>(
        &self,
        files: &[PathBuf],
        keywords: &KeywordSet,
        scan: F,
    ) -> SearchResult<FinalResult>
    where
        F: Fn(&KeywordScanner, &[PathBuf]) -> PartialResult + Sync,
    {
        let ranges = partition(files.len(), self.workers);
        debug!("Thread slices: {:?}", ranges);

        let merger = Mutex::new(ResultMerger::new(keywords.clone(), ranges.len()));
        let scan = &scan;

        self.pool.scope(|s| {
            for (worker, slice) in split_slices(files, &ranges).into_iter().enumerate() {
                let merger = &merger;
                let scanner = KeywordScanner::with_metrics(
                    keywords.clone(),
                    self.encoding_mode,
                    self.metrics.clone(),
                );

                s.spawn(move |_| {
                    debug!("Worker {} scanning {} files", worker, slice.len());
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| scan(&scanner, slice)));

                    let mut merger = merger.lock().unwrap_or_else(PoisonError::into_inner);
                    let reported = match outcome {
                        Ok(partial) => merger.submit(worker, partial),
                        Err(payload) => merger.fail(
                            worker,
                            SearchError::worker_failed(worker, panic_message(payload.as_ref())),
                        ),
                    };
                    if let Err(e) = reported {
                        debug!("Dropping report from worker {}: {}", worker, e);
                    }
                });
            }
        });

        let merger = merger.into_inner().unwrap_or_else(PoisonError::into_inner);
        let result = merger.finish()?;

        info!(
            "Thread pool finished: {} workers, {} files",
            self.workers,
            files.len()
        );
        self.metrics.log_stats();
        Ok(result)
    }
}

impl WorkerPool for ThreadPool {
    fn mode(&self) -> ScanMode {
        ScanMode::Threads
    }

    fn worker_count(&self) -> NonZeroUsize {
        self.workers
    }

    fn run(&self, files: &[PathBuf], keywords: &KeywordSet) -> SearchResult<FinalResult> {
        self.run_with(files, keywords, |scanner, slice| scanner.scan(slice))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::tempdir;

    fn keywords(words: &[&str]) -> KeywordSet {
        KeywordSet::new(words.iter().map(|w| w.to_string()).collect()).unwrap()
    }

    fn pool(workers: usize) -> ThreadPool {
        ThreadPool::new(NonZeroUsize::new(workers).unwrap(), EncodingMode::FailFast).unwrap()
    }

    fn write_files(dir: &std::path::Path, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = dir.join(format!("f{:03}.txt", i));
                let mut content = format!("file {}", i);
                if i % 2 == 0 {
                    content.push_str(" even");
                }
                if i % 3 == 0 {
                    content.push_str(" fizz");
                }
                fs::write(&path, content).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_matches_sequential_scan_in_order() {
        let dir = tempdir().unwrap();
        let files = write_files(dir.path(), 37);
        let set = keywords(&["even", "fizz", "absent"]);

        let sequential = KeywordScanner::new(set.clone(), EncodingMode::FailFast).scan(&files);
        let parallel = pool(4).run(&files, &set).unwrap();

        assert_eq!(parallel.hits, sequential.hits);
        assert_eq!(parallel.stats.files_scanned, 37);
    }

    #[test]
    fn test_pool_reports_its_shape() {
        let pool = pool(3);
        assert_eq!(pool.mode(), ScanMode::Threads);
        assert_eq!(pool.worker_count().get(), 3);
        assert_eq!(pool.pool.current_num_threads(), 3);
    }

    #[test]
    fn test_no_files() {
        let result = pool(4).run(&[], &keywords(&["a", "b"])).unwrap();
        assert_eq!(result.hits.len(), 2);
        assert!(result.hits.iter().all(|h| h.files.is_empty()));
    }

    #[test]
    fn test_fewer_files_than_workers() {
        let dir = tempdir().unwrap();
        let files = write_files(dir.path(), 2);

        let result = pool(4).run(&files, &keywords(&["file"])).unwrap();
        let found: BTreeSet<_> = result.files_for("file").unwrap().iter().cloned().collect();
        assert_eq!(found, files.into_iter().collect());
    }

    #[test]
    fn test_metrics_are_shared_across_workers() {
        let dir = tempdir().unwrap();
        let files = write_files(dir.path(), 9);

        let pool = pool(3);
        pool.run(&files, &keywords(&["file"])).unwrap();
        assert_eq!(pool.metrics().get_stats().files_scanned, 9);
    }

    #[test]
    fn test_panicking_worker_fails_the_run() {
        let dir = tempdir().unwrap();
        let files = write_files(dir.path(), 8);

        let result = pool(4).run_with(&files, &keywords(&["file"]), |scanner, slice| {
            if slice.first().is_some_and(|p| p.ends_with("f004.txt")) {
                panic!("disk on fire");
            }
            scanner.scan(slice)
        });

        let err = result.unwrap_err();
        assert!(matches!(err, SearchError::WorkerFailed { worker: 2, .. }));
        assert!(err.to_string().contains("disk on fire"));
    }
}
