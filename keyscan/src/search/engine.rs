use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::{ScanMode, SearchConfig};
use crate::errors::{SearchError, SearchResult};
use crate::files::list_files;
use crate::pool::{ProcessPool, ThreadPool, WorkerCommand, WorkerPool};
use crate::results::{FinalResult, KeywordSet};

/// Everything the reporter needs about one finished run
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub mode: ScanMode,
    pub worker_count: NonZeroUsize,
    pub keywords: KeywordSet,
    pub result: FinalResult,
    pub elapsed: Duration,
}

/// Builds the pool for `mode`.
///
/// Process mode needs an explicit `worker_command` that speaks the worker
/// protocol; without one it is a configuration error.
pub fn build_pool(
    config: &SearchConfig,
    mode: ScanMode,
    worker_command: Option<WorkerCommand>,
) -> SearchResult<Box<dyn WorkerPool>> {
    debug!("Building {} pool with {} workers", mode, config.worker_count);
    match mode {
        ScanMode::Threads => Ok(Box::new(ThreadPool::new(
            config.worker_count,
            config.encoding_mode,
        )?)),
        ScanMode::Processes => {
            let command = worker_command
                .ok_or_else(|| SearchError::config_error("process mode needs a worker command"))?;
            Ok(Box::new(ProcessPool::new(
                command,
                config.worker_count,
                config.encoding_mode,
            )))
        }
    }
}

/// Runs a scan in the configured mode.
///
/// Only thread mode works without a worker command; process mode goes
/// through [`build_pool`] and [`search_since`].
pub fn search(config: &SearchConfig) -> SearchResult<ScanReport> {
    let start = Instant::now();
    let mode = config
        .mode
        .ok_or_else(|| SearchError::config_error("no scan mode selected"))?;
    let pool = build_pool(config, mode, None)?;
    search_since(config, pool.as_ref(), start)
}

/// Runs a scan on an already built pool, timing from now
pub fn search_with(config: &SearchConfig, pool: &dyn WorkerPool) -> SearchResult<ScanReport> {
    search_since(config, pool, Instant::now())
}

/// Runs a scan on an already built pool.
///
/// Enumerates the directory, lets the pool partition, scan and merge. The
/// reported time runs from `start`, so callers that build the pool first can
/// include its startup.
pub fn search_since(
    config: &SearchConfig,
    pool: &dyn WorkerPool,
    start: Instant,
) -> SearchResult<ScanReport> {
    let keywords = config.keyword_set()?;
    info!(
        "Starting {} scan of {} for {:?}",
        pool.mode(),
        config.root_path.display(),
        &*keywords
    );

    let files = list_files(&config.root_path, &config.file_suffix, config.sort_files)?;
    debug!("Found {} files to scan", files.len());

    let result = pool.run(&files, &keywords)?;
    let elapsed = start.elapsed();

    info!(
        "Scan complete. {} hits across {} keywords in {:?}",
        result.total_hits(),
        keywords.len(),
        elapsed
    );

    Ok(ScanReport {
        mode: pool.mode(),
        worker_count: pool.worker_count(),
        keywords,
        result,
        elapsed,
    })
}
