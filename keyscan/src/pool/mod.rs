//! Worker pools that run one keyword scanner per slice of the file list.
//!
//! Both pools follow the same partition-scan-merge shape:
//! 1. split the file list into `worker_count` contiguous slices,
//! 2. scan every slice on its own worker with no shared state,
//! 3. hand each worker's partial result to a [`ResultMerger`](crate::merge::ResultMerger)
//!    and merge in worker order once every worker is done.
//!
//! They differ only in what a worker is and how its result travels back:
//! [`ThreadPool`] deposits into a mutex-guarded merger, [`ProcessPool`] sends
//! over a channel fed by one supervisor thread per child process.
use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::config::ScanMode;
use crate::errors::SearchResult;
use crate::results::{FinalResult, KeywordSet};

pub mod process;
pub mod threads;
pub mod worker;

pub use process::{ProcessPool, WorkerCommand};
pub use threads::ThreadPool;
pub use worker::{serve_worker, WorkerRequest};

/// A fixed-size set of workers scanning one file list
pub trait WorkerPool {
    /// Which execution mode this pool implements
    fn mode(&self) -> ScanMode;

    /// Number of workers, and therefore slices, per run
    fn worker_count(&self) -> NonZeroUsize;

    /// Scans `files` for `keywords` and returns the merged result.
    ///
    /// Blocks until every worker has finished. Any worker failure fails the run.
    fn run(&self, files: &[PathBuf], keywords: &KeywordSet) -> SearchResult<FinalResult>;
}
