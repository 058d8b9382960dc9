use std::ffi::OsString;
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use tracing::{debug, info};

use super::worker::WorkerRequest;
use super::WorkerPool;
use crate::config::{EncodingMode, ScanMode};
use crate::errors::{SearchError, SearchResult};
use crate::merge::ResultMerger;
use crate::partition::{partition, split_slices};
use crate::results::{FinalResult, KeywordSet, PartialResult};

/// Program and arguments that start one process worker.
///
/// The program must speak the worker protocol: a JSON `WorkerRequest` on
/// stdin, a JSON `PartialResult` on stdout, exit status 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// The running executable invoked with the `worker` subcommand
    pub fn current_exe() -> SearchResult<Self> {
        Ok(Self::new(std::env::current_exe()?).arg("worker"))
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

/// Isolated-memory pool: one child process per slice.
///
/// Each child is supervised by a scoped thread that sends the child's outcome
/// over an mpsc channel. The driver receives exactly one message per worker.
#[derive(Debug, Clone)]
pub struct ProcessPool {
    command: WorkerCommand,
    workers: NonZeroUsize,
    encoding_mode: EncodingMode,
}

impl ProcessPool {
    pub fn new(command: WorkerCommand, workers: NonZeroUsize, encoding_mode: EncodingMode) -> Self {
        Self {
            command,
            workers,
            encoding_mode,
        }
    }
}

impl WorkerPool for ProcessPool {
    fn mode(&self) -> ScanMode {
        ScanMode::Processes
    }

    fn worker_count(&self) -> NonZeroUsize {
        self.workers
    }

    fn run(&self, files: &[PathBuf], keywords: &KeywordSet) -> SearchResult<FinalResult> {
        let ranges = partition(files.len(), self.workers);
        debug!("Process slices: {:?}", ranges);

        let mut merger = ResultMerger::new(keywords.clone(), ranges.len());
        let (tx, rx) = mpsc::channel::<(usize, SearchResult<PartialResult>)>();

        thread::scope(|s| {
            for (worker, slice) in split_slices(files, &ranges).into_iter().enumerate() {
                let tx = tx.clone();
                let command = &self.command;
                let request = WorkerRequest {
                    worker_id: worker,
                    keywords: keywords.to_vec(),
                    files: slice.to_vec(),
                    encoding_mode: self.encoding_mode,
                };

                thread::Builder::new()
                    .name(format!("keyscan-supervisor-{}", worker))
                    .spawn_scoped(s, move || {
                        let outcome = run_child(command, &request);
                        // The receiver outlives every supervisor
                        let _ = tx.send((worker, outcome));
                    })
                    .map_err(|e| SearchError::worker_spawn(worker, e))?;
            }
            drop(tx);

            for _ in 0..ranges.len() {
                let (worker, outcome) = rx.recv().map_err(|_| {
                    SearchError::worker_failed(merger.reported(), "supervisor exited without reporting")
                })?;
                match outcome {
                    Ok(partial) => merger.submit(worker, partial)?,
                    Err(e) => merger.fail(worker, e)?,
                }
            }
            Ok::<(), SearchError>(())
        })?;

        let result = merger.finish()?;
        info!(
            "Process pool finished: {} workers, {} files",
            self.workers,
            files.len()
        );
        result.stats.log();
        Ok(result)
    }
}

/// Starts one worker process, feeds it its request and parses its answer
fn run_child(command: &WorkerCommand, request: &WorkerRequest) -> SearchResult<PartialResult> {
    let worker = request.worker_id;
    let mut child = command
        .command()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| SearchError::worker_spawn(worker, e))?;
    debug!(
        "Started worker {} as pid {} with {} files",
        worker,
        child.id(),
        request.files.len()
    );

    // A child that dies before reading its stdin shows up as a broken pipe
    // here; its exit status below is the more useful error.
    let sent = match child.stdin.take() {
        Some(mut stdin) => serde_json::to_writer(&mut stdin, request)
            .map_err(SearchError::from)
            .and_then(|()| stdin.flush().map_err(SearchError::from)),
        None => Err(SearchError::worker_failed(worker, "missing stdin pipe")),
    };

    let output = child.wait_with_output()?;
    if !output.status.success() {
        return Err(SearchError::worker_failed(
            worker,
            format!("exited with {}", output.status),
        ));
    }
    sent?;

    serde_json::from_slice(&output.stdout)
        .map_err(|e| SearchError::worker_failed(worker, format!("invalid response: {}", e)))
}
