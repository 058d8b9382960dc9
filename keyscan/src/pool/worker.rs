use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;
use tracing::debug;

use crate::config::EncodingMode;
use crate::errors::SearchResult;
use crate::results::KeywordSet;
use crate::search::scanner::KeywordScanner;

/// The job a process worker reads from its stdin.
///
/// The worker answers with one JSON [`PartialResult`](crate::results::PartialResult)
/// on stdout. Diagnostics go to stderr, never to stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub worker_id: usize,
    pub keywords: Vec<String>,
    #[serde(with = "crate::results::path_serde::list")]
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub encoding_mode: EncodingMode,
}

/// Runs one worker job: reads a request from `input`, scans its slice and
/// writes the partial result to `output`.
///
/// Per-file failures end up in the result's `skipped` list; only a malformed
/// request or a broken pipe is an error here.
pub fn serve_worker<R: Read, W: Write>(input: R, mut output: W) -> SearchResult<()> {
    let request: WorkerRequest = serde_json::from_reader(input)?;
    debug!(
        "Worker {} scanning {} files",
        request.worker_id,
        request.files.len()
    );

    let keywords = KeywordSet::new(request.keywords)?;
    let result = KeywordScanner::new(keywords, request.encoding_mode).scan(&request.files);

    serde_json::to_writer(&mut output, &result)?;
    output.flush()?;
    Ok(())
}
