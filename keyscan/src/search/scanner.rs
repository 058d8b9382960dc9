use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

use crate::config::EncodingMode;
use crate::errors::{SearchError, SearchResult};
use crate::metrics::{ScanMetrics, ScanStats};
use crate::results::{KeywordSet, PartialResult, SkippedFile};

/// Decodes file bytes according to the encoding mode
fn decode_bytes<'a>(
    bytes: &'a [u8],
    path: &Path,
    encoding_mode: EncodingMode,
) -> SearchResult<Cow<'a, str>> {
    match encoding_mode {
        EncodingMode::FailFast => match std::str::from_utf8(bytes) {
            Ok(valid) => Ok(Cow::Borrowed(valid)),
            // Only the error path pays for the copy into a FromUtf8Error
            Err(_) => String::from_utf8(bytes.to_vec())
                .map(Cow::Owned)
                .map_err(|e| SearchError::encoding_error(path, e)),
        },
        EncodingMode::Lossy => {
            let text = String::from_utf8_lossy(bytes);
            if let Cow::Owned(_) = text {
                warn!("Invalid UTF-8 replaced in file: {}", path.display());
            }
            Ok(text)
        }
    }
}

/// Searches one slice of files for every keyword of a set
#[derive(Debug, Clone)]
pub struct KeywordScanner {
    keywords: KeywordSet,
    encoding_mode: EncodingMode,
    metrics: ScanMetrics,
}

impl KeywordScanner {
    /// Creates a scanner with its own metrics
    pub fn new(keywords: KeywordSet, encoding_mode: EncodingMode) -> Self {
        Self::with_metrics(keywords, encoding_mode, ScanMetrics::new())
    }

    /// Creates a scanner that records into shared metrics
    pub fn with_metrics(
        keywords: KeywordSet,
        encoding_mode: EncodingMode,
        metrics: ScanMetrics,
    ) -> Self {
        Self {
            keywords,
            encoding_mode,
            metrics,
        }
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    /// Reads a whole file and returns the keywords (by index) it contains
    pub fn scan_file(&self, path: &Path) -> SearchResult<(Vec<usize>, u64)> {
        trace!("Scanning file: {}", path.display());

        let bytes = std::fs::read(path).map_err(|e| SearchError::file_read(path, e))?;
        let content = decode_bytes(&bytes, path, self.encoding_mode)?;

        let found = self
            .keywords
            .iter()
            .enumerate()
            .filter(|(_, keyword)| content.contains(keyword.as_str()))
            .map(|(i, _)| i)
            .collect();

        Ok((found, bytes.len() as u64))
    }

    /// Scans every file of a slice.
    ///
    /// Files that cannot be read or decoded are logged and listed in
    /// `skipped`; they never stop the rest of the slice.
    pub fn scan(&self, files: &[PathBuf]) -> PartialResult {
        let mut result = PartialResult::new(&self.keywords);
        let mut stats = ScanStats::default();

        for path in files {
            match self.scan_file(path) {
                Ok((found, bytes)) => {
                    for index in found {
                        result.hits[index].files.push(path.clone());
                    }
                    self.metrics.record_file_scanned(bytes);
                    stats.files_scanned += 1;
                    stats.bytes_read += bytes;
                }
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    self.metrics.record_file_skipped();
                    stats.files_skipped += 1;
                    result.skipped.push(SkippedFile {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(
            "Scanned {} files, skipped {}",
            stats.files_scanned, stats.files_skipped
        );
        result.stats = stats;
        result
    }
}
