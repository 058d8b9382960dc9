//! This module implements the result types that flow from the workers to the
//! reporter.
//!
//! # Ownership along the pipeline
//!
//! 1. **KeywordSet** is built once per run and shared read-only by every worker.
//!    Cloning it only bumps a reference count:
//!    ```rust,ignore
//!    let keywords = KeywordSet::new(vec!["alpha".into(), "beta".into()])?;
//!    let for_worker = keywords.clone(); // same Arc<[String]>
//!    ```
//!
//! 2. **PartialResult** is owned by exactly one worker. A thread worker moves it
//!    into the merger; a process worker serializes it to stdout and the copy in
//!    the child simply goes away.
//!
//! 3. **FinalResult** is assembled by the merger from the partials in worker
//!    order and is the only value that survives to the reporter.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use crate::errors::{SearchError, SearchResult};
use crate::metrics::ScanStats;

/// Path encoding for the worker pipe.
///
/// A path that is valid UTF-8 travels as a JSON string. Anything else travels
/// as its raw bytes on Unix, so file names the OS accepts survive the trip to
/// a worker process and back unchanged.
pub(crate) mod path_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::path::{Path, PathBuf};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum WirePath {
        Text(String),
        Bytes(Vec<u8>),
    }

    impl From<&Path> for WirePath {
        fn from(path: &Path) -> Self {
            match path.to_str() {
                Some(text) => WirePath::Text(text.to_owned()),
                None => raw_bytes(path),
            }
        }
    }

    impl From<WirePath> for PathBuf {
        fn from(wire: WirePath) -> Self {
            match wire {
                WirePath::Text(text) => PathBuf::from(text),
                WirePath::Bytes(bytes) => from_raw_bytes(bytes),
            }
        }
    }

    #[cfg(unix)]
    fn raw_bytes(path: &Path) -> WirePath {
        use std::os::unix::ffi::OsStrExt;
        WirePath::Bytes(path.as_os_str().as_bytes().to_vec())
    }

    #[cfg(not(unix))]
    fn raw_bytes(path: &Path) -> WirePath {
        WirePath::Text(path.to_string_lossy().into_owned())
    }

    #[cfg(unix)]
    fn from_raw_bytes(bytes: Vec<u8>) -> PathBuf {
        use std::os::unix::ffi::OsStringExt;
        PathBuf::from(std::ffi::OsString::from_vec(bytes))
    }

    #[cfg(not(unix))]
    fn from_raw_bytes(bytes: Vec<u8>) -> PathBuf {
        PathBuf::from(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn serialize<S>(path: &Path, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        WirePath::from(path).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
    where
        D: Deserializer<'de>,
    {
        WirePath::deserialize(deserializer).map(PathBuf::from)
    }

    /// Same encoding for a list of paths
    pub mod list {
        use super::WirePath;
        use serde::{Deserialize, Deserializer, Serializer};
        use std::path::PathBuf;

        pub fn serialize<S>(paths: &[PathBuf], serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.collect_seq(paths.iter().map(|p| WirePath::from(p.as_path())))
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<PathBuf>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let paths = Vec::<WirePath>::deserialize(deserializer)?;
            Ok(paths.into_iter().map(PathBuf::from).collect())
        }
    }
}

/// Ordered, immutable set of keywords shared by every worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Arc<[String]>,
}

impl KeywordSet {
    /// Builds a keyword set, dropping duplicates while keeping first occurrences.
    ///
    /// Fails on an empty list or an empty keyword, since an empty substring
    /// matches every file.
    pub fn new(keywords: Vec<String>) -> SearchResult<Self> {
        if keywords.is_empty() {
            return Err(SearchError::invalid_keyword("no keywords given"));
        }

        let mut seen = HashSet::with_capacity(keywords.len());
        let mut unique = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            if keyword.is_empty() {
                return Err(SearchError::invalid_keyword("keywords must not be empty"));
            }
            if seen.insert(keyword.clone()) {
                unique.push(keyword);
            } else {
                warn!("Ignoring duplicate keyword '{}'", keyword);
            }
        }

        Ok(Self {
            keywords: unique.into(),
        })
    }
}

impl Deref for KeywordSet {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.keywords
    }
}

/// Files containing one keyword, in scan order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordHits {
    pub keyword: String,
    #[serde(with = "path_serde::list")]
    pub files: Vec<PathBuf>,
}

/// A file a worker could not read or decode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    #[serde(with = "path_serde")]
    pub path: PathBuf,
    pub reason: String,
}

/// What one worker found in its own slice
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialResult {
    /// One entry per keyword, in keyword-set order
    pub hits: Vec<KeywordHits>,
    /// Files that were skipped, in scan order
    pub skipped: Vec<SkippedFile>,
    /// Counters for this worker's slice
    pub stats: ScanStats,
}

impl PartialResult {
    /// Creates an empty result with one hit list per keyword
    pub fn new(keywords: &KeywordSet) -> Self {
        Self {
            hits: keywords
                .iter()
                .map(|keyword| KeywordHits {
                    keyword: keyword.clone(),
                    files: Vec::new(),
                })
                .collect(),
            skipped: Vec::new(),
            stats: ScanStats::default(),
        }
    }

    /// Files containing `keyword`, if it is part of the set
    pub fn files_for(&self, keyword: &str) -> Option<&[PathBuf]> {
        self.hits
            .iter()
            .find(|h| h.keyword == keyword)
            .map(|h| h.files.as_slice())
    }
}

/// The merged keyword to files mapping for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalResult {
    pub hits: Vec<KeywordHits>,
    pub skipped: Vec<SkippedFile>,
    pub stats: ScanStats,
}

impl FinalResult {
    /// Creates an empty result with one hit list per keyword
    pub fn new(keywords: &KeywordSet) -> Self {
        let PartialResult {
            hits,
            skipped,
            stats,
        } = PartialResult::new(keywords);
        Self {
            hits,
            skipped,
            stats,
        }
    }

    /// Appends a worker's partial result after everything merged so far.
    ///
    /// The partial must carry the same keywords in the same order.
    pub fn extend(&mut self, partial: PartialResult) -> Result<(), String> {
        if partial.hits.len() != self.hits.len() {
            return Err(format!(
                "expected {} keywords, got {}",
                self.hits.len(),
                partial.hits.len()
            ));
        }

        if let Some((merged, hits)) = self
            .hits
            .iter()
            .zip(&partial.hits)
            .find(|(merged, hits)| merged.keyword != hits.keyword)
        {
            return Err(format!(
                "expected keyword '{}', got '{}'",
                merged.keyword, hits.keyword
            ));
        }

        for (merged, hits) in self.hits.iter_mut().zip(partial.hits) {
            merged.files.extend(hits.files);
        }
        self.skipped.extend(partial.skipped);
        self.stats += partial.stats;
        Ok(())
    }

    /// Files containing `keyword`, if it is part of the set
    pub fn files_for(&self, keyword: &str) -> Option<&[PathBuf]> {
        self.hits
            .iter()
            .find(|h| h.keyword == keyword)
            .map(|h| h.files.as_slice())
    }

    /// Total number of keyword hits across all keywords
    pub fn total_hits(&self) -> usize {
        self.hits.iter().map(|h| h.files.len()).sum()
    }
}
