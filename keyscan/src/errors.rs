//! This module defines the error types for keyscan.
//!
//! # Fatal vs contained errors
//!
//! Errors fall into two groups, and the split decides how far they travel:
//!
//! 1. **Run-level errors** abort the whole scan and reach the caller through
//!    `SearchResult`:
//!    ```rust,ignore
//!    match engine::search(&config) {
//!        Ok(report) => // Print report,
//!        Err(SearchError::DirectoryAccess { path, .. }) => // Bad input directory,
//!        Err(SearchError::WorkerFailed { worker, .. }) => // A worker died,
//!        Err(e) => // Anything else
//!    }
//!    ```
//!
//! 2. **Per-file errors** (`FileRead`, `Encoding`) never leave the worker that
//!    hit them. The scanner logs them, turns them into a `SkippedFile` entry and
//!    moves on to the next file of its slice.
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during a keyword scan
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Cannot read directory {path}: {source}")]
    DirectoryAccess {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid UTF-8 in file {path}: {source}")]
    Encoding {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
    #[error("Failed to start worker {worker}: {source}")]
    WorkerSpawn {
        worker: usize,
        source: std::io::Error,
    },
    #[error("Worker {worker} failed: {reason}")]
    WorkerFailed { worker: usize, reason: String },
    #[error("Invalid mode '{0}', expected 1 (threads) or 2 (processes)")]
    InvalidMode(String),
    #[error("Invalid keyword: {0}")]
    InvalidKeyword(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Worker protocol error: {0}")]
    Protocol(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SearchError {
    pub fn directory_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryAccess {
            path: path.into(),
            source,
        }
    }

    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    pub fn encoding_error(path: impl Into<PathBuf>, source: std::string::FromUtf8Error) -> Self {
        Self::Encoding {
            path: path.into(),
            source,
        }
    }

    pub fn worker_spawn(worker: usize, source: std::io::Error) -> Self {
        Self::WorkerSpawn { worker, source }
    }

    pub fn worker_failed(worker: usize, reason: impl Into<String>) -> Self {
        Self::WorkerFailed {
            worker,
            reason: reason.into(),
        }
    }

    pub fn invalid_mode(input: impl Into<String>) -> Self {
        Self::InvalidMode(input.into())
    }

    pub fn invalid_keyword(msg: impl Into<String>) -> Self {
        Self::InvalidKeyword(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Path of the file a per-file error refers to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::DirectoryAccess { path, .. }
            | Self::FileRead { path, .. }
            | Self::Encoding { path, .. } => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_creation() {
        let err = SearchError::directory_access("texts", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, SearchError::DirectoryAccess { .. }));
        assert_eq!(err.path(), Some(Path::new("texts")));

        let err = SearchError::file_read("a.txt", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, SearchError::FileRead { .. }));

        let err = SearchError::worker_failed(3, "panicked");
        assert!(matches!(err, SearchError::WorkerFailed { worker: 3, .. }));
        assert_eq!(err.path(), None);

        let err = SearchError::invalid_mode("7");
        assert!(matches!(err, SearchError::InvalidMode(_)));
    }

    #[test]
    fn test_error_messages() {
        let err = SearchError::invalid_mode("3");
        assert_eq!(
            err.to_string(),
            "Invalid mode '3', expected 1 (threads) or 2 (processes)"
        );

        let err = SearchError::worker_failed(1, "exited with status 101");
        assert_eq!(err.to_string(), "Worker 1 failed: exited with status 101");

        let err = SearchError::config_error("Missing required field");
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required field"
        );

        let bad = String::from_utf8(vec![0xff, 0xfe]).unwrap_err();
        let err = SearchError::encoding_error("b.txt", bad);
        assert!(err.to_string().starts_with("Invalid UTF-8 in file b.txt"));
    }
}
