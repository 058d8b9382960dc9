use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::errors::{SearchError, SearchResult};

/// Checks if a directory entry name ends with the configured suffix.
///
/// This is a plain, case-sensitive suffix test on the name, so `".txt"` does
/// not match `notes.TXT` and an empty suffix matches everything.
pub fn has_suffix(name: &str, suffix: &str) -> bool {
    name.ends_with(suffix)
}

/// Lists the entries of `dir` whose name ends with `suffix`.
///
/// The listing is not recursive. Returned paths are `dir` joined with the
/// entry name. With `sort` unset the order is whatever the directory listing
/// yields, which is platform dependent.
///
/// Names that are not valid Unicode are compared lossily.
pub fn list_files(dir: &Path, suffix: &str, sort: bool) -> SearchResult<Vec<PathBuf>> {
    debug!("Listing '*{}' in {}", suffix, dir.display());

    let entries = fs::read_dir(dir).map_err(|e| SearchError::directory_access(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SearchError::directory_access(dir, e))?;
        let name = entry.file_name();
        if has_suffix(&name.to_string_lossy(), suffix) {
            trace!("Adding file: {}", entry.path().display());
            files.push(dir.join(name));
        }
    }

    if sort {
        files.sort();
    }

    debug!("Found {} files in {}", files.len(), dir.display());
    Ok(files)
}
