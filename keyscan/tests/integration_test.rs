use anyhow::Result;
use keyscan::pool::{ThreadPool, WorkerPool};
use keyscan::search::{search, search_with, KeywordScanner};
use keyscan::{EncodingMode, ScanMode, SearchConfig, SearchError};
use std::fs;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

fn create_test_files(dir: &TempDir, file_count: usize) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for i in 0..file_count {
        let path = dir.path().join(format!("test_{:03}.txt", i));
        let mut content = format!("Line in file {}\n", i);
        if i % 3 == 0 {
            content.push_str("TODO implement this\n");
        }
        if i % 7 == 0 {
            content.push_str("FIXME: This is a bug\n");
        }
        fs::write(&path, content)?;
        paths.push(path);
    }
    Ok(paths)
}

fn base_config(dir: &TempDir, workers: usize) -> SearchConfig {
    SearchConfig {
        root_path: dir.path().to_path_buf(),
        keywords: vec!["TODO".to_string(), "FIXME".to_string(), "XXX".to_string()],
        worker_count: NonZeroUsize::new(workers).unwrap(),
        mode: Some(ScanMode::Threads),
        ..SearchConfig::default()
    }
}

#[test]
fn test_reference_scenario() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("a.txt"), "the слово1 cat")?;
    fs::write(dir.path().join("b.txt"), "слово2 слово1")?;
    fs::write(dir.path().join("c.txt"), "nothing here")?;

    let config = SearchConfig {
        root_path: dir.path().to_path_buf(),
        mode: Some(ScanMode::Threads),
        ..SearchConfig::default()
    };
    let report = search(&config)?;

    let keywords: Vec<_> = report.result.hits.iter().map(|h| h.keyword.as_str()).collect();
    assert_eq!(keywords, vec!["слово1", "слово2", "слово3"]);
    assert_eq!(
        report.result.files_for("слово1").unwrap(),
        &[dir.path().join("a.txt"), dir.path().join("b.txt")]
    );
    assert_eq!(
        report.result.files_for("слово2").unwrap(),
        &[dir.path().join("b.txt")]
    );
    assert!(report.result.files_for("слово3").unwrap().is_empty());
    Ok(())
}

#[test]
fn test_empty_directory_yields_empty_lists() -> Result<()> {
    let dir = tempdir()?;
    let report = search(&base_config(&dir, 4))?;

    assert_eq!(report.result.hits.len(), 3);
    assert!(report.result.hits.iter().all(|h| h.files.is_empty()));
    assert_eq!(report.result.stats.files_scanned, 0);
    Ok(())
}

#[test]
fn test_non_matching_suffix_is_ignored() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("notes.md"), "TODO")?;
    fs::write(dir.path().join("notes.txt.bak"), "TODO")?;
    fs::create_dir(dir.path().join("nested"))?;
    fs::write(dir.path().join("nested").join("deep.txt"), "TODO")?;

    let report = search(&base_config(&dir, 2))?;
    assert!(report.result.files_for("TODO").unwrap().is_empty());
    Ok(())
}

#[test]
fn test_fewer_files_than_workers() -> Result<()> {
    let dir = tempdir()?;
    let files = create_test_files(&dir, 2)?;

    let report = search(&base_config(&dir, 8))?;
    assert_eq!(report.worker_count.get(), 8);
    assert_eq!(report.result.files_for("TODO").unwrap(), &files[..1]);
    assert_eq!(report.result.stats.files_scanned, 2);
    Ok(())
}

#[test]
fn test_every_worker_count_matches_sequential_scan() -> Result<()> {
    let dir = tempdir()?;
    let files = create_test_files(&dir, 41)?;
    let config = base_config(&dir, 1);
    let keywords = config.keyword_set()?;
    let sequential = KeywordScanner::new(keywords.clone(), EncodingMode::FailFast).scan(&files);

    for workers in 1..=9 {
        let pool = ThreadPool::new(NonZeroUsize::new(workers).unwrap(), EncodingMode::FailFast)?;
        let result = pool.run(&files, &keywords)?;
        assert_eq!(result.hits, sequential.hits, "{} workers", workers);
        assert_eq!(result.stats.files_scanned, 41);
    }
    Ok(())
}

#[test]
fn test_repeated_runs_are_identical() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, 25)?;
    let config = base_config(&dir, 4);
    let pool = ThreadPool::new(config.worker_count, config.encoding_mode)?;

    let first = search_with(&config, &pool)?;
    let second = search_with(&config, &pool)?;
    assert_eq!(first.result.hits, second.result.hits);
    assert_eq!(pool.metrics().get_stats().files_scanned, 50);
    Ok(())
}

#[test]
fn test_unreadable_files_are_skipped() -> Result<()> {
    let dir = tempdir()?;
    let files = create_test_files(&dir, 5)?;
    fs::write(dir.path().join("broken.txt"), b"TODO \xff\xfe")?;
    fs::create_dir(dir.path().join("folder.txt"))?;

    let report = search(&base_config(&dir, 3))?;

    assert_eq!(
        report.result.files_for("TODO").unwrap(),
        &[files[0].clone(), files[3].clone()]
    );
    let skipped: Vec<_> = report
        .result
        .skipped
        .iter()
        .map(|s| s.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(skipped, vec!["broken.txt", "folder.txt"]);
    assert_eq!(report.result.stats.files_skipped, 2);
    Ok(())
}

#[test]
fn test_lossy_mode_scans_invalid_utf8() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("broken.txt"), b"TODO \xff\xfe")?;

    let config = SearchConfig {
        encoding_mode: EncodingMode::Lossy,
        ..base_config(&dir, 2)
    };
    let report = search(&config)?;
    assert_eq!(
        report.result.files_for("TODO").unwrap(),
        &[dir.path().join("broken.txt")]
    );
    assert!(report.result.skipped.is_empty());
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_permission_denied_file_is_skipped() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir()?;
    let locked = dir.path().join("locked.txt");
    fs::write(&locked, "TODO")?;
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;
    if fs::read(&locked).is_ok() {
        // running as root
        return Ok(());
    }

    let report = search(&base_config(&dir, 2))?;
    assert!(report.result.files_for("TODO").unwrap().is_empty());
    assert_eq!(report.result.skipped.len(), 1);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644))?;
    Ok(())
}

#[test]
fn test_missing_root_aborts_the_run() -> Result<()> {
    let dir = tempdir()?;
    let config = SearchConfig {
        root_path: dir.path().join("texts"),
        ..base_config(&dir, 4)
    };

    let err = search(&config).unwrap_err();
    assert!(matches!(err, SearchError::DirectoryAccess { .. }));
    assert!(err.to_string().contains("texts"));
    Ok(())
}

#[test]
fn test_process_mode_without_worker_command_spawns_nothing() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, 4)?;
    let config = SearchConfig {
        mode: Some(ScanMode::Processes),
        ..base_config(&dir, 4)
    };

    let err = search(&config).unwrap_err();
    assert!(matches!(err, SearchError::ConfigError(_)));
    Ok(())
}

#[test]
fn test_report_is_timed() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, 10)?;

    let report = search(&base_config(&dir, 2))?;
    assert_eq!(report.mode, ScanMode::Threads);
    assert!(report.elapsed.as_secs_f64() >= 0.0);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_process_pool_failure_aborts_the_run() -> Result<()> {
    use keyscan::pool::WorkerCommand;
    use keyscan::search::build_pool;

    let dir = tempdir()?;
    create_test_files(&dir, 4)?;
    let config = base_config(&dir, 2);

    let command = WorkerCommand::new("sh").arg("-c").arg("cat > /dev/null; exit 1");
    let pool = build_pool(&config, ScanMode::Processes, Some(command))?;
    assert_eq!(pool.mode(), ScanMode::Processes);

    let err = search_with(&config, pool.as_ref()).unwrap_err();
    assert!(matches!(err, SearchError::WorkerFailed { .. }));
    Ok(())
}
