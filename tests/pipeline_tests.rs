//! Pipeline tests against the library API

use hashcheck::Output;
use hashcheck::audit::{AuditMap, AuditStore};
use hashcheck::config::Config;
use hashcheck::parallel::{Pipeline, RunSummary};
use hashcheck::processor::FileResult;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Create `count` files with distinct content, returning their paths
fn create_files(dir: &Path, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let path = dir.join(format!("file_{i}.txt"));
            fs::write(&path, format!("content of file {i}\n")).unwrap();
            path.to_string_lossy().into_owned()
        })
        .collect()
}

fn run(config: &Config, audit: Option<&AuditMap>, files: Vec<String>) -> (RunSummary, Vec<FileResult>) {
    let output = Output::new(true);
    let mut buffer = Vec::new();
    let summary = Pipeline::new(config, audit, &output)
        .run(files, &mut buffer)
        .unwrap();

    let results = String::from_utf8(buffer)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    (summary, results)
}

fn sorted(mut results: Vec<FileResult>) -> Vec<FileResult> {
    results.sort_by(|a, b| a.filename.cmp(&b.filename));
    results
}

#[test]
fn test_ten_files_four_workers() {
    let temp_dir = TempDir::new().unwrap();
    let files = create_files(temp_dir.path(), 10);
    let config = Config {
        workers: 4,
        ..Config::with_command("true")
    };

    let (summary, results) = run(&config, None, files.clone());

    assert_eq!(results.len(), 10);
    assert_eq!(summary.total, 10);
    assert_eq!(summary.processed, 10);
    assert_eq!(summary.emitted, 10);
    assert_eq!(summary.errored, 0);
    assert_eq!(summary.workers, 4);

    let names: HashSet<_> = results.iter().map(|r| r.filename.clone()).collect();
    assert_eq!(names, files.into_iter().collect::<HashSet<_>>());
}

#[test]
fn test_result_count_independent_of_worker_count() {
    let temp_dir = TempDir::new().unwrap();
    let files = create_files(temp_dir.path(), 7);

    for workers in [1, 2, 7, 32] {
        let config = Config {
            workers,
            ..Config::default()
        };
        let (summary, results) = run(&config, None, files.clone());
        assert_eq!(results.len(), 7, "workers = {workers}");
        assert_eq!(summary.workers, workers.min(7));
    }
}

#[test]
fn test_failed_files_are_counted_not_emitted() {
    let temp_dir = TempDir::new().unwrap();
    let mut files = create_files(temp_dir.path(), 3);
    files.push(temp_dir.path().join("missing.txt").to_string_lossy().into_owned());
    let config = Config::with_command("true");

    let (summary, results) = run(&config, None, files);

    assert_eq!(results.len(), 3);
    assert_eq!(summary.processed, 4);
    assert_eq!(summary.errored, 1);
    assert_eq!(summary.emitted, 3);
}

#[test]
fn test_repeat_runs_are_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let files = create_files(temp_dir.path(), 5);

    // Baseline built from a first run
    let (_, baseline) = run(&Config::default(), None, files.clone());
    let audit: AuditMap = baseline
        .iter()
        .map(|r| (r.filename.clone(), r.hash.clone()))
        .collect();

    let config = Config {
        audit: true,
        hashes_file: Some(temp_dir.path().join("hashes.jsonl")),
        ..Config::with_command("exit 9")
    };
    let (first_summary, first) = run(&config, Some(&audit), files.clone());
    let (_, second) = run(&config, Some(&audit), files);

    assert_eq!(sorted(first.clone()), sorted(second));
    assert_eq!(first_summary.changed, 0);
    assert!(first.iter().all(|r| r.audited && !r.changed && r.exit_code == 0));
}

#[test]
fn test_audit_changed_file_runs_command() {
    let temp_dir = TempDir::new().unwrap();
    let file_a = temp_dir.path().join("file_a.txt");
    fs::write(&file_a, "new content").unwrap();
    let marker = temp_dir.path().join("ran.log");

    let mut audit = AuditMap::new();
    audit.insert(file_a.to_string_lossy().into_owned(), "stale".to_string());

    let config = Config {
        audit: true,
        ..Config::with_command(format!(
            "echo modified && echo ran >> '{}' #",
            marker.display()
        ))
    };
    let (summary, results) = run(&config, Some(&audit), vec![file_a.to_string_lossy().into_owned()]);

    assert_eq!(results.len(), 1);
    assert!(results[0].audited);
    assert!(results[0].changed);
    assert_eq!(results[0].exit_code, 0);
    assert_eq!(summary.changed, 1);
    assert_eq!(fs::read_to_string(&marker).unwrap(), "ran\n");
}

#[test]
fn test_audit_unchanged_file_skips_command() {
    let temp_dir = TempDir::new().unwrap();
    let files = create_files(temp_dir.path(), 1);
    let marker = temp_dir.path().join("ran.log");

    let (_, baseline) = run(&Config::default(), None, files.clone());
    let audit: AuditMap = baseline
        .into_iter()
        .map(|r| (r.filename, r.hash))
        .collect();

    let config = Config {
        audit: true,
        ..Config::with_command(format!("echo ran >> '{}' #", marker.display()))
    };
    let (summary, results) = run(&config, Some(&audit), files);

    assert_eq!(results.len(), 1);
    assert!(results[0].audited);
    assert!(!results[0].changed);
    assert_eq!(results[0].exit_code, 0);
    assert_eq!(summary.changed, 0);
    assert!(!marker.exists());
}

#[test]
fn test_changed_counted_even_when_filtered() {
    let temp_dir = TempDir::new().unwrap();
    let files = create_files(temp_dir.path(), 2);
    let audit: AuditMap = files
        .iter()
        .map(|f| (f.clone(), "stale".to_string()))
        .collect();

    let config = Config {
        audit: true,
        ..Config::with_command("exit 3").with_exit_codes([0], [1])
    };
    let (summary, results) = run(&config, Some(&audit), files);

    assert!(results.is_empty());
    assert_eq!(summary.changed, 2);
    assert_eq!(summary.errored, 0);
}

#[test]
fn test_update_stages_only_successful_results() {
    let temp_dir = TempDir::new().unwrap();
    let pass = temp_dir.path().join("pass.txt");
    let fail = temp_dir.path().join("fail.txt");
    fs::write(&pass, "pass\n").unwrap();
    fs::write(&fail, "nope\n").unwrap();
    let hashes = temp_dir.path().join("hashes.jsonl");

    let config = Config {
        update: true,
        hashes_file: Some(hashes.clone()),
        ..Config::with_command("grep -q pass")
    };
    let files = vec![
        pass.to_string_lossy().into_owned(),
        fail.to_string_lossy().into_owned(),
    ];
    let (summary, results) = run(&config, None, files);

    assert_eq!(results.len(), 2);
    assert_eq!(summary.staged, 1);

    let store = AuditStore::new(&hashes);
    let staged = fs::read_to_string(store.staging_path()).unwrap();
    assert!(staged.contains("pass.txt"));
    assert!(!staged.contains("fail.txt"));

    store.merge().unwrap();
    let merged = store.load().unwrap();
    assert_eq!(merged.len(), 1);
    assert!(merged.contains_key(&*pass.to_string_lossy()));
    assert!(!store.staging_path().exists());
}

#[test]
fn test_filtering_keeps_listed_codes_only() {
    let temp_dir = TempDir::new().unwrap();
    let files = create_files(temp_dir.path(), 4);

    // Odd-numbered files exit 1, even-numbered exit 2
    let command = "case $FILE in *[13].txt) exit 1;; *) exit 2;; esac";
    let config = Config::with_command(command).with_exit_codes([0], [1]);
    let (summary, results) = run(&config, None, files);

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.exit_code == 1));
    assert_eq!(summary.processed, 4);
    assert_eq!(summary.emitted, 2);
}

#[test]
fn test_no_filtering_keeps_every_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    let files = create_files(temp_dir.path(), 4);

    let command = "case $FILE in *[13].txt) exit 1;; *) exit 2;; esac";
    let (_, results) = run(&Config::with_command(command), None, files);

    assert_eq!(results.len(), 4);
}
