use dupehunter::duplicates::{DuplicateFinder, FinderConfig};
use dupehunter::progress::ProgressCallback;
use dupehunter::scanner::WalkerConfig;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    File::create(&path).unwrap().write_all(content).unwrap();
    path
}

fn names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

/// Counts files reported during the hashing phase.
#[derive(Default)]
struct HashingCounter {
    phase: Mutex<String>,
    hashed: Mutex<Vec<String>>,
}

impl ProgressCallback for HashingCounter {
    fn on_phase_start(&self, phase: &str, _total: usize) {
        *self.phase.lock().unwrap() = phase.to_string();
    }

    fn on_progress(&self, _current: usize, path: &str) {
        if *self.phase.lock().unwrap() == "hashing" {
            self.hashed.lock().unwrap().push(path.to_string());
        }
    }

    fn on_phase_end(&self, _phase: &str) {
        self.phase.lock().unwrap().clear();
    }
}

#[test]
fn test_scan_hello_world_scenario() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.txt", b"hello");
    write_file(dir.path(), "b.txt", b"hello");
    write_file(dir.path(), "c.txt", b"world");
    write_file(dir.path(), "d.txt", b"hello world");

    let report = dupehunter::find_duplicates(dir.path()).unwrap();

    assert_eq!(report.sets.len(), 1);
    assert_eq!(names(&report.sets[0].files), vec!["a.txt", "b.txt"]);
    assert_eq!(report.sets[0].size, 5);
    assert!(report.diagnostics.is_empty());
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();

    let report = dupehunter::find_duplicates(dir.path()).unwrap();

    assert!(report.sets.is_empty());
    assert!(report.diagnostics.is_empty());
    assert_eq!(report.summary.total_files, 0);
}

#[test]
fn test_scan_single_file_is_never_hashed() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "only.txt", b"lonely content");

    let report = dupehunter::find_duplicates(dir.path()).unwrap();

    assert!(report.sets.is_empty());
    assert!(report.diagnostics.is_empty());
    assert_eq!(report.summary.total_files, 1);
    assert_eq!(report.summary.files_hashed, 0);
}

#[test]
fn test_same_size_different_content_never_grouped() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "x.bin", b"aaaa");
    write_file(dir.path(), "y.bin", b"bbbb");
    write_file(dir.path(), "z.bin", b"cccc");

    let report = dupehunter::find_duplicates(dir.path()).unwrap();

    assert!(report.sets.is_empty());
    assert_eq!(report.summary.files_hashed, 3);
}

#[test]
fn test_unique_sizes_are_never_read() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "dup1", b"same!");
    write_file(dir.path(), "dup2", b"same!");
    write_file(dir.path(), "small", b"x");
    write_file(dir.path(), "large", &[7u8; 10_000]);

    let counter = Arc::new(HashingCounter::default());
    let config = FinderConfig::default().with_progress_callback(counter.clone());
    let report = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.sets.len(), 1);
    let hashed = counter.hashed.lock().unwrap();
    assert_eq!(hashed.len(), 2);
    assert!(hashed.iter().all(|p| p.ends_with("dup1") || p.ends_with("dup2")));
    assert_eq!(report.summary.eliminated_by_size, 2);
}

#[test]
fn test_scan_is_idempotent() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    for i in 0..5 {
        write_file(dir.path(), &format!("top{i}"), format!("content {}", i % 2).as_bytes());
        write_file(&sub, &format!("nested{i}"), format!("content {}", i % 2).as_bytes());
    }

    let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(8));
    let first = finder.find_duplicates(dir.path()).unwrap();
    let second = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(first.sets, second.sets);
    assert_eq!(first.sets.len(), 2);
    assert_eq!(first.sets[0].len() + first.sets[1].len(), 10);
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    let deep = dir.path().join("a").join("b").join("c");
    fs::create_dir_all(&deep).unwrap();
    write_file(dir.path(), "root.txt", b"nested duplicate");
    write_file(&deep, "deep.txt", b"nested duplicate");

    let report = dupehunter::find_duplicates(dir.path()).unwrap();

    assert_eq!(report.sets.len(), 1);
    assert!(report.sets[0].files.iter().any(|p| p.ends_with("a/b/c/deep.txt")));
}

#[test]
fn test_three_way_duplicate_accounting() {
    let dir = tempdir().unwrap();
    for name in ["one", "two", "three"] {
        write_file(dir.path(), name, &[1u8; 1000]);
    }

    let report = dupehunter::find_duplicates(dir.path()).unwrap();

    assert_eq!(report.sets.len(), 1);
    assert_eq!(report.sets[0].len(), 3);
    assert_eq!(report.summary.duplicate_files, 2);
    assert_eq!(report.summary.reclaimable_space, 2000);
}

#[test]
fn test_scan_with_ignore_patterns() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "keep1.txt", b"twin");
    write_file(dir.path(), "keep2.txt", b"twin");
    write_file(dir.path(), "skip.tmp", b"twin");

    let walker_config = WalkerConfig::default().with_patterns(vec!["*.tmp".to_string()]);
    let config = FinderConfig::default().with_walker_config(walker_config);
    let report = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.sets.len(), 1);
    assert_eq!(names(&report.sets[0].files), vec!["keep1.txt", "keep2.txt"]);
}

#[test]
fn test_scan_with_size_filters() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "small1", b"ab");
    write_file(dir.path(), "small2", b"ab");
    write_file(dir.path(), "big1", &[0u8; 4096]);
    write_file(dir.path(), "big2", &[0u8; 4096]);

    let walker_config = WalkerConfig::default().with_min_size(Some(100));
    let config = FinderConfig::default().with_walker_config(walker_config);
    let report = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.sets.len(), 1);
    assert_eq!(report.sets[0].size, 4096);
    assert_eq!(report.summary.total_files, 2);
}

#[test]
fn test_empty_files_optional() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("empty1")).unwrap();
    File::create(dir.path().join("empty2")).unwrap();

    let report = dupehunter::find_duplicates(dir.path()).unwrap();
    assert!(report.sets.is_empty());
    assert!(report.diagnostics.is_empty());
    assert_eq!(report.summary.empty_files_skipped, 2);

    let walker_config = WalkerConfig::default().with_include_empty(true);
    let config = FinderConfig::default().with_walker_config(walker_config);
    let report = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.sets.len(), 1);
    assert_eq!(report.sets[0].size, 0);
    assert_eq!(report.summary.empty_files_skipped, 0);
}

#[test]
fn test_scan_with_verification() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a", &[3u8; 20_000]);
    write_file(dir.path(), "b", &[3u8; 20_000]);
    write_file(dir.path(), "c", b"other");

    let config = FinderConfig::default().with_verify(true);
    let report = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.sets.len(), 1);
    assert_eq!(names(&report.sets[0].files), vec!["a", "b"]);
    assert!(report.summary.verified);
}

#[test]
fn test_set_order_follows_first_seen_size() {
    let dir = tempdir().unwrap();
    // Sorted traversal visits "a_*" first, so size 3 comes before size 1
    write_file(dir.path(), "a_big1", b"xyz");
    write_file(dir.path(), "b_small1", b"q");
    write_file(dir.path(), "c_big2", b"xyz");
    write_file(dir.path(), "d_small2", b"q");

    let report = dupehunter::find_duplicates(dir.path()).unwrap();

    let sizes: Vec<u64> = report.sets.iter().map(|s| s.size).collect();
    assert_eq!(sizes, vec![3, 1]);
}
