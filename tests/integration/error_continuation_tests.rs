use dupehunter::diagnostics::SkipKind;
use dupehunter::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use dupehunter::progress::ProgressCallback;
use dupehunter::scanner::FileEntry;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    File::create(&path).unwrap().write_all(content).unwrap();
    path
}

/// Deletes a file as soon as hashing starts, after it was sized.
struct DeleteOnHashing {
    victim: Mutex<Option<PathBuf>>,
}

impl ProgressCallback for DeleteOnHashing {
    fn on_phase_start(&self, phase: &str, _total: usize) {
        if phase == "hashing" {
            if let Some(path) = self.victim.lock().unwrap().take() {
                fs::remove_file(path).unwrap();
            }
        }
    }

    fn on_progress(&self, _current: usize, _path: &str) {}

    fn on_phase_end(&self, _phase: &str) {}
}

#[test]
fn test_file_deleted_between_stat_and_hash() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.txt", b"survivor");
    write_file(dir.path(), "b.txt", b"survivor");
    let victim = write_file(dir.path(), "c.txt", b"survivor");
    write_file(dir.path(), "x.bin", b"pair");
    write_file(dir.path(), "y.bin", b"pair");

    let callback = Arc::new(DeleteOnHashing {
        victim: Mutex::new(Some(fs::canonicalize(&victim).unwrap())),
    });
    let config = FinderConfig::default().with_progress_callback(callback);
    let report = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.sets.len(), 2);
    assert!(report.sets.iter().all(|s| s.len() == 2));
    assert!(report
        .sets
        .iter()
        .all(|s| !s.files.iter().any(|p| p.ends_with("c.txt"))));

    assert_eq!(report.diagnostics.len(), 1);
    let skipped = report.diagnostics.iter().next().unwrap();
    assert_eq!(skipped.kind, SkipKind::Read);
    assert!(skipped.path.ends_with("c.txt"));
}

#[test]
fn test_from_files_continues_on_missing_files() {
    let finder = DuplicateFinder::with_defaults();
    let missing1 = FileEntry::new(PathBuf::from("nonexistent_1.txt"), 100);
    let missing2 = FileEntry::new(PathBuf::from("nonexistent_2.txt"), 100);

    let report = finder
        .find_duplicates_from_files(vec![missing1, missing2])
        .unwrap();

    assert!(report.sets.is_empty());
    assert_eq!(report.diagnostics.len(), 2);
    assert_eq!(report.diagnostics.count(SkipKind::Read), 2);
    for entry in &report.diagnostics {
        assert_eq!(entry.reason, "file not found");
    }
}

#[test]
fn test_invalid_root_missing() {
    let dir = tempdir().unwrap();

    let err = dupehunter::find_duplicates(&dir.path().join("nope")).unwrap_err();

    assert!(matches!(err, FinderError::PathNotFound(_)));
    assert!(err.is_invalid_root());
}

#[test]
fn test_invalid_root_is_a_file() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "plain.txt", b"data");

    let err = dupehunter::find_duplicates(&file).unwrap_err();

    assert!(matches!(err, FinderError::NotADirectory(_)));
}

#[test]
fn test_interrupted_scan() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a", b"x");
    write_file(dir.path(), "b", b"x");

    let config = FinderConfig::default().with_shutdown_flag(Arc::new(AtomicBool::new(true)));
    let result = DuplicateFinder::new(config).find_duplicates(dir.path());

    assert!(matches!(result, Err(FinderError::Interrupted)));
}

#[cfg(unix)]
#[test]
fn test_unreadable_subdirectory_is_reported_and_siblings_scanned() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.txt", b"sibling dup");
    let open = dir.path().join("open");
    fs::create_dir(&open).unwrap();
    write_file(&open, "b.txt", b"sibling dup");

    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    write_file(&locked, "hidden.txt", b"sibling dup");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores permission bits; nothing to observe then
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let report = dupehunter::find_duplicates(dir.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    let report = report.unwrap();

    assert_eq!(report.sets.len(), 1);
    assert_eq!(report.sets[0].len(), 2);
    assert_eq!(report.diagnostics.count(SkipKind::Traversal), 1);
    let skipped = report.diagnostics.iter().next().unwrap();
    assert!(skipped.path.ends_with("locked"));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_reported() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write_file(dir.path(), "a", b"same bytes");
    write_file(dir.path(), "b", b"same bytes");
    let secret = write_file(dir.path(), "c", b"same bytes");
    fs::set_permissions(&secret, fs::Permissions::from_mode(0o000)).unwrap();

    if File::open(&secret).is_ok() {
        return;
    }

    let report = dupehunter::find_duplicates(dir.path()).unwrap();

    assert_eq!(report.sets.len(), 1);
    assert_eq!(report.sets[0].len(), 2);
    assert_eq!(report.diagnostics.len(), 1);
    let skipped = report.diagnostics.iter().next().unwrap();
    assert_eq!(skipped.kind, SkipKind::Read);
    assert_eq!(skipped.reason, "permission denied");
}

#[cfg(unix)]
#[test]
fn test_fifo_is_a_stat_skip() {
    use std::process::Command;

    let dir = tempdir().unwrap();
    let fifo = dir.path().join("pipe");
    let made = Command::new("mkfifo").arg(&fifo).status();
    if !made.is_ok_and(|s| s.success()) {
        return;
    }

    let report = dupehunter::find_duplicates(dir.path()).unwrap();

    assert!(report.sets.is_empty());
    assert_eq!(report.diagnostics.count(SkipKind::Stat), 1);
}
