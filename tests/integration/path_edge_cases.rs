use std::fs::{self, File};
use std::io::Write;
use tempfile::tempdir;

#[test]
fn test_paths_with_quotes_and_spaces() {
    let dir = tempdir().unwrap();

    // Windows does not allow double quotes in filenames.
    let odd_name = if cfg!(windows) {
        "file with spaces.txt"
    } else {
        "file with \"quotes\" and spaces.txt"
    };
    File::create(dir.path().join(odd_name))
        .unwrap()
        .write_all(b"content")
        .unwrap();
    File::create(dir.path().join("duplicate.txt"))
        .unwrap()
        .write_all(b"content")
        .unwrap();

    let report = dupehunter::find_duplicates(dir.path()).unwrap();

    assert_eq!(report.sets.len(), 1);
    assert!(report.sets[0].files.iter().any(|p| p.ends_with(odd_name)));
}

#[cfg(unix)]
#[test]
fn test_paths_with_newlines() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("file_with\nnewline.txt"))
        .unwrap()
        .write_all(b"content")
        .unwrap();
    File::create(dir.path().join("duplicate.txt"))
        .unwrap()
        .write_all(b"content")
        .unwrap();

    let report = dupehunter::find_duplicates(dir.path()).unwrap();

    assert_eq!(report.sets.len(), 1);
    assert!(report.sets[0]
        .files
        .iter()
        .any(|p| p.to_string_lossy().contains('\n')));
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_file_name() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempdir().unwrap();
    let raw = OsStr::from_bytes(b"caf\xe9.bin");
    File::create(dir.path().join(raw))
        .unwrap()
        .write_all(b"latin-1 name")
        .unwrap();
    File::create(dir.path().join("plain.bin"))
        .unwrap()
        .write_all(b"latin-1 name")
        .unwrap();

    let report = dupehunter::find_duplicates(dir.path()).unwrap();

    assert_eq!(report.sets.len(), 1);
    assert!(report.sets[0]
        .files
        .iter()
        .any(|p| p.file_name() == Some(raw)));
}

#[test]
fn test_extremely_long_paths() {
    let dir = tempdir().unwrap();

    let mut current_path = dir.path().to_path_buf();
    let folder_name = "a".repeat(50);

    // 6 levels of 50-char folders pushes past 260 characters
    for i in 0..6 {
        current_path = current_path.join(format!("{i}_{folder_name}"));
        if let Err(e) = fs::create_dir(&current_path) {
            eprintln!("Skipping extremely long path test: failed to create dir: {e}");
            return;
        }
    }

    let file_path = current_path.join("file.txt");
    if let Err(e) = File::create(&file_path).and_then(|mut f| f.write_all(b"content")) {
        eprintln!("Skipping extremely long path test: failed to create file: {e}");
        return;
    }
    File::create(dir.path().join("duplicate.txt"))
        .unwrap()
        .write_all(b"content")
        .unwrap();

    let report = dupehunter::find_duplicates(dir.path()).unwrap();

    assert_eq!(report.sets.len(), 1);
}

#[test]
fn test_unicode_names() {
    let dir = tempdir().unwrap();
    for name in ["café.txt", "日本語.txt", "emoji_🦀.txt"] {
        File::create(dir.path().join(name))
            .unwrap()
            .write_all(b"unicode")
            .unwrap();
    }

    let report = dupehunter::find_duplicates(dir.path()).unwrap();

    assert_eq!(report.sets.len(), 1);
    assert_eq!(report.sets[0].len(), 3);
}
