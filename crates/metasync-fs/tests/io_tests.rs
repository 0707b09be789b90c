use metasync_fs::io;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_write_atomic_creates_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("previous-export.json");

    io::write_atomic(&path, b"{\"records\":[]}").unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "{\"records\":[]}");
}

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("previous-export.json");
    fs::write(&path, "original").unwrap();

    io::write_atomic(&path, b"updated").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "updated");
}

#[test]
fn test_write_atomic_creates_parent_dirs() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("pairs").join("moh").join("scripts").join("a.jsonl");

    io::write_atomic(&path, b"line\n").unwrap();

    assert!(path.exists());
}

#[test]
fn test_write_atomic_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("capture.raw");

    io::write_atomic(&path, b"payload").unwrap();

    let leftovers: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temp files left behind: {:?}", leftovers);
}

#[test]
fn test_write_atomic_failure_keeps_previous_content() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("previous-export.json");
    fs::write(&path, "old snapshot").unwrap();

    // A directory squatting on the target name makes the final rename fail
    let blocked = temp.path().join("blocked");
    fs::create_dir_all(blocked.join("inner")).unwrap();
    assert!(io::write_atomic(&blocked, b"new").is_err());

    assert_eq!(fs::read_to_string(&path).unwrap(), "old snapshot");
    let leftovers = fs::read_dir(temp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn test_read_bytes_round_trips_binary() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("capture.raw");
    let payload = [0u8, 159, 146, 150, 255];

    io::write_atomic(&path, &payload).unwrap();

    assert_eq!(io::read_bytes(&path).unwrap(), payload);
}

#[test]
fn test_read_missing_file_reports_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("missing.json");

    let err = io::read_text(&path).unwrap_err();
    assert!(err.to_string().contains("missing.json"));
}
