//! Path Traversal Prevention Tests
//!
//! Directory and file names come from untrusted containers. Extraction must
//! never write outside the destination, and a hostile entry must not stop
//! the safe entries from being extracted.

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use xen_rs::{ArchiveReader, ArchiveWriter, Container, XenError};

/// Helper: pack `entries` (directory, file) into `dir/hostile.xen`, each with a small payload
fn create_hostile_archive(dir: &Path, entries: &[(&str, &str)]) -> std::path::PathBuf {
    let payload = dir.join("payload.bin");
    fs::write(&payload, b"malicious").unwrap();

    let mut container = Container::new();
    container.add_file("safe", "ok.txt", &payload);
    for (directory, file) in entries {
        container.add_file(*directory, *file, &payload);
    }

    let archive = dir.join("hostile.xen");
    let mut writer = ArchiveWriter::create(&archive).unwrap();
    writer.write_container(&container).unwrap();
    writer.finalize().unwrap();
    archive
}

fn assert_unsafe_rejected(entries: &[(&str, &str)]) {
    let workspace = TempDir::new().unwrap();
    let archive = create_hostile_archive(workspace.path(), entries);
    let output = workspace.path().join("out").join("nested");

    let reader = ArchiveReader::open(&archive).unwrap();
    let report = reader.extract_all(&output).unwrap();

    assert_eq!(report.failures.len(), entries.len(), "{:?}", report.failures);
    for failure in &report.failures {
        assert!(
            matches!(failure.error, XenError::UnsafePath(_)),
            "unexpected error: {:?}",
            failure.error
        );
    }

    // The safe entry is still extracted
    assert_eq!(fs::read(output.join("safe").join("ok.txt")).unwrap(), b"malicious");
    assert_eq!(report.extracted.len(), 1);

    // Nothing escaped the destination
    for path in &report.extracted {
        assert!(path.starts_with(&output));
    }
    assert!(!workspace.path().join("out").join("escaped.txt").exists());
    assert!(!workspace.path().join("escaped.txt").exists());
}

#[test]
fn test_path_traversal_dot_dot_file() {
    println!("\n🔒 Testing file name with ../");
    assert_unsafe_rejected(&[
        ("sounds", "../escaped.txt"),
        ("sounds", "../../escaped.txt"),
    ]);
}

#[test]
fn test_path_traversal_dot_dot_directory() {
    println!("\n🔒 Testing directory name with ..");
    assert_unsafe_rejected(&[("..", "escaped.txt"), ("a/../..", "escaped.txt")]);
}

#[test]
fn test_absolute_path_unix() {
    println!("\n🔒 Testing absolute Unix paths");
    assert_unsafe_rejected(&[("/tmp", "escaped.txt"), ("sounds", "/escaped.txt")]);
}

#[test]
fn test_windows_style_paths() {
    println!("\n🔒 Testing Windows drive and UNC paths");
    assert_unsafe_rejected(&[
        ("C:\\Windows", "escaped.txt"),
        ("sounds", "..\\escaped.txt"),
        ("\\\\server\\share", "escaped.txt"),
        ("sounds", "c:escaped.txt"),
    ]);
}

#[test]
fn test_empty_file_name_rejected() {
    println!("\n🔒 Testing empty file name");
    assert_unsafe_rejected(&[("sounds", ""), ("sounds", "./")]);
}

#[test]
fn test_nested_relative_names_allowed() {
    println!("\n✅ Testing nested relative names");

    let workspace = TempDir::new().unwrap();
    let payload = workspace.path().join("payload.bin");
    fs::write(&payload, b"nested").unwrap();

    let mut container = Container::new();
    container.add_file("maps/level1", "tiles/ground.png", &payload);
    let archive = workspace.path().join("nested.xen");
    let mut writer = ArchiveWriter::create(&archive).unwrap();
    writer.write_container(&container).unwrap();
    writer.finalize().unwrap();

    let output = workspace.path().join("out");
    let reader = ArchiveReader::open(&archive).unwrap();
    let report = reader.extract_all(&output).unwrap();

    assert!(report.is_complete(), "{:?}", report.failures);
    let extracted = output
        .join("maps")
        .join("level1")
        .join("tiles")
        .join("ground.png");
    assert_eq!(fs::read(extracted).unwrap(), b"nested");
}
