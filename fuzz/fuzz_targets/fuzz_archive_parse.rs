#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::{Cursor, Write};
use tempfile::{NamedTempFile, TempDir};
use xen_rs::{deserialize, ArchiveReader};

fuzz_target!(|data: &[u8]| {
    // In-memory parse - should never panic
    let container = match deserialize(Cursor::new(data)) {
        Ok(c) => c,
        Err(_) => return, // Expected for invalid data
    };

    // Every indexed payload lies inside the input
    for (_, _, record) in container.files() {
        if let (Some(offset), Some(size)) = (record.offset(), record.size()) {
            assert!(offset + size <= data.len() as u64);
        }
    }

    // Same bytes through the file-backed reader
    let mut temp_file = match NamedTempFile::new() {
        Ok(f) => f,
        Err(_) => return,
    };
    if temp_file.write_all(data).is_err() || temp_file.flush().is_err() {
        return;
    }

    let reader = match ArchiveReader::open(temp_file.path()) {
        Ok(r) => r,
        Err(_) => return,
    };

    for (dir, file) in reader.list_files() {
        let _ = reader.read_file(&dir, &file);
    }

    let _ = reader.entry_count();
    let _ = reader.contains("", "");
    let _ = reader.contains("..", "passwd");

    // Hostile names must be rejected, never written outside the destination
    if let Ok(output) = TempDir::new() {
        let _ = reader.extract_all(output.path().join("out"));
    }
});
