//! In-memory container model

use crate::archive::format::{EncryptionMethod, Mode, FORMAT_VERSION};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Files of one directory, keyed by file name
pub type Directory = BTreeMap<String, FileRecord>;

/// Where the bytes of a packaged file live
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileRecord {
    /// Not yet packaged; the serializer copies the file at `path`
    OnDisk { path: PathBuf },
    /// Already inside a container stream at `offset`, `size` bytes long
    Embedded { offset: u64, size: u64 },
}

impl FileRecord {
    pub fn on_disk(path: impl Into<PathBuf>) -> Self {
        FileRecord::OnDisk { path: path.into() }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, FileRecord::Embedded { .. })
    }

    /// Payload size, known only once embedded
    pub fn size(&self) -> Option<u64> {
        match self {
            FileRecord::Embedded { size, .. } => Some(*size),
            FileRecord::OnDisk { .. } => None,
        }
    }

    /// Absolute payload offset in the source stream, known only once embedded
    pub fn offset(&self) -> Option<u64> {
        match self {
            FileRecord::Embedded { offset, .. } => Some(*offset),
            FileRecord::OnDisk { .. } => None,
        }
    }
}

/// Full in-memory model of one archive: header fields, tags, lists and
/// a two-level directory -> file name -> [`FileRecord`] mapping.
///
/// All keys are unique; inserting an existing key replaces the old value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Container {
    mode: Mode,
    version: u64,
    encryption: EncryptionMethod,
    tags: BTreeMap<String, String>,
    lists: BTreeMap<String, Vec<i64>>,
    directories: BTreeMap<String, Directory>,
    #[serde(skip)]
    origin: Option<PathBuf>,
}

impl Container {
    /// An empty simple container at the current format version
    pub fn new() -> Self {
        Self {
            mode: Mode::Simple,
            version: FORMAT_VERSION,
            encryption: EncryptionMethod::None,
            tags: BTreeMap::new(),
            lists: BTreeMap::new(),
            directories: BTreeMap::new(),
            origin: None,
        }
    }

    /// Return every field to the state of [`Container::new`]
    pub fn reset(&mut self) {
        self.mode = Mode::Simple;
        self.version = FORMAT_VERSION;
        self.encryption = EncryptionMethod::None;
        self.tags.clear();
        self.lists.clear();
        self.directories.clear();
        self.origin = None;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    pub fn encryption(&self) -> EncryptionMethod {
        self.encryption
    }

    pub fn set_encryption(&mut self, encryption: EncryptionMethod) {
        self.encryption = encryption;
    }

    /// Encryption value as written to the stream (zero unless encryption-capable)
    pub fn effective_encryption(&self) -> EncryptionMethod {
        match self.mode {
            Mode::Simple => EncryptionMethod::None,
            Mode::EncryptionCapable => self.encryption,
        }
    }

    /// Archive this container was read from, if any
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    pub fn set_origin(&mut self, origin: impl Into<PathBuf>) {
        self.origin = Some(origin.into());
    }

    // Tags

    /// Set a tag, returning the value it replaced
    pub fn set_tag(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.tags.insert(name.into(), value.into())
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    // Lists

    /// Set a named list, returning the list it replaced
    pub fn set_list(&mut self, name: impl Into<String>, values: Vec<i64>) -> Option<Vec<i64>> {
        self.lists.insert(name.into(), values)
    }

    pub fn list(&self, name: &str) -> Option<&[i64]> {
        self.lists.get(name).map(Vec::as_slice)
    }

    pub fn lists(&self) -> &BTreeMap<String, Vec<i64>> {
        &self.lists
    }

    // Directories and files

    /// Get or create a directory
    pub fn add_directory(&mut self, name: impl Into<String>) -> &mut Directory {
        self.directories.entry(name.into()).or_default()
    }

    /// Register a file on disk under `directory/file`, creating the directory if needed
    pub fn add_file(
        &mut self,
        directory: impl Into<String>,
        file: impl Into<String>,
        source: impl Into<PathBuf>,
    ) -> Option<FileRecord> {
        self.insert_record(directory, file, FileRecord::on_disk(source))
    }

    /// Insert a record, returning the one it replaced
    pub fn insert_record(
        &mut self,
        directory: impl Into<String>,
        file: impl Into<String>,
        record: FileRecord,
    ) -> Option<FileRecord> {
        self.add_directory(directory).insert(file.into(), record)
    }

    /// Remove a file from the model (the serialized stream is never touched)
    pub fn remove_file(&mut self, directory: &str, file: &str) -> Option<FileRecord> {
        self.directories.get_mut(directory)?.remove(file)
    }

    pub fn directory(&self, name: &str) -> Option<&Directory> {
        self.directories.get(name)
    }

    pub fn file(&self, directory: &str, file: &str) -> Option<&FileRecord> {
        self.directories.get(directory)?.get(file)
    }

    pub fn contains_file(&self, directory: &str, file: &str) -> bool {
        self.file(directory, file).is_some()
    }

    pub fn directories(&self) -> &BTreeMap<String, Directory> {
        &self.directories
    }

    /// Iterate over every (directory, file, record) triple in stream order
    pub fn files(&self) -> impl Iterator<Item = (&str, &str, &FileRecord)> {
        self.directories.iter().flat_map(|(dir, files)| {
            files
                .iter()
                .map(move |(name, record)| (dir.as_str(), name.as_str(), record))
        })
    }

    pub fn file_count(&self) -> usize {
        self.directories.values().map(BTreeMap::len).sum()
    }

    /// Sum of all known payload sizes
    pub fn embedded_size(&self) -> u64 {
        self.files().filter_map(|(_, _, record)| record.size()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.lists.is_empty() && self.directories.is_empty()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}
