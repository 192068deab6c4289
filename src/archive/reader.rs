use crate::archive::container::{Container, Directory, FileRecord};
use crate::archive::extract::{ExtractionReport, Extractor};
use crate::archive::format::{EncryptionMethod, Mode, MAGIC_SIZE};
use crate::error::{Result, XenError};
use crate::vlq;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Rebuild a container from `source`.
///
/// File payloads are not read: each file is recorded as its absolute offset
/// and size in `source`, and the stream is seeked past it. On any error no
/// container is returned.
pub fn deserialize<R: Read + Seek>(source: R) -> Result<Container> {
    let mut source = ContainerSource::new(source)?;
    let mut container = Container::new();

    // Header
    container.set_mode(source.read_magic()?);
    container.set_version(source.read_vlq()?);
    container.set_encryption(EncryptionMethod::from_u64(source.read_vlq()?));

    // Tags
    let tag_count = source.read_count("tag")?;
    for _ in 0..tag_count {
        let name = source.read_text("tag name")?;
        let value = source.read_text("tag value")?;
        container.set_tag(name, value);
    }

    // Lists
    let list_count = source.read_count("list")?;
    for _ in 0..list_count {
        let name = source.read_text("list name")?;
        let element_count = source.read_count("list element")?;

        let mut values = Vec::with_capacity(element_count as usize);
        for _ in 0..element_count {
            // Two's-complement bit pattern at 64 bits
            values.push(source.read_vlq()? as i64);
        }
        container.set_list(name, values);
    }

    // Directories
    let dir_count = source.read_count("directory")?;
    for _ in 0..dir_count {
        let dir_name = source.read_text("directory name")?;
        let file_count = source.read_count("file")?;

        let mut files = Directory::new();
        for _ in 0..file_count {
            let file_name = source.read_text("file name")?;
            let size = source.read_vlq()?;
            let offset = source.skip_payload(size, &file_name)?;

            debug!(directory = %dir_name, file = %file_name, offset, size, "indexed file");
            files.insert(file_name, FileRecord::Embedded { offset, size });
        }
        container.add_directory(dir_name).extend(files);
    }

    Ok(container)
}

/// Position-tracking view of the source stream
struct ContainerSource<R> {
    inner: R,
    position: u64,
    len: u64,
}

impl<R: Read + Seek> ContainerSource<R> {
    fn new(mut inner: R) -> Result<Self> {
        let position = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(position))?;
        Ok(Self {
            inner,
            position,
            len,
        })
    }

    fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.position)
    }

    fn read_magic(&mut self) -> Result<Mode> {
        let mut magic = [0u8; MAGIC_SIZE];
        self.read_exact(&mut magic).map_err(end_of_stream)?;
        Mode::from_magic(magic)
    }

    fn read_vlq(&mut self) -> Result<u64> {
        vlq::read_vlq(&mut *self)
    }

    /// Read an entry count. Every entry costs at least one byte, so a count
    /// larger than what is left cannot be honest.
    fn read_count(&mut self, what: &str) -> Result<u64> {
        let count = self.read_vlq()?;
        if count > self.remaining() {
            return Err(XenError::CorruptContainer(format!(
                "{} count {} exceeds the {} bytes remaining at offset {}",
                what,
                count,
                self.remaining(),
                self.position
            )));
        }
        Ok(count)
    }

    /// Length-prefixed UTF-8 text
    fn read_text(&mut self, what: &str) -> Result<String> {
        let len = self.read_vlq()?;
        if len > self.remaining() {
            return Err(XenError::CorruptContainer(format!(
                "{} length {} exceeds the {} bytes remaining at offset {}",
                what,
                len,
                self.remaining(),
                self.position
            )));
        }

        let mut bytes = vec![0u8; len as usize];
        self.read_exact(&mut bytes).map_err(end_of_stream)?;
        String::from_utf8(bytes)
            .map_err(|e| XenError::CorruptContainer(format!("{} is not valid UTF-8: {}", what, e)))
    }

    /// Seek past a payload of `size` bytes, returning the offset it starts at
    fn skip_payload(&mut self, size: u64, file_name: &str) -> Result<u64> {
        let offset = self.position;
        if size > self.remaining() {
            return Err(XenError::CorruptContainer(format!(
                "payload of {} ({} bytes at offset {}) runs past the end of the stream ({} bytes)",
                file_name, size, offset, self.len
            )));
        }

        self.position = self.inner.seek(SeekFrom::Start(offset + size))?;
        Ok(offset)
    }
}

impl<R: Read> Read for ContainerSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

fn end_of_stream(err: io::Error) -> XenError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        XenError::UnexpectedEndOfStream
    } else {
        XenError::Io(err)
    }
}

/// Container file opened from disk.
///
/// Opening indexes the whole container but reads no payloads; those are
/// fetched on demand from the archive path.
pub struct ArchiveReader {
    path: PathBuf,
    container: Container,
}

impl ArchiveReader {
    /// Open and index a container file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;

        let mut container = deserialize(BufReader::new(file))?;
        container.set_origin(&path);

        info!(
            path = %path.display(),
            mode = %container.mode(),
            version = container.version(),
            files = container.file_count(),
            "container opened"
        );

        Ok(Self { path, container })
    }

    /// Path of the underlying archive
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Take the indexed model, e.g. to modify and repack it
    pub fn into_container(self) -> Container {
        self.container
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.container.tag(name)
    }

    pub fn list(&self, name: &str) -> Option<&[i64]> {
        self.container.list(name)
    }

    /// Get number of files in the archive
    pub fn entry_count(&self) -> usize {
        self.container.file_count()
    }

    /// List all (directory, file) pairs in the archive
    pub fn list_files(&self) -> Vec<(String, String)> {
        self.container
            .files()
            .map(|(dir, file, _)| (dir.to_string(), file.to_string()))
            .collect()
    }

    /// Check if a file exists in the archive
    pub fn contains(&self, directory: &str, file: &str) -> bool {
        self.container.contains_file(directory, file)
    }

    /// Look up a directory, failing with [`XenError::DirectoryNotFound`]
    pub fn directory(&self, directory: &str) -> Result<&Directory> {
        self.container
            .directory(directory)
            .ok_or_else(|| XenError::DirectoryNotFound(directory.to_string()))
    }

    /// Look up a file record, failing with a not-found error
    pub fn get_entry(&self, directory: &str, file: &str) -> Result<&FileRecord> {
        self.directory(directory)?
            .get(file)
            .ok_or_else(|| XenError::FileNotFound {
                directory: directory.to_string(),
                file: file.to_string(),
            })
    }

    /// Stream one file's payload without loading it into memory
    pub fn open_entry(&self, directory: &str, file: &str) -> Result<io::Take<File>> {
        let (offset, size) = match self.get_entry(directory, file)? {
            FileRecord::Embedded { offset, size } => (*offset, *size),
            FileRecord::OnDisk { .. } => {
                return Err(XenError::NotEmbedded {
                    directory: directory.to_string(),
                    file: file.to_string(),
                })
            }
        };

        let mut archive =
            File::open(&self.path).map_err(|source| XenError::ExtractionSourceUnavailable {
                path: self.path.clone(),
                source,
            })?;
        archive.seek(SeekFrom::Start(offset))?;
        Ok(archive.take(size))
    }

    /// Read a file from the archive
    pub fn read_file(&self, directory: &str, file: &str) -> Result<Vec<u8>> {
        let size = self.get_entry(directory, file)?.size().unwrap_or(0);
        let mut entry = self.open_entry(directory, file)?;

        let mut data = Vec::with_capacity(size as usize);
        entry.read_to_end(&mut data)?;
        if data.len() as u64 != size {
            return Err(XenError::UnexpectedEndOfStream);
        }
        Ok(data)
    }

    /// Extract every file under `destination`, recreating the directory layout
    pub fn extract_all<P: AsRef<Path>>(&self, destination: P) -> Result<ExtractionReport> {
        Extractor::new(&self.path).extract_all(&self.container, destination)
    }
}
