use crate::archive::container::{Container, FileRecord};
use crate::error::{Result, XenError};
use crate::vlq;
use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Serialize a container into `sink`, returning the number of bytes written.
///
/// Payloads are read from each file's source path (or, for embedded records,
/// from the container's origin archive) at write time. Any unreadable source
/// aborts the whole call; bytes already handed to `sink` are not rolled back.
pub fn serialize<W: Write>(container: &Container, sink: W) -> Result<u64> {
    let mut writer = ArchiveWriter::new(sink);
    writer.write_container(container)?;
    let written = writer.bytes_written();
    writer.finalize()?;
    Ok(written)
}

/// Streaming container writer
pub struct ArchiveWriter<W: Write> {
    writer: W,
    current_offset: u64,
}

impl ArchiveWriter<BufWriter<File>> {
    /// Create (or truncate) a container file on disk
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> ArchiveWriter<W> {
    /// Wrap an append-only byte sink
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            current_offset: 0,
        }
    }

    /// Bytes emitted so far
    pub fn bytes_written(&self) -> u64 {
        self.current_offset
    }

    /// Write a complete container: header, tags, lists, then directories
    pub fn write_container(&mut self, container: &Container) -> Result<()> {
        self.write_header(container)?;
        self.write_tags(container)?;
        self.write_lists(container)?;
        self.write_directories(container)?;

        info!(
            tags = container.tags().len(),
            lists = container.lists().len(),
            files = container.file_count(),
            bytes = self.current_offset,
            "container serialized"
        );
        Ok(())
    }

    /// Flush and hand back the underlying sink
    pub fn finalize(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_header(&mut self, container: &Container) -> Result<()> {
        self.write_raw(&container.mode().magic())?;
        self.write_vlq(container.version())?;
        self.write_vlq(container.effective_encryption().as_u64())?;
        Ok(())
    }

    fn write_tags(&mut self, container: &Container) -> Result<()> {
        self.write_count(container.tags().len())?;
        for (name, value) in container.tags() {
            self.write_text(name)?;
            self.write_text(value)?;
        }
        Ok(())
    }

    fn write_lists(&mut self, container: &Container) -> Result<()> {
        self.write_count(container.lists().len())?;
        for (name, values) in container.lists() {
            self.write_text(name)?;
            self.write_count(values.len())?;
            for &value in values {
                // Two's-complement bit pattern at 64 bits
                self.write_vlq(value as u64)?;
            }
        }
        Ok(())
    }

    fn write_directories(&mut self, container: &Container) -> Result<()> {
        // Opened lazily, only if some record is already embedded
        let mut origin: Option<File> = None;

        self.write_count(container.directories().len())?;
        for (dir_name, files) in container.directories() {
            self.write_text(dir_name)?;
            self.write_count(files.len())?;

            for (file_name, record) in files {
                self.write_text(file_name)?;
                let payload_offset = self.current_offset;

                let size = match record {
                    FileRecord::OnDisk { path } => self.write_disk_payload(path)?,
                    FileRecord::Embedded { offset, size } => {
                        let source = match origin {
                            Some(ref mut file) => file,
                            None => origin.insert(Self::open_origin(
                                container,
                                dir_name,
                                file_name,
                            )?),
                        };
                        self.write_embedded_payload(source, container, *offset, *size)?
                    }
                };

                debug!(
                    directory = %dir_name,
                    file = %file_name,
                    offset = payload_offset,
                    size,
                    "packed file"
                );
            }
        }
        Ok(())
    }

    /// Copy a file from disk, prefixed by its length
    fn write_disk_payload(&mut self, path: &Path) -> Result<u64> {
        let unreadable = |source: io::Error| XenError::SourceFileUnreadable {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(unreadable)?;
        let metadata = file.metadata().map_err(unreadable)?;
        if !metadata.is_file() {
            return Err(unreadable(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }
        let size = metadata.len();

        self.write_vlq(size)?;
        let copied = self.copy_payload(&mut file, size, &unreadable)?;
        if copied != size {
            return Err(unreadable(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "file changed size while packing ({} of {} bytes)",
                    copied, size
                ),
            )));
        }
        Ok(size)
    }

    /// Copy an already embedded payload out of the origin archive
    fn write_embedded_payload(
        &mut self,
        origin: &mut File,
        container: &Container,
        offset: u64,
        size: u64,
    ) -> Result<u64> {
        let origin_path = container
            .origin()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let unreadable = |source: io::Error| XenError::SourceFileUnreadable {
            path: origin_path.clone(),
            source,
        };

        origin.seek(SeekFrom::Start(offset)).map_err(unreadable)?;

        self.write_vlq(size)?;
        let copied = self.copy_payload(origin, size, &unreadable)?;
        if copied != size {
            return Err(unreadable(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("origin archive ended after {} of {} bytes", copied, size),
            )));
        }
        Ok(size)
    }

    fn open_origin(container: &Container, directory: &str, file: &str) -> Result<File> {
        let path: PathBuf = container
            .origin()
            .ok_or_else(|| XenError::MissingEmbeddedSource {
                directory: directory.to_string(),
                file: file.to_string(),
            })?
            .to_path_buf();

        File::open(&path)
            .map_err(|source| XenError::SourceFileUnreadable { path, source })
    }

    /// Copy up to `size` bytes from `source`. Read failures are mapped by
    /// `on_read_error`; sink failures stay `Io`.
    fn copy_payload<R, F>(&mut self, source: &mut R, size: u64, on_read_error: F) -> Result<u64>
    where
        R: Read,
        F: Fn(io::Error) -> XenError,
    {
        let mut buf = vec![0u8; COPY_BUFFER_SIZE];
        let mut copied = 0u64;

        while copied < size {
            let want = (size - copied).min(COPY_BUFFER_SIZE as u64) as usize;
            let n = match source.read(&mut buf[..want]) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(on_read_error(e)),
            };
            self.writer.write_all(&buf[..n])?;
            self.current_offset += n as u64;
            copied += n as u64;
        }
        Ok(copied)
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        self.current_offset += bytes.len() as u64;
        Ok(())
    }

    fn write_vlq(&mut self, value: u64) -> Result<()> {
        let written = vlq::write_vlq(&mut self.writer, value)?;
        self.current_offset += written as u64;
        Ok(())
    }

    fn write_count(&mut self, count: usize) -> Result<()> {
        self.write_vlq(count as u64)
    }

    /// Length-prefixed UTF-8 text
    fn write_text(&mut self, text: &str) -> Result<()> {
        self.write_count(text.len())?;
        self.write_raw(text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::format::{EncryptionMethod, Mode};
    use tempfile::TempDir;

    #[test]
    fn test_empty_container_bytes() {
        let mut buf = Vec::new();
        let written = serialize(&Container::new(), &mut buf).unwrap();

        // magic, version 3, encryption 0, no tags, no lists, no directories
        assert_eq!(buf, b"SXEN\x03\x00\x00\x00\x00");
        assert_eq!(written, buf.len() as u64);
    }

    #[test]
    fn test_encryption_forced_to_zero_in_simple_mode() {
        let mut container = Container::new();
        container.set_encryption(EncryptionMethod::Rx);

        let mut buf = Vec::new();
        serialize(&container, &mut buf).unwrap();
        assert_eq!(&buf[..6], b"SXEN\x03\x00");

        container.set_mode(Mode::EncryptionCapable);
        buf.clear();
        serialize(&container, &mut buf).unwrap();
        assert_eq!(&buf[..6], b"DXEN\x03\x02");
    }

    #[test]
    fn test_tag_and_list_layout() {
        let mut container = Container::new();
        container.set_tag("k", "vv");
        container.set_list("n", vec![128, -1]);

        let mut buf = Vec::new();
        serialize(&container, &mut buf).unwrap();

        let mut expected = b"SXEN\x03\x00".to_vec();
        expected.extend_from_slice(b"\x01\x01k\x02vv");
        expected.extend_from_slice(b"\x01\x01n\x02\x81\x00");
        expected.extend_from_slice(&vlq::encode(u64::MAX));
        expected.push(0x00);
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_file_payload_layout() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("hit.wav");
        std::fs::write(&source, [1u8, 2, 3]).unwrap();

        let mut container = Container::new();
        container.add_file("s", "h", &source);

        let mut buf = Vec::new();
        serialize(&container, &mut buf).unwrap();
        assert!(buf.ends_with(b"\x01\x01s\x01\x01h\x03\x01\x02\x03"));
    }

    #[test]
    fn test_missing_source_file() {
        let mut container = Container::new();
        container.add_file("sounds", "gone.wav", "/definitely/not/here.wav");

        let mut buf = Vec::new();
        match serialize(&container, &mut buf) {
            Err(XenError::SourceFileUnreadable { path, .. }) => {
                assert_eq!(path, PathBuf::from("/definitely/not/here.wav"));
            }
            other => panic!("Expected SourceFileUnreadable, got: {:?}", other),
        }
    }

    #[test]
    fn test_directory_as_source_file() {
        let dir = TempDir::new().unwrap();
        let mut container = Container::new();
        container.add_file("d", "f", dir.path());

        let mut buf = Vec::new();
        match serialize(&container, &mut buf) {
            Err(XenError::SourceFileUnreadable { path, .. }) => assert_eq!(path, dir.path()),
            other => panic!("Expected SourceFileUnreadable, got: {:?}", other),
        }
    }

    #[test]
    fn test_sink_failure_is_io() {
        struct FullSink;
        impl Write for FullSink {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "disk full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        assert!(matches!(
            serialize(&Container::new(), FullSink),
            Err(XenError::Io(_))
        ));
    }

    #[test]
    fn test_embedded_record_without_origin() {
        let mut container = Container::new();
        container.insert_record("d", "f", FileRecord::Embedded { offset: 0, size: 1 });

        let mut buf = Vec::new();
        assert!(matches!(
            serialize(&container, &mut buf),
            Err(XenError::MissingEmbeddedSource { .. })
        ));
    }

    #[test]
    fn test_create_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.xen");

        let mut writer = ArchiveWriter::create(&path).unwrap();
        writer.write_container(&Container::new()).unwrap();
        writer.finalize().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"SXEN\x03\x00\x00\x00\x00");
    }
}
