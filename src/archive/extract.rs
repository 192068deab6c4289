//! Extraction of embedded files back onto the filesystem
//!
//! Extraction is best-effort per file: a failing entry is recorded in the
//! [`ExtractionReport`] and the remaining entries are still attempted. Only
//! an unavailable source archive or an uncreatable destination root fail the
//! whole call.

use crate::archive::container::{Container, FileRecord};
use crate::error::{Result, XenError};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Idempotent directory creation used during extraction
pub trait DirectoryCreator {
    /// Create `path` and any missing parents. An existing directory is not an error.
    fn create_directory(&self, path: &Path) -> io::Result<()>;
}

/// [`DirectoryCreator`] backed by [`std::fs::create_dir_all`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDirectoryCreator;

impl DirectoryCreator for FsDirectoryCreator {
    fn create_directory(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }
}

impl<F> DirectoryCreator for F
where
    F: Fn(&Path) -> io::Result<()>,
{
    fn create_directory(&self, path: &Path) -> io::Result<()> {
        self(path)
    }
}

/// One entry that could not be extracted
#[derive(Debug)]
pub struct ExtractionFailure {
    pub directory: String,
    /// `None` when the whole directory failed
    pub file: Option<String>,
    pub error: XenError,
}

/// Outcome of an extraction run
#[derive(Debug, Default)]
pub struct ExtractionReport {
    /// Destination paths written, in extraction order
    pub extracted: Vec<PathBuf>,
    pub bytes_written: u64,
    pub failures: Vec<ExtractionFailure>,
    /// Set when the run stopped early on the cancel flag
    pub cancelled: bool,
}

impl ExtractionReport {
    /// Every entry was extracted
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}

/// Extract every file of `container`, reading payloads from `source_path`
pub fn extract_all<S, D>(
    container: &Container,
    source_path: S,
    destination: D,
) -> Result<ExtractionReport>
where
    S: AsRef<Path>,
    D: AsRef<Path>,
{
    Extractor::new(source_path).extract_all(container, destination)
}

/// Configurable extractor
pub struct Extractor<C = FsDirectoryCreator> {
    source_path: PathBuf,
    creator: C,
    cancel: Option<Arc<AtomicBool>>,
}

impl Extractor<FsDirectoryCreator> {
    pub fn new<P: AsRef<Path>>(source_path: P) -> Self {
        Self {
            source_path: source_path.as_ref().to_path_buf(),
            creator: FsDirectoryCreator,
            cancel: None,
        }
    }
}

impl<C: DirectoryCreator> Extractor<C> {
    /// Use a different directory creation primitive
    pub fn with_directory_creator<D: DirectoryCreator>(self, creator: D) -> Extractor<D> {
        Extractor {
            source_path: self.source_path,
            creator,
            cancel: self.cancel,
        }
    }

    /// Stop between files once `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    pub fn extract_all<P: AsRef<Path>>(
        &self,
        container: &Container,
        destination: P,
    ) -> Result<ExtractionReport> {
        let destination = destination.as_ref();

        let mut source =
            File::open(&self.source_path).map_err(|source| XenError::ExtractionSourceUnavailable {
                path: self.source_path.clone(),
                source,
            })?;
        let source_len = source.metadata()?.len();

        self.create_directory(destination)?;

        let mut report = ExtractionReport::default();
        // Distinct (directory, file) keys can resolve to the same path
        let mut claimed = HashSet::new();

        'directories: for (dir_name, files) in container.directories() {
            if self.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let dir_path = match safe_relative_path(dir_name, true) {
                Ok(relative) => destination.join(relative),
                Err(error) => {
                    record_failure(&mut report, dir_name, None, error);
                    continue;
                }
            };
            if let Err(error) = self.create_directory(&dir_path) {
                record_failure(&mut report, dir_name, None, error);
                continue;
            }

            for (file_name, record) in files {
                if self.is_cancelled() {
                    report.cancelled = true;
                    break 'directories;
                }

                let entry = Entry {
                    dir_path: &dir_path,
                    dir_name,
                    file_name,
                    record,
                };
                match self.extract_file(&mut source, source_len, &mut claimed, entry) {
                    Ok((path, size)) => {
                        debug!(path = %path.display(), size, "extracted file");
                        report.bytes_written += size;
                        report.extracted.push(path);
                    }
                    Err(error) => record_failure(&mut report, dir_name, Some(file_name), error),
                }
            }
        }

        info!(
            source = %self.source_path.display(),
            destination = %destination.display(),
            extracted = report.extracted.len(),
            failed = report.failures.len(),
            cancelled = report.cancelled,
            "extraction finished"
        );
        Ok(report)
    }

    fn create_directory(&self, path: &Path) -> Result<()> {
        self.creator
            .create_directory(path)
            .map_err(|source| XenError::DirectoryCreationFailed {
                path: path.to_path_buf(),
                source,
            })
    }

    fn extract_file(
        &self,
        source: &mut File,
        source_len: u64,
        claimed: &mut HashSet<PathBuf>,
        entry: Entry<'_>,
    ) -> Result<(PathBuf, u64)> {
        let Entry {
            dir_path,
            dir_name,
            file_name,
            record,
        } = entry;

        let (offset, size) = match record {
            FileRecord::Embedded { offset, size } => (*offset, *size),
            FileRecord::OnDisk { .. } => {
                return Err(XenError::NotEmbedded {
                    directory: dir_name.to_string(),
                    file: file_name.to_string(),
                })
            }
        };

        if offset.checked_add(size).map_or(true, |end| end > source_len) {
            return Err(XenError::CorruptContainer(format!(
                "{}/{} ({} bytes at offset {}) lies outside the {} byte source",
                dir_name, file_name, size, offset, source_len
            )));
        }

        let target = dir_path.join(safe_relative_path(file_name, false)?);
        if !claimed.insert(target.clone()) {
            return Err(XenError::TargetCollision { path: target });
        }
        if let Some(parent) = target.parent() {
            if parent != dir_path {
                self.create_directory(parent)?;
            }
        }

        source.seek(SeekFrom::Start(offset))?;
        let mut output = BufWriter::new(File::create(&target)?);
        let copied = io::copy(&mut (&mut *source).take(size), &mut output)?;
        output.flush()?;

        if copied != size {
            return Err(XenError::UnexpectedEndOfStream);
        }
        Ok((target, size))
    }
}

/// One file to extract and where its directory landed
struct Entry<'a> {
    dir_path: &'a Path,
    dir_name: &'a str,
    file_name: &'a str,
    record: &'a FileRecord,
}

fn record_failure(
    report: &mut ExtractionReport,
    directory: &str,
    file: Option<&str>,
    error: XenError,
) {
    warn!(directory, file, %error, "extraction failed");
    report.failures.push(ExtractionFailure {
        directory: directory.to_string(),
        file: file.map(str::to_string),
        error,
    });
}

/// Turn an archive name into a relative path that stays under the
/// extraction root. Both `/` and `\` separate segments.
fn safe_relative_path(name: &str, allow_empty: bool) -> Result<PathBuf> {
    let mut relative = PathBuf::new();

    if name.starts_with('/') || name.starts_with('\\') {
        return Err(XenError::UnsafePath(name.to_string()));
    }

    for segment in name.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => return Err(XenError::UnsafePath(name.to_string())),
            s if s.contains(':') => return Err(XenError::UnsafePath(name.to_string())),
            s => {
                // Reject anything the platform would not treat as a plain name
                let mut components = Path::new(s).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(_)), None) => relative.push(s),
                    _ => return Err(XenError::UnsafePath(name.to_string())),
                }
            }
        }
    }

    if relative.as_os_str().is_empty() && !allow_empty {
        return Err(XenError::UnsafePath(name.to_string()));
    }
    Ok(relative)
}
