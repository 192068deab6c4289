//! xen-rs: asset container library for the XEN (SXEN/DXEN) format
//!
//! A container packs named files, free-form tags and named integer lists into
//! one seekable file. Every integer on the wire is a VLQ. Reading a container
//! indexes it without loading payloads; files are extracted on demand.
//!
//! # Example
//!
//! ```no_run
//! use xen_rs::{ArchiveReader, ArchiveWriter, Container};
//!
//! // Describe and write a container
//! let mut container = Container::new();
//! container.set_tag("author", "jane");
//! container.set_list("damage", vec![10, -3, 255]);
//! container.add_file("sounds", "hit.wav", "assets/hit.wav");
//!
//! let mut writer = ArchiveWriter::create("bank.xen")?;
//! writer.write_container(&container)?;
//! writer.finalize()?;
//!
//! // Read it back
//! let reader = ArchiveReader::open("bank.xen")?;
//! assert_eq!(reader.tag("author"), Some("jane"));
//! let _wav = reader.read_file("sounds", "hit.wav")?;
//! reader.extract_all("out")?;
//! # Ok::<(), xen_rs::error::XenError>(())
//! ```

// Core modules
pub mod archive;
pub mod config;
pub mod error;
pub mod manifest;
pub mod vlq;

// Re-export commonly used types
pub use archive::{
    deserialize, extract_all, serialize, ArchiveReader, ArchiveWriter, Container, Directory,
    DirectoryCreator, EncryptionMethod, ExtractionFailure, ExtractionReport, Extractor,
    FileRecord, FsDirectoryCreator, Mode, DXEN_MAGIC, FORMAT_VERSION, MAGIC_SIZE, SXEN_MAGIC,
};
pub use config::PackConfig;
pub use error::{Result, XenError};
