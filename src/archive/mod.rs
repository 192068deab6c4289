mod container;
mod extract;
mod format;
mod reader;
mod writer;

pub use container::{Container, Directory, FileRecord};
pub use extract::{
    extract_all, DirectoryCreator, ExtractionFailure, ExtractionReport, Extractor,
    FsDirectoryCreator,
};
pub use format::{EncryptionMethod, Mode, DXEN_MAGIC, FORMAT_VERSION, MAGIC_SIZE, SXEN_MAGIC};
pub use reader::{deserialize, ArchiveReader};
pub use writer::{serialize, ArchiveWriter};
