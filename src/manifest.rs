//! Text manifest support
//!
//! A manifest is a line-oriented description of a container, written by hand
//! or by build scripts:
//!
//! ```text
//! // Project RX sound bank
//! TAG author jane doe
//! LIST damage 10 -3 255
//! FOLDER sounds
//! FILE assets/sfx/hit.wav
//! FILE assets\sfx\miss.wav
//! ```
//!
//! - `TAG <name> <value...>` sets a tag; the value is the rest of the line.
//! - `LIST <name> <int>...` sets a named integer list (may be empty).
//! - `FOLDER <name>` selects the directory following `FILE` lines go into.
//!   Files listed before any folder go into the root directory `""`.
//! - `FILE <path>` packages a file from disk. It is stored under the last
//!   segment of its path; relative paths resolve against the manifest's
//!   directory.
//!
//! Blank lines and lines starting with `//` are ignored. Unknown directives
//! are skipped with a warning.
//!
//! # Usage
//!
//! ```no_run
//! use xen_rs::{manifest, serialize};
//! # use xen_rs::error::Result;
//!
//! # fn main() -> Result<()> {
//! let container = manifest::parse_file("assets/soundbank.txt")?;
//! let output = std::fs::File::create("soundbank.xen")?;
//! serialize(&container, std::io::BufWriter::new(output))?;
//! # Ok(())
//! # }
//! ```

use crate::archive::Container;
use crate::error::{Result, XenError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Parse a manifest file; relative `FILE` paths resolve against its directory
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Container> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    parse_str(&text, base_dir)
}

/// Parse manifest text into a fresh container
pub fn parse_str(text: &str, base_dir: &Path) -> Result<Container> {
    let mut container = Container::new();
    apply_str(&mut container, text, base_dir)?;
    Ok(container)
}

/// Apply manifest directives on top of an existing container
pub fn apply_str(container: &mut Container, text: &str, base_dir: &Path) -> Result<()> {
    let mut current_dir = String::new();

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        let (directive, rest) = split_word(line);
        match directive {
            "TAG" => {
                let (name, value) = split_word(rest);
                if name.is_empty() {
                    return Err(invalid(line_no, "TAG needs a name"));
                }
                container.set_tag(name, value);
            }
            "FOLDER" => {
                current_dir = rest.to_string();
                container.add_directory(current_dir.clone());
            }
            "FILE" => {
                if rest.is_empty() {
                    return Err(invalid(line_no, "FILE needs a path"));
                }
                let file_name = rest
                    .rsplit(['/', '\\'])
                    .next()
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| invalid(line_no, "FILE path has no file name"))?;

                let source = resolve(base_dir, rest);
                debug!(
                    directory = %current_dir,
                    file = file_name,
                    source = %source.display(),
                    "manifest file"
                );
                container.add_file(current_dir.clone(), file_name, source);
            }
            "LIST" => {
                let (name, values) = split_word(rest);
                if name.is_empty() {
                    return Err(invalid(line_no, "LIST needs a name"));
                }
                let values = values
                    .split_whitespace()
                    .map(|token| {
                        token.parse::<i64>().map_err(|e| {
                            invalid(line_no, format!("bad LIST value {:?}: {}", token, e))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                container.set_list(name, values);
            }
            other => {
                warn!(line = line_no, directive = other, "skipping unknown manifest directive");
            }
        }
    }

    Ok(())
}

/// Split off the first whitespace-delimited word; the remainder is left-trimmed
fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (text, ""),
    }
}

/// Manifest paths may use either separator
fn resolve(base_dir: &Path, raw: &str) -> PathBuf {
    let normalized = raw.replace('\\', "/");
    base_dir.join(normalized)
}

fn invalid(line: usize, message: impl Into<String>) -> XenError {
    XenError::InvalidManifest {
        line,
        message: message.into(),
    }
}
