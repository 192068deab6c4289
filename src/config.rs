//! Pack configuration
//!
//! Header settings for new containers, usually kept next to the manifest in
//! a `xen.toml`:
//!
//! ```toml
//! mode = "encryption-capable"
//! version = 3
//! encryption = "kbh"
//! ```
//!
//! Every key is optional.

use crate::archive::{Container, EncryptionMethod, Mode, FORMAT_VERSION};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackConfig {
    pub mode: Mode,
    pub version: u64,
    pub encryption: EncryptionMethod,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Simple,
            version: FORMAT_VERSION,
            encryption: EncryptionMethod::None,
        }
    }
}

impl PackConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Copy the header settings into a container
    pub fn apply(&self, container: &mut Container) {
        container.set_mode(self.mode);
        container.set_version(self.version);
        container.set_encryption(self.encryption);
    }
}
