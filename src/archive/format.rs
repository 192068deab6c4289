use crate::error::{Result, XenError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Magic header of a simple container
pub const SXEN_MAGIC: [u8; 4] = *b"SXEN";

/// Magic header of an encryption-capable container
pub const DXEN_MAGIC: [u8; 4] = *b"DXEN";

/// Magic header length in bytes
pub const MAGIC_SIZE: usize = 4;

/// Format version written by default
pub const FORMAT_VERSION: u64 = 3;

/// Container sub-format, selected by the magic header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// "SXEN": the encryption field is always written as zero
    #[default]
    Simple,
    /// "DXEN": the encryption field is persisted
    EncryptionCapable,
}

impl Mode {
    /// The 4-byte magic header for this mode
    pub fn magic(self) -> [u8; 4] {
        match self {
            Mode::Simple => SXEN_MAGIC,
            Mode::EncryptionCapable => DXEN_MAGIC,
        }
    }

    /// Identify the mode from a magic header
    pub fn from_magic(magic: [u8; 4]) -> Result<Self> {
        match magic {
            SXEN_MAGIC => Ok(Mode::Simple),
            DXEN_MAGIC => Ok(Mode::EncryptionCapable),
            found => Err(XenError::BadMagicHeader { found }),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Simple => f.write_str("simple"),
            Mode::EncryptionCapable => f.write_str("encryption-capable"),
        }
    }
}

impl FromStr for Mode {
    type Err = XenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "simple" | "sxen" => Ok(Mode::Simple),
            "encryption-capable" | "dxen" => Ok(Mode::EncryptionCapable),
            _ => Err(XenError::UnknownMode(s.to_string())),
        }
    }
}

/// Encryption method recorded in the header.
///
/// The value is metadata only. No transform is ever applied to payloads.
/// Values without a known name are kept as [`EncryptionMethod::Other`] and
/// written back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncryptionMethod {
    #[default]
    None,
    Kbh,
    Rx,
    Other(u64),
}

impl EncryptionMethod {
    pub fn from_u64(value: u64) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Kbh,
            2 => Self::Rx,
            other => Self::Other(other),
        }
    }

    pub fn as_u64(self) -> u64 {
        match self {
            Self::None => 0,
            Self::Kbh => 1,
            Self::Rx => 2,
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for EncryptionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncryptionMethod::None => f.write_str("none"),
            EncryptionMethod::Kbh => f.write_str("kbh"),
            EncryptionMethod::Rx => f.write_str("rx"),
            EncryptionMethod::Other(value) => write!(f, "{}", value),
        }
    }
}

impl FromStr for EncryptionMethod {
    type Err = XenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "kbh" => Ok(Self::Kbh),
            "rx" => Ok(Self::Rx),
            other => other
                .parse::<u64>()
                .map(Self::from_u64)
                .map_err(|_| XenError::UnknownEncryption(s.to_string())),
        }
    }
}
