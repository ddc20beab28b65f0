//! Error types for scenario and tileset extraction

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading game data
#[derive(Error, Debug)]
pub enum Error {
    /// An archive index or container is malformed
    #[error("Corrupt archive: {0}")]
    ArchiveCorrupt(String),

    /// A chunk stream or record table is malformed
    #[error("Corrupt chunk data: {0}")]
    ChunkCorrupt(String),

    /// A scenario was finalized without a mandatory field
    #[error("Required field \"{field}\" missing")]
    MissingRequiredField {
        /// Name of the missing field
        field: &'static str,
    },

    /// A raw value has no counterpart in the enumeration it maps to
    #[error("Unsupported {kind} value: {value}")]
    UnsupportedEnumValue {
        /// Enumeration being decoded
        kind: &'static str,
        /// The raw value found in the data
        value: u32,
    },

    /// The named entry is not present in any loaded archive
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    /// No known game profile matches the directory
    #[error("No supported game found in {}", .0.display())]
    GameNotFound(PathBuf),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// MPQ archive failure
    #[error("MPQ error: {0}")]
    Mpq(#[from] mopaq::Error),

    /// Configuration file could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// Create an archive corruption error
    pub fn archive_corrupt<S: Into<String>>(msg: S) -> Self {
        Error::ArchiveCorrupt(msg.into())
    }

    /// Create a chunk corruption error
    pub fn chunk_corrupt<S: Into<String>>(msg: S) -> Self {
        Error::ChunkCorrupt(msg.into())
    }

    /// Create a missing field error
    pub fn missing(field: &'static str) -> Self {
        Error::MissingRequiredField { field }
    }

    /// Create an unsupported enum value error
    pub fn unsupported(kind: &'static str, value: impl Into<u32>) -> Self {
        Error::UnsupportedEnumValue {
            kind,
            value: value.into(),
        }
    }
}

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::missing("tileset").to_string(),
            "Required field \"tileset\" missing"
        );
        assert_eq!(
            Error::unsupported("player type", 9u8).to_string(),
            "Unsupported player type value: 9"
        );
        assert!(Error::GameNotFound(PathBuf::from("/games/none"))
            .to_string()
            .contains("/games/none"));
    }

    #[test]
    fn test_mpq_error_conversion() {
        let err: Error = mopaq::Error::FileNotFound("x".into()).into();
        assert!(matches!(err, Error::Mpq(_)));
    }
}
