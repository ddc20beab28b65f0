//! Error types for MPQ archive operations

use std::io;
use thiserror::Error;

/// Errors that can occur while reading or writing MPQ archives
#[derive(Error, Debug)]
pub enum Error {
    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No valid MPQ header could be located, or the header is malformed
    #[error("Invalid MPQ header: {0}")]
    InvalidHeader(String),

    /// The hash or block table is inconsistent
    #[error("Corrupted table: {0}")]
    CorruptedTable(String),

    /// A file's stored data does not match its block entry
    #[error("Corrupted file data in {name}: {reason}")]
    CorruptedFile {
        /// Name the file was requested under
        name: String,
        /// What was wrong with the data
        reason: String,
    },

    /// The requested file is not present in the archive
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// The sector uses a compression method this library does not decode
    #[error("Unsupported compression method: 0x{0:02X}")]
    UnsupportedCompression(u8),

    /// A decompressor rejected its input
    #[error("Decompression failed: {0}")]
    Decompression(String),
}

impl Error {
    /// Create an invalid header error
    pub fn invalid_header<S: Into<String>>(msg: S) -> Self {
        Error::InvalidHeader(msg.into())
    }

    /// Create a corrupted table error
    pub fn corrupted_table<S: Into<String>>(msg: S) -> Self {
        Error::CorruptedTable(msg.into())
    }

    /// Create a corrupted file error
    pub fn corrupted_file<N: Into<String>, S: Into<String>>(name: N, reason: S) -> Self {
        Error::CorruptedFile {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a decompression error
    pub fn decompression<S: Into<String>>(msg: S) -> Self {
        Error::Decompression(msg.into())
    }
}

/// Result type for MPQ operations
pub type Result<T> = std::result::Result<T, Error>;
