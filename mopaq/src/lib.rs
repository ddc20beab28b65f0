//! # MoPaQ - MPQ Archive Library
//!
//! A safe Rust implementation of the original (v1) MPQ (Mo'PaQ) archive
//! format used by StarCraft, Brood War and Diablo.
//!
//! ## About the Name
//!
//! MoPaQ is named after the original format name "Mo'PaQ" (Mike O'Brien Pack),
//! which was later shortened to MPQ.
//!
//! ## Features
//!
//! - Header discovery behind executable stubs and user data headers
//! - Encrypted hash and block tables
//! - Encrypted files, including `FIX_KEY` files
//! - zlib, bzip2 and PKWARE implode decompression
//! - A small archive builder, mostly useful for producing test fixtures
//!
//! ## Example
//!
//! ```no_run
//! use mopaq::Archive;
//!
//! # fn main() -> Result<(), mopaq::Error> {
//! let archive = Archive::open("StarDat.mpq")?;
//!
//! if archive.contains("tileset\\jungle.cv5") {
//!     let data = archive.read_file("tileset\\jungle.cv5")?;
//!     println!("{} bytes", data.len());
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod archive;
pub mod builder;
pub mod compression;
pub mod crypto;
pub mod error;
pub mod header;
pub mod tables;

// Re-export commonly used types
pub use archive::{Archive, MpqFile};
pub use builder::ArchiveBuilder;
pub use error::{Error, Result};
pub use header::MpqHeader;

/// MPQ signature constants
pub mod signatures {
    /// Standard MPQ archive signature ('MPQ\x1A')
    pub const MPQ_ARCHIVE: u32 = 0x1A51504D;

    /// MPQ user data signature ('MPQ\x1B')
    pub const MPQ_USERDATA: u32 = 0x1B51504D;
}

/// Block size calculation
#[inline]
pub fn calculate_sector_size(block_size_shift: u16) -> usize {
    512 << block_size_shift
}

/// Check if a value is a power of two
#[inline]
pub fn is_power_of_two(value: u32) -> bool {
    value != 0 && (value & (value - 1)) == 0
}
