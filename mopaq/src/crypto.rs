//! Encryption, decryption and name hashing for MPQ archives
//!
//! Every MPQ operation that touches names or encrypted data is driven by the
//! same 0x500-entry table of 32-bit values. The table is generated once on
//! first use.

use once_cell::sync::Lazy;

/// The static encryption table used by all MPQ operations
pub static ENCRYPTION_TABLE: Lazy<[u32; 0x500]> = Lazy::new(generate_encryption_table);

/// Hash types for MPQ operations
pub mod hash_type {
    /// Start index in the hash table
    pub const TABLE_OFFSET: u32 = 0;
    /// First verification hash of a file name
    pub const NAME_A: u32 = 1;
    /// Second verification hash of a file name
    pub const NAME_B: u32 = 2;
    /// Encryption key derivation
    pub const FILE_KEY: u32 = 3;
}

fn generate_encryption_table() -> [u32; 0x500] {
    let mut table = [0u32; 0x500];
    let mut seed: u32 = 0x0010_0001;

    for index1 in 0..0x100 {
        for index2 in 0..5 {
            let table_index = index1 + index2 * 0x100;

            seed = (seed.wrapping_mul(125) + 3) % 0x2A_AAAB;
            let temp1 = (seed & 0xFFFF) << 0x10;

            seed = (seed.wrapping_mul(125) + 3) % 0x2A_AAAB;
            let temp2 = seed & 0xFFFF;

            table[table_index] = temp1 | temp2;
        }
    }

    table
}

/// Hash a file name using the MPQ hash algorithm
///
/// Names are hashed case-insensitively and `/` is treated as `\`, so
/// `"tileset/Jungle.cv5"` and `"TILESET\\JUNGLE.CV5"` hash identically.
pub fn hash_string(name: &str, hash_type: u32) -> u32 {
    let mut seed1: u32 = 0x7FED_7FED;
    let mut seed2: u32 = 0xEEEE_EEEE;

    for &byte in name.as_bytes() {
        let ch = match byte {
            b'/' => b'\\',
            other => other.to_ascii_uppercase(),
        } as u32;

        seed1 = ENCRYPTION_TABLE[((hash_type << 8) + ch) as usize] ^ seed1.wrapping_add(seed2);
        seed2 = ch
            .wrapping_add(seed1)
            .wrapping_add(seed2)
            .wrapping_add(seed2 << 5)
            .wrapping_add(3);
    }

    seed1
}

/// Derive the encryption key of a stored file
///
/// Only the final path component takes part in the key. When the block has
/// the `FIX_KEY` flag the key is further adjusted by the block position and
/// the uncompressed size.
pub fn file_key(name: &str, block_offset: u32, file_size: u32, fix_key: bool) -> u32 {
    let basename = name.rsplit(['\\', '/']).next().unwrap_or(name);
    let key = hash_string(basename, hash_type::FILE_KEY);

    if fix_key {
        key.wrapping_add(block_offset) ^ file_size
    } else {
        key
    }
}

/// Decrypt a block of 32-bit values in place
pub fn decrypt_block(data: &mut [u32], mut key: u32) {
    let mut seed: u32 = 0xEEEE_EEEE;

    for value in data.iter_mut() {
        seed = seed.wrapping_add(ENCRYPTION_TABLE[0x400 + (key & 0xFF) as usize]);

        let ch = *value ^ key.wrapping_add(seed);
        *value = ch;

        key = ((!key) << 0x15).wrapping_add(0x1111_1111) | (key >> 0x0B);
        seed = ch
            .wrapping_add(seed)
            .wrapping_add(seed << 5)
            .wrapping_add(3);
    }
}

/// Encrypt a block of 32-bit values in place
pub fn encrypt_block(data: &mut [u32], mut key: u32) {
    let mut seed: u32 = 0xEEEE_EEEE;

    for value in data.iter_mut() {
        seed = seed.wrapping_add(ENCRYPTION_TABLE[0x400 + (key & 0xFF) as usize]);

        let ch = *value;
        *value = ch ^ key.wrapping_add(seed);

        key = ((!key) << 0x15).wrapping_add(0x1111_1111) | (key >> 0x0B);
        seed = ch
            .wrapping_add(seed)
            .wrapping_add(seed << 5)
            .wrapping_add(3);
    }
}

/// Decrypt a byte buffer in place
///
/// The buffer is processed as little-endian 32-bit words; trailing bytes that
/// do not fill a whole word are stored in the clear and left untouched.
pub fn decrypt_bytes(data: &mut [u8], key: u32) {
    transform_bytes(data, key, decrypt_block);
}

/// Encrypt a byte buffer in place (inverse of [`decrypt_bytes`])
pub fn encrypt_bytes(data: &mut [u8], key: u32) {
    transform_bytes(data, key, encrypt_block);
}

fn transform_bytes(data: &mut [u8], key: u32, transform: fn(&mut [u32], u32)) {
    let whole = data.len() / 4 * 4;
    if whole == 0 {
        return;
    }

    let mut words: Vec<u32> = data[..whole]
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    transform(&mut words, key);

    for (chunk, word) in data[..whole].chunks_exact_mut(4).zip(&words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
}
