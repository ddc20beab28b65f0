//! Tagged chunk streams
//!
//! Each chunk is a 4-byte ASCII tag, a little-endian `i32` payload length and
//! the payload. Tags shorter than four characters are space padded.

use crate::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};

/// Size of a chunk header: tag plus length
pub const CHUNK_HEADER_SIZE: u64 = 8;

/// A chunk's tag and declared payload length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Tag with padding trimmed, e.g. `"ERA"`
    pub tag: String,
    /// Declared payload length
    pub length: u32,
}

/// Sequential reader over a chunk stream
///
/// The stream ends cleanly at the end of input. Trailing bytes too short for
/// a header, and a skipped payload running past the end of input, also end
/// the stream with a warning rather than an error.
#[derive(Debug)]
pub struct ChunkReader<R> {
    reader: R,
    position: u64,
    size: u64,
}

impl<R: Read + Seek> ChunkReader<R> {
    /// Start reading chunks at the reader's current position
    pub fn new(mut reader: R) -> Result<Self> {
        let position = reader.stream_position()?;
        let size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(position))?;
        Ok(Self {
            reader,
            position,
            size,
        })
    }

    /// Offset of the next unread byte
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Bytes left in the stream
    pub fn remaining(&self) -> u64 {
        self.size.saturating_sub(self.position)
    }

    /// Read the next chunk header, or `None` at the end of the stream
    pub fn next_header(&mut self) -> Result<Option<ChunkHeader>> {
        match self.remaining() {
            0 => return Ok(None),
            n if n < CHUNK_HEADER_SIZE => {
                log::warn!("Ignoring {n} trailing bytes at offset {}", self.position);
                self.position = self.size;
                return Ok(None);
            }
            _ => {}
        }

        let mut tag = [0u8; 4];
        self.reader.read_exact(&mut tag)?;
        let length = self.reader.read_i32::<LittleEndian>()?;
        self.position += CHUNK_HEADER_SIZE;

        if !tag.is_ascii() {
            return Err(Error::chunk_corrupt(format!(
                "undecodable tag {tag:02x?} at offset {}",
                self.position - CHUNK_HEADER_SIZE
            )));
        }
        let tag = String::from_utf8_lossy(&tag).trim().to_string();

        let length = u32::try_from(length).map_err(|_| {
            Error::chunk_corrupt(format!("chunk {tag} has negative length {length}"))
        })?;

        Ok(Some(ChunkHeader { tag, length }))
    }

    /// Read the payload of the chunk whose header was just read
    ///
    /// A payload cut short by the end of input yields the bytes available.
    pub fn read_payload(&mut self, header: &ChunkHeader) -> Result<Vec<u8>> {
        let available = self.remaining().min(u64::from(header.length));
        if available < u64::from(header.length) {
            log::warn!(
                "Chunk {} declares {} bytes, only {available} remain",
                header.tag,
                header.length
            );
        }

        let mut payload = vec![0u8; available as usize];
        self.reader.read_exact(&mut payload)?;
        self.position += available;
        Ok(payload)
    }

    /// Skip the payload of the chunk whose header was just read
    pub fn skip(&mut self, header: &ChunkHeader) -> Result<()> {
        let length = u64::from(header.length);
        if length > self.remaining() {
            log::warn!(
                "Chunk {} at offset {} runs past the end of input",
                header.tag,
                self.position - CHUNK_HEADER_SIZE
            );
            self.position = self.size;
            return Ok(());
        }

        self.reader.seek(SeekFrom::Current(length as i64))?;
        self.position += length;
        Ok(())
    }

    /// Take back the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut data = tag.to_vec();
        data.extend_from_slice(&(payload.len() as i32).to_le_bytes());
        data.extend_from_slice(payload);
        data
    }

    #[test]
    fn test_skip_advances_past_payload() {
        let mut data = chunk(b"XYZZ", &[7; 10]);
        data.extend(chunk(b"ERA ", &[4, 0]));

        let mut chunks = ChunkReader::new(Cursor::new(data)).unwrap();
        let header = chunks.next_header().unwrap().unwrap();
        assert_eq!(header.tag, "XYZZ");
        assert_eq!(header.length, 10);
        chunks.skip(&header).unwrap();
        assert_eq!(chunks.position(), 18);

        let header = chunks.next_header().unwrap().unwrap();
        assert_eq!(header.tag, "ERA");
        assert_eq!(chunks.read_payload(&header).unwrap(), vec![4, 0]);
        assert_eq!(chunks.next_header().unwrap(), None);
    }

    #[test]
    fn test_bad_headers() {
        let mut chunks = ChunkReader::new(Cursor::new(chunk(b"\xffBAD", &[]))).unwrap();
        assert!(matches!(chunks.next_header(), Err(Error::ChunkCorrupt(_))));

        let mut data = b"DIM ".to_vec();
        data.extend_from_slice(&(-4i32).to_le_bytes());
        let mut chunks = ChunkReader::new(Cursor::new(data)).unwrap();
        assert!(matches!(chunks.next_header(), Err(Error::ChunkCorrupt(_))));
    }

    #[test]
    fn test_tolerated_truncation() {
        // trailing bytes shorter than a header
        let mut data = chunk(b"VER ", &[17, 0]);
        data.extend_from_slice(&[1, 2, 3]);
        let mut chunks = ChunkReader::new(Cursor::new(data)).unwrap();
        let header = chunks.next_header().unwrap().unwrap();
        chunks.read_payload(&header).unwrap();
        assert_eq!(chunks.next_header().unwrap(), None);

        // skipped chunk overrunning the input
        let mut data = b"JUNK".to_vec();
        data.extend_from_slice(&100i32.to_le_bytes());
        data.extend_from_slice(&[0; 5]);
        let mut chunks = ChunkReader::new(Cursor::new(data)).unwrap();
        let header = chunks.next_header().unwrap().unwrap();
        chunks.skip(&header).unwrap();
        assert_eq!(chunks.next_header().unwrap(), None);

        // handled chunk overrunning the input
        let mut data = b"MTXM".to_vec();
        data.extend_from_slice(&8i32.to_le_bytes());
        data.extend_from_slice(&[1, 0, 2, 0]);
        let mut chunks = ChunkReader::new(Cursor::new(data)).unwrap();
        let header = chunks.next_header().unwrap().unwrap();
        assert_eq!(chunks.read_payload(&header).unwrap(), vec![1, 0, 2, 0]);
        assert_eq!(chunks.next_header().unwrap(), None);
    }

    proptest! {
        #[test]
        fn headers_always_consume_declared_lengths(
            payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..40), 0..8)
        ) {
            let data: Vec<u8> = payloads.iter().flat_map(|p| chunk(b"TEST", p)).collect();
            let total = data.len() as u64;

            let mut chunks = ChunkReader::new(Cursor::new(data)).unwrap();
            let mut seen = 0;
            while let Some(header) = chunks.next_header().unwrap() {
                prop_assert_eq!(header.length as usize, payloads[seen].len());
                if seen % 2 == 0 {
                    chunks.skip(&header).unwrap();
                } else {
                    prop_assert_eq!(&chunks.read_payload(&header).unwrap(), &payloads[seen]);
                }
                seen += 1;
            }
            prop_assert_eq!(seen, payloads.len());
            prop_assert_eq!(chunks.position(), total);
        }
    }
}
