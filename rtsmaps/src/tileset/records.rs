//! Tileset table records

use super::tile::Rgb;
use crate::table::Record;
use byteorder::{ByteOrder, LittleEndian};

/// Family-independent view of a tile group record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupRecord {
    /// Group type; 1 marks doodads
    pub megagroup: u16,
    /// Packed flags; bit 7 marks unbuildable groups
    pub flags: u8,
    /// Overlay id (doodads) or left/top/right/bottom edge ids
    pub edges: [u16; 4],
    /// Megatile id per group slot
    pub megatiles: [u16; 16],
}

impl GroupRecord {
    /// Whether tiles in this group can be built on
    pub fn buildable(&self) -> bool {
        (self.flags >> 4) & 8 == 0
    }
}

fn read_u16s<const N: usize>(data: &[u8]) -> [u16; N] {
    let mut values = [0u16; N];
    LittleEndian::read_u16_into(&data[..N * 2], &mut values);
    values
}

/// StarCraft tile group (`cv5`, 52 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cv5(pub GroupRecord);

impl Record for Cv5 {
    const SIZE: usize = 52;

    fn parse(data: &[u8]) -> Self {
        Cv5(GroupRecord {
            megagroup: LittleEndian::read_u16(&data[0..2]),
            flags: data[2],
            edges: read_u16s(&data[4..12]),
            megatiles: read_u16s(&data[20..52]),
        })
    }
}

/// Warcraft II tile group (`cv4`, 42 bytes)
///
/// The 16 megatile ids come first, followed by 10 bytes of group data
/// laid out like the first bytes of a `cv5` record, one byte per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cv4(pub GroupRecord);

impl Record for Cv4 {
    const SIZE: usize = 42;

    fn parse(data: &[u8]) -> Self {
        let group = &data[32..42];
        Cv4(GroupRecord {
            megagroup: u16::from(group[0]),
            flags: group[1],
            edges: [
                u16::from(group[3]),
                u16::from(group[4]),
                u16::from(group[5]),
                u16::from(group[6]),
            ],
            megatiles: read_u16s(&data[0..32]),
        })
    }
}

/// Minitile flags of one megatile (`vf4`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vf4(pub [u16; 16]);

impl Record for Vf4 {
    const SIZE: usize = 32;

    fn parse(data: &[u8]) -> Self {
        Vf4(read_u16s(data))
    }
}

/// Minitile graphics indices of one megatile (`vx4`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vx4(pub [u16; 16]);

impl Record for Vx4 {
    const SIZE: usize = 32;

    fn parse(data: &[u8]) -> Self {
        Vx4(read_u16s(data))
    }
}

/// Palette indices of one 8x8 minitile (`vr4`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vr4(pub [u8; 64]);

impl Record for Vr4 {
    const SIZE: usize = 64;

    fn parse(data: &[u8]) -> Self {
        let mut pixels = [0u8; 64];
        pixels.copy_from_slice(data);
        Vr4(pixels)
    }
}

/// StarCraft palette entry (`wpe`): RGB plus one padding byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wpe(pub Rgb);

impl Record for Wpe {
    const SIZE: usize = 4;

    fn parse(data: &[u8]) -> Self {
        Wpe([data[0], data[1], data[2]])
    }
}

/// Warcraft II palette entry (`ppl`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ppl(pub Rgb);

impl Record for Ppl {
    const SIZE: usize = 3;

    fn parse(data: &[u8]) -> Self {
        Ppl([data[0], data[1], data[2]])
    }
}
