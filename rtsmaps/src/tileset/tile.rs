//! Resolved tiles

use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// One palette color
pub type Rgb = [u8; 3];

/// Pixels of one 8x8 minitile, row-major
pub type PixelBlock = [[Rgb; 8]; 8];

/// Height bits hold values 0..=3
const HEIGHT_MAX: f32 = 3.0;

/// The smallest terrain unit
///
/// Equality and hashing only consider the decoded fields, never pixels.
#[derive(Debug, Clone)]
pub struct Minitile {
    /// Units can walk here
    pub walkable: bool,
    /// Normalized elevation in `[0, 1]`
    pub height: f32,
    /// Blocks line of sight
    pub blocks_view: bool,
    /// Part of a ramp
    pub is_ramp: bool,
    /// Index into the minitile pixel table
    pub graphics_id: u16,
    /// Pixels are mirrored horizontally
    pub graphics_flipped: bool,
    /// Unmirrored source pixels
    pub graphics: Arc<PixelBlock>,
}

impl Minitile {
    /// Decode a flags descriptor and a graphics descriptor
    pub fn new(flags: u16, graphics: u16, blocks: &[Arc<PixelBlock>]) -> Option<Self> {
        let graphics_id = graphics >> 1;
        let block = blocks.get(usize::from(graphics_id))?;

        Some(Self {
            walkable: flags & 0x01 != 0,
            height: f32::from((flags >> 1) & 0x03) / HEIGHT_MAX,
            blocks_view: flags & 0x08 != 0,
            is_ramp: flags & 0x10 != 0,
            graphics_id,
            graphics_flipped: graphics & 0x01 != 0,
            graphics: Arc::clone(block),
        })
    }

    /// Pixels as displayed, mirrored when flipped
    pub fn pixels(&self) -> PixelBlock {
        let mut pixels = *self.graphics;
        if self.graphics_flipped {
            for row in pixels.iter_mut() {
                row.reverse();
            }
        }
        pixels
    }
}

impl PartialEq for Minitile {
    fn eq(&self, other: &Self) -> bool {
        self.walkable == other.walkable
            && self.height.to_bits() == other.height.to_bits()
            && self.blocks_view == other.blocks_view
            && self.is_ramp == other.is_ramp
            && self.graphics_id == other.graphics_id
            && self.graphics_flipped == other.graphics_flipped
    }
}

impl Eq for Minitile {}

impl Hash for Minitile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.walkable.hash(state);
        self.height.to_bits().hash(state);
        self.blocks_view.hash(state);
        self.is_ramp.hash(state);
        self.graphics_id.hash(state);
        self.graphics_flipped.hash(state);
    }
}

/// Edge or overlay data of a tile group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// A doodad and the overlay drawn over it
    Doodad {
        /// Overlay sprite id
        overlay_id: u16,
    },
    /// Plain terrain and the groups it may border
    Terrain {
        /// Left edge group
        left_edge: u16,
        /// Top edge group
        top_edge: u16,
        /// Right edge group
        right_edge: u16,
        /// Bottom edge group
        bottom_edge: u16,
    },
}

/// A terrain category owning up to 16 tiles
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileGroup {
    /// Position in the group table
    pub group_id: u32,
    /// Raw group type
    pub megagroup: u16,
    /// Tiles in the group accept buildings
    pub buildable: bool,
    /// Doodad overlay or terrain edges
    pub kind: GroupKind,
}

impl TileGroup {
    /// Whether the group is a doodad
    pub fn is_doodad(&self) -> bool {
        matches!(self.kind, GroupKind::Doodad { .. })
    }
}

/// A 4x4 block of minitiles, the unit scenario terrain refers to
#[derive(Debug, Clone)]
pub struct Tile {
    /// `group_id * 16 + group_offset`
    pub index: u32,
    /// Slot within the group
    pub group_offset: u8,
    /// Owning group
    pub group: Arc<TileGroup>,
    /// Minitiles, row-major
    pub minitiles: [[Minitile; 4]; 4],
}

impl Tile {
    /// Position of the owning group in the group table
    pub fn group_id(&self) -> u32 {
        self.group.group_id
    }

    /// Whether the tile accepts buildings
    pub fn buildable(&self) -> bool {
        self.group.buildable
    }

    /// Whether the tile belongs to a doodad
    pub fn is_doodad(&self) -> bool {
        self.group.is_doodad()
    }

    /// True when every minitile uses graphics id 0
    pub fn is_empty(&self) -> bool {
        self.minitiles
            .iter()
            .flatten()
            .all(|minitile| minitile.graphics_id == 0)
    }

    /// Assemble the 32x32 pixel image, row-major
    pub fn pixels(&self) -> Vec<[Rgb; 32]> {
        let mut image = vec![[[0u8; 3]; 32]; 32];
        for (tile_row, minitiles) in self.minitiles.iter().enumerate() {
            for (tile_col, minitile) in minitiles.iter().enumerate() {
                for (y, row) in minitile.pixels().iter().enumerate() {
                    let start = tile_col * 8;
                    image[tile_row * 8 + y][start..start + 8].copy_from_slice(row);
                }
            }
        }
        image
    }
}

impl PartialEq for Tile {
    fn eq(&self, other: &Self) -> bool {
        self.buildable() == other.buildable() && self.minitiles == other.minitiles
    }
}

impl Eq for Tile {}

impl Hash for Tile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.buildable().hash(state);
        self.minitiles.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn gradient() -> Arc<PixelBlock> {
        let mut block = [[[0u8; 3]; 8]; 8];
        for (y, row) in block.iter_mut().enumerate() {
            for (x, pixel) in row.iter_mut().enumerate() {
                *pixel = [x as u8, y as u8, 0];
            }
        }
        Arc::new(block)
    }

    #[test]
    fn test_descriptor_bits() {
        let blocks = vec![gradient()];
        let minitile = Minitile::new(0b0000_0101, 0, &blocks).unwrap();
        assert!(minitile.walkable);
        assert_eq!(minitile.height, 2.0 / 3.0);
        assert!(!minitile.blocks_view);
        assert!(!minitile.is_ramp);

        let minitile = Minitile::new(0b0001_1110, 1, &blocks).unwrap();
        assert!(!minitile.walkable);
        assert_eq!(minitile.height, 1.0);
        assert!(minitile.blocks_view);
        assert!(minitile.is_ramp);
        assert_eq!(minitile.graphics_id, 0);
        assert!(minitile.graphics_flipped);

        assert!(Minitile::new(0, 2, &blocks).is_none());
    }

    #[test]
    fn test_flipped_pixels_are_mirrored() {
        let blocks = vec![gradient()];
        let plain = Minitile::new(0, 0, &blocks).unwrap();
        let flipped = Minitile::new(0, 1, &blocks).unwrap();

        assert_eq!(plain.pixels()[3][0], [0, 3, 0]);
        assert_eq!(flipped.pixels()[3][0], [7, 3, 0]);
        assert_eq!(flipped.pixels()[3][7], [0, 3, 0]);
    }

    #[test]
    fn test_equality_ignores_pixels() {
        let a = Minitile::new(1, 0, &[gradient()]).unwrap();
        let b = Minitile::new(1, 0, &[Arc::new([[[9u8; 3]; 8]; 8])]).unwrap();
        assert_eq!(a, b);

        let set: HashSet<Minitile> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }
}
