//! Bit layouts of map cells and packed sprite pixels.
//!
//! The CPU compositor, the memory API and the asset tests all go through
//! these functions. The WGSL shader repeats the same arithmetic.

use retrovdp_shared::constants::{EMPTY_TILE, MAX_PALETTE_BANK, TILE_INDEX_BITS, TILE_INDEX_MASK};

use crate::error::VdpError;

/// Decoded map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCell {
    /// Tile index into the tileset
    pub tile: u16,
    /// Palette bank offset (0..=7), added to the layer's base palette row
    pub bank: u16,
}

/// Pack a tile index and palette bank into a 16-bit map cell.
pub fn encode_cell(tile: u16, bank: u16) -> u16 {
    (tile & TILE_INDEX_MASK) | ((bank & MAX_PALETTE_BANK) << TILE_INDEX_BITS)
}

/// Map cell that is never drawn.
pub const fn empty_cell() -> u16 {
    EMPTY_TILE
}

/// Decode a map cell. Returns `None` for the empty sentinel.
#[inline]
pub fn decode_cell(cell: u16) -> Option<TileCell> {
    let tile = cell & TILE_INDEX_MASK;
    if tile >= EMPTY_TILE {
        return None;
    }
    Some(TileCell {
        tile,
        bank: cell >> TILE_INDEX_BITS,
    })
}

/// Extract one 4-bit pixel from its storage byte. Even x uses the low nibble.
#[inline]
pub fn low_color_pixel(byte: u8, x: u32) -> u8 {
    if x & 1 == 0 { byte & 0x0F } else { byte >> 4 }
}

/// Pack one index per pixel into 4-bit pairs. `pixels.len()` must be even.
pub fn pack_low_color(pixels: &[u8]) -> Vec<u8> {
    pixels
        .chunks_exact(2)
        .map(|pair| (pair[0] & 0x0F) | ((pair[1] & 0x0F) << 4))
        .collect()
}

/// Expand 4-bit pairs into one index per pixel.
pub fn unpack_low_color(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().flat_map(|&b| [b & 0x0F, b >> 4]).collect()
}

/// Convert a pixel span of a sprite to its storage unit span `(x, w)`.
pub fn sprite_unit_span(x: u32, w: u32, hi_color: bool) -> Result<(u32, u32), VdpError> {
    if hi_color {
        return Ok((x, w));
    }
    if x % 2 != 0 || w % 2 != 0 {
        return Err(VdpError::MisalignedSprite { x, w });
    }
    Ok((x / 2, w / 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_encoding_splits_13_and_3_bits() {
        let cell = encode_cell(0x0123, 5);
        assert_eq!(cell, 0x0123 | (5 << 13));
        assert_eq!(decode_cell(cell), Some(TileCell { tile: 0x0123, bank: 5 }));
    }

    #[test]
    fn empty_sentinel_ignores_bank_bits() {
        assert_eq!(decode_cell(empty_cell()), None);
        assert_eq!(decode_cell(encode_cell(EMPTY_TILE, 3)), None);
        assert!(decode_cell(encode_cell(EMPTY_TILE - 1, 7)).is_some());
    }

    #[test]
    fn nibble_parity() {
        assert_eq!(low_color_pixel(0xA3, 0), 0x3);
        assert_eq!(low_color_pixel(0xA3, 1), 0xA);
        assert_eq!(low_color_pixel(0xA3, 6), 0x3);
    }

    #[test]
    fn pack_and_unpack_low_color() {
        let pixels = [1, 2, 15, 0, 7, 8];
        let packed = pack_low_color(&pixels);
        assert_eq!(packed, [0x21, 0x0F, 0x87]);
        assert_eq!(unpack_low_color(&packed), pixels);
    }

    #[test]
    fn unit_span_requires_even_low_color() {
        assert_eq!(sprite_unit_span(4, 16, false), Ok((2, 8)));
        assert_eq!(sprite_unit_span(3, 16, true), Ok((3, 16)));
        assert_eq!(
            sprite_unit_span(3, 16, false),
            Err(VdpError::MisalignedSprite { x: 3, w: 16 })
        );
    }
}
