//! Video memory
//!
//! Four banks, each a [`ShadowTexture`]:
//! - sprite: 8-bit storage units (two 4-bit pixels, or one 8-bit pixel)
//! - map: 16-bit tile cells
//! - palette: 32-bit colors
//! - other: 32-bit words holding color swap lines and line transforms
//!
//! The "other" bank has no ROM contents; it is scratch space the renderer
//! fills every frame.

mod encoding;
mod shadow_texture;

pub use encoding::{
    TileCell, decode_cell, empty_cell, encode_cell, low_color_pixel, pack_low_color,
    sprite_unit_span, unpack_low_color,
};
pub use shadow_texture::{ShadowTexture, Texel, TexelData, TexelKind};

use retrovdp_shared::constants::{OTHER_BANK_WIDTH, SPRITE_UNITS_PER_TEXEL};

use crate::error::{AssetError, VdpError};

/// Which video memory bank to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryKind {
    Sprite,
    Map,
    Palette,
    Other,
}

impl MemoryKind {
    pub const ALL: [MemoryKind; 4] = [
        MemoryKind::Sprite,
        MemoryKind::Map,
        MemoryKind::Palette,
        MemoryKind::Other,
    ];

    pub fn texel_kind(self) -> TexelKind {
        match self {
            MemoryKind::Sprite => TexelKind::U8,
            MemoryKind::Map => TexelKind::U16,
            MemoryKind::Palette | MemoryKind::Other => TexelKind::U32,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MemoryKind::Sprite => "sprite",
            MemoryKind::Map => "map",
            MemoryKind::Palette => "palette",
            MemoryKind::Other => "other",
        }
    }
}

/// Which copy of a bank a read observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemorySource {
    /// Load-time contents
    Rom,
    /// Latest writes
    #[default]
    Current,
}

/// Rectangle in storage units of some bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    /// Number of units covered.
    pub fn area(&self) -> usize {
        (self.w as usize).saturating_mul(self.h as usize)
    }

    /// Smallest rectangle covering both.
    pub fn union(self, other: Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    /// Widen horizontally to multiples of `align`.
    pub fn align_x(self, align: u32) -> Rect {
        let x0 = self.x / align * align;
        let x1 = self.right().div_ceil(align) * align;
        Rect::new(x0, self.y, x1 - x0, self.h)
    }
}

/// All four banks.
#[derive(Debug, Clone)]
pub struct VideoMemory {
    sprites: ShadowTexture,
    maps: ShadowTexture,
    palettes: ShadowTexture,
    other: ShadowTexture,
}

impl VideoMemory {
    /// Build memory from decoded bank images.
    ///
    /// `other_rows` is the height of the scratch bank.
    pub fn new(
        sprites: ShadowTexture,
        maps: ShadowTexture,
        palettes: ShadowTexture,
        other_rows: u32,
    ) -> Result<Self, AssetError> {
        for (bank, expected) in [
            (&sprites, MemoryKind::Sprite),
            (&maps, MemoryKind::Map),
            (&palettes, MemoryKind::Palette),
        ] {
            if bank.bank() != expected || bank.kind() != expected.texel_kind() {
                return Err(AssetError::InvalidGeometry {
                    bank: expected,
                    reason: format!("expected {:?} elements", expected.texel_kind()),
                });
            }
        }
        if sprites.units_per_gpu_texel() != SPRITE_UNITS_PER_TEXEL {
            return Err(AssetError::InvalidGeometry {
                bank: MemoryKind::Sprite,
                reason: format!("sprite bank must pack {SPRITE_UNITS_PER_TEXEL} units per texel"),
            });
        }

        let other = ShadowTexture::new(
            MemoryKind::Other,
            OTHER_BANK_WIDTH,
            other_rows.max(1),
            1,
            vec![0u32; (OTHER_BANK_WIDTH * other_rows.max(1)) as usize],
        )?;

        Ok(Self {
            sprites,
            maps,
            palettes,
            other,
        })
    }

    pub fn bank(&self, kind: MemoryKind) -> &ShadowTexture {
        match kind {
            MemoryKind::Sprite => &self.sprites,
            MemoryKind::Map => &self.maps,
            MemoryKind::Palette => &self.palettes,
            MemoryKind::Other => &self.other,
        }
    }

    pub fn bank_mut(&mut self, kind: MemoryKind) -> &mut ShadowTexture {
        match kind {
            MemoryKind::Sprite => &mut self.sprites,
            MemoryKind::Map => &mut self.maps,
            MemoryKind::Palette => &mut self.palettes,
            MemoryKind::Other => &mut self.other,
        }
    }

    pub fn read<T: Texel>(
        &self,
        kind: MemoryKind,
        source: MemorySource,
        rect: Rect,
        out: &mut [T],
    ) -> Result<(), VdpError> {
        self.bank(kind).read_to_buffer(source, rect, out)
    }

    pub fn write<T: Texel>(
        &mut self,
        kind: MemoryKind,
        rect: Rect,
        data: &[T],
    ) -> Result<(), VdpError> {
        self.bank_mut(kind).write_to(rect, data)
    }

    /// Palette bank width, which is also the stride between palette rows.
    pub fn palette_width(&self) -> u32 {
        self.palettes.width()
    }

    /// Mark every bank for a full GPU upload.
    pub fn mark_all_dirty(&mut self) {
        for kind in MemoryKind::ALL {
            self.bank_mut(kind).mark_all_dirty();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges_saturate() {
        let r = Rect::new(u32::MAX - 1, 3, 8, u32::MAX);
        assert_eq!(r.right(), u32::MAX);
        assert_eq!(r.bottom(), u32::MAX);
        assert_eq!(Rect::new(0, 0, 4, 3).area(), 12);
    }

    #[test]
    fn rect_union_and_align() {
        let a = Rect::new(2, 3, 4, 1);
        let b = Rect::new(5, 0, 1, 2);
        assert_eq!(a.union(b), Rect::new(2, 0, 4, 4));
        assert_eq!(Rect::new(5, 0, 6, 1).align_x(4), Rect::new(4, 0, 8, 1));
        assert_eq!(Rect::new(8, 0, 4, 1).align_x(4), Rect::new(8, 0, 4, 1));
    }

    #[test]
    fn video_memory_rejects_wrong_banks() {
        let sprites = ShadowTexture::new(MemoryKind::Sprite, 4, 1, 4, vec![0u8; 4]).unwrap();
        let maps = ShadowTexture::new(MemoryKind::Map, 1, 1, 1, vec![0u16]).unwrap();
        let palettes = ShadowTexture::new(MemoryKind::Palette, 1, 1, 1, vec![0u32]).unwrap();

        let swapped = VideoMemory::new(maps.clone(), sprites.clone(), palettes.clone(), 4);
        assert!(matches!(swapped, Err(AssetError::InvalidGeometry { .. })));

        let memory = VideoMemory::new(sprites, maps, palettes, 4).unwrap();
        assert_eq!(memory.bank(MemoryKind::Other).height(), 4);
        assert_eq!(memory.bank(MemoryKind::Other).width(), OTHER_BANK_WIDTH);
    }
}
