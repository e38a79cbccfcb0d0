//! Indexed pixel resolution over borrowed memory banks.
//!
//! Every lookup is bounds checked: anything outside a bank reads as
//! transparent (sprite index 0, empty map cell, missing palette entry).

use glam::Affine2;
use retrovdp_shared::Color;
use retrovdp_shared::constants::TRANSPARENT_INDEX;

use crate::error::VdpError;
use crate::graphics::command_buffer::{MapCommand, ObjCommand, TransformRef};
use crate::graphics::line_transform::{decode_affine, transform_pixel};
use crate::graphics::render_context::RenderContext;
use crate::memory::{MemoryKind, VideoMemory, decode_cell, empty_cell, low_color_pixel};

/// Typed views of all four banks for one frame.
pub(super) struct MemoryView<'a> {
    sprites: &'a [u8],
    sprite_width: u32,
    sprite_height: u32,
    maps: &'a [u16],
    map_width: u32,
    map_height: u32,
    palettes: &'a [u32],
    palette_width: u32,
    palette_height: u32,
    other: &'a [u32],
    other_width: u32,
    other_height: u32,
}

impl<'a> MemoryView<'a> {
    pub fn new(memory: &'a VideoMemory) -> Result<Self, VdpError> {
        let sprites = memory.bank(MemoryKind::Sprite);
        let maps = memory.bank(MemoryKind::Map);
        let palettes = memory.bank(MemoryKind::Palette);
        let other = memory.bank(MemoryKind::Other);
        Ok(Self {
            sprites: sprites.current()?,
            sprite_width: sprites.width(),
            sprite_height: sprites.height(),
            maps: maps.current()?,
            map_width: maps.width(),
            map_height: maps.height(),
            palettes: palettes.current()?,
            palette_width: palettes.width(),
            palette_height: palettes.height(),
            other: other.current()?,
            other_width: other.width(),
            other_height: other.height(),
        })
    }

    /// Color index of a sprite-memory pixel (logical pixel coordinates).
    #[inline]
    pub fn sprite_index(&self, px: i32, py: i32, hi_color: bool) -> u8 {
        if px < 0 || py < 0 {
            return 0;
        }
        let (px, py) = (px as u32, py as u32);
        let unit = if hi_color { px } else { px >> 1 };
        if unit >= self.sprite_width || py >= self.sprite_height {
            return 0;
        }
        let byte = self.sprites[(py * self.sprite_width + unit) as usize];
        if hi_color {
            byte
        } else {
            low_color_pixel(byte, px)
        }
    }

    #[inline]
    fn map_cell(&self, x: u32, y: u32) -> u16 {
        if x >= self.map_width || y >= self.map_height {
            return empty_cell();
        }
        self.maps[(y * self.map_width + x) as usize]
    }

    #[inline]
    fn other_word(&self, row: u32, col: u32) -> u32 {
        if row >= self.other_height || col >= self.other_width {
            return 0;
        }
        self.other[(row * self.other_width + col) as usize]
    }

    /// Matrix stored at an "other" memory row.
    pub fn affine(&self, row: u32) -> Affine2 {
        if row >= self.other_height {
            return Affine2::ZERO;
        }
        let start = (row * self.other_width) as usize;
        decode_affine(&self.other[start..start + self.other_width as usize])
    }

    /// Palette color at `address`, with color swaps for `screen_y` applied.
    #[inline]
    pub fn color(&self, context: &RenderContext, address: u32, screen_y: u32) -> Option<Color> {
        if address / self.palette_width >= self.palette_height {
            return None;
        }
        if let Some(slot) = context.swap_slot(address) {
            return Some(Color(
                self.other_word(context.swap_base_row + screen_y, slot as u32),
            ));
        }
        Some(Color(self.palettes[address as usize]))
    }

    /// Palette address of a background pixel, or `None` if transparent.
    ///
    /// `line` is the matrix for this window line (if the layer has one);
    /// `(lx, ly)` is the window-local pixel.
    #[inline]
    pub fn resolve_map(
        &self,
        cmd: &MapCommand,
        line: Option<&Affine2>,
        lx: i32,
        ly: i32,
    ) -> Option<u32> {
        let (mut sx, mut sy) = match (cmd.transform, line) {
            (TransformRef::Affine { .. }, Some(m)) => transform_pixel(m, lx, ly),
            (TransformRef::PerLine { .. }, Some(m)) => transform_pixel(m, lx, 0),
            _ => (lx, ly),
        };
        sx = sx.wrapping_add(cmd.scroll_x);
        sy = sy.wrapping_add(cmd.scroll_y);

        let (mw, mh) = cmd.pixel_size();
        let (mw, mh) = (mw as i32, mh as i32);
        if mw <= 0 || mh <= 0 {
            return None;
        }
        if cmd.wrap {
            sx = sx.rem_euclid(mw);
            sy = sy.rem_euclid(mh);
        } else if sx < 0 || sy < 0 || sx >= mw || sy >= mh {
            return None;
        }

        let (tw, th) = (cmd.tile_w as i32, cmd.tile_h as i32);
        let cell = self.map_cell(cmd.map_x + (sx / tw) as u32, cmd.map_y + (sy / th) as u32);
        let cell = decode_cell(cell)?;

        let per_row = cmd.tiles_per_row();
        let tile = cell.tile as u32;
        let px = cmd.tileset.x + (tile % per_row) * cmd.tile_w + (sx % tw) as u32;
        let py = cmd.tileset.y + (tile / per_row) * cmd.tile_h + (sy % th) as u32;
        let index = self.sprite_index(px as i32, py as i32, cmd.tileset.hi_color);
        if index == TRANSPARENT_INDEX {
            return None;
        }
        Some((cmd.palette_row + cell.bank as u32) * self.palette_width + index as u32)
    }

    /// Palette address of a sprite pixel, or `None` if transparent.
    #[inline]
    pub fn resolve_obj(&self, cmd: &ObjCommand, lx: u32, ly: u32) -> Option<u32> {
        let src = &cmd.source;
        if src.w == 0 || src.h == 0 {
            return None;
        }
        let mut sx = (lx as u64 * src.w as u64 / cmd.dest.w.max(1) as u64) as u32;
        let mut sy = (ly as u64 * src.h as u64 / cmd.dest.h.max(1) as u64) as u32;
        if cmd.flip_h {
            sx = src.w - 1 - sx;
        }
        if cmd.flip_v {
            sy = src.h - 1 - sy;
        }
        let index = self.sprite_index((src.x + sx) as i32, (src.y + sy) as i32, src.hi_color);
        if index == TRANSPARENT_INDEX {
            return None;
        }
        Some(cmd.palette_row * self.palette_width + index as u32)
    }
}
