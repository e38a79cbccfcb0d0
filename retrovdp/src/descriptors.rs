//! Named windows into video memory.
//!
//! Descriptors are plain values. Deriving a sub-window (`offsetted`, `tile`)
//! returns a new descriptor and never touches the registry.

use hashbrown::HashMap;
use retrovdp_shared::ids::is_valid_asset_name;
use retrovdp_shared::{BankGeometry, Manifest};

use crate::error::{AssetError, VdpError};
use crate::memory::{Rect, sprite_unit_span};

/// Window of palette rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VdpPalette {
    pub name: String,
    /// First palette row
    pub y: u32,
    /// Number of rows
    pub size: u32,
}

impl VdpPalette {
    /// Sub-range of rows, relative to this palette.
    pub fn offsetted(&self, y: u32, size: u32) -> Self {
        Self {
            name: self.name.clone(),
            y: self.y.saturating_add(y),
            size,
        }
    }
}

/// Window of sprite memory, in logical pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VdpSprite {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    /// Tile width when used as a tileset (defaults to `w`)
    pub tile_w: u32,
    /// Tile height when used as a tileset (defaults to `h`)
    pub tile_h: u32,
    /// 8 bits per pixel instead of 4
    pub hi_color: bool,
    pub palette: Option<VdpPalette>,
}

impl VdpSprite {
    /// Sub-window relative to this sprite.
    pub fn offsetted(&self, x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            x: self.x.saturating_add(x),
            y: self.y.saturating_add(y),
            w,
            h,
            ..self.clone()
        }
    }

    /// The `n`-th tile, counted row-major.
    pub fn tile(&self, n: u32) -> Self {
        let per_row = self.tiles_per_row().max(1);
        self.offsetted(
            (n % per_row).saturating_mul(self.tile_w),
            (n / per_row).saturating_mul(self.tile_h),
            self.tile_w,
            self.tile_h,
        )
    }

    pub fn tiles_per_row(&self) -> u32 {
        self.w / self.tile_w.max(1)
    }

    /// Storage rectangle in the sprite bank.
    pub fn storage_rect(&self) -> Result<Rect, VdpError> {
        let (x, w) = sprite_unit_span(self.x, self.w, self.hi_color)?;
        Ok(Rect::new(x, self.y, w, self.h))
    }
}

/// Window of map memory, in cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VdpMap {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub tileset: VdpSprite,
    pub palette: Option<VdpPalette>,
}

impl VdpMap {
    /// Sub-window relative to this map.
    pub fn offsetted(&self, x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            x: self.x.saturating_add(x),
            y: self.y.saturating_add(y),
            w,
            h,
            ..self.clone()
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    /// Size of the map in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.w * self.tileset.tile_w, self.h * self.tileset.tile_h)
    }
}

/// Name lookup for every descriptor declared by a manifest.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    sprites: HashMap<String, VdpSprite>,
    maps: HashMap<String, VdpMap>,
    palettes: HashMap<String, VdpPalette>,
}

impl AssetRegistry {
    /// Resolve and validate every entry of a manifest.
    pub fn from_manifest(manifest: &Manifest) -> Result<Self, AssetError> {
        let mut registry = Self::default();

        for (name, desc) in &manifest.palettes {
            check_name(name)?;
            if !fits(desc.y, desc.size, manifest.palette_memory.height) {
                return Err(invalid(name, "palette rows exceed palette memory"));
            }
            registry.palettes.insert(
                name.clone(),
                VdpPalette {
                    name: name.clone(),
                    y: desc.y,
                    size: desc.size,
                },
            );
        }

        for (name, desc) in &manifest.sprites {
            check_name(name)?;
            let palette = registry.resolve_palette(name, desc.pal.as_deref())?;
            let sprite = VdpSprite {
                name: name.clone(),
                x: desc.x,
                y: desc.y,
                w: desc.w,
                h: desc.h,
                tile_w: desc.tile_w.unwrap_or(desc.w),
                tile_h: desc.tile_h.unwrap_or(desc.h),
                hi_color: desc.hi_color,
                palette,
            };
            check_sprite(&sprite, manifest.sprite_memory)?;
            registry.sprites.insert(name.clone(), sprite);
        }

        for (name, desc) in &manifest.maps {
            check_name(name)?;
            let tileset = registry
                .sprites
                .get(&desc.tileset)
                .cloned()
                .ok_or_else(|| invalid(name, format!("unknown tileset {:?}", desc.tileset)))?;
            if !fits(desc.x, desc.w, manifest.map_memory.width)
                || !fits(desc.y, desc.h, manifest.map_memory.height)
            {
                return Err(invalid(name, "map exceeds map memory"));
            }
            let palette = match desc.pal.as_deref() {
                Some(pal) => registry.resolve_palette(name, Some(pal))?,
                None => tileset.palette.clone(),
            };
            registry.maps.insert(
                name.clone(),
                VdpMap {
                    name: name.clone(),
                    x: desc.x,
                    y: desc.y,
                    w: desc.w,
                    h: desc.h,
                    tileset,
                    palette,
                },
            );
        }

        Ok(registry)
    }

    pub fn sprite(&self, name: &str) -> Result<&VdpSprite, VdpError> {
        self.sprites.get(name).ok_or_else(|| unknown("sprite", name))
    }

    pub fn map(&self, name: &str) -> Result<&VdpMap, VdpError> {
        self.maps.get(name).ok_or_else(|| unknown("map", name))
    }

    pub fn palette(&self, name: &str) -> Result<&VdpPalette, VdpError> {
        self.palettes.get(name).ok_or_else(|| unknown("palette", name))
    }

    fn resolve_palette(
        &self,
        owner: &str,
        pal: Option<&str>,
    ) -> Result<Option<VdpPalette>, AssetError> {
        match pal {
            None => Ok(None),
            Some(pal) => self
                .palettes
                .get(pal)
                .cloned()
                .map(Some)
                .ok_or_else(|| invalid(owner, format!("unknown palette {pal:?}"))),
        }
    }
}

fn check_name(name: &str) -> Result<(), AssetError> {
    if is_valid_asset_name(name) {
        Ok(())
    } else {
        Err(invalid(name, "invalid asset name"))
    }
}

fn check_sprite(sprite: &VdpSprite, bank: BankGeometry) -> Result<(), AssetError> {
    let rect = sprite
        .storage_rect()
        .map_err(|e| invalid(&sprite.name, e.to_string()))?;
    if !fits(rect.x, rect.w, bank.width) || !fits(rect.y, rect.h, bank.height) {
        return Err(invalid(&sprite.name, "sprite exceeds sprite memory"));
    }
    if sprite.tile_w == 0 || sprite.tile_h == 0 {
        return Err(invalid(&sprite.name, "zero tile size"));
    }
    if !sprite.hi_color && sprite.tile_w % 2 != 0 {
        return Err(invalid(&sprite.name, "low-color tile width must be even"));
    }
    Ok(())
}

/// `start + len <= limit`, without overflowing.
fn fits(start: u32, len: u32, limit: u32) -> bool {
    start.checked_add(len).is_some_and(|end| end <= limit)
}

fn invalid(name: &str, reason: impl Into<String>) -> AssetError {
    AssetError::InvalidEntry {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn unknown(kind: &'static str, name: &str) -> VdpError {
    VdpError::UnknownName {
        kind,
        name: name.to_string(),
    }
}
