//! Asset bundle loading.
//!
//! A bundle is a directory produced by the offline converter:
//!
//! ```text
//! manifest.json   names -> windows, bank geometry
//! sprites.bin     u8 storage units
//! maps.bin        u16 little-endian cells
//! palettes.bin    u32 little-endian colors (0xAABBGGRR)
//! ```

use std::path::Path;

use retrovdp_shared::{BankGeometry, Manifest};
use retrovdp_shared::constants::SPRITE_UNITS_PER_TEXEL;

use crate::descriptors::AssetRegistry;
use crate::error::AssetError;
use crate::memory::{MemoryKind, ShadowTexture, VideoMemory};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SPRITES_FILE: &str = "sprites.bin";
pub const MAPS_FILE: &str = "maps.bin";
pub const PALETTES_FILE: &str = "palettes.bin";

/// Decoded bank images plus their manifest.
#[derive(Debug, Clone)]
pub struct AssetBundle {
    pub manifest: Manifest,
    pub sprites: Vec<u8>,
    pub maps: Vec<u16>,
    pub palettes: Vec<u32>,
}

impl AssetBundle {
    /// Assemble a bundle from in-memory images, validating sizes.
    pub fn from_parts(
        manifest: Manifest,
        sprites: Vec<u8>,
        maps: Vec<u16>,
        palettes: Vec<u32>,
    ) -> Result<Self, AssetError> {
        let bundle = Self {
            manifest,
            sprites,
            maps,
            palettes,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    /// Load a bundle directory.
    pub fn load(dir: &Path) -> Result<Self, AssetError> {
        let manifest = Manifest::from_json(&read_string(&dir.join(MANIFEST_FILE))?)?;
        let sprites = read_bytes(&dir.join(SPRITES_FILE))?;
        let maps = decode_u16(MemoryKind::Map, &read_bytes(&dir.join(MAPS_FILE))?)?;
        let palettes = decode_u32(MemoryKind::Palette, &read_bytes(&dir.join(PALETTES_FILE))?)?;

        let bundle = Self::from_parts(manifest, sprites, maps, palettes)?;
        tracing::info!(
            "Loaded asset bundle {} ({} sprites, {} maps, {} palettes)",
            dir.display(),
            bundle.manifest.sprites.len(),
            bundle.manifest.maps.len(),
            bundle.manifest.palettes.len()
        );
        Ok(bundle)
    }

    /// Write the bundle back out as a directory.
    pub fn save(&self, dir: &Path) -> Result<(), AssetError> {
        std::fs::create_dir_all(dir).map_err(|source| io_error(dir, source))?;

        let manifest = self.manifest.to_json()?;
        write_file(&dir.join(MANIFEST_FILE), manifest.as_bytes())?;
        write_file(&dir.join(SPRITES_FILE), &self.sprites)?;
        let maps: Vec<u8> = self.maps.iter().flat_map(|c| c.to_le_bytes()).collect();
        write_file(&dir.join(MAPS_FILE), &maps)?;
        let palettes: Vec<u8> = self.palettes.iter().flat_map(|c| c.to_le_bytes()).collect();
        write_file(&dir.join(PALETTES_FILE), &palettes)?;
        Ok(())
    }

    /// Resolve every named descriptor.
    pub fn registry(&self) -> Result<AssetRegistry, AssetError> {
        AssetRegistry::from_manifest(&self.manifest)
    }

    /// Build video memory, with `other_rows` rows of scratch memory.
    pub fn into_memory(self, other_rows: u32) -> Result<VideoMemory, AssetError> {
        let m = &self.manifest;
        let sprites = ShadowTexture::new(
            MemoryKind::Sprite,
            m.sprite_memory.width,
            m.sprite_memory.height,
            SPRITE_UNITS_PER_TEXEL,
            self.sprites,
        )?;
        let maps = ShadowTexture::new(
            MemoryKind::Map,
            m.map_memory.width,
            m.map_memory.height,
            1,
            self.maps,
        )?;
        let palettes = ShadowTexture::new(
            MemoryKind::Palette,
            m.palette_memory.width,
            m.palette_memory.height,
            1,
            self.palettes,
        )?;
        VideoMemory::new(sprites, maps, palettes, other_rows)
    }

    fn validate(&self) -> Result<(), AssetError> {
        let m = &self.manifest;
        if m.sprite_memory.width % SPRITE_UNITS_PER_TEXEL != 0 {
            return Err(AssetError::InvalidGeometry {
                bank: MemoryKind::Sprite,
                reason: format!(
                    "width {} is not a multiple of {SPRITE_UNITS_PER_TEXEL}",
                    m.sprite_memory.width
                ),
            });
        }
        check_len(
            MemoryKind::Sprite,
            bank_units(MemoryKind::Sprite, m.sprite_memory)?,
            1,
            self.sprites.len(),
        )?;
        check_len(
            MemoryKind::Map,
            bank_units(MemoryKind::Map, m.map_memory)?,
            2,
            self.maps.len(),
        )?;
        check_len(
            MemoryKind::Palette,
            bank_units(MemoryKind::Palette, m.palette_memory)?,
            4,
            self.palettes.len(),
        )?;
        Ok(())
    }
}

/// Element count of a bank, rejecting geometry that cannot be addressed.
fn bank_units(bank: MemoryKind, geometry: BankGeometry) -> Result<usize, AssetError> {
    geometry
        .width
        .checked_mul(geometry.height)
        .and_then(|units| usize::try_from(units).ok())
        .ok_or_else(|| AssetError::InvalidGeometry {
            bank,
            reason: format!("{}x{} is too large", geometry.width, geometry.height),
        })
}

fn check_len(
    bank: MemoryKind,
    units: usize,
    unit_size: usize,
    actual: usize,
) -> Result<(), AssetError> {
    if units != actual {
        return Err(AssetError::SizeMismatch {
            bank,
            expected: units.saturating_mul(unit_size),
            actual: actual * unit_size,
        });
    }
    Ok(())
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, AssetError> {
    std::fs::read(path).map_err(|source| io_error(path, source))
}

fn read_string(path: &Path) -> Result<String, AssetError> {
    std::fs::read_to_string(path).map_err(|source| io_error(path, source))
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), AssetError> {
    std::fs::write(path, bytes).map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> AssetError {
    AssetError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn decode_u16(bank: MemoryKind, bytes: &[u8]) -> Result<Vec<u16>, AssetError> {
    if bytes.len() % 2 != 0 {
        return Err(AssetError::InvalidGeometry {
            bank,
            reason: format!("{} bytes is not a whole number of cells", bytes.len()),
        });
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect())
}

fn decode_u32(bank: MemoryKind, bytes: &[u8]) -> Result<Vec<u32>, AssetError> {
    if bytes.len() % 4 != 0 {
        return Err(AssetError::InvalidGeometry {
            bank,
            reason: format!("{} bytes is not a whole number of colors", bytes.len()),
        });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
