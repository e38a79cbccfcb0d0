//! Asset manifest schema.
//!
//! The offline converter emits one `manifest.json` next to the three memory
//! images. It names rectangular windows into each memory so game code can
//! refer to sprites, maps and palettes by name.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Dimensions of one memory bank, in storage units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankGeometry {
    pub width: u32,
    pub height: u32,
}

/// Sprite (or tileset) window into sprite memory.
///
/// `x` and `w` are logical pixels. Low-color sprites pack two pixels per
/// storage byte, so their `x` and `w` must be even.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteEntryDesc {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_h: Option<u32>,
    #[serde(default)]
    pub hi_color: bool,
    /// Default palette name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pal: Option<String>,
}

/// Map window into map memory, in cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapEntryDesc {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    /// Name of the sprite entry holding the tiles
    pub tileset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pal: Option<String>,
}

/// Palette window into palette memory, in rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntryDesc {
    pub y: u32,
    pub size: u32,
}

/// Root of `manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub sprite_memory: BankGeometry,
    pub map_memory: BankGeometry,
    pub palette_memory: BankGeometry,
    #[serde(default)]
    pub sprites: HashMap<String, SpriteEntryDesc>,
    #[serde(default)]
    pub maps: HashMap<String, MapEntryDesc>,
    #[serde(default)]
    pub palettes: HashMap<String, PaletteEntryDesc>,
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "spriteMemory": { "width": 64, "height": 32 },
        "mapMemory": { "width": 16, "height": 16 },
        "paletteMemory": { "width": 16, "height": 8 },
        "sprites": {
            "hero": { "x": 0, "y": 0, "w": 16, "h": 16, "pal": "main" },
            "tiles": { "x": 16, "y": 0, "w": 32, "h": 8, "tileW": 8, "tileH": 8, "hiColor": true }
        },
        "maps": {
            "level1": { "x": 0, "y": 0, "w": 8, "h": 8, "tileset": "tiles" }
        },
        "palettes": {
            "main": { "y": 0, "size": 4 }
        }
    }"#;

    #[test]
    fn parses_camel_case_manifest() {
        let manifest = Manifest::from_json(SAMPLE).unwrap();
        assert_eq!(manifest.sprite_memory, BankGeometry { width: 64, height: 32 });

        let tiles = &manifest.sprites["tiles"];
        assert_eq!(tiles.tile_w, Some(8));
        assert!(tiles.hi_color);

        let hero = &manifest.sprites["hero"];
        assert!(!hero.hi_color);
        assert_eq!(hero.pal.as_deref(), Some("main"));

        assert_eq!(manifest.maps["level1"].tileset, "tiles");
        assert_eq!(manifest.palettes["main"].size, 4);
    }

    #[test]
    fn serializes_back_to_equivalent_json() {
        let manifest = Manifest::from_json(SAMPLE).unwrap();
        let json = manifest.to_json().unwrap();
        assert_eq!(Manifest::from_json(&json).unwrap(), manifest);
    }

    #[test]
    fn missing_bank_geometry_is_an_error() {
        assert!(Manifest::from_json(r#"{ "sprites": {} }"#).is_err());
    }
}
