//! Shared fixture: a small bundle with a sprite, a tileset and a 4x4 map.
#![allow(dead_code)]

use retrovdp::memory::{empty_cell, encode_cell, pack_low_color};
use retrovdp::{AssetBundle, Color, VdpConfig};
use retrovdp_shared::Manifest;

pub const SCREEN: u32 = 64;

const SPRITE_UNITS: usize = 64;

pub const MANIFEST: &str = r#"{
    "spriteMemory": { "width": 64, "height": 64 },
    "mapMemory": { "width": 32, "height": 32 },
    "paletteMemory": { "width": 16, "height": 8 },
    "sprites": {
        "hero": { "x": 0, "y": 0, "w": 16, "h": 16, "pal": "main" },
        "gem": { "x": 32, "y": 0, "w": 8, "h": 8, "hiColor": true, "pal": "alt" },
        "tiles": { "x": 0, "y": 32, "w": 32, "h": 8, "tileW": 8, "tileH": 8 }
    },
    "maps": {
        "level": { "x": 0, "y": 0, "w": 4, "h": 4, "tileset": "tiles" },
        "blank": { "x": 8, "y": 8, "w": 4, "h": 4, "tileset": "tiles" }
    },
    "palettes": {
        "main": { "y": 0, "size": 2 },
        "alt": { "y": 2, "size": 4 }
    }
}"#;

/// Palette memory contents: a distinct opaque color per entry.
pub fn color(row: u32, index: u32) -> Color {
    Color::from_rgba((index * 16) as u8, (row * 32) as u8, (255 - index * 8) as u8, 255)
}

pub fn backdrop() -> Color {
    color(0, 0)
}

/// Diagonal bands of indices 1..=3.
pub fn hero_index(x: u32, y: u32) -> u8 {
    1 + ((x / 4 + y / 4) % 3) as u8
}

/// Tile 0 is solid 1, tile 1 solid 2, tile 2 a 3/4 checkerboard and tile 3
/// fully transparent.
pub fn tile_index(tile: u32, x: u32, y: u32) -> u8 {
    match tile {
        0 => 1,
        1 => 2,
        2 => {
            if (x + y) % 2 == 0 {
                3
            } else {
                4
            }
        }
        _ => 0,
    }
}

/// Tile and palette bank of a "level" cell.
pub fn level_cell(col: u32, row: u32) -> (u32, u32) {
    ((col + row) % 4, row % 2)
}

/// Expected color of a full-screen "level" layer at a screen pixel.
pub fn level_pixel(x: i32, y: i32) -> Color {
    let (x, y) = (x.rem_euclid(32) as u32, y.rem_euclid(32) as u32);
    let (tile, bank) = level_cell(x / 8, y / 8);
    match tile_index(tile, x % 8, y % 8) {
        0 => backdrop(),
        index => color(bank, index as u32),
    }
}

pub fn bundle() -> AssetBundle {
    let manifest = Manifest::from_json(MANIFEST).unwrap();

    let mut sprites = vec![0u8; SPRITE_UNITS * 64];
    for y in 0..16u32 {
        let row: Vec<u8> = (0..16).map(|x| hero_index(x, y)).collect();
        let start = y as usize * SPRITE_UNITS;
        sprites[start..start + 8].copy_from_slice(&pack_low_color(&row));
    }
    for y in 0..8u32 {
        for x in 0..8u32 {
            sprites[y as usize * SPRITE_UNITS + 32 + x as usize] = ((x + y) % 15 + 1) as u8;
        }
    }
    for y in 0..8u32 {
        let row: Vec<u8> = (0..32).map(|x| tile_index(x / 8, x % 8, y)).collect();
        let start = (32 + y) as usize * SPRITE_UNITS;
        sprites[start..start + 16].copy_from_slice(&pack_low_color(&row));
    }

    let mut maps = vec![empty_cell(); 32 * 32];
    for row in 0..4u32 {
        for col in 0..4u32 {
            let (tile, bank) = level_cell(col, row);
            maps[(row * 32 + col) as usize] = encode_cell(tile as u16, bank as u16);
        }
    }

    let palettes = (0..16 * 8).map(|i| color(i / 16, i % 16).to_u32()).collect();

    AssetBundle::from_parts(manifest, sprites, maps, palettes).unwrap()
}

pub fn config() -> VdpConfig {
    let mut config = VdpConfig::default();
    config.screen.width = SCREEN;
    config.screen.height = SCREEN;
    config
}
