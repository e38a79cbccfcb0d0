use glam::Affine2;
use retrovdp_shared::{Color, Manifest};

use super::*;
use crate::graphics::{LayerClass, LineTransform, RenderContext};
use crate::memory::VideoMemory;

const SCREEN: u32 = 32;
const BACKDROP: Color = Color(0xFF10_2030);
const RED: Color = Color(0xFF00_00FF);
const GREEN: Color = Color(0xFF00_FF00);

const MANIFEST: &str = r#"{
    "spriteMemory": { "width": 64, "height": 32 },
    "mapMemory": { "width": 16, "height": 16 },
    "paletteMemory": { "width": 16, "height": 8 },
    "sprites": {
        "hero": { "x": 0, "y": 0, "w": 16, "h": 16, "pal": "main" },
        "tiles": { "x": 64, "y": 16, "w": 16, "h": 8, "tileW": 8, "tileH": 8 }
    },
    "maps": {
        "level": { "x": 0, "y": 0, "w": 2, "h": 2, "tileset": "tiles" },
        "blank": { "x": 4, "y": 4, "w": 4, "h": 4, "tileset": "tiles" }
    },
    "palettes": {
        "main": { "y": 0, "size": 2 },
        "alt": { "y": 2, "size": 2 }
    }
}"#;

fn bundle() -> AssetBundle {
    let manifest = Manifest::from_json(MANIFEST).unwrap();
    let mut palettes = vec![0u32; 16 * 8];
    palettes[0] = BACKDROP.to_u32();
    palettes[5] = GREEN.to_u32();
    palettes[2 * 16 + 5] = RED.to_u32();
    let maps = vec![crate::memory::empty_cell(); 16 * 16];
    AssetBundle::from_parts(manifest, vec![0u8; 64 * 32], maps, palettes).unwrap()
}

fn config() -> VdpConfig {
    let mut config = VdpConfig::default();
    config.screen.width = SCREEN;
    config.screen.height = SCREEN;
    config.buffers.transform_rows = 40;
    config
}

fn vdp() -> Vdp {
    let mut vdp = Vdp::new(config(), bundle()).unwrap();
    let hero = vdp.sprite("hero").unwrap().clone();
    vdp.write_sprite_pixels(&hero, &[5; 16 * 16]).unwrap();
    vdp
}

fn render(vdp: &mut Vdp, draw: impl FnOnce(&mut Vdp)) {
    vdp.start_frame().unwrap();
    draw(vdp);
    vdp.end_frame().unwrap();
}

#[test]
fn sprite_uses_palette_override() {
    let mut vdp = vdp();
    let hero = vdp.sprite("hero").unwrap().clone();
    let alt = vdp.palette("alt").unwrap().clone();

    render(&mut vdp, |vdp| {
        let options = ObjOptions {
            palette: Some(alt),
            ..Default::default()
        };
        assert!(vdp.draw_sprite(&hero, 10, 10, &options).unwrap());
    });

    assert_eq!(vdp.frame().pixel(18, 18), RED);
    assert_eq!(vdp.frame().pixel(9, 18), BACKDROP);
    assert_eq!(vdp.frame().pixel(26, 18), BACKDROP);
}

#[test]
fn sprite_defaults_to_its_manifest_palette() {
    let mut vdp = vdp();
    let hero = vdp.sprite("hero").unwrap().clone();

    render(&mut vdp, |vdp| {
        vdp.draw_sprite(&hero, 0, 0, &ObjOptions::default()).unwrap();
    });

    assert_eq!(vdp.frame().pixel(4, 4), GREEN);
}

#[test]
fn empty_map_keeps_backdrop() {
    let mut vdp = vdp();
    let blank = vdp.map("blank").unwrap().clone();

    render(&mut vdp, |vdp| {
        assert!(vdp.draw_background(&blank, &BgOptions::default()).unwrap());
    });

    assert!(vdp.frame().pixels().iter().all(|&p| p == BACKDROP.to_u32()));
}

#[test]
fn unknown_names_are_errors() {
    let vdp = vdp();
    assert!(matches!(
        vdp.sprite("nobody"),
        Err(VdpError::UnknownName { kind: "sprite", .. })
    ));
    assert!(vdp.map("nowhere").is_err());
    assert!(vdp.palette("none").is_err());
}

#[test]
fn priority_above_127_is_rejected() {
    let mut vdp = vdp();
    let hero = vdp.sprite("hero").unwrap().clone();
    let options = ObjOptions {
        priority: 128,
        ..Default::default()
    };
    assert_eq!(
        vdp.draw_sprite(&hero, 0, 0, &options),
        Err(VdpError::InvalidPriority(128))
    );
}

#[test]
fn sprite_overflow_is_counted() {
    let mut vdp = vdp();
    let hero = vdp.sprite("hero").unwrap().clone();

    render(&mut vdp, |vdp| {
        let accepted = (0..300)
            .filter(|_| vdp.draw_sprite(&hero, 0, 0, &ObjOptions::default()).unwrap())
            .count();
        assert_eq!(accepted, 256);
    });

    let stats = vdp.get_and_reset_stats();
    assert_eq!(stats.frames, 1);
    assert_eq!(stats.peak(LayerClass::OpaqueObj), 256);
    assert_eq!(stats.overflow(LayerClass::OpaqueObj), 44);
    assert_eq!(vdp.get_and_reset_stats(), FrameStats::default());
}

#[test]
fn short_line_transform_is_rejected() {
    let mut vdp = vdp();
    let level = vdp.map("level").unwrap().clone();
    let options = BgOptions {
        transform: LayerTransform::PerLine(LineTransform::horizontal_offsets(&[0.0; 8])),
        ..Default::default()
    };
    assert_eq!(
        vdp.draw_background(&level, &options),
        Err(VdpError::LineTransformTooShort {
            lines: 8,
            height: SCREEN
        })
    );
}

#[test]
fn transform_rows_run_out() {
    let mut vdp = vdp();
    let level = vdp.map("level").unwrap().clone();
    let per_line = BgOptions {
        transform: LayerTransform::PerLine(LineTransform::horizontal_offsets(&[0.0; 32])),
        ..Default::default()
    };
    let affine = BgOptions {
        transform: LayerTransform::Affine(Affine2::IDENTITY),
        ..Default::default()
    };

    render(&mut vdp, |vdp| {
        // 32 of 40 rows
        assert!(vdp.draw_background(&level, &per_line).unwrap());
        assert!(!vdp.draw_background(&level, &per_line).unwrap());
        assert!(vdp.draw_background(&level, &affine).unwrap());
    });
    assert_eq!(vdp.get_and_reset_stats().transforms_dropped, 1);

    // Rows are released at frame end
    render(&mut vdp, |vdp| {
        assert!(vdp.draw_background(&level, &per_line).unwrap());
    });
}

#[test]
fn color_swap_changes_lines() {
    let mut vdp = vdp();
    let hero = vdp.sprite("hero").unwrap().clone();
    let colors = (0..SCREEN)
        .map(|y| if y < 15 { RED } else { BLUE_GREEN })
        .collect();
    vdp.configure_color_swap(
        2,
        Some(ColorSwap {
            palette_row: 0,
            index: 5,
            colors,
        }),
    )
    .unwrap();

    render(&mut vdp, |vdp| {
        vdp.draw_sprite(&hero, 10, 10, &ObjOptions::default()).unwrap();
    });
    assert_eq!(vdp.frame().pixel(18, 12), RED);
    assert_eq!(vdp.frame().pixel(18, 18), BLUE_GREEN);

    vdp.configure_color_swap(2, None).unwrap();
    render(&mut vdp, |vdp| {
        vdp.draw_sprite(&hero, 10, 10, &ObjOptions::default()).unwrap();
    });
    assert_eq!(vdp.frame().pixel(18, 12), GREEN);
}

const BLUE_GREEN: Color = Color(0xFFFF_FF00);

#[test]
fn color_swap_validates_slot_and_entry() {
    let mut vdp = vdp();
    assert_eq!(
        vdp.configure_color_swap(4, None),
        Err(VdpError::InvalidColorSwapSlot(4))
    );
    assert!(matches!(
        vdp.configure_color_swap(0, Some(ColorSwap::solid(8, 1, RED))),
        Err(VdpError::OutOfBounds { .. })
    ));
}

#[test]
fn sprite_pixels_round_trip_and_rom_is_kept() {
    let mut vdp = vdp();
    let hero = vdp.sprite("hero").unwrap().clone();
    let pixels: Vec<u8> = (0..16 * 16).map(|i| (i % 16) as u8).collect();
    vdp.write_sprite_pixels(&hero, &pixels).unwrap();

    assert_eq!(vdp.read_sprite_pixels(&hero, MemorySource::Current).unwrap(), pixels);
    assert_eq!(
        vdp.read_sprite_pixels(&hero, MemorySource::Rom).unwrap(),
        vec![0u8; 16 * 16]
    );
    // Two pixels per storage byte
    assert_eq!(vdp.read_sprite(&hero, MemorySource::Current).unwrap().len(), 8 * 16);
}

#[test]
fn sprite_pixel_count_must_match() {
    let mut vdp = vdp();
    let hero = vdp.sprite("hero").unwrap().clone();
    assert_eq!(
        vdp.write_sprite_pixels(&hero, &[1; 10]),
        Err(VdpError::BufferSizeMismatch {
            expected: 256,
            actual: 10
        })
    );
}

#[test]
fn palette_and_map_helpers() {
    let mut vdp = vdp();
    let alt = vdp.palette("alt").unwrap().clone();
    let level = vdp.map("level").unwrap().clone();

    let mut colors = vdp.read_palette(&alt, MemorySource::Current).unwrap();
    assert_eq!(colors.len(), 32);
    assert_eq!(colors[5], RED.to_u32());
    colors[5] = GREEN.to_u32();
    vdp.write_palette(&alt, &colors).unwrap();
    assert_eq!(vdp.read_palette(&alt, MemorySource::Current).unwrap()[5], GREEN.to_u32());
    assert_eq!(vdp.read_palette(&alt, MemorySource::Rom).unwrap()[5], RED.to_u32());

    let cells = [1u16, 2, 3, 4];
    vdp.write_map(&level, &cells).unwrap();
    assert_eq!(vdp.read_map(&level, MemorySource::Current).unwrap(), cells);
}

#[test]
fn generic_memory_access_checks_element_type() {
    let mut vdp = vdp();
    let mut out = [0u8; 4];
    assert!(matches!(
        vdp.read_memory(MemoryKind::Palette, Rect::new(0, 0, 4, 1), MemorySource::Current, &mut out),
        Err(VdpError::ElementTypeMismatch { .. })
    ));
    vdp.write_memory(MemoryKind::Map, Rect::new(0, 0, 1, 1), &[7u16])
        .unwrap();
    let mut cell = [0u16; 1];
    vdp.read_memory(MemoryKind::Map, Rect::new(0, 0, 1, 1), MemorySource::Current, &mut cell)
        .unwrap();
    assert_eq!(cell, [7]);
}

#[test]
fn fade_applies_to_the_next_frame() {
    let mut vdp = vdp();
    vdp.configure_fade(Color(0xFF00_0000), 1.0);
    render(&mut vdp, |_| {});
    assert_eq!(vdp.frame().pixel(0, 0), Color(0xFF00_0000));
}

#[test]
fn frame_phases_must_alternate() {
    let mut vdp = vdp();
    assert!(vdp.end_frame().is_err());
    vdp.start_frame().unwrap();
    assert!(vdp.start_frame().is_err());
    vdp.end_frame().unwrap();
}

#[test]
fn empty_sprite_source_is_rejected() {
    let mut vdp = vdp();
    let sliver = vdp.sprite("hero").unwrap().offsetted(0, 0, 0, 16);
    let options = ObjOptions {
        size: Some((8, 8)),
        flip_h: true,
        ..Default::default()
    };

    vdp.start_frame().unwrap();
    assert!(matches!(
        vdp.draw_sprite(&sliver, 0, 0, &options),
        Err(VdpError::InvalidDescriptor(_))
    ));
    vdp.end_frame().unwrap();
    assert_eq!(vdp.frame().pixel(0, 0), BACKDROP);
}

#[test]
fn invalid_pacing_is_rejected_at_construction() {
    let mut config = config();
    config.pacing.tick_rate = 0.0;
    assert!(Vdp::new(config, bundle()).is_err());

    let mut config = self::config();
    config.screen.width = 0;
    assert!(Vdp::new(config, bundle()).is_err());
}

struct BrokenCompositor;

impl Compositor for BrokenCompositor {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn composite(
        &mut self,
        _memory: &mut VideoMemory,
        _plan: &FramePlan<'_>,
        _context: &RenderContext,
        _out: &mut Framebuffer,
    ) -> Result<()> {
        anyhow::bail!("device lost")
    }
}

#[test]
fn failed_composite_still_records_drops() {
    let mut vdp = Vdp::with_compositor(config(), bundle(), Box::new(BrokenCompositor)).unwrap();
    let hero = vdp.sprite("hero").unwrap().clone();

    vdp.start_frame().unwrap();
    for _ in 0..300 {
        vdp.draw_sprite(&hero, 0, 0, &ObjOptions::default()).unwrap();
    }
    assert!(vdp.end_frame().is_err());

    let stats = vdp.get_and_reset_stats();
    assert_eq!(stats.frames, 1);
    assert_eq!(stats.overflow(LayerClass::OpaqueObj), 44);

    // Buffers were still reset, so the next frame starts clean
    vdp.start_frame().unwrap();
    assert!(vdp.end_frame().is_err());
    assert_eq!(vdp.get_and_reset_stats().overflow(LayerClass::OpaqueObj), 0);
}
