use glam::{Affine2, Vec2};
use retrovdp_shared::Color;

use super::*;
use crate::graphics::command_buffer::{CommandBuffers, PixelSource};
use crate::graphics::ScreenRect;
use crate::graphics::line_transform::encode_affine;
use crate::graphics::transparency::{BlendEffect, BlendOp, FadeConfig};
use crate::memory::{MemoryKind, Rect, ShadowTexture, empty_cell, encode_cell};

const SCREEN: u32 = 32;
const PALETTE_WIDTH: u32 = 16;

const BACKDROP: Color = Color(0xFF40_2010);
const RED: Color = Color(0xFF00_00FF);
const GREEN: Color = Color(0xFF00_FF00);
const BLUE: Color = Color(0xFFFF_0000);

fn memory() -> VideoMemory {
    let sprites = ShadowTexture::new(MemoryKind::Sprite, 64, 32, 4, vec![0u8; 64 * 32]).unwrap();
    let maps = ShadowTexture::new(MemoryKind::Map, 16, 16, 1, vec![empty_cell(); 16 * 16]).unwrap();
    let mut palette = vec![0u32; (PALETTE_WIDTH * 8) as usize];
    palette[0] = BACKDROP.to_u32();
    let palettes = ShadowTexture::new(MemoryKind::Palette, PALETTE_WIDTH, 8, 1, palette).unwrap();
    let mut memory = VideoMemory::new(sprites, maps, palettes, SCREEN + 8).unwrap();

    let set = |memory: &mut VideoMemory, row: u32, index: u32, color: Color| {
        memory
            .write(MemoryKind::Palette, Rect::new(index, row, 1, 1), &[color.to_u32()])
            .unwrap();
    };
    set(&mut memory, 0, 1, RED);
    set(&mut memory, 0, 2, GREEN);
    set(&mut memory, 1, 2, BLUE);
    set(&mut memory, 2, 3, RED);
    set(&mut memory, 3, 3, GREEN);
    memory
}

/// Fill a low color sprite-memory block with one index.
fn fill_sprite(memory: &mut VideoMemory, x: u32, y: u32, w: u32, h: u32, index: u8) {
    let byte = index | (index << 4);
    let units = w / 2;
    memory
        .write(
            MemoryKind::Sprite,
            Rect::new(x / 2, y, units, h),
            &vec![byte; (units * h) as usize],
        )
        .unwrap();
}

fn obj(x: i32, y: i32, size: u32, palette_row: u32, priority: u8) -> ObjCommand {
    ObjCommand {
        source: PixelSource {
            x: 0,
            y: 0,
            w: size,
            h: size,
            hi_color: false,
        },
        dest: ScreenRect::new(x, y, size, size),
        palette_row,
        flip_h: false,
        flip_v: false,
        priority,
    }
}

/// 2x2 map of 8x8 tiles; tileset at sprite pixels (0, 16), tile 0 uses
/// index 1 and tile 1 index 2.
fn map_memory() -> VideoMemory {
    let mut memory = memory();
    fill_sprite(&mut memory, 0, 16, 8, 8, 1);
    fill_sprite(&mut memory, 8, 16, 8, 8, 2);
    memory
        .write(
            MemoryKind::Map,
            Rect::new(0, 0, 2, 2),
            &[encode_cell(0, 0), encode_cell(1, 0), empty_cell(), encode_cell(1, 1)],
        )
        .unwrap();
    memory
}

fn map(priority: u8) -> MapCommand {
    MapCommand {
        map_x: 0,
        map_y: 0,
        map_w: 2,
        map_h: 2,
        tileset: PixelSource {
            x: 0,
            y: 16,
            w: 16,
            h: 8,
            hi_color: false,
        },
        tile_w: 8,
        tile_h: 8,
        palette_row: 0,
        window: ScreenRect::new(0, 0, 16, 16),
        scroll_x: 0,
        scroll_y: 0,
        wrap: false,
        priority,
        transform: TransformRef::None,
    }
}

fn buffers() -> CommandBuffers {
    CommandBuffers::new(4, 4, 16, 16, 4)
}

fn render(
    memory: &mut VideoMemory,
    buffers: &CommandBuffers,
    context: &RenderContext,
) -> Framebuffer {
    let plan = FramePlan::build(buffers, 16, 512);
    let mut out = Framebuffer::new(SCREEN, SCREEN);
    CpuCompositor::new()
        .composite(memory, &plan, context, &mut out)
        .unwrap();
    out
}

fn context() -> RenderContext {
    RenderContext::new(SCREEN, SCREEN)
}

#[test]
fn empty_frame_shows_backdrop() {
    let mut memory = memory();
    let out = render(&mut memory, &buffers(), &context());
    assert!(out.pixels().iter().all(|p| *p == BACKDROP.to_u32()));
}

#[test]
fn sprite_reads_its_palette_row() {
    let mut memory = memory();
    fill_sprite(&mut memory, 0, 0, 16, 16, 3);
    let mut buffers = buffers();
    buffers.push_sprite(obj(10, 10, 16, 2, 0), false);

    let out = render(&mut memory, &buffers, &context());
    assert_eq!(out.pixel(18, 18), RED);
    assert_eq!(out.pixel(10, 10), RED);
    assert_eq!(out.pixel(25, 25), RED);
    assert_eq!(out.pixel(9, 9), BACKDROP);
    assert_eq!(out.pixel(26, 18), BACKDROP);
}

#[test]
fn index_zero_is_transparent() {
    let mut memory = memory();
    // Only the left half of the sprite is set
    fill_sprite(&mut memory, 0, 0, 8, 16, 3);
    let mut buffers = buffers();
    buffers.push_sprite(obj(0, 0, 16, 2, 0), false);

    let out = render(&mut memory, &buffers, &context());
    assert_eq!(out.pixel(7, 0), RED);
    assert_eq!(out.pixel(8, 0), BACKDROP);
}

#[test]
fn higher_priority_wins_regardless_of_order() {
    let mut memory = memory();
    fill_sprite(&mut memory, 0, 0, 16, 16, 3);
    let mut buffers = buffers();
    buffers.push_sprite(obj(0, 0, 16, 3, 9), false);
    buffers.push_sprite(obj(4, 4, 16, 2, 1), false);

    let out = render(&mut memory, &buffers, &context());
    assert_eq!(out.pixel(8, 8), GREEN);
    assert_eq!(out.pixel(18, 18), RED);
}

#[test]
fn later_submission_wins_ties() {
    let mut memory = memory();
    fill_sprite(&mut memory, 0, 0, 16, 16, 3);
    let mut buffers = buffers();
    buffers.push_sprite(obj(0, 0, 16, 3, 5), false);
    buffers.push_sprite(obj(4, 4, 16, 2, 5), false);

    let out = render(&mut memory, &buffers, &context());
    assert_eq!(out.pixel(8, 8), RED);
    assert_eq!(out.pixel(1, 1), GREEN);
}

#[test]
fn map_resolves_tiles_and_banks() {
    let mut memory = map_memory();
    let mut buffers = buffers();
    buffers.push_background(map(0), false);

    let out = render(&mut memory, &buffers, &context());
    assert_eq!(out.pixel(0, 0), RED);
    assert_eq!(out.pixel(8, 0), GREEN);
    assert_eq!(out.pixel(0, 8), BACKDROP);
    assert_eq!(out.pixel(8, 8), BLUE);
    // Outside the window
    assert_eq!(out.pixel(16, 0), BACKDROP);
}

#[test]
fn map_scroll_wraps() {
    let mut memory = map_memory();
    let mut buffers = buffers();
    let mut cmd = map(0);
    cmd.scroll_x = 8;
    cmd.wrap = true;
    buffers.push_background(cmd, false);

    let out = render(&mut memory, &buffers, &context());
    assert_eq!(out.pixel(0, 0), GREEN);
    assert_eq!(out.pixel(8, 0), RED);
}

#[test]
fn map_without_wrap_clips_scrolled_area() {
    let mut memory = map_memory();
    let mut buffers = buffers();
    let mut cmd = map(0);
    cmd.scroll_x = 8;
    buffers.push_background(cmd, false);

    let out = render(&mut memory, &buffers, &context());
    assert_eq!(out.pixel(0, 0), GREEN);
    assert_eq!(out.pixel(8, 0), BACKDROP);
}

#[test]
fn sprite_beats_background_of_equal_priority() {
    let mut memory = map_memory();
    fill_sprite(&mut memory, 0, 0, 16, 16, 3);
    let mut buffers = buffers();
    buffers.push_background(map(4), false);
    buffers.push_sprite(obj(0, 0, 16, 3, 4), false);

    let out = render(&mut memory, &buffers, &context());
    assert_eq!(out.pixel(0, 0), GREEN);

    let mut buffers = self::buffers();
    buffers.push_background(map(5), false);
    buffers.push_sprite(obj(0, 0, 16, 3, 4), false);
    let out = render(&mut memory, &buffers, &context());
    assert_eq!(out.pixel(0, 0), RED);
}

#[test]
fn affine_transform_shifts_source() {
    let mut memory = map_memory();
    let row = SCREEN;
    let shift = Affine2::from_translation(Vec2::new(8.0, 0.0));
    memory
        .write(MemoryKind::Other, Rect::new(0, row, 8, 1), &encode_affine(&shift))
        .unwrap();
    let mut buffers = buffers();
    let mut cmd = map(0);
    cmd.transform = TransformRef::Affine { row };
    buffers.push_background(cmd, false);

    let out = render(&mut memory, &buffers, &context());
    assert_eq!(out.pixel(0, 0), GREEN);
    assert_eq!(out.pixel(0, 8), BLUE);
}

#[test]
fn per_line_transform_uses_one_row_per_line() {
    let mut memory = map_memory();
    let row = SCREEN;
    // Line 0 shifted by a tile, line 1 plain
    let shifted = encode_affine(&Affine2::from_translation(Vec2::new(8.0, 0.0)));
    let plain = encode_affine(&Affine2::from_translation(Vec2::new(0.0, 1.0)));
    let mut rows = shifted.to_vec();
    rows.extend_from_slice(&plain);
    memory
        .write(MemoryKind::Other, Rect::new(0, row, 8, 2), &rows)
        .unwrap();
    let mut buffers = buffers();
    let mut cmd = map(0);
    cmd.window = ScreenRect::new(0, 0, 16, 2);
    cmd.transform = TransformRef::PerLine { row };
    buffers.push_background(cmd, false);

    let out = render(&mut memory, &buffers, &context());
    assert_eq!(out.pixel(0, 0), GREEN);
    assert_eq!(out.pixel(0, 1), RED);
}

#[test]
fn color_add_with_black_source_is_a_no_op() {
    let mut memory = memory();
    fill_sprite(&mut memory, 0, 0, 16, 16, 3);
    let mut buffers = buffers();
    buffers.push_sprite(obj(0, 0, 16, 2, 0), true);
    let mut context = context();
    context.obj_transparency = TransparencyConfig {
        effect: BlendEffect::Color,
        op: BlendOp::Add,
        blend_src: Color::BLACK,
        blend_dst: Color::WHITE,
    };

    let out = render(&mut memory, &buffers, &context);
    assert!(out.pixels().iter().all(|p| *p == BACKDROP.to_u32()));
}

#[test]
fn transparent_sprite_adds_onto_opaque() {
    let mut memory = memory();
    fill_sprite(&mut memory, 0, 0, 16, 16, 3);
    let mut buffers = buffers();
    buffers.push_sprite(obj(0, 0, 16, 2, 0), false);
    buffers.push_sprite(obj(0, 0, 16, 3, 1), true);
    let mut context = context();
    context.obj_transparency = TransparencyConfig {
        effect: BlendEffect::Color,
        op: BlendOp::Add,
        blend_src: Color::WHITE,
        blend_dst: Color::WHITE,
    };

    let out = render(&mut memory, &buffers, &context);
    assert_eq!(out.pixel(0, 0), Color::from_rgba(255, 255, 0, 255));
}

#[test]
fn transparent_pass_does_not_write_depth() {
    let mut memory = memory();
    fill_sprite(&mut memory, 0, 0, 16, 16, 3);
    let mut buffers = buffers();
    buffers.push_sprite(obj(0, 0, 16, 3, 5), true);
    buffers.push_sprite(obj(0, 0, 16, 2, 5), true);

    // Effect none: the later draw of equal priority still lands
    let out = render(&mut memory, &buffers, &context());
    assert_eq!(out.pixel(0, 0), RED);
}

#[test]
fn transparent_layers_respect_opaque_depth() {
    let mut memory = memory();
    fill_sprite(&mut memory, 0, 0, 16, 16, 3);
    let mut buffers = buffers();
    buffers.push_sprite(obj(0, 0, 16, 2, 9), false);
    buffers.push_sprite(obj(0, 0, 16, 3, 1), true);

    let out = render(&mut memory, &buffers, &context());
    assert_eq!(out.pixel(0, 0), RED);
}

#[test]
fn full_fade_covers_everything() {
    let mut memory = memory();
    fill_sprite(&mut memory, 0, 0, 16, 16, 3);
    let mut buffers = buffers();
    buffers.push_sprite(obj(0, 0, 16, 2, 0), false);
    let mut context = context();
    context.fade = FadeConfig::new(Color::WHITE, 1.0);

    let out = render(&mut memory, &buffers, &context);
    assert!(out.pixels().iter().all(|p| *p == Color::WHITE.to_u32()));
}

#[test]
fn color_swap_replaces_entry_per_line() {
    let mut memory = memory();
    fill_sprite(&mut memory, 0, 0, 16, 16, 3);
    let mut context = context();
    context.swaps[1] = Some(2 * PALETTE_WIDTH + 3);
    context.swap_base_row = 0;
    let colors: Vec<u32> = (0..SCREEN)
        .map(|y| if y < 4 { BLUE.to_u32() } else { GREEN.to_u32() })
        .collect();
    memory
        .write(MemoryKind::Other, Rect::new(1, 0, 1, SCREEN), &colors)
        .unwrap();

    let mut buffers = buffers();
    buffers.push_sprite(obj(0, 0, 16, 2, 0), false);
    let out = render(&mut memory, &buffers, &context);
    assert_eq!(out.pixel(0, 3), BLUE);
    assert_eq!(out.pixel(0, 4), GREEN);
}

#[test]
fn sprite_flips_and_scales() {
    let mut memory = memory();
    // Only the two left columns are set
    fill_sprite(&mut memory, 0, 0, 2, 16, 3);
    let mut buffers = buffers();
    let mut cmd = obj(0, 0, 16, 2, 0);
    cmd.flip_h = true;
    cmd.dest = ScreenRect::new(0, 0, 32, 32);
    buffers.push_sprite(cmd, false);

    let out = render(&mut memory, &buffers, &context());
    assert_eq!(out.pixel(31, 0), RED);
    assert_eq!(out.pixel(28, 0), RED);
    assert_eq!(out.pixel(27, 0), BACKDROP);
}

#[test]
fn empty_sprite_source_draws_nothing() {
    let mut memory = memory();
    let mut buffers = buffers();
    let mut cmd = obj(0, 0, 8, 0, 0);
    cmd.source.w = 0;
    cmd.flip_h = true;
    cmd.flip_v = true;
    buffers.push_sprite(cmd, false);

    let out = render(&mut memory, &buffers, &context());
    assert!(out.pixels().iter().all(|&p| p == BACKDROP.to_u32()));
}
