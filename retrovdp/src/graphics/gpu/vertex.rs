//! Quad vertices for draw commands
//!
//! Every command becomes six vertices (two triangles) covering its
//! destination rectangle. All command parameters ride along as flat
//! attributes so the fragment stage can resolve pixels without any other
//! per-command storage.

use bytemuck::{Pod, Zeroable};

use crate::graphics::command_buffer::{MapCommand, ObjCommand, TransformRef};
use crate::graphics::frame_plan::Draw;

pub const FLAG_MAP: u32 = 1 << 0;
pub const FLAG_HI_COLOR: u32 = 1 << 1;
pub const FLAG_WRAP: u32 = 1 << 2;
pub const FLAG_TRANSFORM: u32 = 1 << 3;
pub const FLAG_PER_LINE: u32 = 1 << 4;
pub const FLAG_FLIP_H: u32 = 1 << 5;
pub const FLAG_FLIP_V: u32 = 1 << 6;
pub const FLAG_TRANSPARENT: u32 = 1 << 7;

/// Vertices emitted per command.
pub const VERTICES_PER_QUAD: u32 = 6;

const ATTRIBUTES: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
    0 => Float32x2,
    1 => Uint32,
    2 => Sint32x4,
    3 => Sint32x4,
    4 => Sint32x4,
    5 => Sint32x2,
    6 => Uint32x4,
];

/// One quad corner. Matches `VertexInput` in `compositor.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CommandVertex {
    /// Corner position in screen pixels
    pub pos: [f32; 2],
    pub flags: u32,
    /// Destination rectangle (x, y, w, h)
    pub dest: [i32; 4],
    /// Map window in cells, or sprite source in pixels
    pub source: [i32; 4],
    /// Tileset x, y, tiles per row, `tile_w | tile_h << 16`
    pub tileset: [i32; 4],
    pub scroll: [i32; 2],
    /// Palette row, transform row, priority, unused
    pub extra: [u32; 4],
}

impl CommandVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }

    fn for_map(cmd: &MapCommand, transparent: bool) -> Self {
        let mut flags = FLAG_MAP;
        if cmd.tileset.hi_color {
            flags |= FLAG_HI_COLOR;
        }
        if cmd.wrap {
            flags |= FLAG_WRAP;
        }
        let transform_row = match cmd.transform {
            TransformRef::None => 0,
            TransformRef::Affine { row } => {
                flags |= FLAG_TRANSFORM;
                row
            }
            TransformRef::PerLine { row } => {
                flags |= FLAG_TRANSFORM | FLAG_PER_LINE;
                row
            }
        };
        if transparent {
            flags |= FLAG_TRANSPARENT;
        }

        Self {
            pos: [0.0; 2],
            flags,
            dest: rect(cmd.window.x, cmd.window.y, cmd.window.w, cmd.window.h),
            source: [
                cmd.map_x as i32,
                cmd.map_y as i32,
                cmd.map_w as i32,
                cmd.map_h as i32,
            ],
            tileset: [
                cmd.tileset.x as i32,
                cmd.tileset.y as i32,
                cmd.tiles_per_row() as i32,
                ((cmd.tile_w & 0xFFFF) | ((cmd.tile_h & 0xFFFF) << 16)) as i32,
            ],
            scroll: [cmd.scroll_x, cmd.scroll_y],
            extra: [cmd.palette_row, transform_row, cmd.priority as u32, 0],
        }
    }

    fn for_obj(cmd: &ObjCommand, transparent: bool) -> Self {
        let mut flags = 0;
        if cmd.source.hi_color {
            flags |= FLAG_HI_COLOR;
        }
        if cmd.flip_h {
            flags |= FLAG_FLIP_H;
        }
        if cmd.flip_v {
            flags |= FLAG_FLIP_V;
        }
        if transparent {
            flags |= FLAG_TRANSPARENT;
        }

        Self {
            pos: [0.0; 2],
            flags,
            dest: rect(cmd.dest.x, cmd.dest.y, cmd.dest.w, cmd.dest.h),
            source: [
                cmd.source.x as i32,
                cmd.source.y as i32,
                cmd.source.w as i32,
                cmd.source.h as i32,
            ],
            tileset: [0; 4],
            scroll: [0; 2],
            extra: [cmd.palette_row, 0, cmd.priority as u32, 0],
        }
    }
}

fn rect(x: i32, y: i32, w: u32, h: u32) -> [i32; 4] {
    [x, y, w as i32, h as i32]
}

/// Append the six vertices of one draw.
pub fn push_quad(out: &mut Vec<CommandVertex>, draw: Draw<'_>, transparent: bool) {
    let template = match draw {
        Draw::Map(cmd) => CommandVertex::for_map(cmd, transparent),
        Draw::Obj(cmd) => CommandVertex::for_obj(cmd, transparent),
    };
    let [x, y, w, h] = template.dest;
    let (x0, y0) = (x as f32, y as f32);
    let (x1, y1) = (x0 + w as f32, y0 + h as f32);

    for pos in [
        [x0, y0],
        [x1, y0],
        [x0, y1],
        [x0, y1],
        [x1, y0],
        [x1, y1],
    ] {
        out.push(CommandVertex { pos, ..template });
    }
}
