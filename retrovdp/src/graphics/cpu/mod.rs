//! Software compositor
//!
//! Walks the frame plan pass by pass and rasterizes every command directly
//! into the framebuffer, using an `i8` priority buffer for depth. The buffer
//! starts each frame at -1 (the backdrop) and a pixel is written only when
//! the command's priority is strictly greater than the stored value.

mod sampler;

use anyhow::Result;
use glam::Affine2;

use super::command_buffer::{MapCommand, ObjCommand, TransformRef};
use super::frame_plan::{Draw, FramePlan, PassKind};
use super::framebuffer::Framebuffer;
use super::render_context::RenderContext;
use super::transparency::TransparencyConfig;
use super::{Compositor, backdrop_color};
use crate::memory::VideoMemory;
use sampler::MemoryView;

/// Depth value of the backdrop.
const BACKDROP_DEPTH: i8 = -1;

/// How a pass writes pixels.
#[derive(Clone, Copy)]
enum WriteMode<'a> {
    /// Replace color and record depth
    Opaque,
    /// Blend with the framebuffer, depth untouched
    Transparent(&'a TransparencyConfig),
}

/// CPU rasterizer.
#[derive(Debug, Default)]
pub struct CpuCompositor {
    depth: Vec<i8>,
}

impl CpuCompositor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Compositor for CpuCompositor {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn composite(
        &mut self,
        memory: &mut VideoMemory,
        plan: &FramePlan<'_>,
        context: &RenderContext,
        out: &mut Framebuffer,
    ) -> Result<()> {
        let view = MemoryView::new(memory)?;
        let (width, height) = (out.width(), out.height());

        out.clear(backdrop_color(memory));
        self.depth.clear();
        self.depth.resize((width * height) as usize, BACKDROP_DEPTH);

        let mut target = Target {
            pixels: out,
            depth: &mut self.depth,
            width,
            height,
        };

        for kind in PassKind::ORDER {
            let mode = match kind {
                PassKind::OpaqueObj | PassKind::OpaqueBg => WriteMode::Opaque,
                PassKind::TransparentBg => WriteMode::Transparent(&context.bg_transparency),
                PassKind::TransparentObj => WriteMode::Transparent(&context.obj_transparency),
            };
            for draw in plan.pass(kind) {
                match draw {
                    Draw::Map(cmd) => target.draw_map(&view, context, cmd, mode),
                    Draw::Obj(cmd) => target.draw_obj(&view, context, cmd, mode),
                }
            }
        }

        if context.fade.is_active() {
            for pixel in target.pixels.pixels_mut() {
                *pixel = context.fade.apply(retrovdp_shared::Color(*pixel)).to_u32();
            }
        }

        Ok(())
    }
}

/// Framebuffer plus depth buffer of the frame being drawn.
struct Target<'a> {
    pixels: &'a mut Framebuffer,
    depth: &'a mut [i8],
    width: u32,
    height: u32,
}

impl Target<'_> {
    fn draw_map(
        &mut self,
        view: &MemoryView<'_>,
        context: &RenderContext,
        cmd: &MapCommand,
        mode: WriteMode<'_>,
    ) {
        let Some((x0, y0, x1, y1)) = cmd.window.clip(self.width, self.height) else {
            return;
        };
        let priority = cmd.priority as i8;
        let whole_layer: Option<Affine2> = match cmd.transform {
            TransformRef::Affine { row } => Some(view.affine(row)),
            _ => None,
        };

        for y in y0..y1 {
            let ly = y as i32 - cmd.window.y;
            let line = match cmd.transform {
                TransformRef::None => None,
                TransformRef::Affine { .. } => whole_layer,
                TransformRef::PerLine { row } => Some(view.affine(row + ly as u32)),
            };
            for x in x0..x1 {
                let idx = (y * self.width + x) as usize;
                if priority <= self.depth[idx] {
                    continue;
                }
                let lx = x as i32 - cmd.window.x;
                let Some(address) = view.resolve_map(cmd, line.as_ref(), lx, ly) else {
                    continue;
                };
                self.write(view, context, idx, x, y, address, priority, mode);
            }
        }
    }

    fn draw_obj(
        &mut self,
        view: &MemoryView<'_>,
        context: &RenderContext,
        cmd: &ObjCommand,
        mode: WriteMode<'_>,
    ) {
        let Some((x0, y0, x1, y1)) = cmd.dest.clip(self.width, self.height) else {
            return;
        };
        let priority = cmd.priority as i8;

        for y in y0..y1 {
            let ly = (y as i32 - cmd.dest.y) as u32;
            for x in x0..x1 {
                let idx = (y * self.width + x) as usize;
                if priority <= self.depth[idx] {
                    continue;
                }
                let lx = (x as i32 - cmd.dest.x) as u32;
                let Some(address) = view.resolve_obj(cmd, lx, ly) else {
                    continue;
                };
                self.write(view, context, idx, x, y, address, priority, mode);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    #[inline]
    fn write(
        &mut self,
        view: &MemoryView<'_>,
        context: &RenderContext,
        idx: usize,
        x: u32,
        y: u32,
        address: u32,
        priority: i8,
        mode: WriteMode<'_>,
    ) {
        let Some(color) = view.color(context, address, y) else {
            return;
        };
        let dst = self.pixels.pixel(x, y);
        match mode {
            WriteMode::Opaque => {
                self.pixels.set_pixel(x, y, color.with_alpha(dst.a()));
                self.depth[idx] = priority;
            }
            WriteMode::Transparent(config) => {
                self.pixels.set_pixel(x, y, config.apply(color, dst));
            }
        }
    }
}

#[cfg(test)]
mod tests;
