//! Compositing engine
//!
//! Draw calls become [`MapCommand`]/[`ObjCommand`] snapshots in the four
//! [`CommandBuffers`]. At frame end a [`FramePlan`] applies the sprite cell
//! budget and fixes the drawing order, and a [`Compositor`] turns the plan
//! plus video memory into a [`Framebuffer`]. The CPU and GPU compositors
//! implement the same pixel pipeline and must agree pixel for pixel.

mod command_buffer;
mod cpu;
mod frame_plan;
mod framebuffer;
pub mod gpu;
mod line_transform;
mod render_context;
mod transparency;

use anyhow::Result;

pub use command_buffer::{
    CommandBuffer, CommandBuffers, LayerClass, MapCommand, ObjCommand, PixelSource, TransformRef,
};
pub use cpu::CpuCompositor;
pub use frame_plan::{Draw, FramePlan, PassKind, sprite_cells};
pub use framebuffer::Framebuffer;
pub use gpu::GpuCompositor;
pub use line_transform::{
    LayerTransform, LineTransform, TRANSFORM_WORDS, TransformRows, decode_affine, encode_affine,
    transform_pixel,
};
pub use render_context::{ColorSwap, RenderContext};
pub use transparency::{BlendEffect, BlendOp, FadeConfig, TransparencyConfig, to_unorm8};

use crate::memory::VideoMemory;

/// Rectangle on screen. May extend past any edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl ScreenRect {
    pub const fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Visible part as `(x0, y0, x1, y1)` on a `width` x `height` screen.
    pub fn clip(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x.max(0) as i64;
        let y0 = self.y.max(0) as i64;
        let x1 = (self.x as i64 + self.w as i64).min(width as i64);
        let y1 = (self.y as i64 + self.h as i64).min(height as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

/// A rendering backend.
///
/// Implementations draw the backdrop, every pass of the plan in
/// [`PassKind::ORDER`], then the fade.
pub trait Compositor {
    fn name(&self) -> &'static str;

    fn composite(
        &mut self,
        memory: &mut VideoMemory,
        plan: &FramePlan<'_>,
        context: &RenderContext,
        out: &mut Framebuffer,
    ) -> Result<()>;
}

/// Backdrop: palette color 0, always opaque.
pub fn backdrop_color(memory: &VideoMemory) -> retrovdp_shared::Color {
    let palettes = memory.bank(crate::memory::MemoryKind::Palette);
    let first = palettes
        .current::<u32>()
        .ok()
        .and_then(|p| p.first().copied())
        .unwrap_or(0);
    retrovdp_shared::Color(first).with_alpha(0xFF)
}
