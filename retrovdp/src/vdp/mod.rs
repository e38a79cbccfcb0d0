//! The video display processor.
//!
//! [`Vdp`] ties memory, command buffers and a compositor together. Game code
//! queues draws and changes rendering state between `start_frame` and
//! `end_frame`; `end_frame` composites everything queued and resets the
//! buffers for the next frame.

mod options;

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use retrovdp_core::FrameSink;
use retrovdp_shared::Color;
use retrovdp_shared::constants::{COLOR_SWAP_SLOTS, MAX_PRIORITY, OTHER_BANK_WIDTH};

use crate::assets::AssetBundle;
use crate::config::{BackendKind, VdpConfig};
use crate::descriptors::{AssetRegistry, VdpMap, VdpPalette, VdpSprite};
use crate::error::VdpError;
use crate::graphics::{
    ColorSwap, CommandBuffers, Compositor, CpuCompositor, FadeConfig, FramePlan, Framebuffer,
    GpuCompositor, LayerTransform, MapCommand, ObjCommand, PixelSource, RenderContext, ScreenRect,
    TransformRef, TransformRows, TransparencyConfig, encode_affine,
};
use crate::memory::{
    MemoryKind, MemorySource, Rect, Texel, VideoMemory, pack_low_color, unpack_low_color,
};
use crate::stats::FrameStats;

pub use options::{BgOptions, ObjOptions};

pub struct Vdp {
    config: VdpConfig,
    memory: VideoMemory,
    registry: AssetRegistry,
    buffers: CommandBuffers,
    context: RenderContext,
    transform_rows: TransformRows,
    stats: FrameStats,
    compositor: Box<dyn Compositor>,
    framebuffer: Framebuffer,
    in_frame: bool,
}

impl Vdp {
    /// Load a bundle into video memory and open the configured backend.
    pub fn new(config: VdpConfig, bundle: AssetBundle) -> Result<Self> {
        let compositor = create_compositor(config.backend)?;
        Self::with_compositor(config, bundle, compositor)
    }

    /// Like [`Vdp::new`] with an explicit compositor.
    pub fn with_compositor(
        config: VdpConfig,
        bundle: AssetBundle,
        compositor: Box<dyn Compositor>,
    ) -> Result<Self> {
        config.validate().context("Invalid VDP config")?;
        let registry = bundle.registry().context("Invalid asset manifest")?;
        let memory = bundle
            .into_memory(config.other_rows())
            .context("Failed to build video memory")?;

        let screen = config.screen;
        let b = config.buffers;
        tracing::info!(
            "VDP {}x{} using {} compositor",
            screen.width,
            screen.height,
            compositor.name()
        );

        Ok(Self {
            memory,
            registry,
            buffers: CommandBuffers::new(
                b.opaque_bg,
                b.transparent_bg,
                b.opaque_obj,
                b.transparent_obj,
                b.bg_layer_budget,
            ),
            context: RenderContext::new(screen.width, screen.height),
            transform_rows: TransformRows::new(screen.height, b.transform_rows),
            stats: FrameStats::default(),
            compositor,
            framebuffer: Framebuffer::new(screen.width, screen.height),
            in_frame: false,
            config,
        })
    }

    pub fn config(&self) -> &VdpConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.compositor.name()
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    pub fn memory(&self) -> &VideoMemory {
        &self.memory
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// The last composited frame.
    pub fn frame(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn sprite(&self, name: &str) -> Result<&VdpSprite, VdpError> {
        self.registry.sprite(name)
    }

    pub fn map(&self, name: &str) -> Result<&VdpMap, VdpError> {
        self.registry.map(name)
    }

    pub fn palette(&self, name: &str) -> Result<&VdpPalette, VdpError> {
        self.registry.palette(name)
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    /// Queue a background layer.
    ///
    /// Returns `Ok(false)` when the layer was dropped for lack of capacity
    /// (buffer full, layer budget reached or no transform rows left).
    pub fn draw_background(&mut self, map: &VdpMap, options: &BgOptions) -> Result<bool, VdpError> {
        check_priority(options.priority)?;
        let tileset = options.tileset.as_ref().unwrap_or(&map.tileset);
        let palette = options.palette.as_ref().or(map.palette.as_ref());
        let window = options.window.unwrap_or(ScreenRect::new(
            0,
            0,
            self.config.screen.width,
            self.config.screen.height,
        ));

        let transform = match &options.transform {
            LayerTransform::None => TransformRef::None,
            LayerTransform::Affine(m) => match self.store_transforms(std::slice::from_ref(m))? {
                Some(row) => TransformRef::Affine { row },
                None => return Ok(false),
            },
            LayerTransform::PerLine(table) => {
                if table.len() < window.h as usize {
                    return Err(VdpError::LineTransformTooShort {
                        lines: table.len(),
                        height: window.h,
                    });
                }
                match self.store_transforms(&table.lines()[..window.h as usize])? {
                    Some(row) => TransformRef::PerLine { row },
                    None => return Ok(false),
                }
            }
        };

        let command = MapCommand {
            map_x: map.x,
            map_y: map.y,
            map_w: map.w,
            map_h: map.h,
            tileset: pixel_source(tileset),
            tile_w: tileset.tile_w,
            tile_h: tileset.tile_h,
            palette_row: palette.map_or(0, |p| p.y),
            window,
            scroll_x: options.scroll_x,
            scroll_y: options.scroll_y,
            wrap: options.wrap,
            priority: options.priority,
            transform,
        };
        Ok(self.buffers.push_background(command, options.transparent))
    }

    /// Queue a sprite with its top-left corner at `(x, y)`.
    ///
    /// Returns `Ok(false)` when the sprite buffer is full. The cell budget is
    /// applied later, when the frame is composited.
    pub fn draw_sprite(
        &mut self,
        sprite: &VdpSprite,
        x: i32,
        y: i32,
        options: &ObjOptions,
    ) -> Result<bool, VdpError> {
        check_priority(options.priority)?;
        if sprite.w == 0 || sprite.h == 0 {
            return Err(VdpError::InvalidDescriptor(format!(
                "sprite {:?} has an empty source ({}x{})",
                sprite.name, sprite.w, sprite.h
            )));
        }
        let palette = options.palette.as_ref().or(sprite.palette.as_ref());
        let (w, h) = options.size.unwrap_or((sprite.w, sprite.h));

        let command = ObjCommand {
            source: pixel_source(sprite),
            dest: ScreenRect::new(x, y, w, h),
            palette_row: palette.map_or(0, |p| p.y),
            flip_h: options.flip_h,
            flip_v: options.flip_v,
            priority: options.priority,
        };
        Ok(self.buffers.push_sprite(command, options.transparent))
    }

    /// Write matrices to consecutive transform rows. `None` when the rows
    /// for this frame are used up.
    fn store_transforms(&mut self, matrices: &[glam::Affine2]) -> Result<Option<u32>, VdpError> {
        let Some(row) = self.transform_rows.alloc(matrices.len() as u32) else {
            self.stats.transforms_dropped += 1;
            tracing::debug!(
                "Out of transform rows ({} used), dropping transformed layer",
                self.transform_rows.used()
            );
            return Ok(None);
        };
        let words: Vec<u32> = matrices.iter().flat_map(encode_affine).collect();
        self.memory.write(
            MemoryKind::Other,
            Rect::new(0, row, OTHER_BANK_WIDTH, matrices.len() as u32),
            &words,
        )?;
        Ok(Some(row))
    }

    // ------------------------------------------------------------------
    // Rendering state
    // ------------------------------------------------------------------

    pub fn configure_bg_transparency(&mut self, config: TransparencyConfig) {
        self.context.bg_transparency = config;
    }

    pub fn configure_obj_transparency(&mut self, config: TransparencyConfig) {
        self.context.obj_transparency = config;
    }

    /// Fade the whole frame towards `color`. `factor` is clamped to 0..=1
    /// and quantised to 16 steps.
    pub fn configure_fade(&mut self, color: Color, factor: f32) {
        self.context.fade = FadeConfig::new(color, factor);
    }

    /// Install or clear a color swap.
    ///
    /// The per-line colors go to column `slot` of the first screen-height
    /// rows of "other" memory.
    pub fn configure_color_swap(
        &mut self,
        slot: usize,
        swap: Option<ColorSwap>,
    ) -> Result<(), VdpError> {
        if slot >= COLOR_SWAP_SLOTS {
            return Err(VdpError::InvalidColorSwapSlot(slot));
        }
        let Some(swap) = swap else {
            self.context.swaps[slot] = None;
            return Ok(());
        };

        let palettes = self.memory.bank(MemoryKind::Palette);
        let (width, height) = (palettes.width(), palettes.height());
        if swap.index as u32 >= width || swap.palette_row >= height {
            return Err(VdpError::OutOfBounds {
                bank: MemoryKind::Palette,
                x: swap.index as u32,
                y: swap.palette_row,
                w: 1,
                h: 1,
                width,
                height,
            });
        }

        let lines = self.config.screen.height;
        let colors: Vec<u32> = (0..lines as usize)
            .map(|y| swap.color_for_line(y).to_u32())
            .collect();
        self.memory
            .write(MemoryKind::Other, Rect::new(slot as u32, 0, 1, lines), &colors)?;
        self.context.swaps[slot] = Some(swap.palette_row * width + swap.index as u32);
        self.context.swap_base_row = 0;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Memory access
    // ------------------------------------------------------------------

    /// Copy a region of any bank into `out`.
    pub fn read_memory<T: Texel>(
        &self,
        kind: MemoryKind,
        rect: Rect,
        source: MemorySource,
        out: &mut [T],
    ) -> Result<(), VdpError> {
        self.memory.read(kind, source, rect, out)
    }

    /// Overwrite a region of any bank. Takes effect from the next composite.
    pub fn write_memory<T: Texel>(
        &mut self,
        kind: MemoryKind,
        rect: Rect,
        data: &[T],
    ) -> Result<(), VdpError> {
        self.memory.write(kind, rect, data)
    }

    /// Raw storage units of a sprite (two pixels per byte when low-color).
    pub fn read_sprite(&self, sprite: &VdpSprite, source: MemorySource) -> Result<Vec<u8>, VdpError> {
        read_region(&self.memory, MemoryKind::Sprite, sprite.storage_rect()?, source)
    }

    pub fn write_sprite(&mut self, sprite: &VdpSprite, data: &[u8]) -> Result<(), VdpError> {
        self.memory
            .write(MemoryKind::Sprite, sprite.storage_rect()?, data)
    }

    /// One color index per pixel, row-major.
    pub fn read_sprite_pixels(
        &self,
        sprite: &VdpSprite,
        source: MemorySource,
    ) -> Result<Vec<u8>, VdpError> {
        let units = self.read_sprite(sprite, source)?;
        Ok(if sprite.hi_color {
            units
        } else {
            unpack_low_color(&units)
        })
    }

    /// Write one color index per pixel, row-major. Low-color indices are
    /// truncated to 4 bits.
    pub fn write_sprite_pixels(&mut self, sprite: &VdpSprite, pixels: &[u8]) -> Result<(), VdpError> {
        let expected = (sprite.w * sprite.h) as usize;
        if pixels.len() != expected {
            return Err(VdpError::BufferSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        if sprite.hi_color {
            self.write_sprite(sprite, pixels)
        } else {
            self.write_sprite(sprite, &pack_low_color(pixels))
        }
    }

    /// Map cells, row-major.
    pub fn read_map(&self, map: &VdpMap, source: MemorySource) -> Result<Vec<u16>, VdpError> {
        read_region(&self.memory, MemoryKind::Map, map.rect(), source)
    }

    pub fn write_map(&mut self, map: &VdpMap, cells: &[u16]) -> Result<(), VdpError> {
        self.memory.write(MemoryKind::Map, map.rect(), cells)
    }

    /// Palette colors (0xAABBGGRR), one full row per palette row.
    pub fn read_palette(
        &self,
        palette: &VdpPalette,
        source: MemorySource,
    ) -> Result<Vec<u32>, VdpError> {
        let rect = self.palette_rect(palette);
        read_region(&self.memory, MemoryKind::Palette, rect, source)
    }

    pub fn write_palette(&mut self, palette: &VdpPalette, colors: &[u32]) -> Result<(), VdpError> {
        let rect = self.palette_rect(palette);
        self.memory.write(MemoryKind::Palette, rect, colors)
    }

    fn palette_rect(&self, palette: &VdpPalette) -> Rect {
        Rect::new(0, palette.y, self.memory.palette_width(), palette.size)
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Counters since the previous call.
    pub fn get_and_reset_stats(&mut self) -> FrameStats {
        std::mem::take(&mut self.stats)
    }
}

impl FrameSink for Vdp {
    fn start_frame(&mut self) -> Result<()> {
        anyhow::ensure!(!self.in_frame, "start_frame called twice without end_frame");
        self.in_frame = true;
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        anyhow::ensure!(self.in_frame, "end_frame called without start_frame");

        let sprites = self.config.sprites;
        let result = {
            let plan = FramePlan::build(&self.buffers, sprites.cell_size, sprites.cell_budget);
            // Drops and overflows happened whether or not the composite succeeds
            self.stats.record(&self.buffers, &plan);
            self.compositor
                .composite(&mut self.memory, &plan, &self.context, &mut self.framebuffer)
                .with_context(|| format!("{} compositor failed", self.compositor.name()))
        };

        // Buffers never carry over, even after a failed composite
        self.buffers.reset();
        self.transform_rows.reset();
        self.in_frame = false;
        result
    }
}

fn create_compositor(kind: BackendKind) -> Result<Box<dyn Compositor>> {
    Ok(match kind {
        BackendKind::Cpu => Box::new(CpuCompositor::new()),
        BackendKind::Gpu => {
            Box::new(GpuCompositor::new().context("Failed to initialise GPU compositor")?)
        }
    })
}

fn check_priority(priority: u8) -> Result<(), VdpError> {
    if priority > MAX_PRIORITY {
        return Err(VdpError::InvalidPriority(priority));
    }
    Ok(())
}

fn pixel_source(sprite: &VdpSprite) -> PixelSource {
    PixelSource {
        x: sprite.x,
        y: sprite.y,
        w: sprite.w,
        h: sprite.h,
        hi_color: sprite.hi_color,
    }
}

fn read_region<T: Texel>(
    memory: &VideoMemory,
    kind: MemoryKind,
    rect: Rect,
    source: MemorySource,
) -> Result<Vec<T>, VdpError> {
    let mut out = vec![T::default(); (rect.w * rect.h) as usize];
    memory.read(kind, source, rect, &mut out)?;
    Ok(out)
}
