//! wgpu compositor
//!
//! Renders the frame plan off-screen. Memory banks live in integer textures
//! updated from the shadow copies' dirty regions, every draw command is one
//! quad, and priorities go through a `Depth32Float` buffer with a strict
//! `Greater` test so the result matches [`super::CpuCompositor`] pixel for
//! pixel. The finished frame is read back into a [`Framebuffer`].

mod buffer;
mod pipeline;
mod readback;
mod textures;
mod uniforms;
mod vertex;

use anyhow::{Context, Result, bail};

use super::frame_plan::{FramePlan, PassKind};
use super::framebuffer::Framebuffer;
use super::render_context::RenderContext;
use super::transparency::{BlendEffect, TransparencyConfig};
use super::{Compositor, backdrop_color};
use crate::memory::{MemoryKind, VideoMemory};

use buffer::GrowableBuffer;
pub use pipeline::{COMPOSITOR_SHADER, PipelineKey};
use pipeline::{DEPTH_FORMAT, PipelineCache, TARGET_FORMAT, create_bind_group_layout};
use readback::read_texture_rgba;
use textures::MemoryTextures;
use uniforms::FrameUniforms;
pub use vertex::{CommandVertex, VERTICES_PER_QUAD, push_quad};

/// Textures and bindings sized for one memory layout and screen.
struct FrameResources {
    textures: MemoryTextures,
    bind_group: wgpu::BindGroup,
    target: wgpu::Texture,
    target_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    width: u32,
    height: u32,
}

/// Hardware compositor.
pub struct GpuCompositor {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,
    bind_group_layout: wgpu::BindGroupLayout,
    pipelines: PipelineCache,
    uniforms: wgpu::Buffer,
    vertices: GrowableBuffer,
    resources: Option<FrameResources>,
    scratch: Vec<CommandVertex>,
}

impl GpuCompositor {
    /// Open the default adapter headless.
    ///
    /// Fails when the machine has no usable adapter.
    pub fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .context("Failed to find suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("retrovdp Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            experimental_features: Default::default(),
            trace: wgpu::Trace::Off,
        }))
        .context("Failed to create GPU device")?;

        let adapter_name = adapter.get_info().name;
        tracing::info!("GPU compositor using adapter: {}", adapter_name);

        Ok(Self::with_device(device, queue, adapter_name))
    }

    /// Use an existing device, e.g. one shared with a presentation layer.
    pub fn with_device(device: wgpu::Device, queue: wgpu::Queue, adapter_name: String) -> Self {
        let bind_group_layout = create_bind_group_layout(&device);
        let pipelines = PipelineCache::new(&device, &bind_group_layout);
        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let vertices = GrowableBuffer::new(&device, wgpu::BufferUsages::VERTEX, "Command Vertices");

        Self {
            device,
            queue,
            adapter_name,
            bind_group_layout,
            pipelines,
            uniforms,
            vertices,
            resources: None,
            scratch: Vec::new(),
        }
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// (Re)create textures when the memory layout or screen size changed.
    fn prepare_resources(&mut self, memory: &mut VideoMemory, width: u32, height: u32) {
        let fits = self.resources.as_ref().is_some_and(|r| {
            r.width == width && r.height == height && r.textures.matches(memory)
        });
        if fits {
            return;
        }

        tracing::debug!("Creating GPU compositor resources for {}x{}", width, height);
        let textures = MemoryTextures::new(&self.device, memory);
        memory.mark_all_dirty();

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Compositor Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(textures.view(MemoryKind::Sprite)),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(textures.view(MemoryKind::Map)),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(
                        textures.view(MemoryKind::Palette),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(textures.view(MemoryKind::Other)),
                },
            ],
        });

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let target = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Compositor Target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());
        let depth = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Compositor Depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        self.resources = Some(FrameResources {
            textures,
            bind_group,
            target,
            target_view,
            depth_view,
            width,
            height,
        });
    }
}

impl Compositor for GpuCompositor {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn composite(
        &mut self,
        memory: &mut VideoMemory,
        plan: &FramePlan<'_>,
        context: &RenderContext,
        out: &mut Framebuffer,
    ) -> Result<()> {
        let (width, height) = (out.width(), out.height());
        if width == 0 || height == 0 {
            bail!("Cannot composite into a {}x{} framebuffer", width, height);
        }
        self.prepare_resources(memory, width, height);
        let Some(resources) = self.resources.as_ref() else {
            bail!("GPU compositor resources missing");
        };

        // 1. Sync memory
        let uploaded = resources.textures.upload(&self.queue, memory);

        // 2. Frame uniforms
        let mut uniforms = FrameUniforms::new(context);
        uniforms.screen = [width as f32, height as f32];
        self.queue
            .write_buffer(&self.uniforms, 0, bytemuck::bytes_of(&uniforms));

        // 3. One quad per draw, passes back to back
        self.scratch.clear();
        let mut ranges = Vec::with_capacity(PassKind::ORDER.len());
        for kind in PassKind::ORDER {
            let start = self.scratch.len() as u32;
            for draw in plan.pass(kind) {
                push_quad(&mut self.scratch, draw, kind.is_transparent());
            }
            ranges.push((kind, start..self.scratch.len() as u32));
        }
        let bytes: &[u8] = bytemuck::cast_slice(&self.scratch);
        self.vertices.reset();
        self.vertices.ensure_capacity(&self.device, bytes.len() as u64);
        self.vertices.write(&self.queue, bytes);

        tracing::trace!(
            "GPU frame: {} draws, {} vertex bytes of {}, {} memory bytes uploaded",
            plan.draw_count(),
            self.vertices.used(),
            self.vertices.capacity(),
            uploaded
        );

        // 4. Pipelines
        for (kind, range) in &ranges {
            if !range.is_empty() {
                let key = PipelineKey::layer(*kind, pass_transparency(context, *kind));
                self.pipelines.prepare(&self.device, key);
            }
        }
        if context.fade.is_active() {
            self.pipelines.prepare(&self.device, PipelineKey::Fade);
        }

        // 5. Render
        let backdrop = backdrop_color(memory).to_f32_array();
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Compositor Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Compositor Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &resources.target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: backdrop[0] as f64,
                            g: backdrop[1] as f64,
                            b: backdrop[2] as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &resources.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &resources.bind_group, &[]);
            if !self.scratch.is_empty() {
                render_pass.set_vertex_buffer(0, self.vertices.buffer().slice(..bytes.len() as u64));
            }

            for (kind, range) in ranges {
                if range.is_empty() {
                    continue;
                }
                let config = pass_transparency(context, kind);
                let key = PipelineKey::layer(kind, config);
                let Some(pipeline) = self.pipelines.get(key) else {
                    bail!("Pipeline {:?} was not prepared", key);
                };
                render_pass.set_pipeline(pipeline);
                if kind.is_transparent() && config.effect == BlendEffect::Color {
                    let [r, g, b, a] = config.blend_dst.to_f32_array();
                    render_pass.set_blend_constant(wgpu::Color {
                        r: r as f64,
                        g: g as f64,
                        b: b as f64,
                        a: a as f64,
                    });
                }
                render_pass.draw(range, 0..1);
            }

            if context.fade.is_active() {
                let Some(pipeline) = self.pipelines.get(PipelineKey::Fade) else {
                    bail!("Fade pipeline was not prepared");
                };
                render_pass.set_pipeline(pipeline);
                render_pass.draw(0..3, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        // 6. Read back
        let pixels = read_texture_rgba(&self.device, &self.queue, &resources.target, width, height)?;
        *out = Framebuffer::from_rgba_bytes(width, height, &pixels);
        Ok(())
    }
}

/// Transparency settings that apply to a pass.
fn pass_transparency(context: &RenderContext, kind: PassKind) -> &TransparencyConfig {
    match kind {
        PassKind::OpaqueObj | PassKind::TransparentObj => &context.obj_transparency,
        PassKind::OpaqueBg | PassKind::TransparentBg => &context.bg_transparency,
    }
}
