//! Render pipelines of the GPU compositor
//!
//! One shader module serves every pass. Pipelines differ only in depth
//! writes and blend state, so they are keyed by pass kind plus the
//! transparency effect and operation in use, and created on demand.

use hashbrown::HashMap;

use crate::graphics::frame_plan::PassKind;
use crate::graphics::transparency::{BlendEffect, BlendOp, TransparencyConfig};

use super::vertex::CommandVertex;

/// WGSL source of the compositor.
pub const COMPOSITOR_SHADER: &str = include_str!("../shaders/compositor.wgsl");

/// Color target format of the compositor.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Depth format of the priority buffer.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Key for pipeline cache lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKey {
    /// A layer pass. Opaque passes always use `None`/`Add`.
    Layer {
        pass: PassKind,
        effect: BlendEffect,
        op: BlendOp,
    },
    /// Full-screen fade
    Fade,
}

impl PipelineKey {
    pub fn layer(pass: PassKind, config: &TransparencyConfig) -> Self {
        if pass.is_transparent() {
            Self::Layer {
                pass,
                effect: config.effect,
                op: config.op,
            }
        } else {
            Self::Layer {
                pass,
                effect: BlendEffect::None,
                op: BlendOp::Add,
            }
        }
    }
}

/// Hardware blend state for a transparency setting.
///
/// The shader outputs `src * blend_src` for every effect but `none`, so the
/// fixed-function factors only need to supply the per-effect weights.
pub fn blend_state(effect: BlendEffect, op: BlendOp) -> Option<wgpu::BlendState> {
    let operation = match op {
        BlendOp::Add => wgpu::BlendOperation::Add,
        BlendOp::Sub => wgpu::BlendOperation::ReverseSubtract,
    };
    let (src_factor, dst_factor) = match effect {
        BlendEffect::None => return None,
        BlendEffect::Color => (wgpu::BlendFactor::One, wgpu::BlendFactor::Constant),
        BlendEffect::Blend => (
            wgpu::BlendFactor::SrcAlpha,
            wgpu::BlendFactor::OneMinusSrcAlpha,
        ),
        BlendEffect::Premult => (wgpu::BlendFactor::One, wgpu::BlendFactor::OneMinusSrcAlpha),
    };
    let color = wgpu::BlendComponent {
        src_factor,
        dst_factor,
        operation,
    };
    Some(wgpu::BlendState {
        color,
        alpha: wgpu::BlendComponent::REPLACE,
    })
}

/// Bind group 0: frame uniforms plus the four memory textures.
pub fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Uint,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    };

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Compositor Bind Group Layout"),
        entries: &[
            // Slot 0: frame uniforms
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            // Slots 1-4: sprite, map, palette and other memory
            texture(1),
            texture(2),
            texture(3),
            texture(4),
        ],
    })
}

/// Cache for render pipelines
///
/// Pipelines are created on first use and reused across frames.
pub struct PipelineCache {
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    layout: wgpu::PipelineLayout,
    shader: wgpu::ShaderModule,
}

impl PipelineCache {
    pub fn new(device: &wgpu::Device, bind_group_layout: &wgpu::BindGroupLayout) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Compositor Pipeline Layout"),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Compositor Shader"),
            source: wgpu::ShaderSource::Wgsl(COMPOSITOR_SHADER.into()),
        });

        Self {
            pipelines: HashMap::new(),
            layout,
            shader,
        }
    }

    /// Create the pipeline for `key` if it does not exist yet.
    pub fn prepare(&mut self, device: &wgpu::Device, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        tracing::debug!("Creating compositor pipeline {:?}", key);
        let pipeline = match key {
            PipelineKey::Layer { pass, effect, op } => {
                self.create_layer_pipeline(device, pass, effect, op)
            }
            PipelineKey::Fade => self.create_fade_pipeline(device),
        };
        self.pipelines.insert(key, pipeline);
    }

    pub fn get(&self, key: PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(&key)
    }

    fn create_layer_pipeline(
        &self,
        device: &wgpu::Device,
        pass: PassKind,
        effect: BlendEffect,
        op: BlendOp,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("Compositor {:?} {} {}", pass, effect, op)),
            layout: Some(&self.layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs"),
                buffers: &[CommandVertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: blend_state(effect, op),
                    write_mask: wgpu::ColorWrites::COLOR,
                })],
                compilation_options: Default::default(),
            }),
            primitive: primitive_state(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                // Transparent layers test against opaque depth but never write it
                depth_write_enabled: !pass.is_transparent(),
                depth_compare: wgpu::CompareFunction::Greater,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_fade_pipeline(&self, device: &wgpu::Device) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Compositor Fade"),
            layout: Some(&self.layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_fade"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_fade"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent::REPLACE,
                    }),
                    write_mask: wgpu::ColorWrites::COLOR,
                })],
                compilation_options: Default::default(),
            }),
            primitive: primitive_state(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}

fn primitive_state() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None,
        unclipped_depth: false,
        polygon_mode: wgpu::PolygonMode::Fill,
        conservative: false,
    }
}
