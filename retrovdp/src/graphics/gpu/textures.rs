//! GPU copies of the four memory banks
//!
//! Each bank maps to one unsigned-integer texture. The sprite bank packs
//! four 8-bit storage units into every `R32Uint` texel; the other banks
//! store one unit per texel. Only the dirty region of each bank is uploaded
//! per frame.

use crate::memory::{MemoryKind, Rect, ShadowTexture, TexelKind, VideoMemory};

/// Texture format used for a bank.
pub fn bank_format(bank: &ShadowTexture) -> wgpu::TextureFormat {
    match (bank.kind(), bank.units_per_gpu_texel()) {
        (TexelKind::U16, 1) => wgpu::TextureFormat::R16Uint,
        (TexelKind::U8, 1) => wgpu::TextureFormat::R8Uint,
        _ => wgpu::TextureFormat::R32Uint,
    }
}

/// Size of a bank in GPU texels.
fn texel_size(bank: &ShadowTexture) -> (u32, u32) {
    (bank.width() / bank.units_per_gpu_texel(), bank.height())
}

struct BankTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: (u32, u32),
}

/// Textures for all banks of one [`VideoMemory`] layout.
pub struct MemoryTextures {
    banks: [BankTexture; 4],
}

impl MemoryTextures {
    pub fn new(device: &wgpu::Device, memory: &VideoMemory) -> Self {
        let banks = MemoryKind::ALL.map(|kind| {
            let bank = memory.bank(kind);
            let size = texel_size(bank);
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(kind.name()),
                size: wgpu::Extent3d {
                    width: size.0,
                    height: size.1,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: bank_format(bank),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            BankTexture {
                texture,
                view,
                size,
            }
        });
        Self { banks }
    }

    /// True if the textures still fit the memory layout.
    pub fn matches(&self, memory: &VideoMemory) -> bool {
        MemoryKind::ALL
            .iter()
            .all(|&kind| self.banks[kind as usize].size == texel_size(memory.bank(kind)))
    }

    pub fn view(&self, kind: MemoryKind) -> &wgpu::TextureView {
        &self.banks[kind as usize].view
    }

    /// Upload every dirty region. Returns the number of bytes written.
    pub fn upload(&self, queue: &wgpu::Queue, memory: &mut VideoMemory) -> usize {
        let mut written = 0;
        for kind in MemoryKind::ALL {
            let bank = memory.bank_mut(kind);
            let Some(rect) = bank.take_dirty() else {
                continue;
            };
            written += self.upload_region(queue, kind, bank, rect);
        }
        written
    }

    fn upload_region(
        &self,
        queue: &wgpu::Queue,
        kind: MemoryKind,
        bank: &ShadowTexture,
        rect: Rect,
    ) -> usize {
        let upt = bank.units_per_gpu_texel();
        let data = bank.region_bytes(rect);
        let bytes_per_row = rect.w * bank.kind().size_bytes() as u32;

        tracing::trace!(
            "Uploading {} rect {}x{} at ({}, {}), {} bytes",
            kind.name(),
            rect.w,
            rect.h,
            rect.x,
            rect.y,
            data.len()
        );

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.banks[kind as usize].texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: rect.x / upt,
                    y: rect.y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            &data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(rect.h),
            },
            wgpu::Extent3d {
                width: rect.w / upt,
                height: rect.h,
                depth_or_array_layers: 1,
            },
        );
        data.len()
    }
}
