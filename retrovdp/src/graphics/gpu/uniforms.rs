//! Per-frame uniform block.

use bytemuck::{Pod, Zeroable};
use retrovdp_shared::constants::COLOR_SWAP_SLOTS;

use crate::graphics::render_context::RenderContext;
use crate::graphics::transparency::BlendEffect;

/// Matches `Frame` in `compositor.wgsl` (144 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub bg_blend_src: [f32; 4],
    pub obj_blend_src: [f32; 4],
    /// rgb: fade color, a: factor
    pub fade: [f32; 4],
    /// x: palette address, y: enabled
    pub swaps: [[u32; 4]; COLOR_SWAP_SLOTS],
    pub screen: [f32; 2],
    pub swap_base_row: u32,
    pub bg_effect: u32,
    pub obj_effect: u32,
    pub _pad: [u32; 3],
}

impl FrameUniforms {
    pub fn new(context: &RenderContext) -> Self {
        let fade_color = context.fade.color.to_f32_array();
        let mut swaps = [[0u32; 4]; COLOR_SWAP_SLOTS];
        for (slot, address) in swaps.iter_mut().zip(context.swaps) {
            if let Some(address) = address {
                *slot = [address, 1, 0, 0];
            }
        }

        Self {
            bg_blend_src: context.bg_transparency.blend_src.to_f32_array(),
            obj_blend_src: context.obj_transparency.blend_src.to_f32_array(),
            fade: [
                fade_color[0],
                fade_color[1],
                fade_color[2],
                context.fade.factor(),
            ],
            swaps,
            screen: [context.screen_width as f32, context.screen_height as f32],
            swap_base_row: context.swap_base_row,
            bg_effect: effect_code(context.bg_transparency.effect),
            obj_effect: effect_code(context.obj_transparency.effect),
            _pad: [0; 3],
        }
    }
}

/// Shader-side code of an effect; 0 means no blending.
pub fn effect_code(effect: BlendEffect) -> u32 {
    match effect {
        BlendEffect::None => 0,
        BlendEffect::Color => 1,
        BlendEffect::Blend => 2,
        BlendEffect::Premult => 3,
    }
}
