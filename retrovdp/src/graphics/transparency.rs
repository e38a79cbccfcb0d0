//! Transparency and fade configuration.
//!
//! Both compositors use the same equations. Per RGB channel, with values
//! normalised to `0.0..=1.0` and `s = src * blend_src`:
//!
//! | effect    | result                       |
//! |-----------|------------------------------|
//! | `none`    | `src` replaces `dst`         |
//! | `color`   | `dst * blend_dst ± s`        |
//! | `blend`   | `dst * (1 - s.a) ± s * s.a`  |
//! | `premult` | `dst * (1 - s.a) ± s`        |
//!
//! `±` is the configured operation (`sub` subtracts the source term from the
//! destination term). Results saturate. The framebuffer alpha is never
//! written.

use std::fmt;
use std::str::FromStr;

use retrovdp_shared::Color;
use retrovdp_shared::constants::FADE_STEPS;

use crate::error::VdpError;

/// How a transparent layer combines with what is underneath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendEffect {
    #[default]
    None,
    /// Weighted add/sub with constant per-channel weights
    Color,
    /// Straight alpha
    Blend,
    /// Premultiplied alpha
    Premult,
}

impl FromStr for BlendEffect {
    type Err = VdpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(BlendEffect::None),
            "color" => Ok(BlendEffect::Color),
            "blend" => Ok(BlendEffect::Blend),
            "premult" => Ok(BlendEffect::Premult),
            _ => Err(VdpError::InvalidBlendEffect(s.to_string())),
        }
    }
}

impl fmt::Display for BlendEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BlendEffect::None => "none",
            BlendEffect::Color => "color",
            BlendEffect::Blend => "blend",
            BlendEffect::Premult => "premult",
        })
    }
}

/// Whether the source term is added to or subtracted from the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOp {
    #[default]
    Add,
    Sub,
}

impl FromStr for BlendOp {
    type Err = VdpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(BlendOp::Add),
            "sub" => Ok(BlendOp::Sub),
            _ => Err(VdpError::InvalidBlendOperation(s.to_string())),
        }
    }
}

impl fmt::Display for BlendOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BlendOp::Add => "add",
            BlendOp::Sub => "sub",
        })
    }
}

/// Transparency state of one layer class (backgrounds or sprites).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransparencyConfig {
    pub effect: BlendEffect,
    pub op: BlendOp,
    /// Source weight
    pub blend_src: Color,
    /// Destination weight (`color` effect only)
    pub blend_dst: Color,
}

impl Default for TransparencyConfig {
    fn default() -> Self {
        Self {
            effect: BlendEffect::None,
            op: BlendOp::Add,
            blend_src: Color::WHITE,
            blend_dst: Color::WHITE,
        }
    }
}

impl TransparencyConfig {
    /// Build from the string forms used by game scripts.
    pub fn parse(
        effect: &str,
        op: &str,
        blend_src: Color,
        blend_dst: Color,
    ) -> Result<Self, VdpError> {
        Ok(Self {
            effect: effect.parse()?,
            op: op.parse()?,
            blend_src,
            blend_dst,
        })
    }

    /// Combine a source color with a destination pixel (alpha untouched).
    pub fn apply(&self, src: Color, dst: Color) -> Color {
        let s = src.to_f32_array();
        let w = self.blend_src.to_f32_array();
        let s = [s[0] * w[0], s[1] * w[1], s[2] * w[2], s[3] * w[3]];
        let d = dst.to_f32_array();

        let (src_factor, dst_factor) = match self.effect {
            BlendEffect::None => return Color::from_rgba(src.r(), src.g(), src.b(), dst.a()),
            BlendEffect::Color => ([1.0; 3], {
                let bd = self.blend_dst.to_f32_array();
                [bd[0], bd[1], bd[2]]
            }),
            BlendEffect::Blend => ([s[3]; 3], [1.0 - s[3]; 3]),
            BlendEffect::Premult => ([1.0; 3], [1.0 - s[3]; 3]),
        };

        let channel = |i: usize| {
            let src_term = s[i] * src_factor[i];
            let dst_term = d[i] * dst_factor[i];
            let v = match self.op {
                BlendOp::Add => dst_term + src_term,
                BlendOp::Sub => dst_term - src_term,
            };
            to_unorm8(v)
        };
        Color::from_rgba(channel(0), channel(1), channel(2), dst.a())
    }
}

/// Full-screen fade toward a constant color, applied after every layer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FadeConfig {
    pub color: Color,
    /// Quantised to [`FADE_STEPS`] visible levels
    factor: f32,
}

impl FadeConfig {
    pub fn new(color: Color, factor: f32) -> Self {
        let steps = (FADE_STEPS - 1) as f32;
        let clamped = if factor.is_nan() { 0.0 } else { factor.clamp(0.0, 1.0) };
        Self {
            color,
            factor: (clamped * steps).round() / steps,
        }
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    pub fn is_active(&self) -> bool {
        self.factor > 0.0
    }

    /// `dst * (1 - f) + color * f`, alpha untouched.
    pub fn apply(&self, dst: Color) -> Color {
        let f = self.factor;
        let c = self.color.to_f32_array();
        let d = dst.to_f32_array();
        let channel = |i: usize| to_unorm8(d[i] * (1.0 - f) + c[i] * f);
        Color::from_rgba(channel(0), channel(1), channel(2), dst.a())
    }
}

/// Saturate and round a normalised channel the way a unorm8 target does.
#[inline]
pub fn to_unorm8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
