//! Canonical color representation.
//!
//! Colors are packed as `0xAABBGGRR`, which is also the little-endian byte
//! order of an RGBA8 texel. That lets palette memory, framebuffers and GPU
//! textures share the same `u32` values without swizzling.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A 32-bit RGBA color packed as `0xAABBGGRR`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color(pub u32);

/// Error returned when a color string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    #[error("color string must start with '#': {0:?}")]
    MissingHash(String),

    #[error("color string has invalid length {len} (expected 3, 4, 6 or 8 hex digits): {input:?}")]
    InvalidLength { input: String, len: usize },

    #[error("invalid hex digit in color string: {0:?}")]
    InvalidDigit(String),
}

impl Color {
    pub const TRANSPARENT: Color = Color(0x0000_0000);
    pub const BLACK: Color = Color(0xFF00_0000);
    pub const WHITE: Color = Color(0xFFFF_FFFF);

    /// Build a color from individual channels.
    pub const fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color((a as u32) << 24 | (b as u32) << 16 | (g as u32) << 8 | r as u32)
    }

    pub const fn from_u32(packed: u32) -> Self {
        Color(packed)
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }

    pub const fn r(self) -> u8 {
        self.0 as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn b(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Same color with the alpha channel replaced.
    pub const fn with_alpha(self, a: u8) -> Self {
        Color(self.0 & 0x00FF_FFFF | (a as u32) << 24)
    }

    /// Channels in memory order (R, G, B, A).
    pub const fn to_rgba_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Channels normalized to `0.0..=1.0`, in R, G, B, A order.
    pub fn to_f32_array(self) -> [f32; 4] {
        let [r, g, b, a] = self.to_rgba_bytes();
        [
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        ]
    }
}

impl From<u32> for Color {
    fn from(value: u32) -> Self {
        Color(value)
    }
}

impl From<Color> for u32 {
    fn from(value: Color) -> Self {
        value.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.to_rgba_bytes();
        write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    /// Parse `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(s.to_string()))?;

        let nibbles = digits
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| ColorParseError::InvalidDigit(s.to_string()))?;

        let channels: [u8; 4] = match nibbles.len() {
            3 | 4 => {
                let mut out = [0xFF; 4];
                for (slot, n) in out.iter_mut().zip(&nibbles) {
                    *slot = n << 4 | n;
                }
                out
            }
            6 | 8 => {
                let mut out = [0xFF; 4];
                for (slot, pair) in out.iter_mut().zip(nibbles.chunks_exact(2)) {
                    *slot = pair[0] << 4 | pair[1];
                }
                out
            }
            len => {
                return Err(ColorParseError::InvalidLength {
                    input: s.to_string(),
                    len,
                });
            }
        };

        Ok(Color::from_rgba(channels[0], channels[1], channels[2], channels[3]))
    }
}
