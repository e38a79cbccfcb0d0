//! Per-VDP rendering state read by the compositors.
//!
//! Transparency, fade and color swap slots persist across frames until they
//! are reconfigured. Each VDP instance owns its own context.

use retrovdp_shared::Color;
use retrovdp_shared::constants::COLOR_SWAP_SLOTS;

use super::transparency::{FadeConfig, TransparencyConfig};

/// A palette entry replaced by a per-line color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorSwap {
    /// Palette row of the swapped entry
    pub palette_row: u32,
    /// Color index within the row
    pub index: u8,
    /// Color for each screen line; the last one repeats
    pub colors: Vec<Color>,
}

impl ColorSwap {
    /// Same color on every line.
    pub fn solid(palette_row: u32, index: u8, color: Color) -> Self {
        Self {
            palette_row,
            index,
            colors: vec![color],
        }
    }

    /// Color for screen line `y`.
    pub fn color_for_line(&self, y: usize) -> Color {
        self.colors
            .get(y)
            .or(self.colors.last())
            .copied()
            .unwrap_or(Color::TRANSPARENT)
    }
}

/// Everything a compositor needs besides memory and the frame plan.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub screen_width: u32,
    pub screen_height: u32,
    pub bg_transparency: TransparencyConfig,
    pub obj_transparency: TransparencyConfig,
    pub fade: FadeConfig,
    /// Palette address matched by each swap slot
    pub swaps: [Option<u32>; COLOR_SWAP_SLOTS],
    /// First "other" memory row holding swap line colors
    pub swap_base_row: u32,
}

impl RenderContext {
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            screen_width,
            screen_height,
            bg_transparency: TransparencyConfig::default(),
            obj_transparency: TransparencyConfig::default(),
            fade: FadeConfig::default(),
            swaps: [None; COLOR_SWAP_SLOTS],
            swap_base_row: 0,
        }
    }

    /// Slot swapping the given palette address, if any.
    #[inline]
    pub fn swap_slot(&self, address: u32) -> Option<usize> {
        self.swaps.iter().position(|s| *s == Some(address))
    }

    pub fn has_swaps(&self) -> bool {
        self.swaps.iter().any(Option::is_some)
    }
}
