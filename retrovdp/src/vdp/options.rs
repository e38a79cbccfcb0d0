//! Per-draw options.

use crate::descriptors::{VdpPalette, VdpSprite};
use crate::graphics::{LayerTransform, ScreenRect};

/// Options for [`super::Vdp::draw_background`].
#[derive(Debug, Clone, PartialEq)]
pub struct BgOptions {
    /// Tiles to use instead of the map's own tileset
    pub tileset: Option<VdpSprite>,
    /// Palette to use instead of the map's default
    pub palette: Option<VdpPalette>,
    /// Destination window; `None` covers the whole screen
    pub window: Option<ScreenRect>,
    pub scroll_x: i32,
    pub scroll_y: i32,
    /// Repeat the map outside its bounds
    pub wrap: bool,
    /// 0..=127, higher is in front
    pub priority: u8,
    pub transparent: bool,
    pub transform: LayerTransform,
}

impl Default for BgOptions {
    fn default() -> Self {
        Self {
            tileset: None,
            palette: None,
            window: None,
            scroll_x: 0,
            scroll_y: 0,
            wrap: true,
            priority: 0,
            transparent: false,
            transform: LayerTransform::None,
        }
    }
}

impl BgOptions {
    pub fn scrolled(x: i32, y: i32) -> Self {
        Self {
            scroll_x: x,
            scroll_y: y,
            ..Default::default()
        }
    }
}

/// Options for [`super::Vdp::draw_sprite`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjOptions {
    /// Palette to use instead of the sprite's default
    pub palette: Option<VdpPalette>,
    /// Destination size in pixels (nearest-neighbour scaling)
    pub size: Option<(u32, u32)>,
    pub flip_h: bool,
    pub flip_v: bool,
    /// 0..=127, higher is in front
    pub priority: u8,
    pub transparent: bool,
}
