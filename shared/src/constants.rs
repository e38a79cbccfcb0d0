//! Centralized constants for the retrovdp video hardware.
//!
//! Single source of truth for bit layouts shared by the asset tools, the CPU
//! compositor and the WGSL shader (which repeats these values verbatim).

/// Default screen width in pixels.
pub const DEFAULT_SCREEN_WIDTH: u32 = 256;

/// Default screen height in pixels.
pub const DEFAULT_SCREEN_HEIGHT: u32 = 256;

/// Bits of a map cell holding the tile index.
pub const TILE_INDEX_BITS: u32 = 13;

/// Mask extracting the tile index from a map cell.
pub const TILE_INDEX_MASK: u16 = (1 << TILE_INDEX_BITS) - 1;

/// Tile index marking an empty (never sampled) map cell.
pub const EMPTY_TILE: u16 = TILE_INDEX_MASK;

/// Largest palette bank offset a map cell can carry.
pub const MAX_PALETTE_BANK: u16 = 7;

/// Color index treated as transparent in every layer.
pub const TRANSPARENT_INDEX: u8 = 0;

/// Number of color swap slots.
pub const COLOR_SWAP_SLOTS: usize = 4;

/// Width (in u32 units) of the "other" memory bank.
///
/// Line transform rows use columns 0..6, color swap rows use columns 0..4.
pub const OTHER_BANK_WIDTH: u32 = 8;

/// Storage units packed into one GPU texel of the sprite bank.
pub const SPRITE_UNITS_PER_TEXEL: u32 = 4;

/// Highest draw priority accepted by the compositor.
pub const MAX_PRIORITY: u8 = 127;

/// Number of visible fade steps.
pub const FADE_STEPS: u32 = 16;
