//! retrovdp - a 2D video display processor
//!
//! Tile maps and sprites are composited from four banks of indexed video
//! memory, on the GPU (wgpu) or on the CPU with identical results.
//!
//! # Architecture
//!
//! - [`memory`] - Shadow copies of the sprite, map, palette and "other" banks
//! - [`descriptors`] - Named windows into memory from the asset manifest
//! - [`graphics`] - Command buffers, frame plan, transparency and both compositors
//! - [`Vdp`] - Drawing, memory and configuration API; a [`retrovdp_core::FrameSink`]
//! - [`FrameStats`] - Capacity overflow diagnostics

pub mod assets;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod graphics;
pub mod memory;
pub mod stats;
pub mod vdp;

pub use assets::AssetBundle;
pub use config::{BackendKind, VdpConfig};
pub use descriptors::{AssetRegistry, VdpMap, VdpPalette, VdpSprite};
pub use error::{AssetError, VdpError};
pub use graphics::{
    BlendEffect, BlendOp, ColorSwap, Framebuffer, LayerClass, LayerTransform, LineTransform,
    ScreenRect, TransparencyConfig,
};
pub use memory::{MemoryKind, MemorySource, Rect};
pub use stats::FrameStats;
pub use vdp::{BgOptions, ObjOptions, Vdp};

pub use retrovdp_shared::Color;
