//! Shared types for the retrovdp video display processor.
//!
//! Holds the pieces that both the runtime and offline tooling agree on:
//! the canonical color representation, the asset manifest schema and the
//! bit layout constants of the video memories.

pub mod color;
pub mod constants;
pub mod ids;
pub mod manifest;

pub use color::{Color, ColorParseError};
pub use manifest::{BankGeometry, Manifest, MapEntryDesc, PaletteEntryDesc, SpriteEntryDesc};
