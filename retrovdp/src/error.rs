//! Error types
//!
//! Two families only. Configuration mistakes ([`VdpError`]) surface
//! synchronously at the call site; a broken asset bundle ([`AssetError`]) is
//! fatal at load time. Capacity exhaustion is never an error: it truncates
//! and shows up in [`crate::FrameStats`].

use std::path::PathBuf;

use crate::memory::{MemoryKind, TexelKind};

/// Programmer errors raised by the drawing and memory API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VdpError {
    #[error("unknown {kind} name {name:?}")]
    UnknownName { kind: &'static str, name: String },

    #[error("invalid blend operation {0:?} (expected \"add\" or \"sub\")")]
    InvalidBlendOperation(String),

    #[error("invalid transparency effect {0:?} (expected \"none\", \"color\", \"blend\" or \"premult\")")]
    InvalidBlendEffect(String),

    #[error("{bank:?} memory stores {expected:?} elements, buffer holds {actual:?}")]
    ElementTypeMismatch {
        bank: MemoryKind,
        expected: TexelKind,
        actual: TexelKind,
    },

    #[error("low-color sprite access must use even x and width (x={x}, w={w})")]
    MisalignedSprite { x: u32, w: u32 },

    #[error("region {x},{y} {w}x{h} exceeds {bank:?} memory ({width}x{height})")]
    OutOfBounds {
        bank: MemoryKind,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        width: u32,
        height: u32,
    },

    #[error("buffer holds {actual} elements, region needs {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("line transform has {lines} lines, window is {height} lines tall")]
    LineTransformTooShort { lines: usize, height: u32 },

    #[error("color swap slot {0} out of range (0..4)")]
    InvalidColorSwapSlot(usize),

    #[error("priority {0} out of range (0..=127)")]
    InvalidPriority(u8),

    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),
}

/// Fatal errors while loading an asset bundle.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("{bank:?} image is {actual} bytes, manifest geometry needs {expected}")]
    SizeMismatch {
        bank: MemoryKind,
        expected: usize,
        actual: usize,
    },

    #[error("invalid {bank:?} bank geometry: {reason}")]
    InvalidGeometry { bank: MemoryKind, reason: String },

    #[error("invalid asset {name:?}: {reason}")]
    InvalidEntry { name: String, reason: String },
}
