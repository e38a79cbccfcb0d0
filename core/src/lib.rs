//! retrovdp core - frame pacing and the cooperative frame loop
//!
//! This crate decides *when* logical frames happen. It knows nothing about
//! pixels: anything that can start and end a frame implements [`FrameSink`].
//!
//! # Architecture
//!
//! - [`FrameScheduler`] - Turns animation-callback timestamps into a number of
//!   logical frames (0, 1 or more) to keep the long-run rate at the target
//! - [`FrameLoop`] - Drives a state-passing step function once per logical frame
//! - [`PacingConfig`] - Target rate, tolerance, lateness clamp and CPU budget

pub mod runtime;

pub use runtime::{FrameLoop, FrameScheduler, FrameSink, FrameTimings, PacingConfig, PacingMode};
