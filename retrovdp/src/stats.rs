//! Capacity diagnostics.
//!
//! Overflows never fail a frame; they are counted here instead. The host
//! reads and clears the counters periodically (e.g. once per second).

use crate::graphics::{CommandBuffers, FramePlan, LayerClass};

/// Counters accumulated since the last [`crate::Vdp::get_and_reset_stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames ended, including ones whose composite failed
    pub frames: u64,
    /// Peak entries used per layer class, indexed by [`LayerClass::index`]
    pub peak_used: [usize; 4],
    /// Enqueues rejected because a buffer was full, per layer class
    pub overflow: [u32; 4],
    /// Backgrounds rejected by the layer budget
    pub bg_layers_dropped: u32,
    /// Sprites rejected by the cell budget
    pub sprites_dropped: u32,
    /// Peak sprite cells charged in one frame
    pub peak_cells: u32,
    /// Transformed layers dropped because no transform rows were left
    pub transforms_dropped: u32,
}

impl FrameStats {
    /// Fold one finished frame into the counters.
    pub fn record(&mut self, buffers: &CommandBuffers, plan: &FramePlan<'_>) {
        self.frames += 1;
        for class in LayerClass::ALL {
            let i = class.index();
            self.peak_used[i] = self.peak_used[i].max(buffers.used(class));
            self.overflow[i] += buffers.overflow(class);
        }
        self.bg_layers_dropped += buffers.bg_layers_dropped();
        self.sprites_dropped += plan.sprites_dropped;
        self.peak_cells = self.peak_cells.max(plan.cells_used);
    }

    pub fn peak(&self, class: LayerClass) -> usize {
        self.peak_used[class.index()]
    }

    pub fn overflow(&self, class: LayerClass) -> u32 {
        self.overflow[class.index()]
    }

    /// Anything dropped since the last reset.
    pub fn has_drops(&self) -> bool {
        self.overflow.iter().any(|&n| n > 0)
            || self.bg_layers_dropped > 0
            || self.sprites_dropped > 0
            || self.transforms_dropped > 0
    }
}
