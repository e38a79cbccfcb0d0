//! Per-frame draw command buffers
//!
//! Four fixed-capacity queues, one per layer class. A queue is filled
//! back-to-front: the first accepted entry takes the last slot, the next one
//! the slot before it, and so on. Walking the slots front-to-back therefore
//! visits the most recent submission first. Once a queue is full further
//! entries are dropped and counted; nothing already queued is touched.

use super::ScreenRect;

/// Layer class of a draw command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerClass {
    OpaqueBg,
    TransparentBg,
    OpaqueObj,
    TransparentObj,
}

impl LayerClass {
    pub const ALL: [LayerClass; 4] = [
        LayerClass::OpaqueBg,
        LayerClass::TransparentBg,
        LayerClass::OpaqueObj,
        LayerClass::TransparentObj,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Tileset (or sprite) source in sprite memory, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSource {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub hi_color: bool,
}

/// Where a layer's coordinate transform lives in "other" memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformRef {
    #[default]
    None,
    /// One matrix for the whole layer
    Affine { row: u32 },
    /// One matrix per window line, starting at `row`
    PerLine { row: u32 },
}

/// Snapshot of one background layer placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapCommand {
    /// Map window in map memory, in cells
    pub map_x: u32,
    pub map_y: u32,
    pub map_w: u32,
    pub map_h: u32,
    /// Tile grid source
    pub tileset: PixelSource,
    pub tile_w: u32,
    pub tile_h: u32,
    /// Base palette row
    pub palette_row: u32,
    /// Destination window on screen
    pub window: ScreenRect,
    pub scroll_x: i32,
    pub scroll_y: i32,
    pub wrap: bool,
    pub priority: u8,
    pub transform: TransformRef,
}

impl MapCommand {
    /// Size of the map in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.map_w * self.tile_w, self.map_h * self.tile_h)
    }

    pub fn tiles_per_row(&self) -> u32 {
        (self.tileset.w / self.tile_w.max(1)).max(1)
    }
}

/// Snapshot of one sprite placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjCommand {
    pub source: PixelSource,
    /// Destination rectangle on screen (scaled from `source` if sizes differ)
    pub dest: ScreenRect,
    pub palette_row: u32,
    pub flip_h: bool,
    pub flip_v: bool,
    pub priority: u8,
}

/// One fixed-capacity queue.
#[derive(Debug, Clone)]
pub struct CommandBuffer<T> {
    /// Accepted entries in submission order (slot `capacity - 1 - i`)
    entries: Vec<T>,
    capacity: usize,
    /// Entries rejected this frame
    overflow: u32,
    label: &'static str,
}

impl<T> CommandBuffer<T> {
    pub fn new(label: &'static str, capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            overflow: 0,
            label,
        }
    }

    /// Queue an entry. Returns false (and logs) if the buffer is full.
    pub fn enqueue(&mut self, entry: T) -> bool {
        if self.entries.len() >= self.capacity {
            self.overflow += 1;
            tracing::debug!(
                "{} command buffer full ({} entries), dropping draw ({} dropped this frame)",
                self.label,
                self.capacity,
                self.overflow
            );
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn used(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.entries.len()
    }

    pub fn overflow(&self) -> u32 {
        self.overflow
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in submission order.
    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    /// Entries in slot order (most recent submission first).
    pub fn slots(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().rev()
    }

    /// Restore full capacity.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.overflow = 0;
    }
}

/// The four per-frame queues plus the background layer budget.
#[derive(Debug, Clone)]
pub struct CommandBuffers {
    pub opaque_bg: CommandBuffer<MapCommand>,
    pub transparent_bg: CommandBuffer<MapCommand>,
    pub opaque_obj: CommandBuffer<ObjCommand>,
    pub transparent_obj: CommandBuffer<ObjCommand>,
    bg_layer_budget: usize,
    bg_layers_dropped: u32,
}

impl CommandBuffers {
    pub fn new(
        opaque_bg: usize,
        transparent_bg: usize,
        opaque_obj: usize,
        transparent_obj: usize,
        bg_layer_budget: usize,
    ) -> Self {
        Self {
            opaque_bg: CommandBuffer::new("Opaque BG", opaque_bg),
            transparent_bg: CommandBuffer::new("Transparent BG", transparent_bg),
            opaque_obj: CommandBuffer::new("Opaque OBJ", opaque_obj),
            transparent_obj: CommandBuffer::new("Transparent OBJ", transparent_obj),
            bg_layer_budget,
            bg_layers_dropped: 0,
        }
    }

    /// Queue a background layer, subject to the layer budget.
    pub fn push_background(&mut self, command: MapCommand, transparent: bool) -> bool {
        let layers = self.opaque_bg.used() + self.transparent_bg.used();
        if layers >= self.bg_layer_budget {
            self.bg_layers_dropped += 1;
            tracing::debug!(
                "Background layer budget of {} reached, dropping layer",
                self.bg_layer_budget
            );
            return false;
        }
        if transparent {
            self.transparent_bg.enqueue(command)
        } else {
            self.opaque_bg.enqueue(command)
        }
    }

    /// Queue a sprite. The cell budget is applied later, at composite time.
    pub fn push_sprite(&mut self, command: ObjCommand, transparent: bool) -> bool {
        if transparent {
            self.transparent_obj.enqueue(command)
        } else {
            self.opaque_obj.enqueue(command)
        }
    }

    pub fn used(&self, class: LayerClass) -> usize {
        match class {
            LayerClass::OpaqueBg => self.opaque_bg.used(),
            LayerClass::TransparentBg => self.transparent_bg.used(),
            LayerClass::OpaqueObj => self.opaque_obj.used(),
            LayerClass::TransparentObj => self.transparent_obj.used(),
        }
    }

    pub fn overflow(&self, class: LayerClass) -> u32 {
        match class {
            LayerClass::OpaqueBg => self.opaque_bg.overflow(),
            LayerClass::TransparentBg => self.transparent_bg.overflow(),
            LayerClass::OpaqueObj => self.opaque_obj.overflow(),
            LayerClass::TransparentObj => self.transparent_obj.overflow(),
        }
    }

    pub fn bg_layers_dropped(&self) -> u32 {
        self.bg_layers_dropped
    }

    /// Reset every queue for the next frame.
    pub fn reset(&mut self) {
        self.opaque_bg.reset();
        self.transparent_bg.reset();
        self.opaque_obj.reset();
        self.transparent_obj.reset();
        self.bg_layers_dropped = 0;
    }
}
