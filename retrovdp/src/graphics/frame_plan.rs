//! Frame plan: the order in which both compositors draw.
//!
//! Pass order is fixed: opaque sprites, opaque backgrounds, transparent
//! backgrounds, transparent sprites. Opaque passes draw highest priority
//! first and write depth, so with the strict `priority > depth` test the
//! first writer of a pixel wins. Ties within a pass go to the most recent
//! submission (slot order); across passes, sprites win over backgrounds of
//! equal priority. Transparent passes draw back to front (ascending
//! priority, then submission order) without writing depth so blending
//! accumulates.
//!
//! The sprite cell budget is shared by both sprite passes, opaque first.
//! Each sprite costs `ceil(w / cell) * ceil(h / cell)` cells (at least one)
//! of its full destination size, whether or not it is clipped. Sprites are
//! charged in descending priority; the first one that does not fit drops
//! itself and every remaining sprite of that pass.

use super::command_buffer::{CommandBuffers, MapCommand, ObjCommand};

/// Compositing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    OpaqueObj,
    OpaqueBg,
    TransparentBg,
    TransparentObj,
}

impl PassKind {
    pub const ORDER: [PassKind; 4] = [
        PassKind::OpaqueObj,
        PassKind::OpaqueBg,
        PassKind::TransparentBg,
        PassKind::TransparentObj,
    ];

    pub fn is_transparent(self) -> bool {
        matches!(self, PassKind::TransparentBg | PassKind::TransparentObj)
    }
}

/// One item of a pass.
#[derive(Debug, Clone, Copy)]
pub enum Draw<'a> {
    Map(&'a MapCommand),
    Obj(&'a ObjCommand),
}

impl Draw<'_> {
    pub fn priority(&self) -> u8 {
        match self {
            Draw::Map(cmd) => cmd.priority,
            Draw::Obj(cmd) => cmd.priority,
        }
    }
}

/// Budgeted, ordered draws of one frame.
#[derive(Debug, Clone, Default)]
pub struct FramePlan<'a> {
    pub opaque_obj: Vec<&'a ObjCommand>,
    pub opaque_bg: Vec<&'a MapCommand>,
    pub transparent_bg: Vec<&'a MapCommand>,
    pub transparent_obj: Vec<&'a ObjCommand>,
    /// Sprites rejected by the cell budget
    pub sprites_dropped: u32,
    /// Cells charged to accepted sprites
    pub cells_used: u32,
}

impl<'a> FramePlan<'a> {
    pub fn build(buffers: &'a CommandBuffers, cell_size: u32, cell_budget: u32) -> Self {
        let mut plan = FramePlan::default();
        let mut remaining = cell_budget;

        plan.opaque_obj = plan.admit_sprites(
            descending(buffers.opaque_obj.slots()),
            cell_size,
            &mut remaining,
        );
        plan.opaque_bg = descending(buffers.opaque_bg.slots());
        plan.transparent_bg = ascending(buffers.transparent_bg.entries());

        let accepted = plan.admit_sprites(
            descending(buffers.transparent_obj.slots()),
            cell_size,
            &mut remaining,
        );
        plan.transparent_obj = back_to_front(buffers.transparent_obj.entries(), &accepted);

        plan
    }

    /// Draws of one pass, in drawing order.
    pub fn pass(&self, kind: PassKind) -> Vec<Draw<'a>> {
        match kind {
            PassKind::OpaqueObj => self.opaque_obj.iter().copied().map(Draw::Obj).collect(),
            PassKind::OpaqueBg => self.opaque_bg.iter().copied().map(Draw::Map).collect(),
            PassKind::TransparentBg => self.transparent_bg.iter().copied().map(Draw::Map).collect(),
            PassKind::TransparentObj => {
                self.transparent_obj.iter().copied().map(Draw::Obj).collect()
            }
        }
    }

    pub fn draw_count(&self) -> usize {
        self.opaque_obj.len()
            + self.opaque_bg.len()
            + self.transparent_bg.len()
            + self.transparent_obj.len()
    }

    fn admit_sprites(
        &mut self,
        candidates: Vec<&'a ObjCommand>,
        cell_size: u32,
        remaining: &mut u32,
    ) -> Vec<&'a ObjCommand> {
        let mut accepted = Vec::with_capacity(candidates.len());
        for (i, cmd) in candidates.iter().enumerate() {
            let cost = sprite_cells(cmd, cell_size);
            if cost > *remaining {
                let dropped = (candidates.len() - i) as u32;
                self.sprites_dropped += dropped;
                tracing::debug!(
                    "Sprite cell budget exhausted, dropping {} sprites ({} cells left, next costs {})",
                    dropped,
                    remaining,
                    cost
                );
                break;
            }
            *remaining -= cost;
            self.cells_used += cost;
            accepted.push(*cmd);
        }
        accepted
    }
}

/// Cell cost of a sprite at its full destination size.
pub fn sprite_cells(cmd: &ObjCommand, cell_size: u32) -> u32 {
    let cell = cell_size.max(1);
    cmd.dest
        .w
        .div_ceil(cell)
        .saturating_mul(cmd.dest.h.div_ceil(cell))
        .max(1)
}

/// Stable sort by descending priority, keeping slot order for ties.
fn descending<'a, T: Prioritized + 'a>(items: impl Iterator<Item = &'a T>) -> Vec<&'a T> {
    let mut items: Vec<&T> = items.collect();
    items.sort_by(|a, b| b.priority().cmp(&a.priority()));
    items
}

/// Stable sort by ascending priority, keeping submission order for ties.
fn ascending<T: Prioritized>(items: &[T]) -> Vec<&T> {
    let mut items: Vec<&T> = items.iter().collect();
    items.sort_by_key(|c| c.priority());
    items
}

/// Accepted sprites re-ordered back to front.
fn back_to_front<'a>(
    entries: &'a [ObjCommand],
    accepted: &[&'a ObjCommand],
) -> Vec<&'a ObjCommand> {
    let mut kept: Vec<&ObjCommand> = entries
        .iter()
        .filter(|e| accepted.iter().any(|a| std::ptr::eq(*a, *e)))
        .collect();
    kept.sort_by_key(|c| c.priority);
    kept
}

trait Prioritized {
    fn priority(&self) -> u8;
}

impl Prioritized for MapCommand {
    fn priority(&self) -> u8 {
        self.priority
    }
}

impl Prioritized for ObjCommand {
    fn priority(&self) -> u8 {
        self.priority
    }
}
