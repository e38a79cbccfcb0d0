//! Layer coordinate transforms.
//!
//! A transform maps window-local destination pixels to map pixels before
//! scrolling is added. Matrices are stored in "other" memory, one per row,
//! as six f32 words `[a, b, c, d, tx, ty]`:
//!
//! ```text
//! src.x = a * x + c * y + tx
//! src.y = b * x + d * y + ty
//! ```
//!
//! A per-line table evaluates row `y` of the table at `(x, 0)`, so each line
//! gets its own scroll, scale or rotation.

use glam::{Affine2, Mat2, Vec2};
use retrovdp_shared::constants::OTHER_BANK_WIDTH;

/// Words of an "other" memory row used by one matrix.
pub const TRANSFORM_WORDS: usize = 6;

/// Transform applied to a background layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LayerTransform {
    #[default]
    None,
    /// One matrix for every pixel of the layer
    Affine(Affine2),
    /// One matrix per window line
    PerLine(LineTransform),
}

/// Dense table of per-line matrices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineTransform {
    lines: Vec<Affine2>,
}

impl LineTransform {
    pub fn new(lines: Vec<Affine2>) -> Self {
        Self { lines }
    }

    pub fn from_fn(count: u32, f: impl FnMut(u32) -> Affine2) -> Self {
        Self {
            lines: (0..count).map(f).collect(),
        }
    }

    /// Pure horizontal scroll per line (parallax, wave effects). Line `y`
    /// samples map row `y`.
    pub fn horizontal_offsets(offsets: &[f32]) -> Self {
        Self {
            lines: offsets
                .iter()
                .enumerate()
                .map(|(y, &dx)| Affine2::from_translation(Vec2::new(dx, y as f32)))
                .collect(),
        }
    }

    pub fn lines(&self) -> &[Affine2] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Encode a matrix as one "other" memory row.
pub fn encode_affine(m: &Affine2) -> [u32; OTHER_BANK_WIDTH as usize] {
    let mut row = [0u32; OTHER_BANK_WIDTH as usize];
    let words = [
        m.matrix2.x_axis.x,
        m.matrix2.x_axis.y,
        m.matrix2.y_axis.x,
        m.matrix2.y_axis.y,
        m.translation.x,
        m.translation.y,
    ];
    for (dst, w) in row.iter_mut().zip(words) {
        *dst = w.to_bits();
    }
    row
}

/// Decode a matrix from the first [`TRANSFORM_WORDS`] words of a row.
pub fn decode_affine(row: &[u32]) -> Affine2 {
    let w = |i: usize| row.get(i).copied().map(f32::from_bits).unwrap_or(0.0);
    Affine2 {
        matrix2: Mat2::from_cols(Vec2::new(w(0), w(1)), Vec2::new(w(2), w(3))),
        translation: Vec2::new(w(4), w(5)),
    }
}

/// Source pixel for a window-local pixel, before scrolling.
///
/// Written out term by term to match the shader's evaluation order.
#[inline]
pub fn transform_pixel(m: &Affine2, x: i32, y: i32) -> (i32, i32) {
    let (x, y) = (x as f32, y as f32);
    let sx = m.matrix2.x_axis.x * x + m.matrix2.y_axis.x * y + m.translation.x;
    let sy = m.matrix2.x_axis.y * x + m.matrix2.y_axis.y * y + m.translation.y;
    (sx.floor() as i32, sy.floor() as i32)
}

/// Per-frame allocator for transform rows in "other" memory.
///
/// Rows are handed out bump-style and all released at frame end.
#[derive(Debug, Clone)]
pub struct TransformRows {
    base: u32,
    capacity: u32,
    next: u32,
}

impl TransformRows {
    pub fn new(base: u32, capacity: u32) -> Self {
        Self {
            base,
            capacity,
            next: 0,
        }
    }

    /// Reserve `count` consecutive rows; `None` when exhausted.
    pub fn alloc(&mut self, count: u32) -> Option<u32> {
        if count > self.capacity - self.next {
            return None;
        }
        let row = self.base + self.next;
        self.next += count;
        Some(row)
    }

    pub fn used(&self) -> u32 {
        self.next
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}
