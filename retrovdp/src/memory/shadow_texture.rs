//! ROM/shadow texture pair for one video memory bank.
//!
//! Every bank keeps two flat copies of the same rectangle: the ROM copy set at
//! load time and never written again, and the shadow copy that receives all
//! writes and is what gets rendered. Writes also grow a dirty rectangle that
//! the GPU compositor drains to re-upload only what changed.

use bytemuck::Pod;

use super::{MemoryKind, MemorySource, Rect};
use crate::error::{AssetError, VdpError};

/// Element width of a bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexelKind {
    U8,
    U16,
    U32,
}

impl TexelKind {
    pub fn size_bytes(self) -> usize {
        match self {
            TexelKind::U8 => 1,
            TexelKind::U16 => 2,
            TexelKind::U32 => 4,
        }
    }
}

/// Flat element storage of one copy of a bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TexelData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl TexelData {
    pub fn zeroed(kind: TexelKind, len: usize) -> Self {
        match kind {
            TexelKind::U8 => TexelData::U8(vec![0; len]),
            TexelKind::U16 => TexelData::U16(vec![0; len]),
            TexelKind::U32 => TexelData::U32(vec![0; len]),
        }
    }

    pub fn kind(&self) -> TexelKind {
        match self {
            TexelData::U8(_) => TexelKind::U8,
            TexelData::U16(_) => TexelKind::U16,
            TexelData::U32(_) => TexelKind::U32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TexelData::U8(v) => v.len(),
            TexelData::U16(v) => v.len(),
            TexelData::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw little-endian bytes, as uploaded to the GPU.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            TexelData::U8(v) => v,
            TexelData::U16(v) => bytemuck::cast_slice(v),
            TexelData::U32(v) => bytemuck::cast_slice(v),
        }
    }
}

/// An element type a bank can be read into or written from.
pub trait Texel: Pod + Default {
    const KIND: TexelKind;

    fn view(data: &TexelData) -> Option<&[Self]>;
    fn view_mut(data: &mut TexelData) -> Option<&mut [Self]>;
    fn wrap(data: Vec<Self>) -> TexelData;
}

macro_rules! impl_texel {
    ($ty:ty, $variant:ident) => {
        impl Texel for $ty {
            const KIND: TexelKind = TexelKind::$variant;

            fn view(data: &TexelData) -> Option<&[Self]> {
                match data {
                    TexelData::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn view_mut(data: &mut TexelData) -> Option<&mut [Self]> {
                match data {
                    TexelData::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn wrap(data: Vec<Self>) -> TexelData {
                TexelData::$variant(data)
            }
        }
    };
}

impl_texel!(u8, U8);
impl_texel!(u16, U16);
impl_texel!(u32, U32);

/// One memory bank: ROM copy, shadow copy and pending GPU sync region.
#[derive(Debug, Clone)]
pub struct ShadowTexture {
    bank: MemoryKind,
    width: u32,
    height: u32,
    /// Storage units packed into one GPU texel (dirty rects align to this)
    units_per_gpu_texel: u32,
    rom: TexelData,
    shadow: TexelData,
    dirty: Option<Rect>,
}

impl ShadowTexture {
    /// Create a bank from its load-time image. The image becomes both the ROM
    /// and the initial shadow contents.
    pub fn new<T: Texel>(
        bank: MemoryKind,
        width: u32,
        height: u32,
        units_per_gpu_texel: u32,
        image: Vec<T>,
    ) -> Result<Self, AssetError> {
        if width == 0 || height == 0 {
            return Err(AssetError::InvalidGeometry {
                bank,
                reason: format!("{width}x{height} is empty"),
            });
        }
        if units_per_gpu_texel == 0 || width % units_per_gpu_texel != 0 {
            return Err(AssetError::InvalidGeometry {
                bank,
                reason: format!("width {width} is not a multiple of {units_per_gpu_texel}"),
            });
        }
        let Some(expected) = width
            .checked_mul(height)
            .and_then(|units| usize::try_from(units).ok())
        else {
            return Err(AssetError::InvalidGeometry {
                bank,
                reason: format!("{width}x{height} is too large"),
            });
        };
        if image.len() != expected {
            return Err(AssetError::SizeMismatch {
                bank,
                expected: expected.saturating_mul(T::KIND.size_bytes()),
                actual: image.len() * T::KIND.size_bytes(),
            });
        }

        let rom = T::wrap(image);
        let shadow = rom.clone();
        Ok(Self {
            bank,
            width,
            height,
            units_per_gpu_texel,
            rom,
            shadow,
            dirty: Some(Rect::new(0, 0, width, height)),
        })
    }

    pub fn bank(&self) -> MemoryKind {
        self.bank
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn kind(&self) -> TexelKind {
        self.shadow.kind()
    }

    pub fn units_per_gpu_texel(&self) -> u32 {
        self.units_per_gpu_texel
    }

    /// The live (shadow) contents as a typed slice.
    pub fn current<T: Texel>(&self) -> Result<&[T], VdpError> {
        T::view(&self.shadow).ok_or_else(|| self.mismatch::<T>())
    }

    /// The load-time contents as a typed slice.
    pub fn rom<T: Texel>(&self) -> Result<&[T], VdpError> {
        T::view(&self.rom).ok_or_else(|| self.mismatch::<T>())
    }

    /// Copy a rectangle into `out`, tightly packed row by row.
    pub fn read_to_buffer<T: Texel>(
        &self,
        source: MemorySource,
        rect: Rect,
        out: &mut [T],
    ) -> Result<(), VdpError> {
        let data = match source {
            MemorySource::Rom => self.rom::<T>()?,
            MemorySource::Current => self.current::<T>()?,
        };
        self.check_region(rect, out.len())?;

        let w = rect.w as usize;
        for row in 0..rect.h as usize {
            let src = self.offset(rect.x, rect.y + row as u32);
            out[row * w..(row + 1) * w].copy_from_slice(&data[src..src + w]);
        }
        Ok(())
    }

    /// Copy a tightly packed rectangle into the shadow copy.
    pub fn write_to<T: Texel>(&mut self, rect: Rect, data: &[T]) -> Result<(), VdpError> {
        let mismatch = self.mismatch::<T>();
        self.check_region(rect, data.len())?;
        let width = self.width as usize;
        let shadow = T::view_mut(&mut self.shadow).ok_or(mismatch)?;

        let w = rect.w as usize;
        for row in 0..rect.h as usize {
            let dst = (rect.y as usize + row) * width + rect.x as usize;
            shadow[dst..dst + w].copy_from_slice(&data[row * w..(row + 1) * w]);
        }

        self.mark_dirty(rect);
        Ok(())
    }

    /// Restore a rectangle of the shadow copy from ROM.
    pub fn restore_from_rom(&mut self, rect: Rect) -> Result<(), VdpError> {
        self.check_region(rect, rect.area())?;
        let width = self.width as usize;
        let unit = self.kind().size_bytes();
        let rom = self.rom.as_bytes().to_vec();
        let shadow = shadow_bytes_mut(&mut self.shadow);

        for row in 0..rect.h as usize {
            let start = ((rect.y as usize + row) * width + rect.x as usize) * unit;
            let end = start + rect.w as usize * unit;
            shadow[start..end].copy_from_slice(&rom[start..end]);
        }

        self.mark_dirty(rect);
        Ok(())
    }

    /// Pending GPU sync region, in storage units, aligned to GPU texels.
    pub fn dirty(&self) -> Option<Rect> {
        self.dirty
    }

    /// Take the pending GPU sync region, clearing it.
    pub fn take_dirty(&mut self) -> Option<Rect> {
        self.dirty.take()
    }

    /// Schedule a full re-upload (e.g. after the GPU texture was recreated).
    pub fn mark_all_dirty(&mut self) {
        self.dirty = Some(Rect::new(0, 0, self.width, self.height));
    }

    /// Raw bytes of a region of the shadow copy, rows tightly packed.
    ///
    /// `rect` must be aligned to GPU texels (as returned by [`Self::take_dirty`]).
    pub fn region_bytes(&self, rect: Rect) -> Vec<u8> {
        let unit = self.kind().size_bytes();
        let bytes = self.shadow.as_bytes();
        let row_len = rect.w as usize * unit;
        let mut out = Vec::with_capacity(row_len * rect.h as usize);
        for row in 0..rect.h {
            let start = self.offset(rect.x, rect.y + row) * unit;
            out.extend_from_slice(&bytes[start..start + row_len]);
        }
        out
    }

    fn mark_dirty(&mut self, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        let widened = rect.align_x(self.units_per_gpu_texel);
        self.dirty = Some(match self.dirty {
            Some(existing) => existing.union(widened),
            None => widened,
        });
    }

    fn check_region(&self, rect: Rect, len: usize) -> Result<(), VdpError> {
        let fits_x = rect.x.checked_add(rect.w).is_some_and(|r| r <= self.width);
        let fits_y = rect.y.checked_add(rect.h).is_some_and(|b| b <= self.height);
        if !fits_x || !fits_y {
            return Err(VdpError::OutOfBounds {
                bank: self.bank,
                x: rect.x,
                y: rect.y,
                w: rect.w,
                h: rect.h,
                width: self.width,
                height: self.height,
            });
        }
        let expected = rect.area();
        if len != expected {
            return Err(VdpError::BufferSizeMismatch {
                expected,
                actual: len,
            });
        }
        Ok(())
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    fn mismatch<T: Texel>(&self) -> VdpError {
        VdpError::ElementTypeMismatch {
            bank: self.bank,
            expected: self.kind(),
            actual: T::KIND,
        }
    }
}

fn shadow_bytes_mut(data: &mut TexelData) -> &mut [u8] {
    match data {
        TexelData::U8(v) => v,
        TexelData::U16(v) => bytemuck::cast_slice_mut(v),
        TexelData::U32(v) => bytemuck::cast_slice_mut(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette_bank() -> ShadowTexture {
        let image: Vec<u32> = (0..16 * 4).collect();
        ShadowTexture::new(MemoryKind::Palette, 16, 4, 1, image).unwrap()
    }

    fn sprite_bank() -> ShadowTexture {
        let image: Vec<u8> = (0..32 * 4).map(|i| i as u8).collect();
        ShadowTexture::new(MemoryKind::Sprite, 32, 4, 4, image).unwrap()
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut bank = palette_bank();
        let rect = Rect::new(3, 1, 4, 2);
        let data: Vec<u32> = (100..108).collect();
        bank.write_to(rect, &data).unwrap();

        let mut out = vec![0u32; 8];
        bank.read_to_buffer(MemorySource::Current, rect, &mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn rom_is_unaffected_by_writes() {
        let mut bank = palette_bank();
        let rect = Rect::new(0, 0, 2, 1);
        bank.write_to(rect, &[0xAAAAu32, 0xBBBBu32]).unwrap();

        let mut rom = [0u32; 2];
        bank.read_to_buffer(MemorySource::Rom, rect, &mut rom).unwrap();
        assert_eq!(rom, [0, 1]);

        let mut current = [0u32; 2];
        bank.read_to_buffer(MemorySource::Current, rect, &mut current)
            .unwrap();
        assert_eq!(current, [0xAAAA, 0xBBBB]);
    }

    #[test]
    fn restore_from_rom_undoes_writes() {
        let mut bank = palette_bank();
        let rect = Rect::new(1, 1, 3, 2);
        bank.write_to(rect, &[9u32; 6]).unwrap();
        bank.restore_from_rom(rect).unwrap();
        assert_eq!(bank.current::<u32>().unwrap(), bank.rom::<u32>().unwrap());
    }

    #[test]
    fn mismatched_element_type_fails() {
        let mut bank = palette_bank();
        let mut out = [0u8; 4];
        let err = bank
            .read_to_buffer(MemorySource::Current, Rect::new(0, 0, 4, 1), &mut out)
            .unwrap_err();
        assert_eq!(
            err,
            VdpError::ElementTypeMismatch {
                bank: MemoryKind::Palette,
                expected: TexelKind::U32,
                actual: TexelKind::U8,
            }
        );
        assert!(bank.write_to(Rect::new(0, 0, 1, 1), &[1u16]).is_err());
    }

    #[test]
    fn out_of_bounds_and_wrong_length_fail() {
        let mut bank = palette_bank();
        assert!(matches!(
            bank.write_to(Rect::new(15, 0, 2, 1), &[0u32; 2]),
            Err(VdpError::OutOfBounds { .. })
        ));
        assert!(matches!(
            bank.write_to(Rect::new(0, 0, 2, 2), &[0u32; 3]),
            Err(VdpError::BufferSizeMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn unaddressable_geometry_is_rejected() {
        assert!(matches!(
            ShadowTexture::new(MemoryKind::Map, 65536, 65536, 1, Vec::<u16>::new()),
            Err(AssetError::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn new_bank_is_fully_dirty_once() {
        let mut bank = palette_bank();
        assert_eq!(bank.take_dirty(), Some(Rect::new(0, 0, 16, 4)));
        assert_eq!(bank.take_dirty(), None);
    }

    #[test]
    fn dirty_rect_widens_to_gpu_texels() {
        let mut bank = sprite_bank();
        bank.take_dirty();

        bank.write_to(Rect::new(5, 1, 2, 1), &[1u8, 2]).unwrap();
        assert_eq!(bank.dirty(), Some(Rect::new(4, 1, 4, 1)));

        bank.write_to(Rect::new(9, 3, 1, 1), &[3u8]).unwrap();
        assert_eq!(bank.take_dirty(), Some(Rect::new(4, 1, 8, 3)));
    }

    #[test]
    fn region_bytes_packs_rows() {
        let bank = sprite_bank();
        let bytes = bank.region_bytes(Rect::new(4, 1, 4, 2));
        assert_eq!(bytes, [36, 37, 38, 39, 68, 69, 70, 71]);
    }

    #[test]
    fn geometry_is_validated() {
        assert!(matches!(
            ShadowTexture::new(MemoryKind::Sprite, 30, 1, 4, vec![0u8; 30]),
            Err(AssetError::InvalidGeometry { .. })
        ));
        assert!(matches!(
            ShadowTexture::new(MemoryKind::Map, 4, 4, 1, vec![0u16; 15]),
            Err(AssetError::SizeMismatch {
                expected: 32,
                actual: 30,
                ..
            })
        ));
    }
}
