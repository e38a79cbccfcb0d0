//! Composited frame storage.

use retrovdp_shared::Color;
use xxhash_rust::xxh3::xxh3_64;

/// Final RGBA pixels of a frame, row-major, one packed `0xAABBGGRR` per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::BLACK.to_u32(); (width * height) as usize],
        }
    }

    /// Wrap RGBA bytes read back from a render target.
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Self {
        let pixels = bytes
            .chunks_exact(4)
            .map(|p| u32::from_le_bytes([p[0], p[1], p[2], p[3]]))
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color.to_u32());
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        Color(self.pixels[(y * self.width + x) as usize])
    }

    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[(y * self.width + x) as usize] = color.to_u32();
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Bytes in R, G, B, A order.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_le_bytes()).collect()
    }

    /// xxh3 hash of the RGBA bytes, for reproducibility checks.
    pub fn checksum(&self) -> u64 {
        xxh3_64(&self.to_rgba_bytes())
    }

    pub fn to_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_fn(self.width, self.height, |x, y| {
            image::Rgba(self.pixel(x, y).to_rgba_bytes())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_are_rgba_order() {
        let mut fb = Framebuffer::new(2, 1);
        fb.set_pixel(1, 0, Color::from_rgba(1, 2, 3, 4));
        assert_eq!(fb.to_rgba_bytes(), [0, 0, 0, 255, 1, 2, 3, 4]);

        let back = Framebuffer::from_rgba_bytes(2, 1, &fb.to_rgba_bytes());
        assert_eq!(back, fb);
    }

    #[test]
    fn checksum_tracks_content() {
        let mut a = Framebuffer::new(4, 4);
        let b = a.clone();
        assert_eq!(a.checksum(), b.checksum());
        a.set_pixel(3, 3, Color::WHITE);
        assert_ne!(a.checksum(), b.checksum());
    }

    #[test]
    fn image_matches_pixels() {
        let mut fb = Framebuffer::new(3, 2);
        fb.set_pixel(2, 1, Color::from_rgba(10, 20, 30, 255));
        let image = fb.to_image();
        assert_eq!(image.get_pixel(2, 1).0, [10, 20, 30, 255]);
    }
}
