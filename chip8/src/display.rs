//! Monochrome display buffer.
use std::ops::Index;

use crate::constants::*;

/// How sprite pixels past the right or bottom edge are handled.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SpriteEdge {
    /// Pixels outside the screen are dropped.
    #[default]
    Clip,
    /// Pixels outside the screen wrap around to the opposite edge.
    Wrap,
}

/// 64x32 grid of pixels, stored row-major.
pub struct DisplayBuffer {
    pixels: Box<[bool; DISPLAY_BUFFER_SIZE]>,
    /// Set when the buffer changed since the host last consumed it.
    dirty: bool,
}

impl Default for DisplayBuffer {
    fn default() -> Self {
        Self {
            pixels: Box::new([false; DISPLAY_BUFFER_SIZE]),
            dirty: false,
        }
    }
}

impl DisplayBuffer {
    pub fn new() -> Self {
        Default::default()
    }

    #[inline]
    pub fn pixels(&self) -> &[bool; DISPLAY_BUFFER_SIZE] {
        &self.pixels
    }

    /// Pixel at the given coordinate, `false` when outside the screen.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < DISPLAY_WIDTH && y < DISPLAY_HEIGHT && self.pixels[x + y * DISPLAY_WIDTH]
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Turn all pixels off.
    pub fn clear(&mut self) {
        self.pixels.fill(false);
        self.dirty = true;
    }

    /// Blit a sprite with XOR at the given coordinate.
    ///
    /// Each byte of `rows` is one 8 pixel row, most significant bit leftmost.
    /// Returns `true` when any pixel was switched from on to off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, rows: &[u8], edge: SpriteEdge) -> bool {
        let mut is_erased = false;

        for (r, row) in rows.iter().enumerate() {
            for c in 0..SPRITE_WIDTH {
                if (row >> (7 - c)) & 1 == 0 {
                    continue;
                }

                let (px, py) = match edge {
                    SpriteEdge::Clip => (x + c, y + r),
                    SpriteEdge::Wrap => ((x + c) % DISPLAY_WIDTH, (y + r) % DISPLAY_HEIGHT),
                };
                if px >= DISPLAY_WIDTH || py >= DISPLAY_HEIGHT {
                    continue;
                }

                let d = px + py * DISPLAY_WIDTH;

                // XOR erases a pixel that was already on.
                is_erased |= self.pixels[d];
                self.pixels[d] = !self.pixels[d];
            }
        }

        self.dirty = true;
        is_erased
    }
}

impl Index<usize> for DisplayBuffer {
    type Output = bool;

    fn index(&self, index: usize) -> &bool {
        &self.pixels[index]
    }
}
