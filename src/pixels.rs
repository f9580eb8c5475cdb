//! Pixel Surfaces
//!
//! `PixelData` is a rectangular surface of palette indices stored row-major,
//! top row first. Every bank that owns pixels (sprite atlas, tile cache,
//! scroll buffer, frame buffer) is built on it.

use crate::common::{repeat, ColorIndex, TRANSPARENT};

/// A rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }
}

/// A surface of color indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelData {
    width: i32,
    height: i32,
    pixels: Vec<ColorIndex>,
    /// Sample reads wrap around the edges instead of returning transparent
    pub wrap_mode: bool,
}

impl Default for PixelData {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl PixelData {
    /// Create a transparent surface. Negative sizes are treated as zero.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            pixels: vec![TRANSPARENT; (width * height) as usize],
            wrap_mode: false,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn total_pixels(&self) -> usize {
        self.pixels.len()
    }

    pub fn pixels(&self) -> &[ColorIndex] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [ColorIndex] {
        &mut self.pixels
    }

    /// Reallocate to a new size, clearing every pixel to transparent
    pub fn resize(&mut self, width: i32, height: i32) {
        self.width = width.max(0);
        self.height = height.max(0);
        self.pixels.clear();
        self.pixels.resize((self.width * self.height) as usize, TRANSPARENT);
    }

    /// Fill every pixel with `color`
    pub fn clear(&mut self, color: ColorIndex) {
        self.pixels.fill(color);
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if self.wrap_mode {
            if self.width == 0 || self.height == 0 {
                return None;
            }
            let x = repeat(x, self.width);
            let y = repeat(y, self.height);
            return Some((x + y * self.width) as usize);
        }
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some((x + y * self.width) as usize)
    }

    /// Read one pixel; transparent when outside a non-wrapping surface
    pub fn get_pixel(&self, x: i32, y: i32) -> ColorIndex {
        self.offset(x, y).map_or(TRANSPARENT, |i| self.pixels[i])
    }

    /// Write one pixel; ignored when outside a non-wrapping surface
    pub fn set_pixel(&mut self, x: i32, y: i32, value: ColorIndex) {
        if let Some(i) = self.offset(x, y) {
            self.pixels[i] = value;
        }
    }

    /// Copy a block into `dest`, resizing `dest` to `width * height`
    pub fn get_pixels(&self, x: i32, y: i32, width: i32, height: i32, dest: &mut Vec<ColorIndex>) {
        let width = width.max(0);
        let height = height.max(0);
        dest.resize((width * height) as usize, TRANSPARENT);

        // Fast path: the block lies fully inside the surface
        if x >= 0 && y >= 0 && x + width <= self.width && y + height <= self.height {
            for row in 0..height {
                let src = ((y + row) * self.width + x) as usize;
                let dst = (row * width) as usize;
                dest[dst..dst + width as usize].copy_from_slice(&self.pixels[src..src + width as usize]);
            }
            return;
        }

        for row in 0..height {
            for col in 0..width {
                dest[(col + row * width) as usize] = self.get_pixel(x + col, y + row);
            }
        }
    }

    /// Overwrite a block with `src`, transparent pixels included
    ///
    /// `src` must hold at least `width * height` pixels; missing pixels are
    /// left untouched.
    pub fn set_pixels(&mut self, x: i32, y: i32, width: i32, height: i32, src: &[ColorIndex]) {
        for row in 0..height.max(0) {
            for col in 0..width.max(0) {
                let i = (col + row * width) as usize;
                if let Some(&value) = src.get(i) {
                    self.set_pixel(x + col, y + row, value);
                }
            }
        }
    }

    /// Blit a sample of `src` (a surface `src_width` wide) into this surface
    ///
    /// Writes outside this surface are clipped. Transparent source pixels are
    /// skipped when `ignore_transparent` is set, otherwise they overwrite.
    /// `color_offset` is added to every non-transparent pixel written.
    pub fn merge_pixels(
        &mut self,
        src: &[ColorIndex],
        src_width: i32,
        sample: Rect,
        dest_x: i32,
        dest_y: i32,
        color_offset: i32,
        ignore_transparent: bool,
    ) {
        if src_width <= 0 {
            return;
        }

        // Clip the sample against the destination
        let start_col = (-dest_x).max(0);
        let start_row = (-dest_y).max(0);
        let end_col = sample.width.min(self.width - dest_x);
        let end_row = sample.height.min(self.height - dest_y);

        if start_col >= end_col || start_row >= end_row {
            return;
        }

        for row in start_row..end_row {
            let src_row = sample.y + row;
            let dst_row = (dest_y + row) * self.width + dest_x;
            for col in start_col..end_col {
                let src_col = sample.x + col;
                if src_col < 0 || src_col >= src_width || src_row < 0 {
                    continue;
                }
                let Some(&pixel) = src.get((src_col + src_row * src_width) as usize) else {
                    continue;
                };
                if pixel < 0 {
                    if ignore_transparent {
                        continue;
                    }
                    self.pixels[(dst_row + col) as usize] = TRANSPARENT;
                } else {
                    self.pixels[(dst_row + col) as usize] = pixel + color_offset;
                }
            }
        }
    }

    /// Blit another surface at (x, y), skipping transparent pixels
    pub fn merge(&mut self, src: &PixelData, x: i32, y: i32, color_offset: i32) {
        let sample = Rect::new(0, 0, src.width, src.height);
        self.merge_pixels(&src.pixels, src.width, sample, x, y, color_offset, true);
    }
}

/// Reorder a `width * height` block in place for horizontal/vertical flips
pub fn flip_pixels(pixels: &mut [ColorIndex], width: i32, height: i32, flip_h: bool, flip_v: bool) {
    if !flip_h && !flip_v {
        return;
    }
    let width = width.max(0) as usize;
    let height = height.max(0) as usize;
    if width == 0 || height == 0 || pixels.len() < width * height {
        return;
    }

    if flip_h {
        for row in pixels.chunks_exact_mut(width).take(height) {
            row.reverse();
        }
    }

    if flip_v {
        for row in 0..height / 2 {
            let (top, bottom) = pixels.split_at_mut((height - 1 - row) * width);
            top[row * width..(row + 1) * width].swap_with_slice(&mut bottom[..width]);
        }
    }
}

/// Add `offset` to every non-transparent pixel; negative pixels become `empty`
pub fn shift_pixels(pixels: &mut [ColorIndex], offset: i32, empty: ColorIndex) {
    for pixel in pixels.iter_mut() {
        *pixel = if *pixel > TRANSPARENT { *pixel + offset } else { empty };
    }
}

/// True when no pixel holds a color
pub fn is_empty(pixels: &[ColorIndex]) -> bool {
    pixels.iter().all(|&p| p < 0)
}
