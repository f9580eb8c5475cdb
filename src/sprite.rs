//! Sprite Bank
//!
//! The sprite bank is an atlas surface divided into fixed-size cells. Cells
//! are numbered left to right, top to bottom. Each written cell carries a
//! content signature (CRC-32 of its indices) used to detect exact duplicates
//! when importing artwork.

use log::{debug, warn};

use crate::common::{ceil_to_multiple, in_bounds, ColorIndex, SpriteId, TRANSPARENT};
use crate::config::GraphicsConfig;
use crate::error::{check_dimensions, Error, Result};
use crate::pixels::{self, PixelData};

/// Maximum atlas page count
pub const MAX_PAGES: i32 = 8;

/// Deterministic digest of a cell's pixels
pub fn signature(pixels: &[ColorIndex]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for pixel in pixels {
        hasher.update(&pixel.to_le_bytes());
    }
    hasher.finalize()
}

/// Sprite Bank
#[derive(Debug, Clone)]
pub struct SpriteBank {
    /// Cell width
    width: i32,
    /// Cell height
    height: i32,
    page_width: i32,
    page_height: i32,
    pages: i32,
    colors_per_sprite: i32,
    /// Reject writes that duplicate another cell
    pub unique: bool,
    atlas: PixelData,
    signatures: Vec<Option<u32>>,
    pixel_cache: Vec<Option<Vec<ColorIndex>>>,
}

impl SpriteBank {
    /// Create an atlas of `pages` pages, each `page_width x page_height`
    pub fn new(width: i32, height: i32, page_width: i32, page_height: i32, pages: i32) -> Result<Self> {
        check_dimensions("sprite", width, height)?;
        check_dimensions("sprite page", page_width, page_height)?;
        if page_width % width != 0 || page_height % height != 0 {
            return Err(Error::Config(format!(
                "sprite page {}x{} is not a whole number of {}x{} cells",
                page_width, page_height, width, height
            )));
        }

        let pages = pages.clamp(1, MAX_PAGES);
        let mut bank = Self {
            width,
            height,
            page_width,
            page_height,
            pages,
            colors_per_sprite: 8,
            unique: false,
            atlas: PixelData::new(page_width, page_height * pages),
            signatures: Vec::new(),
            pixel_cache: Vec::new(),
        };
        bank.clear();
        Ok(bank)
    }

    pub fn from_config(config: &GraphicsConfig) -> Result<Self> {
        let mut bank = Self::new(
            config.width,
            config.height,
            config.sprite_page_width,
            config.sprite_page_height,
            config.sprite_pages,
        )?;
        bank.unique = config.unique;
        Ok(bank)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn texture_width(&self) -> i32 {
        self.atlas.width()
    }

    pub fn texture_height(&self) -> i32 {
        self.atlas.height()
    }

    pub fn atlas(&self) -> &PixelData {
        &self.atlas
    }

    pub fn pages(&self) -> i32 {
        self.pages
    }

    /// Change the page count (clamped to 1-8). Destructive when the size changes.
    pub fn set_pages(&mut self, pages: i32) {
        let pages = pages.clamp(1, MAX_PAGES);
        if pages == self.pages {
            return;
        }
        self.pages = pages;
        self.resize(self.page_width, self.page_height * pages);
    }

    pub fn colors_per_sprite(&self) -> i32 {
        self.colors_per_sprite
    }

    pub fn set_colors_per_sprite(&mut self, value: i32) {
        self.colors_per_sprite = value.clamp(1, 16);
    }

    pub fn sprites_per_page(&self) -> i32 {
        (self.page_width / self.width) * (self.page_height / self.height)
    }

    /// Number of addressable cells in the current atlas
    pub fn total_sprites(&self) -> i32 {
        (self.atlas.width() / self.width) * (self.atlas.height() / self.height)
    }

    /// Number of cells that have been written
    pub fn sprites_in_memory(&self) -> usize {
        self.signatures.iter().filter(|s| s.is_some()).count()
    }

    /// Pixels per cell
    pub fn cell_size(&self) -> usize {
        (self.width * self.height) as usize
    }

    /// Top-left atlas position of a cell
    pub fn cell_position(&self, index: SpriteId) -> (i32, i32) {
        let columns = (self.atlas.width() / self.width).max(1);
        ((index % columns) * self.width, (index / columns) * self.height)
    }

    /// Resize the atlas, rounding up to whole cells
    ///
    /// Changing the size clears every cell and signature. An atlas that is
    /// not a whole stack of the current pages becomes a single page.
    pub fn resize(&mut self, width: i32, height: i32) {
        let width = ceil_to_multiple(width, self.width);
        let height = ceil_to_multiple(height, self.height);

        let stacked = height / self.page_height;
        if width == self.page_width && height % self.page_height == 0 && (1..=MAX_PAGES).contains(&stacked) {
            self.pages = stacked;
        } else {
            self.page_width = width;
            self.page_height = height;
            self.pages = 1;
        }

        if width != self.atlas.width() || height != self.atlas.height() {
            self.atlas.resize(width, height);
            self.clear();
            debug!("sprite atlas resized to {}x{} ({} cells)", width, height, self.total_sprites());
        }
    }

    /// Reset every cell to transparent and forget all signatures
    pub fn clear(&mut self) {
        let total = self.total_sprites() as usize;
        self.atlas.clear(TRANSPARENT);
        self.signatures.clear();
        self.signatures.resize(total, None);
        self.pixel_cache.clear();
        self.pixel_cache.resize(total, None);
    }

    /// Copy a cell's pixels into `dest`, resizing it to one cell
    ///
    /// Out-of-range indices (including -1) produce a transparent cell.
    pub fn read_cell_at(&mut self, index: SpriteId, dest: &mut Vec<ColorIndex>) {
        let size = self.cell_size();
        if !in_bounds(index, self.pixel_cache.len()) {
            dest.clear();
            dest.resize(size, TRANSPARENT);
            return;
        }

        let slot = index as usize;
        if self.pixel_cache[slot].is_none() {
            let (x, y) = self.cell_position(index);
            let mut cell = Vec::with_capacity(size);
            self.atlas.get_pixels(x, y, self.width, self.height, &mut cell);
            self.pixel_cache[slot] = Some(cell);
        }

        if let Some(cell) = &self.pixel_cache[slot] {
            dest.clear();
            dest.extend_from_slice(cell);
        }
    }

    /// Read a cell without touching the pixel cache
    pub fn peek_cell_at(&self, index: SpriteId, dest: &mut Vec<ColorIndex>) {
        if !in_bounds(index, self.signatures.len()) {
            dest.clear();
            dest.resize(self.cell_size(), TRANSPARENT);
            return;
        }
        match &self.pixel_cache[index as usize] {
            Some(cell) => {
                dest.clear();
                dest.extend_from_slice(cell);
            }
            None => {
                let (x, y) = self.cell_position(index);
                self.atlas.get_pixels(x, y, self.width, self.height, dest);
            }
        }
    }

    /// Write a cell and refresh its signature
    ///
    /// Rejected (returns false) when the index is out of range, `pixels`
    /// is not exactly one cell, or `unique` is set and another cell already
    /// holds the same non-empty content.
    pub fn update_cell_at(&mut self, index: SpriteId, pixels: &[ColorIndex]) -> bool {
        if !in_bounds(index, self.signatures.len()) {
            return false;
        }
        if pixels.len() != self.cell_size() {
            warn!(
                "sprite {}: expected {} pixels, got {}",
                index,
                self.cell_size(),
                pixels.len()
            );
            return false;
        }

        if self.unique && !pixels::is_empty(pixels) {
            let existing = self.find_cell(pixels, false);
            if existing != -1 && existing != index {
                debug!("sprite {} duplicates sprite {}, write skipped", index, existing);
                return false;
            }
        }

        let (x, y) = self.cell_position(index);
        self.atlas.set_pixels(x, y, self.width, self.height, pixels);

        let slot = index as usize;
        self.signatures[slot] = Some(signature(pixels));
        self.pixel_cache[slot] = Some(pixels.to_vec());
        true
    }

    /// First cell whose content equals `pixels`, or -1
    ///
    /// With `empty_check`, fully transparent input always returns -1.
    pub fn find_cell(&self, pixels: &[ColorIndex], empty_check: bool) -> SpriteId {
        if empty_check && pixels::is_empty(pixels) {
            return -1;
        }
        if pixels.len() != self.cell_size() {
            return -1;
        }

        let wanted = signature(pixels);
        let mut cell = Vec::with_capacity(self.cell_size());
        for (i, sig) in self.signatures.iter().enumerate() {
            if *sig != Some(wanted) {
                continue;
            }
            // Signatures can collide; compare the pixels
            self.peek_cell_at(i as SpriteId, &mut cell);
            if cell == pixels {
                return i as SpriteId;
            }
        }
        -1
    }

    /// First cell that has never been written, or -1 when the atlas is full
    pub fn next_empty_cell_id(&self) -> SpriteId {
        self.signatures
            .iter()
            .position(Option::is_none)
            .map_or(-1, |i| i as SpriteId)
    }

    /// Whether a cell has never been written
    pub fn is_empty_at(&self, index: SpriteId) -> bool {
        in_bounds(index, self.signatures.len()) && self.signatures[index as usize].is_none()
    }

    /// Signature of a written cell
    pub fn signature_at(&self, index: SpriteId) -> Option<u32> {
        if in_bounds(index, self.signatures.len()) {
            self.signatures[index as usize]
        } else {
            None
        }
    }

    /// Number of signature slots (always equals `total_sprites`)
    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bank() -> SpriteBank {
        SpriteBank::new(8, 8, 32, 32, 1).unwrap()
    }

    fn cell(value: i32) -> Vec<i32> {
        (0..64).map(|i| (i + value) % 16).collect()
    }

    #[test]
    fn test_layout() {
        let bank = bank();
        assert_eq!(bank.total_sprites(), 16);
        assert_eq!(bank.signature_count(), 16);
        assert_eq!(bank.cell_position(5), (8, 8));
        assert_eq!(bank.sprites_in_memory(), 0);
    }

    #[test]
    fn test_invalid_layout() {
        assert!(SpriteBank::new(0, 8, 32, 32, 1).is_err());
        assert!(SpriteBank::new(8, 8, 30, 32, 1).is_err());
    }

    #[test]
    fn test_round_trip() {
        let mut bank = bank();
        let pixels = cell(3);
        assert!(bank.update_cell_at(5, &pixels));

        let mut buf = Vec::new();
        bank.read_cell_at(5, &mut buf);
        assert_eq!(buf, pixels);
        assert_eq!(bank.atlas().get_pixel(8, 8), pixels[0]);
        assert_eq!(bank.atlas().get_pixel(15, 15), pixels[63]);
    }

    #[test]
    fn test_read_populates_cache_from_atlas() {
        let mut bank = bank();
        let mut buf = vec![0; 3];
        bank.read_cell_at(2, &mut buf);
        assert_eq!(buf.len(), 64);
        assert!(buf.iter().all(|&p| p == TRANSPARENT));
    }

    #[test]
    fn test_out_of_range_reads_transparent() {
        let mut bank = bank();
        let mut buf = Vec::new();
        bank.read_cell_at(-1, &mut buf);
        assert_eq!(buf, vec![TRANSPARENT; 64]);
        bank.read_cell_at(16, &mut buf);
        assert_eq!(buf, vec![TRANSPARENT; 64]);
    }

    #[test]
    fn test_rejects_out_of_range_and_bad_length() {
        let mut bank = bank();
        assert!(!bank.update_cell_at(16, &cell(0)));
        assert!(!bank.update_cell_at(-1, &cell(0)));
        assert!(!bank.update_cell_at(0, &[1, 2, 3]));
        assert_eq!(bank.sprites_in_memory(), 0);
        assert!(bank.atlas().pixels().iter().all(|&p| p == TRANSPARENT));
    }

    #[test]
    fn test_find_cell() {
        let mut bank = bank();
        bank.unique = true;
        let pixels = cell(7);
        bank.update_cell_at(5, &pixels);
        assert_eq!(bank.find_cell(&pixels, false), 5);
        assert_eq!(bank.find_cell(&cell(8), false), -1);
        assert_eq!(bank.find_cell(&vec![TRANSPARENT; 64], true), -1);
    }

    #[test]
    fn test_unique_rejects_duplicate() {
        let mut bank = bank();
        bank.unique = true;
        let pixels = cell(1);
        assert!(bank.update_cell_at(0, &pixels));
        assert!(!bank.update_cell_at(1, &pixels));
        assert!(bank.update_cell_at(0, &pixels));
        assert!(bank.is_empty_at(1));
    }

    #[test]
    fn test_next_empty_cell_id() {
        let mut bank = bank();
        assert_eq!(bank.next_empty_cell_id(), 0);
        bank.update_cell_at(0, &cell(0));
        bank.update_cell_at(1, &vec![TRANSPARENT; 64]);
        assert_eq!(bank.next_empty_cell_id(), 2);
        for i in 0..16 {
            bank.update_cell_at(i, &cell(i));
        }
        assert_eq!(bank.next_empty_cell_id(), -1);
    }

    #[test]
    fn test_resize_is_destructive() {
        let mut bank = bank();
        bank.update_cell_at(3, &cell(3));

        bank.resize(32, 32);
        assert_eq!(bank.sprites_in_memory(), 1);

        bank.resize(33, 20);
        assert_eq!(bank.texture_width(), 40);
        assert_eq!(bank.texture_height(), 24);
        assert_eq!(bank.total_sprites(), 15);
        assert_eq!(bank.pages(), 1);
        assert_eq!(bank.sprites_per_page() * bank.pages(), bank.total_sprites());
        assert_eq!(bank.signature_count(), 15);
        assert_eq!(bank.sprites_in_memory(), 0);
        assert!(bank.atlas().pixels().iter().all(|&p| p == TRANSPARENT));

        // Later page changes stack the resized page
        bank.set_pages(2);
        assert_eq!((bank.texture_width(), bank.texture_height()), (40, 48));
        assert_eq!(bank.total_sprites(), 30);
    }

    #[test]
    fn test_pages() {
        let mut bank = bank();
        bank.set_pages(2);
        assert_eq!(bank.texture_height(), 64);
        assert_eq!(bank.total_sprites(), 32);
        assert_eq!(bank.sprites_per_page(), 16);
        bank.set_pages(20);
        assert_eq!(bank.pages(), MAX_PAGES);
    }

    #[test]
    fn test_signature_is_deterministic() {
        assert_eq!(signature(&cell(2)), signature(&cell(2)));
        assert_ne!(signature(&cell(2)), signature(&cell(3)));
    }

    proptest! {
        #[test]
        fn prop_round_trip(index in 0i32..16, pixels in prop::collection::vec(-1i32..256, 64)) {
            let mut bank = bank();
            prop_assert!(bank.update_cell_at(index, &pixels));
            let mut buf = Vec::new();
            bank.read_cell_at(index, &mut buf);
            prop_assert_eq!(&buf, &pixels);
            prop_assert_eq!(bank.find_cell(&pixels, false), index);
        }

        #[test]
        fn prop_out_of_range_write_is_noop(index in prop_oneof![-500i32..0, 16i32..500]) {
            let mut bank = bank();
            let before = bank.atlas().clone();
            prop_assert!(!bank.update_cell_at(index, &cell(1)));
            prop_assert_eq!(bank.atlas(), &before);
            prop_assert_eq!(bank.sprites_in_memory(), 0);
        }
    }
}
