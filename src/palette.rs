//! Palette Bank
//!
//! The palette maps color indices to concrete colors. Slots are organized in
//! pages of `colors_per_page`; the total number of slots is always
//! `pages * colors_per_page`.
//!
//! Slots holding the mask color are considered unused. When the palette is
//! materialized for presentation those slots resolve to the background slot's
//! color, unless debug mode is on.

use log::{debug, warn};

use crate::color::ColorData;
use crate::common::in_bounds;
use crate::config::GraphicsConfig;
use crate::error::{Error, Result};
use crate::traits::Invalidate;

/// Maximum palette page count
pub const MAX_PAGES: i32 = 4;

/// Palette Bank
#[derive(Debug, Clone)]
pub struct PaletteBank {
    colors: Vec<ColorData>,
    colors_per_page: i32,
    pages: i32,
    mask_color: ColorData,
    background_color: i32,
    debug_mode: bool,
    /// Reject writes that would duplicate an existing color
    pub unique: bool,
    invalid: bool,
    dirty_slots: Vec<bool>,
    color_cache: Vec<ColorData>,
}

impl Default for PaletteBank {
    fn default() -> Self {
        Self::with_layout(64, MAX_PAGES, ColorData::new(0xFF, 0x00, 0xFF))
    }
}

impl PaletteBank {
    /// Create a palette of `pages * colors_per_page` mask-colored slots
    pub fn new(colors_per_page: i32, pages: i32, mask_color: &str) -> Result<Self> {
        if colors_per_page <= 0 {
            return Err(Error::Config(format!("colorsPerPage must be positive, got {}", colors_per_page)));
        }
        let mask = ColorData::from_hex(mask_color)?;
        Ok(Self::with_layout(colors_per_page, pages, mask))
    }

    /// Create a palette from the shared graphics config
    pub fn from_config(config: &GraphicsConfig) -> Result<Self> {
        let mut palette = Self::new(config.colors_per_page, config.pages, &config.mask_color)?;
        palette.unique = config.unique;
        palette.debug_mode = config.debug_mode;
        palette.set_background_color(config.background_color);
        Ok(palette)
    }

    fn with_layout(colors_per_page: i32, pages: i32, mask_color: ColorData) -> Self {
        let pages = pages.clamp(1, MAX_PAGES);
        let total = (colors_per_page * pages) as usize;
        Self {
            colors: vec![mask_color; total],
            colors_per_page,
            pages,
            mask_color,
            background_color: 0,
            debug_mode: false,
            unique: false,
            invalid: true,
            dirty_slots: vec![false; total],
            color_cache: Vec::new(),
        }
    }

    /// Total number of addressable slots
    pub fn total(&self) -> i32 {
        self.pages * self.colors_per_page
    }

    pub fn colors_per_page(&self) -> i32 {
        self.colors_per_page
    }

    pub fn pages(&self) -> i32 {
        self.pages
    }

    /// Change the page count (clamped to 1-4)
    ///
    /// Existing slots are preserved, new slots are set to the mask color.
    pub fn set_pages(&mut self, pages: i32) {
        let pages = pages.clamp(1, MAX_PAGES);
        if pages == self.pages {
            return;
        }
        self.pages = pages;
        let total = self.total() as usize;
        self.colors.resize(total, self.mask_color);
        self.dirty_slots.clear();
        self.dirty_slots.resize(total, false);
        self.background_color = self.background_color.clamp(0, self.total() - 1);
        self.invalidate();
        debug!("palette resized to {} pages ({} colors)", self.pages, total);
    }

    /// Recompute the page count needed to hold `total_colors`
    ///
    /// Per-slot dirty flags are cleared. The palette stays invalid so writes
    /// made before the rebuild still reach the next `colors()` call.
    pub fn rebuild_pages(&mut self, total_colors: i32) {
        let pages = (total_colors + self.colors_per_page - 1) / self.colors_per_page;
        self.set_pages(pages);
        self.dirty_slots.fill(false);
        self.invalidate();
    }

    /// Raw color stored at `index`; the mask color when out of range
    pub fn read_color_at(&self, index: i32) -> ColorData {
        if in_bounds(index, self.colors.len()) {
            self.colors[index as usize]
        } else {
            self.mask_color
        }
    }

    /// Raw color at `index` as `#RRGGBB`
    pub fn read_hex_at(&self, index: i32) -> String {
        self.read_color_at(index).to_hex()
    }

    /// Write a hex color into a slot
    ///
    /// Out-of-range indices are ignored. Malformed colors, and duplicates
    /// while `unique` is set, are rejected. Returns whether the slot changed.
    pub fn update_color_at(&mut self, index: i32, hex: &str) -> bool {
        if !in_bounds(index, self.colors.len()) {
            return false;
        }

        let color = match ColorData::from_hex(hex) {
            Ok(color) => color,
            Err(err) => {
                warn!("palette slot {}: {}", index, err);
                return false;
            }
        };

        self.write_slot(index as usize, color)
    }

    fn write_slot(&mut self, index: usize, color: ColorData) -> bool {
        if self.unique && color != self.mask_color {
            let duplicate = self
                .colors
                .iter()
                .enumerate()
                .any(|(i, &c)| i != index && c == color);
            if duplicate {
                warn!("palette slot {}: {} already in palette", index, color);
                return false;
            }
        }

        self.colors[index] = color;
        self.dirty_slots[index] = true;
        self.invalidate();
        true
    }

    /// Reset every slot to `color`, or to the mask color when `None`
    pub fn clear(&mut self, color: Option<&str>) {
        let fill = match color.map(ColorData::from_hex) {
            Some(Ok(color)) => color,
            Some(Err(err)) => {
                warn!("palette clear: {}", err);
                return;
            }
            None => self.mask_color,
        };
        self.colors.fill(fill);
        self.dirty_slots.fill(true);
        self.invalidate();
    }

    /// First slot holding `hex`, or -1
    pub fn find_color_id(&self, hex: &str) -> i32 {
        let Ok(color) = ColorData::from_hex(hex) else {
            return -1;
        };
        self.colors
            .iter()
            .position(|&c| c == color)
            .map_or(-1, |i| i as i32)
    }

    /// Every slot as `#RRGGBB`, for persistence
    pub fn hex_colors(&self) -> Vec<String> {
        self.colors.iter().map(ColorData::to_hex).collect()
    }

    /// Number of slots not holding the mask color
    pub fn total_used_colors(&self) -> usize {
        self.colors.iter().filter(|&&c| c != self.mask_color).count()
    }

    pub fn mask_color(&self) -> ColorData {
        self.mask_color
    }

    /// Change the mask color; invalid hex strings are ignored
    pub fn set_mask_color(&mut self, hex: &str) -> bool {
        match ColorData::from_hex(hex) {
            Ok(color) => {
                self.mask_color = color;
                self.invalidate();
                true
            }
            Err(err) => {
                warn!("mask color: {}", err);
                false
            }
        }
    }

    pub fn background_color(&self) -> i32 {
        self.background_color
    }

    /// Select the slot used in place of mask-colored slots (clamped to the palette)
    pub fn set_background_color(&mut self, index: i32) {
        self.background_color = index.clamp(0, self.total() - 1);
        self.invalidate();
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    pub fn set_debug_mode(&mut self, debug_mode: bool) {
        self.debug_mode = debug_mode;
        self.invalidate();
    }

    /// Color shown for `index` after background substitution
    pub fn resolve_color(&self, index: i32) -> ColorData {
        let color = self.read_color_at(index);
        if color == self.mask_color && !self.debug_mode {
            let background = self.read_color_at(self.background_color);
            // A mask-colored background slot is shown as-is
            return background;
        }
        color
    }

    /// Whether a slot was written since the last materialization
    pub fn is_slot_dirty(&self, index: i32) -> bool {
        in_bounds(index, self.dirty_slots.len()) && self.dirty_slots[index as usize]
    }

    /// Materialized, background-resolved colors
    ///
    /// Rebuilt only when a write happened since the last call.
    pub fn colors(&mut self) -> &[ColorData] {
        if self.invalid || self.color_cache.len() != self.colors.len() {
            let total = self.total();
            self.color_cache = (0..total).map(|i| self.resolve_color(i)).collect();
            debug!("palette cache rebuilt ({} colors)", total);
            self.reset_validation();
        }
        &self.color_cache
    }
}

impl Invalidate for PaletteBank {
    fn invalidate(&mut self) {
        self.invalid = true;
    }

    fn reset_validation(&mut self) {
        self.invalid = false;
        self.dirty_slots.fill(false);
    }

    fn is_invalid(&self) -> bool {
        self.invalid
    }
}
