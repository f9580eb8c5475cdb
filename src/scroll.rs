//! Scroll Buffer
//!
//! A pre-rendered surface sampled through a scroll offset. Reads wrap at the
//! surface edges in both directions. The surface is filled from the tile
//! bank on demand and can also be painted directly (HUDs, overlays) without
//! touching tile data.

use log::debug;

use crate::common::{repeat, ColorIndex};
use crate::error::{check_dimensions, Result};
use crate::pixels::PixelData;
use crate::sprite::SpriteBank;
use crate::tilemap::TileBank;
use crate::traits::{Invalidate, PixelSource};

/// Scroll Buffer
#[derive(Debug, Clone)]
pub struct ScrollBuffer {
    surface: PixelData,
    scroll_x: i32,
    scroll_y: i32,
    background_color: ColorIndex,
    /// Set by any write, cleared after the viewport is read
    invalid: bool,
}

impl ScrollBuffer {
    pub fn new(width: i32, height: i32) -> Result<Self> {
        check_dimensions("scroll buffer", width, height)?;
        let mut surface = PixelData::new(width, height);
        surface.wrap_mode = true;
        Ok(Self {
            surface,
            scroll_x: 0,
            scroll_y: 0,
            background_color: 0,
            invalid: true,
        })
    }

    /// A buffer matching a tile bank's full pixel size
    pub fn for_tile_bank(tiles: &TileBank) -> Result<Self> {
        Self::new(
            tiles.columns() * tiles.cell_width(),
            tiles.rows() * tiles.cell_height(),
        )
    }

    pub fn surface(&self) -> &PixelData {
        &self.surface
    }

    pub fn scroll_x(&self) -> i32 {
        self.scroll_x
    }

    pub fn scroll_y(&self) -> i32 {
        self.scroll_y
    }

    /// Move the viewport origin; both axes wrap to the surface size
    pub fn scroll_position(&mut self, x: i32, y: i32) {
        self.scroll_x = repeat(x, self.surface.width());
        self.scroll_y = repeat(y, self.surface.height());
    }

    pub fn background_color(&self) -> ColorIndex {
        self.background_color
    }

    pub fn set_background_color(&mut self, color: ColorIndex) {
        self.background_color = color;
    }

    /// Fill the surface with the background color
    pub fn clear(&mut self) {
        self.surface.clear(self.background_color);
        self.invalidate();
    }

    /// Copy a `width x height` window starting at the scroll offset plus (offset_x, offset_y)
    pub fn read_viewport(
        &mut self,
        width: i32,
        height: i32,
        dest: &mut Vec<ColorIndex>,
        offset_x: i32,
        offset_y: i32,
    ) {
        self.surface.get_pixels(
            self.scroll_x + offset_x,
            self.scroll_y + offset_y,
            width,
            height,
            dest,
        );
        self.reset_validation();
    }

    /// Overwrite a block, transparent pixels included. Positions wrap.
    pub fn update_pixel_block(&mut self, x: i32, y: i32, width: i32, height: i32, pixels: &[ColorIndex]) {
        self.surface.set_pixels(x, y, width, height, pixels);
        self.invalidate();
    }

    /// Draw a block over the surface, skipping transparent pixels. Positions wrap.
    pub fn merge_pixel_block(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        pixels: &[ColorIndex],
        color_offset: i32,
    ) {
        for row in 0..height.max(0) {
            for col in 0..width.max(0) {
                match pixels.get((col + row * width) as usize) {
                    Some(&pixel) if pixel >= 0 => {
                        self.surface.set_pixel(x + col, y + row, pixel + color_offset)
                    }
                    _ => {}
                }
            }
        }
        self.invalidate();
    }

    /// Resample the whole surface from the tile bank's pixel cache
    ///
    /// The surface is reallocated when the tile map's pixel size changed.
    pub fn refresh_from_tile_bank(&mut self, tiles: &mut TileBank, sprites: &mut SpriteBank) {
        let cache = tiles.read_pixel_data(sprites);
        if cache.width() != self.surface.width() || cache.height() != self.surface.height() {
            self.surface.resize(cache.width(), cache.height());
            self.scroll_position(self.scroll_x, self.scroll_y);
        }
        self.surface.pixels_mut().copy_from_slice(cache.pixels());
        tiles.take_rendered_tiles();
        self.invalidate();
        debug!(
            "scroll buffer refreshed from tile map ({}x{})",
            self.surface.width(),
            self.surface.height()
        );
    }

    /// Bring the surface up to date with the tile bank
    ///
    /// Only tiles re-rendered since the last sync are copied over, so direct
    /// paints elsewhere survive. This includes tiles refreshed by other
    /// cache readers. A size mismatch falls back to a full refresh.
    pub fn sync_from_tile_bank(&mut self, tiles: &mut TileBank, sprites: &mut SpriteBank) {
        let width = tiles.columns() * sprites.width();
        let height = tiles.rows() * sprites.height();
        if width != self.surface.width() || height != self.surface.height() {
            self.refresh_from_tile_bank(tiles, sprites);
            return;
        }

        tiles.read_pixel_data(sprites);
        let changed = tiles.take_rendered_tiles();
        if changed.is_empty() {
            return;
        }
        for &(column, row) in &changed {
            self.revert_cached_block_at(column, row, tiles, sprites);
        }
        debug!("scroll buffer synced {} tiles", changed.len());
    }

    /// Restore one tile's region from the tile cache, undoing direct paints there
    pub fn revert_cached_block_at(&mut self, column: i32, row: i32, tiles: &mut TileBank, sprites: &mut SpriteBank) {
        let width = tiles.cell_width();
        let height = tiles.cell_height();
        let column = repeat(column, tiles.columns());
        let row = repeat(row, tiles.rows());

        let mut block = Vec::with_capacity((width * height) as usize);
        tiles
            .read_pixel_data(sprites)
            .get_pixels(column * width, row * height, width, height, &mut block);
        self.update_pixel_block(column * width, row * height, width, height, &block);
    }
}

impl PixelSource for ScrollBuffer {
    fn width(&self) -> i32 {
        self.surface.width()
    }

    fn height(&self) -> i32 {
        self.surface.height()
    }

    /// Sample relative to the scroll offset
    fn read_block(&self, x: i32, y: i32, width: i32, height: i32, dest: &mut Vec<ColorIndex>) {
        self.surface
            .get_pixels(self.scroll_x + x, self.scroll_y + y, width, height, dest);
    }
}

impl Invalidate for ScrollBuffer {
    fn invalidate(&mut self) {
        self.invalid = true;
    }

    fn reset_validation(&mut self) {
        self.invalid = false;
    }

    fn is_invalid(&self) -> bool {
        self.invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(width: i32, height: i32) -> ScrollBuffer {
        let mut buffer = ScrollBuffer::new(width, height).unwrap();
        let pixels: Vec<i32> = (0..width * height).collect();
        buffer.update_pixel_block(0, 0, width, height, &pixels);
        buffer
    }

    #[test]
    fn test_viewport_wraps() {
        let mut buffer = numbered(4, 4);
        buffer.scroll_position(3, 3);
        let mut view = Vec::new();
        buffer.read_viewport(2, 2, &mut view, 0, 0);
        assert_eq!(view, vec![15, 12, 3, 0]);
        assert!(!buffer.is_invalid());
    }

    #[test]
    fn test_scroll_position_wraps() {
        let mut buffer = numbered(4, 2);
        buffer.scroll_position(-1, 5);
        assert_eq!((buffer.scroll_x(), buffer.scroll_y()), (3, 1));
    }

    #[test]
    fn test_merge_keeps_transparent_holes() {
        let mut buffer = numbered(2, 2);
        buffer.merge_pixel_block(1, 1, 2, 1, &[-1, 9], 1);
        assert!(buffer.is_invalid());
        assert_eq!(buffer.surface().pixels(), &[0, 1, 10, 3]);
    }

    #[test]
    fn test_clear_uses_background() {
        let mut buffer = numbered(2, 2);
        buffer.set_background_color(4);
        buffer.clear();
        assert!(buffer.surface().pixels().iter().all(|&p| p == 4));
    }

    #[test]
    fn test_refresh_and_revert() {
        let mut sprites = SpriteBank::new(2, 2, 4, 2, 1).unwrap();
        sprites.update_cell_at(1, &[1, 2, 3, 4]);
        let mut tiles = TileBank::new(2, 2, 2, 2).unwrap();
        tiles.update_tile(1, 0, 1, -1, 0);

        let mut buffer = ScrollBuffer::new(1, 1).unwrap();
        buffer.refresh_from_tile_bank(&mut tiles, &mut sprites);
        assert_eq!(buffer.surface().width(), 4);
        assert_eq!(buffer.surface().get_pixel(2, 0), 1);
        assert_eq!(buffer.surface().get_pixel(3, 1), 4);

        buffer.update_pixel_block(2, 0, 2, 2, &[7, 7, 7, 7]);
        buffer.revert_cached_block_at(1, 0, &mut tiles, &mut sprites);
        assert_eq!(buffer.surface().get_pixel(2, 0), 1);
        assert_eq!(buffer.surface().get_pixel(3, 1), 4);
    }

    #[test]
    fn test_sync_keeps_paint_on_clean_tiles() {
        let mut sprites = SpriteBank::new(2, 2, 4, 2, 1).unwrap();
        sprites.update_cell_at(0, &[1, 1, 1, 1]);
        let mut tiles = TileBank::new(2, 1, 2, 2).unwrap();
        let mut buffer = ScrollBuffer::for_tile_bank(&tiles).unwrap();
        buffer.sync_from_tile_bank(&mut tiles, &mut sprites);

        buffer.update_pixel_block(0, 0, 1, 1, &[9]);
        tiles.update_tile(1, 0, 0, -1, 0);
        buffer.sync_from_tile_bank(&mut tiles, &mut sprites);
        assert_eq!(buffer.surface().get_pixel(0, 0), 9);
        assert_eq!(buffer.surface().get_pixel(2, 0), 1);
        assert!(!tiles.is_invalid());
    }

    #[test]
    fn test_sync_after_another_cache_read() {
        let mut sprites = SpriteBank::new(2, 2, 4, 2, 1).unwrap();
        sprites.update_cell_at(1, &[5, 5, 5, 5]);
        let mut tiles = TileBank::new(2, 1, 2, 2).unwrap();
        let mut buffer = ScrollBuffer::for_tile_bank(&tiles).unwrap();
        buffer.sync_from_tile_bank(&mut tiles, &mut sprites);

        tiles.update_tile(0, 0, 1, -1, 0);
        tiles.read_pixel_data(&mut sprites);
        assert!(!tiles.is_invalid());

        buffer.sync_from_tile_bank(&mut tiles, &mut sprites);
        assert_eq!(buffer.surface().get_pixel(1, 1), 5);
        assert_eq!(buffer.surface().get_pixel(2, 0), -1);
    }

    #[test]
    fn test_read_block_follows_scroll() {
        let mut buffer = numbered(4, 1);
        buffer.scroll_position(2, 0);
        let mut block = Vec::new();
        buffer.read_block(0, 0, 3, 1, &mut block);
        assert_eq!(block, vec![2, 3, 0]);
    }
}
