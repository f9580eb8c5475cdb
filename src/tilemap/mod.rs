//! Tile Bank
//!
//! The tile map is a `columns x rows` grid. Each tile refers to a sprite cell
//! and carries a palette offset, a collision flag and flip bits. A pixel
//! cache (one sprite cell per tile) is kept alongside the grid and only the
//! tiles marked dirty are re-rendered when the cache is read.

pub mod layers;

use log::{debug, trace};

use crate::common::{calculate_position, in_bounds, ColorIndex, SpriteId};
use crate::config::GraphicsConfig;
use crate::error::{check_dimensions, Error, Result};
use crate::pixels::{flip_pixels, PixelData, Rect};
use crate::sprite::SpriteBank;
use crate::traits::Invalidate;

pub use layers::{Layer, TileLayers};

/// A snapshot of one tile's fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub sprite_id: SpriteId,
    pub color_offset: i32,
    pub flag: i32,
    pub flip_h: bool,
    pub flip_v: bool,
}

impl Default for Tile {
    fn default() -> Self {
        Self {
            sprite_id: -1,
            color_offset: 0,
            flag: -1,
            flip_h: false,
            flip_v: false,
        }
    }
}

/// Tile Bank
#[derive(Debug, Clone)]
pub struct TileBank {
    layers: TileLayers,
    total_flags: i32,
    /// Append unseen sprites to the atlas during tile import
    pub auto_import: bool,
    cell_width: i32,
    cell_height: i32,
    cache: PixelData,
    /// Set whenever at least one tile may be dirty
    invalid: bool,
    /// Tiles re-rendered into the cache since the last `take_rendered_tiles`
    rendered: Vec<bool>,
    scratch: Vec<ColorIndex>,
}

impl TileBank {
    /// Create a cleared map of `columns x rows` tiles, each `cell_width x cell_height` pixels
    pub fn new(columns: i32, rows: i32, cell_width: i32, cell_height: i32) -> Result<Self> {
        check_dimensions("tile map", columns, rows)?;
        check_dimensions("tile cell", cell_width, cell_height)?;

        Ok(Self {
            layers: TileLayers::new(columns, rows),
            total_flags: 16,
            auto_import: false,
            cell_width,
            cell_height,
            cache: PixelData::new(columns * cell_width, rows * cell_height),
            invalid: true,
            rendered: vec![false; (columns * rows) as usize],
            scratch: Vec::with_capacity((cell_width * cell_height) as usize),
        })
    }

    pub fn from_config(config: &GraphicsConfig) -> Result<Self> {
        let mut bank = Self::new(config.columns, config.rows, config.width, config.height)?;
        bank.set_total_flags(config.total_flags);
        bank.auto_import = config.auto_import;
        Ok(bank)
    }

    pub fn columns(&self) -> i32 {
        self.layers.columns()
    }

    pub fn rows(&self) -> i32 {
        self.layers.rows()
    }

    pub fn total(&self) -> usize {
        self.layers.len()
    }

    pub fn cell_width(&self) -> i32 {
        self.cell_width
    }

    pub fn cell_height(&self) -> i32 {
        self.cell_height
    }

    pub fn total_flags(&self) -> i32 {
        self.total_flags
    }

    pub fn set_total_flags(&mut self, total_flags: i32) {
        self.total_flags = total_flags.max(1);
    }

    /// Read every field of the tile at (column, row). Both axes wrap.
    pub fn read_tile(&self, column: i32, row: i32) -> Tile {
        let i = self.layers.index(column, row);
        Tile {
            sprite_id: self.layers.get(Layer::Sprites, i),
            color_offset: self.layers.get(Layer::Colors, i),
            flag: self.layers.get(Layer::Flags, i),
            flip_h: self.layers.get(Layer::FlipH, i) != 0,
            flip_v: self.layers.get(Layer::FlipV, i) != 0,
        }
    }

    /// Write a tile's sprite, flag and palette offset
    pub fn update_tile(&mut self, column: i32, row: i32, sprite_id: SpriteId, flag: i32, color_offset: i32) {
        let i = self.layers.index(column, row);
        let flag = self.clamp_flag(flag);
        self.layers.set(Layer::Sprites, i, sprite_id);
        self.layers.set(Layer::Flags, i, flag);
        self.layers.set(Layer::Colors, i, color_offset);
        self.invalid = true;
    }

    pub fn update_tile_flip(&mut self, column: i32, row: i32, flip_h: bool, flip_v: bool) {
        let i = self.layers.index(column, row);
        self.layers.set(Layer::FlipH, i, flip_h as i32);
        self.layers.set(Layer::FlipV, i, flip_v as i32);
        self.invalid = true;
    }

    pub fn read_sprite_at(&self, column: i32, row: i32) -> SpriteId {
        self.layers.get(Layer::Sprites, self.layers.index(column, row))
    }

    pub fn update_sprite_at(&mut self, column: i32, row: i32, sprite_id: SpriteId) {
        let i = self.layers.index(column, row);
        self.layers.set(Layer::Sprites, i, sprite_id);
        self.invalid = true;
    }

    pub fn read_flag_at(&self, column: i32, row: i32) -> i32 {
        self.layers.get(Layer::Flags, self.layers.index(column, row))
    }

    /// Write a collision flag, clamped to `[-1, total_flags)`
    pub fn update_flag_at(&mut self, column: i32, row: i32, flag: i32) {
        let i = self.layers.index(column, row);
        let flag = self.clamp_flag(flag);
        self.layers.set(Layer::Flags, i, flag);
        self.invalid = true;
    }

    pub fn read_tile_color_offset(&self, column: i32, row: i32) -> i32 {
        self.layers.get(Layer::Colors, self.layers.index(column, row))
    }

    pub fn update_tile_color_offset(&mut self, column: i32, row: i32, color_offset: i32) {
        let i = self.layers.index(column, row);
        self.layers.set(Layer::Colors, i, color_offset);
        self.invalid = true;
    }

    fn clamp_flag(&self, flag: i32) -> i32 {
        flag.clamp(-1, self.total_flags - 1)
    }

    /// Reallocate the grid and its pixel cache
    ///
    /// `clear` resets every tile; otherwise tiles inside the overlap keep
    /// their values. Every tile is dirty afterwards.
    pub fn resize(&mut self, columns: i32, rows: i32, clear: bool) -> Result<()> {
        check_dimensions("tile map", columns, rows)?;
        self.layers.resize(columns, rows, clear);
        self.cache.resize(columns * self.cell_width, rows * self.cell_height);
        self.rendered = vec![false; self.layers.len()];
        self.invalid = true;
        debug!("tile map resized to {}x{} (clear: {})", columns, rows, clear);
        Ok(())
    }

    /// Reset every tile to an empty sprite, offset 0 and no flag
    pub fn clear(&mut self) {
        self.layers.clear();
        self.invalid = true;
    }

    /// Mark a single tile dirty by flat index; out-of-range indices are ignored
    pub fn invalidate_tile(&mut self, index: i32) {
        if in_bounds(index, self.layers.len()) {
            self.layers.mark_dirty(index as usize);
            self.invalid = true;
        }
    }

    /// Mark every tile that references `sprite_id` dirty
    pub fn invalidate_by_sprite_ref(&mut self, sprite_id: SpriteId) {
        let hits: Vec<usize> = self
            .layers
            .layer(Layer::Sprites)
            .iter()
            .enumerate()
            .filter(|&(_, &id)| id == sprite_id)
            .map(|(i, _)| i)
            .collect();

        for &i in &hits {
            self.layers.mark_dirty(i);
        }
        if !hits.is_empty() {
            self.invalid = true;
            trace!("sprite {} invalidated {} tiles", sprite_id, hits.len());
        }
    }

    pub fn invalidate_all(&mut self) {
        self.invalidate();
    }

    pub fn is_tile_dirty(&self, column: i32, row: i32) -> bool {
        self.layers.is_dirty(self.layers.index(column, row))
    }

    /// The cached pixels without refreshing dirty tiles
    pub fn cache(&self) -> &PixelData {
        &self.cache
    }

    /// Refresh dirty tiles from `sprites` and return the pixel cache
    ///
    /// A change of sprite cell size reallocates the cache and re-renders
    /// every tile.
    pub fn read_pixel_data(&mut self, sprites: &mut SpriteBank) -> &PixelData {
        if sprites.width() != self.cell_width || sprites.height() != self.cell_height {
            self.cell_width = sprites.width();
            self.cell_height = sprites.height();
            self.cache
                .resize(self.columns() * self.cell_width, self.rows() * self.cell_height);
            self.invalidate();
            debug!(
                "tile cache reallocated for {}x{} cells",
                self.cell_width, self.cell_height
            );
        }

        if self.invalid {
            self.rebuild_cache(sprites);
            self.reset_validation();
        }
        &self.cache
    }

    fn rebuild_cache(&mut self, sprites: &mut SpriteBank) {
        let mut cell = std::mem::take(&mut self.scratch);
        let columns = self.columns();
        let sample = Rect::new(0, 0, self.cell_width, self.cell_height);
        let mut rendered = 0;

        for i in 0..self.layers.len() {
            if !self.layers.is_dirty(i) {
                continue;
            }

            let sprite_id = self.layers.get(Layer::Sprites, i);
            let color_offset = self.layers.get(Layer::Colors, i);
            let flip_h = self.layers.get(Layer::FlipH, i) != 0;
            let flip_v = self.layers.get(Layer::FlipV, i) != 0;

            sprites.read_cell_at(sprite_id, &mut cell);
            flip_pixels(&mut cell, self.cell_width, self.cell_height, flip_h, flip_v);

            let (column, row) = calculate_position(i as i32, columns);
            trace!("render tile {},{} sprite {}", column, row, sprite_id);
            self.cache.merge_pixels(
                &cell,
                self.cell_width,
                sample,
                column * self.cell_width,
                row * self.cell_height,
                color_offset,
                false,
            );
            self.layers.mark_clean(i);
            self.rendered[i] = true;
            rendered += 1;
        }

        self.scratch = cell;
        debug!("tile cache rebuilt {} of {} tiles", rendered, self.layers.len());
    }

    /// Drain the (column, row) of every tile re-rendered since the last call
    ///
    /// Consumers that copy out of the cache use this to pick up tiles some
    /// other reader already refreshed.
    pub fn take_rendered_tiles(&mut self) -> Vec<(i32, i32)> {
        let columns = self.columns();
        let tiles = self
            .rendered
            .iter()
            .enumerate()
            .filter(|&(_, &hit)| hit)
            .map(|(i, _)| calculate_position(i as i32, columns))
            .collect();
        self.rendered.fill(false);
        tiles
    }

    /// Replace one layer from a flat array of `columns * rows` values
    pub fn load_layer(&mut self, layer: Layer, values: &[i32]) -> Result<()> {
        if !self.layers.load(layer, values) {
            return Err(Error::Config(format!(
                "tile layer {:?} expects {} values, got {}",
                layer,
                self.layers.len(),
                values.len()
            )));
        }
        self.invalid = true;
        Ok(())
    }

    /// Load sprite, color offset and flag layers together
    ///
    /// Nothing is written unless all three lengths match the grid.
    pub fn load_layers(&mut self, sprites: &[i32], colors: &[i32], flags: &[i32]) -> Result<()> {
        let total = self.layers.len();
        for (layer, values) in [(Layer::Sprites, sprites), (Layer::Colors, colors), (Layer::Flags, flags)] {
            if values.len() != total {
                return Err(Error::Config(format!(
                    "tile layer {:?} expects {} values, got {}",
                    layer,
                    total,
                    values.len()
                )));
            }
        }
        self.load_layer(Layer::Sprites, sprites)?;
        self.load_layer(Layer::Colors, colors)?;
        self.load_layer(Layer::Flags, flags)
    }

    /// Flat view of a layer for persistence
    pub fn layer_data(&self, layer: Layer) -> &[i32] {
        self.layers.layer(layer)
    }
}

impl Invalidate for TileBank {
    fn invalidate(&mut self) {
        self.layers.mark_all_dirty();
        self.invalid = true;
    }

    fn reset_validation(&mut self) {
        self.invalid = false;
    }

    fn is_invalid(&self) -> bool {
        self.invalid
    }
}
