//! Graphics Engine
//!
//! This module composes every graphics bank from one `GraphicsConfig` and
//! exposes the per-frame drawing API a scripting host calls: sprites, tiles,
//! the scrolled tile map, raw pixel blocks and filled rectangles.

use std::path::Path;

use log::{debug, info};

use crate::common::{calculate_position, repeat, ColorIndex, SpriteId};
use crate::config::GraphicsConfig;
use crate::display::Compositor;
use crate::error::Result;
use crate::import::{self, ImportReport};
use crate::palette::PaletteBank;
use crate::pixels::{flip_pixels, PixelData, Rect};
use crate::scroll::ScrollBuffer;
use crate::sprite::SpriteBank;
use crate::tilemap::TileBank;

/// Where a draw call lands
///
/// Display modes double as compositor layers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    /// Painted into the scroll buffer instead of the frame
    TilemapCache = -1,
    Background = 0,
    SpriteBelow = 1,
    /// Sprite draws write tile data; tile map draws use this layer
    Tile = 2,
    Sprite = 3,
    UI = 4,
    SpriteAbove = 5,
}

impl DrawMode {
    /// Compositor layer for display modes
    pub fn layer(self) -> i32 {
        self as i32
    }
}

/// Engine context state
#[derive(Debug, Clone, Default)]
pub struct EngineContext {
    /// Frames completed
    pub frames: u64,
    /// Sprite draws queued this frame
    pub sprite_count: usize,
}

/// All graphics banks plus the frame loop glue
#[derive(Debug, Clone)]
pub struct GraphicsEngine {
    /// Engine context/state
    pub ctx: EngineContext,
    pub palette: PaletteBank,
    pub sprites: SpriteBank,
    pub tiles: TileBank,
    pub display: Compositor,
    /// Tile map render target, sampled by `draw_tilemap`
    pub scroll: ScrollBuffer,
    scratch: Vec<ColorIndex>,
    argb: Vec<u32>,
}

impl GraphicsEngine {
    /// Build every bank from a validated config
    pub fn new(config: &GraphicsConfig) -> Result<Self> {
        config.validate()?;

        let palette = PaletteBank::from_config(config)?;
        let sprites = SpriteBank::from_config(config)?;
        let tiles = TileBank::from_config(config)?;
        let display = Compositor::from_config(config)?;
        let mut scroll = ScrollBuffer::for_tile_bank(&tiles)?;
        scroll.set_background_color(palette.background_color());

        info!(
            "graphics: {} colors, {} sprites of {}x{}, {}x{} tiles, {}x{} display",
            palette.total(),
            sprites.total_sprites(),
            sprites.width(),
            sprites.height(),
            tiles.columns(),
            tiles.rows(),
            display.width(),
            display.height()
        );

        Ok(Self {
            ctx: EngineContext::default(),
            palette,
            sprites,
            tiles,
            display,
            scroll,
            scratch: Vec::new(),
            argb: Vec::new(),
        })
    }

    /// Load a JSON config file and build the engine from it
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = GraphicsConfig::from_file(path)?;
        Self::new(&config)
    }

    /// Move the tile map viewport. Returns the wrapped position.
    pub fn scroll_position(&mut self, x: i32, y: i32) -> (i32, i32) {
        self.scroll.scroll_position(x, y);
        (self.scroll.scroll_x(), self.scroll.scroll_y())
    }

    /// Write a sprite and mark every tile using it dirty
    pub fn update_sprite(&mut self, id: SpriteId, pixels: &[ColorIndex]) -> bool {
        if !self.sprites.update_cell_at(id, pixels) {
            return false;
        }
        self.tiles.invalidate_by_sprite_ref(id);
        true
    }

    /// Draw a raw `width x height` block
    ///
    /// `Tile` mode is ignored because pixels cannot be stored as tile data.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_pixels(
        &mut self,
        pixels: &[ColorIndex],
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        flip_h: bool,
        flip_v: bool,
        mode: DrawMode,
        color_offset: i32,
    ) -> bool {
        match mode {
            DrawMode::Tile => false,
            DrawMode::TilemapCache => {
                let total = (width.max(0) * height.max(0)) as usize;
                if pixels.len() < total {
                    return false;
                }
                // Pending tile changes land before the paint
                self.scroll.sync_from_tile_bank(&mut self.tiles, &mut self.sprites);
                self.scratch.clear();
                self.scratch.extend_from_slice(&pixels[..total]);
                flip_pixels(&mut self.scratch, width, height, flip_h, flip_v);
                self.scroll
                    .merge_pixel_block(x, y, width, height, &self.scratch, color_offset);
                true
            }
            _ => self.display.enqueue_draw(
                pixels,
                x,
                y,
                width,
                height,
                mode.layer(),
                flip_h,
                flip_v,
                color_offset,
            ),
        }
    }

    /// Draw one sprite
    ///
    /// In `Tile` mode (x, y) is a tile position and the tile's sprite and
    /// color offset are replaced instead.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_sprite(
        &mut self,
        id: SpriteId,
        x: i32,
        y: i32,
        flip_h: bool,
        flip_v: bool,
        mode: DrawMode,
        color_offset: i32,
    ) -> bool {
        match mode {
            DrawMode::Tile => {
                self.tiles.update_sprite_at(x, y, id);
                self.tiles.update_tile_color_offset(x, y, color_offset);
                self.tiles.update_tile_flip(x, y, flip_h, flip_v);
                true
            }
            DrawMode::TilemapCache => {
                let mut cell = std::mem::take(&mut self.scratch);
                self.sprites.read_cell_at(id, &mut cell);
                let (width, height) = (self.sprites.width(), self.sprites.height());
                let drawn = self.draw_pixels(&cell, x, y, width, height, flip_h, flip_v, mode, color_offset);
                self.scratch = cell;
                drawn
            }
            _ => {
                if id < 0 || id >= self.sprites.total_sprites() {
                    return false;
                }
                let (sx, sy) = self.sprites.cell_position(id);
                let sample = Rect::new(sx, sy, self.sprites.width(), self.sprites.height());
                let queued = self.display.enqueue_sample(
                    self.sprites.atlas(),
                    sample,
                    x,
                    y,
                    mode.layer(),
                    flip_h,
                    flip_v,
                    color_offset,
                );
                if queued {
                    self.ctx.sprite_count += 1;
                }
                queued
            }
        }
    }

    /// Draw a block of sprites laid out `width` sprites wide
    ///
    /// Flipping mirrors the block as a whole, so sprite positions swap as
    /// well as pixels. Returns the number of sprites drawn.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_sprites(
        &mut self,
        ids: &[SpriteId],
        x: i32,
        y: i32,
        width: i32,
        flip_h: bool,
        flip_v: bool,
        mode: DrawMode,
        color_offset: i32,
    ) -> usize {
        if width <= 0 || ids.is_empty() {
            return 0;
        }
        let rows = (ids.len() as i32 + width - 1) / width;
        let (step_x, step_y) = match mode {
            DrawMode::Tile => (1, 1),
            _ => (self.sprites.width(), self.sprites.height()),
        };

        let mut drawn = 0;
        for (i, &id) in ids.iter().enumerate() {
            let (mut column, mut row) = calculate_position(i as i32, width);
            if flip_h {
                column = width - 1 - column;
            }
            if flip_v {
                row = rows - 1 - row;
            }
            if self.draw_sprite(id, x + column * step_x, y + row * step_y, flip_h, flip_v, mode, color_offset) {
                drawn += 1;
            }
        }
        drawn
    }

    /// Draw the cached pixels of tile (column, row) at display position (x, y)
    pub fn draw_tile(&mut self, column: i32, row: i32, x: i32, y: i32) -> bool {
        let (width, height) = (self.sprites.width(), self.sprites.height());
        let column = repeat(column, self.tiles.columns());
        let row = repeat(row, self.tiles.rows());
        let sample = Rect::new(column * width, row * height, width, height);

        let cache = self.tiles.read_pixel_data(&mut self.sprites);
        self.display
            .enqueue_sample(cache, sample, x, y, DrawMode::Tile.layer(), false, false, 0)
    }

    /// Draw the scrolled tile map
    ///
    /// A `columns` or `rows` of 0 covers the full display. `offset` replaces
    /// the scroll position as the sample origin.
    pub fn draw_tilemap(&mut self, x: i32, y: i32, columns: i32, rows: i32, offset: Option<(i32, i32)>) -> bool {
        self.scroll.sync_from_tile_bank(&mut self.tiles, &mut self.sprites);

        let width = if columns == 0 { self.display.width() } else { columns * self.tiles.cell_width() };
        let height = if rows == 0 { self.display.height() } else { rows * self.tiles.cell_height() };
        let (sample_x, sample_y) = match offset {
            Some((ox, oy)) => (ox - self.scroll.scroll_x(), oy - self.scroll.scroll_y()),
            None => (0, 0),
        };

        self.display.enqueue_sample(
            &self.scroll,
            Rect::new(sample_x, sample_y, width, height),
            x,
            y,
            DrawMode::Tile.layer(),
            false,
            false,
            0,
        )
    }

    /// Fill a rectangle; a negative color uses the palette's background slot
    pub fn draw_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: ColorIndex, mode: DrawMode) -> bool {
        let color = if color < 0 { self.palette.background_color() } else { color };
        match mode {
            DrawMode::Tile => false,
            DrawMode::TilemapCache => {
                let block = vec![color; (width.max(0) * height.max(0)) as usize];
                self.draw_pixels(&block, x, y, width, height, false, false, mode, 0)
            }
            _ => self.display.enqueue_fill(x, y, width, height, color, mode.layer()),
        }
    }

    /// Fill the next frame with the background slot
    pub fn clear(&mut self) {
        self.display.clear(self.palette.background_color());
    }

    /// Clear and draw the full tile map
    pub fn redraw_display(&mut self) {
        self.clear();
        self.draw_tilemap(0, 0, 0, 0, None);
    }

    /// Composite the queued draws and start a new frame
    pub fn end_frame(&mut self) -> &PixelData {
        self.display.composite();
        debug!(
            "frame {}: {} draws, {} sprites",
            self.ctx.frames,
            self.display.pending_count(),
            self.ctx.sprite_count
        );
        self.display.reset_queue();
        self.ctx.frames += 1;
        self.ctx.sprite_count = 0;
        self.display.frame()
    }

    /// The last composited frame as ARGB pixels
    pub fn frame_argb(&mut self) -> &[u32] {
        self.display.present_argb(&mut self.palette, &mut self.argb);
        &self.argb
    }

    /// Import an indexed sprite sheet into the sprite bank
    pub fn import_sprites(&mut self, image: &PixelData) -> ImportReport {
        let report = import::import_sprites(image, &mut self.sprites);
        self.tiles.invalidate_all();
        report
    }

    /// Import an indexed image as tile map layout
    pub fn import_tilemap(&mut self, image: &PixelData) -> ImportReport {
        import::import_tilemap(image, &mut self.sprites, &mut self.tiles)
    }
}
