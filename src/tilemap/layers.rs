//! Tile Layers
//!
//! Tile fields are stored as parallel integer arrays, one per `Layer`, all
//! `columns * rows` long and indexed `column + row * columns`. Writing any
//! field also sets the tile's entry in the `Invalid` layer.

use crate::common::{calculate_index, repeat};

/// One parallel array of tile data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Sprite reference, -1 for an empty tile
    Sprites = 0,
    /// Palette offset added to the sprite's pixels
    Colors = 1,
    /// Collision flag, -1 for none
    Flags = 2,
    FlipH = 3,
    FlipV = 4,
    /// Dirty marker, non-zero while the cached pixels are stale
    Invalid = 5,
}

impl Layer {
    pub const COUNT: usize = 6;

    pub const ALL: [Layer; Self::COUNT] = [
        Layer::Sprites,
        Layer::Colors,
        Layer::Flags,
        Layer::FlipH,
        Layer::FlipV,
        Layer::Invalid,
    ];

    /// Value a cleared tile holds in this layer
    pub fn default_value(self) -> i32 {
        match self {
            Layer::Sprites | Layer::Flags => -1,
            Layer::Colors | Layer::FlipH | Layer::FlipV => 0,
            Layer::Invalid => 1,
        }
    }
}

/// Parallel tile layers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayers {
    columns: i32,
    rows: i32,
    layers: [Vec<i32>; Layer::COUNT],
}

impl TileLayers {
    /// Allocate cleared layers. Dimensions must already be validated as positive.
    pub fn new(columns: i32, rows: i32) -> Self {
        let total = (columns * rows) as usize;
        Self {
            columns,
            rows,
            layers: Layer::ALL.map(|layer| vec![layer.default_value(); total]),
        }
    }

    pub fn columns(&self) -> i32 {
        self.columns
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.layers[Layer::Sprites as usize].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat index of a tile; both axes wrap
    #[inline]
    pub fn index(&self, column: i32, row: i32) -> usize {
        let column = repeat(column, self.columns);
        let row = repeat(row, self.rows);
        calculate_index(column, row, self.columns) as usize
    }

    #[inline]
    pub fn get(&self, layer: Layer, index: usize) -> i32 {
        self.layers[layer as usize][index]
    }

    /// Write a field and mark the tile dirty
    #[inline]
    pub fn set(&mut self, layer: Layer, index: usize, value: i32) {
        self.layers[layer as usize][index] = value;
        self.layers[Layer::Invalid as usize][index] = 1;
    }

    pub fn layer(&self, layer: Layer) -> &[i32] {
        &self.layers[layer as usize]
    }

    pub fn is_dirty(&self, index: usize) -> bool {
        self.layers[Layer::Invalid as usize][index] != 0
    }

    pub fn mark_dirty(&mut self, index: usize) {
        self.layers[Layer::Invalid as usize][index] = 1;
    }

    pub fn mark_clean(&mut self, index: usize) {
        self.layers[Layer::Invalid as usize][index] = 0;
    }

    pub fn mark_all_dirty(&mut self) {
        self.layers[Layer::Invalid as usize].fill(1);
    }

    /// Reset every tile to its default values
    pub fn clear(&mut self) {
        for layer in Layer::ALL {
            self.layers[layer as usize].fill(layer.default_value());
        }
    }

    /// Reallocate every layer for the new grid
    ///
    /// With `clear` unset, values in the overlapping region keep their
    /// (column, row) position. Every tile comes out dirty.
    pub fn resize(&mut self, columns: i32, rows: i32, clear: bool) {
        let mut resized = Self::new(columns, rows);

        if !clear {
            let keep_columns = columns.min(self.columns);
            let keep_rows = rows.min(self.rows);
            for row in 0..keep_rows {
                for column in 0..keep_columns {
                    let from = (column + row * self.columns) as usize;
                    let to = (column + row * columns) as usize;
                    for layer in Layer::ALL {
                        resized.layers[layer as usize][to] = self.layers[layer as usize][from];
                    }
                }
            }
            resized.mark_all_dirty();
        }

        *self = resized;
    }

    /// Replace one layer wholesale
    ///
    /// Returns false, leaving the layer untouched, when `values` is not
    /// exactly one entry per tile.
    pub fn load(&mut self, layer: Layer, values: &[i32]) -> bool {
        if values.len() != self.len() {
            return false;
        }
        self.layers[layer as usize].copy_from_slice(values);
        if layer != Layer::Invalid {
            self.mark_all_dirty();
        }
        true
    }
}
