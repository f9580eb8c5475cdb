//! Artwork Import
//!
//! Helpers for the image pipeline: map decoded colors to palette indices,
//! cut an indexed image into sprite cells, deduplicate the cells into the
//! sprite bank and place them on the tile map. Image decoding itself
//! happens elsewhere.

use log::{debug, warn};

use crate::color::ColorData;
use crate::common::{calculate_position, ColorIndex, TRANSPARENT};
use crate::palette::PaletteBank;
use crate::pixels::{self, PixelData};
use crate::sprite::SpriteBank;
use crate::tilemap::TileBank;

/// Counters for one import pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Cells written to the sprite bank
    pub added: usize,
    /// Cells matched to an existing sprite
    pub reused: usize,
    /// Cells dropped (empty, out of room, or unknown without auto import)
    pub skipped: usize,
}

/// Convert decoded colors to palette indices
///
/// `None` (fully transparent source pixels), the mask color and colors
/// missing from the palette all become transparent.
pub fn index_pixels(colors: &[Option<ColorData>], palette: &PaletteBank) -> Vec<ColorIndex> {
    let mask = palette.mask_color();
    colors
        .iter()
        .map(|color| match color {
            Some(color) if *color != mask => palette.find_color_id(&color.to_hex()),
            _ => TRANSPARENT,
        })
        .collect()
}

/// Keep only the first `max_colors` distinct indices of a cell
pub fn limit_colors(cell: &mut [ColorIndex], max_colors: usize) {
    let mut seen: Vec<ColorIndex> = Vec::with_capacity(max_colors);
    for pixel in cell.iter_mut() {
        if *pixel < 0 || seen.contains(pixel) {
            continue;
        }
        if seen.len() < max_colors {
            seen.push(*pixel);
        } else {
            *pixel = TRANSPARENT;
        }
    }
}

/// Number of (columns, rows) of `cell_width x cell_height` cells covering an image
pub fn cell_grid(image: &PixelData, cell_width: i32, cell_height: i32) -> (i32, i32) {
    if cell_width <= 0 || cell_height <= 0 {
        return (0, 0);
    }
    (
        (image.width() + cell_width - 1) / cell_width,
        (image.height() + cell_height - 1) / cell_height,
    )
}

fn cut_cell(image: &PixelData, sprites: &SpriteBank, index: i32, columns: i32, dest: &mut Vec<ColorIndex>) {
    let (column, row) = calculate_position(index, columns);
    let (width, height) = (sprites.width(), sprites.height());
    image.get_pixels(column * width, row * height, width, height, dest);
    limit_colors(dest, sprites.colors_per_sprite() as usize);
}

/// Cut an indexed image into cells and store them in the sprite bank
///
/// With `unique` set, cells already in the bank are reused and new cells go
/// to the first empty slot, so sprites already in the bank are kept.
/// Otherwise cell `n` of the image overwrites sprite `n`, skipping empty
/// cells.
pub fn import_sprites(image: &PixelData, sprites: &mut SpriteBank) -> ImportReport {
    let (columns, rows) = cell_grid(image, sprites.width(), sprites.height());
    let total = columns * rows;
    let capacity = sprites.total_sprites() as usize;

    let mut report = ImportReport::default();
    let mut cell = Vec::with_capacity(sprites.cell_size());

    for index in 0..total {
        cut_cell(image, sprites, index, columns, &mut cell);

        if report.added >= capacity {
            report.skipped += 1;
            continue;
        }

        if sprites.unique {
            if sprites.find_cell(&cell, false) != -1 {
                report.reused += 1;
            } else {
                let id = sprites.next_empty_cell_id();
                if id != -1 && sprites.update_cell_at(id, &cell) {
                    report.added += 1;
                } else {
                    report.skipped += 1;
                }
            }
        } else if pixels::is_empty(&cell) || !sprites.update_cell_at(index, &cell) {
            report.skipped += 1;
        } else {
            report.added += 1;
        }
    }

    if report.skipped > 0 && (report.added >= capacity || sprites.next_empty_cell_id() == -1) {
        warn!("sprite bank full after {} cells, {} skipped", report.added, report.skipped);
    }
    debug!("imported sprites: {:?}", report);
    report
}

/// Cut an indexed image into cells and lay them out on the tile map
///
/// Cells matching an existing sprite reuse it. Unseen cells are appended to
/// the sprite bank when the tile bank has `auto_import` set; otherwise (or
/// when the bank is full) the tile is left empty. The image is cropped to
/// the tile map's size.
pub fn import_tilemap(image: &PixelData, sprites: &mut SpriteBank, tiles: &mut TileBank) -> ImportReport {
    let (image_columns, image_rows) = cell_grid(image, sprites.width(), sprites.height());
    let columns = image_columns.min(tiles.columns());
    let rows = image_rows.min(tiles.rows());

    let mut report = ImportReport::default();
    let mut cell = Vec::with_capacity(sprites.cell_size());

    for row in 0..rows {
        for column in 0..columns {
            let index = column + row * image_columns;
            cut_cell(image, sprites, index, image_columns, &mut cell);

            let mut id = sprites.find_cell(&cell, true);
            if id != -1 {
                report.reused += 1;
            } else if tiles.auto_import && !pixels::is_empty(&cell) {
                id = sprites.next_empty_cell_id();
                if id != -1 && sprites.update_cell_at(id, &cell) {
                    report.added += 1;
                } else {
                    id = -1;
                    report.skipped += 1;
                }
            } else {
                report.skipped += 1;
            }

            tiles.update_sprite_at(column, row, id);
        }
    }

    debug!("imported tile map {}x{}: {:?}", columns, rows, report);
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One row of 2x2 cells
    fn image(cells: &[[i32; 4]]) -> PixelData {
        let mut image = PixelData::new(2 * cells.len() as i32, 2);
        for (i, cell) in cells.iter().enumerate() {
            image.set_pixels(2 * i as i32, 0, 2, 2, cell);
        }
        image
    }

    fn sprite_bank() -> SpriteBank {
        SpriteBank::new(2, 2, 4, 4, 1).unwrap()
    }

    #[test]
    fn test_index_pixels() {
        let mut palette = PaletteBank::new(4, 1, "#FF00FF").unwrap();
        palette.update_color_at(2, "#00FF00");
        let colors = [
            Some(ColorData::new(0, 255, 0)),
            None,
            Some(ColorData::new(255, 0, 255)),
            Some(ColorData::new(1, 2, 3)),
        ];
        assert_eq!(index_pixels(&colors, &palette), vec![2, -1, -1, -1]);
    }

    #[test]
    fn test_limit_colors() {
        let mut cell = vec![3, 4, -1, 5, 3, 4];
        limit_colors(&mut cell, 2);
        assert_eq!(cell, vec![3, 4, -1, -1, 3, 4]);
    }

    #[test]
    fn test_import_unique_dedups() {
        let mut sprites = sprite_bank();
        sprites.unique = true;
        let art = image(&[[1, 1, 1, 1], [2, 2, 2, 2], [1, 1, 1, 1]]);
        let report = import_sprites(&art, &mut sprites);
        assert_eq!(report.added, 2);
        assert_eq!(report.reused, 1);
        assert_eq!(sprites.find_cell(&[2, 2, 2, 2], true), 1);
    }

    #[test]
    fn test_import_unique_keeps_existing_sprites() {
        let mut sprites = sprite_bank();
        sprites.unique = true;
        sprites.update_cell_at(0, &[7, 7, 7, 7]);
        let art = image(&[[1, 1, 1, 1], [7, 7, 7, 7]]);
        let report = import_sprites(&art, &mut sprites);
        assert_eq!(report, ImportReport { added: 1, reused: 1, skipped: 0 });
        assert_eq!(sprites.find_cell(&[7, 7, 7, 7], true), 0);
        assert_eq!(sprites.find_cell(&[1, 1, 1, 1], true), 1);
    }

    #[test]
    fn test_import_in_place_skips_empty() {
        let mut sprites = sprite_bank();
        let art = image(&[[1, 1, 1, 1], [-1, -1, -1, -1], [3, 3, 3, 3]]);
        let report = import_sprites(&art, &mut sprites);
        assert_eq!(report.added, 2);
        assert_eq!(report.skipped, 1);
        assert!(sprites.is_empty_at(1));
        assert_eq!(sprites.find_cell(&[3, 3, 3, 3], true), 2);
    }

    #[test]
    fn test_import_tilemap_reuses_and_appends() {
        let mut sprites = sprite_bank();
        sprites.update_cell_at(0, &[1, 1, 1, 1]);
        let mut tiles = TileBank::new(4, 4, 2, 2).unwrap();
        tiles.auto_import = true;

        let art = image(&[[1, 1, 1, 1], [5, 5, 5, 5], [-1, -1, -1, -1]]);
        let report = import_tilemap(&art, &mut sprites, &mut tiles);
        assert_eq!(report, ImportReport { added: 1, reused: 1, skipped: 1 });
        assert_eq!(tiles.read_sprite_at(0, 0), 0);
        assert_eq!(tiles.read_sprite_at(1, 0), 1);
        assert_eq!(tiles.read_sprite_at(2, 0), -1);
    }

    #[test]
    fn test_import_tilemap_without_auto_import() {
        let mut sprites = sprite_bank();
        let mut tiles = TileBank::new(4, 4, 2, 2).unwrap();
        let art = image(&[[5, 5, 5, 5]]);
        let report = import_tilemap(&art, &mut sprites, &mut tiles);
        assert_eq!(report.skipped, 1);
        assert_eq!(tiles.read_sprite_at(0, 0), -1);
        assert!(sprites.is_empty_at(0));
    }

    #[test]
    fn test_import_tilemap_crops_to_map() {
        let mut sprites = sprite_bank();
        let mut tiles = TileBank::new(1, 1, 2, 2).unwrap();
        tiles.auto_import = true;
        let art = image(&[[1, 1, 1, 1], [2, 2, 2, 2]]);
        let report = import_tilemap(&art, &mut sprites, &mut tiles);
        assert_eq!(report.added, 1);
        assert_eq!(sprites.find_cell(&[2, 2, 2, 2], true), -1);
    }
}
