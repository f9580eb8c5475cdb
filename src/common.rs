//! Common types and utilities for the graphics banks
//!
//! This module defines the index type aliases shared by every bank and
//! provides the small integer helpers used for addressing (positive modulo,
//! whole-cell rounding, flat index <-> position conversion).

/// Index into the color palette. Negative values mean "no color".
pub type ColorIndex = i32;

/// Index of a sprite cell inside the sprite atlas.
pub type SpriteId = i32;

/// Pixel value meaning "transparent / untouched".
pub const TRANSPARENT: ColorIndex = -1;

/// Wrap a value into `[0, size)` using positive modulo
///
/// Negative values wrap from the end, so `repeat(-1, 4) == 3`.
/// A `size` of zero returns zero.
#[inline]
pub fn repeat(value: i32, size: i32) -> i32 {
    if size <= 0 {
        return 0;
    }
    value.rem_euclid(size)
}

/// Round `value` up to the next whole multiple of `step`
///
/// The result is never smaller than `step` itself.
#[inline]
pub fn ceil_to_multiple(value: i32, step: i32) -> i32 {
    if step <= 0 {
        return value.max(0);
    }
    let cells = (value.max(0) + step - 1) / step;
    cells.max(1) * step
}

/// Flat index of a (column, row) position in a grid `width` wide
#[inline]
pub fn calculate_index(column: i32, row: i32, width: i32) -> i32 {
    column + row * width
}

/// (column, row) position of a flat index in a grid `width` wide
#[inline]
pub fn calculate_position(index: i32, width: i32) -> (i32, i32) {
    if width <= 0 {
        return (0, 0);
    }
    (index % width, index / width)
}

/// Check if a signed index addresses a slot in a collection of `len` items
#[inline]
pub fn in_bounds(index: i32, len: usize) -> bool {
    index >= 0 && (index as usize) < len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat() {
        assert_eq!(repeat(5, 4), 1);
        assert_eq!(repeat(4, 4), 0);
        assert_eq!(repeat(-1, 4), 3);
        assert_eq!(repeat(-9, 4), 3);
        assert_eq!(repeat(7, 0), 0);
    }

    #[test]
    fn test_ceil_to_multiple() {
        assert_eq!(ceil_to_multiple(128, 8), 128);
        assert_eq!(ceil_to_multiple(129, 8), 136);
        assert_eq!(ceil_to_multiple(1, 8), 8);
        assert_eq!(ceil_to_multiple(0, 8), 8);
    }

    #[test]
    fn test_index_position() {
        assert_eq!(calculate_index(2, 3, 4), 14);
        assert_eq!(calculate_position(14, 4), (2, 3));
        assert_eq!(calculate_position(14, 0), (0, 0));
    }

    #[test]
    fn test_in_bounds() {
        assert!(in_bounds(0, 1));
        assert!(!in_bounds(1, 1));
        assert!(!in_bounds(-1, 10));
    }
}
