//! Bank Capabilities
//!
//! Small traits implemented by the banks that share a behavior, so callers
//! can pick the capability they need instead of a concrete bank type.

use crate::common::ColorIndex;
use crate::pixels::PixelData;

/// A bank with a derived cache guarded by a dirty flag
pub trait Invalidate {
    /// Mark the derived data stale
    fn invalidate(&mut self);

    /// Mark the derived data fresh again
    fn reset_validation(&mut self);

    /// Whether the derived data must be rebuilt before the next read
    fn is_invalid(&self) -> bool;
}

/// Anything that can hand out rectangular blocks of color indices
pub trait PixelSource {
    fn width(&self) -> i32;

    fn height(&self) -> i32;

    /// Copy a `width * height` block at (x, y) into `dest`
    fn read_block(&self, x: i32, y: i32, width: i32, height: i32, dest: &mut Vec<ColorIndex>);
}

impl PixelSource for PixelData {
    fn width(&self) -> i32 {
        PixelData::width(self)
    }

    fn height(&self) -> i32 {
        PixelData::height(self)
    }

    fn read_block(&self, x: i32, y: i32, width: i32, height: i32, dest: &mut Vec<ColorIndex>) {
        self.get_pixels(x, y, width, height, dest);
    }
}
