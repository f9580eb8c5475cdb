//! Fantasy Console Graphics Library
//!
//! This library provides the raster memory model of an indexed-color
//! fantasy console: a paged color palette, a sprite atlas with duplicate
//! detection, a tile map with per-tile invalidation, a scroll buffer and the
//! compositor that turns queued draw requests into a frame buffer.

pub mod common;
pub mod error;
pub mod config;
pub mod color;
pub mod pixels;
pub mod traits;
pub mod palette;
pub mod sprite;
pub mod tilemap;
pub mod display;
pub mod scroll;
pub mod import;
pub mod engine;
#[cfg(feature = "viewer")]
pub mod ui;
