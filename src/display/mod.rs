//! Display Compositor
//!
//! The compositor owns the frame buffer and the queue of pending draw
//! requests. A frame goes through three states:
//!
//! - Idle: nothing queued
//! - Accumulating: `enqueue_draw` calls append requests
//! - Compositing: `composite` sorts by layer and blits every request
//!
//! `reset_queue` returns the requests to the pool. The frame buffer is only
//! cleared by an explicit `clear`, which is applied at the start of the next
//! composite.

pub mod request;

use log::{debug, warn};

use crate::common::{ColorIndex, TRANSPARENT};
use crate::config::GraphicsConfig;
use crate::error::{check_dimensions, Result};
use crate::palette::PaletteBank;
use crate::pixels::{flip_pixels, PixelData, Rect};
use crate::traits::PixelSource;

pub use request::{DrawRequest, RequestId, RequestPool};

/// Compositor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Idle,
    Accumulating,
    Compositing,
}

/// Frame buffer and draw queue
#[derive(Debug, Clone)]
pub struct Compositor {
    frame: PixelData,
    pool: RequestPool,
    pending: Vec<RequestId>,
    max_draw_requests: usize,
    /// Requests refused this frame because the queue was full
    dropped: usize,
    /// Fill color applied before the next composite
    clear_color: Option<ColorIndex>,
    state: DisplayState,
}

impl Compositor {
    pub fn new(width: i32, height: i32, max_draw_requests: usize) -> Result<Self> {
        check_dimensions("display", width, height)?;
        Ok(Self {
            frame: PixelData::new(width, height),
            pool: RequestPool::new(),
            pending: Vec::new(),
            max_draw_requests,
            dropped: 0,
            clear_color: None,
            state: DisplayState::Idle,
        })
    }

    pub fn from_config(config: &GraphicsConfig) -> Result<Self> {
        Self::new(config.display_width, config.display_height, config.max_draw_requests)
    }

    pub fn width(&self) -> i32 {
        self.frame.width()
    }

    pub fn height(&self) -> i32 {
        self.frame.height()
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    /// The frame buffer as of the last composite
    pub fn frame(&self) -> &PixelData {
        &self.frame
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pool_size(&self) -> usize {
        self.pool.size()
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped
    }

    pub fn max_draw_requests(&self) -> usize {
        self.max_draw_requests
    }

    pub fn set_max_draw_requests(&mut self, max: usize) {
        self.max_draw_requests = max;
    }

    /// Reallocate the frame buffer; its contents become transparent
    pub fn reset_resolution(&mut self, width: i32, height: i32) -> Result<()> {
        check_dimensions("display", width, height)?;
        self.frame.resize(width, height);
        debug!("display resolution set to {}x{}", width, height);
        Ok(())
    }

    /// Fill the whole frame with `color` before the next composite
    pub fn clear(&mut self, color: ColorIndex) {
        self.clear_color = Some(color);
    }

    /// Queue a `width x height` block drawn at (x, y)
    ///
    /// The block is copied and the copy flipped, so `pixels` is left as is.
    /// Returns false when the block is too short or the queue is full.
    #[allow(clippy::too_many_arguments)]
    pub fn enqueue_draw(
        &mut self,
        pixels: &[ColorIndex],
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        layer: i32,
        flip_h: bool,
        flip_v: bool,
        color_offset: i32,
    ) -> bool {
        let total = (width.max(0) * height.max(0)) as usize;
        if pixels.len() < total {
            warn!("draw of {}x{} needs {} pixels, got {}", width, height, total, pixels.len());
            return false;
        }

        let Some(request) = self.next_request(x, y, width, height, layer, color_offset) else {
            return false;
        };
        request.pixels.clear();
        request.pixels.extend_from_slice(&pixels[..total]);
        flip_pixels(&mut request.pixels, width, height, flip_h, flip_v);
        true
    }

    /// Queue a rectangle sampled from a larger source (atlas, tile cache, scroll buffer)
    #[allow(clippy::too_many_arguments)]
    pub fn enqueue_sample<S: PixelSource + ?Sized>(
        &mut self,
        source: &S,
        sample: Rect,
        x: i32,
        y: i32,
        layer: i32,
        flip_h: bool,
        flip_v: bool,
        color_offset: i32,
    ) -> bool {
        let Some(request) = self.next_request(x, y, sample.width, sample.height, layer, color_offset) else {
            return false;
        };
        source.read_block(sample.x, sample.y, sample.width, sample.height, &mut request.pixels);
        flip_pixels(&mut request.pixels, sample.width, sample.height, flip_h, flip_v);
        true
    }

    /// Queue a solid rectangle
    pub fn enqueue_fill(&mut self, x: i32, y: i32, width: i32, height: i32, color: ColorIndex, layer: i32) -> bool {
        let total = (width.max(0) * height.max(0)) as usize;
        let Some(request) = self.next_request(x, y, width, height, layer, 0) else {
            return false;
        };
        request.pixels.clear();
        request.pixels.resize(total, color);
        true
    }

    fn next_request(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        layer: i32,
        color_offset: i32,
    ) -> Option<&mut DrawRequest> {
        if self.pending.len() >= self.max_draw_requests {
            if self.dropped == 0 {
                warn!("draw queue full ({} requests), dropping draws", self.max_draw_requests);
            }
            self.dropped += 1;
            return None;
        }

        let id = self.pool.acquire();
        self.pending.push(id);
        self.state = DisplayState::Accumulating;

        let request = self.pool.get_mut(id)?;
        request.x = x;
        request.y = y;
        request.width = width.max(0);
        request.height = height.max(0);
        request.layer = layer;
        request.color_offset = color_offset;
        Some(request)
    }

    /// Blit every pending request into the frame buffer
    ///
    /// Requests are applied by ascending layer; requests sharing a layer
    /// keep their enqueue order. Transparent pixels are skipped and writes
    /// outside the frame are clipped.
    pub fn composite(&mut self) -> &PixelData {
        self.state = DisplayState::Compositing;

        if let Some(color) = self.clear_color.take() {
            self.frame.clear(color);
        }

        let pool = &self.pool;
        // sort_by_key is stable
        self.pending
            .sort_by_key(|&id| pool.get(id).map_or(i32::MAX, |request| request.layer));

        for &id in &self.pending {
            if let Some(request) = self.pool.get(id) {
                let sample = Rect::new(0, 0, request.width, request.height);
                self.frame.merge_pixels(
                    &request.pixels,
                    request.width,
                    sample,
                    request.x,
                    request.y,
                    request.color_offset,
                    true,
                );
            }
        }

        self.state = DisplayState::Idle;
        &self.frame
    }

    /// Discard every pending request and return it to the pool
    pub fn reset_queue(&mut self) {
        for id in self.pending.drain(..) {
            self.pool.release(id);
        }
        if self.dropped > 0 {
            debug!("{} draw requests dropped last frame", self.dropped);
        }
        self.dropped = 0;
        self.state = DisplayState::Idle;
    }

    /// Resolve the frame buffer to ARGB through the palette
    ///
    /// Transparent and out-of-palette pixels show the background slot.
    pub fn present_argb(&self, palette: &mut PaletteBank, out: &mut Vec<u32>) {
        let background = palette.background_color();
        let colors = palette.colors();
        let background = colors
            .get(background as usize)
            .map_or(0xFF000000, |color| color.to_argb());

        out.clear();
        out.extend(self.frame.pixels().iter().map(|&pixel| {
            if pixel <= TRANSPARENT {
                return background;
            }
            colors.get(pixel as usize).map_or(background, |color| color.to_argb())
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::SpriteBank;
    use proptest::prelude::*;

    fn compositor() -> Compositor {
        Compositor::new(4, 4, 16).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_resolution() {
        assert!(Compositor::new(0, 10, 4).is_err());
    }

    #[test]
    fn test_layers_composite_in_ascending_order() {
        let mut display = compositor();
        display.enqueue_draw(&[2], 0, 0, 1, 1, 2, false, false, 0);
        display.enqueue_draw(&[0], 0, 0, 1, 1, 0, false, false, 0);
        display.enqueue_draw(&[1], 0, 0, 1, 1, 1, false, false, 0);
        assert_eq!(display.state(), DisplayState::Accumulating);
        let frame = display.composite();
        assert_eq!(frame.get_pixel(0, 0), 2);
        assert_eq!(display.state(), DisplayState::Idle);
    }

    #[test]
    fn test_same_layer_later_draw_wins() {
        let mut display = compositor();
        display.enqueue_draw(&[5, 5], 0, 0, 2, 1, 0, false, false, 0);
        display.enqueue_draw(&[-1, 7], 0, 0, 2, 1, 0, false, false, 0);
        display.composite();
        assert_eq!(display.frame().get_pixel(0, 0), 5);
        assert_eq!(display.frame().get_pixel(1, 0), 7);
    }

    #[test]
    fn test_reset_queue_is_idempotent() {
        let mut display = compositor();
        display.enqueue_draw(&[1], 0, 0, 1, 1, 0, false, false, 0);
        display.enqueue_draw(&[1], 1, 0, 1, 1, 0, false, false, 0);
        display.composite();
        display.reset_queue();
        let size = display.pool_size();
        display.reset_queue();
        assert_eq!(display.pool_size(), size);
        assert_eq!(display.pending_count(), 0);

        // The next frame reuses the released slots
        display.enqueue_draw(&[1], 0, 0, 1, 1, 0, false, false, 0);
        display.enqueue_draw(&[1], 0, 0, 1, 1, 0, false, false, 0);
        assert_eq!(display.pool_size(), size);
    }

    #[test]
    fn test_clipping_and_offset() {
        let mut display = compositor();
        display.enqueue_draw(&[1, 2, 3, 4], -1, 3, 2, 2, 0, false, false, 10);
        display.composite();
        assert_eq!(display.frame().get_pixel(0, 3), 12);
        assert_eq!(display.frame().pixels().iter().filter(|&&p| p >= 0).count(), 1);
    }

    #[test]
    fn test_flip_copies_caller_block() {
        let mut display = compositor();
        let block = [0, 1, 2, 3];
        display.enqueue_draw(&block, 0, 0, 2, 2, 0, true, true, 0);
        display.composite();
        assert_eq!(block, [0, 1, 2, 3]);
        assert_eq!(display.frame().get_pixel(0, 0), 3);
        assert_eq!(display.frame().get_pixel(1, 1), 0);
    }

    #[test]
    fn test_short_block_rejected() {
        let mut display = compositor();
        assert!(!display.enqueue_draw(&[1, 2], 0, 0, 2, 2, 0, false, false, 0));
        assert_eq!(display.pending_count(), 0);
    }

    #[test]
    fn test_queue_cap_drops_requests() {
        let mut display = Compositor::new(4, 4, 2).unwrap();
        assert!(display.enqueue_fill(0, 0, 1, 1, 1, 0));
        assert!(display.enqueue_fill(0, 0, 1, 1, 1, 0));
        assert!(!display.enqueue_fill(0, 0, 1, 1, 1, 0));
        assert_eq!(display.dropped_count(), 1);
        display.reset_queue();
        assert_eq!(display.dropped_count(), 0);
    }

    #[test]
    fn test_clear_is_deferred_to_composite() {
        let mut display = compositor();
        display.enqueue_fill(0, 0, 4, 4, 3, 0);
        display.composite();
        display.reset_queue();

        display.clear(0);
        assert_eq!(display.frame().get_pixel(2, 2), 3);
        display.enqueue_fill(0, 0, 1, 1, 9, 0);
        display.composite();
        assert_eq!(display.frame().get_pixel(2, 2), 0);
        assert_eq!(display.frame().get_pixel(0, 0), 9);
    }

    #[test]
    fn test_sample_from_atlas() {
        let mut sprites = SpriteBank::new(2, 1, 4, 1, 1).unwrap();
        sprites.update_cell_at(1, &[0, 1]);
        let mut display = compositor();
        display.enqueue_sample(sprites.atlas(), Rect::new(2, 0, 2, 1), 1, 1, 0, false, false, 0);
        display.composite();
        assert_eq!(display.frame().get_pixel(1, 1), 0);
        assert_eq!(display.frame().get_pixel(2, 1), 1);
    }

    #[test]
    fn test_two_color_scenario() {
        let mut palette = PaletteBank::new(4, 1, "#FF00FF").unwrap();
        assert!(palette.update_color_at(0, "#FF0000"));
        assert!(palette.update_color_at(1, "#00FF00"));

        let mut sprites = SpriteBank::new(2, 1, 2, 1, 1).unwrap();
        sprites.update_cell_at(0, &[0, 1]);
        let mut cell = Vec::new();
        sprites.read_cell_at(0, &mut cell);

        let mut display = compositor();
        display.enqueue_draw(&cell, 0, 0, 2, 1, 0, false, false, 0);
        display.composite();
        assert_eq!(display.frame().get_pixel(0, 0), 0);
        assert_eq!(display.frame().get_pixel(1, 0), 1);

        let mut argb = Vec::new();
        display.present_argb(&mut palette, &mut argb);
        assert_eq!(argb[0], 0xFFFF0000);
        assert_eq!(argb[1], 0xFF00FF00);
        // Untouched pixels show the background slot
        assert_eq!(argb[2], 0xFFFF0000);
    }

    proptest! {
        #[test]
        fn test_highest_layer_is_visible(layers in proptest::collection::vec(0i32..8, 1..12)) {
            let mut display = compositor();
            for (i, &layer) in layers.iter().enumerate() {
                display.enqueue_fill(0, 0, 1, 1, i as i32, layer);
            }
            display.composite();

            let top = *layers.iter().max().unwrap();
            let winner = layers.iter().rposition(|&l| l == top).unwrap() as i32;
            prop_assert_eq!(display.frame().get_pixel(0, 0), winner);
        }
    }
}
