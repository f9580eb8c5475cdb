//! Draw Requests
//!
//! Requests live in an arena and are recycled through a free list, so a
//! steady frame loop stops allocating once the pool has grown to the
//! frame's peak request count. Each request owns its pixel buffer and that
//! buffer keeps its capacity across reuse.

use crate::common::ColorIndex;

/// A pending blit into the frame buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawRequest {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Sort key; lower layers are composited first
    pub layer: i32,
    /// Added to every non-transparent pixel
    pub color_offset: i32,
    /// `width * height` indices, already flipped
    pub pixels: Vec<ColorIndex>,
}

/// Handle to a slot in a `RequestPool`
pub type RequestId = usize;

/// Arena of reusable draw requests
#[derive(Debug, Clone, Default)]
pub struct RequestPool {
    slots: Vec<DrawRequest>,
    free: Vec<RequestId>,
}

impl RequestPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a slot, growing the arena only when the free list is empty
    pub fn acquire(&mut self) -> RequestId {
        match self.free.pop() {
            Some(id) => id,
            None => {
                self.slots.push(DrawRequest::default());
                self.slots.len() - 1
            }
        }
    }

    /// Return a slot to the free list
    pub fn release(&mut self, id: RequestId) {
        if id < self.slots.len() && !self.free.contains(&id) {
            self.free.push(id);
        }
    }

    pub fn get(&self, id: RequestId) -> Option<&DrawRequest> {
        self.slots.get(id)
    }

    pub fn get_mut(&mut self, id: RequestId) -> Option<&mut DrawRequest> {
        self.slots.get_mut(id)
    }

    /// Slots allocated so far, in use or free
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_reuses_released_slots() {
        let mut pool = RequestPool::new();
        let a = pool.acquire();
        let b = pool.acquire();
        assert_ne!(a, b);
        assert_eq!(pool.size(), 2);

        pool.release(a);
        assert_eq!(pool.acquire(), a);
        assert_eq!(pool.size(), 2);
    }

    #[test]
    fn test_release_twice_is_harmless() {
        let mut pool = RequestPool::new();
        let a = pool.acquire();
        pool.release(a);
        pool.release(a);
        pool.release(42);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_buffer_capacity_survives_reuse() {
        let mut pool = RequestPool::new();
        let id = pool.acquire();
        if let Some(request) = pool.get_mut(id) {
            request.pixels.resize(64, 0);
        }
        pool.release(id);

        let id = pool.acquire();
        let request = pool.get(id).unwrap();
        assert!(request.pixels.capacity() >= 64);
    }
}
