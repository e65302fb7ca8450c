//! Bounds-checked pixel access with a constant outside value.

use crate::image::ImageView;

/// Reads an `f32` map, returning a sentinel for coordinates outside it.
#[derive(Clone, Copy, Debug)]
pub struct BorderValue<'a> {
    view: ImageView<'a, f32>,
    sentinel: f32,
}

impl<'a> BorderValue<'a> {
    /// Wraps `view` with a sentinel of zero.
    pub fn new(view: ImageView<'a, f32>) -> Self {
        Self::with_sentinel(view, 0.0)
    }

    /// Wraps `view`, returning `sentinel` outside it.
    pub fn with_sentinel(view: ImageView<'a, f32>, sentinel: f32) -> Self {
        Self { view, sentinel }
    }

    /// Value returned outside the map.
    pub fn sentinel(&self) -> f32 {
        self.sentinel
    }

    /// Returns the pixel at `(x, y)` or the sentinel when outside the map.
    #[inline]
    pub fn get(&self, x: isize, y: isize) -> f32 {
        if x < 0 || y < 0 {
            return self.sentinel;
        }
        self.view
            .get(x as usize, y as usize)
            .copied()
            .unwrap_or(self.sentinel)
    }
}
