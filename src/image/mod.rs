//! Image buffers, views and pyramid utilities.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer with an explicit stride.
//! The stride counts elements between the starts of consecutive rows, so a
//! stride larger than the width represents padded rows. ROI slices are zero-copy
//! views into the same backing slice and retain the original stride.
//!
//! `Image` is the owned counterpart used for intermediate results. It keeps a
//! start offset into its backing vector so a buffer laid out by another
//! component can be adopted without copying.

use crate::util::{FeatError, FeatResult};

#[cfg(feature = "image-io")]
pub mod io;
pub mod pyramid;
pub mod sample;

pub use sample::{Sample, WindowSum};

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> FeatResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> FeatResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(FeatError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Creates a view whose first pixel is `data[start]`.
    pub fn with_offset(
        data: &'a [T],
        start: usize,
        width: usize,
        height: usize,
        stride: usize,
    ) -> FeatResult<Self> {
        let needed = required_len(width, height, stride)?;
        let tail = data.get(start..).ok_or(FeatError::BufferTooSmall {
            needed: start.saturating_add(needed),
            got: data.len(),
        })?;
        if tail.len() < needed {
            return Err(FeatError::BufferTooSmall {
                needed: start.saturating_add(needed),
                got: data.len(),
            });
        }
        Self::new(tail, width, height, stride)
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns `(width, height)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice starting at pixel `(0, 0)`, including padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y.checked_mul(self.stride)?.checked_add(x)?;
        self.data.get(idx)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }

    /// Returns a zero-copy ROI view into the same backing buffer.
    pub fn roi(&self, x: usize, y: usize, width: usize, height: usize) -> FeatResult<Self> {
        if width == 0 || height == 0 {
            return Err(FeatError::InvalidDimensions { width, height });
        }
        let end_x = x.checked_add(width);
        let end_y = y.checked_add(height);
        match (end_x, end_y) {
            (Some(end_x), Some(end_y)) if end_x <= self.width && end_y <= self.height => {}
            _ => {
                return Err(FeatError::RoiOutOfBounds {
                    x,
                    y,
                    width,
                    height,
                    img_width: self.width,
                    img_height: self.height,
                })
            }
        }

        let start = y
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(x))
            .ok_or(FeatError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })?;
        ImageView::with_offset(self.data, start, width, height, self.stride)
    }
}

/// Owned single-channel image with stride and start offset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Image<T> {
    data: Vec<T>,
    start: usize,
    width: usize,
    height: usize,
    stride: usize,
}

impl<T: Copy + Default> Image<T> {
    /// Creates a contiguous image filled with `T::default()`.
    ///
    /// Zero dimensions are allowed and produce an empty image; this is the
    /// initial state of lazily shaped scratch buffers.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![T::default(); width * height],
            start: 0,
            width,
            height,
            stride: width,
        }
    }

    /// Wraps a contiguous buffer of exactly `width * height` samples.
    pub fn from_vec(data: Vec<T>, width: usize, height: usize) -> FeatResult<Self> {
        let needed = required_len(width, height, width)?;
        if data.len() < needed {
            return Err(FeatError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(FeatError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            start: 0,
            width,
            height,
            stride: width,
        })
    }

    /// Adopts a buffer laid out with an explicit start offset and stride.
    pub fn from_parts(
        data: Vec<T>,
        start: usize,
        width: usize,
        height: usize,
        stride: usize,
    ) -> FeatResult<Self> {
        // Validates the layout without keeping the borrow.
        ImageView::with_offset(&data, start, width, height, stride)?;
        Ok(Self {
            data,
            start,
            width,
            height,
            stride,
        })
    }

    /// Copies a view into a new contiguous image.
    pub fn from_view(view: ImageView<'_, T>) -> Self {
        let mut img = Self::default();
        img.copy_from(view);
        img
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns `(width, height)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the offset of pixel `(0, 0)` in the backing buffer.
    pub fn start_index(&self) -> usize {
        self.start
    }

    /// Returns the whole backing buffer.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Returns `true` if the image holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Changes the shape to a contiguous `width x height` layout.
    ///
    /// When the shape changes the contents are reset to `T::default()`. The
    /// backing allocation only ever grows. Reshaping to the current shape
    /// keeps the contents untouched.
    pub fn reshape(&mut self, width: usize, height: usize) {
        if self.width == width && self.height == height && self.stride == width && self.start == 0
        {
            return;
        }
        self.data.clear();
        self.data.resize(width * height, T::default());
        self.start = 0;
        self.width = width;
        self.height = height;
        self.stride = width;
    }

    /// Sets every pixel to `value`.
    pub fn fill(&mut self, value: T) {
        for y in 0..self.height {
            let idx = self.index(0, y);
            self.data[idx..idx + self.width].fill(value);
        }
    }

    /// Reshapes to the size of `src` and copies its pixels.
    pub fn copy_from(&mut self, src: ImageView<'_, T>) {
        self.reshape(src.width(), src.height());
        let width = src.width();
        for y in 0..src.height() {
            if let Some(row) = src.row(y) {
                let start = y * width;
                self.data[start..start + width].copy_from_slice(row);
            }
        }
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(self.index(x, y))
    }

    /// Writes `value` at `(x, y)`.
    ///
    /// # Panics
    /// Panics if `(x, y)` lies outside the image.
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} image",
            self.width,
            self.height
        );
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Returns row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&[T]> {
        if y >= self.height {
            return None;
        }
        let start = self.index(0, y);
        self.data.get(start..start + self.width)
    }

    /// Returns row `y` mutably with length `width`.
    pub fn row_mut(&mut self, y: usize) -> Option<&mut [T]> {
        if y >= self.height {
            return None;
        }
        let start = self.index(0, y);
        let width = self.width;
        self.data.get_mut(start..start + width)
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, T> {
        ImageView {
            data: self.data.get(self.start..).unwrap_or(&[]),
            width: self.width,
            height: self.height,
            stride: self.stride,
        }
    }

    /// Applies `f` to every pixel, producing a contiguous image.
    pub fn map<U: Copy + Default>(&self, mut f: impl FnMut(T) -> U) -> Image<U> {
        let mut out = Image::new(self.width, self.height);
        for y in 0..self.height {
            let src = self.index(0, y);
            let dst = y * self.width;
            for x in 0..self.width {
                out.data[dst + x] = f(self.data[src + x]);
            }
        }
        out
    }

    /// Mutable access to the contiguous pixel buffer of a freshly reshaped image.
    pub(crate) fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    #[inline]
    pub(crate) fn index(&self, x: usize, y: usize) -> usize {
        self.start + y * self.stride + x
    }
}

impl<T: Sample> Image<T> {
    /// Converts every sample to `f32`.
    pub fn to_f32(&self) -> Image<f32> {
        self.map(Sample::to_f32)
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> FeatResult<usize> {
    if width == 0 || height == 0 {
        return Err(FeatError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(FeatError::InvalidStride { width, stride });
    }
    let needed = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(FeatError::InvalidDimensions { width, height })?;
    Ok(needed)
}
