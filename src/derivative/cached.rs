//! Default derivative service with small separable kernels.
//!
//! Border pixels are handled by extending the edge (clamped coordinates), so
//! a constant image has exactly zero derivatives everywhere. Second
//! derivatives are computed by differentiating the cached first derivatives.

use crate::derivative::{Derivative, ImageDerivative};
use crate::image::{Image, ImageView, Sample};
use crate::util::{FeatError, FeatResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Kernel used for first derivatives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DerivativeKernel {
    /// Central difference `[-1, 0, 1] / 2`.
    Three,
    /// Sobel operator normalised by 1/8.
    #[default]
    Sobel,
}

#[derive(Clone, Copy, Debug)]
enum Axis {
    X,
    Y,
}

/// Derivative service producing `f32` images from any sample type.
#[derive(Clone, Debug, Default)]
pub struct CachedDerivative {
    kernel: DerivativeKernel,
    parallel: bool,
    has_input: bool,
    input: Image<f32>,
    images: [Image<f32>; 5],
    valid: [bool; 5],
}

impl CachedDerivative {
    /// Creates a service using `kernel` for every derivative.
    pub fn new(kernel: DerivativeKernel) -> Self {
        Self {
            kernel,
            ..Self::default()
        }
    }

    /// Computes output rows on the rayon thread pool.
    #[cfg(feature = "rayon")]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Switches row-parallel computation on or off.
    #[cfg(feature = "rayon")]
    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    /// Returns the configured kernel.
    pub fn kernel(&self) -> DerivativeKernel {
        self.kernel
    }

    fn compute(&mut self, which: Derivative) -> FeatResult<()> {
        let (source, axis) = match which {
            Derivative::X => (None, Axis::X),
            Derivative::Y => (None, Axis::Y),
            Derivative::XX => (Some(Derivative::X), Axis::X),
            Derivative::YY => (Some(Derivative::Y), Axis::Y),
            Derivative::XY => (Some(Derivative::X), Axis::Y),
        };
        if let Some(source) = source {
            self.ensure_slot(source)?;
        }

        let slot = which.slot();
        let mut dst = std::mem::take(&mut self.images[slot]);
        let src = match source {
            Some(source) => self.images[source.slot()].view(),
            None => self.input.view(),
        };
        convolve(self.kernel, axis, src, &mut dst, self.parallel);
        self.images[slot] = dst;
        self.valid[slot] = true;
        Ok(())
    }

    fn ensure_slot(&mut self, which: Derivative) -> FeatResult<()> {
        if !self.has_input {
            return Err(FeatError::InvalidInput(
                "derivative requested before an input image was set",
            ));
        }
        if self.valid[which.slot()] {
            return Ok(());
        }
        self.compute(which)
    }
}

impl<T: Sample> ImageDerivative<T, f32> for CachedDerivative {
    fn set_input(&mut self, image: ImageView<'_, T>) -> FeatResult<()> {
        let (width, height) = image.shape();
        self.input.reshape(width, height);
        for y in 0..height {
            let src = image.row(y).ok_or(FeatError::IndexOutOfBounds {
                index: y,
                len: height,
                context: "derivative input row",
            })?;
            if let Some(dst) = self.input.row_mut(y) {
                for (d, s) in dst.iter_mut().zip(src) {
                    *d = s.to_f32();
                }
            }
        }
        self.valid = [false; 5];
        self.has_input = true;
        Ok(())
    }

    fn ensure(&mut self, which: Derivative) -> FeatResult<()> {
        self.ensure_slot(which)
    }

    fn derivative(&self, which: Derivative) -> Option<ImageView<'_, f32>> {
        let slot = which.slot();
        if self.valid[slot] {
            Some(self.images[slot].view())
        } else {
            None
        }
    }
}

fn convolve(
    kernel: DerivativeKernel,
    axis: Axis,
    src: ImageView<'_, f32>,
    dst: &mut Image<f32>,
    parallel: bool,
) {
    let (width, height) = src.shape();
    dst.reshape(width, height);
    if width == 0 || height == 0 {
        return;
    }
    fill_rows(dst.data_mut(), width, parallel, |y, row| {
        derive_row(kernel, axis, src, y, row)
    });
}

#[cfg(feature = "rayon")]
fn fill_rows<F>(data: &mut [f32], width: usize, parallel: bool, f: F)
where
    F: Fn(usize, &mut [f32]) + Sync + Send,
{
    if parallel {
        data.par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    } else {
        data.chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    }
}

#[cfg(not(feature = "rayon"))]
fn fill_rows<F>(data: &mut [f32], width: usize, _parallel: bool, f: F)
where
    F: Fn(usize, &mut [f32]),
{
    data.chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

fn derive_row(
    kernel: DerivativeKernel,
    axis: Axis,
    src: ImageView<'_, f32>,
    y: usize,
    out: &mut [f32],
) {
    let (width, height) = src.shape();
    let data = src.as_slice();
    let stride = src.stride();
    let row = |yy: usize| &data[yy * stride..yy * stride + width];
    let above = row(y.saturating_sub(1));
    let center = row(y);
    let below = row((y + 1).min(height - 1));

    for (x, value) in out.iter_mut().enumerate() {
        let left = x.saturating_sub(1);
        let right = (x + 1).min(width - 1);
        *value = match (kernel, axis) {
            (DerivativeKernel::Three, Axis::X) => 0.5 * (center[right] - center[left]),
            (DerivativeKernel::Three, Axis::Y) => 0.5 * (below[x] - above[x]),
            (DerivativeKernel::Sobel, Axis::X) => {
                let d = |r: &[f32]| r[right] - r[left];
                (d(above) + 2.0 * d(center) + d(below)) * 0.125
            }
            (DerivativeKernel::Sobel, Axis::Y) => {
                let s = |r: &[f32]| r[left] + 2.0 * r[x] + r[right];
                (s(below) - s(above)) * 0.125
            }
        };
    }
}
