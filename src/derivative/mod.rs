//! Image derivative services.
//!
//! Detectors ask for first- and second-order partial derivatives through the
//! [`ImageDerivative`] trait. Implementations compute each derivative lazily
//! and cache it until the next input image is set, so a detector that needs
//! only the gradient never pays for the Hessian.

mod cached;

pub use cached::{CachedDerivative, DerivativeKernel};

use crate::image::ImageView;
use crate::util::FeatResult;

/// Partial derivative selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Derivative {
    /// First derivative along x.
    X,
    /// First derivative along y.
    Y,
    /// Second derivative along x.
    XX,
    /// Second derivative along y.
    YY,
    /// Mixed second derivative.
    XY,
}

impl Derivative {
    /// Gradient components.
    pub const GRADIENT: [Derivative; 2] = [Derivative::X, Derivative::Y];
    /// Hessian components.
    pub const HESSIAN: [Derivative; 3] = [Derivative::XX, Derivative::YY, Derivative::XY];

    /// Returns the derivative selected by `is_x` (x when true, y otherwise).
    pub fn first(is_x: bool) -> Self {
        if is_x {
            Derivative::X
        } else {
            Derivative::Y
        }
    }

    /// Returns the second derivative taken along `first_x` then `second_x`.
    pub fn second(first_x: bool, second_x: bool) -> Self {
        match (first_x, second_x) {
            (true, true) => Derivative::XX,
            (false, false) => Derivative::YY,
            _ => Derivative::XY,
        }
    }

    /// Short name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Derivative::X => "x",
            Derivative::Y => "y",
            Derivative::XX => "xx",
            Derivative::YY => "yy",
            Derivative::XY => "xy",
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            Derivative::X => 0,
            Derivative::Y => 1,
            Derivative::XX => 2,
            Derivative::YY => 3,
            Derivative::XY => 4,
        }
    }
}

/// Lazily computed derivatives of one input image.
pub trait ImageDerivative<T, D> {
    /// Sets the image to differentiate and invalidates cached results.
    fn set_input(&mut self, image: ImageView<'_, T>) -> FeatResult<()>;

    /// Computes `which` for the current input unless it is already cached.
    fn ensure(&mut self, which: Derivative) -> FeatResult<()>;

    /// Returns a computed derivative, or `None` if it has not been ensured.
    fn derivative(&self, which: Derivative) -> Option<ImageView<'_, D>>;
}
