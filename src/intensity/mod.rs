//! Feature intensity strategies.
//!
//! An intensity strategy turns derivative images into a per-pixel score map.
//! The generic detector only sees the [`FeatureIntensity`] trait, so corner
//! and blob detectors share the same extraction and scale-space machinery.

pub mod hessian;
pub mod tensor;

pub use hessian::{HessianBlobIntensity, HessianBlobKind};
pub use tensor::{CornerResponse, Harris, ShiTomasi, StructureTensor, WindowedStructureTensor};

use crate::derivative::Derivative;
use crate::image::{Image, ImageView, Sample};
use crate::util::{FeatError, FeatResult};

/// Derivative images handed to an intensity strategy.
///
/// Derivatives the strategy does not need may be left as `None`.
#[derive(Clone, Copy, Debug)]
pub struct Derivatives<'a, D> {
    /// First derivative along x.
    pub x: Option<ImageView<'a, D>>,
    /// First derivative along y.
    pub y: Option<ImageView<'a, D>>,
    /// Second derivative along x.
    pub xx: Option<ImageView<'a, D>>,
    /// Second derivative along y.
    pub yy: Option<ImageView<'a, D>>,
    /// Mixed second derivative.
    pub xy: Option<ImageView<'a, D>>,
}

impl<D> Default for Derivatives<'_, D> {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            xx: None,
            yy: None,
            xy: None,
        }
    }
}

impl<'a, D: Copy> Derivatives<'a, D> {
    /// Only the image gradient.
    pub fn gradient(x: ImageView<'a, D>, y: ImageView<'a, D>) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Only the Hessian components.
    pub fn hessian(xx: ImageView<'a, D>, yy: ImageView<'a, D>, xy: ImageView<'a, D>) -> Self {
        Self {
            xx: Some(xx),
            yy: Some(yy),
            xy: Some(xy),
            ..Self::default()
        }
    }

    /// Returns the requested derivative or a `MissingDerivative` error.
    pub fn require(&self, which: Derivative) -> FeatResult<ImageView<'a, D>> {
        let slot = match which {
            Derivative::X => self.x,
            Derivative::Y => self.y,
            Derivative::XX => self.xx,
            Derivative::YY => self.yy,
            Derivative::XY => self.xy,
        };
        slot.ok_or(FeatError::MissingDerivative(which.name()))
    }
}

/// Computes a feature intensity map from image derivatives.
pub trait FeatureIntensity {
    /// Sample type of the derivative images.
    type Deriv: Sample;

    /// Whether `process` reads the first derivatives.
    fn requires_gradient(&self) -> bool;

    /// Whether `process` reads the second derivatives.
    fn requires_hessian(&self) -> bool;

    /// Width of the border in which the intensity map holds no values.
    fn ignore_border(&self) -> usize;

    /// Computes the intensity map for `image`.
    fn process<T: Sample>(
        &mut self,
        image: ImageView<'_, T>,
        derivs: &Derivatives<'_, Self::Deriv>,
    ) -> FeatResult<()>;

    /// Returns the intensity map of the last `process` call.
    fn intensity(&self) -> &Image<f32>;
}

/// Fails with `SizeMismatch` unless `other` has the shape `expected`.
pub(crate) fn check_shape<D>(expected: (usize, usize), other: ImageView<'_, D>) -> FeatResult<()> {
    let (width, height) = other.shape();
    if (width, height) != expected {
        return Err(FeatError::SizeMismatch {
            expected_width: expected.0,
            expected_height: expected.1,
            width,
            height,
        });
    }
    Ok(())
}
