//! Blob intensity from the Hessian matrix.

use crate::derivative::Derivative;
use crate::image::{Image, ImageView, Sample};
use crate::intensity::{check_shape, Derivatives, FeatureIntensity};
use crate::util::FeatResult;
use std::marker::PhantomData;

/// Pixels this close to an edge are left at zero.
const HESSIAN_BORDER: usize = 2;

/// Scalar computed from the Hessian at each pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HessianBlobKind {
    /// `Dxx * Dyy - Dxy^2`.
    #[default]
    Determinant,
    /// `|Dxx + Dyy|`, the magnitude of the Laplacian.
    Trace,
}

/// Hessian determinant or trace blob detector.
#[derive(Clone, Debug)]
pub struct HessianBlobIntensity<D> {
    kind: HessianBlobKind,
    intensity: Image<f32>,
    _deriv: PhantomData<D>,
}

impl<D: Sample> HessianBlobIntensity<D> {
    /// Creates a detector computing `kind`.
    pub fn new(kind: HessianBlobKind) -> Self {
        Self {
            kind,
            intensity: Image::default(),
            _deriv: PhantomData,
        }
    }

    /// Returns the computed scalar.
    pub fn kind(&self) -> HessianBlobKind {
        self.kind
    }

    fn compute(
        &mut self,
        dxx: ImageView<'_, D>,
        dyy: ImageView<'_, D>,
        dxy: ImageView<'_, D>,
    ) -> FeatResult<()> {
        let (width, height) = dxx.shape();
        check_shape((width, height), dyy)?;
        check_shape((width, height), dxy)?;

        self.intensity.reshape(width, height);
        self.intensity.fill(0.0);
        if width <= 2 * HESSIAN_BORDER || height <= 2 * HESSIAN_BORDER {
            return Ok(());
        }

        let kind = self.kind;
        for y in HESSIAN_BORDER..height - HESSIAN_BORDER {
            let (Some(row_xx), Some(row_yy), Some(row_xy), Some(out)) = (
                dxx.row(y),
                dyy.row(y),
                dxy.row(y),
                self.intensity.row_mut(y),
            ) else {
                continue;
            };
            for x in HESSIAN_BORDER..width - HESSIAN_BORDER {
                let xx = row_xx[x].to_f32();
                let yy = row_yy[x].to_f32();
                out[x] = match kind {
                    HessianBlobKind::Determinant => {
                        let xy = row_xy[x].to_f32();
                        xx * yy - xy * xy
                    }
                    HessianBlobKind::Trace => (xx + yy).abs(),
                };
            }
        }
        Ok(())
    }
}

impl<D: Sample> FeatureIntensity for HessianBlobIntensity<D> {
    type Deriv = D;

    fn requires_gradient(&self) -> bool {
        false
    }

    fn requires_hessian(&self) -> bool {
        true
    }

    fn ignore_border(&self) -> usize {
        HESSIAN_BORDER
    }

    fn process<T: Sample>(
        &mut self,
        image: ImageView<'_, T>,
        derivs: &Derivatives<'_, D>,
    ) -> FeatResult<()> {
        let dxx = derivs.require(Derivative::XX)?;
        let dyy = derivs.require(Derivative::YY)?;
        let dxy = derivs.require(Derivative::XY)?;
        check_shape(image.shape(), dxx)?;
        self.compute(dxx, dyy, dxy)
    }

    fn intensity(&self) -> &Image<f32> {
        &self.intensity
    }
}
