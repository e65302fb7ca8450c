//! Ready-made scale-space detectors.
//!
//! The constructors wire the default derivative service and the non-max
//! extractor to one of the shipped intensity strategies. Corner detectors
//! weight layers by `scale^2` and ignore a border of twice the feature
//! radius. The Hessian detector relies on its own two-pixel border and leaves
//! layer responses unweighted: its derivatives are taken in layer pixels of
//! an unblurred box pyramid, so the raw response already grows with scale.

use crate::derivative::{CachedDerivative, DerivativeKernel};
use crate::detector::GeneralFeatureDetector;
use crate::extract::NonMaxExtractor;
use crate::intensity::{
    CornerResponse, Harris, HessianBlobIntensity, HessianBlobKind, ShiTomasi,
    WindowedStructureTensor,
};
use crate::scalespace::FeaturePyramid;

/// Scale power for structure-tensor responses.
pub const CORNER_SCALE_POWER: f64 = 2.0;
/// Scale power for Hessian responses.
pub const HESSIAN_SCALE_POWER: f64 = 0.0;

/// Corner detector over a pyramid of any sample type.
pub type CornerPyramid<F> =
    FeaturePyramid<WindowedStructureTensor<f32, F>, NonMaxExtractor, CachedDerivative>;

/// Hessian blob detector over a pyramid of any sample type.
pub type HessianPyramid =
    FeaturePyramid<HessianBlobIntensity<f32>, NonMaxExtractor, CachedDerivative>;

/// Parameters shared by the factory constructors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PyramidDetectorConfig {
    /// Window radius of the structure tensor and non-max radius.
    pub feature_radius: usize,
    /// Detection threshold at scale 1.
    pub threshold: f32,
    /// Maximum number of candidates per layer.
    pub max_features: usize,
    /// First-derivative kernel.
    pub kernel: DerivativeKernel,
}

impl Default for PyramidDetectorConfig {
    fn default() -> Self {
        Self {
            feature_radius: 2,
            threshold: 1.0,
            max_features: 1000,
            kernel: DerivativeKernel::Sobel,
        }
    }
}

/// Corner detector with an arbitrary structure-tensor formula.
pub fn corner_pyramid<F: CornerResponse>(
    config: &PyramidDetectorConfig,
    formula: F,
) -> CornerPyramid<F> {
    let radius = config.feature_radius;
    let detector = GeneralFeatureDetector::new(
        WindowedStructureTensor::new(radius, formula),
        NonMaxExtractor::new(radius, config.threshold, 2 * radius),
        config.max_features,
    );
    FeaturePyramid::new(
        detector,
        CachedDerivative::new(config.kernel),
        CORNER_SCALE_POWER,
    )
}

/// Harris corners with the default kappa.
pub fn harris_pyramid(config: &PyramidDetectorConfig) -> CornerPyramid<Harris> {
    corner_pyramid(config, Harris::default())
}

/// Shi-Tomasi corners.
pub fn shi_tomasi_pyramid(config: &PyramidDetectorConfig) -> CornerPyramid<ShiTomasi> {
    corner_pyramid(config, ShiTomasi)
}

/// Hessian determinant or trace blobs.
pub fn hessian_pyramid(config: &PyramidDetectorConfig, kind: HessianBlobKind) -> HessianPyramid {
    let detector = GeneralFeatureDetector::new(
        HessianBlobIntensity::new(kind),
        NonMaxExtractor::new(config.feature_radius, config.threshold, 0),
        config.max_features,
    );
    FeaturePyramid::new(
        detector,
        CachedDerivative::new(config.kernel),
        HESSIAN_SCALE_POWER,
    )
}
