//! Featpyr is a multi-scale interest point detector.
//!
//! A per-pixel intensity (Harris or Shi-Tomasi cornerness from a sliding
//! window structure tensor, or a Hessian blob measure) is computed on every
//! layer of an image pyramid. Local maxima are extracted per layer and kept
//! only if they also dominate the neighbouring scales. Derivative computation
//! can run on the rayon pool with the `rayon` feature.

pub mod derivative;
pub mod detector;
pub mod extract;
pub mod factory;
pub mod image;
pub mod intensity;
pub mod scalespace;
mod trace;
pub mod util;

pub use derivative::{CachedDerivative, Derivative, DerivativeKernel, ImageDerivative};
pub use detector::GeneralFeatureDetector;
pub use extract::{CandidatePoint, FeatureExtractor, NonMaxExtractor};
pub use factory::{
    corner_pyramid, harris_pyramid, hessian_pyramid, shi_tomasi_pyramid, CornerPyramid,
    HessianPyramid, PyramidDetectorConfig,
};
pub use image::pyramid::{ImagePyramid, ScaleSpacePyramid};
pub use image::{Image, ImageView, Sample, WindowSum};
pub use intensity::{
    CornerResponse, Derivatives, FeatureIntensity, Harris, HessianBlobIntensity,
    HessianBlobKind, ShiTomasi, StructureTensor, WindowedStructureTensor,
};
pub use scalespace::{BorderValue, FeaturePyramid, ScalePoint};
pub use util::{FeatError, FeatResult};
