//! Multi-scale detection with cross-scale verification.
//!
//! [`FeaturePyramid`] runs a [`GeneralFeatureDetector`] on every layer of a
//! [`ScaleSpacePyramid`]. The threshold of layer `i` is the base threshold
//! divided by `scale(i)^2`. Intensity maps and candidates of the three most
//! recent layers are kept in a rolling buffer; once three layers are
//! available, each candidate of the middle one is compared against the 3x3
//! neighbourhoods of the layers below and above it. Values are weighted by
//! `scale^p` before the comparison and the candidate must beat every
//! neighbour strictly.
//!
//! The first and last layers only ever act as neighbours.

mod border;

pub use border::BorderValue;

use crate::derivative::{Derivative, ImageDerivative};
use crate::detector::GeneralFeatureDetector;
use crate::extract::{CandidatePoint, FeatureExtractor};
use crate::image::pyramid::ScaleSpacePyramid;
use crate::image::{Image, Sample};
use crate::intensity::{Derivatives, FeatureIntensity};
use crate::trace::{trace_event, trace_span};
use crate::util::{FeatError, FeatResult};

/// Accepted interest point in base-image coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScalePoint {
    /// Column in the base image.
    pub x: usize,
    /// Row in the base image.
    pub y: usize,
    /// Scale of the layer the point was detected at.
    pub scale: f64,
}

/// Rolling three-layer scale-space detector.
#[derive(Clone, Debug)]
pub struct FeaturePyramid<I, E, G> {
    detector: GeneralFeatureDetector<I, E>,
    derivative: G,
    base_threshold: f32,
    scale_power: f64,
    index: usize,
    intensities: [Image<f32>; 3],
    candidates: [Vec<CandidatePoint>; 3],
    scales: [f64; 3],
    found: Vec<ScalePoint>,
}

impl<I, E, G> FeaturePyramid<I, E, G>
where
    I: FeatureIntensity,
    E: FeatureExtractor,
{
    /// Creates a pyramid detector.
    ///
    /// The detector's current threshold becomes the threshold at scale 1.
    /// `scale_power` is the exponent `p` of the cross-scale weights.
    pub fn new(detector: GeneralFeatureDetector<I, E>, derivative: G, scale_power: f64) -> Self {
        let base_threshold = detector.threshold();
        Self {
            detector,
            derivative,
            base_threshold,
            scale_power,
            index: 0,
            intensities: Default::default(),
            candidates: Default::default(),
            scales: [0.0; 3],
            found: Vec::new(),
        }
    }

    /// Threshold used at scale 1.
    pub fn base_threshold(&self) -> f32 {
        self.base_threshold
    }

    /// Changes the threshold used at scale 1.
    pub fn set_base_threshold(&mut self, threshold: f32) {
        self.base_threshold = threshold;
        self.detector.set_threshold(threshold);
    }

    /// Exponent of the cross-scale weights.
    pub fn scale_power(&self) -> f64 {
        self.scale_power
    }

    /// Single-scale detector run on every layer.
    pub fn detector(&self) -> &GeneralFeatureDetector<I, E> {
        &self.detector
    }

    /// Returns the derivative service.
    pub fn derivative_mut(&mut self) -> &mut G {
        &mut self.derivative
    }

    /// Points found by the last `detect` call, in detection order.
    pub fn interest_points(&self) -> &[ScalePoint] {
        &self.found
    }

    /// Detects scale-space interest points in `pyramid`.
    ///
    /// Previous results are discarded. Pyramids with fewer than three layers
    /// produce no points. On error no points are kept and the detector is
    /// back on the base threshold.
    pub fn detect<T, P>(&mut self, pyramid: &P) -> FeatResult<()>
    where
        T: Sample,
        P: ScaleSpacePyramid<T> + ?Sized,
        G: ImageDerivative<T, I::Deriv>,
    {
        let _span = trace_span!("feature_pyramid", layers = pyramid.num_layers()).entered();
        self.found.clear();
        self.index = 0;

        let result = self.detect_layers(pyramid);
        self.detector.set_threshold(self.base_threshold);
        if result.is_err() {
            self.found.clear();
        }
        result?;
        trace_event!("feature_pyramid_done", points = self.found.len());
        Ok(())
    }

    fn detect_layers<T, P>(&mut self, pyramid: &P) -> FeatResult<()>
    where
        T: Sample,
        P: ScaleSpacePyramid<T> + ?Sized,
        G: ImageDerivative<T, I::Deriv>,
    {
        let num_layers = pyramid.num_layers();
        for layer in 0..num_layers {
            let image = pyramid.layer(layer).ok_or(FeatError::IndexOutOfBounds {
                index: layer,
                len: num_layers,
                context: "pyramid layer",
            })?;
            let scale = pyramid.scale(layer).ok_or(FeatError::IndexOutOfBounds {
                index: layer,
                len: num_layers,
                context: "pyramid scale",
            })?;
            let _layer_span = trace_span!("layer", index = layer, scale = scale).entered();

            let threshold = (f64::from(self.base_threshold) / (scale * scale)) as f32;
            self.detector.set_threshold(threshold);

            let gradient = self.detector.requires_gradient();
            let hessian = self.detector.requires_hessian();
            self.derivative.set_input(image)?;
            if gradient {
                for which in Derivative::GRADIENT {
                    self.derivative.ensure(which)?;
                }
            }
            if hessian {
                for which in Derivative::HESSIAN {
                    self.derivative.ensure(which)?;
                }
            }
            let pick = |wanted: bool, which: Derivative| {
                if wanted {
                    self.derivative.derivative(which)
                } else {
                    None
                }
            };
            let derivs = Derivatives {
                x: pick(gradient, Derivative::X),
                y: pick(gradient, Derivative::Y),
                xx: pick(hessian, Derivative::XX),
                yy: pick(hessian, Derivative::YY),
                xy: pick(hessian, Derivative::XY),
            };
            self.detector.process(image, &derivs)?;

            let slot = self.index;
            self.intensities[slot].copy_from(self.detector.intensity().view());
            self.candidates[slot].clear();
            self.candidates[slot].extend_from_slice(self.detector.features());
            self.scales[slot] = scale;
            self.index = (self.index + 1) % 3;
            trace_event!(
                "layer_candidates",
                layer = layer,
                candidates = self.detector.features().len()
            );

            if layer >= 2 {
                let before = self.found.len();
                self.verify_middle();
                trace_event!(
                    "layer_accepted",
                    layer = layer - 1,
                    accepted = self.found.len() - before
                );
            }
        }
        Ok(())
    }

    /// Checks the candidates of the middle buffered layer against its
    /// neighbours. Slots `index`, `index + 1` and `index + 2` hold the layers
    /// below, at and above the tested scale.
    fn verify_middle(&mut self) {
        let lower = self.index;
        let middle = (self.index + 1) % 3;
        let upper = (self.index + 2) % 3;

        let (s0, s1, s2) = (self.scales[lower], self.scales[middle], self.scales[upper]);
        let w0 = s0.powf(self.scale_power) as f32;
        let w1 = s1.powf(self.scale_power) as f32;
        let w2 = s2.powf(self.scale_power) as f32;

        let below = BorderValue::new(self.intensities[lower].view());
        let center = BorderValue::new(self.intensities[middle].view());
        let above = BorderValue::new(self.intensities[upper].view());

        for candidate in &self.candidates[middle] {
            let (cx, cy) = (candidate.x as f64, candidate.y as f64);
            let value = w1 * center.get(candidate.x as isize, candidate.y as isize);

            let lower_x = (cx * s1 / s0) as isize;
            let lower_y = (cy * s1 / s0) as isize;
            if !dominates(&below, w0, lower_x, lower_y, value) {
                continue;
            }
            let upper_x = (cx * s1 / s2) as isize;
            let upper_y = (cy * s1 / s2) as isize;
            if !dominates(&above, w2, upper_x, upper_y, value) {
                continue;
            }

            self.found.push(ScalePoint {
                x: (cx * s1) as usize,
                y: (cy * s1) as usize,
                scale: s1,
            });
        }
    }
}

/// True if every weighted value in the 3x3 neighbourhood of `(x, y)` is
/// strictly below `value`.
fn dominates(layer: &BorderValue<'_>, weight: f32, x: isize, y: isize, value: f32) -> bool {
    for dy in -1..=1 {
        for dx in -1..=1 {
            if weight * layer.get(x + dx, y + dy) >= value {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::{BorderValue, FeaturePyramid};
    use crate::derivative::{CachedDerivative, DerivativeKernel};
    use crate::detector::GeneralFeatureDetector;
    use crate::extract::NonMaxExtractor;
    use crate::image::pyramid::{ImagePyramid, ScaleSpacePyramid};
    use crate::image::{Image, ImageView};
    use crate::intensity::{Harris, WindowedStructureTensor};
    use crate::util::FeatError;

    fn harris_pyramid() -> FeaturePyramid<
        WindowedStructureTensor<f32, Harris>,
        NonMaxExtractor,
        CachedDerivative,
    > {
        let detector = GeneralFeatureDetector::new(
            WindowedStructureTensor::new(2, Harris::default()),
            NonMaxExtractor::new(2, 1e-6, 4),
            100,
        );
        FeaturePyramid::new(detector, CachedDerivative::new(DerivativeKernel::Sobel), 2.0)
    }

    struct Truncated {
        image: Image<u8>,
    }

    impl ScaleSpacePyramid<u8> for Truncated {
        fn num_layers(&self) -> usize {
            3
        }

        fn layer(&self, index: usize) -> Option<ImageView<'_, u8>> {
            (index < 2).then(|| self.image.view())
        }

        fn scale(&self, index: usize) -> Option<f64> {
            Some((index + 1) as f64)
        }
    }

    #[test]
    fn weighted_comparison_rejects_ties() {
        let data = [0.0f32, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0];
        let view = ImageView::from_slice(&data, 3, 3).unwrap();
        let layer = BorderValue::new(view);
        assert!(super::dominates(&layer, 1.0, 1, 1, 2.5));
        assert!(!super::dominates(&layer, 1.0, 1, 1, 2.0));
        assert!(!super::dominates(&layer, 2.0, 1, 1, 3.0));
        // Neighbourhoods hanging off the map read zeros.
        assert!(super::dominates(&layer, 1.0, 3, 3, 0.1));
        assert!(!super::dominates(&layer, 1.0, 3, 3, 0.0));
    }

    #[test]
    fn two_layers_yield_nothing() {
        let mut img = Image::<u8>::new(40, 40);
        for y in 12..28 {
            for x in 12..28 {
                img.set(x, y, 255);
            }
        }
        let pyramid = ImagePyramid::build(img.view(), 2).unwrap();
        assert_eq!(pyramid.num_layers(), 2);
        let mut detector = harris_pyramid();
        detector.detect(&pyramid).unwrap();
        assert!(detector.interest_points().is_empty());
        assert_eq!(detector.detector().threshold(), detector.base_threshold());
    }

    #[test]
    fn missing_layer_is_reported() {
        let pyramid = Truncated {
            image: Image::new(16, 16),
        };
        let mut detector = harris_pyramid();
        let err = detector.detect(&pyramid).err().unwrap();
        assert_eq!(detector.detector().threshold(), detector.base_threshold());
        assert!(detector.interest_points().is_empty());
        assert_eq!(
            err,
            FeatError::IndexOutOfBounds {
                index: 2,
                len: 3,
                context: "pyramid layer",
            }
        );
    }
}
