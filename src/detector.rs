//! Single-scale detector combining an intensity strategy with an extractor.

use crate::extract::{CandidatePoint, FeatureExtractor};
use crate::image::{Image, ImageView, Sample};
use crate::intensity::{Derivatives, FeatureIntensity};
use crate::util::FeatResult;

/// Computes an intensity map and extracts a bounded list of candidates.
#[derive(Clone, Debug)]
pub struct GeneralFeatureDetector<I, E> {
    intensity: I,
    extractor: E,
    max_features: usize,
    features: Vec<CandidatePoint>,
}

impl<I: FeatureIntensity, E: FeatureExtractor> GeneralFeatureDetector<I, E> {
    /// Creates a detector keeping at most `max_features` candidates.
    pub fn new(intensity: I, extractor: E, max_features: usize) -> Self {
        Self {
            intensity,
            extractor,
            max_features,
            features: Vec::new(),
        }
    }

    /// Whether `process` needs the X and Y derivatives.
    pub fn requires_gradient(&self) -> bool {
        self.intensity.requires_gradient()
    }

    /// Whether `process` needs the XX, YY and XY derivatives.
    pub fn requires_hessian(&self) -> bool {
        self.intensity.requires_hessian()
    }

    /// Current extraction threshold.
    pub fn threshold(&self) -> f32 {
        self.extractor.threshold()
    }

    /// Changes the extraction threshold.
    pub fn set_threshold(&mut self, threshold: f32) {
        self.extractor.set_threshold(threshold);
    }

    /// Maximum number of candidates kept per call.
    pub fn max_features(&self) -> usize {
        self.max_features
    }

    /// Changes the candidate cap.
    pub fn set_max_features(&mut self, max_features: usize) {
        self.max_features = max_features;
    }

    /// Returns the intensity strategy.
    pub fn intensity_strategy(&self) -> &I {
        &self.intensity
    }

    /// Returns the extraction primitive.
    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Runs the intensity strategy on `image` and extracts candidates.
    ///
    /// Derivatives the strategy does not require may be `None`; a missing
    /// required one fails with `MissingDerivative`.
    pub fn process<T: Sample>(
        &mut self,
        image: ImageView<'_, T>,
        derivs: &Derivatives<'_, I::Deriv>,
    ) -> FeatResult<()> {
        self.intensity.process(image, derivs)?;
        self.extractor.process(
            self.intensity.intensity().view(),
            self.intensity.ignore_border(),
            self.max_features,
            &mut self.features,
        )
    }

    /// Intensity map of the last `process` call.
    pub fn intensity(&self) -> &Image<f32> {
        self.intensity.intensity()
    }

    /// Candidates of the last `process` call, in scan order.
    pub fn features(&self) -> &[CandidatePoint] {
        &self.features
    }
}
