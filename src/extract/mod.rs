//! Extraction of candidate points from an intensity map.
//!
//! An extractor turns a per-pixel score map into a bounded list of integer
//! pixel locations. The detector does not care how the maxima are found, only
//! that border pixels are never reported and that the list respects the cap.

mod nonmax;
mod topk;

pub use nonmax::NonMaxExtractor;

use crate::image::ImageView;
use crate::util::FeatResult;

/// Integer pixel location found at one pyramid level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CandidatePoint {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
}

impl CandidatePoint {
    /// Candidate at column `x`, row `y`.
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Local-maximum extraction primitive.
pub trait FeatureExtractor {
    /// Minimum intensity a candidate must exceed.
    fn threshold(&self) -> f32;

    /// Replaces the detection threshold.
    fn set_threshold(&mut self, threshold: f32);

    /// Chebyshev radius of the suppression neighbourhood.
    fn radius(&self) -> usize;

    /// Finds candidates in `intensity`, replacing the contents of `out`.
    ///
    /// Pixels closer than `ignore_border` to an edge are never reported and at
    /// most `max_features` points are written, in row-major scan order.
    fn process(
        &mut self,
        intensity: ImageView<'_, f32>,
        ignore_border: usize,
        max_features: usize,
        out: &mut Vec<CandidatePoint>,
    ) -> FeatResult<()>;
}
