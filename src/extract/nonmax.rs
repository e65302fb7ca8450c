//! Brute-force non-maximum suppression over a square window.

use crate::extract::topk::{Peak, TopK};
use crate::extract::{CandidatePoint, FeatureExtractor};
use crate::image::ImageView;
use crate::util::FeatResult;

/// Reports pixels that dominate their `(2r+1) x (2r+1)` neighbourhood.
///
/// A pixel is kept when its value is strictly above the threshold and no
/// neighbour is larger. Among equal neighbours the first one in scan order
/// wins, so a flat plateau produces a single point.
#[derive(Clone, Debug, PartialEq)]
pub struct NonMaxExtractor {
    radius: usize,
    threshold: f32,
    ignore_border: usize,
}

impl NonMaxExtractor {
    /// `ignore_border` is combined with the border requested per call; the
    /// larger of the two applies.
    pub fn new(radius: usize, threshold: f32, ignore_border: usize) -> Self {
        Self {
            radius,
            threshold,
            ignore_border,
        }
    }

    /// Configured minimum border width.
    pub fn ignore_border(&self) -> usize {
        self.ignore_border
    }

    fn is_local_max(&self, intensity: ImageView<'_, f32>, x: usize, y: usize, value: f32) -> bool {
        let (width, height) = intensity.shape();
        let data = intensity.as_slice();
        let stride = intensity.stride();
        let x0 = x.saturating_sub(self.radius);
        let y0 = y.saturating_sub(self.radius);
        let x1 = (x + self.radius).min(width - 1);
        let y1 = (y + self.radius).min(height - 1);

        for ny in y0..=y1 {
            let row = &data[ny * stride..ny * stride + width];
            for (nx, &other) in row.iter().enumerate().take(x1 + 1).skip(x0) {
                if other > value {
                    return false;
                }
                let earlier = ny < y || (ny == y && nx < x);
                if earlier && other == value {
                    return false;
                }
            }
        }
        true
    }
}

impl FeatureExtractor for NonMaxExtractor {
    fn threshold(&self) -> f32 {
        self.threshold
    }

    fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }

    fn radius(&self) -> usize {
        self.radius
    }

    fn process(
        &mut self,
        intensity: ImageView<'_, f32>,
        ignore_border: usize,
        max_features: usize,
        out: &mut Vec<CandidatePoint>,
    ) -> FeatResult<()> {
        out.clear();
        let border = ignore_border.max(self.ignore_border);
        let (width, height) = intensity.shape();
        if width <= 2 * border || height <= 2 * border {
            return Ok(());
        }

        let mut peaks = Vec::new();
        for y in border..height - border {
            let Some(row) = intensity.row(y) else {
                continue;
            };
            for x in border..width - border {
                let value = row[x];
                if value > self.threshold && self.is_local_max(intensity, x, y, value) {
                    peaks.push(Peak { x, y, score: value });
                }
            }
        }

        if peaks.len() > max_features {
            let mut topk = TopK::new(max_features);
            for peak in peaks {
                topk.push(peak);
            }
            peaks = topk.into_scan_order();
        }
        out.extend(peaks.iter().map(|p| CandidatePoint::new(p.x, p.y)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::NonMaxExtractor;
    use crate::extract::{CandidatePoint, FeatureExtractor};
    use crate::image::Image;

    fn map(width: usize, height: usize, points: &[(usize, usize, f32)]) -> Image<f32> {
        let mut img = Image::new(width, height);
        for &(x, y, v) in points {
            img.set(x, y, v);
        }
        img
    }

    #[test]
    fn finds_isolated_maxima_in_scan_order() {
        let img = map(12, 10, &[(7, 2, 3.0), (3, 6, 5.0), (4, 6, 1.0)]);
        let mut nms = NonMaxExtractor::new(1, 0.5, 0);
        let mut out = Vec::new();
        nms.process(img.view(), 0, 10, &mut out).unwrap();
        assert_eq!(out, vec![CandidatePoint::new(7, 2), CandidatePoint::new(3, 6)]);
    }

    #[test]
    fn threshold_is_strict() {
        let img = map(8, 8, &[(4, 4, 2.0)]);
        let mut nms = NonMaxExtractor::new(1, 2.0, 0);
        let mut out = vec![CandidatePoint::new(0, 0)];
        nms.process(img.view(), 0, 10, &mut out).unwrap();
        assert!(out.is_empty());

        nms.set_threshold(1.99);
        nms.process(img.view(), 0, 10, &mut out).unwrap();
        assert_eq!(out, vec![CandidatePoint::new(4, 4)]);
    }

    #[test]
    fn border_pixels_are_never_reported() {
        let img = map(10, 10, &[(1, 5, 9.0), (8, 2, 9.0), (5, 5, 1.0)]);
        let mut nms = NonMaxExtractor::new(1, 0.0, 1);
        let mut out = Vec::new();
        nms.process(img.view(), 2, 10, &mut out).unwrap();
        assert_eq!(out, vec![CandidatePoint::new(5, 5)]);

        // The extractor's own border wins when it is larger.
        let mut nms = NonMaxExtractor::new(1, 0.0, 5);
        nms.process(img.view(), 0, 10, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn plateau_yields_one_point() {
        let mut img = Image::new(9, 9);
        for y in 3..6 {
            for x in 3..6 {
                img.set(x, y, 4.0);
            }
        }
        let mut nms = NonMaxExtractor::new(2, 0.0, 0);
        let mut out = Vec::new();
        nms.process(img.view(), 0, 10, &mut out).unwrap();
        assert_eq!(out, vec![CandidatePoint::new(3, 3)]);
    }

    #[test]
    fn cap_keeps_strongest_in_scan_order() {
        let img = map(
            20,
            8,
            &[(2, 2, 1.0), (6, 2, 7.0), (10, 2, 3.0), (14, 5, 9.0), (18, 5, 2.0)],
        );
        let mut nms = NonMaxExtractor::new(1, 0.0, 0);
        let mut out = Vec::new();
        nms.process(img.view(), 0, 3, &mut out).unwrap();
        assert_eq!(
            out,
            vec![
                CandidatePoint::new(6, 2),
                CandidatePoint::new(10, 2),
                CandidatePoint::new(14, 5),
            ]
        );
    }

    #[test]
    fn constant_map_has_no_candidates() {
        let img = Image::from_vec(vec![0.0f32; 64], 8, 8).unwrap();
        let mut nms = NonMaxExtractor::new(1, 0.0, 0);
        let mut out = Vec::new();
        nms.process(img.view(), 0, 10, &mut out).unwrap();
        assert!(out.is_empty());
    }
}
