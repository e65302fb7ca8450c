//! Scale-space pyramids.
//!
//! [`ScaleSpacePyramid`] is what the feature pyramid detector consumes: a
//! list of layers, each tagged with a scale factor relative to the base image.
//! [`ImagePyramid`] is the owned implementation shipped with the crate.
//!
//! `ImagePyramid::build` downsamples with a 2x2 box filter. Integer samples
//! round half up, which for `u8` is `dst = ((a + b + c + d) + 2) / 4`.

use crate::image::{Image, ImageView, Sample};
use crate::util::{FeatError, FeatResult};

/// A sequence of progressively coarser images of the same scene.
pub trait ScaleSpacePyramid<T> {
    /// Returns the number of layers.
    fn num_layers(&self) -> usize;

    /// Returns the image of layer `index`.
    fn layer(&self, index: usize) -> Option<ImageView<'_, T>>;

    /// Returns the scale of layer `index` relative to the base image.
    ///
    /// Scales are strictly increasing with the layer index.
    fn scale(&self, index: usize) -> Option<f64>;
}

/// Owned image pyramid with per-layer scale factors.
#[derive(Clone, Debug)]
pub struct ImagePyramid<T> {
    levels: Vec<Image<T>>,
    scales: Vec<f64>,
}

impl<T: Sample> ImagePyramid<T> {
    /// Builds a pyramid by repeated 2x2 box downsampling.
    ///
    /// Level `i` has scale `2^i`. `max_levels` is clamped to at least 1 so the
    /// base level is always present; construction stops early once a level
    /// would be smaller than 1x1.
    pub fn build(base: ImageView<'_, T>, max_levels: usize) -> FeatResult<Self> {
        let max_levels = max_levels.max(1);
        let mut levels = vec![Image::from_view(base)];
        let mut scales = vec![1.0f64];

        while levels.len() < max_levels {
            let Some(prev) = levels.last() else {
                break;
            };
            if prev.width() < 2 || prev.height() < 2 {
                break;
            }
            let next = downsample_box(prev.view())?;
            let scale = scales[scales.len() - 1] * 2.0;
            levels.push(next);
            scales.push(scale);
        }

        Ok(Self { levels, scales })
    }

    /// Builds a pyramid from explicit layers and scales.
    ///
    /// Scales must be finite, positive and strictly increasing.
    pub fn from_layers(layers: Vec<(Image<T>, f64)>) -> FeatResult<Self> {
        let mut levels = Vec::with_capacity(layers.len());
        let mut scales: Vec<f64> = Vec::with_capacity(layers.len());
        for (index, (image, scale)) in layers.into_iter().enumerate() {
            let increasing = scales.last().map_or(true, |&prev| scale > prev);
            if !scale.is_finite() || scale <= 0.0 || !increasing {
                return Err(FeatError::InvalidScale { index, scale });
            }
            if image.is_empty() {
                return Err(FeatError::InvalidDimensions {
                    width: image.width(),
                    height: image.height(),
                });
            }
            levels.push(image);
            scales.push(scale);
        }
        Ok(Self { levels, scales })
    }

    /// Returns all pyramid levels (level 0 is the base resolution).
    pub fn levels(&self) -> &[Image<T>] {
        &self.levels
    }

    /// Returns the per-level scale factors.
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Consumes the pyramid and returns its levels.
    pub fn into_levels(self) -> Vec<Image<T>> {
        self.levels
    }
}

impl<T: Sample> ScaleSpacePyramid<T> for ImagePyramid<T> {
    fn num_layers(&self) -> usize {
        self.levels.len()
    }

    fn layer(&self, index: usize) -> Option<ImageView<'_, T>> {
        self.levels.get(index).map(Image::view)
    }

    fn scale(&self, index: usize) -> Option<f64> {
        self.scales.get(index).copied()
    }
}

fn downsample_box<T: Sample>(src: ImageView<'_, T>) -> FeatResult<Image<T>> {
    let dst_width = src.width() / 2;
    let dst_height = src.height() / 2;
    if dst_width == 0 || dst_height == 0 {
        return Err(FeatError::InvalidDimensions {
            width: dst_width,
            height: dst_height,
        });
    }
    let mut dst = Image::new(dst_width, dst_height);
    let missing_row = |y: usize| FeatError::BufferTooSmall {
        needed: (y + 1)
            .checked_mul(src.stride())
            .and_then(|v| v.checked_add(src.width()))
            .unwrap_or(usize::MAX),
        got: src.as_slice().len(),
    };

    for y in 0..dst_height {
        let row0 = src.row(y * 2).ok_or_else(|| missing_row(y * 2))?;
        let row1 = src.row(y * 2 + 1).ok_or_else(|| missing_row(y * 2 + 1))?;
        let out = dst.row_mut(y).ok_or(FeatError::IndexOutOfBounds {
            index: y,
            len: dst_height,
            context: "pyramid row",
        })?;
        for (x, value) in out.iter_mut().enumerate() {
            let sum = row0[2 * x].to_f32()
                + row0[2 * x + 1].to_f32()
                + row1[2 * x].to_f32()
                + row1[2 * x + 1].to_f32();
            *value = T::from_f32(sum * 0.25);
        }
    }

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::{ImagePyramid, ScaleSpacePyramid};
    use crate::image::{Image, ImageView};
    use crate::util::FeatError;

    #[test]
    fn build_tracks_power_of_two_scales() {
        let data = vec![0.0f32; 64 * 48];
        let view = ImageView::from_slice(&data, 64, 48).unwrap();
        let pyramid = ImagePyramid::build(view, 4).unwrap();
        assert_eq!(pyramid.num_layers(), 4);
        assert_eq!(pyramid.scales(), &[1.0, 2.0, 4.0, 8.0]);
        assert_eq!(pyramid.layer(3).unwrap().shape(), (8, 6));
        assert!(pyramid.layer(4).is_none());
        assert!(pyramid.scale(4).is_none());
    }

    #[test]
    fn float_levels_average_blocks() {
        let data = [1.0f32, 3.0, 5.0, 7.0];
        let view = ImageView::from_slice(&data, 2, 2).unwrap();
        let pyramid = ImagePyramid::build(view, 2).unwrap();
        assert_eq!(pyramid.levels()[1].get(0, 0).copied(), Some(4.0));
    }

    #[test]
    fn from_layers_rejects_non_increasing_scales() {
        let layers = vec![
            (Image::<f32>::new(4, 4), 1.0),
            (Image::<f32>::new(2, 2), 1.0),
        ];
        let err = ImagePyramid::from_layers(layers).err().unwrap();
        assert_eq!(err, FeatError::InvalidScale { index: 1, scale: 1.0 });
    }
}
