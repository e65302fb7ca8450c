//! Windowed structure tensor with pluggable corner formulas.
//!
//! For every interior pixel the engine sums `dx*dx`, `dx*dy` and `dy*dy` over
//! a `(2r+1) x (2r+1)` window and hands the resulting [`StructureTensor`] to a
//! [`CornerResponse`]. Sums are computed with two sliding passes, so the cost
//! is independent of the radius:
//!
//! * horizontal: per row, a running sum over `2r+1` columns stored in three
//!   horizontal-sum images;
//! * vertical: per column, a running sum over `2r+1` rows of the horizontal
//!   sums, kept in three column buffers and updated row by row so memory is
//!   traversed in row-major order.
//!
//! Pixels closer than `r` to any edge are never written and stay zero.

use crate::derivative::Derivative;
use crate::image::{Image, ImageView, Sample, WindowSum};
use crate::intensity::{check_shape, Derivatives, FeatureIntensity};
use crate::util::FeatResult;

/// Windowed sums of gradient products at one pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StructureTensor {
    /// Sum of `dx * dx`.
    pub xx: f32,
    /// Sum of `dx * dy`.
    pub xy: f32,
    /// Sum of `dy * dy`.
    pub yy: f32,
}

impl StructureTensor {
    /// Determinant of the 2x2 tensor.
    pub fn determinant(&self) -> f32 {
        self.xx * self.yy - self.xy * self.xy
    }

    /// Trace of the 2x2 tensor.
    pub fn trace(&self) -> f32 {
        self.xx + self.yy
    }

    /// Smaller of the two eigenvalues.
    pub fn min_eigenvalue(&self) -> f32 {
        let half_trace = 0.5 * self.trace();
        let half_diff = 0.5 * (self.xx - self.yy);
        half_trace - (half_diff * half_diff + self.xy * self.xy).sqrt()
    }
}

/// Scalar cornerness computed from a structure tensor.
pub trait CornerResponse {
    /// Returns the intensity of pixel `(x, y)` with window sums `tensor`.
    fn response(&self, tensor: &StructureTensor, x: usize, y: usize) -> f32;
}

impl<F> CornerResponse for F
where
    F: Fn(&StructureTensor, usize, usize) -> f32,
{
    fn response(&self, tensor: &StructureTensor, x: usize, y: usize) -> f32 {
        self(tensor, x, y)
    }
}

/// Harris response `det - kappa * trace^2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Harris {
    /// Trace weight, typically 0.04..0.06.
    pub kappa: f32,
}

impl Default for Harris {
    fn default() -> Self {
        Self { kappa: 0.04 }
    }
}

impl CornerResponse for Harris {
    #[inline]
    fn response(&self, tensor: &StructureTensor, _x: usize, _y: usize) -> f32 {
        let trace = tensor.trace();
        tensor.determinant() - self.kappa * trace * trace
    }
}

/// Shi-Tomasi (KLT) response: the smaller eigenvalue.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShiTomasi;

impl CornerResponse for ShiTomasi {
    #[inline]
    fn response(&self, tensor: &StructureTensor, _x: usize, _y: usize) -> f32 {
        tensor.min_eigenvalue()
    }
}

/// Sliding-window structure tensor engine.
///
/// Scratch storage is allocated on the first call and reused while the image
/// size stays the same.
#[derive(Clone, Debug)]
pub struct WindowedStructureTensor<S: Sample, F> {
    radius: usize,
    formula: F,
    horiz_xx: Image<S::Sum>,
    horiz_xy: Image<S::Sum>,
    horiz_yy: Image<S::Sum>,
    col_xx: Vec<S::Sum>,
    col_xy: Vec<S::Sum>,
    col_yy: Vec<S::Sum>,
    intensity: Image<f32>,
    shaped: bool,
}

impl<S: Sample, F: CornerResponse> WindowedStructureTensor<S, F> {
    /// Creates an engine with window radius `radius`.
    pub fn new(radius: usize, formula: F) -> Self {
        Self {
            radius,
            formula,
            horiz_xx: Image::default(),
            horiz_xy: Image::default(),
            horiz_yy: Image::default(),
            col_xx: Vec::new(),
            col_xy: Vec::new(),
            col_yy: Vec::new(),
            intensity: Image::default(),
            shaped: false,
        }
    }

    /// Returns the window radius.
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Returns the corner formula.
    pub fn formula(&self) -> &F {
        &self.formula
    }

    /// Returns the intensity map of the last call to `process`.
    pub fn intensity(&self) -> &Image<f32> {
        &self.intensity
    }

    /// Allocates scratch storage for `width x height` inputs.
    ///
    /// The intensity map is zeroed.
    pub fn set_shape(&mut self, width: usize, height: usize) {
        self.horiz_xx.reshape(width, height);
        self.horiz_xy.reshape(width, height);
        self.horiz_yy.reshape(width, height);
        self.intensity.reshape(width, height);
        self.intensity.fill(0.0);
        if self.col_xx.len() < width {
            self.col_xx.resize(width, S::Sum::default());
            self.col_xy.resize(width, S::Sum::default());
            self.col_yy.resize(width, S::Sum::default());
        }
        self.shaped = true;
    }

    /// Computes the intensity map from the image gradient.
    ///
    /// Fails with `SizeMismatch` if the two gradient images differ in size.
    pub fn process(
        &mut self,
        deriv_x: ImageView<'_, S>,
        deriv_y: ImageView<'_, S>,
    ) -> FeatResult<()> {
        check_shape(deriv_x.shape(), deriv_y)?;
        let (width, height) = deriv_x.shape();
        if !self.shaped || self.intensity.shape() != (width, height) {
            self.set_shape(width, height);
        }

        let window = 2 * self.radius + 1;
        if width < window || height < window {
            self.intensity.fill(0.0);
            return Ok(());
        }

        self.horizontal(deriv_x, deriv_y);
        self.vertical();
        Ok(())
    }

    fn horizontal(&mut self, deriv_x: ImageView<'_, S>, deriv_y: ImageView<'_, S>) {
        let (width, height) = deriv_x.shape();
        let radius = self.radius;
        let window = 2 * radius + 1;
        let data_x = deriv_x.as_slice();
        let data_y = deriv_y.as_slice();
        let stride_x = deriv_x.stride();
        let stride_y = deriv_y.stride();
        let h_xx = self.horiz_xx.data_mut();
        let h_xy = self.horiz_xy.data_mut();
        let h_yy = self.horiz_yy.data_mut();

        for row in 0..height {
            let rx = &data_x[row * stride_x..row * stride_x + width];
            let ry = &data_y[row * stride_y..row * stride_y + width];
            let out = row * width;

            let mut total_xx = S::Sum::default();
            let mut total_xy = S::Sum::default();
            let mut total_yy = S::Sum::default();
            for (&sx, &sy) in rx[..window].iter().zip(&ry[..window]) {
                let (dx, dy) = (sx.widen(), sy.widen());
                total_xx += dx * dx;
                total_xy += dx * dy;
                total_yy += dy * dy;
            }
            h_xx[out + radius] = total_xx;
            h_xy[out + radius] = total_xy;
            h_yy[out + radius] = total_yy;

            for x in window..width {
                let (dx, dy) = (rx[x - window].widen(), ry[x - window].widen());
                total_xx -= dx * dx;
                total_xy -= dx * dy;
                total_yy -= dy * dy;

                let (dx, dy) = (rx[x].widen(), ry[x].widen());
                total_xx += dx * dx;
                total_xy += dx * dy;
                total_yy += dy * dy;

                h_xx[out + x - radius] = total_xx;
                h_xy[out + x - radius] = total_xy;
                h_yy[out + x - radius] = total_yy;
            }
        }
    }

    fn vertical(&mut self) {
        let (width, height) = self.intensity.shape();
        let radius = self.radius;
        let window = 2 * radius + 1;
        let h_xx = self.horiz_xx.as_slice();
        let h_xy = self.horiz_xy.as_slice();
        let h_yy = self.horiz_yy.as_slice();
        let col_xx = &mut self.col_xx;
        let col_xy = &mut self.col_xy;
        let col_yy = &mut self.col_yy;
        let formula = &self.formula;
        let inten = self.intensity.data_mut();

        let start_x = radius;
        let end_x = width - radius;

        // First interior row: full column sums.
        for x in start_x..end_x {
            let mut total_xx = S::Sum::default();
            let mut total_xy = S::Sum::default();
            let mut total_yy = S::Sum::default();
            for y in 0..window {
                let idx = y * width + x;
                total_xx += h_xx[idx];
                total_xy += h_xy[idx];
                total_yy += h_yy[idx];
            }
            col_xx[x] = total_xx;
            col_xy[x] = total_xy;
            col_yy[x] = total_yy;
            inten[radius * width + x] =
                formula.response(&tensor(total_xx, total_xy, total_yy), x, radius);
        }

        // Remaining rows: slide each column sum down by one row.
        for y in radius + 1..height - radius {
            let enter = (y + radius) * width;
            let leave = (y - radius - 1) * width;
            let dest = y * width;
            for x in start_x..end_x {
                let total_xx = (col_xx[x] - h_xx[leave + x]) + h_xx[enter + x];
                let total_xy = (col_xy[x] - h_xy[leave + x]) + h_xy[enter + x];
                let total_yy = (col_yy[x] - h_yy[leave + x]) + h_yy[enter + x];
                col_xx[x] = total_xx;
                col_xy[x] = total_xy;
                col_yy[x] = total_yy;
                inten[dest + x] = formula.response(&tensor(total_xx, total_xy, total_yy), x, y);
            }
        }
    }
}

#[inline]
fn tensor<A: WindowSum>(xx: A, xy: A, yy: A) -> StructureTensor {
    StructureTensor {
        xx: xx.to_f32(),
        xy: xy.to_f32(),
        yy: yy.to_f32(),
    }
}

impl<S: Sample, F: CornerResponse> FeatureIntensity for WindowedStructureTensor<S, F> {
    type Deriv = S;

    fn requires_gradient(&self) -> bool {
        true
    }

    fn requires_hessian(&self) -> bool {
        false
    }

    fn ignore_border(&self) -> usize {
        self.radius
    }

    fn process<T: Sample>(
        &mut self,
        image: ImageView<'_, T>,
        derivs: &Derivatives<'_, S>,
    ) -> FeatResult<()> {
        let deriv_x = derivs.require(Derivative::X)?;
        let deriv_y = derivs.require(Derivative::Y)?;
        check_shape(image.shape(), deriv_x)?;
        WindowedStructureTensor::process(self, deriv_x, deriv_y)
    }

    fn intensity(&self) -> &Image<f32> {
        &self.intensity
    }
}

#[cfg(test)]
mod tests {
    use super::{CornerResponse, Harris, ShiTomasi, StructureTensor, WindowedStructureTensor};
    use crate::image::{Image, ImageView};
    use crate::util::FeatError;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_image(rng: &mut StdRng, width: usize, height: usize) -> Image<f32> {
        let data = (0..width * height)
            .map(|_| rng.random_range(-1.0f32..1.0))
            .collect();
        Image::from_vec(data, width, height).unwrap()
    }

    fn brute_force(
        dx: &Image<f32>,
        dy: &Image<f32>,
        radius: usize,
        x: usize,
        y: usize,
    ) -> (f64, f64, f64) {
        let (mut xx, mut xy, mut yy) = (0.0f64, 0.0f64, 0.0f64);
        for j in y - radius..=y + radius {
            for i in x - radius..=x + radius {
                let a = f64::from(*dx.get(i, j).unwrap());
                let b = f64::from(*dy.get(i, j).unwrap());
                xx += a * a;
                xy += a * b;
                yy += b * b;
            }
        }
        (xx, xy, yy)
    }

    fn component_map(
        dx: &Image<f32>,
        dy: &Image<f32>,
        radius: usize,
        pick: fn(&StructureTensor) -> f32,
    ) -> Image<f32> {
        let mut engine = WindowedStructureTensor::<f32, _>::new(
            radius,
            move |t: &StructureTensor, _x: usize, _y: usize| pick(t),
        );
        engine.process(dx.view(), dy.view()).unwrap();
        engine.intensity().clone()
    }

    #[test]
    fn sliding_sums_match_brute_force() {
        let mut rng = StdRng::seed_from_u64(7);
        for &(width, height) in &[(20usize, 30usize), (64, 64)] {
            let dx = random_image(&mut rng, width, height);
            let dy = random_image(&mut rng, width, height);
            for radius in 1..=3 {
                let xx = component_map(&dx, &dy, radius, |t| t.xx);
                let xy = component_map(&dx, &dy, radius, |t| t.xy);
                let yy = component_map(&dx, &dy, radius, |t| t.yy);
                for y in radius..height - radius {
                    for x in radius..width - radius {
                        let expected = brute_force(&dx, &dy, radius, x, y);
                        for (got, want) in [
                            (xx.get(x, y), expected.0),
                            (xy.get(x, y), expected.1),
                            (yy.get(x, y), expected.2),
                        ] {
                            let got = f64::from(*got.unwrap());
                            let tol = 1e-3 * want.abs().max(1.0);
                            assert!(
                                (got - want).abs() < tol,
                                "({x},{y}) r={radius}: {got} vs {want}"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn integer_gradients_sum_exactly() {
        let mut rng = StdRng::seed_from_u64(11);
        let (width, height, radius) = (17usize, 13usize, 2usize);
        let dx: Vec<i16> = (0..width * height)
            .map(|_| rng.random_range(-300i16..300))
            .collect();
        let dy: Vec<i16> = (0..width * height)
            .map(|_| rng.random_range(-300i16..300))
            .collect();
        let view_x = ImageView::from_slice(&dx, width, height).unwrap();
        let view_y = ImageView::from_slice(&dy, width, height).unwrap();

        let mut engine = WindowedStructureTensor::<i16, _>::new(
            radius,
            |t: &StructureTensor, _x: usize, _y: usize| t.xy,
        );
        engine.process(view_x, view_y).unwrap();

        for y in radius..height - radius {
            for x in radius..width - radius {
                let mut expected = 0i64;
                for j in y - radius..=y + radius {
                    for i in x - radius..=x + radius {
                        let idx = j * width + i;
                        expected += i64::from(dx[idx]) * i64::from(dy[idx]);
                    }
                }
                let got = *engine.intensity().get(x, y).unwrap();
                assert_eq!(got, expected as f32);
            }
        }
    }

    #[test]
    fn border_stays_zero_across_reshapes() {
        let mut rng = StdRng::seed_from_u64(3);
        let radius = 2;
        let mut engine = WindowedStructureTensor::<f32, _>::new(radius, Harris::default());
        for &(width, height) in &[(16usize, 12usize), (9, 21), (16, 12)] {
            let dx = random_image(&mut rng, width, height);
            let dy = random_image(&mut rng, width, height);
            engine.process(dx.view(), dy.view()).unwrap();
            let inten = engine.intensity();
            assert_eq!(inten.shape(), (width, height));
            for y in 0..height {
                for x in 0..width {
                    let interior = x >= radius
                        && y >= radius
                        && x < width - radius
                        && y < height - radius;
                    if !interior {
                        assert_eq!(*inten.get(x, y).unwrap(), 0.0, "border ({x},{y})");
                    }
                }
            }
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let mut rng = StdRng::seed_from_u64(5);
        let dx = random_image(&mut rng, 24, 24);
        let dy = random_image(&mut rng, 24, 24);
        let mut engine = WindowedStructureTensor::<f32, _>::new(3, ShiTomasi);
        engine.process(dx.view(), dy.view()).unwrap();
        let first = engine.intensity().clone();
        engine.process(dx.view(), dy.view()).unwrap();
        assert_eq!(&first, engine.intensity());
    }

    #[test]
    fn mismatched_gradients_are_rejected() {
        let dx = Image::<f32>::new(10, 8);
        let dy = Image::<f32>::new(8, 10);
        let mut engine = WindowedStructureTensor::<f32, _>::new(1, Harris::default());
        let err = engine.process(dx.view(), dy.view()).err().unwrap();
        assert_eq!(
            err,
            FeatError::SizeMismatch {
                expected_width: 10,
                expected_height: 8,
                width: 8,
                height: 10,
            }
        );
    }

    #[test]
    fn images_smaller_than_window_yield_zero_map() {
        let dx = Image::from_vec(vec![1.0f32; 12], 4, 3).unwrap();
        let mut engine = WindowedStructureTensor::<f32, _>::new(2, Harris::default());
        engine.process(dx.view(), dx.view()).unwrap();
        assert!(engine.intensity().as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn formulas_follow_tensor_algebra() {
        let t = StructureTensor {
            xx: 4.0,
            xy: 1.0,
            yy: 2.0,
        };
        assert_eq!(t.determinant(), 7.0);
        let harris = Harris { kappa: 0.05 };
        assert!((harris.response(&t, 0, 0) - (7.0 - 0.05 * 36.0)).abs() < 1e-6);
        let expected = 3.0 - 2.0f32.sqrt();
        assert!((ShiTomasi.response(&t, 0, 0) - expected).abs() < 1e-6);
    }
}
