//! Pixel sample types and their window-sum accumulators.
//!
//! Every algorithm in the crate is generic over [`Sample`]. Integer samples
//! accumulate window sums in a wider integer type so the sliding sums are
//! exact; float samples accumulate in their own type.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// Accumulator used for windowed sums of sample products.
pub trait WindowSum:
    Copy
    + Default
    + Debug
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + AddAssign
    + SubAssign
    + Send
    + Sync
    + 'static
{
    /// Converts the accumulated value to `f32` for intensity formulas.
    fn to_f32(self) -> f32;
}

impl WindowSum for i32 {
    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }
}

impl WindowSum for i64 {
    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }
}

impl WindowSum for f32 {
    #[inline]
    fn to_f32(self) -> f32 {
        self
    }
}

impl WindowSum for f64 {
    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }
}

/// Numeric pixel sample.
pub trait Sample: Copy + Default + Debug + PartialEq + Send + Sync + 'static {
    /// Accumulator for sums of products of this sample type.
    type Sum: WindowSum;

    /// Widens the sample into its accumulator type.
    fn widen(self) -> Self::Sum;

    /// Converts the sample to `f32`.
    fn to_f32(self) -> f32;

    /// Converts an `f32` back to the sample type.
    ///
    /// Integer types round half up and saturate at their range.
    fn from_f32(value: f32) -> Self;
}

impl Sample for u8 {
    type Sum = i32;

    #[inline]
    fn widen(self) -> i32 {
        i32::from(self)
    }

    #[inline]
    fn to_f32(self) -> f32 {
        f32::from(self)
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        (value + 0.5).floor().clamp(0.0, 255.0) as u8
    }
}

impl Sample for i16 {
    type Sum = i64;

    #[inline]
    fn widen(self) -> i64 {
        i64::from(self)
    }

    #[inline]
    fn to_f32(self) -> f32 {
        f32::from(self)
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        (value + 0.5)
            .floor()
            .clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
    }
}

impl Sample for i32 {
    type Sum = i64;

    #[inline]
    fn widen(self) -> i64 {
        i64::from(self)
    }

    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        // `as` saturates for out-of-range floats.
        (value + 0.5).floor() as i32
    }
}

impl Sample for f32 {
    type Sum = f32;

    #[inline]
    fn widen(self) -> f32 {
        self
    }

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        value
    }
}

impl Sample for f64 {
    type Sum = f64;

    #[inline]
    fn widen(self) -> f64 {
        self
    }

    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        f64::from(value)
    }
}
