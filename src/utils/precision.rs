//! Tolerance-aware floating-point comparison.
//!
//! Used to verify preconditioner results against the system matrix; production
//! code paths never branch on these comparisons.

use num_traits::Float;

/// Approximate equality for real scalars.
pub trait AlmostEq: Copy {
    /// Relative comparison: `|a - b| <= max_error * max(|a|, |b|)`, switching to
    /// an absolute comparison when either value is (close to) zero.
    ///
    /// Non-finite values compare equal only when they are identical infinities.
    fn almost_equal_relative(self, other: Self, max_error: Self) -> bool;

    /// Relative comparison with `10^-places` as error bound.
    fn almost_equal_decimal_places(self, other: Self, places: i32) -> bool;

    /// Relative comparison with ten machine epsilons as error bound.
    fn almost_equal(self, other: Self) -> bool;
}

impl<T: Float> AlmostEq for T {
    fn almost_equal_relative(self, other: T, max_error: T) -> bool {
        if !self.is_finite() || !other.is_finite() {
            return self == other;
        }
        let diff = (self - other).abs();
        let scale = self.abs().max(other.abs());
        if scale < max_error || scale <= T::min_positive_value() {
            diff <= max_error
        } else {
            diff <= max_error * scale
        }
    }

    fn almost_equal_decimal_places(self, other: T, places: i32) -> bool {
        let ten = T::from(10.0).unwrap_or_else(T::one);
        self.almost_equal_relative(other, ten.powi(-places))
    }

    fn almost_equal(self, other: T) -> bool {
        let ten = T::from(10.0).unwrap_or_else(T::one);
        self.almost_equal_relative(other, ten * T::epsilon())
    }
}

/// Elementwise [`AlmostEq::almost_equal_relative`]; slices of different length never match.
pub fn slices_almost_equal<T: Float>(a: &[T], b: &[T], max_error: T) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(&x, &y)| x.almost_equal_relative(y, max_error))
}
