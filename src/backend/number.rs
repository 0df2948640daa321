// src/backend/number.rs

use ndarray::{LinalgScalar, ScalarOperand};
use rand_distr::num_traits::{Float as NumFloat, FromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::iter::Sum;
use std::ops::{AddAssign, MulAssign, Neg, SubAssign};

/// Element type that tensors and loss kernels operate on.
///
/// Wraps the `num_traits` float interface (re-exported by `rand_distr`) with the
/// handful of conversions the kernels need. Implemented for `f32` and `f64`.
pub trait Float:
    NumFloat
    + FromPrimitive
    + LinalgScalar
    + ScalarOperand
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + Sum<Self>
    + for<'a> Sum<&'a Self>
    + Debug
    + Display
    + Default
    + Serialize
    + for<'a> Deserialize<'a>
    + Send
    + Sync
    + 'static
{
    /// Converts from f64, rounding to the nearest representable value.
    fn from_f64_lossy(value: f64) -> Self;

    /// Converts to f64 for index extraction and diagnostics.
    fn to_f64_lossy(self) -> f64;

    /// Converts a count (element or sample count) into this type.
    fn from_count(count: usize) -> Self {
        Self::from_f64_lossy(count as f64)
    }

    /// Numerically stable `ln(1 + exp(x))`.
    fn softplus(self) -> Self {
        // max(x, 0) + ln(1 + exp(-|x|))
        let zero = Self::zero();
        let positive = if self > zero { self } else { zero };
        positive + (-self.abs()).exp().ln_1p()
    }

    /// Numerically stable `ln(sigmoid(x))`.
    fn log_sigmoid(self) -> Self {
        -(-self).softplus()
    }

    /// `ln(exp(a) + exp(b))` without overflow; handles negative infinity.
    fn log_add_exp(self, other: Self) -> Self {
        let neg_inf = Self::neg_infinity();
        if self == neg_inf {
            return other;
        }
        if other == neg_inf {
            return self;
        }
        let (hi, lo) = if self > other {
            (self, other)
        } else {
            (other, self)
        };
        hi + (lo - hi).exp().ln_1p()
    }
}

impl Float for f64 {
    fn from_f64_lossy(value: f64) -> Self {
        value
    }

    fn to_f64_lossy(self) -> f64 {
        self
    }
}

impl Float for f32 {
    fn from_f64_lossy(value: f64) -> Self {
        value as f32
    }

    fn to_f64_lossy(self) -> f64 {
        self as f64
    }
}

#[cfg(test)]
mod tests {
    use super::Float;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_softplus_matches_naive_form_in_safe_range() {
        for x in [-5.0f64, -1.0, 0.0, 0.5, 3.0] {
            assert_abs_diff_eq!(x.softplus(), (1.0 + x.exp()).ln(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_softplus_large_inputs_do_not_overflow() {
        assert_abs_diff_eq!(1000.0f64.softplus(), 1000.0, epsilon = 1e-9);
        assert_abs_diff_eq!((-1000.0f64).softplus(), 0.0, epsilon = 1e-12);
        assert!(800.0f32.softplus().is_finite());
    }

    #[test]
    fn test_log_add_exp_with_negative_infinity() {
        let neg_inf = f64::NEG_INFINITY;
        assert_eq!(neg_inf.log_add_exp(neg_inf), neg_inf);
        assert_abs_diff_eq!(neg_inf.log_add_exp(0.5), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(
            0.0f64.log_add_exp(0.0),
            std::f64::consts::LN_2,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_log_sigmoid() {
        assert_abs_diff_eq!(0.0f64.log_sigmoid(), -std::f64::consts::LN_2, epsilon = 1e-12);
        assert!((-800.0f64).log_sigmoid().is_finite());
    }
}
