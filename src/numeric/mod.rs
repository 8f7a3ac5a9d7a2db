// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Numeric kernel for robust predicates
//!
//! Two scalar types back the escalation used by the predicates:
//! [`IntervalFloat`] encloses the exact result of an expression and is cheap,
//! [`ExactFloat`] represents it exactly as a floating-point expansion.

mod exact;
mod interval;

pub use exact::ExactFloat;
pub use interval::IntervalFloat;

use std::ops::{Add, Mul, Neg, Sub};

/// Arithmetic needed to evaluate a predicate expression.
///
/// Predicate expressions are written once, generic over this trait, and
/// evaluated per precision tier.
pub trait PredicateScalar:
    Clone
    + From<f64>
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
{
}

impl PredicateScalar for f64 {}
impl PredicateScalar for IntervalFloat {}
impl PredicateScalar for ExactFloat {}

/// Products below this magnitude may have lost bits to gradual underflow,
/// so [`two_product`] no longer recovers their rounding error.
pub(crate) const UNDERFLOW_LIMIT: f64 = f64::MIN_POSITIVE / f64::EPSILON * 4.0;

/// Error-free sum: returns `(s, e)` with `s = fl(a + b)` and `a + b = s + e` exactly.
#[inline]
pub(crate) fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bv = s - a;
    let av = s - bv;
    let br = b - bv;
    let ar = a - av;
    (s, ar + br)
}

/// Error-free product: returns `(p, e)` with `p = fl(a * b)` and `a * b = p + e` exactly.
#[inline]
pub(crate) fn two_product(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    (p, a.mul_add(b, -p))
}

/// Binary exponents of the highest and lowest set bits of a finite non-zero
/// double, so that `2^low <= |x| < 2^(high + 1)` and `x` is a multiple of `2^low`.
pub(crate) fn bit_range(x: f64) -> (i32, i32) {
    debug_assert!(x.is_finite() && x != 0.0);
    let bits = x.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };
    let high = 63 - mantissa.leading_zeros() as i32 + exponent;
    let low = mantissa.trailing_zeros() as i32 + exponent;
    (high, low)
}

/// `x * 2^k`, exact whenever the result is representable.
pub(crate) fn scale_pow2(mut x: f64, mut k: i32) -> f64 {
    // single steps keep the factor itself a normal double
    while k != 0 {
        let step = k.clamp(-1000, 1000);
        x *= f64::from_bits(((1023 + step) as u64) << 52);
        k -= step;
    }
    x
}

/// Smallest double strictly greater than `x`.
pub(crate) fn next_up(x: f64) -> f64 {
    if x.is_nan() || x == f64::INFINITY {
        return x;
    }
    if x == 0.0 {
        return f64::from_bits(1);
    }
    let bits = x.to_bits();
    if x > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

/// Largest double strictly less than `x`.
pub(crate) fn next_down(x: f64) -> f64 {
    -next_up(-x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_sum_recovers_rounding_error() {
        let (s, e) = two_sum(1.0, 1e-20);
        assert_eq!(s, 1.0);
        assert_eq!(e, 1e-20);
    }

    #[test]
    fn test_two_product_is_exact() {
        let a = 1.0 + f64::EPSILON;
        let (p, e) = two_product(a, a);
        // (1 + eps)^2 = 1 + 2 eps + eps^2, the eps^2 part is lost by rounding
        assert_eq!(p, 1.0 + 2.0 * f64::EPSILON);
        assert_eq!(e, f64::EPSILON * f64::EPSILON);
    }

    #[test]
    fn test_bit_range() {
        assert_eq!(bit_range(1.0), (0, 0));
        assert_eq!(bit_range(-6.0), (2, 1));
        assert_eq!(bit_range(0.75), (-1, -2));
        assert_eq!(bit_range(f64::from_bits(1)), (-1074, -1074));
        assert_eq!(bit_range(f64::MAX), (1023, 971));
    }

    #[test]
    fn test_scale_pow2() {
        assert_eq!(scale_pow2(3.0, 4), 48.0);
        assert_eq!(scale_pow2(48.0, -4), 3.0);
        assert_eq!(scale_pow2(1e-300, 1500), 1e-300 * 2f64.powi(1000) * 2f64.powi(500));
        let tiny = f64::from_bits(3);
        assert_eq!(scale_pow2(scale_pow2(tiny, 1100), -1100), tiny);
    }

    #[test]
    fn test_next_up_down() {
        assert!(next_up(1.0) > 1.0);
        assert!(next_down(1.0) < 1.0);
        assert!(next_up(0.0) > 0.0);
        assert!(next_down(0.0) < 0.0);
        assert_eq!(next_down(next_up(-3.5)), -3.5);
    }
}
