// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Interval arithmetic with outward rounding

use super::{next_down, next_up, two_product, two_sum, UNDERFLOW_LIMIT};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// Closed interval `[lo, hi]` that always encloses the exact real result.
///
/// Every operation computes the round-to-nearest result together with its
/// exact rounding error and moves the bound one ulp outward only when the
/// error points that way, which emulates directed rounding. Products too
/// small for an exact error term are widened past zero's neighbourhood, and
/// overflow widens to infinity, so the enclosure holds for all finite inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalFloat {
    lo: f64,
    hi: f64,
}

impl IntervalFloat {
    pub fn new(lo: f64, hi: f64) -> Self {
        assert!(lo <= hi, "invalid interval [{}, {}]", lo, hi);
        Self { lo, hi }
    }

    pub fn point(value: f64) -> Self {
        Self { lo: value, hi: value }
    }

    pub fn lower(&self) -> f64 {
        self.lo
    }

    pub fn upper(&self) -> f64 {
        self.hi
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lo <= value && value <= self.hi
    }

    /// Sign of every value in the interval, or `None` when it straddles zero.
    pub fn sign(&self) -> Option<Ordering> {
        if self.lo > 0.0 {
            Some(Ordering::Greater)
        } else if self.hi < 0.0 {
            Some(Ordering::Less)
        } else if self.lo == 0.0 && self.hi == 0.0 {
            Some(Ordering::Equal)
        } else {
            None
        }
    }
}

fn add_bounds(a: f64, b: f64) -> (f64, f64) {
    let (s, e) = two_sum(a, b);
    round_outward(s, e)
}

fn mul_bounds(a: f64, b: f64) -> (f64, f64) {
    let (p, e) = two_product(a, b);
    if p.abs() < UNDERFLOW_LIMIT && a != 0.0 && b != 0.0 {
        // |ab - p| stays below one ulp of UNDERFLOW_LIMIT
        let slack = UNDERFLOW_LIMIT * f64::EPSILON;
        return (next_down(p - slack), next_up(p + slack));
    }
    round_outward(p, e)
}

#[inline]
fn round_outward(value: f64, error: f64) -> (f64, f64) {
    if value.is_nan() {
        (f64::NEG_INFINITY, f64::INFINITY)
    } else if value == f64::INFINITY {
        (f64::MAX, f64::INFINITY)
    } else if value == f64::NEG_INFINITY {
        (f64::NEG_INFINITY, -f64::MAX)
    } else if error > 0.0 {
        (value, next_up(value))
    } else if error < 0.0 {
        (next_down(value), value)
    } else {
        (value, value)
    }
}

impl From<f64> for IntervalFloat {
    fn from(value: f64) -> Self {
        Self::point(value)
    }
}

impl Add for IntervalFloat {
    type Output = IntervalFloat;

    fn add(self, rhs: IntervalFloat) -> IntervalFloat {
        IntervalFloat {
            lo: add_bounds(self.lo, rhs.lo).0,
            hi: add_bounds(self.hi, rhs.hi).1,
        }
    }
}

impl Sub for IntervalFloat {
    type Output = IntervalFloat;

    fn sub(self, rhs: IntervalFloat) -> IntervalFloat {
        self + (-rhs)
    }
}

impl Neg for IntervalFloat {
    type Output = IntervalFloat;

    fn neg(self) -> IntervalFloat {
        IntervalFloat {
            lo: -self.hi,
            hi: -self.lo,
        }
    }
}

impl Mul for IntervalFloat {
    type Output = IntervalFloat;

    fn mul(self, rhs: IntervalFloat) -> IntervalFloat {
        let candidates = [
            mul_bounds(self.lo, rhs.lo),
            mul_bounds(self.lo, rhs.hi),
            mul_bounds(self.hi, rhs.lo),
            mul_bounds(self.hi, rhs.hi),
        ];
        let lo = candidates.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
        let hi = candidates
            .iter()
            .map(|c| c.1)
            .fold(f64::NEG_INFINITY, f64::max);
        IntervalFloat { lo, hi }
    }
}

impl fmt::Display for IntervalFloat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:e}, {:e}]", self.lo, self.hi)
    }
}
