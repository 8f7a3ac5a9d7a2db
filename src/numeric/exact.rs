// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Exact arithmetic on floating-point expansions
//!
//! A value is stored as a sum of doubles that do not overlap in their bit
//! ranges, ordered by increasing magnitude (Shewchuk's expansions). Sums and
//! products of doubles are then exact, so the sign of any polynomial
//! predicate over double inputs can be decided without error.
//!
//! Exponent overflow and underflow are not handled.

use super::{two_product, two_sum};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// Exact real number represented as a nonoverlapping expansion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExactFloat {
    // increasing magnitude, zeros removed; empty means zero
    terms: Vec<f64>,
}

impl ExactFloat {
    pub fn zero() -> Self {
        Self { terms: Vec::new() }
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Number of components in the expansion.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[f64] {
        &self.terms
    }

    /// Exact sign. The largest component decides it.
    pub fn sign(&self) -> Ordering {
        match self.terms.last() {
            Some(&t) if t > 0.0 => Ordering::Greater,
            Some(_) => Ordering::Less,
            None => Ordering::Equal,
        }
    }

    /// Double approximation of the value.
    pub fn estimate(&self) -> f64 {
        self.terms.iter().sum()
    }

    /// Adds a single double, keeping the expansion nonoverlapping.
    fn grow(&mut self, b: f64) {
        if b == 0.0 {
            return;
        }
        let mut q = b;
        let mut out = Vec::with_capacity(self.terms.len() + 1);
        for &e in &self.terms {
            let (s, h) = two_sum(q, e);
            if h != 0.0 {
                out.push(h);
            }
            q = s;
        }
        if q != 0.0 {
            out.push(q);
        }
        self.terms = out;
    }

    fn scaled(&self, b: f64) -> ExactFloat {
        let mut result = ExactFloat::zero();
        if b == 0.0 {
            return result;
        }
        for &e in &self.terms {
            let (p, err) = two_product(e, b);
            result.grow(err);
            result.grow(p);
        }
        result
    }
}

impl From<f64> for ExactFloat {
    fn from(value: f64) -> Self {
        assert!(value.is_finite(), "exact arithmetic on non-finite value {}", value);
        let mut result = ExactFloat::zero();
        result.grow(value);
        result
    }
}

impl Add for ExactFloat {
    type Output = ExactFloat;

    fn add(mut self, rhs: ExactFloat) -> ExactFloat {
        for &t in &rhs.terms {
            self.grow(t);
        }
        self
    }
}

impl Sub for ExactFloat {
    type Output = ExactFloat;

    fn sub(self, rhs: ExactFloat) -> ExactFloat {
        self + (-rhs)
    }
}

impl Neg for ExactFloat {
    type Output = ExactFloat;

    fn neg(mut self) -> ExactFloat {
        for t in &mut self.terms {
            *t = -*t;
        }
        self
    }
}

impl Mul for ExactFloat {
    type Output = ExactFloat;

    fn mul(self, rhs: ExactFloat) -> ExactFloat {
        let mut result = ExactFloat::zero();
        for &b in &rhs.terms {
            result = result + self.scaled(b);
        }
        result
    }
}

impl PartialOrd for ExactFloat {
    fn partial_cmp(&self, other: &ExactFloat) -> Option<Ordering> {
        Some((self.clone() - other.clone()).sign())
    }
}

impl fmt::Display for ExactFloat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:e} ({} terms)", self.estimate(), self.terms.len())
    }
}
