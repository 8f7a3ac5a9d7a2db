// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Robust geometric predicates
//!
//! Every predicate escalates through three precision tiers:
//!
//! 1. plain `f64` evaluation checked against an a-priori forward error bound,
//! 2. an interval evaluation ([`IntervalFloat`]) whose enclosure proves the sign,
//! 3. exact expansion arithmetic ([`ExactFloat`]).
//!
//! A tier answers only when its sign is certain, so the result is always the
//! sign of the exact real expression. Constructions (intersection points,
//! distances) live elsewhere and stay inexact.
//!
//! The fast tier is skipped when coordinate differences are so small or so
//! large that its products would leave the normal range. The exact tier
//! rescales its inputs by a power of two first, which leaves the sign alone
//! and keeps the expansions clear of underflow and overflow.

use super::primitives::{Point2, Point3, Vector3};
use crate::numeric::{bit_range, scale_pow2, ExactFloat, IntervalFloat, PredicateScalar};
use std::cmp::Ordering;
use std::ops::RangeInclusive;

/// Unit roundoff of `f64` (half machine epsilon).
const EPSILON: f64 = f64::EPSILON * 0.5;

/// Forward error bound factor for `orient2d` (Shewchuk's `ccwerrboundA`).
const ORIENT2D_BOUND: f64 = (3.0 + 16.0 * EPSILON) * EPSILON;

/// Forward error bound factor for `orient3d` (Shewchuk's `o3derrboundA`).
const ORIENT3D_BOUND: f64 = (7.0 + 56.0 * EPSILON) * EPSILON;

/// Difference magnitudes for which the a-priori bounds hold: products of up
/// to three of them stay normal.
const FAST_RANGE: RangeInclusive<f64> = 1e-90..=1e90;

/// Precision tier that decided a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precision {
    Fast,
    Interval,
    Exact,
}

/// Side of an oriented plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneClassification {
    Front,
    Back,
    OnPlane,
}

impl From<Ordering> for PlaneClassification {
    fn from(sign: Ordering) -> Self {
        match sign {
            Ordering::Greater => PlaneClassification::Front,
            Ordering::Less => PlaneClassification::Back,
            Ordering::Equal => PlaneClassification::OnPlane,
        }
    }
}

fn orient2d_expr<S: PredicateScalar>(a: &Point2, b: &Point2, c: &Point2) -> S {
    let acx = S::from(a.x) - S::from(c.x);
    let bcx = S::from(b.x) - S::from(c.x);
    let acy = S::from(a.y) - S::from(c.y);
    let bcy = S::from(b.y) - S::from(c.y);
    acx * bcy - acy * bcx
}

fn orient3d_expr<S: PredicateScalar>(a: &Point3, b: &Point3, c: &Point3, d: &Point3) -> S {
    let diff = |p: &Point3, i: usize| S::from(p[i]) - S::from(a[i]);
    let (ux, uy, uz) = (diff(b, 0), diff(b, 1), diff(b, 2));
    let (vx, vy, vz) = (diff(c, 0), diff(c, 1), diff(c, 2));
    let (wx, wy, wz) = (diff(d, 0), diff(d, 1), diff(d, 2));
    ux * (vy.clone() * wz.clone() - vz.clone() * wy.clone())
        + uy * (vz * wx.clone() - vx.clone() * wz)
        + uz * (vx * wy - vy * wx)
}

fn dot_compare_expr<S: PredicateScalar>(p: &Point3, q: &Point3, r: &Point3, s: &Point3) -> S {
    let mut lhs = S::from(0.0);
    let mut rhs = S::from(0.0);
    for i in 0..3 {
        let d = S::from(q[i]) - S::from(p[i]);
        lhs = lhs + d.clone() * (S::from(r[i]) - S::from(p[i]));
        rhs = rhs + d * (S::from(s[i]) - S::from(p[i]));
    }
    lhs - rhs
}

/// Orientation of `c` relative to the directed line `a → b`.
///
/// `Greater` when `a, b, c` turn counter-clockwise, `Less` when clockwise,
/// `Equal` when collinear.
pub fn orient2d(a: &Point2, b: &Point2, c: &Point2) -> Ordering {
    orient2d_traced(a, b, c).0
}

/// [`orient2d`] together with the tier that decided it.
pub fn orient2d_traced(a: &Point2, b: &Point2, c: &Point2) -> (Ordering, Precision) {
    let (acx, bcx, acy, bcy) = (a.x - c.x, b.x - c.x, a.y - c.y, b.y - c.y);
    if within_fast_range(&[acx, bcx, acy, bcy]) {
        let left = acx * bcy;
        let right = acy * bcx;
        let det = left - right;
        let bound = ORIENT2D_BOUND * (left.abs() + right.abs());
        if det > bound || -det > bound {
            return (sign_of(det), Precision::Fast);
        }
    }

    if let Some(sign) = orient2d_expr::<IntervalFloat>(a, b, c).sign() {
        return (sign, Precision::Interval);
    }

    let k = exact_scale(&[a.x, a.y, b.x, b.y, c.x, c.y], 2);
    let scale = |p: &Point2| p.map(|x| scale_pow2(x, k));
    let det = orient2d_expr::<ExactFloat>(&scale(a), &scale(b), &scale(c));
    (det.sign(), Precision::Exact)
}

/// Orientation of `d` relative to the plane through `a, b, c`.
///
/// Sign of `(b - a) · ((c - a) × (d - a))`: `Greater` when `d` lies on the
/// side the right-hand normal of `a, b, c` points to.
pub fn orient3d(a: &Point3, b: &Point3, c: &Point3, d: &Point3) -> Ordering {
    orient3d_traced(a, b, c, d).0
}

/// [`orient3d`] together with the tier that decided it.
pub fn orient3d_traced(a: &Point3, b: &Point3, c: &Point3, d: &Point3) -> (Ordering, Precision) {
    let u = b - a;
    let v = c - a;
    let w = d - a;
    if within_fast_range(u.iter().chain(v.iter()).chain(w.iter())) {
        let det = u.x * (v.y * w.z - v.z * w.y)
            + u.y * (v.z * w.x - v.x * w.z)
            + u.z * (v.x * w.y - v.y * w.x);
        let permanent = u.x.abs() * ((v.y * w.z).abs() + (v.z * w.y).abs())
            + u.y.abs() * ((v.z * w.x).abs() + (v.x * w.z).abs())
            + u.z.abs() * ((v.x * w.y).abs() + (v.y * w.x).abs());
        let bound = ORIENT3D_BOUND * permanent;
        if det > bound || -det > bound {
            return (sign_of(det), Precision::Fast);
        }
    }

    if let Some(sign) = orient3d_expr::<IntervalFloat>(a, b, c, d).sign() {
        return (sign, Precision::Interval);
    }

    let k = exact_scale(&coords3(&[a, b, c, d]), 3);
    let scale = |p: &Point3| p.map(|x| scale_pow2(x, k));
    let det = orient3d_expr::<ExactFloat>(&scale(a), &scale(b), &scale(c), &scale(d));
    (det.sign(), Precision::Exact)
}

/// Orders `r` and `s` along the reference direction `p → q`.
///
/// Compares `(q - p) · (r - p)` with `(q - p) · (s - p)`; `Less` means `r`
/// comes before `s` when walking from `p` towards `q`.
pub fn point_dot_compare_3d(p: &Point3, q: &Point3, r: &Point3, s: &Point3) -> Ordering {
    point_dot_compare_3d_traced(p, q, r, s).0
}

/// [`point_dot_compare_3d`] together with the tier that decided it.
pub fn point_dot_compare_3d_traced(
    p: &Point3,
    q: &Point3,
    r: &Point3,
    s: &Point3,
) -> (Ordering, Precision) {
    if let Some(sign) = dot_compare_expr::<IntervalFloat>(p, q, r, s).sign() {
        return (sign, Precision::Interval);
    }
    let k = exact_scale(&coords3(&[p, q, r, s]), 2);
    let scale = |x: &Point3| x.map(|c| scale_pow2(c, k));
    let diff = dot_compare_expr::<ExactFloat>(&scale(p), &scale(q), &scale(r), &scale(s));
    (diff.sign(), Precision::Exact)
}

/// Exact collinearity test for three points in space.
pub fn collinear3d(a: &Point3, b: &Point3, c: &Point3) -> bool {
    // collinear iff every coordinate projection is collinear
    let xy = |p: &Point3| Point2::new(p.x, p.y);
    let yz = |p: &Point3| Point2::new(p.y, p.z);
    let zx = |p: &Point3| Point2::new(p.z, p.x);
    orient2d(&xy(a), &xy(b), &xy(c)) == Ordering::Equal
        && orient2d(&yz(a), &yz(b), &yz(c)) == Ordering::Equal
        && orient2d(&zx(a), &zx(b), &zx(c)) == Ordering::Equal
}

/// Classify `point` against the oriented plane through `a, b, c`.
pub fn classify_point_plane(a: &Point3, b: &Point3, c: &Point3, point: &Point3) -> PlaneClassification {
    orient3d(a, b, c, point).into()
}

/// Robust triangle area: exact zero for degenerate triangles.
pub fn triangle_area(a: &Point3, b: &Point3, c: &Point3) -> f64 {
    if collinear3d(a, b, c) {
        return 0.0;
    }
    let cross: Vector3 = (b - a).cross(&(c - a));
    cross.norm() / 2.0
}

fn within_fast_range<'a>(values: impl IntoIterator<Item = &'a f64>) -> bool {
    values
        .into_iter()
        .all(|v| *v == 0.0 || FAST_RANGE.contains(&v.abs()))
}

fn coords3(points: &[&Point3; 4]) -> [f64; 12] {
    let mut coords = [0.0; 12];
    for (i, p) in points.iter().enumerate() {
        coords[3 * i..3 * i + 3].copy_from_slice(&[p.x, p.y, p.z]);
    }
    coords
}

/// Exponent `k` such that a degree-`degree` polynomial in differences of
/// `coords * 2^k` is computed exactly by expansion arithmetic.
///
/// Every expansion component is then a multiple of `2^(degree * low)` and
/// below `2^1024`. Inputs spanning more binades than that allows are left
/// unscaled.
fn exact_scale(coords: &[f64], degree: i32) -> i32 {
    let (mut high, mut low) = (i32::MIN, i32::MAX);
    for &x in coords.iter().filter(|x| **x != 0.0) {
        let (h, l) = bit_range(x);
        high = high.max(h);
        low = low.min(l);
    }
    if high == i32::MIN {
        return 0;
    }
    // differences add one bit, sums of up to six products three more
    let min_k = -(1074 / degree) - low;
    let max_k = 1021 / degree - 2 - high;
    if min_k > max_k {
        return 0;
    }
    0.clamp(min_k, max_k)
}

fn sign_of(value: f64) -> Ordering {
    if value > 0.0 {
        Ordering::Greater
    } else if value < 0.0 {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}
