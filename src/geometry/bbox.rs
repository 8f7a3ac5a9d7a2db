// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bounding box utilities

use nalgebra::{Point, SVector};

/// Axis-aligned bounding box in `D` dimensions.
///
/// A box with `min > max` on any axis is empty. The empty box is
/// `[+inf, -inf]` on every axis, so joining anything into it yields that
/// thing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox<const D: usize> {
    pub min: Point<f64, D>,
    pub max: Point<f64, D>,
}

pub type Box2 = BoundingBox<2>;
pub type Box3 = BoundingBox<3>;

impl<const D: usize> BoundingBox<D> {
    pub fn new(min: Point<f64, D>, max: Point<f64, D>) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Point::from(SVector::repeat(f64::INFINITY)),
            max: Point::from(SVector::repeat(f64::NEG_INFINITY)),
        }
    }

    /// Minimal box containing every point; empty for an empty iterator.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Point<f64, D>>,
    {
        let mut bbox = Self::empty();
        for point in points {
            bbox.expand_to_include(&point);
        }
        bbox
    }

    pub fn is_empty(&self) -> bool {
        (0..D).any(|i| self.min[i] > self.max[i])
    }

    pub fn expand_to_include(&mut self, point: &Point<f64, D>) {
        for i in 0..D {
            self.min[i] = self.min[i].min(point[i]);
            self.max[i] = self.max[i].max(point[i]);
        }
    }

    /// Coordinate-wise union.
    pub fn join(&self, other: &Self) -> Self {
        let mut result = *self;
        for i in 0..D {
            result.min[i] = self.min[i].min(other.min[i]);
            result.max[i] = self.max[i].max(other.max[i]);
        }
        result
    }

    /// Coordinate-wise intersection; may be empty.
    pub fn intersection(&self, other: &Self) -> Self {
        let mut result = *self;
        for i in 0..D {
            result.min[i] = self.min[i].max(other.min[i]);
            result.max[i] = self.max[i].min(other.max[i]);
        }
        result
    }

    pub fn intersects(&self, other: &Self) -> bool {
        (0..D).all(|i| self.min[i] <= other.max[i] && self.max[i] >= other.min[i])
    }

    pub fn contains_point(&self, point: &Point<f64, D>) -> bool {
        (0..D).all(|i| self.min[i] <= point[i] && point[i] <= self.max[i])
    }

    pub fn contains_box(&self, other: &Self) -> bool {
        other.is_empty()
            || (0..D).all(|i| self.min[i] <= other.min[i] && other.max[i] <= self.max[i])
    }

    pub fn center(&self) -> Point<f64, D> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> SVector<f64, D> {
        self.max - self.min
    }

    /// Product of the extents; zero for an empty box.
    pub fn volume(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.size().iter().product()
    }

    /// Index of the longest axis.
    pub fn longest_axis(&self) -> usize {
        self.size().imax()
    }

    /// Box grown by `amount` on every side.
    pub fn inflated(&self, amount: f64) -> Self {
        let delta = SVector::repeat(amount);
        Self::new(self.min - delta, self.max + delta)
    }

    /// Check if two bounding boxes are approximately equal within tolerance
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (0..D).all(|i| {
            (self.min[i] - other.min[i]).abs() < tolerance
                && (self.max[i] - other.max[i]).abs() < tolerance
        })
    }

    /// Corner `k` of the box; bit `i` of `k` selects `max` on axis `i`.
    pub fn corner(&self, k: usize) -> Point<f64, D> {
        let mut p = self.min;
        for i in 0..D {
            if k & (1 << i) != 0 {
                p[i] = self.max[i];
            }
        }
        p
    }
}

impl<const D: usize> Default for BoundingBox<D> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const D: usize> FromIterator<Point<f64, D>> for BoundingBox<D> {
    fn from_iter<I: IntoIterator<Item = Point<f64, D>>>(iter: I) -> Self {
        Self::from_points(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point2, Point3};

    #[test]
    fn test_bounding_box() {
        let mut bbox = Box3::empty();
        bbox.expand_to_include(&Point3::new(1.0, 2.0, 3.0));
        bbox.expand_to_include(&Point3::new(-1.0, -2.0, -3.0));

        assert_eq!(bbox.min, Point3::new(-1.0, -2.0, -3.0));
        assert_eq!(bbox.max, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(bbox.center(), Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bbox.volume(), 48.0);
    }

    #[test]
    fn test_empty_sentinel() {
        let bbox = Box2::empty();
        assert!(bbox.is_empty());
        assert_eq!(bbox.volume(), 0.0);
        let from_nothing: Box2 = Vec::<Point2<f64>>::new().into_iter().collect();
        assert!(from_nothing.is_empty());
        let single = Box2::from_points([Point2::new(1.0, 1.0)]);
        assert!(!single.is_empty());
        assert_eq!(single.join(&bbox), single);
    }

    #[test]
    fn test_join_and_intersection() {
        let a = Box2::new(Point2::new(0.0, 0.0), Point2::new(2.0, 2.0));
        let b = Box2::new(Point2::new(1.0, 1.0), Point2::new(3.0, 4.0));
        let joined = a.join(&b);
        assert_eq!(joined.min, Point2::new(0.0, 0.0));
        assert_eq!(joined.max, Point2::new(3.0, 4.0));
        assert!(joined.contains_box(&a) && joined.contains_box(&b));

        let inter = a.intersection(&b);
        assert_eq!(inter.min, Point2::new(1.0, 1.0));
        assert_eq!(inter.max, Point2::new(2.0, 2.0));

        let far = Box2::new(Point2::new(5.0, 5.0), Point2::new(6.0, 6.0));
        assert!(!a.intersects(&far));
        assert!(a.intersection(&far).is_empty());
    }

    #[test]
    fn test_corners() {
        let bbox = Box3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(bbox.corner(0), bbox.min);
        assert_eq!(bbox.corner(7), bbox.max);
        assert_eq!(bbox.corner(2), Point3::new(0.0, 2.0, 0.0));
        assert_eq!(bbox.longest_axis(), 2);
    }
}
