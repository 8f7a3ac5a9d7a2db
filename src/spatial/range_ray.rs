// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Ray with a parametric range that shape clips narrow
//!
//! Every `intersect_*` call intersects the current `[lower, upper]` range
//! with the parameter interval inside the shape. The range only shrinks, so
//! a ray clipped against an outer volume can be clipped again against parts
//! of it. Once the range is empty it stays empty and every further clip
//! returns `false`.

use crate::geometry::{Box3, Cylinder, Point3, Segment3, Sphere, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeRay3 {
    pub origin: Point3,
    pub direction: Vector3,
    lower: f64,
    upper: f64,
}

impl RangeRay3 {
    /// Half-infinite ray `[0, +inf)`.
    pub fn new(origin: Point3, direction: Vector3) -> Self {
        Self::with_range(origin, direction, 0.0, f64::INFINITY)
    }

    pub fn with_range(origin: Point3, direction: Vector3, lower: f64, upper: f64) -> Self {
        assert!(!lower.is_nan() && !upper.is_nan(), "ray range must not be NaN");
        Self {
            origin,
            direction,
            lower,
            upper,
        }
    }

    /// Parameter 0 at `segment.a`, 1 at `segment.b`.
    pub fn from_segment(segment: &Segment3) -> Self {
        Self::with_range(segment.a, segment.direction(), 0.0, 1.0)
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn is_empty(&self) -> bool {
        self.lower > self.upper
    }

    pub fn point_at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    pub fn lower_point(&self) -> Point3 {
        self.point_at(self.lower)
    }

    pub fn upper_point(&self) -> Point3 {
        self.point_at(self.upper)
    }

    pub fn set_empty(&mut self) {
        self.lower = f64::INFINITY;
        self.upper = f64::NEG_INFINITY;
    }

    fn narrow(&mut self, t0: f64, t1: f64) -> bool {
        if self.is_empty() {
            return false;
        }
        self.lower = self.lower.max(t0);
        self.upper = self.upper.min(t1);
        if self.is_empty() {
            self.set_empty();
            return false;
        }
        true
    }

    fn reject(&mut self) -> bool {
        self.set_empty();
        false
    }

    /// Slab test against a closed box.
    pub fn intersect_box(&mut self, bbox: &Box3) -> bool {
        if self.is_empty() || bbox.is_empty() {
            return self.reject();
        }
        let mut t0 = f64::NEG_INFINITY;
        let mut t1 = f64::INFINITY;
        for axis in 0..3 {
            let o = self.origin[axis];
            let d = self.direction[axis];
            if d == 0.0 {
                // parallel to the slab
                if o < bbox.min[axis] || o > bbox.max[axis] {
                    return self.reject();
                }
                continue;
            }
            let a = (bbox.min[axis] - o) / d;
            let b = (bbox.max[axis] - o) / d;
            t0 = t0.max(a.min(b));
            t1 = t1.min(a.max(b));
        }
        self.narrow(t0, t1)
    }

    pub fn intersect_sphere(&mut self, sphere: &Sphere) -> bool {
        if self.is_empty() {
            return false;
        }
        let oc = self.origin - sphere.center;
        let c = oc.norm_squared() - sphere.radius * sphere.radius;
        let a = self.direction.norm_squared();
        if a == 0.0 {
            // the ray is a single point
            return if c <= 0.0 { true } else { self.reject() };
        }
        let b = self.direction.dot(&oc);
        let disc = b * b - a * c;
        if disc < 0.0 {
            return self.reject();
        }
        let root = disc.sqrt();
        self.narrow((-b - root) / a, (-b + root) / a)
    }

    /// Clip against a finite solid cylinder, caps included.
    pub fn intersect_cylinder(&mut self, cylinder: &Cylinder) -> bool {
        if self.is_empty() {
            return false;
        }
        let axis = cylinder.axis();
        let height = axis.norm();
        if height == 0.0 {
            return self.reject();
        }
        let u = axis / height;
        let w = self.origin - cylinder.base;
        let along_w = w.dot(&u);
        let along_d = self.direction.dot(&u);

        // caps: 0 <= along_w + t * along_d <= height
        if along_d == 0.0 {
            if along_w < 0.0 || along_w > height {
                return self.reject();
            }
        } else {
            let a = -along_w / along_d;
            let b = (height - along_w) / along_d;
            if !self.narrow(a.min(b), a.max(b)) {
                return false;
            }
        }

        // side: |w_perp + t * d_perp| <= radius
        let d_perp = self.direction - u * along_d;
        let w_perp = w - u * along_w;
        let c = w_perp.norm_squared() - cylinder.radius * cylinder.radius;
        let a = d_perp.norm_squared();
        if a <= f64::EPSILON * self.direction.norm_squared() {
            // parallel to the axis
            return if c <= 0.0 { true } else { self.reject() };
        }
        let b = d_perp.dot(&w_perp);
        let disc = b * b - a * c;
        if disc < 0.0 {
            return self.reject();
        }
        let root = disc.sqrt();
        self.narrow((-b - root) / a, (-b + root) / a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_box_clip() {
        let bbox = Box3::new(Point3::new(1.0, -1.0, -1.0), Point3::new(3.0, 1.0, 1.0));
        let mut ray = RangeRay3::new(Point3::origin(), Vector3::x());
        assert!(ray.intersect_box(&bbox));
        assert_relative_eq!(ray.lower(), 1.0);
        assert_relative_eq!(ray.upper(), 3.0);

        // never widens
        let big = Box3::new(Point3::new(-10.0, -10.0, -10.0), Point3::new(10.0, 10.0, 10.0));
        assert!(ray.intersect_box(&big));
        assert_relative_eq!(ray.lower(), 1.0);
        assert_relative_eq!(ray.upper(), 3.0);
    }

    #[test]
    fn test_box_miss_empties_range() {
        let bbox = Box3::new(Point3::new(1.0, 2.0, -1.0), Point3::new(3.0, 4.0, 1.0));
        let mut ray = RangeRay3::new(Point3::origin(), Vector3::x());
        assert!(!ray.intersect_box(&bbox));
        assert!(ray.is_empty());
        let inside = Box3::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        assert!(!ray.intersect_box(&inside));
    }

    #[test]
    fn test_box_behind_segment() {
        let bbox = Box3::new(Point3::new(2.0, -1.0, -1.0), Point3::new(3.0, 1.0, 1.0));
        let mut ray = RangeRay3::from_segment(&Segment3::new(Point3::origin(), Point3::new(1.0, 0.0, 0.0)));
        assert!(!ray.intersect_box(&bbox));
    }

    #[test]
    fn test_sphere_clip() {
        let sphere = Sphere::new(Point3::new(5.0, 0.0, 0.0), 2.0);
        let mut ray = RangeRay3::new(Point3::origin(), Vector3::new(2.0, 0.0, 0.0));
        assert!(ray.intersect_sphere(&sphere));
        assert_relative_eq!(ray.lower(), 1.5);
        assert_relative_eq!(ray.upper(), 3.5);
        assert_relative_eq!(ray.lower_point(), Point3::new(3.0, 0.0, 0.0));

        let mut miss = RangeRay3::new(Point3::new(0.0, 3.0, 0.0), Vector3::x());
        assert!(!miss.intersect_sphere(&sphere));
        assert!(miss.is_empty());
    }

    #[test]
    fn test_cylinder_clip() {
        let cylinder = Cylinder::new(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 4.0), 1.0);

        // across the side
        let mut ray = RangeRay3::new(Point3::new(-5.0, 0.0, 2.0), Vector3::x());
        assert!(ray.intersect_cylinder(&cylinder));
        assert_relative_eq!(ray.lower(), 4.0);
        assert_relative_eq!(ray.upper(), 6.0);

        // along the axis, through both caps
        let mut axial = RangeRay3::with_range(Point3::new(0.5, 0.0, -2.0), Vector3::z(), f64::NEG_INFINITY, f64::INFINITY);
        assert!(axial.intersect_cylinder(&cylinder));
        assert_relative_eq!(axial.lower(), 2.0);
        assert_relative_eq!(axial.upper(), 6.0);

        // parallel to the axis but outside the radius
        let mut outside = RangeRay3::new(Point3::new(2.0, 0.0, -2.0), Vector3::z());
        assert!(!outside.intersect_cylinder(&cylinder));

        // perpendicular to the axis above the top cap
        let mut above = RangeRay3::new(Point3::new(-5.0, 0.0, 5.0), Vector3::x());
        assert!(!above.intersect_cylinder(&cylinder));
    }
}
