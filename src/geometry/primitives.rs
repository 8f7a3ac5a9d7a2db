// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric value types
//!
//! Points, vectors, quaternions and matrices are the `nalgebra` types; the
//! composite shapes below are small `Copy` structs whose constructors keep
//! their invariants (unit directions, non-negative radii).

use super::bbox::{BoundingBox, Box3};
use nalgebra::{SVector, Unit};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub type Point2 = nalgebra::Point2<f64>;
pub type Point3 = nalgebra::Point3<f64>;
pub type Vector2 = nalgebra::Vector2<f64>;
pub type Vector3 = nalgebra::Vector3<f64>;
pub type Vector4 = nalgebra::Vector4<f64>;
pub type Quaternion = nalgebra::UnitQuaternion<f64>;
pub type Matrix3 = nalgebra::Matrix3<f64>;
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Lexicographic order on points, the order used for sorting and dedup.
pub fn lex_cmp<const D: usize>(a: &nalgebra::Point<f64, D>, b: &nalgebra::Point<f64, D>) -> Ordering {
    for i in 0..D {
        match a[i].partial_cmp(&b[i]) {
            Some(Ordering::Equal) | None => continue,
            Some(order) => return order,
        }
    }
    Ordering::Equal
}

/// Line segment between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment<const D: usize> {
    pub a: nalgebra::Point<f64, D>,
    pub b: nalgebra::Point<f64, D>,
}

pub type Segment2 = Segment<2>;
pub type Segment3 = Segment<3>;

impl<const D: usize> Segment<D> {
    pub fn new(a: nalgebra::Point<f64, D>, b: nalgebra::Point<f64, D>) -> Self {
        Self { a, b }
    }

    pub fn direction(&self) -> SVector<f64, D> {
        self.b - self.a
    }

    pub fn length(&self) -> f64 {
        self.direction().norm()
    }

    pub fn length_squared(&self) -> f64 {
        self.direction().norm_squared()
    }

    /// A segment whose endpoints coincide has no direction.
    pub fn is_degenerate(&self) -> bool {
        self.a == self.b
    }

    /// Point at parameter `t`, with `t = 0` at `a` and `t = 1` at `b`.
    pub fn point_at(&self, t: f64) -> nalgebra::Point<f64, D> {
        self.a + self.direction() * t
    }

    pub fn midpoint(&self) -> nalgebra::Point<f64, D> {
        nalgebra::center(&self.a, &self.b)
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.b, self.a)
    }

    pub fn bounding_box(&self) -> BoundingBox<D> {
        BoundingBox::from_points([self.a, self.b])
    }
}

/// Infinite line through `origin` along a unit `direction`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line3 {
    pub origin: Point3,
    pub direction: Unit<Vector3>,
}

impl Line3 {
    pub fn new(origin: Point3, direction: Vector3) -> Self {
        assert!(
            direction.norm_squared() > 0.0,
            "line direction must be non-zero"
        );
        Self {
            origin,
            direction: Unit::new_normalize(direction),
        }
    }

    pub fn through(a: Point3, b: Point3) -> Self {
        Self::new(a, b - a)
    }

    pub fn point_at(&self, t: f64) -> Point3 {
        self.origin + self.direction.as_ref() * t
    }

    /// Parameter of the orthogonal projection of `p` onto the line.
    pub fn project_parameter(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(&self.direction)
    }

    pub fn project(&self, p: &Point3) -> Point3 {
        self.point_at(self.project_parameter(p))
    }
}

/// Plane `normal · x = offset` with a unit normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Unit<Vector3>,
    pub offset: f64,
}

impl Plane {
    /// Plane through `point` with the given (not necessarily unit) normal.
    pub fn new(point: &Point3, normal: Vector3) -> Self {
        assert!(normal.norm_squared() > 0.0, "plane normal must be non-zero");
        let normal = Unit::new_normalize(normal);
        Self {
            offset: normal.dot(&point.coords),
            normal,
        }
    }

    pub fn from_normal_offset(normal: Vector3, offset: f64) -> Self {
        let length = normal.norm();
        assert!(length > 0.0, "plane normal must be non-zero");
        Self {
            normal: Unit::new_unchecked(normal / length),
            offset: offset / length,
        }
    }

    /// Plane through three points, oriented by the right-hand rule.
    /// Returns `None` for collinear points.
    pub fn from_points(a: &Point3, b: &Point3, c: &Point3) -> Option<Self> {
        let normal = (b - a).cross(&(c - a));
        if normal.norm_squared() == 0.0 {
            return None;
        }
        Some(Self::new(a, normal))
    }

    pub fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.offset
    }

    pub fn project(&self, p: &Point3) -> Point3 {
        p - self.normal.as_ref() * self.signed_distance(p)
    }

    /// Some point lying on the plane.
    pub fn origin(&self) -> Point3 {
        Point3::from(self.normal.as_ref() * self.offset)
    }

    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }
}

/// Triangle with vertices in counter-clockwise order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle3 {
    pub a: Point3,
    pub b: Point3,
    pub c: Point3,
}

impl Triangle3 {
    pub fn new(a: Point3, b: Point3, c: Point3) -> Self {
        Self { a, b, c }
    }

    pub fn vertices(&self) -> [Point3; 3] {
        [self.a, self.b, self.c]
    }

    /// Unnormalized normal, twice the area in length.
    pub fn normal(&self) -> Vector3 {
        (self.b - self.a).cross(&(self.c - self.a))
    }

    pub fn unit_normal(&self) -> Option<Unit<Vector3>> {
        Unit::try_new(self.normal(), 0.0)
    }

    pub fn area(&self) -> f64 {
        self.normal().norm() / 2.0
    }

    pub fn is_degenerate(&self) -> bool {
        self.normal().norm_squared() == 0.0
    }

    pub fn centroid(&self) -> Point3 {
        Point3::from((self.a.coords + self.b.coords + self.c.coords) / 3.0)
    }

    pub fn plane(&self) -> Option<Plane> {
        Plane::from_points(&self.a, &self.b, &self.c)
    }

    pub fn bounding_box(&self) -> Box3 {
        BoundingBox::from_points([self.a, self.b, self.c])
    }

    pub fn edges(&self) -> [Segment3; 3] {
        [
            Segment3::new(self.a, self.b),
            Segment3::new(self.b, self.c),
            Segment3::new(self.c, self.a),
        ]
    }
}

/// Solid sphere
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Point3,
    pub radius: f64,
}

impl Sphere {
    pub fn new(center: Point3, radius: f64) -> Self {
        assert!(radius >= 0.0, "sphere radius must be non-negative");
        Self { center, radius }
    }

    pub fn contains(&self, p: &Point3) -> bool {
        (p - self.center).norm_squared() <= self.radius * self.radius
    }

    pub fn bounding_box(&self) -> Box3 {
        let r = Vector3::repeat(self.radius);
        BoundingBox::new(self.center - r, self.center + r)
    }
}

/// Finite solid cylinder between two cap centers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cylinder {
    pub base: Point3,
    pub top: Point3,
    pub radius: f64,
}

impl Cylinder {
    pub fn new(base: Point3, top: Point3, radius: f64) -> Self {
        assert!(radius >= 0.0, "cylinder radius must be non-negative");
        assert!(base != top, "cylinder axis must have non-zero length");
        Self { base, top, radius }
    }

    pub fn axis(&self) -> Vector3 {
        self.top - self.base
    }

    pub fn height(&self) -> f64 {
        self.axis().norm()
    }

    pub fn contains(&self, p: &Point3) -> bool {
        let axis = self.axis();
        let t = (p - self.base).dot(&axis) / axis.norm_squared();
        if !(0.0..=1.0).contains(&t) {
            return false;
        }
        let radial = (p - self.base) - axis * t;
        radial.norm_squared() <= self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_cmp() {
        let a = Point3::new(0.0, 1.0, 2.0);
        let b = Point3::new(0.0, 1.0, 3.0);
        let c = Point3::new(-1.0, 5.0, 5.0);
        assert_eq!(lex_cmp(&a, &b), Ordering::Less);
        assert_eq!(lex_cmp(&b, &a), Ordering::Greater);
        assert_eq!(lex_cmp(&c, &a), Ordering::Less);
        assert_eq!(lex_cmp(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_plane_from_points() {
        let plane = Plane::from_points(
            &Point3::new(0.0, 0.0, 1.0),
            &Point3::new(1.0, 0.0, 1.0),
            &Point3::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        assert_eq!(plane.normal.into_inner(), Vector3::z());
        assert_eq!(plane.offset, 1.0);
        assert_eq!(plane.signed_distance(&Point3::new(3.0, 4.0, 3.0)), 2.0);
        assert!(Plane::from_points(&Point3::origin(), &Point3::origin(), &Point3::origin()).is_none());
    }

    #[test]
    fn test_cylinder_contains() {
        let cylinder = Cylinder::new(Point3::origin(), Point3::new(0.0, 0.0, 2.0), 1.0);
        assert!(cylinder.contains(&Point3::new(0.5, 0.0, 1.0)));
        assert!(!cylinder.contains(&Point3::new(0.5, 0.0, 2.5)));
        assert!(!cylinder.contains(&Point3::new(1.5, 0.0, 1.0)));
    }

    #[test]
    fn test_triangle_area() {
        let tri = Triangle3::new(
            Point3::origin(),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        );
        assert_eq!(tri.area(), 2.0);
        assert!(!tri.is_degenerate());
    }
}
