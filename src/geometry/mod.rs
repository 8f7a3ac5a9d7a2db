// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - value types, robust predicates and geometric queries

mod bbox;
pub mod distance;
pub mod intersection;
pub mod pca;
mod primitives;
pub mod robust_predicates;

pub use bbox::{BoundingBox, Box2, Box3};
pub use primitives::{
    lex_cmp, Cylinder, Line3, Matrix3, Matrix4, Plane, Point2, Point3, Quaternion, Segment,
    Segment2, Segment3, Sphere, Triangle3, Vector2, Vector3, Vector4,
};
pub use robust_predicates::{orient2d, orient3d, point_dot_compare_3d, PlaneClassification, Precision};
