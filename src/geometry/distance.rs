// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Distance queries between points, lines, segments, planes and triangles

use super::primitives::{Line3, Plane, Point3, Segment3, Triangle3};

/// Squared cross-product length below which two unit directions are parallel.
const PARALLEL_EPS: f64 = 1e-20;

/// Closest point to `p` on the segment; the endpoint for a degenerate segment.
pub fn closest_point_on_segment(p: &Point3, segment: &Segment3) -> Point3 {
    let d = segment.direction();
    let len2 = d.norm_squared();
    if len2 == 0.0 {
        return segment.a;
    }
    let t = ((p - segment.a).dot(&d) / len2).clamp(0.0, 1.0);
    segment.point_at(t)
}

pub fn point_segment_distance(p: &Point3, segment: &Segment3) -> f64 {
    (p - closest_point_on_segment(p, segment)).norm()
}

pub fn point_line_distance(p: &Point3, line: &Line3) -> f64 {
    (p - line.project(p)).norm()
}

/// Signed distance, positive on the side the normal points to.
pub fn point_plane_distance(p: &Point3, plane: &Plane) -> f64 {
    plane.signed_distance(p)
}

/// Distance between two infinite lines.
///
/// Parallel lines fall back to the distance from one origin to the other line.
pub fn line_line_distance(l1: &Line3, l2: &Line3) -> f64 {
    let cross = l1.direction.cross(&l2.direction);
    let len2 = cross.norm_squared();
    if len2 <= PARALLEL_EPS {
        return point_line_distance(&l2.origin, l1);
    }
    (l2.origin - l1.origin).dot(&cross).abs() / len2.sqrt()
}

/// Closest points `(on s1, on s2)` between two segments.
///
/// Handles degenerate segments and parallel segments (Ericson, Real-Time
/// Collision Detection, 5.1.9).
pub fn closest_points_segment_segment(s1: &Segment3, s2: &Segment3) -> (Point3, Point3) {
    let d1 = s1.direction();
    let d2 = s2.direction();
    let r = s1.a - s2.a;
    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);

    if a == 0.0 && e == 0.0 {
        return (s1.a, s2.a);
    }
    let (s, t) = if a == 0.0 {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e == 0.0 {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            let mut s = if denom > 0.0 {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };
    (s1.point_at(s), s2.point_at(t))
}

pub fn segment_segment_distance(s1: &Segment3, s2: &Segment3) -> f64 {
    let (p, q) = closest_points_segment_segment(s1, s2);
    (p - q).norm()
}

/// Closest point on a triangle by Voronoi region classification.
pub fn closest_point_on_triangle(p: &Point3, triangle: &Triangle3) -> Point3 {
    let (a, b, c) = (triangle.a, triangle.b, triangle.c);
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = va + vb + vc;
    if denom == 0.0 {
        // degenerate triangle: nearest of the three edges
        return triangle
            .edges()
            .iter()
            .map(|e| closest_point_on_segment(p, e))
            .min_by(|x, y| (p - x).norm_squared().total_cmp(&(p - y).norm_squared()))
            .unwrap_or(a);
    }
    let v = vb / denom;
    let w = vc / denom;
    a + ab * v + ac * w
}

pub fn point_triangle_distance(p: &Point3, triangle: &Triangle3) -> f64 {
    (p - closest_point_on_triangle(p, triangle)).norm()
}
