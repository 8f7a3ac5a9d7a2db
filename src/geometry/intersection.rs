// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Intersection tests between boxes, planes, lines and triangles
//!
//! These are plain `f64` computations. Constructed results such as
//! intersection points are best effort; only the coplanarity decision in
//! [`triangles_intersect`] goes through the robust predicates.

use super::bbox::{BoundingBox, Box3};
use super::primitives::{Line3, Plane, Point2, Point3, Segment3, Triangle3, Vector3};
use super::robust_predicates::{orient2d, orient3d};
use std::cmp::Ordering;

/// Below this squared length a direction counts as zero.
const PARALLEL_EPS: f64 = 1e-24;

/// Overlap of two boxes, `None` when they are disjoint.
pub fn intersect_boxes<const D: usize>(a: &BoundingBox<D>, b: &BoundingBox<D>) -> Option<BoundingBox<D>> {
    let overlap = a.intersection(b);
    if overlap.is_empty() {
        None
    } else {
        Some(overlap)
    }
}

/// Whether the plane passes through the (closed) box.
pub fn box_crosses_plane(bbox: &Box3, plane: &Plane) -> bool {
    if bbox.is_empty() {
        return false;
    }
    let center = bbox.center();
    let half = bbox.size() / 2.0;
    let radius = half.x * plane.normal.x.abs() + half.y * plane.normal.y.abs() + half.z * plane.normal.z.abs();
    plane.signed_distance(&center).abs() <= radius
}

/// Separating axis test between a box and a triangle.
///
/// Checks the three box axes, the triangle normal and the nine cross
/// products of box axes with triangle edges.
pub fn box_intersects_triangle(bbox: &Box3, triangle: &Triangle3) -> bool {
    if bbox.is_empty() {
        return false;
    }
    let center = bbox.center();
    let half = bbox.size() / 2.0;
    let v = [triangle.a - center, triangle.b - center, triangle.c - center];
    let edges = [v[1] - v[0], v[2] - v[1], v[0] - v[2]];

    let separated = |axis: &Vector3| -> bool {
        let p0 = v[0].dot(axis);
        let p1 = v[1].dot(axis);
        let p2 = v[2].dot(axis);
        let r = half.x * axis.x.abs() + half.y * axis.y.abs() + half.z * axis.z.abs();
        p0.max(p1).max(p2) < -r || p0.min(p1).min(p2) > r
    };

    for edge in &edges {
        for unit in [Vector3::x(), Vector3::y(), Vector3::z()] {
            let axis = unit.cross(edge);
            if axis.norm_squared() > PARALLEL_EPS && separated(&axis) {
                return false;
            }
        }
    }

    for i in 0..3 {
        let lo = v[0][i].min(v[1][i]).min(v[2][i]);
        let hi = v[0][i].max(v[1][i]).max(v[2][i]);
        if hi < -half[i] || lo > half[i] {
            return false;
        }
    }

    let normal = edges[0].cross(&edges[1]);
    if normal.norm_squared() > PARALLEL_EPS && separated(&normal) {
        return false;
    }

    true
}

/// Line parameter and point where the line meets the plane.
/// `None` when the line is parallel to the plane.
pub fn intersect_line_plane(line: &Line3, plane: &Plane) -> Option<(f64, Point3)> {
    let denom = plane.normal.dot(&line.direction);
    if denom.abs() <= 1e-12 {
        return None;
    }
    let t = -plane.signed_distance(&line.origin) / denom;
    Some((t, line.point_at(t)))
}

/// Point where the segment crosses the plane, endpoints included.
pub fn intersect_segment_plane(segment: &Segment3, plane: &Plane) -> Option<Point3> {
    let da = plane.signed_distance(&segment.a);
    let db = plane.signed_distance(&segment.b);
    if da * db > 0.0 {
        return None;
    }
    if da == db {
        // segment lies in the plane
        return Some(segment.a);
    }
    let t = da / (da - db);
    Some(segment.point_at(t))
}

/// Intersection line of two planes, `None` when they are parallel.
pub fn intersect_planes(p1: &Plane, p2: &Plane) -> Option<Line3> {
    let n1 = p1.normal.into_inner();
    let n2 = p2.normal.into_inner();
    let direction = n1.cross(&n2);
    let len2 = direction.norm_squared();
    if len2 <= PARALLEL_EPS {
        return None;
    }
    let point = (n2.cross(&direction) * p1.offset + direction.cross(&n1) * p2.offset) / len2;
    Some(Line3::new(Point3::from(point), direction))
}

/// Möller–Trumbore intersection of the line `origin + t * direction` with a
/// triangle. Returns `(t, u, v)` with barycentric `u`, `v` of the hit.
pub fn intersect_line_triangle(origin: &Point3, direction: &Vector3, triangle: &Triangle3) -> Option<(f64, f64, f64)> {
    let e1 = triangle.b - triangle.a;
    let e2 = triangle.c - triangle.a;
    let p = direction.cross(&e2);
    let det = e1.dot(&p);
    if det.abs() <= 1e-14 * e1.norm() * e2.norm() * direction.norm() {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - triangle.a;
    let u = s.dot(&p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(&e1);
    let v = direction.dot(&q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(&q) * inv_det;
    Some((t, u, v))
}

/// Point where the segment pierces the triangle.
pub fn intersect_segment_triangle(segment: &Segment3, triangle: &Triangle3) -> Option<Point3> {
    let direction = segment.direction();
    let (t, _, _) = intersect_line_triangle(&segment.a, &direction, triangle)?;
    if (0.0..=1.0).contains(&t) {
        Some(segment.point_at(t))
    } else {
        None
    }
}

/// Whether two triangles share at least one point.
pub fn triangles_intersect(t1: &Triangle3, t2: &Triangle3) -> bool {
    if !t1.bounding_box().intersects(&t2.bounding_box()) {
        return false;
    }

    let coplanar = t2
        .vertices()
        .iter()
        .all(|p| orient3d(&t1.a, &t1.b, &t1.c, p) == Ordering::Equal);
    if coplanar && !t1.is_degenerate() {
        return coplanar_triangles_intersect(t1, t2);
    }

    t1.edges()
        .iter()
        .any(|e| intersect_segment_triangle(e, t2).is_some())
        || t2
            .edges()
            .iter()
            .any(|e| intersect_segment_triangle(e, t1).is_some())
}

fn coplanar_triangles_intersect(t1: &Triangle3, t2: &Triangle3) -> bool {
    // project onto the coordinate plane best aligned with the triangle
    let normal = t1.normal().abs();
    let drop = normal.imax();
    let project = |p: &Point3| match drop {
        0 => Point2::new(p.y, p.z),
        1 => Point2::new(p.z, p.x),
        _ => Point2::new(p.x, p.y),
    };
    let a: Vec<Point2> = t1.vertices().iter().map(project).collect();
    let b: Vec<Point2> = t2.vertices().iter().map(project).collect();

    for i in 0..3 {
        for j in 0..3 {
            if segments_intersect_2d(&a[i], &a[(i + 1) % 3], &b[j], &b[(j + 1) % 3]) {
                return true;
            }
        }
    }
    point_in_triangle_2d(&a[0], &b) || point_in_triangle_2d(&b[0], &a)
}

/// Closed segment intersection in the plane, decided with `orient2d`.
pub fn segments_intersect_2d(p1: &Point2, p2: &Point2, q1: &Point2, q2: &Point2) -> bool {
    let d1 = orient2d(q1, q2, p1);
    let d2 = orient2d(q1, q2, p2);
    let d3 = orient2d(p1, p2, q1);
    let d4 = orient2d(p1, p2, q2);

    if d1 != d2 && d3 != d4 && d1 != Ordering::Equal && d2 != Ordering::Equal
        && d3 != Ordering::Equal && d4 != Ordering::Equal
    {
        return true;
    }

    let on_segment = |a: &Point2, b: &Point2, p: &Point2| {
        p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
    };
    (d1 == Ordering::Equal && on_segment(q1, q2, p1))
        || (d2 == Ordering::Equal && on_segment(q1, q2, p2))
        || (d3 == Ordering::Equal && on_segment(p1, p2, q1))
        || (d4 == Ordering::Equal && on_segment(p1, p2, q2))
}

/// Closed point-in-triangle test in the plane, either orientation.
pub fn point_in_triangle_2d(p: &Point2, triangle: &[Point2]) -> bool {
    let s0 = orient2d(&triangle[0], &triangle[1], p);
    let s1 = orient2d(&triangle[1], &triangle[2], p);
    let s2 = orient2d(&triangle[2], &triangle[0], p);
    let has_neg = [s0, s1, s2].contains(&Ordering::Less);
    let has_pos = [s0, s1, s2].contains(&Ordering::Greater);
    !(has_neg && has_pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Box3 {
        Box3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_box_triangle_sat() {
        let bbox = unit_box();
        let through = Triangle3::new(
            Point3::new(-1.0, 0.5, 0.5),
            Point3::new(2.0, 0.5, 0.5),
            Point3::new(0.5, 0.5, 3.0),
        );
        assert!(box_intersects_triangle(&bbox, &through));

        let beside = Triangle3::new(
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        );
        assert!(!box_intersects_triangle(&bbox, &beside));

        // bounding boxes overlap, but the triangle passes the corner diagonally
        let diagonal = Triangle3::new(
            Point3::new(2.0, 2.5, 0.5),
            Point3::new(2.5, 2.0, 0.5),
            Point3::new(2.25, 2.25, 1.5),
        );
        assert!(!box_intersects_triangle(&Box3::new(Point3::origin(), Point3::new(2.0, 2.0, 2.0)), &diagonal));
    }

    #[test]
    fn test_box_crosses_plane() {
        let bbox = unit_box();
        let inside = Plane::new(&Point3::new(0.5, 0.5, 0.5), Vector3::new(1.0, 1.0, 1.0));
        assert!(box_crosses_plane(&bbox, &inside));
        let outside = Plane::new(&Point3::new(5.0, 0.0, 0.0), Vector3::x());
        assert!(!box_crosses_plane(&bbox, &outside));
    }

    #[test]
    fn test_intersect_planes() {
        let xy = Plane::new(&Point3::new(0.0, 0.0, 1.0), Vector3::z());
        let yz = Plane::new(&Point3::new(2.0, 0.0, 0.0), Vector3::x());
        let line = intersect_planes(&xy, &yz).unwrap();
        assert!((line.origin.x - 2.0).abs() < 1e-12);
        assert!((line.origin.z - 1.0).abs() < 1e-12);
        assert!(line.direction.y.abs() > 0.999);

        let parallel = Plane::new(&Point3::new(0.0, 0.0, 5.0), Vector3::z());
        assert!(intersect_planes(&xy, &parallel).is_none());
    }

    #[test]
    fn test_segment_triangle() {
        let tri = Triangle3::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let hit = Segment3::new(Point3::new(0.2, 0.2, -1.0), Point3::new(0.2, 0.2, 1.0));
        let point = intersect_segment_triangle(&hit, &tri).unwrap();
        assert!((point - Point3::new(0.2, 0.2, 0.0)).norm() < 1e-12);

        let short = Segment3::new(Point3::new(0.2, 0.2, 1.0), Point3::new(0.2, 0.2, 2.0));
        assert!(intersect_segment_triangle(&short, &tri).is_none());

        let line = Line3::new(Point3::new(0.0, 0.0, 3.0), Vector3::z());
        let plane = tri.plane().unwrap();
        let (t, p) = intersect_line_plane(&line, &plane).unwrap();
        assert_eq!(t, -3.0);
        assert_eq!(p, Point3::origin());
    }

    #[test]
    fn test_triangles_intersect() {
        let tri_a = Triangle3::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let disjoint = Triangle3::new(
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        );
        assert!(!triangles_intersect(&tri_a, &disjoint));

        let overlapping = Triangle3::new(
            Point3::new(0.5, 0.0, 0.0),
            Point3::new(1.5, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        );
        assert!(triangles_intersect(&tri_a, &overlapping));

        let piercing = Triangle3::new(
            Point3::new(0.2, 0.2, -1.0),
            Point3::new(0.3, 0.2, 1.0),
            Point3::new(0.2, 0.3, 1.0),
        );
        assert!(triangles_intersect(&tri_a, &piercing));

        let above = Triangle3::new(
            Point3::new(0.2, 0.2, 1.0),
            Point3::new(0.3, 0.2, 1.0),
            Point3::new(0.2, 0.3, 1.0),
        );
        assert!(!triangles_intersect(&tri_a, &above));
    }

    #[test]
    fn test_intersect_boxes() {
        let a = unit_box();
        let b = Box3::new(Point3::new(0.5, 0.5, 0.5), Point3::new(2.0, 2.0, 2.0));
        let overlap = intersect_boxes(&a, &b).unwrap();
        assert_eq!(overlap.min, Point3::new(0.5, 0.5, 0.5));
        assert_eq!(overlap.max, Point3::new(1.0, 1.0, 1.0));
        let c = Box3::new(Point3::new(3.0, 3.0, 3.0), Point3::new(4.0, 4.0, 4.0));
        assert!(intersect_boxes(&a, &c).is_none());
    }
}
