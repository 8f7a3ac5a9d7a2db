// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Simple closed shapes as surface meshes

use super::surface_mesh::{SurfaceMesh, VertexId};
use crate::geometry::{Box3, Point3};
use std::f64::consts::PI;

/// Axis-aligned box with six outward-facing quads.
pub fn cuboid(bbox: &Box3) -> SurfaceMesh {
    assert!(!bbox.is_empty(), "cannot build a cuboid from an empty box");
    let mut mesh = SurfaceMesh::new();
    // corner k has x from bit 0, y from bit 1, z from bit 2
    let v: Vec<VertexId> = (0..8).map(|k| mesh.add_vertex(bbox.corner(k))).collect();

    let faces = [
        [0, 2, 3, 1], // z-
        [4, 5, 7, 6], // z+
        [0, 1, 5, 4], // y-
        [2, 6, 7, 3], // y+
        [0, 4, 6, 2], // x-
        [1, 3, 7, 5], // x+
    ];
    for face in faces {
        mesh.add_face(&face.map(|i| v[i]));
    }
    mesh
}

/// Latitude/longitude sphere. Polar rings are triangles, the rest quads.
pub fn uv_sphere(center: Point3, radius: f64, segments: usize) -> SurfaceMesh {
    assert!(radius > 0.0, "sphere radius must be positive");
    let slices = segments.max(3);
    let stacks = (segments / 2).max(2);
    let mut mesh = SurfaceMesh::new();

    let south = mesh.add_vertex(center - nalgebra::Vector3::z() * radius);
    let mut rings: Vec<Vec<VertexId>> = Vec::with_capacity(stacks - 1);
    for i in 1..stacks {
        let phi = PI * i as f64 / stacks as f64;
        let z = -radius * phi.cos();
        let r = radius * phi.sin();
        rings.push(
            (0..slices)
                .map(|j| {
                    let theta = 2.0 * PI * j as f64 / slices as f64;
                    mesh.add_vertex(center + nalgebra::Vector3::new(r * theta.cos(), r * theta.sin(), z))
                })
                .collect(),
        );
    }
    let north = mesh.add_vertex(center + nalgebra::Vector3::z() * radius);

    for j in 0..slices {
        let next = (j + 1) % slices;
        mesh.add_face(&[south, rings[0][next], rings[0][j]]);
        for ring in rings.windows(2) {
            mesh.add_face(&[ring[0][j], ring[0][next], ring[1][next], ring[1][j]]);
        }
        let top = &rings[rings.len() - 1];
        mesh.add_face(&[north, top[j], top[next]]);
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vector3;

    #[test]
    fn test_cuboid_normals_point_outward() {
        let bbox = Box3::new(Point3::new(-1.0, -2.0, -3.0), Point3::new(1.0, 2.0, 3.0));
        let mesh = cuboid(&bbox);
        assert_eq!(mesh.n_vertices(), 8);
        assert_eq!(mesh.n_faces(), 6);
        assert_eq!(mesh.n_edges(), 24);
        for face in mesh.face_ids() {
            let points = mesh.face_points(face);
            let centroid = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / 4.0;
            assert!(mesh.face_normal(face).dot(&centroid) > 0.0);
        }
    }

    #[test]
    fn test_uv_sphere() {
        let center = Point3::new(1.0, 2.0, 3.0);
        let mesh = uv_sphere(center, 2.0, 8);
        // 4 stacks: 3 rings of 8 plus the poles
        assert_eq!(mesh.n_vertices(), 26);
        assert_eq!(mesh.n_faces(), 8 * 4);
        for v in mesh.vertex_ids() {
            assert!(((mesh.point(v) - center).norm() - 2.0).abs() < 1e-12);
        }
        for face in mesh.face_ids() {
            let points = mesh.face_points(face);
            let centroid = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / points.len() as f64;
            assert!(mesh.face_normal(face).dot(&(centroid - center.coords)) > 0.0);
        }
    }
}
