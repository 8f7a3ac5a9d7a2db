// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! PCA plane fitting and point cloud normal estimation

use super::bbox::Box3;
use super::primitives::{Matrix3, Plane, Point3, Vector3};
use ahash::AHashMap;
use nalgebra::SymmetricEigen;

/// Least-squares plane through the points.
///
/// The normal is the eigenvector of the smallest eigenvalue of the
/// covariance matrix. Returns `None` for fewer than three points or when the
/// points are (numerically) collinear, where the normal is not defined.
pub fn fit_plane(points: &[Point3]) -> Option<Plane> {
    if points.len() < 3 {
        return None;
    }
    let n = points.len() as f64;
    let centroid = Point3::from(points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / n);

    let mut covariance = Matrix3::zeros();
    for p in points {
        let d = p - centroid;
        covariance += d * d.transpose();
    }
    covariance /= n;

    let eigen = SymmetricEigen::new(covariance);
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
    let largest = eigen.eigenvalues[order[2]];
    let middle = eigen.eigenvalues[order[1]];
    if largest <= 0.0 || middle <= 1e-12 * largest {
        return None;
    }

    let normal: Vector3 = eigen.eigenvectors.column(order[0]).into_owned();
    Some(Plane::new(&centroid, normal))
}

/// Unoriented unit normal per point, fitted over its `k` nearest neighbours
/// (the point itself included). Points whose neighbourhood is degenerate get
/// a zero vector.
pub fn estimate_normals(points: &[Point3], k: usize) -> Vec<Vector3> {
    if points.len() < 3 || k < 3 {
        return vec![Vector3::zeros(); points.len()];
    }
    let grid = NeighbourGrid::new(points);
    let mut neighbourhood = Vec::with_capacity(k);
    points
        .iter()
        .map(|p| {
            neighbourhood.clear();
            neighbourhood.extend(grid.k_nearest(points, p, k).into_iter().map(|i| points[i]));
            fit_plane(&neighbourhood)
                .map(|plane| plane.normal.into_inner())
                .unwrap_or_else(Vector3::zeros)
        })
        .collect()
}

/// Uniform hash grid for nearest neighbour queries on a fixed point set.
struct NeighbourGrid {
    origin: Point3,
    cell: f64,
    cells: AHashMap<[i64; 3], Vec<usize>>,
    max_ring: i64,
}

impl NeighbourGrid {
    fn new(points: &[Point3]) -> Self {
        let bbox = Box3::from_points(points.iter().copied());
        let extent = bbox.size().max();
        let per_axis = (points.len() as f64).cbrt().max(1.0);
        let cell = if extent > 0.0 { extent / per_axis } else { 1.0 };

        let mut grid = Self {
            origin: bbox.min,
            cell,
            cells: AHashMap::new(),
            max_ring: (extent / cell).ceil() as i64 + 1,
        };
        for (i, p) in points.iter().enumerate() {
            let key = grid.key(p);
            grid.cells.entry(key).or_default().push(i);
        }
        grid
    }

    fn key(&self, p: &Point3) -> [i64; 3] {
        let d = (p - self.origin) / self.cell;
        [d.x.floor() as i64, d.y.floor() as i64, d.z.floor() as i64]
    }

    fn k_nearest(&self, points: &[Point3], p: &Point3, k: usize) -> Vec<usize> {
        let center = self.key(p);
        let mut found: Vec<(f64, usize)> = Vec::new();
        for ring in 0..=self.max_ring {
            for dx in -ring..=ring {
                for dy in -ring..=ring {
                    for dz in -ring..=ring {
                        if dx.abs().max(dy.abs()).max(dz.abs()) != ring {
                            continue;
                        }
                        let key = [center[0] + dx, center[1] + dy, center[2] + dz];
                        if let Some(bucket) = self.cells.get(&key) {
                            found.extend(bucket.iter().map(|&i| ((points[i] - p).norm_squared(), i)));
                        }
                    }
                }
            }
            if found.len() >= k {
                found.sort_by(|a, b| a.0.total_cmp(&b.0));
                // anything outside the visited rings is at least this far away
                let reach = ring as f64 * self.cell;
                if found[k - 1].0 <= reach * reach {
                    break;
                }
            }
        }
        found.sort_by(|a, b| a.0.total_cmp(&b.0));
        found.truncate(k);
        found.into_iter().map(|(_, i)| i).collect()
    }
}
