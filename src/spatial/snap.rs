// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Grid-based vertex snapping
//!
//! Points are bucketed in a uniform grid over a box; points outside the box
//! fall into the nearest border cell. With a positive threshold a new point
//! is merged into the nearest stored point within that distance, so the
//! stored points stay pairwise further apart than the threshold.

use crate::geometry::distance::point_segment_distance;
use crate::geometry::{point_dot_compare_3d, Box3, Point3, Segment3, Vector3};
use ahash::AHashMap;

#[derive(Debug, Clone)]
pub struct Snap3 {
    bbox: Box3,
    resolution: usize,
    cell: Vector3,
    threshold: f64,
    buckets: AHashMap<[usize; 3], Vec<usize>>,
    points: Vec<Point3>,
}

impl Snap3 {
    /// Grid of `resolution` cells per axis over `bbox`.
    pub fn new(bbox: Box3, resolution: usize, threshold: f64) -> Self {
        assert!(!bbox.is_empty(), "snap box must not be empty");
        assert!(resolution > 0, "snap resolution must be positive");
        assert!(threshold >= 0.0, "snap threshold must be non-negative");
        Self {
            cell: bbox.size() / resolution as f64,
            bbox,
            resolution,
            threshold,
            buckets: AHashMap::new(),
            points: Vec::new(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn snap_points(&self) -> &[Point3] {
        &self.points
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.points.clear();
    }

    /// Index of the stored point `p` snaps to, inserting `p` if nothing is
    /// close enough.
    pub fn insert_snap_vertex(&mut self, p: &Point3) -> usize {
        if let Some(found) = self.nearest(p) {
            return found;
        }
        let index = self.points.len();
        self.points.push(*p);
        let cell = self.cell_of(p);
        self.buckets.entry(cell).or_default().push(index);
        index
    }

    /// Every stored point within the threshold of `p`, nearest first.
    pub fn find_snap_vertices(&self, p: &Point3) -> Vec<usize> {
        let mut found: Vec<(f64, usize)> = Vec::new();
        self.for_each_near(p, |index, distance| found.push((distance, index)));
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        found.into_iter().map(|(_, i)| i).collect()
    }

    pub fn contain_snap_vertex(&self, p: &Point3) -> bool {
        self.nearest(p).is_some()
    }

    /// Stored points within the threshold of the segment, ordered from
    /// `segment.a` towards `segment.b`.
    pub fn find_snap_segment(&self, segment: &Segment3) -> Vec<usize> {
        let reach = segment.bounding_box().inflated(self.threshold);
        let lo = self.cell_of(&reach.min);
        let hi = self.cell_of(&reach.max);

        let mut found = Vec::new();
        for x in lo[0]..=hi[0] {
            for y in lo[1]..=hi[1] {
                for z in lo[2]..=hi[2] {
                    let Some(bucket) = self.buckets.get(&[x, y, z]) else {
                        continue;
                    };
                    found.extend(
                        bucket
                            .iter()
                            .copied()
                            .filter(|&i| point_segment_distance(&self.points[i], segment) <= self.threshold),
                    );
                }
            }
        }
        found.sort_by(|&i, &j| {
            point_dot_compare_3d(&segment.a, &segment.b, &self.points[i], &self.points[j]).then(i.cmp(&j))
        });
        found
    }

    fn nearest(&self, p: &Point3) -> Option<usize> {
        let mut best: Option<(f64, usize)> = None;
        self.for_each_near(p, |index, distance| {
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, index));
            }
        });
        best.map(|(_, index)| index)
    }

    /// Calls `f(index, distance)` for every stored point within the threshold.
    fn for_each_near(&self, p: &Point3, mut f: impl FnMut(usize, f64)) {
        let center = self.cell_of(p);
        if self.threshold == 0.0 {
            if let Some(bucket) = self.buckets.get(&center) {
                for &i in bucket.iter().filter(|&&i| self.points[i] == *p) {
                    f(i, 0.0);
                }
            }
            return;
        }

        let mut lo = [0usize; 3];
        let mut hi = [0usize; 3];
        for axis in 0..3 {
            let reach = if self.cell[axis] > 0.0 {
                (self.threshold / self.cell[axis]).ceil().min(self.resolution as f64) as usize
            } else {
                0
            };
            lo[axis] = center[axis].saturating_sub(reach);
            hi[axis] = (center[axis] + reach).min(self.resolution - 1);
        }
        for x in lo[0]..=hi[0] {
            for y in lo[1]..=hi[1] {
                for z in lo[2]..=hi[2] {
                    let Some(bucket) = self.buckets.get(&[x, y, z]) else {
                        continue;
                    };
                    for &i in bucket {
                        let distance = (self.points[i] - p).norm();
                        if distance <= self.threshold {
                            f(i, distance);
                        }
                    }
                }
            }
        }
    }

    fn cell_of(&self, p: &Point3) -> [usize; 3] {
        let mut cell = [0usize; 3];
        for axis in 0..3 {
            let t = if self.cell[axis] > 0.0 {
                ((p[axis] - self.bbox.min[axis]) / self.cell[axis]).floor()
            } else {
                0.0
            };
            cell[axis] = (t.max(0.0) as usize).min(self.resolution - 1);
        }
        cell
    }
}
