// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Sparse occupancy octree over an axis-aligned box
//!
//! A node at depth `d` covers the voxel `(x, y, z)` of the `2^d` grid over
//! the octree box. Only paths to occupied leaves exist; every leaf sits at
//! the maximum depth.

use super::range_ray::RangeRay3;
use crate::geometry::intersection::box_intersects_triangle;
use crate::geometry::{Box3, Point3, Vector3};
use crate::mesh::SurfaceMesh;
use ahash::AHashSet;
use std::collections::VecDeque;
use tracing::debug;

/// Deepest level whose packed `(i, j, k)` key fits a 64-bit index.
pub const MAX_DEPTH: u32 = 21;

/// Handle to an octree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct VoxelNode {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub depth: u32,
    pub occupied: bool,
    children: [Option<NodeId>; 8],
}

impl VoxelNode {
    fn new(x: u32, y: u32, z: u32, depth: u32) -> Self {
        Self {
            x,
            y,
            z,
            depth,
            occupied: false,
            children: [None; 8],
        }
    }

    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().flatten().copied()
    }
}

#[derive(Debug, Clone)]
pub struct VoxelOctree {
    bbox: Box3,
    depth: u32,
    nodes: Vec<VoxelNode>,
    leaf_count: usize,
}

impl VoxelOctree {
    pub fn new(bbox: Box3, depth: u32) -> Self {
        let mut octree = Self {
            bbox,
            depth: 0,
            nodes: Vec::new(),
            leaf_count: 0,
        };
        octree.reset_box(bbox, depth);
        octree
    }

    /// Drops all voxels and sets the volume and the leaf depth.
    pub fn reset_box(&mut self, bbox: Box3, depth: u32) {
        assert!(depth <= MAX_DEPTH, "octree depth {} exceeds {}", depth, MAX_DEPTH);
        assert!(!bbox.is_empty(), "octree box must not be empty");
        self.bbox = bbox;
        self.depth = depth;
        self.nodes.clear();
        self.nodes.push(VoxelNode::new(0, 0, 0, 0));
        self.leaf_count = 0;
    }

    /// Voxelizes the triangles of a mesh into the cube around its bounds.
    pub fn reset_mesh(&mut self, mesh: &SurfaceMesh, depth: u32) {
        self.reset_box(cube_around(&mesh.bounding_box()), depth);

        let triangles = mesh.triangles();
        let mut occupied: AHashSet<u64> = AHashSet::new();
        let mut tests = 0usize;
        for triangle in &triangles {
            let bounds = triangle.bounding_box();
            let lo = self.voxel_index(&bounds.min);
            let hi = self.voxel_index(&bounds.max);
            for i in lo[0]..=hi[0] {
                for j in lo[1]..=hi[1] {
                    for k in lo[2]..=hi[2] {
                        let key = pack_key(i, j, k);
                        if occupied.contains(&key) {
                            continue;
                        }
                        tests += 1;
                        if box_intersects_triangle(&self.index_box(i, j, k, self.depth), triangle) {
                            occupied.insert(key);
                            self.insert_index(i, j, k);
                        }
                    }
                }
            }
        }
        debug!(
            triangles = triangles.len(),
            tests,
            leaves = self.leaf_count,
            nodes = self.nodes.len(),
            depth,
            "voxelized mesh"
        );
    }

    /// Marks the voxel holding `point` occupied; points outside the box go
    /// to the nearest border voxel. Returns whether the voxel was new.
    pub fn insert_voxel(&mut self, point: &Point3) -> bool {
        let [i, j, k] = self.voxel_index(point);
        self.insert_index(i, j, k)
    }

    /// Whether `point` lies inside the box in an occupied voxel.
    pub fn contains_point(&self, point: &Point3) -> bool {
        if !self.bbox.contains_point(point) {
            return false;
        }
        let [i, j, k] = self.voxel_index(point);
        let mut node = NodeId::ROOT;
        for level in 0..self.depth {
            match self.nodes[node.index()].children[self.child_slot(i, j, k, level)] {
                Some(child) => node = child,
                None => return false,
            }
        }
        self.nodes[node.index()].occupied
    }

    /// Occupied leaves whose voxel the ray crosses, in breadth-first order.
    pub fn pick_voxels(&self, ray: &RangeRay3, out: &mut Vec<NodeId>) {
        out.clear();
        let mut clipped = *ray;
        if !clipped.intersect_box(&self.bbox) {
            return;
        }
        let mut queue = VecDeque::from([NodeId::ROOT]);
        while let Some(id) = queue.pop_front() {
            let node = &self.nodes[id.index()];
            if node.depth == self.depth {
                if node.occupied {
                    out.push(id);
                }
                continue;
            }
            for child in node.children() {
                let mut probe = clipped;
                if probe.intersect_box(&self.voxel_box(child)) {
                    queue.push_back(child);
                }
            }
        }
    }

    pub fn voxel_box(&self, id: NodeId) -> Box3 {
        let node = &self.nodes[id.index()];
        self.index_box(node.x, node.y, node.z, node.depth)
    }

    pub fn node(&self, id: NodeId) -> &VoxelNode {
        &self.nodes[id.index()]
    }

    pub fn bounding_box(&self) -> &Box3 {
        &self.bbox
    }

    pub fn max_depth(&self) -> u32 {
        self.depth
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        let depth = self.depth;
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, n)| n.depth == depth && n.occupied)
            .map(|(i, _)| NodeId(i as u32))
    }

    /// Edge lengths of a leaf voxel.
    pub fn voxel_size(&self) -> Vector3 {
        self.bbox.size() / (1u64 << self.depth) as f64
    }

    fn voxel_index(&self, point: &Point3) -> [u32; 3] {
        let cells = 1u64 << self.depth;
        let size = self.voxel_size();
        let mut index = [0u32; 3];
        for axis in 0..3 {
            let t = if size[axis] > 0.0 {
                ((point[axis] - self.bbox.min[axis]) / size[axis]).floor()
            } else {
                0.0
            };
            // NaN and negative offsets land on 0
            index[axis] = (t.max(0.0) as u64).min(cells - 1) as u32;
        }
        index
    }

    fn index_box(&self, x: u32, y: u32, z: u32, depth: u32) -> Box3 {
        let cells = (1u64 << depth) as f64;
        let size = self.bbox.size();
        let at = |i: u32, axis: usize| self.bbox.min[axis] + size[axis] * (i as f64 / cells);
        Box3::new(
            Point3::new(at(x, 0), at(y, 1), at(z, 2)),
            Point3::new(at(x + 1, 0), at(y + 1, 1), at(z + 1, 2)),
        )
    }

    fn child_slot(&self, i: u32, j: u32, k: u32, level: u32) -> usize {
        let shift = self.depth - 1 - level;
        (((i >> shift) & 1) | (((j >> shift) & 1) << 1) | (((k >> shift) & 1) << 2)) as usize
    }

    fn insert_index(&mut self, i: u32, j: u32, k: u32) -> bool {
        let mut node = NodeId::ROOT;
        for level in 0..self.depth {
            let slot = self.child_slot(i, j, k, level);
            let existing = self.nodes[node.index()].children[slot];
            node = match existing {
                Some(child) => child,
                None => {
                    let shift = self.depth - 1 - level;
                    let child = NodeId(self.nodes.len() as u32);
                    self.nodes
                        .push(VoxelNode::new(i >> shift, j >> shift, k >> shift, level + 1));
                    self.nodes[node.index()].children[slot] = Some(child);
                    child
                }
            };
        }
        let leaf = &mut self.nodes[node.index()];
        if leaf.occupied {
            return false;
        }
        leaf.occupied = true;
        self.leaf_count += 1;
        true
    }
}

fn pack_key(i: u32, j: u32, k: u32) -> u64 {
    (i as u64) | ((j as u64) << MAX_DEPTH) | ((k as u64) << (2 * MAX_DEPTH))
}

/// Smallest cube sharing the center of `bbox` that contains it.
fn cube_around(bbox: &Box3) -> Box3 {
    if bbox.is_empty() {
        return Box3::new(Point3::new(-0.5, -0.5, -0.5), Point3::new(0.5, 0.5, 0.5));
    }
    let center = bbox.center();
    let extent = bbox.size().max();
    let half = if extent > 0.0 { extent / 2.0 } else { 0.5 };
    Box3::new(center - Vector3::repeat(half), center + Vector3::repeat(half))
}
