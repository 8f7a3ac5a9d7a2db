// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Spatial index integration tests

use approx::assert_relative_eq;
use geokernel::geometry::{Segment3, Sphere};
use geokernel::mesh::shapes::{cuboid, uv_sphere};
use geokernel::spatial::NodeId;
use geokernel::{Box3, Point3, RangeRay3, Snap3, Vector3, VoxelOctree};
use proptest::prelude::*;
use std::collections::HashSet;

fn unit_box() -> Box3 {
    Box3::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
}

fn unit_point() -> impl Strategy<Value = Point3> {
    (0.0..1.0f64, 0.0..1.0f64, 0.0..1.0f64).prop_map(|(x, y, z)| Point3::new(x, y, z))
}

fn direction() -> impl Strategy<Value = Vector3> {
    (-1.0..1.0f64, -1.0..1.0f64, -1.0..1.0f64)
        .prop_map(|(x, y, z)| Vector3::new(x, y, z))
        .prop_filter("non-zero direction", |d| d.norm() > 1e-3)
}

proptest! {
    #[test]
    fn picked_voxels_are_hit_occupied_leaves(
        voxels in prop::collection::vec(unit_point(), 1..60),
        depth in 1u32..5,
        origin in (-1.0..2.0f64, -1.0..2.0f64, -1.0..2.0f64),
        dir in direction(),
    ) {
        let mut octree = VoxelOctree::new(unit_box(), depth);
        for p in &voxels {
            octree.insert_voxel(p);
        }
        let ray = RangeRay3::new(Point3::new(origin.0, origin.1, origin.2), dir);
        let mut hits = Vec::new();
        octree.pick_voxels(&ray, &mut hits);

        let picked: HashSet<NodeId> = hits.iter().copied().collect();
        prop_assert_eq!(picked.len(), hits.len());

        let leaves: HashSet<NodeId> = octree.leaves().collect();
        prop_assert_eq!(leaves.len(), octree.leaf_count());
        for id in &hits {
            prop_assert!(leaves.contains(id));
            prop_assert!(octree.node(*id).occupied);
        }

        // leaves crossed well inside their box are never missed
        let margin = octree.voxel_size().min() * 1e-6;
        for id in &leaves {
            let inner = octree.voxel_box(*id).inflated(-margin);
            let mut probe = ray;
            if probe.intersect_box(&inner) && probe.upper() - probe.lower() > margin {
                prop_assert!(picked.contains(id), "leaf {:?} missed", octree.node(*id));
            }
        }
    }

    #[test]
    fn inserted_points_are_contained(points in prop::collection::vec(unit_point(), 1..40), depth in 0u32..6) {
        let mut octree = VoxelOctree::new(unit_box(), depth);
        for p in &points {
            octree.insert_voxel(p);
        }
        for p in &points {
            prop_assert!(octree.contains_point(p));
        }
        prop_assert!(octree.leaf_count() <= points.len());
    }
}

#[test]
fn test_voxelized_sphere_is_hollow() {
    let sphere = uv_sphere(Point3::origin(), 1.0, 32);
    let mut octree = VoxelOctree::new(unit_box(), 0);
    octree.reset_mesh(&sphere, 4);

    assert!(octree.leaf_count() > 0);
    assert!(!octree.contains_point(&Point3::origin()));
    assert!(octree.contains_point(&Point3::new(0.999, 0.0, 0.0)));

    // a ray through the center crosses the shell twice
    let ray = RangeRay3::new(Point3::new(-2.0, 0.01, 0.02), Vector3::x());
    let mut hits = Vec::new();
    octree.pick_voxels(&ray, &mut hits);
    assert!(hits.len() >= 2);
    let xs: Vec<f64> = hits.iter().map(|&id| octree.voxel_box(id).center().x).collect();
    assert!(xs.iter().any(|&x| x < -0.5));
    assert!(xs.iter().any(|&x| x > 0.5));
    assert!(xs.iter().all(|&x| x.abs() > 0.5));

    // covered points are not new voxels
    let leaves_before = octree.leaf_count();
    for id in octree.leaves().collect::<Vec<_>>() {
        let center = octree.voxel_box(id).center();
        assert!(!octree.insert_voxel(&center));
    }
    assert_eq!(octree.leaf_count(), leaves_before);
}

#[test]
fn test_cube_voxels_cover_faces() {
    let cube = cuboid(&Box3::new(Point3::new(-2.0, -2.0, -2.0), Point3::new(2.0, 2.0, 2.0)));
    let mut octree = VoxelOctree::new(unit_box(), 0);
    octree.reset_mesh(&cube, 3);
    // 8^3 grid, only the outer shell touches the faces
    assert_eq!(octree.leaf_count(), 8 * 8 * 8 - 6 * 6 * 6);
    for id in octree.leaves() {
        let node = octree.node(id);
        let on_shell = [node.x, node.y, node.z].iter().any(|&c| c == 0 || c == 7);
        assert!(on_shell);
    }
}

#[test]
fn test_ray_clipping_chain() {
    let mut ray = RangeRay3::new(Point3::new(-5.0, 0.0, 0.0), Vector3::x());
    assert!(ray.intersect_box(&Box3::new(Point3::new(-3.0, -1.0, -1.0), Point3::new(3.0, 1.0, 1.0))));
    assert_relative_eq!(ray.lower(), 2.0);
    assert_relative_eq!(ray.upper(), 8.0);

    assert!(ray.intersect_sphere(&Sphere {
        center: Point3::new(1.0, 0.0, 0.0),
        radius: 1.0,
    }));
    assert_relative_eq!(ray.lower(), 5.0);
    assert_relative_eq!(ray.upper(), 7.0);
    assert_relative_eq!(ray.lower_point().x, 0.0);

    assert!(!ray.intersect_box(&Box3::new(Point3::new(5.0, -1.0, -1.0), Point3::new(6.0, 1.0, 1.0))));
    assert!(ray.is_empty());
}

#[test]
fn test_snap_segment_queries() {
    let bbox = Box3::new(Point3::origin(), Point3::new(10.0, 10.0, 10.0));
    let mut snap = Snap3::new(bbox, 16, 0.5);
    let on_line = [8.0, 1.0, 5.0, 3.0];
    for x in on_line {
        snap.insert_snap_vertex(&Point3::new(x, 2.0, 2.2));
    }
    snap.insert_snap_vertex(&Point3::new(4.0, 6.0, 2.0));

    // merged into the first point within reach
    assert_eq!(snap.insert_snap_vertex(&Point3::new(8.2, 2.1, 2.0)), 0);
    assert!(snap.contain_snap_vertex(&Point3::new(5.3, 2.0, 2.0)));
    assert!(!snap.contain_snap_vertex(&Point3::new(4.0, 4.0, 4.0)));

    let segment = Segment3::new(Point3::new(0.0, 2.0, 2.0), Point3::new(10.0, 2.0, 2.0));
    let along: Vec<f64> = snap
        .find_snap_segment(&segment)
        .into_iter()
        .map(|i| snap.snap_points()[i].x)
        .collect();
    assert_eq!(along, vec![1.0, 3.0, 5.0, 8.0]);

    let reversed: Vec<usize> = snap.find_snap_segment(&segment.reversed());
    assert_eq!(reversed.len(), 4);
    assert_eq!(snap.snap_points()[reversed[0]].x, 8.0);
}
