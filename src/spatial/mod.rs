// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Spatial structures - clipped rays, voxel octree and vertex snapping

mod range_ray;
mod snap;
mod voxel_octree;

pub use range_ray::RangeRay3;
pub use snap::Snap3;
pub use voxel_octree::{NodeId, VoxelNode, VoxelOctree, MAX_DEPTH};
