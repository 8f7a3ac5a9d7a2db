// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geokernel
//!
//! Robust computational-geometry core: exact and interval numerics, robust
//! predicates, pool-backed mesh containers, voxel octrees, vertex snapping
//! and an order-statistic tree, with OBJ and XYZ loaders.

pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod mesh;
pub mod numeric;
pub mod pool;
pub mod rank_tree;
pub mod spatial;

pub use config::KernelConfig;
pub use error::{LoadError, LoadResult};
pub use geometry::{BoundingBox, Box2, Box3, Point2, Point3, Vector2, Vector3};
pub use io::{load_obj, load_xyz, save_obj, save_xyz, PointCloud, PointFormat};
pub use mesh::{CompressedMesh, EdgeId, FaceId, IndexedList, SurfaceMesh, VertexId};
pub use numeric::{ExactFloat, IntervalFloat};
pub use pool::Pool;
pub use rank_tree::RankTree;
pub use spatial::{RangeRay3, Snap3, VoxelOctree};
