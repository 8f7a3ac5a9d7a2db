// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - OBJ meshes and XYZ point clouds

mod obj;
mod xyz;

pub use obj::{load_obj, read_obj, save_obj, write_obj};
pub use xyz::{load_xyz, read_xyz, save_xyz, write_xyz, PointCloud, PointFormat};
