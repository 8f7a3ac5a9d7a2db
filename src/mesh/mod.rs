// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh kernel - indexed element lists, property maps and the polygon mesh

mod circular;
mod indexed_list;
pub mod shapes;
mod surface_mesh;

pub use circular::CircularListView;
pub use indexed_list::{ElementId, IndexedList, Property};
pub use surface_mesh::{CompressedMesh, Edge, EdgeId, Face, FaceId, SurfaceMesh, Vertex, VertexId};
