// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! General polygon mesh
//!
//! Every face owns its boundary edges. Two faces sharing a boundary get two
//! separate edges, so the structure holds non-manifold input and polygon
//! soup. Adjacency across faces goes through the vertices' outgoing edge
//! lists; there are no twin links.

use super::circular::CircularListView;
use super::indexed_list::{ElementId, IndexedList, Property};
use crate::geometry::{Box3, Point3, Triangle3, Vector3};
use crate::pool::DEFAULT_FIRST_CHUNK_SIZE;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

macro_rules! element_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub const INVALID: Self = Self(u32::MAX);

            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl ElementId for $name {
            fn from_index(index: usize) -> Self {
                assert!(index < u32::MAX as usize, "element index {} out of range", index);
                Self(index as u32)
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

element_id!(
    /// Handle to a mesh vertex
    VertexId
);
element_id!(
    /// Handle to a face boundary edge
    EdgeId
);
element_id!(
    /// Handle to a mesh face
    FaceId
);

#[derive(Debug, Clone)]
pub struct Vertex {
    pub point: Point3,
    /// Edges leaving this vertex
    pub edges: Vec<EdgeId>,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            point: Point3::origin(),
            edges: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Edge {
    pub source: VertexId,
    pub target: VertexId,
    pub face: FaceId,
    /// Next edge around the face
    pub next: EdgeId,
    /// Previous edge around the face
    pub prev: EdgeId,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Face {
    /// Any edge of the boundary cycle
    pub edge: EdgeId,
}

/// Indexed mesh with shared vertices, the exchange format for exporters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompressedMesh {
    pub vertices: Vec<Point3>,
    pub faces: Vec<Vec<usize>>,
}

impl CompressedMesh {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.faces.is_empty()
    }
}

/// Polygon mesh over three pool-backed element lists
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    vertices: IndexedList<Vertex, VertexId>,
    edges: IndexedList<Edge, EdgeId>,
    faces: IndexedList<Face, FaceId>,
}

impl SurfaceMesh {
    pub fn new() -> Self {
        Self::with_first_chunk_size(DEFAULT_FIRST_CHUNK_SIZE)
    }

    pub fn with_first_chunk_size(first_chunk_size: usize) -> Self {
        Self {
            vertices: IndexedList::with_first_chunk_size(first_chunk_size),
            edges: IndexedList::with_first_chunk_size(first_chunk_size),
            faces: IndexedList::with_first_chunk_size(first_chunk_size),
        }
    }

    /// Adds an isolated vertex.
    pub fn add_vertex(&mut self, point: Point3) -> VertexId {
        let id = self.vertices.allocate();
        let vertex = &mut self.vertices[id];
        vertex.point = point;
        vertex.edges.clear();
        id
    }

    /// Adds a face over the ordered vertex loop.
    ///
    /// Creates one edge per consecutive vertex pair, links them into a
    /// single cycle and registers each edge at its source vertex.
    ///
    /// # Panics
    /// If fewer than three vertices are given or any of them is not live.
    pub fn add_face(&mut self, vertices: &[VertexId]) -> FaceId {
        assert!(vertices.len() >= 3, "a face needs at least 3 vertices, got {}", vertices.len());
        for &v in vertices {
            assert!(self.vertices.is_available(v), "{:?} is not a live vertex", v);
        }

        let face = self.faces.allocate();
        let edges: Vec<EdgeId> = vertices.iter().map(|_| self.edges.allocate()).collect();
        let n = vertices.len();
        for i in 0..n {
            let edge = &mut self.edges[edges[i]];
            edge.source = vertices[i];
            edge.target = vertices[(i + 1) % n];
            edge.face = face;
            edge.next = edges[(i + 1) % n];
            edge.prev = edges[(i + n - 1) % n];
            self.vertices[vertices[i]].edges.push(edges[i]);
        }
        self.faces[face].edge = edges[0];
        face
    }

    /// Removes a face and its edges. Vertices stay, possibly isolated.
    pub fn remove_face(&mut self, face: FaceId) {
        assert!(self.faces.is_available(face), "{:?} is not a live face", face);
        let edges: Vec<EdgeId> = self.face_edges(face).collect();
        for edge in edges {
            let source = self.edges[edge].source;
            self.vertices[source].edges.retain(|&e| e != edge);
            self.edges.deallocate(edge);
        }
        self.faces.deallocate(face);
    }

    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id]
    }

    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id]
    }

    pub fn point(&self, id: VertexId) -> &Point3 {
        &self.vertices[id].point
    }

    pub fn set_point(&mut self, id: VertexId, point: Point3) {
        self.vertices[id].point = point;
    }

    pub fn is_vertex_available(&self, id: VertexId) -> bool {
        self.vertices.is_available(id)
    }

    pub fn is_face_available(&self, id: FaceId) -> bool {
        self.faces.is_available(id)
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.ids()
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.ids()
    }

    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces.ids()
    }

    /// Length of per-vertex arrays; every vertex index is below it.
    pub fn vertex_capacity(&self) -> usize {
        self.vertices.capacity()
    }

    pub fn face_capacity(&self) -> usize {
        self.faces.capacity()
    }

    /// Boundary edges of a face in cycle order.
    pub fn face_edges(&self, face: FaceId) -> CircularListView<EdgeId, impl Fn(EdgeId) -> EdgeId + '_> {
        CircularListView::new(self.faces[face].edge, move |e| self.edges[e].next)
    }

    pub fn face_vertices(&self, face: FaceId) -> Vec<VertexId> {
        self.face_edges(face).map(|e| self.edges[e].source).collect()
    }

    pub fn face_points(&self, face: FaceId) -> Vec<Point3> {
        self.face_edges(face)
            .map(|e| self.vertices[self.edges[e].source].point)
            .collect()
    }

    pub fn outgoing_edges(&self, vertex: VertexId) -> &[EdgeId] {
        &self.vertices[vertex].edges
    }

    fn edge_vector(&self, edge: &Edge) -> Vector3 {
        self.vertices[edge.target].point - self.vertices[edge.source].point
    }

    /// Unit normal from the summed cross products of consecutive edge
    /// directions; zero for a degenerate face.
    pub fn face_normal(&self, face: FaceId) -> Vector3 {
        let sum = self.face_edges(face).fold(Vector3::zeros(), |acc, e| {
            let edge = &self.edges[e];
            let next = &self.edges[edge.next];
            acc + self.edge_vector(edge).cross(&self.edge_vector(next))
        });
        sum.try_normalize(0.0).unwrap_or_else(Vector3::zeros)
    }

    /// Per-vertex normals indexed by [`ElementId::index`], each the
    /// normalized plain sum of the unit normals of the incident faces.
    pub fn vertex_normals(&self) -> Vec<Vector3> {
        let mut normals = vec![Vector3::zeros(); self.vertices.capacity()];
        for face in self.faces.ids() {
            let normal = self.face_normal(face);
            for e in self.face_edges(face) {
                normals[self.edges[e].source.index()] += normal;
            }
        }
        for n in normals.iter_mut() {
            *n = n.try_normalize(0.0).unwrap_or_else(Vector3::zeros);
        }
        normals
    }

    /// Fan triangulation of every face as vertex triples.
    pub fn triangle_indices(&self) -> Vec<[VertexId; 3]> {
        let mut out = Vec::with_capacity(self.edges.len());
        for face in self.faces.ids() {
            let loop_ = self.face_vertices(face);
            for i in 1..loop_.len() - 1 {
                out.push([loop_[0], loop_[i], loop_[i + 1]]);
            }
        }
        out
    }

    /// Fan triangulation of every face.
    pub fn triangles(&self) -> Vec<Triangle3> {
        self.triangle_indices()
            .into_iter()
            .map(|[a, b, c]| Triangle3::new(*self.point(a), *self.point(b), *self.point(c)))
            .collect()
    }

    pub fn bounding_box(&self) -> Box3 {
        self.vertices.iter().map(|(_, v)| v.point).collect()
    }

    /// Shared-vertex form. Vertices at the same position collapse into one.
    pub fn to_compress_mesh(&self) -> CompressedMesh {
        let mut compressed = CompressedMesh::default();
        let mut by_position: AHashMap<[u64; 3], usize> = AHashMap::new();
        let mut remap = vec![usize::MAX; self.vertices.capacity()];

        for (id, vertex) in self.vertices.iter() {
            let next = compressed.vertices.len();
            let index = *by_position.entry(position_key(&vertex.point)).or_insert(next);
            if index == next {
                compressed.vertices.push(vertex.point);
            }
            remap[id.index()] = index;
        }
        for face in self.faces.ids() {
            compressed
                .faces
                .push(self.face_vertices(face).iter().map(|v| remap[v.index()]).collect());
        }
        compressed
    }

    /// Builds a mesh from shared-vertex form.
    ///
    /// # Panics
    /// If a face has fewer than three corners or an out-of-range index.
    pub fn from_compress_mesh(compressed: &CompressedMesh) -> Self {
        let mut mesh = Self::new();
        mesh.append_compress_mesh(compressed);
        mesh
    }

    pub(crate) fn append_compress_mesh(&mut self, compressed: &CompressedMesh) {
        let ids: Vec<VertexId> = compressed.vertices.iter().map(|p| self.add_vertex(*p)).collect();
        for face in &compressed.faces {
            let loop_: Vec<VertexId> = face.iter().map(|&i| ids[i]).collect();
            self.add_face(&loop_);
        }
    }

    /// Drops all elements. Property maps are kept, emptied.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
        self.faces.clear();
    }

    pub fn add_vertex_property<T: Clone + 'static>(&mut self, name: &str, default: T) -> Property<T> {
        self.vertices.add_property(name, default)
    }

    pub fn find_vertex_property<T: 'static>(&self, name: &str) -> Option<Property<T>> {
        self.vertices.find_property(name)
    }

    pub fn vertex_property<T: 'static>(&self, property: &Property<T>) -> &[T] {
        self.vertices.property(property)
    }

    pub fn vertex_property_mut<T: 'static>(&mut self, property: &Property<T>) -> &mut [T] {
        self.vertices.property_mut(property)
    }

    pub fn erase_vertex_property(&mut self, name: &str) -> bool {
        self.vertices.erase_property(name)
    }

    pub fn add_edge_property<T: Clone + 'static>(&mut self, name: &str, default: T) -> Property<T> {
        self.edges.add_property(name, default)
    }

    pub fn edge_property<T: 'static>(&self, property: &Property<T>) -> &[T] {
        self.edges.property(property)
    }

    pub fn edge_property_mut<T: 'static>(&mut self, property: &Property<T>) -> &mut [T] {
        self.edges.property_mut(property)
    }

    pub fn add_face_property<T: Clone + 'static>(&mut self, name: &str, default: T) -> Property<T> {
        self.faces.add_property(name, default)
    }

    pub fn find_face_property<T: 'static>(&self, name: &str) -> Option<Property<T>> {
        self.faces.find_property(name)
    }

    pub fn face_property<T: 'static>(&self, property: &Property<T>) -> &[T] {
        self.faces.property(property)
    }

    pub fn face_property_mut<T: 'static>(&mut self, property: &Property<T>) -> &mut [T] {
        self.faces.property_mut(property)
    }

    pub fn erase_face_property(&mut self, name: &str) -> bool {
        self.faces.erase_property(name)
    }
}

impl Default for SurfaceMesh {
    fn default() -> Self {
        Self::new()
    }
}

// -0.0 and 0.0 are the same position
fn position_key(p: &Point3) -> [u64; 3] {
    let bits = |c: f64| if c == 0.0 { 0u64 } else { c.to_bits() };
    [bits(p.x), bits(p.y), bits(p.z)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square(mesh: &mut SurfaceMesh) -> (Vec<VertexId>, FaceId) {
        let v = vec![
            mesh.add_vertex(Point3::new(0.0, 0.0, 0.0)),
            mesh.add_vertex(Point3::new(1.0, 0.0, 0.0)),
            mesh.add_vertex(Point3::new(1.0, 1.0, 0.0)),
            mesh.add_vertex(Point3::new(0.0, 1.0, 0.0)),
        ];
        let f = mesh.add_face(&v);
        (v, f)
    }

    #[test]
    fn test_add_face_builds_one_cycle() {
        let mut mesh = SurfaceMesh::new();
        let (v, f) = unit_square(&mut mesh);
        assert_eq!(mesh.n_edges(), 4);

        let edges: Vec<EdgeId> = mesh.face_edges(f).collect();
        assert_eq!(edges.len(), 4);
        for (i, &e) in edges.iter().enumerate() {
            let edge = mesh.edge(e);
            assert_eq!(edge.face, f);
            assert_eq!(edge.source, v[i]);
            assert_eq!(edge.target, v[(i + 1) % 4]);
            assert_eq!(mesh.edge(edge.next).prev, e);
            assert_eq!(mesh.outgoing_edges(v[i]), &[e]);
        }
        assert_eq!(mesh.face_vertices(f), v);
    }

    #[test]
    fn test_shared_boundary_is_not_merged() {
        let mut mesh = SurfaceMesh::new();
        let (v, _) = unit_square(&mut mesh);
        let apex = mesh.add_vertex(Point3::new(0.5, 2.0, 0.0));
        mesh.add_face(&[v[3], v[2], apex]);
        assert_eq!(mesh.n_edges(), 7);
        assert_eq!(mesh.outgoing_edges(v[2]).len(), 2);
    }

    #[test]
    #[should_panic(expected = "at least 3 vertices")]
    fn test_add_face_rejects_two_vertices() {
        let mut mesh = SurfaceMesh::new();
        let a = mesh.add_vertex(Point3::origin());
        let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        mesh.add_face(&[a, b]);
    }

    #[test]
    fn test_normals() {
        let mut mesh = SurfaceMesh::new();
        let (v, f) = unit_square(&mut mesh);
        assert_eq!(mesh.face_normal(f), Vector3::z());

        let lifted = mesh.add_vertex(Point3::new(0.0, 0.0, -1.0));
        mesh.add_face(&[v[0], lifted, v[1]]);
        let normals = mesh.vertex_normals();
        let expected = (Vector3::z() - Vector3::y()).normalize();
        assert!((normals[v[0].index()] - expected).norm() < 1e-12);
        assert_eq!(normals[v[2].index()], Vector3::z());
        assert_eq!(normals.len(), mesh.vertex_capacity());
    }

    #[test]
    fn test_remove_face() {
        let mut mesh = SurfaceMesh::new();
        let (v, f) = unit_square(&mut mesh);
        mesh.remove_face(f);
        assert_eq!(mesh.n_faces(), 0);
        assert_eq!(mesh.n_edges(), 0);
        assert_eq!(mesh.n_vertices(), 4);
        assert!(mesh.outgoing_edges(v[0]).is_empty());
        // edges are recycled by the next face
        let g = mesh.add_face(&[v[0], v[1], v[2]]);
        assert_eq!(mesh.face_edges(g).count(), 3);
    }

    #[test]
    fn test_triangles_fan() {
        let mut mesh = SurfaceMesh::new();
        let (v, _) = unit_square(&mut mesh);
        assert_eq!(mesh.triangle_indices(), vec![[v[0], v[1], v[2]], [v[0], v[2], v[3]]]);
        let area: f64 = mesh.triangles().iter().map(Triangle3::area).sum();
        assert!((area - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_compress_merges_coincident_vertices() {
        let mut mesh = SurfaceMesh::new();
        let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        let b2 = mesh.add_vertex(Point3::new(1.0, -0.0, 0.0));
        let d = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
        mesh.add_face(&[a, b, c]);
        mesh.add_face(&[b2, d, c]);

        let compressed = mesh.to_compress_mesh();
        assert_eq!(compressed.vertices.len(), 4);
        assert_eq!(compressed.faces, vec![vec![0, 1, 2], vec![1, 3, 2]]);

        let rebuilt = SurfaceMesh::from_compress_mesh(&compressed);
        assert_eq!(rebuilt.to_compress_mesh(), compressed);
    }

    #[test]
    fn test_clone_copies_topology_not_properties() {
        let mut mesh = SurfaceMesh::new();
        let (v, f) = unit_square(&mut mesh);
        let color = mesh.add_face_property("f:color", [0u8; 3]);
        mesh.face_property_mut(&color)[f.index()] = [255, 0, 0];

        let copy = mesh.clone();
        assert_eq!(copy.face_vertices(f), v);
        let copy_color = copy.find_face_property::<[u8; 3]>("f:color").unwrap();
        assert_eq!(copy.face_property(&copy_color)[f.index()], [0, 0, 0]);
        assert_eq!(mesh.face_property(&color)[f.index()], [255, 0, 0]);
    }

    #[test]
    fn test_bounding_box() {
        let mut mesh = SurfaceMesh::new();
        assert!(mesh.bounding_box().is_empty());
        unit_square(&mut mesh);
        let bbox = mesh.bounding_box();
        assert_eq!(bbox.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bbox.max, Point3::new(1.0, 1.0, 0.0));
    }
}
