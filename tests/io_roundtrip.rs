// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Round-trip tests for mesh and point cloud files

use anyhow::Result;
use approx::assert_relative_eq;
use geokernel::geometry::Vector3;
use geokernel::mesh::shapes::{cuboid, uv_sphere};
use geokernel::{
    load_obj, load_xyz, save_obj, save_xyz, Box3, CompressedMesh, LoadError, Point3, PointCloud,
    PointFormat, SurfaceMesh,
};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_roundtrip_obj_sphere() -> Result<()> {
    let sphere = uv_sphere(Point3::new(1.0, -2.0, 0.5), 3.0, 12);
    let file = NamedTempFile::with_suffix(".obj")?;
    save_obj(file.path(), &sphere)?;

    let mut loaded = SurfaceMesh::new();
    load_obj(file.path(), &mut loaded)?;
    assert_eq!(loaded.n_faces(), sphere.n_faces());
    assert_eq!(loaded.n_edges(), sphere.n_edges());
    assert_eq!(loaded.to_compress_mesh(), sphere.to_compress_mesh());

    let (a, b) = (loaded.bounding_box(), sphere.bounding_box());
    assert!(a.approx_eq(&b, 1e-12));
    Ok(())
}

#[test]
fn test_obj_shared_vertices_are_welded() -> Result<()> {
    // two triangles written with duplicated corner vertices
    let mut file = NamedTempFile::with_suffix(".obj")?;
    writeln!(file, "v 0 0 0\nv 1 0 0\nv 0 1 0")?;
    writeln!(file, "v 1 0 0\nv 1 1 0\nv 0 1 0")?;
    writeln!(file, "f 1 2 3\nf 4 5 6")?;
    file.flush()?;

    let mut mesh = SurfaceMesh::new();
    load_obj(file.path(), &mut mesh)?;
    assert_eq!(mesh.n_vertices(), 6);

    let compressed = mesh.to_compress_mesh();
    assert_eq!(compressed.vertices.len(), 4);
    assert_eq!(compressed.faces.len(), 2);
    Ok(())
}

#[test]
fn test_obj_error_leaves_mesh_empty() -> Result<()> {
    let mut file = NamedTempFile::with_suffix(".obj")?;
    writeln!(file, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\nf 1 2 9")?;
    file.flush()?;

    let mut mesh = cuboid(&Box3::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)));
    let err = load_obj(file.path(), &mut mesh).unwrap_err();
    assert!(matches!(err, LoadError::IndexOutOfRange { line: 5, index: 9, count: 3 }));
    assert!(mesh.is_empty());
    assert_eq!(mesh.n_edges(), 0);
    Ok(())
}

#[test]
fn test_compress_mesh_roundtrip() -> Result<()> {
    let cube = cuboid(&Box3::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 2.0, 3.0)));
    let compressed = cube.to_compress_mesh();
    assert_eq!(compressed.vertices.len(), 8);
    assert_eq!(compressed.faces.len(), 6);

    let json = serde_json::to_string(&compressed)?;
    let decoded: CompressedMesh = serde_json::from_str(&json)?;
    let rebuilt = SurfaceMesh::from_compress_mesh(&decoded);
    assert_eq!(rebuilt.n_vertices(), 8);
    assert_eq!(rebuilt.n_faces(), 6);
    assert_eq!(rebuilt.n_edges(), 24);
    assert_eq!(rebuilt.to_compress_mesh(), compressed);
    Ok(())
}

#[test]
fn test_roundtrip_xyz_formats() -> Result<()> {
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.125, -3.5, 7.0),
        Point3::new(1e-9, 2.0, -0.75),
    ];

    let plain = PointCloud::new(points.clone());
    let colored = PointCloud {
        colors: Some(vec![[1, 2, 3], [40, 50, 60], [255, 0, 128]]),
        ..plain.clone()
    };
    let full = PointCloud {
        normals: Some(vec![Vector3::x(), Vector3::y(), Vector3::new(0.0, 0.6, -0.8)]),
        ..colored.clone()
    };

    for (cloud, format) in [
        (&plain, PointFormat::Xyz),
        (&colored, PointFormat::XyzRgb),
        (&full, PointFormat::XyzRgbNormal),
    ] {
        let file = NamedTempFile::with_suffix(".xyz")?;
        save_xyz(file.path(), cloud)?;
        let mut loaded = PointCloud::default();
        assert_eq!(load_xyz(file.path(), &mut loaded)?, format);
        assert_eq!(&loaded, cloud);
    }
    Ok(())
}

#[test]
fn test_xyz_with_comments_and_blank_lines() -> Result<()> {
    let mut file = NamedTempFile::with_suffix(".xyz")?;
    writeln!(file, "# exported scan\n\n1 2 3 0 0 1 0 0 1\n  \n4 5 6 255 255 255 0.6 0.8 0")?;
    file.flush()?;

    let mut cloud = PointCloud::default();
    assert_eq!(load_xyz(file.path(), &mut cloud)?, PointFormat::XyzRgbNormal);
    assert_eq!(cloud.len(), 2);
    let normal = cloud.normals.as_ref().expect("cloud has normals")[1];
    assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_xyz_missing_file() {
    let mut cloud = PointCloud::new(vec![Point3::origin()]);
    let err = load_xyz("/nonexistent/geokernel/cloud.xyz", &mut cloud).unwrap_err();
    assert!(matches!(err, LoadError::Io(_)));
    assert!(cloud.is_empty());
}
