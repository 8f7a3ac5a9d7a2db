// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Wavefront OBJ reader and writer
//!
//! Only `v` and `f` records are used. Face corners may carry texture and
//! normal indices (`i/j`, `i//k`, `i/j/k`); those are skipped. Vertex
//! indices are 1-based and must name a vertex defined earlier in the file.

use crate::error::{LoadError, LoadResult};
use crate::geometry::Point3;
use crate::mesh::{SurfaceMesh, VertexId};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Reads OBJ text into `mesh`, replacing its contents.
///
/// On failure the mesh is left empty.
pub fn read_obj<R: BufRead>(reader: R, mesh: &mut SurfaceMesh) -> LoadResult<()> {
    mesh.clear();
    let result = parse_obj(reader, mesh);
    if let Err(e) = &result {
        mesh.clear();
        warn!(error = %e, "failed to read OBJ");
    }
    result
}

pub fn load_obj(path: impl AsRef<Path>, mesh: &mut SurfaceMesh) -> LoadResult<()> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            mesh.clear();
            warn!(path = %path.display(), error = %e, "cannot open OBJ file");
            return Err(e.into());
        }
    };
    read_obj(BufReader::new(file), mesh)?;
    debug!(
        path = %path.display(),
        vertices = mesh.n_vertices(),
        faces = mesh.n_faces(),
        "loaded OBJ"
    );
    Ok(())
}

fn parse_obj<R: BufRead>(reader: R, mesh: &mut SurfaceMesh) -> LoadResult<()> {
    let mut vertices: Vec<VertexId> = Vec::new();
    let mut corners: Vec<VertexId> = Vec::new();

    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = n + 1;
        let content = match line.find('#') {
            Some(at) => &line[..at],
            None => &line[..],
        };
        let mut tokens = content.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let mut coords = [0.0f64; 3];
                for c in coords.iter_mut() {
                    let token = tokens
                        .next()
                        .ok_or_else(|| LoadError::parse(line_no, "vertex needs three coordinates"))?;
                    *c = token
                        .parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .ok_or_else(|| LoadError::parse(line_no, format!("bad coordinate `{}`", token)))?;
                }
                vertices.push(mesh.add_vertex(Point3::new(coords[0], coords[1], coords[2])));
            }
            Some("f") => {
                corners.clear();
                for token in tokens {
                    let index_text = token.split('/').next().unwrap_or("");
                    let index: i64 = index_text
                        .parse()
                        .map_err(|_| LoadError::parse(line_no, format!("bad face corner `{}`", token)))?;
                    if index <= 0 || index as usize > vertices.len() {
                        return Err(LoadError::IndexOutOfRange {
                            line: line_no,
                            index,
                            count: vertices.len(),
                        });
                    }
                    corners.push(vertices[index as usize - 1]);
                }
                if corners.len() < 3 {
                    return Err(LoadError::parse(
                        line_no,
                        format!("face needs at least 3 corners, got {}", corners.len()),
                    ));
                }
                mesh.add_face(&corners);
            }
            _ => {}
        }
    }
    Ok(())
}

/// Writes the shared-vertex form of `mesh`.
pub fn write_obj<W: Write>(mut writer: W, mesh: &SurfaceMesh) -> LoadResult<()> {
    let compressed = mesh.to_compress_mesh();
    for p in &compressed.vertices {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for face in &compressed.faces {
        write!(writer, "f")?;
        for index in face {
            write!(writer, " {}", index + 1)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

pub fn save_obj(path: impl AsRef<Path>, mesh: &SurfaceMesh) -> LoadResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_obj(&mut writer, mesh)?;
    writer.flush()?;
    Ok(())
}
