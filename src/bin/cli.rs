// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geokernel CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use geokernel::geometry::pca::estimate_normals;
use geokernel::spatial::MAX_DEPTH;
use geokernel::{
    load_obj, load_xyz, save_xyz, Box3, KernelConfig, PointCloud, Point3, RangeRay3, Snap3,
    SurfaceMesh, Vector3, VoxelOctree,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "geokernel")]
#[command(about = "Geokernel - robust geometry and spatial indexing tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to geokernel.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print statistics of an OBJ mesh
    Info {
        /// Input OBJ file
        input: PathBuf,
    },

    /// Voxelize an OBJ mesh into an octree
    Voxelize {
        /// Input OBJ file
        input: PathBuf,

        /// Octree depth
        #[arg(short, long)]
        depth: Option<u32>,
    },

    /// Cast a ray through the voxelized mesh
    Pick {
        /// Input OBJ file
        input: PathBuf,

        /// Ray origin as x,y,z
        #[arg(long, value_parser = parse_triple, allow_hyphen_values = true)]
        origin: [f64; 3],

        /// Ray direction as x,y,z
        #[arg(long, value_parser = parse_triple, allow_hyphen_values = true)]
        direction: [f64; 3],

        /// Octree depth
        #[arg(short, long)]
        depth: Option<u32>,
    },

    /// Merge points of an XYZ cloud closer than a threshold
    Snap {
        /// Input XYZ file
        input: PathBuf,

        /// Merge distance
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Output XYZ file for the merged points
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Estimate PCA normals for an XYZ cloud
    Normals {
        /// Input XYZ file
        input: PathBuf,

        /// Neighbourhood size
        #[arg(short, long)]
        k: Option<usize>,

        /// Output XYZ file with normals
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => KernelConfig::from_file(path)?,
        None => KernelConfig::load()?,
    };
    init_logging(&config, cli.verbose);

    match &cli.command {
        Commands::Info { input } => info_command(input, &config, cli.json),
        Commands::Voxelize { input, depth } => {
            voxelize_command(input, &config, depth.unwrap_or(config.voxel_depth), cli.json)
        }
        Commands::Pick {
            input,
            origin,
            direction,
            depth,
        } => pick_command(
            input,
            &config,
            Point3::from(*origin),
            Vector3::from(*direction),
            depth.unwrap_or(config.voxel_depth),
            cli.json,
        ),
        Commands::Snap {
            input,
            threshold,
            output,
        } => snap_command(
            input,
            threshold.unwrap_or(config.snap_threshold),
            config.snap_resolution,
            output.as_deref(),
            cli.json,
        ),
        Commands::Normals { input, k, output } => normals_command(
            input,
            k.unwrap_or(config.normal_neighbours),
            output.as_deref(),
            cli.json,
        ),
        Commands::Version => {
            println!("Geokernel v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_logging(config: &KernelConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_triple(text: &str) -> Result<[f64; 3], String> {
    let values: Vec<f64> = text
        .split(',')
        .map(|t| t.trim().parse::<f64>().map_err(|e| format!("`{}`: {}", t, e)))
        .collect::<Result<_, _>>()?;
    <[f64; 3]>::try_from(values).map_err(|v| format!("expected x,y,z, got {} values", v.len()))
}

fn read_mesh(path: &Path, config: &KernelConfig) -> Result<SurfaceMesh> {
    let mut mesh = SurfaceMesh::with_first_chunk_size(config.pool_first_chunk_size);
    load_obj(path, &mut mesh).with_context(|| format!("Failed to load mesh: {}", path.display()))?;
    Ok(mesh)
}

fn read_cloud(path: &Path) -> Result<PointCloud> {
    let mut cloud = PointCloud::default();
    load_xyz(path, &mut cloud)
        .with_context(|| format!("Failed to load point cloud: {}", path.display()))?;
    Ok(cloud)
}

fn box_json(bbox: &Box3) -> serde_json::Value {
    if bbox.is_empty() {
        return serde_json::Value::Null;
    }
    json!({
        "min": [bbox.min.x, bbox.min.y, bbox.min.z],
        "max": [bbox.max.x, bbox.max.y, bbox.max.z],
    })
}

fn format_box(bbox: &Box3) -> String {
    if bbox.is_empty() {
        return "empty".to_string();
    }
    format!(
        "[{:.4}, {:.4}, {:.4}] - [{:.4}, {:.4}, {:.4}]",
        bbox.min.x, bbox.min.y, bbox.min.z, bbox.max.x, bbox.max.y, bbox.max.z
    )
}

fn voxelize(mesh: &SurfaceMesh, depth: u32) -> Result<VoxelOctree> {
    anyhow::ensure!(depth <= MAX_DEPTH, "depth {} exceeds the maximum of {}", depth, MAX_DEPTH);
    let start = Instant::now();
    let mut octree = VoxelOctree::new(Box3::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)), 0);
    octree.reset_mesh(mesh, depth);
    info!(
        depth,
        leaves = octree.leaf_count(),
        elapsed = ?start.elapsed(),
        "voxelized"
    );
    Ok(octree)
}

fn info_command(input: &Path, config: &KernelConfig, json: bool) -> Result<()> {
    let mesh = read_mesh(input, config)?;
    let bbox = mesh.bounding_box();
    let shared = mesh.to_compress_mesh().vertices.len();

    if json {
        let report = json!({
            "file": input.display().to_string(),
            "vertices": mesh.n_vertices(),
            "unique_vertices": shared,
            "edges": mesh.n_edges(),
            "faces": mesh.n_faces(),
            "triangles": mesh.triangle_indices().len(),
            "bounding_box": box_json(&bbox),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", input.display().to_string().bold().cyan());
    println!("  Vertices:  {} ({} unique)", mesh.n_vertices(), shared);
    println!("  Edges:     {}", mesh.n_edges());
    println!("  Faces:     {}", mesh.n_faces());
    println!("  Triangles: {}", mesh.triangle_indices().len());
    println!("  Bounds:    {}", format_box(&bbox));
    Ok(())
}

fn voxelize_command(input: &Path, config: &KernelConfig, depth: u32, json: bool) -> Result<()> {
    let mesh = read_mesh(input, config)?;
    let octree = voxelize(&mesh, depth)?;
    let size = octree.voxel_size();

    if json {
        let report = json!({
            "file": input.display().to_string(),
            "depth": depth,
            "leaves": octree.leaf_count(),
            "nodes": octree.node_count(),
            "voxel_size": [size.x, size.y, size.z],
            "bounding_box": box_json(octree.bounding_box()),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} {}", "Voxelized".bold().green(), input.display());
    println!("  Depth:      {}", depth);
    println!("  Leaves:     {}", octree.leaf_count());
    println!("  Nodes:      {}", octree.node_count());
    println!("  Voxel size: {:.6} x {:.6} x {:.6}", size.x, size.y, size.z);
    println!("  Bounds:     {}", format_box(octree.bounding_box()));
    Ok(())
}

fn pick_command(
    input: &Path,
    config: &KernelConfig,
    origin: Point3,
    direction: Vector3,
    depth: u32,
    json: bool,
) -> Result<()> {
    let mesh = read_mesh(input, config)?;
    let octree = voxelize(&mesh, depth)?;
    let ray = RangeRay3::new(origin, direction);
    let mut hits = Vec::new();
    octree.pick_voxels(&ray, &mut hits);

    if json {
        let voxels: Vec<_> = hits
            .iter()
            .map(|&id| {
                let node = octree.node(id);
                json!({
                    "index": [node.x, node.y, node.z],
                    "box": box_json(&octree.voxel_box(id)),
                })
            })
            .collect();
        let report = json!({ "hits": hits.len(), "voxels": voxels });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("{}", "No voxel hit".yellow());
        return Ok(());
    }
    println!("{} {} voxel(s)", "Hit".bold().green(), hits.len());
    for &id in &hits {
        let node = octree.node(id);
        println!(
            "  ({}, {}, {})  {}",
            node.x,
            node.y,
            node.z,
            format_box(&octree.voxel_box(id))
        );
    }
    Ok(())
}

fn snap_command(
    input: &Path,
    threshold: f64,
    resolution: usize,
    output: Option<&Path>,
    json: bool,
) -> Result<()> {
    anyhow::ensure!(threshold >= 0.0, "threshold must be non-negative, got {}", threshold);
    let cloud = read_cloud(input)?;
    let bbox: Box3 = cloud.points.iter().copied().collect();
    let mut snap = Snap3::new(bbox.inflated(threshold), resolution, threshold);
    for p in &cloud.points {
        snap.insert_snap_vertex(p);
    }

    if let Some(path) = output {
        let merged = PointCloud::new(snap.snap_points().to_vec());
        save_xyz(path, &merged).with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if json {
        let report = json!({
            "file": input.display().to_string(),
            "threshold": threshold,
            "input_points": cloud.len(),
            "snapped_points": snap.len(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} {}", "Snapped".bold().green(), input.display());
    println!("  Threshold: {}", threshold);
    println!("  Points:    {} -> {}", cloud.len(), snap.len());
    if let Some(path) = output {
        println!("  Written:   {}", path.display());
    }
    Ok(())
}

fn normals_command(input: &Path, k: usize, output: Option<&Path>, json: bool) -> Result<()> {
    let mut cloud = read_cloud(input)?;
    let start = Instant::now();
    let normals = estimate_normals(&cloud.points, k);
    info!(points = cloud.len(), k, elapsed = ?start.elapsed(), "estimated normals");
    let undefined = normals.iter().filter(|n| n.norm_squared() == 0.0).count();
    cloud.normals = Some(normals);

    if let Some(path) = output {
        save_xyz(path, &cloud).with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if json {
        let report = json!({
            "file": input.display().to_string(),
            "k": k,
            "points": cloud.len(),
            "undefined_normals": undefined,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} {}", "Normals".bold().green(), input.display());
    println!("  Points:    {}", cloud.len());
    println!("  Neighbours: {}", k);
    if undefined > 0 {
        println!("  {} {} point(s) without a defined normal", "!".yellow(), undefined);
    }
    if let Some(path) = output {
        println!("  Written:   {}", path.display());
    }
    Ok(())
}
