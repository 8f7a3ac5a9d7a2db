// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! ASCII XYZ point clouds
//!
//! Three line layouts are understood: `x y z`, `x y z r g b` and
//! `x y z r g b nx ny nz`, with colors as 8-bit integers. The layout is
//! decided from the first data line and every later line must follow it.

use crate::error::{LoadError, LoadResult};
use crate::geometry::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointFormat {
    Xyz,
    XyzRgb,
    XyzRgbNormal,
}

impl PointFormat {
    pub fn token_count(self) -> usize {
        match self {
            PointFormat::Xyz => 3,
            PointFormat::XyzRgb => 6,
            PointFormat::XyzRgbNormal => 9,
        }
    }

    /// Layout of a line, `None` when it matches none of them.
    pub fn detect(line: &str) -> Option<PointFormat> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let colors_ok = || tokens[3..6].iter().all(|t| t.parse::<u8>().is_ok());
        match tokens.len() {
            3 => Some(PointFormat::Xyz),
            6 if colors_ok() => Some(PointFormat::XyzRgb),
            9 if colors_ok() => Some(PointFormat::XyzRgbNormal),
            _ => None,
        }
    }
}

impl fmt::Display for PointFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PointFormat::Xyz => "XYZ",
            PointFormat::XyzRgb => "XYZ_RGB",
            PointFormat::XyzRgbNormal => "XYZ_RGB_NORMAL",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    pub points: Vec<Point3>,
    pub colors: Option<Vec<[u8; 3]>>,
    pub normals: Option<Vec<Vector3>>,
}

impl PointCloud {
    pub fn new(points: Vec<Point3>) -> Self {
        Self {
            points,
            colors: None,
            normals: None,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.colors = None;
        self.normals = None;
    }

    /// The layout [`write_xyz`] uses for this cloud.
    pub fn format(&self) -> PointFormat {
        if self.normals.is_some() {
            PointFormat::XyzRgbNormal
        } else if self.colors.is_some() {
            PointFormat::XyzRgb
        } else {
            PointFormat::Xyz
        }
    }
}

/// Reads a point cloud, replacing the contents of `cloud`.
///
/// Blank lines and `#` comments are skipped. On failure the cloud is left
/// empty.
pub fn read_xyz<R: BufRead>(reader: R, cloud: &mut PointCloud) -> LoadResult<PointFormat> {
    cloud.clear();
    let result = parse_xyz(reader, cloud);
    if let Err(e) = &result {
        cloud.clear();
        warn!(error = %e, "failed to read XYZ");
    }
    result
}

pub fn load_xyz(path: impl AsRef<Path>, cloud: &mut PointCloud) -> LoadResult<PointFormat> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            cloud.clear();
            warn!(path = %path.display(), error = %e, "cannot open XYZ file");
            return Err(e.into());
        }
    };
    let format = read_xyz(BufReader::new(file), cloud)?;
    debug!(path = %path.display(), points = cloud.len(), %format, "loaded XYZ");
    Ok(format)
}

fn parse_xyz<R: BufRead>(reader: R, cloud: &mut PointCloud) -> LoadResult<PointFormat> {
    let mut format = None;
    let mut colors = Vec::new();
    let mut normals = Vec::new();

    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = n + 1;
        let content = line.trim();
        if content.is_empty() || content.starts_with('#') {
            continue;
        }
        let format = match format {
            Some(format) => format,
            None => {
                let detected = PointFormat::detect(content).ok_or_else(|| {
                    LoadError::UnsupportedFormat(format!("line {}: `{}`", line_no, content))
                })?;
                format = Some(detected);
                detected
            }
        };

        let tokens: Vec<&str> = content.split_whitespace().collect();
        if tokens.len() != format.token_count() {
            return Err(LoadError::parse(
                line_no,
                format!("expected {} values for {}, got {}", format.token_count(), format, tokens.len()),
            ));
        }
        let float = |i: usize| -> LoadResult<f64> {
            tokens[i]
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| LoadError::parse(line_no, format!("bad number `{}`", tokens[i])))
        };
        let byte = |i: usize| -> LoadResult<u8> {
            tokens[i]
                .parse()
                .map_err(|_| LoadError::parse(line_no, format!("bad color `{}`", tokens[i])))
        };

        cloud.points.push(Point3::new(float(0)?, float(1)?, float(2)?));
        if format != PointFormat::Xyz {
            colors.push([byte(3)?, byte(4)?, byte(5)?]);
        }
        if format == PointFormat::XyzRgbNormal {
            normals.push(Vector3::new(float(6)?, float(7)?, float(8)?));
        }
    }

    let Some(format) = format else {
        return Err(LoadError::Empty);
    };
    if format != PointFormat::Xyz {
        cloud.colors = Some(colors);
    }
    if format == PointFormat::XyzRgbNormal {
        cloud.normals = Some(normals);
    }
    Ok(format)
}

/// Writes `cloud` in the layout given by [`PointCloud::format`]. Missing
/// colors of a cloud with normals are written as white.
pub fn write_xyz<W: Write>(mut writer: W, cloud: &PointCloud) -> LoadResult<()> {
    let format = cloud.format();
    for (i, p) in cloud.points.iter().enumerate() {
        write!(writer, "{} {} {}", p.x, p.y, p.z)?;
        if format != PointFormat::Xyz {
            let [r, g, b] = cloud
                .colors
                .as_ref()
                .and_then(|c| c.get(i).copied())
                .unwrap_or([255, 255, 255]);
            write!(writer, " {} {} {}", r, g, b)?;
        }
        if let Some(n) = cloud.normals.as_ref().and_then(|n| n.get(i)) {
            write!(writer, " {} {} {}", n.x, n.y, n.z)?;
        } else if format == PointFormat::XyzRgbNormal {
            write!(writer, " 0 0 0")?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

pub fn save_xyz(path: impl AsRef<Path>, cloud: &PointCloud) -> LoadResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_xyz(&mut writer, cloud)?;
    writer.flush()?;
    Ok(())
}
