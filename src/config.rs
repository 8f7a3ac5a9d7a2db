// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel configuration

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::pool::DEFAULT_FIRST_CHUNK_SIZE;
use crate::spatial::MAX_DEPTH;

/// Name of the file [`KernelConfig::load`] looks for in the working directory.
pub const CONFIG_FILE: &str = "geokernel.toml";

/// Tunables shared by the command line and library users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Slot count of the first pool chunk
    pub pool_first_chunk_size: usize,
    /// Octree depth used when voxelizing meshes
    pub voxel_depth: u32,
    /// Merge distance for vertex snapping
    pub snap_threshold: f64,
    /// Grid cells per axis of the snapping structure
    pub snap_resolution: usize,
    /// Neighbourhood size for PCA normals
    pub normal_neighbours: usize,
    /// `tracing` filter directive, e.g. `info` or `geokernel=debug`
    pub log_level: String,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            pool_first_chunk_size: DEFAULT_FIRST_CHUNK_SIZE,
            voxel_depth: 6,
            snap_threshold: 1e-6,
            snap_resolution: 64,
            normal_neighbours: 8,
            log_level: "warn".to_string(),
        }
    }
}

impl KernelConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: KernelConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `geokernel.toml` if present, then apply `GEOKERNEL_*` overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides looked up by variable name. Unset variables are skipped.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        fn parsed<T: std::str::FromStr>(name: &str, value: String) -> Result<T>
        where
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            value
                .parse()
                .with_context(|| format!("Invalid value for {}: {:?}", name, value))
        }

        if let Some(v) = var("GEOKERNEL_POOL_FIRST_CHUNK_SIZE") {
            self.pool_first_chunk_size = parsed("GEOKERNEL_POOL_FIRST_CHUNK_SIZE", v)?;
        }
        if let Some(v) = var("GEOKERNEL_VOXEL_DEPTH") {
            self.voxel_depth = parsed("GEOKERNEL_VOXEL_DEPTH", v)?;
        }
        if let Some(v) = var("GEOKERNEL_SNAP_THRESHOLD") {
            self.snap_threshold = parsed("GEOKERNEL_SNAP_THRESHOLD", v)?;
        }
        if let Some(v) = var("GEOKERNEL_SNAP_RESOLUTION") {
            self.snap_resolution = parsed("GEOKERNEL_SNAP_RESOLUTION", v)?;
        }
        if let Some(v) = var("GEOKERNEL_NORMAL_NEIGHBOURS") {
            self.normal_neighbours = parsed("GEOKERNEL_NORMAL_NEIGHBOURS", v)?;
        }
        if let Some(v) = var("GEOKERNEL_LOG") {
            self.log_level = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.pool_first_chunk_size > 0, "pool_first_chunk_size must be positive");
        ensure!(
            self.voxel_depth <= MAX_DEPTH,
            "voxel_depth {} exceeds the maximum of {}",
            self.voxel_depth,
            MAX_DEPTH
        );
        ensure!(
            self.snap_threshold >= 0.0 && self.snap_threshold.is_finite(),
            "snap_threshold must be a finite non-negative number"
        );
        ensure!(self.snap_resolution > 0, "snap_resolution must be positive");
        ensure!(self.normal_neighbours >= 3, "normal_neighbours must be at least 3");
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let config = KernelConfig {
            voxel_depth: 9,
            snap_threshold: 0.25,
            log_level: "geokernel=debug".to_string(),
            ..KernelConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(KernelConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "voxel_depth = 3\n").unwrap();
        let config = KernelConfig::from_file(&path).unwrap();
        assert_eq!(config.voxel_depth, 3);
        assert_eq!(config.snap_resolution, KernelConfig::default().snap_resolution);
    }

    #[test]
    fn test_rejects_deep_octree() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deep.toml");
        std::fs::write(&path, "voxel_depth = 22\n").unwrap();
        assert!(KernelConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("GEOKERNEL_SNAP_THRESHOLD", "0.5"),
            ("GEOKERNEL_LOG", "trace"),
        ]
        .into_iter()
        .collect();
        let mut config = KernelConfig::default();
        config
            .apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.snap_threshold, 0.5);
        assert_eq!(config.log_level, "trace");
        assert_eq!(config.voxel_depth, KernelConfig::default().voxel_depth);

        let err = config.apply_overrides(|name| {
            (name == "GEOKERNEL_VOXEL_DEPTH").then(|| "deep".to_string())
        });
        assert!(err.is_err());
    }
}
