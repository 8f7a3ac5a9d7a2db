// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Errors for recoverable data problems
//!
//! Broken caller contracts panic. Bad input files and I/O failures come back
//! as [`LoadError`].

use thiserror::Error;

/// Failure while reading or writing a mesh or point cloud file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: vertex index {index} out of range for {count} vertices")]
    IndexOutOfRange { line: usize, index: i64, count: usize },
    #[error("unsupported point format: {0}")]
    UnsupportedFormat(String),
    #[error("no data in input")]
    Empty,
}

impl LoadError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        LoadError::Parse {
            line,
            message: message.into(),
        }
    }
}

pub type LoadResult<T> = std::result::Result<T, LoadError>;
