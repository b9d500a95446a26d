//! LAS 2.0 well-log files
//!
//! The reader turns one LAS file into a [`crate::types::WellDataset`],
//! mapping curve mnemonics onto registry tags and normalising null sentinels.
//! The writer exports a merged dataset as LAS 2.0 with depths in feet.

mod reader;
mod writer;

pub use reader::{parse_las, read_las, LasFile, LasWellInfo, UnmappedCurve, UnmappedReason};
pub use writer::{write_las, write_las_file, WriteOptions};

use std::path::PathBuf;
use thiserror::Error;

use crate::types::{CurveError, DatasetError};

#[derive(Debug, Error)]
pub enum LasError {
    #[error("Failed to read/write LAS file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: invalid number '{value}'")]
    InvalidNumber { line: usize, value: String },

    #[error("line {line}: expected {expected} values, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("wrapped LAS files (WRAP YES) are not supported")]
    Wrapped,

    #[error("missing required '{0}' entry in ~Well section")]
    MissingHeader(&'static str),

    #[error("file has no ~Curve section")]
    NoCurves,

    #[error("first curve '{0}' is not a depth index")]
    NoDepthCurve(String),

    #[error("file has no ~ASCII data section")]
    NoData,

    #[error(transparent)]
    Curve(#[from] CurveError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}
