//! petromerge: Multi-LAS Curve Merge Engine
//!
//! Merges several well-log files of one well into a single dataset on a
//! uniform depth grid, picking the best source per curve type and depth.
//!
//! ## Architecture
//!
//! - **Curves**: curve type registry mapping file mnemonics onto standard tags
//! - **Types**: log curves and well datasets
//! - **Merge**: quality scoring, resampling, best-source selection, gap filling
//! - **LAS**: LAS 2.0 reader and writer
//! - **Config**: TOML configuration with validation

pub mod config;
pub mod curves;
pub mod las;
pub mod merge;
pub mod types;

// Re-export configuration
pub use config::MergeConfig;

// Re-export commonly used types
pub use curves::{CurveRegistry, CurveSpec, CurveType, RegistryError};
pub use types::{CurveError, DatasetError, DepthRange, DepthUnit, LogCurve, WellDataset};

// Re-export the merge engine
pub use merge::{
    interpolate_gaps, merge, merge_with_defaults, resample, score_curve, select_best_curve,
    validate_same_well, MergeEngine, MergeError, MergeOutcome, MergeReport, MergedDataset,
    QualityScore,
};

// Re-export LAS I/O
pub use las::{parse_las, read_las, write_las, write_las_file, LasError, LasFile, WriteOptions};
