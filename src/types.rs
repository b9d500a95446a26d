//! Core data types: depth units, log curves and well datasets.
//!
//! A [`WellDataset`] is what one loaded LAS file becomes: a well identifier, a
//! depth unit and at most one [`LogCurve`] per [`CurveType`]. Datasets are
//! assembled once by a loader and are read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::config::defaults::{DEPTH_EPSILON_FT, FT_PER_M};
use crate::curves::CurveType;

// ============================================================================
// Depth Unit
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DepthUnit {
    #[default]
    Feet,
    Meters,
}

impl DepthUnit {
    /// Parse a LAS unit string (`FT`, `F`, `M`, `METERS` ...).
    pub fn parse(unit: &str) -> Option<Self> {
        match unit.trim().to_uppercase().as_str() {
            "FT" | "F" | "FEET" | "FOOT" => Some(Self::Feet),
            "M" | "METER" | "METERS" | "METRE" | "METRES" => Some(Self::Meters),
            _ => None,
        }
    }

    /// Multiplier converting a depth in this unit to feet.
    pub const fn to_feet_factor(self) -> f64 {
        match self {
            Self::Feet => 1.0,
            Self::Meters => FT_PER_M,
        }
    }

    pub const fn las_unit(self) -> &'static str {
        match self {
            Self::Feet => "F",
            Self::Meters => "M",
        }
    }
}

impl fmt::Display for DepthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feet => f.write_str("ft"),
            Self::Meters => f.write_str("m"),
        }
    }
}

// ============================================================================
// Depth Range
// ============================================================================

/// Closed depth interval `[top, base]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthRange {
    pub top: f64,
    pub base: f64,
}

impl DepthRange {
    pub const fn new(top: f64, base: f64) -> Self {
        Self { top, base }
    }

    pub fn length(&self) -> f64 {
        self.base - self.top
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.top <= other.base + DEPTH_EPSILON_FT && other.top <= self.base + DEPTH_EPSILON_FT
    }

    pub fn contains(&self, depth: f64) -> bool {
        depth >= self.top - DEPTH_EPSILON_FT && depth <= self.base + DEPTH_EPSILON_FT
    }
}

impl fmt::Display for DepthRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}-{:.2}", self.top, self.base)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum CurveError {
    #[error("Curve {curve}: {depths} depths but {values} values")]
    LengthMismatch {
        curve: String,
        depths: usize,
        values: usize,
    },

    #[error("Curve {curve}: depth at sample {index} is not finite")]
    NonFiniteDepth { curve: String, index: usize },

    #[error("Curve {curve}: depth at sample {index} ({depth}) is not above the previous sample")]
    NonIncreasingDepth {
        curve: String,
        index: usize,
        depth: f64,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("Dataset '{dataset}' already has a {curve} curve")]
    DuplicateCurve { dataset: String, curve: String },
}

// ============================================================================
// Log Curve
// ============================================================================

/// One depth-indexed measurement series. Absent samples are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogCurve {
    curve_type: CurveType,
    unit: String,
    depths: Vec<f64>,
    values: Vec<Option<f64>>,
}

impl LogCurve {
    /// Build a curve. Depths must be finite and strictly increasing; non-finite
    /// values are stored as absent.
    pub fn new(
        curve_type: CurveType,
        unit: impl Into<String>,
        depths: Vec<f64>,
        values: Vec<Option<f64>>,
    ) -> Result<Self, CurveError> {
        if depths.len() != values.len() {
            return Err(CurveError::LengthMismatch {
                curve: curve_type.to_string(),
                depths: depths.len(),
                values: values.len(),
            });
        }
        for (index, &depth) in depths.iter().enumerate() {
            if !depth.is_finite() {
                return Err(CurveError::NonFiniteDepth {
                    curve: curve_type.to_string(),
                    index,
                });
            }
            if index > 0 && depth <= depths[index - 1] {
                return Err(CurveError::NonIncreasingDepth {
                    curve: curve_type.to_string(),
                    index,
                    depth,
                });
            }
        }
        let values = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        Ok(Self {
            curve_type,
            unit: unit.into(),
            depths,
            values,
        })
    }

    /// Build on depths already known to be finite and strictly increasing
    /// (a [`crate::merge::DepthGrid`]).
    pub(crate) fn from_grid(
        curve_type: CurveType,
        unit: impl Into<String>,
        depths: Vec<f64>,
        values: Vec<Option<f64>>,
    ) -> Self {
        debug_assert_eq!(depths.len(), values.len());
        Self {
            curve_type,
            unit: unit.into(),
            depths,
            values: values.into_iter().map(|v| v.filter(|x| x.is_finite())).collect(),
        }
    }

    /// Convenience constructor from `(depth, value)` pairs.
    pub fn from_samples(
        curve_type: CurveType,
        unit: impl Into<String>,
        samples: impl IntoIterator<Item = (f64, Option<f64>)>,
    ) -> Result<Self, CurveError> {
        let (depths, values) = samples.into_iter().unzip();
        Self::new(curve_type, unit, depths, values)
    }

    pub fn curve_type(&self) -> &CurveType {
        &self.curve_type
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn depths(&self) -> &[f64] {
        &self.depths
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    pub fn top(&self) -> Option<f64> {
        self.depths.first().copied()
    }

    pub fn base(&self) -> Option<f64> {
        self.depths.last().copied()
    }

    /// Sampled depth extent, or `None` for an empty curve.
    pub fn extent(&self) -> Option<DepthRange> {
        Some(DepthRange::new(self.top()?, self.base()?))
    }

    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn null_count(&self) -> usize {
        self.len() - self.valid_count()
    }

    /// Fraction of non-null samples (0.0 for an empty curve).
    pub fn completeness(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.valid_count() as f64 / self.len() as f64
        }
    }

    /// Median depth increment, or `None` with fewer than two samples.
    pub fn native_step(&self) -> Option<f64> {
        if self.depths.len() < 2 {
            return None;
        }
        let mut steps: Vec<f64> = self.depths.windows(2).map(|w| w[1] - w[0]).collect();
        steps.sort_by(f64::total_cmp);
        let mid = steps.len() / 2;
        Some(if steps.len() % 2 == 0 {
            (steps[mid - 1] + steps[mid]) / 2.0
        } else {
            steps[mid]
        })
    }

    /// Evaluate the curve at `depth` by linear interpolation between the two
    /// bracketing samples. Returns `None` outside the sampled range or when a
    /// bracketing sample is absent. A sample within tolerance of `depth` is
    /// returned as-is.
    pub fn value_at(&self, depth: f64) -> Option<f64> {
        let idx = self
            .depths
            .partition_point(|&d| d < depth - DEPTH_EPSILON_FT);
        if idx < self.depths.len() && (self.depths[idx] - depth).abs() <= DEPTH_EPSILON_FT {
            return self.values[idx];
        }
        if idx == 0 || idx >= self.depths.len() {
            return None;
        }
        let (d0, d1) = (self.depths[idx - 1], self.depths[idx]);
        let (v0, v1) = (self.values[idx - 1]?, self.values[idx]?);
        let t = (depth - d0) / (d1 - d0);
        Some(v0 + (v1 - v0) * t)
    }

    /// Value of the nearest non-null sample within `max_dist`, restricted to
    /// the sampled range. Used for categorical curves.
    pub fn nearest_value(&self, depth: f64, max_dist: f64) -> Option<f64> {
        let extent = self.extent()?;
        if !extent.contains(depth) {
            return None;
        }
        let idx = self.depths.partition_point(|&d| d < depth);
        let mut best: Option<(f64, f64)> = None;
        let mut consider = |i: usize| {
            if let Some(v) = self.values[i] {
                let dist = (self.depths[i] - depth).abs();
                if dist <= max_dist + DEPTH_EPSILON_FT && best.map_or(true, |(bd, _)| dist < bd) {
                    best = Some((dist, v));
                }
            }
        };
        // Walk outward from the insertion point until beyond max_dist.
        let mut left = idx;
        while left > 0 && depth - self.depths[left - 1] <= max_dist + DEPTH_EPSILON_FT {
            left -= 1;
            consider(left);
            if self.values[left].is_some() {
                break;
            }
        }
        let mut right = idx;
        while right < self.depths.len()
            && self.depths[right] - depth <= max_dist + DEPTH_EPSILON_FT
        {
            consider(right);
            if self.values[right].is_some() {
                break;
            }
            right += 1;
        }
        best.map(|(_, v)| v)
    }

    /// Copy with every depth multiplied by `factor` (unit conversion).
    pub fn scaled_depths(&self, factor: f64) -> Self {
        Self {
            curve_type: self.curve_type.clone(),
            unit: self.unit.clone(),
            depths: self.depths.iter().map(|d| d * factor).collect(),
            values: self.values.clone(),
        }
    }

    /// Copy with replaced values (same depths). Lengths must match.
    pub(crate) fn with_values(&self, values: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(values.len(), self.depths.len());
        Self {
            curve_type: self.curve_type.clone(),
            unit: self.unit.clone(),
            depths: self.depths.clone(),
            values,
        }
    }
}

// ============================================================================
// Well Dataset
// ============================================================================

/// One loaded source file.
#[derive(Debug, Clone, PartialEq)]
pub struct WellDataset {
    id: String,
    well_id: String,
    depth_unit: DepthUnit,
    curves: BTreeMap<CurveType, LogCurve>,
}

impl WellDataset {
    pub fn new(id: impl Into<String>, well_id: impl Into<String>, depth_unit: DepthUnit) -> Self {
        Self {
            id: id.into(),
            well_id: well_id.into(),
            depth_unit,
            curves: BTreeMap::new(),
        }
    }

    /// Build from curves of distinct types. A later curve of the same type
    /// replaces an earlier one.
    pub(crate) fn from_curves(
        id: impl Into<String>,
        well_id: impl Into<String>,
        depth_unit: DepthUnit,
        curves: impl IntoIterator<Item = LogCurve>,
    ) -> Self {
        Self {
            id: id.into(),
            well_id: well_id.into(),
            depth_unit,
            curves: curves
                .into_iter()
                .map(|c| (c.curve_type().clone(), c))
                .collect(),
        }
    }

    /// Add a curve while building the dataset. At most one per curve type.
    pub fn with_curve(mut self, curve: LogCurve) -> Result<Self, DatasetError> {
        if self.curves.contains_key(curve.curve_type()) {
            return Err(DatasetError::DuplicateCurve {
                dataset: self.id.clone(),
                curve: curve.curve_type().to_string(),
            });
        }
        self.curves.insert(curve.curve_type().clone(), curve);
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn well_id(&self) -> &str {
        &self.well_id
    }

    pub fn depth_unit(&self) -> DepthUnit {
        self.depth_unit
    }

    pub fn curve(&self, curve_type: &CurveType) -> Option<&LogCurve> {
        self.curves.get(curve_type)
    }

    pub fn curves(&self) -> impl Iterator<Item = &LogCurve> {
        self.curves.values()
    }

    pub fn curve_types(&self) -> impl Iterator<Item = &CurveType> {
        self.curves.keys()
    }

    pub fn curve_count(&self) -> usize {
        self.curves.len()
    }

    /// Union of all curve extents.
    pub fn extent(&self) -> Option<DepthRange> {
        self.curves
            .values()
            .filter_map(LogCurve::extent)
            .reduce(|a, b| DepthRange::new(a.top.min(b.top), a.base.max(b.base)))
    }

    /// Copy of the dataset with depths expressed in feet.
    pub fn to_feet(&self) -> Self {
        let factor = self.depth_unit.to_feet_factor();
        Self {
            id: self.id.clone(),
            well_id: self.well_id.clone(),
            depth_unit: DepthUnit::Feet,
            curves: self
                .curves
                .iter()
                .map(|(t, c)| (t.clone(), c.scaled_depths(factor)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gr(samples: &[(f64, Option<f64>)]) -> LogCurve {
        LogCurve::from_samples(CurveType::Gr, "GAPI", samples.iter().copied()).unwrap()
    }

    #[test]
    fn test_rejects_non_increasing_depths() {
        let err = LogCurve::from_samples(
            CurveType::Gr,
            "GAPI",
            [(100.0, Some(1.0)), (100.0, Some(2.0))],
        )
        .unwrap_err();
        assert!(matches!(err, CurveError::NonIncreasingDepth { index: 1, .. }));
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let err =
            LogCurve::new(CurveType::Gr, "GAPI", vec![1.0, 2.0], vec![Some(1.0)]).unwrap_err();
        assert!(matches!(err, CurveError::LengthMismatch { .. }));
    }

    #[test]
    fn test_nan_values_become_absent() {
        let c = gr(&[(1.0, Some(f64::NAN)), (2.0, Some(3.0))]);
        assert_eq!(c.values(), &[None, Some(3.0)]);
        assert_eq!(c.null_count(), 1);
        assert!((c.completeness() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_value_at_interpolates_and_never_extrapolates() {
        let c = gr(&[(100.0, Some(10.0)), (101.0, Some(20.0)), (102.0, None)]);
        assert_eq!(c.value_at(100.0), Some(10.0));
        assert!((c.value_at(100.25).unwrap() - 12.5).abs() < 1e-9);
        assert_eq!(c.value_at(101.5), None);
        assert_eq!(c.value_at(99.9), None);
        assert_eq!(c.value_at(102.1), None);
    }

    #[test]
    fn test_nearest_value_respects_max_distance() {
        let c = gr(&[(100.0, Some(1.0)), (101.0, None), (102.0, None), (103.0, Some(3.0))]);
        assert_eq!(c.nearest_value(100.4, 1.0), Some(1.0));
        assert_eq!(c.nearest_value(102.8, 1.0), Some(3.0));
        assert_eq!(c.nearest_value(101.5, 1.0), None);
        assert_eq!(c.nearest_value(104.0, 5.0), None);
    }

    #[test]
    fn test_native_step_is_median() {
        let c = gr(&[(0.0, None), (0.5, None), (1.0, None), (3.0, None)]);
        assert_eq!(c.native_step(), Some(0.5));
    }

    #[test]
    fn test_dataset_rejects_duplicate_curve_type() {
        let ds = WellDataset::new("a.las", "WELL-A", DepthUnit::Feet)
            .with_curve(gr(&[(1.0, Some(1.0))]))
            .unwrap();
        let err = ds.with_curve(gr(&[(2.0, Some(1.0))])).unwrap_err();
        assert_eq!(
            err,
            DatasetError::DuplicateCurve {
                dataset: "a.las".to_string(),
                curve: "GR".to_string()
            }
        );
    }

    #[test]
    fn test_to_feet_converts_meters() {
        let ds = WellDataset::new("a.las", "WELL-A", DepthUnit::Meters)
            .with_curve(gr(&[(100.0, Some(1.0)), (200.0, Some(2.0))]))
            .unwrap()
            .to_feet();
        assert_eq!(ds.depth_unit(), DepthUnit::Feet);
        let extent = ds.extent().unwrap();
        assert!((extent.top - 328.084).abs() < 1e-9);
        assert!((extent.base - 656.168).abs() < 1e-9);
    }

    #[test]
    fn test_depth_unit_parse() {
        assert_eq!(DepthUnit::parse("ft"), Some(DepthUnit::Feet));
        assert_eq!(DepthUnit::parse("M"), Some(DepthUnit::Meters));
        assert_eq!(DepthUnit::parse("s"), None);
    }
}
