//! Uniform depth grid and resampling.
//!
//! A [`DepthGrid`] is defined by `start`, `step` and `len`; every depth is
//! computed as `start + i * step`, so spacing is uniform by construction and
//! never accumulates float drift.

use serde::Serialize;

use super::{validate_target_step, MergeError};
use crate::config::defaults::{DEPTH_EPSILON_FT, DISCRETE_MIN_SEARCH_FT, MAX_GRID_POINTS};
use crate::types::{DepthRange, LogCurve};

/// Slack (in grid-index units) applied before floor/ceil so a boundary that
/// sits on a grid line after unit conversion is not pushed one step outward.
const GRID_SNAP: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DepthGrid {
    start: f64,
    step: f64,
    len: usize,
}

impl DepthGrid {
    /// Grid of `step` covering `range`, with both ends snapped outward to
    /// multiples of `step`. `step` must be positive. Fails when the grid
    /// would exceed [`MAX_GRID_POINTS`].
    pub fn covering(range: DepthRange, step: f64) -> Result<Self, MergeError> {
        debug_assert!(step > 0.0);
        let first = (range.top / step + GRID_SNAP).floor();
        let last = (range.base / step - GRID_SNAP).ceil().max(first);
        let span = (last - first).round();
        if !span.is_finite() || span >= f64::from(MAX_GRID_POINTS) {
            return Err(MergeError::GridTooLarge {
                top: range.top,
                base: range.base,
                step,
                max: MAX_GRID_POINTS,
            });
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let len = span as usize + 1;
        Ok(Self {
            start: first * step,
            step,
            len,
        })
    }

    pub const fn start(&self) -> f64 {
        self.start
    }

    pub const fn step(&self) -> f64 {
        self.step
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Depth of grid point `i`.
    pub fn depth(&self, i: usize) -> f64 {
        self.start + i as f64 * self.step
    }

    pub fn base(&self) -> f64 {
        self.depth(self.len.saturating_sub(1))
    }

    pub fn range(&self) -> DepthRange {
        DepthRange::new(self.start, self.base())
    }

    pub fn depths(&self) -> Vec<f64> {
        (0..self.len).map(|i| self.depth(i)).collect()
    }

    /// Index of the grid point at `depth`, if `depth` lies on the grid.
    pub fn index_of(&self, depth: f64) -> Option<usize> {
        let pos = (depth - self.start) / self.step;
        let idx = pos.round();
        if idx < 0.0 || (pos - idx).abs() * self.step > DEPTH_EPSILON_FT * 10.0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let idx = idx as usize;
        (idx < self.len).then_some(idx)
    }
}

/// Nearest-neighbour search radius for discrete curves on a grid of `step`.
pub(crate) fn discrete_search_distance(step: f64) -> f64 {
    DISCRETE_MIN_SEARCH_FT.max(2.0 * step)
}

/// Evaluate `curve` at every grid point. Continuous curves interpolate
/// linearly; discrete curves take the nearest valid sample. Positions outside
/// the curve's sampled range are always `None`.
pub(crate) fn resample_onto(
    curve: &LogCurve,
    grid: &DepthGrid,
    discrete: bool,
) -> Vec<Option<f64>> {
    let Some(extent) = curve.extent() else {
        return vec![None; grid.len()];
    };
    let max_dist = discrete_search_distance(grid.step());
    (0..grid.len())
        .map(|i| {
            let depth = grid.depth(i);
            if !extent.contains(depth) {
                None
            } else if discrete {
                curve.nearest_value(depth, max_dist)
            } else {
                curve.value_at(depth)
            }
        })
        .collect()
}

/// Resample a continuous curve onto a uniform grid of `target_step` covering
/// its own depth range. Never extrapolates: grid points outside the sampled
/// range are null.
pub fn resample(curve: &LogCurve, target_step: f64) -> Result<LogCurve, MergeError> {
    resample_with(curve, target_step, false)
}

/// [`resample`] with an explicit discrete flag.
pub fn resample_with(
    curve: &LogCurve,
    target_step: f64,
    discrete: bool,
) -> Result<LogCurve, MergeError> {
    validate_target_step(target_step)?;
    let Some(extent) = curve.extent() else {
        return Ok(LogCurve::from_grid(
            curve.curve_type().clone(),
            curve.unit(),
            Vec::new(),
            Vec::new(),
        ));
    };
    let grid = DepthGrid::covering(extent, target_step)?;
    let values = resample_onto(curve, &grid, discrete);
    Ok(LogCurve::from_grid(
        curve.curve_type().clone(),
        curve.unit(),
        grid.depths(),
        values,
    ))
}
