//! Gap interpolation on resampled curves.
//!
//! A gap is a maximal run of consecutive null samples. A run bounded on both
//! sides by valid samples no further apart than `max_gap` is filled by linear
//! interpolation; anything else stays null and is reported.

use serde::Serialize;

use super::{validate_max_gap, MergeError};
use crate::config::defaults::DEPTH_EPSILON_FT;
use crate::types::{DepthRange, LogCurve};

/// Inclusive index range of a null run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NullRun {
    pub start: usize,
    pub end: usize,
}

impl NullRun {
    pub const fn len(&self) -> usize {
        self.end - self.start + 1
    }
}

/// All maximal runs of `None` in `values`.
pub(crate) fn null_runs(values: &[Option<f64>]) -> Vec<NullRun> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, v) in values.iter().enumerate() {
        match (v, start) {
            (None, None) => start = Some(i),
            (Some(_), Some(s)) => {
                runs.push(NullRun { start: s, end: i - 1 });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(NullRun {
            start: s,
            end: values.len() - 1,
        });
    }
    runs
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GapReason {
    /// Bounding samples are further apart than `max_gap`
    TooLong,
    /// Run touches the top or base of the curve
    OpenEnded,
    /// Categorical curves are never interpolated
    DiscreteCurve,
}

/// A null run left in the output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnfilledGap {
    /// Depths of the first and last null sample
    pub range: DepthRange,
    pub samples: usize,
    pub reason: GapReason,
}

/// Result of [`interpolate_gaps`].
#[derive(Debug, Clone, PartialEq)]
pub struct GapFill {
    pub curve: LogCurve,
    /// Depth ranges (first to last filled sample) that were interpolated
    pub filled: Vec<DepthRange>,
    pub unfilled: Vec<UnfilledGap>,
}

fn run_range(curve: &LogCurve, run: NullRun) -> DepthRange {
    DepthRange::new(curve.depths()[run.start], curve.depths()[run.end])
}

/// Fill every null run whose bounding valid samples lie within `max_gap` of
/// each other. Idempotent: a second call with the same `max_gap` changes
/// nothing.
pub fn interpolate_gaps(curve: &LogCurve, max_gap: f64) -> Result<GapFill, MergeError> {
    validate_max_gap(max_gap)?;
    Ok(fill_gaps(curve, max_gap))
}

pub(crate) fn fill_gaps(curve: &LogCurve, max_gap: f64) -> GapFill {
    let depths = curve.depths();
    let mut values = curve.values().to_vec();
    let mut filled = Vec::new();
    let mut unfilled = Vec::new();

    for run in null_runs(curve.values()) {
        let range = run_range(curve, run);
        if run.start == 0 || run.end + 1 >= values.len() {
            unfilled.push(UnfilledGap {
                range,
                samples: run.len(),
                reason: GapReason::OpenEnded,
            });
            continue;
        }

        let (left, right) = (run.start - 1, run.end + 1);
        let span = depths[right] - depths[left];
        if span > max_gap + DEPTH_EPSILON_FT {
            unfilled.push(UnfilledGap {
                range,
                samples: run.len(),
                reason: GapReason::TooLong,
            });
            continue;
        }

        // Maximal runs are bounded by valid samples on both sides.
        let (Some(v0), Some(v1)) = (values[left], values[right]) else {
            continue;
        };
        for i in run.start..=run.end {
            let t = (depths[i] - depths[left]) / span;
            values[i] = Some(v0 + (v1 - v0) * t);
        }
        filled.push(range);
    }

    GapFill {
        curve: curve.with_values(values),
        filled,
        unfilled,
    }
}

/// Report every null run as unfilled without touching the curve. Runs at
/// either end are reported as [`GapReason::OpenEnded`], the rest as `reason`.
pub(crate) fn leave_gaps(curve: &LogCurve, reason: GapReason) -> GapFill {
    let len = curve.len();
    let unfilled = null_runs(curve.values())
        .into_iter()
        .map(|run| UnfilledGap {
            range: run_range(curve, run),
            samples: run.len(),
            reason: if run.start == 0 || run.end + 1 >= len {
                GapReason::OpenEnded
            } else {
                reason
            },
        })
        .collect();
    GapFill {
        curve: curve.clone(),
        filled: Vec::new(),
        unfilled,
    }
}
