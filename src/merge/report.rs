//! Merge output: the merged dataset with per-sample provenance, and the
//! serializable report describing how it was assembled.

use serde::Serialize;
use std::collections::BTreeMap;

use super::gaps::UnfilledGap;
use super::grid::DepthGrid;
use super::quality::QualityScore;
use crate::curves::CurveType;
use crate::types::{DepthRange, DepthUnit, LogCurve, WellDataset};

// ============================================================================
// Provenance
// ============================================================================

/// Where a single merged sample came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOrigin {
    /// Index of the source dataset in the merge input
    Dataset(usize),
    /// Filled by gap interpolation
    Interpolated,
}

/// Source of a contiguous provenance span, as it appears in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "dataset_id", rename_all = "snake_case")]
pub enum SpanSource {
    Dataset(String),
    Interpolated,
}

/// Consecutive grid samples sharing one origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvenanceSpan {
    pub range: DepthRange,
    pub source: SpanSource,
    pub samples: usize,
}

/// Collapse per-sample origins into spans. Null samples break spans and are
/// not reported.
pub(crate) fn provenance_spans(
    grid: &DepthGrid,
    origins: &[Option<SampleOrigin>],
    dataset_ids: &[String],
) -> Vec<ProvenanceSpan> {
    let mut spans: Vec<ProvenanceSpan> = Vec::new();
    let mut current: Option<(SampleOrigin, usize)> = None;

    let close = |origin: SampleOrigin, start: usize, end: usize, spans: &mut Vec<ProvenanceSpan>| {
        let source = match origin {
            SampleOrigin::Dataset(i) => {
                SpanSource::Dataset(dataset_ids.get(i).cloned().unwrap_or_default())
            }
            SampleOrigin::Interpolated => SpanSource::Interpolated,
        };
        spans.push(ProvenanceSpan {
            range: DepthRange::new(grid.depth(start), grid.depth(end)),
            source,
            samples: end - start + 1,
        });
    };

    for (i, origin) in origins.iter().enumerate() {
        match (current, origin) {
            (Some((cur, _)), Some(o)) if cur == *o => {}
            (Some((cur, start)), next) => {
                close(cur, start, i - 1, &mut spans);
                current = next.map(|o| (o, i));
            }
            (None, next) => current = next.map(|o| (o, i)),
        }
    }
    if let Some((cur, start)) = current {
        close(cur, start, origins.len() - 1, &mut spans);
    }
    spans
}

// ============================================================================
// Merged Dataset
// ============================================================================

/// One merged curve on the common grid.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedCurve {
    pub curve: LogCurve,
    /// Origin of each grid sample, `None` where the merged value is null
    pub origins: Vec<Option<SampleOrigin>>,
    pub provenance: Vec<ProvenanceSpan>,
}

/// Result of a merge: one curve per type on a uniform grid in feet.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedDataset {
    pub well_id: String,
    pub grid: DepthGrid,
    /// Input dataset ids, in input order
    pub dataset_ids: Vec<String>,
    pub curves: BTreeMap<CurveType, MergedCurve>,
}

impl MergedDataset {
    pub fn curve(&self, curve_type: &CurveType) -> Option<&MergedCurve> {
        self.curves.get(curve_type)
    }

    /// Depth-indexed view for export or re-merging.
    pub fn to_well_dataset(&self, id: impl Into<String>) -> WellDataset {
        WellDataset::from_curves(
            id,
            self.well_id.clone(),
            DepthUnit::Feet,
            self.curves.values().map(|m| m.curve.clone()),
        )
    }
}

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub dataset_id: String,
    pub score: QualityScore,
    pub native_step_ft: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveMergeReport {
    pub curve_type: CurveType,
    pub unit: String,
    /// Highest-ranked source
    pub primary_source: String,
    /// All candidates, best first
    pub rankings: Vec<RankingEntry>,
    pub provenance: Vec<ProvenanceSpan>,
    pub null_samples: usize,
    /// Fraction of grid samples with a value
    pub coverage: f64,
    pub filled_gaps: Vec<DepthRange>,
    pub unfilled_gaps: Vec<UnfilledGap>,
    /// Samples outside the registry's plausibility range
    pub out_of_range_samples: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridSummary {
    pub top: f64,
    pub base: f64,
    pub step: f64,
    pub points: usize,
}

impl From<&DepthGrid> for GridSummary {
    fn from(grid: &DepthGrid) -> Self {
        Self {
            top: grid.start(),
            base: grid.base(),
            step: grid.step(),
            points: grid.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeReport {
    pub well_id: String,
    pub datasets: Vec<String>,
    pub grid: GridSummary,
    pub target_step_ft: f64,
    pub max_gap_ft: f64,
    pub curves: Vec<CurveMergeReport>,
    pub warnings: Vec<String>,
}

impl MergeReport {
    pub fn curve(&self, curve_type: &CurveType) -> Option<&CurveMergeReport> {
        self.curves.iter().find(|c| &c.curve_type == curve_type)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Everything a merge produces.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub dataset: MergedDataset,
    pub report: MergeReport,
}
