//! Best-source selection per curve type.
//!
//! Candidates are ranked by quality score (descending), then by finer native
//! sampling, then by input order. Each grid position takes its value from the
//! highest-ranked candidate that has a non-null sample there, so a lower-ranked
//! file only contributes where every better file is missing data.

use serde::Serialize;
use std::cmp::Ordering;

use super::grid::{resample_onto, DepthGrid};
use super::quality::{QualityScore, QualityScorer};
use crate::curves::CurveType;
use crate::types::{LogCurve, WellDataset};

/// One candidate source for a curve type, in ranking order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRanking {
    /// Position of the dataset in the merge input
    #[serde(skip)]
    pub dataset_index: usize,
    pub dataset_id: String,
    pub score: QualityScore,
    /// Median native depth step (ft), if the curve has two or more samples
    pub native_step: Option<f64>,
}

fn compare_rankings(a: &SourceRanking, b: &SourceRanking) -> Ordering {
    b.score
        .value
        .total_cmp(&a.score.value)
        .then_with(|| {
            let sa = a.native_step.unwrap_or(f64::INFINITY);
            let sb = b.native_step.unwrap_or(f64::INFINITY);
            sa.total_cmp(&sb)
        })
        .then_with(|| a.dataset_index.cmp(&b.dataset_index))
}

/// Output of [`select_best_curve`](super::select_best_curve).
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedCurve {
    /// Curve resampled onto the merge grid
    pub curve: LogCurve,
    /// Dataset index supplying each grid sample (`None` where nothing did)
    pub sources: Vec<Option<usize>>,
    /// Candidates, best first
    pub ranking: Vec<SourceRanking>,
}

/// Score every dataset holding `curve_type` against the others it overlaps,
/// and sort best first.
pub(crate) fn rank_sources(
    curve_type: &CurveType,
    datasets: &[WellDataset],
    scorer: &QualityScorer,
) -> Vec<SourceRanking> {
    let candidates: Vec<(usize, &WellDataset, &LogCurve)> = datasets
        .iter()
        .enumerate()
        .filter_map(|(i, ds)| ds.curve(curve_type).map(|c| (i, ds, c)))
        .collect();

    let mut ranking: Vec<SourceRanking> = candidates
        .iter()
        .map(|&(index, ds, curve)| {
            let overlapping: Vec<&LogCurve> = match curve.extent() {
                Some(extent) => candidates
                    .iter()
                    .filter(|(j, _, other)| {
                        *j != index && other.extent().is_some_and(|e| e.overlaps(&extent))
                    })
                    .map(|(_, _, other)| *other)
                    .collect(),
                None => Vec::new(),
            };
            SourceRanking {
                dataset_index: index,
                dataset_id: ds.id().to_string(),
                score: scorer.score(curve, &overlapping),
                native_step: curve.native_step(),
            }
        })
        .collect();

    ranking.sort_by(compare_rankings);
    ranking
}

/// Build the merged curve for `curve_type` on `grid`. Returns `None` when no
/// dataset carries the type.
pub(crate) fn select_on_grid(
    curve_type: &CurveType,
    datasets: &[WellDataset],
    grid: &DepthGrid,
    scorer: &QualityScorer,
    discrete: bool,
    fallback_unit: &str,
) -> Option<SelectedCurve> {
    let ranking = rank_sources(curve_type, datasets, scorer);
    let primary = ranking.first()?;

    let resampled: Vec<Vec<Option<f64>>> = ranking
        .iter()
        .map(|r| {
            datasets[r.dataset_index]
                .curve(curve_type)
                .map_or_else(|| vec![None; grid.len()], |c| resample_onto(c, grid, discrete))
        })
        .collect();

    let mut values = Vec::with_capacity(grid.len());
    let mut sources = Vec::with_capacity(grid.len());
    for i in 0..grid.len() {
        let pick = ranking
            .iter()
            .zip(&resampled)
            .find_map(|(r, vals)| vals[i].map(|v| (r.dataset_index, v)));
        values.push(pick.map(|(_, v)| v));
        sources.push(pick.map(|(idx, _)| idx));
    }

    let unit = datasets[primary.dataset_index]
        .curve(curve_type)
        .map(LogCurve::unit)
        .filter(|u| !u.is_empty())
        .unwrap_or(fallback_unit)
        .to_string();

    Some(SelectedCurve {
        curve: LogCurve::from_grid(curve_type.clone(), unit, grid.depths(), values),
        sources,
        ranking,
    })
}
