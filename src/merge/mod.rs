//! Curve Merge Engine
//!
//! Combines several log datasets of one well into a single dataset on a
//! uniform depth grid, choosing per depth the best available source for each
//! curve type.
//!
//! # Pipeline
//!
//! ```text
//! validate params -> validate well -> convert to feet -> build grid
//!     -> per curve type: rank sources -> resample & select -> fill gaps
//!     -> MergedDataset + MergeReport
//! ```
//!
//! The engine is pure: it reads immutable [`WellDataset`]s and returns a fresh
//! [`MergeOutcome`]. Any error aborts the whole merge; there are no partial
//! results.

mod gaps;
mod grid;
mod quality;
mod report;
mod selection;

pub use gaps::{interpolate_gaps, GapFill, GapReason, UnfilledGap};
pub use grid::{resample, resample_with, DepthGrid};
pub use quality::{score_curve, QualityScore, QualityScorer};
pub use report::{
    CurveMergeReport, GridSummary, MergeOutcome, MergeReport, MergedCurve, MergedDataset,
    ProvenanceSpan, RankingEntry, SampleOrigin, SpanSource,
};
pub use selection::{SelectedCurve, SourceRanking};

use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::defaults::{
    DEFAULT_MAX_GAP_FT, DEFAULT_TARGET_STEP_FT, MAX_MAX_GAP_FT, MAX_TARGET_STEP_FT,
    MIN_MAX_GAP_FT, MIN_TARGET_STEP_FT,
};
use crate::config::validation::validate_physical_ranges;
use crate::config::{ConfigError, MergeConfig};
use crate::curves::{CurveRegistry, CurveType};
use crate::types::{DepthRange, DepthUnit, LogCurve, WellDataset};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum MergeError {
    #[error(
        "dataset '{found_dataset}' belongs to well '{found}', \
         but dataset '{expected_dataset}' belongs to well '{expected}'"
    )]
    WellMismatch {
        expected_dataset: String,
        expected: String,
        found_dataset: String,
        found: String,
    },

    #[error("at least one dataset is required")]
    InsufficientData,

    #[error("target step {value} ft is outside {min}-{max} ft")]
    InvalidStep { value: f64, min: f64, max: f64 },

    #[error("max gap {value} ft is outside {min}-{max} ft")]
    InvalidGap { value: f64, min: f64, max: f64 },

    #[error("datasets contain no depth samples: {datasets}")]
    NoSamples { datasets: String },

    #[error("depth range {top}-{base} ft at {step} ft needs more than {max} grid points")]
    GridTooLarge {
        top: f64,
        base: f64,
        step: f64,
        max: u32,
    },
}

pub(crate) fn validate_target_step(value: f64) -> Result<(), MergeError> {
    // NaN fails the range check
    if !(MIN_TARGET_STEP_FT..=MAX_TARGET_STEP_FT).contains(&value) {
        return Err(MergeError::InvalidStep {
            value,
            min: MIN_TARGET_STEP_FT,
            max: MAX_TARGET_STEP_FT,
        });
    }
    Ok(())
}

pub(crate) fn validate_max_gap(value: f64) -> Result<(), MergeError> {
    if !(MIN_MAX_GAP_FT..=MAX_MAX_GAP_FT).contains(&value) {
        return Err(MergeError::InvalidGap {
            value,
            min: MIN_MAX_GAP_FT,
            max: MAX_MAX_GAP_FT,
        });
    }
    Ok(())
}

/// Check that every dataset belongs to the same well (case-insensitive).
/// Returns the well id of the first dataset.
pub fn validate_same_well(datasets: &[WellDataset]) -> Result<&str, MergeError> {
    let Some(first) = datasets.first() else {
        return Err(MergeError::InsufficientData);
    };
    let expected = first.well_id().to_lowercase();
    if let Some(other) = datasets
        .iter()
        .find(|ds| ds.well_id().to_lowercase() != expected)
    {
        return Err(MergeError::WellMismatch {
            expected_dataset: first.id().to_string(),
            expected: first.well_id().to_string(),
            found_dataset: other.id().to_string(),
            found: other.well_id().to_string(),
        });
    }
    Ok(first.well_id())
}

fn union_extent<'a>(curves: impl Iterator<Item = &'a LogCurve>) -> Option<DepthRange> {
    curves
        .filter_map(LogCurve::extent)
        .reduce(|a, b| DepthRange::new(a.top.min(b.top), a.base.max(b.base)))
}

fn dataset_ids(datasets: &[WellDataset]) -> Vec<String> {
    datasets.iter().map(|ds| ds.id().to_string()).collect()
}

// ============================================================================
// Engine
// ============================================================================

/// Merge engine with a fixed curve registry and quality weights.
#[derive(Debug, Clone)]
pub struct MergeEngine {
    scorer: QualityScorer,
    registry: CurveRegistry,
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new(QualityScorer::default(), CurveRegistry::standard())
    }
}

impl MergeEngine {
    pub const fn new(scorer: QualityScorer, registry: CurveRegistry) -> Self {
        Self { scorer, registry }
    }

    /// Engine using the config's quality weights and custom curve tags.
    /// Fails on the same range errors as [`MergeConfig::validate`].
    pub fn from_config(config: &MergeConfig) -> Result<Self, ConfigError> {
        let (errors, _) = validate_physical_ranges(config);
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }
        let registry = CurveRegistry::with_custom(&config.curves.custom)?;
        Ok(Self::new(QualityScorer::new(config.quality.clone()), registry))
    }

    pub const fn registry(&self) -> &CurveRegistry {
        &self.registry
    }

    pub const fn scorer(&self) -> &QualityScorer {
        &self.scorer
    }

    /// Score `curve` against overlapping curves of the same type.
    pub fn score_curve(&self, curve: &LogCurve, overlapping: &[&LogCurve]) -> QualityScore {
        self.scorer.score(curve, overlapping)
    }

    /// Best-source composite for one curve type, on a grid of `target_step`
    /// covering every candidate's extent (in feet). `Ok(None)` when no
    /// dataset carries a sampled curve of that type.
    pub fn select_best_curve(
        &self,
        curve_type: &CurveType,
        datasets: &[WellDataset],
        target_step: f64,
    ) -> Result<Option<SelectedCurve>, MergeError> {
        validate_target_step(target_step)?;
        let feet: Vec<WellDataset> = datasets.iter().map(WellDataset::to_feet).collect();
        let Some(extent) = union_extent(feet.iter().filter_map(|ds| ds.curve(curve_type)))
        else {
            return Ok(None);
        };
        let grid = DepthGrid::covering(extent, target_step)?;
        Ok(selection::select_on_grid(
            curve_type,
            &feet,
            &grid,
            &self.scorer,
            self.registry.is_discrete(curve_type),
            self.registry.unit(curve_type),
        ))
    }

    /// Resample using the registry's discrete flag for the curve's type.
    pub fn resample(&self, curve: &LogCurve, target_step: f64) -> Result<LogCurve, MergeError> {
        resample_with(curve, target_step, self.registry.is_discrete(curve.curve_type()))
    }

    /// Gap-fill, leaving discrete curves untouched.
    pub fn interpolate_gaps(&self, curve: &LogCurve, max_gap: f64) -> Result<GapFill, MergeError> {
        validate_max_gap(max_gap)?;
        if self.registry.is_discrete(curve.curve_type()) {
            Ok(gaps::leave_gaps(curve, GapReason::DiscreteCurve))
        } else {
            Ok(gaps::fill_gaps(curve, max_gap))
        }
    }

    /// Merge `datasets` of one well onto a uniform grid of `target_step` ft,
    /// filling null runs up to `max_gap` ft.
    pub fn merge(
        &self,
        datasets: &[WellDataset],
        target_step: f64,
        max_gap: f64,
    ) -> Result<MergeOutcome, MergeError> {
        validate_target_step(target_step)?;
        validate_max_gap(max_gap)?;
        let well_id = validate_same_well(datasets)?.to_string();
        let ids = dataset_ids(datasets);

        let mut warnings = Vec::new();
        for ds in datasets.iter().filter(|ds| ds.depth_unit() == DepthUnit::Meters) {
            warnings.push(format!("{}: depths converted from meters to feet", ds.id()));
        }

        let feet: Vec<WellDataset> = datasets.iter().map(WellDataset::to_feet).collect();
        let extent = union_extent(feet.iter().flat_map(|ds| ds.curves())).ok_or_else(|| {
            MergeError::NoSamples {
                datasets: ids.join(", "),
            }
        })?;
        let grid = DepthGrid::covering(extent, target_step)?;

        let curve_types: BTreeSet<CurveType> = feet
            .iter()
            .flat_map(|ds| ds.curve_types().cloned())
            .collect();

        info!(
            well = %well_id,
            datasets = datasets.len(),
            curve_types = curve_types.len(),
            top = grid.start(),
            base = grid.base(),
            points = grid.len(),
            "Merging datasets"
        );

        let mut curves = BTreeMap::new();
        let mut curve_reports = Vec::with_capacity(curve_types.len());
        for curve_type in &curve_types {
            let discrete = self.registry.is_discrete(curve_type);
            let Some(selected) = selection::select_on_grid(
                curve_type,
                &feet,
                &grid,
                &self.scorer,
                discrete,
                self.registry.unit(curve_type),
            ) else {
                continue;
            };

            warnings.extend(unit_mismatch_warning(curve_type, &feet, &selected));

            let fill = if discrete {
                gaps::leave_gaps(&selected.curve, GapReason::DiscreteCurve)
            } else {
                gaps::fill_gaps(&selected.curve, max_gap)
            };

            let origins: Vec<Option<SampleOrigin>> = selected
                .sources
                .iter()
                .zip(fill.curve.values())
                .map(|(src, v)| match (src, v) {
                    (Some(i), _) => Some(SampleOrigin::Dataset(*i)),
                    (None, Some(_)) => Some(SampleOrigin::Interpolated),
                    (None, None) => None,
                })
                .collect();
            let provenance = report::provenance_spans(&grid, &origins, &ids);

            let out_of_range = self.registry.spec(curve_type).map_or(0, |spec| {
                fill.curve
                    .values()
                    .iter()
                    .flatten()
                    .filter(|v| !spec.in_range(**v))
                    .count()
            });
            if out_of_range > 0 {
                warn!(
                    curve = %curve_type,
                    samples = out_of_range,
                    "Merged values outside plausible range"
                );
                warnings.push(format!(
                    "{curve_type}: {out_of_range} samples outside plausible range"
                ));
            }

            let null_samples = fill.curve.null_count();
            let coverage = if grid.is_empty() {
                0.0
            } else {
                1.0 - null_samples as f64 / grid.len() as f64
            };

            debug!(
                curve = %curve_type,
                primary = %selected.ranking[0].dataset_id,
                filled = fill.filled.len(),
                unfilled = fill.unfilled.len(),
                coverage,
                "Curve merged"
            );

            curve_reports.push(CurveMergeReport {
                curve_type: curve_type.clone(),
                unit: fill.curve.unit().to_string(),
                primary_source: selected.ranking[0].dataset_id.clone(),
                rankings: selected
                    .ranking
                    .iter()
                    .map(|r| RankingEntry {
                        dataset_id: r.dataset_id.clone(),
                        score: r.score,
                        native_step_ft: r.native_step,
                    })
                    .collect(),
                provenance: provenance.clone(),
                null_samples,
                coverage,
                filled_gaps: fill.filled,
                unfilled_gaps: fill.unfilled,
                out_of_range_samples: out_of_range,
            });
            curves.insert(
                curve_type.clone(),
                MergedCurve {
                    curve: fill.curve,
                    origins,
                    provenance,
                },
            );
        }

        info!(well = %well_id, curves = curves.len(), warnings = warnings.len(), "Merge complete");

        let report = MergeReport {
            well_id: well_id.clone(),
            datasets: ids.clone(),
            grid: GridSummary::from(&grid),
            target_step_ft: target_step,
            max_gap_ft: max_gap,
            curves: curve_reports,
            warnings,
        };
        Ok(MergeOutcome {
            dataset: MergedDataset {
                well_id,
                grid,
                dataset_ids: ids,
                curves,
            },
            report,
        })
    }
}

/// Warn when candidate sources disagree on the unit of a curve type.
fn unit_mismatch_warning(
    curve_type: &CurveType,
    datasets: &[WellDataset],
    selected: &SelectedCurve,
) -> Option<String> {
    let primary_unit = selected.curve.unit();
    let others: Vec<String> = selected
        .ranking
        .iter()
        .filter_map(|r| {
            let unit = datasets[r.dataset_index].curve(curve_type)?.unit();
            (!unit.is_empty() && !unit.eq_ignore_ascii_case(primary_unit))
                .then(|| format!("{unit} in {}", r.dataset_id))
        })
        .collect();
    (!others.is_empty()).then(|| {
        format!(
            "{curve_type}: sources disagree on unit (merged as {primary_unit}; {})",
            others.join(", ")
        )
    })
}

// ============================================================================
// Convenience functions (default registry and weights)
// ============================================================================

/// Merge with the standard registry and default quality weights.
pub fn merge(
    datasets: &[WellDataset],
    target_step: f64,
    max_gap: f64,
) -> Result<MergeOutcome, MergeError> {
    MergeEngine::default().merge(datasets, target_step, max_gap)
}

/// Merge with [`DEFAULT_TARGET_STEP_FT`] and [`DEFAULT_MAX_GAP_FT`].
pub fn merge_with_defaults(datasets: &[WellDataset]) -> Result<MergeOutcome, MergeError> {
    merge(datasets, DEFAULT_TARGET_STEP_FT, DEFAULT_MAX_GAP_FT)
}

/// See [`MergeEngine::select_best_curve`].
pub fn select_best_curve(
    curve_type: &CurveType,
    datasets: &[WellDataset],
    target_step: f64,
) -> Result<Option<SelectedCurve>, MergeError> {
    MergeEngine::default().select_best_curve(curve_type, datasets, target_step)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gr_dataset(
        id: &str,
        well: &str,
        unit: DepthUnit,
        samples: Vec<(f64, Option<f64>)>,
    ) -> WellDataset {
        let curve = LogCurve::from_samples(CurveType::Gr, "GAPI", samples).unwrap();
        WellDataset::new(id, well, unit).with_curve(curve).unwrap()
    }

    fn flat(top: f64, base: f64, step: f64, value: f64) -> Vec<(f64, Option<f64>)> {
        let n = ((base - top) / step).round() as usize;
        (0..=n).map(|i| (top + i as f64 * step, Some(value))).collect()
    }

    #[test]
    fn test_validate_same_well() {
        let a = gr_dataset("a", "WELL-A", DepthUnit::Feet, flat(0.0, 1.0, 0.5, 1.0));
        let b = gr_dataset("b", "well-a", DepthUnit::Feet, flat(0.0, 1.0, 0.5, 1.0));
        let c = gr_dataset("c", "WELL-B", DepthUnit::Feet, flat(0.0, 1.0, 0.5, 1.0));

        assert_eq!(validate_same_well(&[]), Err(MergeError::InsufficientData));
        assert_eq!(validate_same_well(&[a.clone()]), Ok("WELL-A"));
        assert_eq!(validate_same_well(&[a.clone(), b]), Ok("WELL-A"));
        assert_eq!(
            validate_same_well(&[a, c]),
            Err(MergeError::WellMismatch {
                expected_dataset: "a".into(),
                expected: "WELL-A".into(),
                found_dataset: "c".into(),
                found: "WELL-B".into(),
            })
        );
    }

    #[test]
    fn test_parameters_validated_before_well() {
        let a = gr_dataset("a", "WELL-A", DepthUnit::Feet, flat(0.0, 1.0, 0.5, 1.0));
        let c = gr_dataset("c", "WELL-B", DepthUnit::Feet, flat(0.0, 1.0, 0.5, 1.0));
        assert!(matches!(
            merge(&[a.clone(), c.clone()], 0.05, 5.0),
            Err(MergeError::InvalidStep { .. })
        ));
        assert!(matches!(
            merge(&[a, c], 0.5, 0.5),
            Err(MergeError::InvalidGap { .. })
        ));
    }

    #[test]
    fn test_step_bounds_are_inclusive() {
        assert!(validate_target_step(0.1).is_ok());
        assert!(validate_target_step(1.0).is_ok());
        assert!(validate_max_gap(1.0).is_ok());
        assert!(validate_max_gap(50.0).is_ok());
        assert!(validate_max_gap(f64::NAN).is_err());
    }

    #[test]
    fn test_absurd_depth_extent_is_rejected() {
        let ds = gr_dataset(
            "a",
            "WELL-A",
            DepthUnit::Feet,
            vec![(0.0, Some(50.0)), (1e12, Some(60.0))],
        );
        assert!(matches!(
            merge(&[ds], 0.5, 5.0),
            Err(MergeError::GridTooLarge { .. })
        ));
    }

    #[test]
    fn test_no_samples() {
        let empty = WellDataset::new("empty", "WELL-A", DepthUnit::Feet);
        assert!(matches!(
            merge(&[empty], 0.5, 5.0),
            Err(MergeError::NoSamples { .. })
        ));
    }

    #[test]
    fn test_meters_converted_and_warned() {
        let ds = gr_dataset("m", "WELL-A", DepthUnit::Meters, flat(100.0, 110.0, 0.5, 60.0));
        let out = merge(&[ds], 0.5, 5.0).unwrap();
        let grid = out.dataset.grid;
        assert!(grid.start() <= 328.084 + 1e-9);
        assert!(grid.base() >= 360.892 - 1e-9);
        assert!(out.report.warnings.iter().any(|w| w.contains("meters")));
    }

    #[test]
    fn test_out_of_range_values_warn() {
        let ds = gr_dataset("a", "WELL-A", DepthUnit::Feet, flat(100.0, 105.0, 0.5, 500.0));
        let out = merge(&[ds], 0.5, 5.0).unwrap();
        let report = out.report.curve(&CurveType::Gr).unwrap();
        assert_eq!(report.out_of_range_samples, 11);
        assert!(out.report.warnings.iter().any(|w| w.contains("plausible range")));
    }

    #[test]
    fn test_interpolated_origins_marked() {
        let mut samples = flat(100.0, 110.0, 0.5, 50.0);
        for s in samples.iter_mut().skip(4).take(3) {
            s.1 = None;
        }
        let ds = gr_dataset("a", "WELL-A", DepthUnit::Feet, samples);
        let out = merge(&[ds], 0.5, 5.0).unwrap();
        let merged = out.dataset.curve(&CurveType::Gr).unwrap();
        assert_eq!(merged.curve.null_count(), 0);
        assert_eq!(merged.origins[5], Some(SampleOrigin::Interpolated));
        assert_eq!(merged.origins[0], Some(SampleOrigin::Dataset(0)));
        assert_eq!(merged.provenance.len(), 3);
        assert_eq!(merged.provenance[1].source, SpanSource::Interpolated);
    }

    #[test]
    fn test_discrete_curves_not_filled() {
        let mut lith: Vec<(f64, Option<f64>)> = flat(100.0, 110.0, 0.5, 2.0);
        for s in lith.iter_mut().skip(8).take(6) {
            s.1 = None;
        }
        let curve = LogCurve::from_samples(CurveType::Lith, "", lith).unwrap();
        let ds = WellDataset::new("a", "WELL-A", DepthUnit::Feet)
            .with_curve(curve)
            .unwrap();
        let out = merge(&[ds], 0.5, 10.0).unwrap();
        let report = out.report.curve(&CurveType::Lith).unwrap();
        assert!(report.filled_gaps.is_empty());
        assert!(report
            .unfilled_gaps
            .iter()
            .any(|g| g.reason == GapReason::DiscreteCurve));
    }

    #[test]
    fn test_discrete_curve_past_its_data_is_open_ended() {
        let lith =
            LogCurve::from_samples(CurveType::Lith, "", flat(100.0, 110.0, 0.5, 3.0)).unwrap();
        let gr =
            LogCurve::from_samples(CurveType::Gr, "GAPI", flat(100.0, 120.0, 0.5, 60.0)).unwrap();
        let ds = WellDataset::new("a", "WELL-A", DepthUnit::Feet)
            .with_curve(lith)
            .unwrap()
            .with_curve(gr)
            .unwrap();
        let out = merge(&[ds], 0.5, 10.0).unwrap();
        let gaps = &out.report.curve(&CurveType::Lith).unwrap().unfilled_gaps;
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].reason, GapReason::OpenEnded);
        assert!((gaps[0].range.top - 110.5).abs() < 1e-9);
        assert!((gaps[0].range.base - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_config_rejects_zero_base_weights() {
        let mut config = MergeConfig::default();
        config.quality.completeness_weight = 0.0;
        config.quality.gap_weight = 0.0;
        config.quality.agreement_weight = 1.0;
        assert!(matches!(
            MergeEngine::from_config(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_engine_interpolate_gaps_skips_discrete() {
        let curve = LogCurve::from_samples(
            CurveType::Facies,
            "",
            [(0.0, Some(1.0)), (0.5, None), (1.0, Some(1.0))],
        )
        .unwrap();
        let out = MergeEngine::default().interpolate_gaps(&curve, 5.0).unwrap();
        assert_eq!(out.curve, curve);
        assert_eq!(out.unfilled[0].reason, GapReason::DiscreteCurve);
    }

    #[test]
    fn test_select_best_curve_missing_type() {
        let ds = gr_dataset("a", "WELL-A", DepthUnit::Feet, flat(0.0, 1.0, 0.5, 1.0));
        assert_eq!(select_best_curve(&CurveType::Rhob, &[ds], 0.5), Ok(None));
    }
}
