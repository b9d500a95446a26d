//! Merge Scenario Tests
//!
//! End-to-end merges on in-memory datasets covering source selection,
//! gap handling, well identity checks and grid uniformity.

use petromerge::config::{CustomCurveConfig, MergeConfig};
use petromerge::curves::CurveType;
use petromerge::merge::{
    interpolate_gaps, merge, score_curve, GapReason, MergeEngine, MergeError, SampleOrigin,
    SpanSource,
};
use petromerge::types::{DepthUnit, LogCurve, WellDataset};

fn gr(depth: f64) -> f64 {
    60.0 + 25.0 * (depth * 0.37).sin()
}

fn depths(top: f64, base: f64, step: f64) -> Vec<f64> {
    let n = ((base - top) / step).round() as usize;
    (0..=n).map(|i| top + i as f64 * step).collect()
}

fn gr_dataset(
    id: &str,
    well: &str,
    top: f64,
    base: f64,
    step: f64,
    is_null: impl Fn(f64) -> bool,
) -> WellDataset {
    let curve = LogCurve::from_samples(
        CurveType::Gr,
        "GAPI",
        depths(top, base, step)
            .into_iter()
            .map(|d| (d, (!is_null(d)).then(|| gr(d)))),
    )
    .unwrap();
    WellDataset::new(id, well, DepthUnit::Feet)
        .with_curve(curve)
        .unwrap()
}

fn in_range(d: f64, top: f64, base: f64) -> bool {
    d >= top - 1e-9 && d <= base + 1e-9
}

// ============================================================================
// Two-dataset gap cover
// ============================================================================

#[test]
fn second_dataset_covers_null_interval() {
    let ds1 = gr_dataset("ds1.las", "WELL-A", 95.0, 110.0, 0.5, |d| in_range(d, 100.0, 105.0));
    let ds2 = gr_dataset("ds2.las", "WELL-A", 95.0, 110.0, 0.5, |_| false);

    let out = merge(&[ds1, ds2], 0.5, 10.0).unwrap();
    let merged = out.dataset.curve(&CurveType::Gr).unwrap();
    let grid = out.dataset.grid;

    assert!((grid.start() - 95.0).abs() < 1e-9);
    assert!((grid.base() - 110.0).abs() < 1e-9);
    assert_eq!(merged.curve.null_count(), 0, "GR must be fully populated 95-110 ft");

    for d in depths(100.0, 105.0, 0.5) {
        let i = grid.index_of(d).unwrap();
        assert_eq!(merged.origins[i], Some(SampleOrigin::Dataset(1)), "depth {d}");
    }

    let report = out.report.curve(&CurveType::Gr).unwrap();
    assert_eq!(report.primary_source, "ds2.las");
    assert!(report.provenance.iter().any(|span| {
        span.source == SpanSource::Dataset("ds2.las".into())
            && span.range.top <= 100.0 + 1e-9
            && span.range.base >= 105.0 - 1e-9
    }));
}

#[test]
fn lower_ranked_dataset_fills_only_where_primary_is_null() {
    let ds1 = gr_dataset("ds1.las", "WELL-A", 95.0, 110.0, 0.5, |d| in_range(d, 100.0, 105.0));
    let ds2 = gr_dataset("ds2.las", "well-a", 90.0, 110.0, 0.5, |d| d < 100.0);

    let out = merge(&[ds1, ds2], 0.5, 10.0).unwrap();
    let report = out.report.curve(&CurveType::Gr).unwrap();
    assert_eq!(report.primary_source, "ds1.las");

    let merged = out.dataset.curve(&CurveType::Gr).unwrap();
    let grid = out.dataset.grid;
    for d in depths(95.0, 110.0, 0.5) {
        let i = grid.index_of(d).unwrap();
        let expected = if in_range(d, 100.0, 105.0) { 1 } else { 0 };
        assert_eq!(merged.origins[i], Some(SampleOrigin::Dataset(expected)), "depth {d}");
        assert!(merged.curve.values()[i].is_some());
    }

    // Nothing covers 90-94.5 ft, and it touches the top of the grid
    assert!(report
        .unfilled_gaps
        .iter()
        .any(|g| g.reason == GapReason::OpenEnded && (g.range.top - 90.0).abs() < 1e-9));
}

// ============================================================================
// Long gaps
// ============================================================================

#[test]
fn sixty_foot_gap_stays_null_and_is_reported() {
    let ds = gr_dataset("long.las", "WELL-A", 0.0, 200.0, 0.5, |d| d > 50.0 && d < 110.0);
    let out = merge(&[ds], 0.5, 50.0).unwrap();

    let merged = out.dataset.curve(&CurveType::Gr).unwrap();
    let grid = out.dataset.grid;
    for d in depths(50.5, 109.5, 0.5) {
        assert_eq!(merged.curve.values()[grid.index_of(d).unwrap()], None, "depth {d}");
    }

    let report = out.report.curve(&CurveType::Gr).unwrap();
    assert!(report.filled_gaps.is_empty());
    assert_eq!(report.unfilled_gaps.len(), 1);
    let gap = &report.unfilled_gaps[0];
    assert_eq!(gap.reason, GapReason::TooLong);
    assert_eq!(gap.samples, 119);
    assert!((gap.range.top - 50.5).abs() < 1e-9);
    assert!((gap.range.base - 109.5).abs() < 1e-9);

    let json = out.report.to_json().unwrap();
    assert!(json.contains("too_long"));
}

#[test]
fn short_gap_is_interpolated_and_marked() {
    let ds = gr_dataset("short.las", "WELL-A", 0.0, 20.0, 0.5, |d| d > 5.0 && d < 8.0);
    let out = merge(&[ds], 0.5, 5.0).unwrap();
    let merged = out.dataset.curve(&CurveType::Gr).unwrap();
    assert_eq!(merged.curve.null_count(), 0);
    let i = out.dataset.grid.index_of(6.5).unwrap();
    assert_eq!(merged.origins[i], Some(SampleOrigin::Interpolated));
    assert_eq!(out.report.curve(&CurveType::Gr).unwrap().filled_gaps.len(), 1);
}

// ============================================================================
// Well identity
// ============================================================================

#[test]
fn different_wells_fail_without_output() {
    let a = gr_dataset("a.las", "WELL-A", 95.0, 110.0, 0.5, |_| false);
    let b = gr_dataset("b.las", "WELL-B", 95.0, 110.0, 0.5, |_| false);
    match merge(&[a, b], 0.5, 10.0) {
        Err(MergeError::WellMismatch { expected, found, .. }) => {
            assert_eq!(expected, "WELL-A");
            assert_eq!(found, "WELL-B");
        }
        other => panic!("expected WellMismatch, got {other:?}"),
    }
}

#[test]
fn empty_input_is_insufficient() {
    assert_eq!(merge(&[], 0.5, 10.0).unwrap_err(), MergeError::InsufficientData);
}

// ============================================================================
// Grid and gap properties
// ============================================================================

#[test]
fn merged_grid_is_uniform_at_target_step() {
    let a = gr_dataset("a.las", "WELL-A", 1203.17, 1288.4, 0.5, |_| false);
    let b = {
        let rhob = LogCurve::from_samples(
            CurveType::Rhob,
            "G/C3",
            depths(370.0, 390.0, 0.1524).into_iter().map(|d| (d, Some(2.4))),
        )
        .unwrap();
        WellDataset::new("b.las", "WELL-A", DepthUnit::Meters)
            .with_curve(rhob)
            .unwrap()
    };

    for step in [0.1, 0.25, 0.5, 1.0] {
        let out = merge(&[a.clone(), b.clone()], step, 5.0).unwrap();
        for merged in out.dataset.curves.values() {
            let d = merged.curve.depths();
            assert_eq!(d.len(), out.dataset.grid.len());
            for w in d.windows(2) {
                assert!((w[1] - w[0] - step).abs() < 1e-9, "step {step}: {w:?}");
            }
        }
    }
}

#[test]
fn gap_fill_on_merged_curve_is_idempotent() {
    let ds = gr_dataset("a.las", "WELL-A", 0.0, 100.0, 0.5, |d| {
        (10.0..12.0).contains(&d) || (40.0..70.0).contains(&d) || d > 95.0
    });
    let out = merge(&[ds], 0.5, 5.0).unwrap();
    let curve = &out.dataset.curve(&CurveType::Gr).unwrap().curve;

    let once = interpolate_gaps(curve, 5.0).unwrap();
    let twice = interpolate_gaps(&once.curve, 5.0).unwrap();
    assert_eq!(once.curve, twice.curve);
}

#[test]
fn fewer_nulls_never_score_lower() {
    let full = gr_dataset("a.las", "WELL-A", 0.0, 50.0, 0.5, |_| false);
    let holes = gr_dataset("b.las", "WELL-A", 0.0, 50.0, 0.5, |d| (10.0..20.0).contains(&d));
    let more_holes = gr_dataset("c.las", "WELL-A", 0.0, 50.0, 0.5, |d| {
        (10.0..20.0).contains(&d) || (30.0..33.0).contains(&d)
    });
    let s = |ds: &WellDataset| score_curve(ds.curve(&CurveType::Gr).unwrap(), &[]).value;
    assert!(s(&full) >= s(&holes));
    assert!(s(&holes) >= s(&more_holes));
}

// ============================================================================
// Configured engine
// ============================================================================

#[test]
fn configured_engine_merges_custom_curve() {
    let mut config = MergeConfig::default();
    config.curves.custom.push(CustomCurveConfig {
        tag: "TOC".into(),
        unit: "WT%".into(),
        min: Some(0.0),
        max: Some(20.0),
        aliases: vec!["TOC_CALC".into()],
        discrete: false,
    });
    let engine = MergeEngine::from_config(&config).unwrap();
    let toc_type = engine.registry().resolve("toc_calc").unwrap().clone();
    assert_eq!(toc_type, CurveType::custom("TOC"));

    let toc = LogCurve::from_samples(
        toc_type.clone(),
        "",
        depths(100.0, 110.0, 0.5).into_iter().map(|d| (d, Some(2.0))),
    )
    .unwrap();
    let ds = WellDataset::new("toc.las", "WELL-A", DepthUnit::Feet)
        .with_curve(toc)
        .unwrap();

    let out = engine.merge(&[ds], 0.5, 5.0).unwrap();
    let report = out.report.curve(&toc_type).unwrap();
    assert_eq!(report.unit, "WT%");
    assert_eq!(report.out_of_range_samples, 0);
}
