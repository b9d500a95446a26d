//! Curve Quality Scoring
//!
//! Deterministic, rule-based score in 0.0-1.0 used to rank candidate source
//! curves of the same type.
//!
//! # Scoring Algorithm
//!
//! Weighted average of three components (default weights in parentheses):
//! - Completeness (0.5): fraction of non-null samples
//! - Gap score (0.3): `1 - 0.5 * long_null_fraction - 0.5 * longest_gap_fraction`,
//!   where only null runs longer than `min_gap_ft` count
//! - Agreement (0.2): similarity with overlapping curves of the same type
//!   (Pearson correlation and normalised RMS difference)
//!
//! When no overlapping curve shares enough paired samples, agreement is
//! dropped and the other two weights are renormalised. Every component is
//! non-increasing in the set of null samples, so filling a null can never
//! lower a curve's score when nothing else changes.

use serde::Serialize;
use statrs::statistics::Statistics;

use super::gaps::null_runs;
use crate::config::QualityConfig;
use crate::types::LogCurve;

/// Spread below which a series is treated as constant.
const VARIANCE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityScore {
    /// Combined score, 0.0-1.0
    pub value: f64,
    pub completeness: f64,
    pub gap_score: f64,
    /// `None` when no overlapping curve was comparable
    pub agreement: Option<f64>,
}

impl QualityScore {
    pub const ZERO: Self = Self {
        value: 0.0,
        completeness: 0.0,
        gap_score: 0.0,
        agreement: None,
    };
}

/// Scores curves with a fixed set of weights.
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    config: QualityConfig,
}

impl QualityScorer {
    pub const fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Score `curve` against the same-type curves of other datasets.
    pub fn score(&self, curve: &LogCurve, overlapping: &[&LogCurve]) -> QualityScore {
        if curve.is_empty() || curve.valid_count() == 0 {
            return QualityScore::ZERO;
        }

        let completeness = curve.completeness();
        let gap_score = self.gap_score(curve);
        let agreement = self.agreement(curve, overlapping);

        let c = &self.config;
        let (weighted, total) = match agreement {
            Some(a) => (
                c.completeness_weight * completeness
                    + c.gap_weight * gap_score
                    + c.agreement_weight * a,
                c.completeness_weight + c.gap_weight + c.agreement_weight,
            ),
            None => (
                c.completeness_weight * completeness + c.gap_weight * gap_score,
                c.completeness_weight + c.gap_weight,
            ),
        };
        // Degenerate weights rank every curve equally at zero.
        let value = weighted / total;
        let value = if total > 0.0 && value.is_finite() { value } else { 0.0 };

        QualityScore {
            value: value.clamp(0.0, 1.0),
            completeness,
            gap_score,
            agreement,
        }
    }

    /// Long-gap penalty term. Run length is `samples * native_step`, so both
    /// fractions are measured in samples over the curve length.
    fn gap_score(&self, curve: &LogCurve) -> f64 {
        let step = curve.native_step().unwrap_or(0.0);
        let n = curve.len() as f64;
        let mut long_samples = 0usize;
        let mut longest = 0usize;
        for run in null_runs(curve.values()) {
            let samples = run.len();
            if samples as f64 * step > self.config.min_gap_ft {
                long_samples += samples;
                longest = longest.max(samples);
            }
        }
        let total_frac = (long_samples as f64 / n).min(1.0);
        let longest_frac = (longest as f64 / n).min(1.0);
        1.0 - 0.5 * total_frac - 0.5 * longest_frac
    }

    /// Mean agreement over overlapping curves with enough paired samples.
    fn agreement(&self, curve: &LogCurve, overlapping: &[&LogCurve]) -> Option<f64> {
        let terms: Vec<f64> = overlapping
            .iter()
            .filter_map(|other| self.pair_agreement(curve, other))
            .collect();
        if terms.is_empty() {
            None
        } else {
            Some(terms.iter().sum::<f64>() / terms.len() as f64)
        }
    }

    /// Agreement with one overlapping curve, evaluated at this curve's valid
    /// sample depths.
    fn pair_agreement(&self, curve: &LogCurve, other: &LogCurve) -> Option<f64> {
        let (xs, ys): (Vec<f64>, Vec<f64>) = curve
            .depths()
            .iter()
            .zip(curve.values())
            .filter_map(|(&d, v)| Some(((*v)?, other.value_at(d)?)))
            .unzip();
        if xs.len() < self.config.min_overlap_samples.max(2) {
            return None;
        }

        let rms = (xs
            .iter()
            .zip(&ys)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            / xs.len() as f64)
            .sqrt();
        let sx = xs.iter().population_std_dev();
        let sy = ys.iter().population_std_dev();
        let pooled = ((sx * sx + sy * sy) / 2.0).sqrt();
        let scale = if pooled > VARIANCE_EPSILON {
            pooled
        } else {
            let level = (xs.iter().mean().abs() + ys.iter().mean().abs()) / 2.0;
            if level > VARIANCE_EPSILON { level } else { 1.0 }
        };
        let rms_term = 1.0 / (1.0 + rms / scale);

        if sx > VARIANCE_EPSILON && sy > VARIANCE_EPSILON {
            let r = xs.iter().population_covariance(ys.iter()) / (sx * sy);
            Some(0.5 * r.clamp(0.0, 1.0) + 0.5 * rms_term)
        } else {
            Some(rms_term)
        }
    }
}

/// Score with the default weights. See [`QualityScorer::score`].
pub fn score_curve(curve: &LogCurve, overlapping: &[&LogCurve]) -> QualityScore {
    QualityScorer::default().score(curve, overlapping)
}
