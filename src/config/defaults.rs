//! System-wide default constants.
//!
//! Centralises the bounds and magic numbers used by the merge engine, the LAS
//! reader and the config layer. Grouped by subsystem for easy discovery.

// ============================================================================
// Units
// ============================================================================

/// Feet per metre.
pub const FT_PER_M: f64 = 3.28084;

/// Tolerance when comparing depths (ft). Absorbs float drift from
/// `start + i * step` and from metre-to-foot conversion.
pub const DEPTH_EPSILON_FT: f64 = 1e-6;

// ============================================================================
// Merge Parameters
// ============================================================================

/// Smallest accepted merged-grid step (ft).
pub const MIN_TARGET_STEP_FT: f64 = 0.1;

/// Largest accepted merged-grid step (ft).
pub const MAX_TARGET_STEP_FT: f64 = 1.0;

/// Default merged-grid step (ft).
pub const DEFAULT_TARGET_STEP_FT: f64 = 0.5;

/// Smallest accepted gap-interpolation limit (ft).
pub const MIN_MAX_GAP_FT: f64 = 1.0;

/// Largest accepted gap-interpolation limit (ft).
pub const MAX_MAX_GAP_FT: f64 = 50.0;

/// Default gap-interpolation limit (ft).
pub const DEFAULT_MAX_GAP_FT: f64 = 5.0;

/// Upper bound on merged-grid points.
pub const MAX_GRID_POINTS: u32 = 10_000_000;

/// Floor on the nearest-neighbour search distance for discrete curves (ft).
/// The effective distance is `max(this, 2 * step)`.
pub const DISCRETE_MIN_SEARCH_FT: f64 = 1.0;

// ============================================================================
// Quality Scoring
// ============================================================================

/// Weight of the non-null fraction in the quality score.
pub const DEFAULT_COMPLETENESS_WEIGHT: f64 = 0.5;

/// Weight of the long-gap penalty term in the quality score.
pub const DEFAULT_GAP_WEIGHT: f64 = 0.3;

/// Weight of cross-dataset agreement in the quality score.
pub const DEFAULT_AGREEMENT_WEIGHT: f64 = 0.2;

/// Null runs at or below this length (ft) are not counted as gaps.
pub const DEFAULT_SCORING_MIN_GAP_FT: f64 = 2.0;

/// Paired valid samples required before agreement is computed.
pub const DEFAULT_MIN_OVERLAP_SAMPLES: usize = 5;

// ============================================================================
// LAS
// ============================================================================

/// Null sentinel written to exported LAS files.
pub const LAS_NULL_VALUE: f64 = -999.25;

/// Sentinels treated as null even when the header declares another value.
pub const COMMON_NULL_VALUES: [f64; 5] = [-999.25, -999.0, -9999.0, -999_999.0, 999.25];

/// Absolute tolerance when matching null sentinels.
pub const DEFAULT_NULL_TOLERANCE: f64 = 0.01;

/// Mnemonics accepted for the depth index curve.
pub const DEPTH_MNEMONICS: [&str; 5] = ["DEPT", "DEPTH", "MD", "TVD", "TDEP"];

/// Company written to the `COMP` line of exported files.
pub const DEFAULT_EXPORT_COMPANY: &str = "PETROPHYTER";
