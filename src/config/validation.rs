//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Unknown keys never break a config.

use std::collections::HashSet;

use super::defaults::{MAX_MAX_GAP_FT, MAX_TARGET_STEP_FT, MIN_MAX_GAP_FT, MIN_TARGET_STEP_FT};

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, ", did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `MergeConfig`.
///
/// Maintained by hand to match the struct hierarchy in merge_config.rs.
/// Fields of `[[curves.custom]]` entries appear under `curves.custom.*`.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [merge]
        "merge",
        "merge.target_step_ft",
        "merge.max_gap_ft",
        // [quality]
        "quality",
        "quality.completeness_weight",
        "quality.gap_weight",
        "quality.agreement_weight",
        "quality.min_gap_ft",
        "quality.min_overlap_samples",
        // [las]
        "las",
        "las.extra_null_values",
        "las.null_tolerance",
        // [export]
        "export",
        "export.company",
        // [curves] / [[curves.custom]]
        "curves",
        "curves.custom",
        "curves.custom.tag",
        "curves.custom.unit",
        "curves.custom.min",
        "curves.custom.max",
        "curves.custom.aliases",
        "curves.custom.discrete",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// A table `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`. Arrays of
/// tables contribute their entries' keys under the array's own path, so
/// `[[a.list]] x = 1` yields `["a", "a.list", "a.list.x"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            match v {
                toml::Value::Table(_) => keys.extend(walk_toml_keys(v, &path)),
                toml::Value::Array(items) => {
                    for item in items.iter().filter(|i| i.is_table()) {
                        for key in walk_toml_keys(item, &path) {
                            if !keys.contains(&key) {
                                keys.push(key);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
/// Ties resolve to the alphabetically first key.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut candidates: Vec<&str> = known.iter().copied().collect();
    candidates.sort_unstable();
    let mut best: Option<(&str, usize)> = None;
    for k in candidates {
        let dist = levenshtein(unknown, k);
        if dist <= 3 && best.map_or(true, |(_, best_dist)| dist < best_dist) {
            best = Some((k, dist));
        }
    }
    best.map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new(); // parse errors are reported by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Physical Range Validation
// ============================================================================

/// Validate ranges on a parsed `MergeConfig`.
///
/// Returns (errors, warnings): errors are values the engine would reject or
/// that make scoring meaningless; warnings are suspicious but usable.
pub fn validate_physical_ranges(
    config: &super::MergeConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let m = &config.merge;
    if !(MIN_TARGET_STEP_FT..=MAX_TARGET_STEP_FT).contains(&m.target_step_ft) {
        errors.push(format!(
            "merge.target_step_ft = {} is outside the accepted range \
             ({MIN_TARGET_STEP_FT}-{MAX_TARGET_STEP_FT} ft)",
            m.target_step_ft
        ));
    }
    if !(MIN_MAX_GAP_FT..=MAX_MAX_GAP_FT).contains(&m.max_gap_ft) {
        errors.push(format!(
            "merge.max_gap_ft = {} is outside the accepted range \
             ({MIN_MAX_GAP_FT}-{MAX_MAX_GAP_FT} ft)",
            m.max_gap_ft
        ));
    }

    let q = &config.quality;
    let weights = [
        ("completeness_weight", q.completeness_weight),
        ("gap_weight", q.gap_weight),
        ("agreement_weight", q.agreement_weight),
    ];
    for (name, w) in weights {
        if !w.is_finite() || w < 0.0 {
            errors.push(format!("quality.{name} = {w} must be a finite value >= 0"));
        }
    }
    if errors.iter().all(|e| !e.starts_with("quality.")) {
        let sum: f64 = weights.iter().map(|(_, w)| w).sum();
        if !(0.95..=1.05).contains(&sum) {
            errors.push(format!("quality weights must sum to ~1.0, got {sum:.2}"));
        }
        if q.completeness_weight + q.gap_weight <= 0.0 {
            errors.push(
                "quality.completeness_weight + quality.gap_weight must be > 0 \
                 (used when no overlap exists)"
                    .to_string(),
            );
        }
    }
    if !q.min_gap_ft.is_finite() || q.min_gap_ft < 0.0 {
        errors.push(format!("quality.min_gap_ft = {} must be >= 0", q.min_gap_ft));
    }
    if q.min_overlap_samples < 2 {
        errors.push(format!(
            "quality.min_overlap_samples = {} must be >= 2 (correlation needs pairs)",
            q.min_overlap_samples
        ));
    }

    let l = &config.las;
    if !l.null_tolerance.is_finite() || l.null_tolerance < 0.0 {
        errors.push(format!("las.null_tolerance = {} must be >= 0", l.null_tolerance));
    } else if l.null_tolerance > 1.0 {
        warnings.push(ValidationWarning {
            field: "las.null_tolerance".to_string(),
            message: format!(
                "las.null_tolerance = {} is unusually large and may null out real samples",
                l.null_tolerance
            ),
            suggestion: None,
        });
    }
    if l.extra_null_values.iter().any(|v| !v.is_finite()) {
        errors.push("las.extra_null_values must contain only finite numbers".to_string());
    }

    for (i, c) in config.curves.custom.iter().enumerate() {
        if c.tag.trim().is_empty() {
            errors.push(format!("curves.custom[{i}].tag must not be empty"));
        }
        if let (Some(lo), Some(hi)) = (c.min, c.max) {
            if lo >= hi {
                errors.push(format!(
                    "curves.custom[{i}] ({}): min ({lo}) must be < max ({hi})",
                    c.tag
                ));
            }
        }
        if c.discrete && (c.min.is_some() || c.max.is_some()) {
            warnings.push(ValidationWarning {
                field: format!("curves.custom[{i}]"),
                message: format!(
                    "curves.custom[{i}] ({}) is discrete; its min/max only drive QC warnings",
                    c.tag
                ),
                suggestion: None,
            });
        }
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================
