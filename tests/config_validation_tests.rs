//! Config Validation Tests
//!
//! Typo detection and range validation of `petromerge.toml`, exercised
//! independently from the merge engine.

use petromerge::config::validation::{
    known_config_keys, suggest_correction, validate_physical_ranges, validate_unknown_keys,
};
use petromerge::config::{ConfigError, CustomCurveConfig, MergeConfig};

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_merge_section_warns_with_suggestion() {
    let toml_str = r#"
[merge]
max_gpa_ft = 8.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("max_gpa_ft"));
    assert_eq!(warnings[0].suggestion.as_deref(), Some("merge.max_gap_ft"));
}

#[test]
fn typo_inside_custom_curve_entry_warns() {
    let toml_str = r#"
[[curves.custom]]
tag = "TOC"
unti = "WT%"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].suggestion.as_deref(), Some("curves.custom.unit"));
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[merge]
target_step_ft = 0.25
max_gap_ft = 10.0

[quality]
completeness_weight = 0.6
gap_weight = 0.2
agreement_weight = 0.2
min_gap_ft = 1.5
min_overlap_samples = 10

[las]
extra_null_values = [-1.0, 0.0]
null_tolerance = 0.001

[export]
company = "ACME OIL"

[[curves.custom]]
tag = "TOC"
unit = "WT%"
min = 0.0
max = 20.0
aliases = ["TOC_CALC"]

[[curves.custom]]
tag = "ZONE"
discrete = true
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(
        warnings.is_empty(),
        "Valid config should produce 0 warnings, got: {:?}",
        warnings.iter().map(|w| &w.field).collect::<Vec<_>>()
    );
    let config = MergeConfig::from_toml_str(toml_str).expect("config should load");
    assert_eq!(config.curves.custom.len(), 2);
    assert!(config.curves.custom[1].discrete);
}

#[test]
fn unknown_section_warns() {
    let warnings = validate_unknown_keys("[resampling]\nmethod = \"cubic\"\n");
    assert!(warnings.iter().any(|w| w.field == "resampling"));
}

#[test]
fn empty_toml_produces_zero_warnings() {
    assert!(validate_unknown_keys("").is_empty());
}

#[test]
fn known_keys_set_is_complete() {
    let mut config = MergeConfig::default();
    config.curves.custom.push(CustomCurveConfig {
        tag: "TOC".into(),
        unit: "WT%".into(),
        min: Some(0.0),
        max: Some(20.0),
        aliases: vec!["TOC_CALC".into()],
        discrete: false,
    });
    let toml_str = config.to_toml().expect("config should serialize");
    let warnings = validate_unknown_keys(&toml_str);
    assert!(
        warnings.is_empty(),
        "Serialized config should produce 0 unknown-key warnings, got: {:?}",
        warnings.iter().map(|w| &w.field).collect::<Vec<_>>()
    );
}

#[test]
fn suggest_correction_returns_none_for_garbage() {
    let known = known_config_keys();
    assert!(suggest_correction("zzz_completely_invalid_xyz_12345", &known).is_none());
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn all_defaults_pass_validation() {
    let config = MergeConfig::default();
    let (errors, warnings) = validate_physical_ranges(&config);
    assert!(errors.is_empty(), "Default config should have 0 errors: {errors:?}");
    assert!(warnings.is_empty());
    assert!(config.validate().is_ok());
}

#[test]
fn step_outside_bounds_is_error() {
    for step in [0.05, 1.5, f64::NAN] {
        let mut config = MergeConfig::default();
        config.merge.target_step_ft = step;
        let (errors, _) = validate_physical_ranges(&config);
        assert!(
            errors.iter().any(|e| e.contains("target_step_ft")),
            "step {step} should be rejected"
        );
    }
}

#[test]
fn max_gap_outside_bounds_is_error() {
    let mut config = MergeConfig::default();
    config.merge.max_gap_ft = 75.0;
    assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
}

#[test]
fn negative_weight_is_error() {
    let mut config = MergeConfig::default();
    config.quality.gap_weight = -0.3;
    config.quality.completeness_weight = 1.1;
    let (errors, _) = validate_physical_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("gap_weight")));
}

#[test]
fn weights_not_summing_to_one_is_error() {
    let mut config = MergeConfig::default();
    config.quality.agreement_weight = 0.6;
    let (errors, _) = validate_physical_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("sum")));
}

#[test]
fn large_null_tolerance_is_warning() {
    let mut config = MergeConfig::default();
    config.las.null_tolerance = 5.0;
    let (errors, warnings) = validate_physical_ranges(&config);
    assert!(errors.is_empty());
    assert!(warnings.iter().any(|w| w.field == "las.null_tolerance"));
}

#[test]
fn custom_curve_with_inverted_range_is_error() {
    let mut config = MergeConfig::default();
    config.curves.custom.push(CustomCurveConfig {
        tag: "TOC".into(),
        unit: "WT%".into(),
        min: Some(20.0),
        max: Some(0.0),
        aliases: Vec::new(),
        discrete: false,
    });
    let (errors, _) = validate_physical_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("TOC")));
}

// ============================================================================
// Round Trip and Loading
// ============================================================================

#[test]
fn config_roundtrip_preserves_values() {
    let mut original = MergeConfig::default();
    original.merge.target_step_ft = 0.25;
    original.export.company = "Roundtrip".to_string();
    original.las.extra_null_values = vec![-1.0];

    let toml_str = original.to_toml().expect("Serialization should work");
    let roundtripped = MergeConfig::from_toml_str(&toml_str).expect("Deserialization should work");
    assert_eq!(roundtripped, original);
}

#[test]
fn load_from_file_reports_path_on_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("petromerge.toml");
    std::fs::write(&path, "[merge]\ntarget_step_ft = \"half\"\n").unwrap();
    let err = MergeConfig::load_from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(..)));
    assert!(err.to_string().contains("petromerge.toml"));
}

#[test]
fn save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.toml");
    let mut config = MergeConfig::default();
    config.merge.max_gap_ft = 12.5;
    config.save_to_file(&path).unwrap();
    assert_eq!(MergeConfig::load_from_file(&path).unwrap(), config);
}
