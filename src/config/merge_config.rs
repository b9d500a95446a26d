//! Merge Configuration - operator-tunable TOML values
//!
//! Every tunable of the merge engine, the LAS reader and the exporter lives
//! here. Each struct implements `Default` with the values from
//! [`super::defaults`], so a missing config file changes nothing.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::curves::RegistryError;

use super::defaults::{
    DEFAULT_AGREEMENT_WEIGHT, DEFAULT_COMPLETENESS_WEIGHT, DEFAULT_EXPORT_COMPANY,
    DEFAULT_GAP_WEIGHT, DEFAULT_MAX_GAP_FT, DEFAULT_MIN_OVERLAP_SAMPLES,
    DEFAULT_NULL_TOLERANCE, DEFAULT_SCORING_MIN_GAP_FT, DEFAULT_TARGET_STEP_FT,
};

/// Environment variable pointing at a config file.
pub const CONFIG_ENV_VAR: &str = "PETROMERGE_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "petromerge.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `MergeConfig::load()` which searches:
/// 1. `$PETROMERGE_CONFIG` env var
/// 2. `./petromerge.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MergeConfig {
    /// Grid step and gap limit used when the caller does not override them
    #[serde(default)]
    pub merge: MergeSettings,

    /// Quality score weighting
    #[serde(default)]
    pub quality: QualityConfig,

    /// LAS reader behaviour
    #[serde(default)]
    pub las: LasConfig,

    /// LAS writer header values
    #[serde(default)]
    pub export: ExportConfig,

    /// Registry extensions
    #[serde(default)]
    pub curves: CurvesConfig,
}

impl MergeConfig {
    /// Load configuration using the standard search order:
    /// 1. `$PETROMERGE_CONFIG` environment variable
    /// 2. `./petromerge.toml` in the current working directory
    /// 3. Built-in defaults
    ///
    /// A file that exists but fails to load is an error; silently merging
    /// with different parameters than the operator asked for is worse.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                let config = Self::load_from_file(&p)?;
                info!(path = %p.display(), "Loaded merge config from {}", CONFIG_ENV_VAR);
                return Ok(config);
            }
            warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            let config = Self::load_from_file(&local)?;
            info!("Loaded merge config from ./{}", LOCAL_CONFIG_FILE);
            return Ok(config);
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Ok(Self::default())
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys are logged as warnings.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in &super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Merge config saved");
        Ok(())
    }

    /// Validate all values for internal consistency and physical ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_physical_ranges(self);
        for w in &warnings {
            warn!("{}", w);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),

    #[error("Invalid [[curves.custom]] entry: {0}")]
    Registry(#[from] RegistryError),
}

// ============================================================================
// Merge Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeSettings {
    /// Merged depth grid step (ft), 0.1-1.0.
    #[serde(default = "default_target_step")]
    pub target_step_ft: f64,

    /// Longest null run that may be filled by interpolation (ft), 1.0-50.0.
    #[serde(default = "default_max_gap")]
    pub max_gap_ft: f64,
}

fn default_target_step() -> f64 {
    DEFAULT_TARGET_STEP_FT
}
fn default_max_gap() -> f64 {
    DEFAULT_MAX_GAP_FT
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            target_step_ft: default_target_step(),
            max_gap_ft: default_max_gap(),
        }
    }
}

// ============================================================================
// Quality Scoring
// ============================================================================

/// Weights of the three quality components. Must sum to ~1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    #[serde(default = "default_completeness_weight")]
    pub completeness_weight: f64,

    #[serde(default = "default_gap_weight")]
    pub gap_weight: f64,

    /// Only applied when an overlapping curve of the same type exists;
    /// otherwise the other two weights are renormalised.
    #[serde(default = "default_agreement_weight")]
    pub agreement_weight: f64,

    /// Null runs at or below this length (ft) do not count as gaps.
    #[serde(default = "default_scoring_min_gap")]
    pub min_gap_ft: f64,

    /// Paired valid samples required to compute agreement with an overlap.
    #[serde(default = "default_min_overlap_samples")]
    pub min_overlap_samples: usize,
}

fn default_completeness_weight() -> f64 {
    DEFAULT_COMPLETENESS_WEIGHT
}
fn default_gap_weight() -> f64 {
    DEFAULT_GAP_WEIGHT
}
fn default_agreement_weight() -> f64 {
    DEFAULT_AGREEMENT_WEIGHT
}
fn default_scoring_min_gap() -> f64 {
    DEFAULT_SCORING_MIN_GAP_FT
}
fn default_min_overlap_samples() -> usize {
    DEFAULT_MIN_OVERLAP_SAMPLES
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            completeness_weight: default_completeness_weight(),
            gap_weight: default_gap_weight(),
            agreement_weight: default_agreement_weight(),
            min_gap_ft: default_scoring_min_gap(),
            min_overlap_samples: default_min_overlap_samples(),
        }
    }
}

// ============================================================================
// LAS Reader
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LasConfig {
    /// Extra null sentinels on top of the header `NULL` and the common ones.
    #[serde(default)]
    pub extra_null_values: Vec<f64>,

    /// Absolute tolerance when matching null sentinels.
    #[serde(default = "default_null_tolerance")]
    pub null_tolerance: f64,
}

fn default_null_tolerance() -> f64 {
    DEFAULT_NULL_TOLERANCE
}

impl Default for LasConfig {
    fn default() -> Self {
        Self {
            extra_null_values: Vec::new(),
            null_tolerance: default_null_tolerance(),
        }
    }
}

// ============================================================================
// Export
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Value of the `COMP` header line.
    #[serde(default = "default_company")]
    pub company: String,
}

fn default_company() -> String {
    DEFAULT_EXPORT_COMPANY.to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            company: default_company(),
        }
    }
}

// ============================================================================
// Curve Registry Extensions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CurvesConfig {
    /// Custom curve tags appended to the standard registry.
    #[serde(default)]
    pub custom: Vec<CustomCurveConfig>,
}

/// One `[[curves.custom]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomCurveConfig {
    /// Tag name; also accepted as a mnemonic alias.
    pub tag: String,

    #[serde(default)]
    pub unit: String,

    /// Lower plausibility bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Upper plausibility bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Additional source mnemonics, highest priority first.
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Categorical curve: nearest-neighbour resampling, never gap-filled.
    #[serde(default)]
    pub discrete: bool,
}
