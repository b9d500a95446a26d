//! Curve Type Registry
//!
//! Well-log files name the same physical measurement many different ways
//! (`GR`, `CGR`, `SGR`, `GAMMA` ...). Rather than matching column names ad hoc,
//! every curve is mapped onto a [`CurveType`] tag through a [`CurveRegistry`].
//!
//! The registry starts with the standard petrophysical tags and can be
//! extended with custom tags (from `[[curves.custom]]` in the config file).
//! Each entry carries the curve's unit, an optional plausibility range used for
//! QC warnings, its mnemonic aliases in priority order, and whether the curve is
//! discrete (categorical codes that must never be linearly interpolated).

use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::config::CustomCurveConfig;

// ============================================================================
// Curve Type
// ============================================================================

/// Physical measurement type of a log curve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CurveType {
    /// Gamma ray
    Gr,
    /// Bulk density
    Rhob,
    /// Neutron porosity
    Nphi,
    /// Compressional sonic slowness
    Dt,
    /// Deep resistivity
    Rt,
    /// Medium resistivity
    Rm,
    /// Shallow resistivity
    Rs,
    /// Spontaneous potential
    Sp,
    /// Caliper
    Cali,
    /// Density correction
    Drho,
    /// Photoelectric factor
    Pef,
    /// Spectral gamma potassium
    K,
    /// Spectral gamma thorium
    Th,
    /// Spectral gamma uranium
    U,
    /// Gamma ray minus uranium
    Kth,
    /// Lithology code
    Lith,
    /// Facies code
    Facies,
    /// Tag registered at runtime. Always upper-case.
    Custom(String),
}

impl CurveType {
    /// All built-in tags, in canonical order.
    pub const STANDARD: [CurveType; 17] = [
        Self::Gr,
        Self::Rhob,
        Self::Nphi,
        Self::Dt,
        Self::Rt,
        Self::Rm,
        Self::Rs,
        Self::Sp,
        Self::Cali,
        Self::Drho,
        Self::Pef,
        Self::K,
        Self::Th,
        Self::U,
        Self::Kth,
        Self::Lith,
        Self::Facies,
    ];

    /// Canonical mnemonic written to output files and reports.
    pub fn mnemonic(&self) -> &str {
        match self {
            Self::Gr => "GR",
            Self::Rhob => "RHOB",
            Self::Nphi => "NPHI",
            Self::Dt => "DT",
            Self::Rt => "RT",
            Self::Rm => "RM",
            Self::Rs => "RS",
            Self::Sp => "SP",
            Self::Cali => "CALI",
            Self::Drho => "DRHO",
            Self::Pef => "PEF",
            Self::K => "K",
            Self::Th => "TH",
            Self::U => "U",
            Self::Kth => "KTH",
            Self::Lith => "LITH",
            Self::Facies => "FACIES",
            Self::Custom(tag) => tag,
        }
    }

    /// Build a custom tag, normalising case.
    pub fn custom(tag: &str) -> Self {
        Self::Custom(tag.trim().to_uppercase())
    }
}

impl fmt::Display for CurveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl Serialize for CurveType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.mnemonic())
    }
}

// ============================================================================
// Curve Spec
// ============================================================================

/// Registry entry describing one curve type.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSpec {
    pub curve_type: CurveType,
    pub unit: String,
    /// Plausible (min, max) values; samples outside are flagged, not dropped.
    pub valid_range: Option<(f64, f64)>,
    /// Source mnemonics mapped to this tag, highest priority first.
    pub aliases: Vec<String>,
    pub discrete: bool,
}

impl CurveSpec {
    fn standard(
        curve_type: CurveType,
        unit: &str,
        valid_range: Option<(f64, f64)>,
        aliases: &[&str],
    ) -> Self {
        Self {
            curve_type,
            unit: unit.to_string(),
            valid_range,
            aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
            discrete: false,
        }
    }

    /// Whether a value lies inside the plausibility range (always true without one).
    pub fn in_range(&self, value: f64) -> bool {
        self.valid_range
            .map_or(true, |(lo, hi)| value >= lo && value <= hi)
    }
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Curve tag '{0}' is already registered")]
    DuplicateTag(String),

    #[error("Alias '{alias}' for '{tag}' already maps to '{existing}'")]
    AliasConflict {
        alias: String,
        tag: String,
        existing: String,
    },

    #[error("Curve tag must not be empty")]
    EmptyTag,
}

/// Mapping from curve tags to their specs, plus a case-insensitive alias index.
#[derive(Debug, Clone)]
pub struct CurveRegistry {
    specs: BTreeMap<CurveType, CurveSpec>,
    /// Upper-cased alias -> (tag, priority within that tag's alias list)
    alias_index: HashMap<String, (CurveType, usize)>,
}

impl Default for CurveRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl CurveRegistry {
    /// An empty registry with no tags at all.
    pub fn empty() -> Self {
        Self {
            specs: BTreeMap::new(),
            alias_index: HashMap::new(),
        }
    }

    /// Registry preloaded with the standard petrophysical tags.
    pub fn standard() -> Self {
        use CurveType as C;

        let mut specs = vec![
            CurveSpec::standard(
                C::Gr,
                "GAPI",
                Some((0.0, 300.0)),
                &["GR", "CGR", "SGR", "GAMMA", "GAMMARAY"],
            ),
            CurveSpec::standard(
                C::Rhob,
                "G/C3",
                Some((1.0, 3.0)),
                &["RHOB", "RHOZ", "DEN", "DENSITY", "ZDEN"],
            ),
            CurveSpec::standard(
                C::Nphi,
                "V/V",
                Some((-0.15, 0.60)),
                &["NPHI", "TNPH", "NEU", "NEUTRON", "NPOR", "PHIN", "CN", "CNC", "SNP"],
            ),
            CurveSpec::standard(
                C::Dt,
                "US/F",
                Some((40.0, 250.0)),
                &["DT", "DTC", "AC", "SONIC", "DTCO"],
            ),
            CurveSpec::standard(
                C::Rt,
                "OHMM",
                Some((0.1, 10_000.0)),
                &["RT", "LLD", "ILD", "RD", "RESD", "LLG", "RILD", "RDEEP"],
            ),
            CurveSpec::standard(C::Rm, "OHMM", None, &["RM", "RILM", "RMED", "RIM"]),
            CurveSpec::standard(
                C::Rs,
                "OHMM",
                None,
                &["RS", "LLS", "ILS", "RESS", "RXOZ", "RSHALLOW"],
            ),
            CurveSpec::standard(C::Sp, "MV", Some((-200.0, 200.0)), &["SP", "SSP", "SPONT"]),
            CurveSpec::standard(
                C::Cali,
                "IN",
                Some((4.0, 20.0)),
                &["CALI", "CAL", "CALIPER", "HCAL"],
            ),
            CurveSpec::standard(
                C::Drho,
                "G/C3",
                None,
                &["DRHO", "DPHI_CORR", "DCOR", "ZCOR", "ZCORR"],
            ),
            CurveSpec::standard(C::Pef, "B/E", Some((0.0, 10.0)), &["PEF", "PE", "PEFZ"]),
            CurveSpec::standard(C::K, "%", None, &["K", "POTA", "POTASSIUM"]),
            CurveSpec::standard(C::Th, "PPM", None, &["TH", "THOR", "THORIUM"]),
            CurveSpec::standard(C::U, "PPM", None, &["U", "URAN", "URANIUM"]),
            CurveSpec::standard(C::Kth, "GAPI", None, &["KTH"]),
            CurveSpec::standard(C::Lith, "", None, &["LITH", "LITHOLOGY", "LITH_CODE"]),
            CurveSpec::standard(C::Facies, "", None, &["FACIES", "FACIES_CODE"]),
        ];
        for spec in &mut specs {
            spec.discrete = matches!(spec.curve_type, C::Lith | C::Facies);
        }

        let mut registry = Self::empty();
        for spec in specs {
            registry.insert_unchecked(spec);
        }
        registry
    }

    /// Standard registry extended with custom tags from configuration.
    pub fn with_custom(custom: &[CustomCurveConfig]) -> Result<Self, RegistryError> {
        let mut registry = Self::standard();
        for entry in custom {
            let tag = CurveType::custom(&entry.tag);
            if tag.mnemonic().is_empty() {
                return Err(RegistryError::EmptyTag);
            }
            let mut aliases = vec![tag.mnemonic().to_string()];
            aliases.extend(entry.aliases.iter().cloned());
            let valid_range = match (entry.min, entry.max) {
                (Some(lo), Some(hi)) => Some((lo, hi)),
                (Some(lo), None) => Some((lo, f64::INFINITY)),
                (None, Some(hi)) => Some((f64::NEG_INFINITY, hi)),
                (None, None) => None,
            };
            registry.register(CurveSpec {
                curve_type: tag,
                unit: entry.unit.clone(),
                valid_range,
                aliases,
                discrete: entry.discrete,
            })?;
        }
        Ok(registry)
    }

    /// Register a new tag. Fails if the tag or any alias is already taken.
    pub fn register(&mut self, spec: CurveSpec) -> Result<(), RegistryError> {
        if self.specs.contains_key(&spec.curve_type) {
            return Err(RegistryError::DuplicateTag(spec.curve_type.to_string()));
        }
        for alias in &spec.aliases {
            let key = alias.trim().to_uppercase();
            if let Some((existing, _)) = self.alias_index.get(&key) {
                if existing != &spec.curve_type {
                    return Err(RegistryError::AliasConflict {
                        alias: alias.clone(),
                        tag: spec.curve_type.to_string(),
                        existing: existing.to_string(),
                    });
                }
            }
        }
        debug!(tag = %spec.curve_type, aliases = spec.aliases.len(), "Registered curve type");
        self.insert_unchecked(spec);
        Ok(())
    }

    fn insert_unchecked(&mut self, spec: CurveSpec) {
        for (priority, alias) in spec.aliases.iter().enumerate() {
            self.alias_index
                .entry(alias.trim().to_uppercase())
                .or_insert_with(|| (spec.curve_type.clone(), priority));
        }
        self.specs.insert(spec.curve_type.clone(), spec);
    }

    /// Resolve a source mnemonic (case-insensitive) to its tag.
    pub fn resolve(&self, mnemonic: &str) -> Option<&CurveType> {
        self.resolve_with_priority(mnemonic).map(|(t, _)| t)
    }

    /// Resolve a mnemonic, also returning its alias priority (0 = preferred).
    pub fn resolve_with_priority(&self, mnemonic: &str) -> Option<(&CurveType, usize)> {
        self.alias_index
            .get(&mnemonic.trim().to_uppercase())
            .map(|(t, p)| (t, *p))
    }

    pub fn spec(&self, curve_type: &CurveType) -> Option<&CurveSpec> {
        self.specs.get(curve_type)
    }

    pub fn is_discrete(&self, curve_type: &CurveType) -> bool {
        self.spec(curve_type).is_some_and(|s| s.discrete)
    }

    pub fn unit(&self, curve_type: &CurveType) -> &str {
        self.spec(curve_type).map_or("", |s| s.unit.as_str())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CurveSpec> {
        self.specs.values()
    }
}
