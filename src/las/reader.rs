//! LAS 2.0 reader.
//!
//! Header lines have the form `MNEM.UNIT  DATA : DESCRIPTION`. The unit runs
//! from the first `.` to the next whitespace; the description starts after
//! the last `:`. Only unwrapped files are accepted.

use statrs::statistics::{Data, OrderStatistics};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

use super::LasError;
use crate::config::defaults::{
    COMMON_NULL_VALUES, DEPTH_EPSILON_FT, DEPTH_MNEMONICS, LAS_NULL_VALUE,
};
use crate::config::LasConfig;
use crate::curves::{CurveRegistry, CurveType};
use crate::types::{DepthUnit, LogCurve, WellDataset};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Version,
    Well,
    Curve,
    Parameter,
    Other,
    Ascii,
}

impl Section {
    fn from_marker(line: &str) -> Self {
        match line
            .trim_start_matches('~')
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
        {
            Some('V') => Self::Version,
            Some('W') => Self::Well,
            Some('C') => Self::Curve,
            Some('P') => Self::Parameter,
            Some('A') => Self::Ascii,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct HeaderLine {
    mnemonic: String,
    unit: String,
    value: String,
}

fn parse_header_line(line: &str, line_no: usize) -> Result<HeaderLine, LasError> {
    let Some((mnemonic, rest)) = line.split_once('.') else {
        return Err(LasError::Syntax {
            line: line_no,
            message: format!("expected 'MNEM.UNIT DATA : DESCRIPTION', got '{}'", line.trim()),
        });
    };
    let unit_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let (unit, rest) = rest.split_at(unit_end);
    // A unit running straight into the description colon ("DEPT.M:")
    let (unit, rest) = match unit.split_once(':') {
        Some((u, _)) => (u, ""),
        None => (unit, rest),
    };
    let value = match rest.rfind(':') {
        Some(idx) => &rest[..idx],
        None => rest,
    };
    Ok(HeaderLine {
        mnemonic: mnemonic.trim().to_uppercase(),
        unit: unit.trim().to_string(),
        value: value.trim().to_string(),
    })
}

fn parse_number(value: &str, line: usize) -> Result<f64, LasError> {
    value.trim().parse::<f64>().map_err(|_| LasError::InvalidNumber {
        line,
        value: value.trim().to_string(),
    })
}

/// `~Well` section values of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct LasWellInfo {
    pub well_name: String,
    pub field: Option<String>,
    pub company: Option<String>,
    pub uwi: Option<String>,
    pub null_value: f64,
    pub depth_unit: DepthUnit,
    pub start: Option<f64>,
    pub stop: Option<f64>,
    pub step: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnmappedReason {
    /// No registry tag has this mnemonic as an alias
    Unknown,
    /// Another column mapped to the same tag with higher alias priority
    Superseded { by: String },
}

/// A column that did not become a curve of the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmappedCurve {
    pub mnemonic: String,
    pub unit: String,
    pub reason: UnmappedReason,
}

/// A parsed LAS file.
#[derive(Debug, Clone, PartialEq)]
pub struct LasFile {
    pub well: LasWellInfo,
    pub dataset: WellDataset,
    pub unmapped: Vec<UnmappedCurve>,
}

struct NullMatcher {
    sentinels: Vec<f64>,
    tolerance: f64,
}

impl NullMatcher {
    fn new(declared: f64, config: &LasConfig) -> Self {
        let mut sentinels = vec![declared];
        sentinels.extend(COMMON_NULL_VALUES);
        sentinels.extend(config.extra_null_values.iter().copied());
        Self {
            sentinels,
            tolerance: config.null_tolerance,
        }
    }

    fn clean(&self, value: f64) -> Option<f64> {
        let is_null = !value.is_finite()
            || self
                .sentinels
                .iter()
                .any(|s| (value - s).abs() < self.tolerance);
        (!is_null).then_some(value)
    }
}

/// Read and parse a LAS file. The dataset id is the file name.
pub fn read_las(
    path: &Path,
    registry: &CurveRegistry,
    config: &LasConfig,
) -> Result<LasFile, LasError> {
    let text = std::fs::read_to_string(path).map_err(|e| LasError::Io(path.to_path_buf(), e))?;
    let id = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    parse_las(&text, &id, registry, config)
}

/// Parse LAS 2.0 text into a dataset named `dataset_id`.
pub fn parse_las(
    text: &str,
    dataset_id: &str,
    registry: &CurveRegistry,
    config: &LasConfig,
) -> Result<LasFile, LasError> {
    let mut section = Section::Other;
    let mut well: HashMap<String, HeaderLine> = HashMap::new();
    let mut curves: Vec<HeaderLine> = Vec::new();
    let mut rows: Vec<(usize, Vec<&str>)> = Vec::new();
    let mut saw_curves = false;
    let mut saw_data = false;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('~') {
            section = Section::from_marker(line);
            saw_curves |= section == Section::Curve;
            saw_data |= section == Section::Ascii;
            continue;
        }
        match section {
            Section::Version => {
                let header = parse_header_line(line, line_no)?;
                if header.mnemonic == "WRAP" && header.value.to_uppercase().starts_with("YES") {
                    return Err(LasError::Wrapped);
                }
            }
            Section::Well => {
                let header = parse_header_line(line, line_no)?;
                well.insert(header.mnemonic.clone(), header);
            }
            Section::Curve => curves.push(parse_header_line(line, line_no)?),
            Section::Ascii => rows.push((line_no, line.split_whitespace().collect())),
            Section::Parameter | Section::Other => {}
        }
    }

    let well_info = well_info(&well, curves.first())?;
    if !saw_curves || curves.is_empty() {
        return Err(LasError::NoCurves);
    }
    if !saw_data {
        return Err(LasError::NoData);
    }
    let depth_mnemonic = &curves[0].mnemonic;
    if !DEPTH_MNEMONICS.contains(&depth_mnemonic.as_str()) {
        return Err(LasError::NoDepthCurve(depth_mnemonic.clone()));
    }

    let nulls = NullMatcher::new(well_info.null_value, config);
    let mut samples: Vec<(f64, Vec<Option<f64>>)> = Vec::with_capacity(rows.len());
    let mut skipped_rows = 0usize;
    for (line_no, tokens) in rows {
        if tokens.len() != curves.len() {
            return Err(LasError::ColumnCount {
                line: line_no,
                expected: curves.len(),
                found: tokens.len(),
            });
        }
        let depth = parse_number(tokens[0], line_no)?;
        if nulls.clean(depth).is_none() {
            skipped_rows += 1;
            continue;
        }
        let values = tokens[1..]
            .iter()
            .map(|t| parse_number(t, line_no).map(|v| nulls.clean(v)))
            .collect::<Result<Vec<_>, _>>()?;
        samples.push((depth, values));
    }
    if skipped_rows > 0 {
        warn!(dataset = dataset_id, rows = skipped_rows, "Skipped rows with null depth");
    }

    let (depths, columns) = collapse_duplicate_depths(samples, curves.len() - 1, dataset_id);

    let (mapped, unmapped) = map_columns(&curves[1..], registry);
    let mut dataset =
        WellDataset::new(dataset_id, well_info.well_name.clone(), well_info.depth_unit);
    for (column, curve_type) in mapped {
        let header = &curves[column + 1];
        let unit = if header.unit.is_empty() {
            registry.unit(&curve_type).to_string()
        } else {
            header.unit.clone()
        };
        let curve = LogCurve::new(curve_type, unit, depths.clone(), columns[column].clone())?;
        dataset = dataset.with_curve(curve)?;
    }

    for u in &unmapped {
        match &u.reason {
            UnmappedReason::Unknown => {
                debug!(dataset = dataset_id, mnemonic = %u.mnemonic, "Unmapped curve");
            }
            UnmappedReason::Superseded { by } => {
                debug!(
                    dataset = dataset_id,
                    mnemonic = %u.mnemonic,
                    by = %by,
                    "Lower-priority alias ignored"
                );
            }
        }
    }
    debug!(
        dataset = dataset_id,
        well = %well_info.well_name,
        unit = %well_info.depth_unit,
        curves = dataset.curve_count(),
        samples = depths.len(),
        "LAS file parsed"
    );

    Ok(LasFile {
        well: well_info,
        dataset,
        unmapped,
    })
}

fn well_info(
    well: &HashMap<String, HeaderLine>,
    depth_curve: Option<&HeaderLine>,
) -> Result<LasWellInfo, LasError> {
    let text = |key: &str| {
        well.get(key)
            .map(|h| h.value.clone())
            .filter(|v| !v.is_empty())
    };
    let number = |key: &str| text(key).and_then(|v| v.parse::<f64>().ok());

    let well_name = text("WELL").ok_or(LasError::MissingHeader("WELL"))?;
    let depth_unit = well
        .get("STRT")
        .and_then(|h| DepthUnit::parse(&h.unit))
        .or_else(|| depth_curve.and_then(|c| DepthUnit::parse(&c.unit)))
        .unwrap_or(DepthUnit::Meters);

    Ok(LasWellInfo {
        well_name,
        field: text("FLD"),
        company: text("COMP"),
        uwi: text("UWI"),
        null_value: number("NULL").unwrap_or(LAS_NULL_VALUE),
        depth_unit,
        start: number("STRT"),
        stop: number("STOP"),
        step: number("STEP"),
    })
}

/// Sort rows by depth and collapse rows sharing a depth to the per-column
/// median of their valid values.
fn collapse_duplicate_depths(
    mut samples: Vec<(f64, Vec<Option<f64>>)>,
    n_columns: usize,
    dataset_id: &str,
) -> (Vec<f64>, Vec<Vec<Option<f64>>>) {
    samples.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut depths: Vec<f64> = Vec::with_capacity(samples.len());
    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(samples.len()); n_columns];
    let mut duplicates = 0usize;

    let mut start = 0;
    while start < samples.len() {
        let depth = samples[start].0;
        let mut end = start + 1;
        while end < samples.len() && samples[end].0 - depth <= DEPTH_EPSILON_FT {
            end += 1;
        }
        duplicates += end - start - 1;
        depths.push(depth);
        for (c, column) in columns.iter_mut().enumerate() {
            let valid: Vec<f64> = samples[start..end].iter().filter_map(|s| s.1[c]).collect();
            column.push(match valid.len() {
                0 => None,
                1 => Some(valid[0]),
                _ => Some(Data::new(valid).median()),
            });
        }
        start = end;
    }

    if duplicates > 0 {
        warn!(dataset = dataset_id, rows = duplicates, "Collapsed duplicate depth rows");
    }
    (depths, columns)
}

/// Map non-depth columns to tags. When several columns resolve to one tag the
/// alias with the best priority wins, ties going to the earlier column.
fn map_columns(
    columns: &[HeaderLine],
    registry: &CurveRegistry,
) -> (Vec<(usize, CurveType)>, Vec<UnmappedCurve>) {
    let mut best: HashMap<CurveType, (usize, usize)> = HashMap::new();
    let mut unmapped = Vec::new();

    for (i, col) in columns.iter().enumerate() {
        match registry.resolve_with_priority(&col.mnemonic) {
            Some((tag, priority)) => {
                let entry = best.entry(tag.clone()).or_insert((i, priority));
                if priority < entry.1 {
                    *entry = (i, priority);
                }
            }
            None => unmapped.push(UnmappedCurve {
                mnemonic: col.mnemonic.clone(),
                unit: col.unit.clone(),
                reason: UnmappedReason::Unknown,
            }),
        }
    }

    for (i, col) in columns.iter().enumerate() {
        if let Some((tag, _)) = registry.resolve_with_priority(&col.mnemonic) {
            if let Some(&(winner, _)) = best.get(tag) {
                if winner != i {
                    unmapped.push(UnmappedCurve {
                        mnemonic: col.mnemonic.clone(),
                        unit: col.unit.clone(),
                        reason: UnmappedReason::Superseded {
                            by: columns[winner].mnemonic.clone(),
                        },
                    });
                }
            }
        }
    }

    let mut mapped: Vec<(usize, CurveType)> = best.into_iter().map(|(t, (i, _))| (i, t)).collect();
    mapped.sort_by_key(|(i, _)| *i);
    (mapped, unmapped)
}
