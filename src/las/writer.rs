//! LAS 2.0 export of merged datasets.

use chrono::NaiveDate;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

use super::LasError;
use crate::config::defaults::{DEFAULT_EXPORT_COMPANY, LAS_NULL_VALUE};
use crate::merge::{MergedDataset, SpanSource};
use crate::types::DepthUnit;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Written to `COMP`
    pub company: String,
    /// Written to `DATE`
    pub date: NaiveDate,
}

impl WriteOptions {
    /// Options dated today (local time).
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            date: chrono::Local::now().date_naive(),
        }
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self::new(DEFAULT_EXPORT_COMPANY)
    }
}

fn header_line(out: &mut String, mnemonic: &str, unit: &str, value: &str, description: &str) {
    let _ = writeln!(out, " {mnemonic:<8}.{unit:<8} {value:>20} : {description}");
}

fn format_value(value: Option<f64>) -> String {
    format!("{:.4}", value.unwrap_or(LAS_NULL_VALUE))
}

/// Render `merged` as LAS 2.0 text with depths in feet.
pub fn write_las(merged: &MergedDataset, options: &WriteOptions) -> String {
    let grid = &merged.grid;
    let unit = DepthUnit::Feet.las_unit();
    let mut out = String::new();

    out.push_str("~Version Information\n");
    header_line(&mut out, "VERS", "", "2.0", "CWLS LOG ASCII STANDARD - VERSION 2.0");
    header_line(&mut out, "WRAP", "", "NO", "ONE LINE PER DEPTH STEP");

    out.push_str("~Well Information\n");
    header_line(&mut out, "STRT", unit, &format!("{:.4}", grid.start()), "START DEPTH");
    header_line(&mut out, "STOP", unit, &format!("{:.4}", grid.base()), "STOP DEPTH");
    header_line(&mut out, "STEP", unit, &format!("{:.4}", grid.step()), "STEP");
    header_line(&mut out, "NULL", "", &format_value(None), "NULL VALUE");
    header_line(&mut out, "COMP", "", &options.company, "COMPANY");
    header_line(&mut out, "WELL", "", &merged.well_id, "WELL");
    header_line(
        &mut out,
        "DATE",
        "",
        &options.date.format("%Y-%m-%d").to_string(),
        "LOG DATE",
    );

    out.push_str("~Curve Information\n");
    header_line(&mut out, "DEPT", unit, "", "DEPTH");
    for (curve_type, merged_curve) in &merged.curves {
        let mut sources: Vec<&str> = Vec::new();
        for span in &merged_curve.provenance {
            if let SpanSource::Dataset(id) = &span.source {
                if !sources.contains(&id.as_str()) {
                    sources.push(id);
                }
            }
        }
        let description = if sources.is_empty() {
            "MERGED".to_string()
        } else {
            format!("MERGED FROM {}", sources.join(", "))
        };
        header_line(
            &mut out,
            curve_type.mnemonic(),
            merged_curve.curve.unit(),
            "",
            &description,
        );
    }

    out.push_str("~ASCII\n");
    for i in 0..grid.len() {
        let _ = write!(out, "{:>12.4}", grid.depth(i));
        for merged_curve in merged.curves.values() {
            let value = merged_curve.curve.values().get(i).copied().flatten();
            let _ = write!(out, " {:>12}", format_value(value));
        }
        out.push('\n');
    }
    out
}

/// Write `merged` to `path` as LAS 2.0.
pub fn write_las_file(
    path: &Path,
    merged: &MergedDataset,
    options: &WriteOptions,
) -> Result<(), LasError> {
    std::fs::write(path, write_las(merged, options))
        .map_err(|e| LasError::Io(path.to_path_buf(), e))?;
    info!(
        path = %path.display(),
        curves = merged.curves.len(),
        points = merged.grid.len(),
        "LAS file written"
    );
    Ok(())
}
