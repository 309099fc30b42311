//! CSV export of sampled titration curves
//!
//! Writes the `(volume, pX)` samples of a [`TitrationCurve`], optionally
//! preceded by `#` comment lines describing the curve.
//!
//! # Example
//!
//! ```rust,ignore
//! use titra_rs::output::export::{export_curve_csv, CsvConfig, CsvMetadata};
//!
//! let config = CsvConfig::default().with_metadata(CsvMetadata::from_curve(&curve));
//! export_curve_csv(&curve, "volhard.csv", Some(&config))?;
//! ```
//!
//! **Output** (`volhard.csv`):
//! ```csv
//! # Titration Curve Data
//! # Generated: 2026-02-11T15:30:00+00:00
//! # Reaction family: back-titration
//! # Equivalence volume: 16.93 mL
//! # pX at equivalence: 6
//! #
//! Volume (mL),pAg+
//! 0.050000,1.333654
//! ...
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};

use crate::chemistry::TitrationCurve;
use crate::error::{LabError, Result};

/// CSV export configuration
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Column delimiter (default: ',')
    pub delimiter: char,

    /// Decimal separator (default: '.')
    pub decimal_separator: char,

    /// Number of decimal places (default: 6)
    pub precision: usize,

    /// Include metadata header comments (default: false)
    pub include_metadata: bool,

    pub metadata: Option<CsvMetadata>,

    /// Volume column header (default: "Volume (mL)")
    pub volume_header: String,

    /// pX column header; empty uses `p<species>`
    pub px_header: String,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            decimal_separator: '.',
            precision: 6,
            include_metadata: false,
            metadata: None,
            volume_header: "Volume (mL)".to_string(),
            px_header: String::new(),
        }
    }
}

impl CsvConfig {
    /// European CSV format (semicolon, comma for decimal)
    pub fn european() -> Self {
        Self {
            delimiter: ';',
            decimal_separator: ',',
            ..Default::default()
        }
    }

    /// Builder pattern: set delimiter
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Builder pattern: set precision
    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Builder pattern: enable metadata
    pub fn with_metadata(mut self, metadata: CsvMetadata) -> Self {
        self.include_metadata = true;
        self.metadata = Some(metadata);
        self
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.delimiter == self.decimal_separator {
            return Err(format!(
                "delimiter and decimal separator must differ (both '{}')",
                self.delimiter
            ));
        }
        Ok(())
    }
}

/// Curve description written as header comments
///
/// Only fields that are set are written.
#[derive(Debug, Clone, Default)]
pub struct CsvMetadata {
    pub practice_name: Option<String>,
    pub reaction_family: Option<String>,
    pub equivalence_volume: Option<f64>,
    pub equivalence_px: Option<f64>,
    pub tolerance: Option<f64>,

    /// Additional key/value lines
    pub custom: Vec<(String, String)>,
}

impl CsvMetadata {
    /// Metadata describing a curve
    pub fn from_curve(curve: &TitrationCurve) -> Self {
        Self {
            practice_name: Some(curve.title.clone()),
            reaction_family: Some(curve.family.to_string()),
            equivalence_volume: Some(curve.equivalence_volume),
            equivalence_px: Some(curve.equivalence_px),
            tolerance: Some(curve.tolerance),
            custom: Vec::new(),
        }
    }

    pub fn add_custom(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.custom.push((key.into(), value.into()));
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn write_metadata_header<W: Write>(out: &mut W, metadata: &CsvMetadata) -> std::io::Result<()> {
    writeln!(out, "# Titration Curve Data")?;
    writeln!(out, "# Generated: {}", chrono::Utc::now().to_rfc3339())?;

    if let Some(name) = &metadata.practice_name {
        writeln!(out, "# Curve: {name}")?;
    }
    if let Some(family) = &metadata.reaction_family {
        writeln!(out, "# Reaction family: {family}")?;
    }
    if let Some(volume) = metadata.equivalence_volume {
        writeln!(out, "# Equivalence volume: {volume} mL")?;
    }
    if let Some(px) = metadata.equivalence_px {
        writeln!(out, "# pX at equivalence: {px}")?;
    }
    if let Some(tolerance) = metadata.tolerance {
        writeln!(out, "# Endpoint tolerance: {tolerance} mL")?;
    }
    for (key, value) in &metadata.custom {
        writeln!(out, "# {key}: {value}")?;
    }
    writeln!(out, "#")
}

/// Format number with configured precision and decimal separator
fn format_number(value: f64, config: &CsvConfig) -> String {
    let formatted = format!("{:.prec$}", value, prec = config.precision);
    if config.decimal_separator != '.' {
        formatted.replace('.', &config.decimal_separator.to_string())
    } else {
        formatted
    }
}

// =============================================================================
// Export Functions
// =============================================================================

/// Write a curve as CSV to any writer
///
/// # Errors
///
/// `InvalidInput` for an empty curve or NaN/Inf samples, `InvalidConfig` for a
/// delimiter equal to the decimal separator, `Io` on write failure.
pub fn write_curve_csv<W: Write>(
    curve: &TitrationCurve,
    out: &mut W,
    config: Option<&CsvConfig>,
) -> Result<()> {
    // ============================= Validation =============================

    if curve.is_empty() {
        return Err(LabError::InvalidInput("cannot export an empty curve".to_string()));
    }
    if curve.points().any(|(v, p)| !v.is_finite() || !p.is_finite()) {
        return Err(LabError::InvalidInput("NaN or Inf detected in curve samples".to_string()));
    }

    let binding = CsvConfig::default();
    let config = config.unwrap_or(&binding);
    config.validate().map_err(LabError::InvalidConfig)?;

    // ============================= Metadata ===============================

    if config.include_metadata {
        if let Some(metadata) = &config.metadata {
            write_metadata_header(out, metadata)?;
        }
    }

    // ============================= Header & data ==========================

    let px_header = if config.px_header.is_empty() {
        format!("p{}", curve.species_label)
    } else {
        config.px_header.clone()
    };
    writeln!(out, "{}{}{}", config.volume_header, config.delimiter, px_header)?;

    for (volume, px) in curve.points() {
        writeln!(
            out,
            "{}{}{}",
            format_number(volume, config),
            config.delimiter,
            format_number(px, config)
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Export a curve to a CSV file
pub fn export_curve_csv(
    curve: &TitrationCurve,
    output_path: &str,
    config: Option<&CsvConfig>,
) -> Result<()> {
    log::debug!("Exporting {} curve samples to {output_path}", curve.len());
    let mut writer = BufWriter::new(File::create(output_path)?);
    write_curve_csv(curve, &mut writer, config)
}

/// CSV text of a curve
pub fn curve_csv_string(curve: &TitrationCurve, config: Option<&CsvConfig>) -> Result<String> {
    let mut buffer = Vec::new();
    write_curve_csv(curve, &mut buffer, config)?;
    String::from_utf8(buffer).map_err(|e| LabError::InvalidInput(e.to_string()))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::{CurveConfig, CurveRequest, ReactionModel};
    use crate::models::BackTitrationModel;
    use crate::practice::PracticeCatalog;
    use std::io::Read;
    use tempfile::NamedTempFile;

    fn volhard_curve() -> TitrationCurve {
        let catalog = PracticeCatalog::builtin().unwrap();
        BackTitrationModel
            .curve(
                catalog.get(4).unwrap(),
                &CurveRequest::new(17.0, 16.93, 10.0),
                &CurveConfig::with_points(1000),
            )
            .unwrap()
    }

    #[test]
    fn test_header_and_rows() {
        let curve = volhard_curve();
        let csv = curve_csv_string(&curve, None).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Volume (mL),pAg+");
        assert_eq!(lines.len(), curve.len() + 1);
        assert!(lines[1].starts_with("0.050000,"));
    }

    #[test]
    fn test_european_format() {
        let curve = volhard_curve();
        let csv = curve_csv_string(&curve, Some(&CsvConfig::european().precision(2))).unwrap();
        let first = csv.lines().nth(1).unwrap();
        assert!(first.starts_with("0,05;"));
    }

    #[test]
    fn test_metadata_header() {
        let curve = volhard_curve();
        let config = CsvConfig::default().with_metadata(CsvMetadata::from_curve(&curve));
        let csv = curve_csv_string(&curve, Some(&config)).unwrap();
        assert!(csv.starts_with("# Titration Curve Data\n# Generated: "));
        assert!(csv.contains("# Reaction family: back-titration"));
        assert!(csv.contains("# Equivalence volume: 16.93 mL"));
    }

    #[test]
    fn test_conflicting_separators() {
        let curve = volhard_curve();
        let config = CsvConfig::default().delimiter('.');
        assert!(matches!(
            curve_csv_string(&curve, Some(&config)),
            Err(LabError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_export_to_file() {
        let curve = volhard_curve();
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap().to_string();
        export_curve_csv(&curve, &path, None).unwrap();

        let mut contents = String::new();
        File::open(&path).unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents.lines().count(), curve.len() + 1);
    }
}
