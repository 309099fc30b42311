//! Export of curve data
//!
//! | Format | Module    |
//! |--------|-----------|
//! | CSV    | [`csv`]   |
//!
//! ```rust,ignore
//! use titra_rs::output::export::{export_curve_csv, CsvConfig};
//!
//! export_curve_csv(&curve, "hardness.csv", Some(&CsvConfig::european()))?;
//! ```

pub mod csv;

pub use csv::{curve_csv_string, export_curve_csv, write_curve_csv, CsvConfig, CsvMetadata};
