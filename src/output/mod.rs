//! Output of titration curves
//!
//! - **Visualization**: SVG/PNG charts using plotters
//! - **Export**: CSV data export for external analysis
//!
//! # Architecture
//!
//! ```text
//! output/
//! ├── mod.rs                  ← This file
//! ├── visualization/          ← Charts
//! │   ├── mod.rs
//! │   ├── config.rs
//! │   └── titration_curve.rs
//! └── export/                 ← Data export
//!     ├── mod.rs
//!     └── csv.rs
//! ```
//!
//! Both sub-modules take an already computed
//! [`TitrationCurve`](crate::chemistry::TitrationCurve); the curve math never
//! depends on rendering.

pub mod export;
pub mod visualization;

pub use export::{export_curve_csv, CsvConfig, CsvMetadata};
pub use visualization::{plot_titration_curve, render_curve, ImageFormat, PlotConfig};
