//! Visualization of titration curves using the `plotters` library
//!
//! # Organization
//!
//! - **config**: Plot configuration (`PlotConfig`)
//! - **titration_curve**: Curve chart with tolerance band, equivalence marker
//!   and student reading
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use titra_rs::output::visualization::{render_curve, ImageFormat, PlotConfig};
//!
//! let bytes = render_curve(&curve, Some(6.55), ImageFormat::Png, None)?;
//!
//! let config = PlotConfig::titration_curve("Hardness, tap water");
//! let svg = render_curve(&curve, Some(6.55), ImageFormat::Svg, Some(&config))?;
//! ```

pub mod config;
pub mod titration_curve;

pub use config::{IntoOptionalTitle, PlotConfig, NO_TITLE};
pub use titration_curve::{plot_titration_curve, render_curve, ImageFormat};
