//! titra-rs: Titration Simulation and Scoring Engine
//!
//! The computational core of a virtual chemistry lab trainer. Given a practice
//! definition (titrant, concentrations, proportionality rule, indicator colors,
//! evaluation rubric) and the values a student records during an attempt, the
//! engine:
//!
//! 1. resolves the expected titrant volume for the measured sample
//! 2. interpolates the solution color along the titration
//! 3. generates the theoretical pX-versus-volume curve from closed-form
//!    equilibrium models and renders it as SVG or PNG
//! 4. validates the student's calculation and scores the whole attempt
//!
//! # Architecture
//!
//! - Practice data is read-only: a [`PracticeCatalog`](practice::PracticeCatalog)
//!   is built once and shared.
//! - Chemistry is dispatched by reaction family through a
//!   [`ReactionRegistry`](chemistry::ReactionRegistry); each family is a
//!   [`ReactionModel`](chemistry::ReactionModel).
//! - Curve math is pure; rendering is a separate step in [`output`].
//!
//! # Quick Start
//!
//! ```rust
//! use titra_rs::prelude::*;
//!
//! # fn main() -> Result<(), LabError> {
//! let engine = LabEngine::builtin()?;
//!
//! // Water hardness (practice 5)
//! let mut session = engine.start_session(5, "Ada")?;
//! engine.check_materials(
//!     &mut session,
//!     &MaterialSelection::new(
//!         ["PRO-250", "ERL-250", "BUR-050"],
//!         ["TAMPON-PH10", "IND-NET", "EDTA-001M"],
//!     ),
//! )?;
//! engine.record_measurement(&mut session, 100.0, "mL", None)?;
//! session.record_assembly(true);
//! session.record_titration(6.55);
//! engine.submit_calculation(&mut session, 65.0)?;
//!
//! let report = engine.generate_report(&mut session)?;
//! assert_eq!(report.total_score, 100.0);
//! assert!(report.passed);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`practice`]: Practice definitions, catalog, sessions
//! - [`chemistry`]: Resolver, colors, curve types, model registry
//! - [`models`]: Closed-form reaction models
//! - [`scoring`]: Calculation validation and rubric scoring
//! - [`output`]: Curve charts and CSV export
//! - [`service`]: Engine facade keyed by practice id

pub mod chemistry;
pub mod error;
pub mod models;
pub mod output;
pub mod practice;
pub mod scoring;
pub mod service;

pub use error::{LabError, Result};
pub use service::{LabEngine, ResolvedVolume};

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use titra_rs::prelude::*;
    //! ```
    pub use crate::chemistry::{
        color_at, CurveConfig, CurveRequest, ReactionModel, ReactionRegistry, Rgb,
        TitrationCurve,
    };
    pub use crate::error::LabError;
    pub use crate::output::{ImageFormat, PlotConfig};
    pub use crate::practice::{
        MaterialSelection, PracticeCatalog, PracticeDefinition, SessionRecord, SessionStatus,
    };
    pub use crate::scoring::{CalculationCheck, EvaluationReport};
    pub use crate::service::{LabEngine, ResolvedVolume};
}
