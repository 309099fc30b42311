//! Practice definitions, catalog and student sessions
//!
//! - `definition`: serde types of one practice (titration, chemistry,
//!   calculation and evaluation sections)
//! - `catalog`: validated, read-only collection of definitions
//! - `session`: mutable record of one student attempt
//! - `materials`: instrument and reagent selection check

pub mod catalog;
pub mod definition;
pub mod materials;
pub mod session;

pub use catalog::PracticeCatalog;
pub use definition::{
    BackTitrationParams, BoundQuantity, CalculationConfig, CalculationVariable, ChemistryConfig,
    ColorTransition, ComplexometricParams, Criterion, CriterionId, CriterionKind,
    EvaluationConfig, FeedbackConfig, Interpretation, InterpretationRange, MeasurementConfig,
    OutcomeFeedback, PracticeDefinition, Proportionality, ReactionFamily, ScoringTier,
    TitrationConfig, VariableSource, CATCH_ALL_MAX_ERROR,
};
pub use materials::{check_materials, MaterialSelection, MaterialsCheck};
pub use session::{SessionRecord, SessionStatus};
