//! Scoring
//!
//! - `tiers`: tolerance tier lookup shared by the range criteria
//! - `calculation`: validation of the student's numeric result
//! - `report`: rubric evaluation of a whole session

pub mod calculation;
pub mod report;
pub mod tiers;

pub use calculation::{percent_error, validate_calculation, CalculationCheck, RESULT_DECIMALS};
pub use report::{score_session, CriterionResult, EvaluationReport};
pub use tiers::select_tier;
