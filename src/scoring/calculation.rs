//! Calculation validator
//!
//! The correct result is computed from the student's own burette reading, not
//! from the theoretical volume, so only the arithmetic is judged here. Reading
//! errors are scored separately by the endpoint criterion.

use serde::{Deserialize, Serialize};

use crate::chemistry::{round_to, ReactionModel};
use crate::error::Result;
use crate::practice::PracticeDefinition;

/// Decimal places of the reported results and percent error
pub const RESULT_DECIMALS: i32 = 2;

/// Outcome of a calculation validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationCheck {
    /// Correct result for the student's reading, 2 decimals
    pub correct_result: f64,

    /// Submitted result, 2 decimals
    pub student_result: f64,

    /// Percent error, 2 decimals
    pub percent_error: f64,

    pub is_within_tolerance: bool,

    /// Accepted percent error
    pub tolerance: f64,

    pub feedback: String,

    /// Interpretation label of the correct result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
}

/// `|student − correct| / |correct| × 100`, 0 when `correct` is 0
pub fn percent_error(student: f64, correct: f64) -> f64 {
    if correct == 0.0 {
        0.0
    } else {
        (student - correct).abs() / correct.abs() * 100.0
    }
}

/// Check a submitted result against the practice formula
///
/// The tolerance test uses the unrounded percent error.
///
/// # Errors
///
/// `UnsupportedPractice` when the model does not handle the practice's
/// chemistry, `InvalidConfig` when the practice lacks a calculation section,
/// `InvalidInput` for an unusable sample measurement.
pub fn validate_calculation(
    model: &dyn ReactionModel,
    practice: &PracticeDefinition,
    recorded_volume: f64,
    measured_value: f64,
    student_result: f64,
) -> Result<CalculationCheck> {
    let calculation = practice.calculation()?;
    let correct = model.correct_result(practice, recorded_volume, measured_value)?;
    let error = percent_error(student_result, correct);
    let tolerance = calculation.tolerance;
    let is_within_tolerance = error <= tolerance;

    let feedback = if is_within_tolerance {
        format!(
            "Correct. Your result ({student_result:.2}) is within the {tolerance}% tolerance. Error: {error:.2}%."
        )
    } else {
        format!(
            "Your result ({student_result:.2}) differs from the expected value ({correct:.2}) with an error of {error:.2}%."
        )
    };

    log::debug!(
        "Practice {} calculation: correct {correct:.4}, student {student_result}, error {error:.3}%",
        practice.id
    );

    Ok(CalculationCheck {
        correct_result: round_to(correct, RESULT_DECIMALS),
        student_result: round_to(student_result, RESULT_DECIMALS),
        percent_error: round_to(error, RESULT_DECIMALS),
        is_within_tolerance,
        tolerance,
        feedback,
        interpretation: calculation.interpret(correct).map(str::to_string),
    })
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LabError;
    use crate::models::{BackTitrationModel, ComplexometricModel};
    use crate::practice::PracticeCatalog;
    use approx::assert_relative_eq;

    #[test]
    fn test_percent_error_guards_zero() {
        assert_eq!(percent_error(3.0, 0.0), 0.0);
        assert_relative_eq!(percent_error(110.0, 100.0), 10.0, epsilon = 1e-12);
        assert_relative_eq!(percent_error(-90.0, -100.0), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_hardness_example() {
        let catalog = PracticeCatalog::builtin().unwrap();
        let practice = catalog.get(5).unwrap();
        let check = validate_calculation(&ComplexometricModel, practice, 6.5, 100.0, 65.0).unwrap();
        assert_eq!(check.correct_result, 65.06);
        assert_eq!(check.student_result, 65.0);
        assert_eq!(check.percent_error, 0.09);
        assert!(check.is_within_tolerance);
        assert_eq!(check.tolerance, 2.0);
        assert!(check.feedback.starts_with("Correct."));
        assert_eq!(check.interpretation.as_deref(), Some("Moderately hard water"));
    }

    #[test]
    fn test_outside_tolerance() {
        let catalog = PracticeCatalog::builtin().unwrap();
        let practice = catalog.get(4).unwrap();
        let check = validate_calculation(&BackTitrationModel, practice, 16.93, 10.0, 14.0).unwrap();
        assert_eq!(check.correct_result, 12.92);
        assert!(!check.is_within_tolerance);
        assert!(check.feedback.contains("differs from the expected value (12.92)"));
    }

    #[test]
    fn test_model_family_mismatch() {
        let catalog = PracticeCatalog::builtin().unwrap();
        let practice = catalog.get(4).unwrap();
        let err = validate_calculation(&ComplexometricModel, practice, 16.93, 10.0, 12.9).unwrap_err();
        assert!(matches!(err, LabError::UnsupportedPractice { .. }));
    }
}
