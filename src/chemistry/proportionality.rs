//! Expected titrant volume at equivalence
//!
//! A practice states the volume consumed for a reference measurement and a
//! proportionality rule:
//!
//! | Rule      | Expected volume                     |
//! |-----------|-------------------------------------|
//! | `fixed`   | `base`                              |
//! | `direct`  | `base × measured / reference`       |
//! | `inverse` | `base × reference / measured`       |
//!
//! `base` is the per-sample volume when the practice has one for the given
//! sample, otherwise `expectedVolume`.

use crate::error::{LabError, Result};
use crate::practice::{PracticeDefinition, Proportionality, TitrationConfig};

/// Decimal places kept when an expected volume is stored
pub const VOLUME_DECIMALS: i32 = 4;

/// Expected titrant volume \[mL\] for a titration configuration
///
/// The measured value is ignored by the `fixed` rule.
///
/// # Errors
///
/// `InvalidInput` when a `direct` or `inverse` rule receives a measured value
/// that is not a positive finite number.
pub fn expected_volume(
    titration: &TitrationConfig,
    measured_value: f64,
    sample_id: Option<&str>,
) -> Result<f64> {
    let base = titration.base_volume(sample_id);

    let volume = match titration.proportionality {
        Proportionality::Fixed => base,
        Proportionality::Direct => {
            check_measured(measured_value)?;
            base * (measured_value / titration.reference_value)
        }
        Proportionality::Inverse => {
            check_measured(measured_value)?;
            base * (titration.reference_value / measured_value)
        }
    };

    log::debug!(
        "Expected volume {volume:.4} mL ({:?}, measured {measured_value}, base {base})",
        titration.proportionality
    );
    Ok(volume)
}

/// Expected titrant volume for a practice
///
/// # Errors
///
/// `InvalidConfig` when the practice has no titration section, plus the errors
/// of [`expected_volume`].
pub fn resolve_expected_volume(
    practice: &PracticeDefinition,
    measured_value: f64,
    sample_id: Option<&str>,
) -> Result<f64> {
    expected_volume(practice.titration()?, measured_value, sample_id)
}

/// Round to a number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn check_measured(measured_value: f64) -> Result<()> {
    if measured_value.is_finite() && measured_value > 0.0 {
        Ok(())
    } else {
        Err(LabError::InvalidInput(format!(
            "measured value must be a positive number, got {measured_value}"
        )))
    }
}

// =================================================================================================
// Tests
// =================================================================================================
