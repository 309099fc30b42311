//! Back-titration model (Volhard chloride determination)
//!
//! # Chemical Background
//!
//! A known excess of Ag⁺ precipitates the chloride of the sample as AgCl. The
//! silver left over is then titrated with thiocyanate, which precipitates
//! AgSCN. The curve follows pAg = −log[Ag⁺] as a function of the delivered
//! titrant volume V over a total solution volume V₀ + V.
//!
//! With `n = V_eq · M` the amount of excess silver \[mmol\]:
//!
//! ```text
//! before equivalence:  [Ag⁺]  = (n − M·V) / (V₀ + V)
//! after  equivalence:  [SCN⁻] = (M·V − n) / (V₀ + V)
//!                      [Ag⁺]  = Ksp / [SCN⁻]
//! at equivalence:      [Ag⁺]  = √Ksp
//! ```
//!
//! Concentrations are floored at 10⁻¹⁵ mol/L before taking the logarithm and
//! pAg is clipped to `[0, 12]`. The plotted volume range is
//! `[0.05, 1.65 · V_eq]`.
//!
//! # Result Formula
//!
//! ```text
//! mg analyte / mL = [(V_excess · M_excess) − (V · M_titrant)] · PM / V_sample
//! ```
//!
//! `V` is the student's own burette reading.
//!
//! # Example
//!
//! ```rust
//! use titra_rs::models::BackTitrationSystem;
//!
//! let system = BackTitrationSystem::new(1.0e-12, 0.08, 73.0, 16.93, 0.005);
//! assert!((system.px_at(16.93) - 6.0).abs() < 1e-12);
//! assert!(system.px_at(5.0) < system.px_at(20.0));
//! ```

use nalgebra::DVector;

use crate::chemistry::traits::{checked_measurement, checked_points};
use crate::chemistry::{
    p_value, sample, CurveConfig, CurveRequest, ReactionModel, TitrationCurve,
    CONCENTRATION_FLOOR,
};
use crate::error::{LabError, Result};
use crate::models::volume_grid;
use crate::practice::{
    BackTitrationParams, ChemistryConfig, PracticeDefinition, ReactionFamily,
};

/// First plotted volume \[mL\]
pub const BACK_TITRATION_START_VOLUME: f64 = 0.05;

/// Plotted range as a multiple of the equivalence volume
pub const BACK_TITRATION_RANGE_FACTOR: f64 = 1.65;

/// pAg axis upper bound
pub const BACK_TITRATION_MAX_PX: f64 = 12.0;

// =================================================================================================
// Closed-form system
// =================================================================================================

/// Back-titration equilibrium for a fixed set of constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackTitrationSystem {
    /// Solubility product of the titration precipitate
    solubility_product: f64,

    /// Titrant molarity \[mol/L\]
    titrant_concentration: f64,

    /// Volume in the flask before titration \[mL\]
    initial_volume: f64,

    /// Equivalence volume \[mL\]
    equivalence_volume: f64,

    /// Half-width of the equivalence band \[mL\]
    equivalence_band: f64,
}

impl BackTitrationSystem {
    pub fn new(
        solubility_product: f64,
        titrant_concentration: f64,
        initial_volume: f64,
        equivalence_volume: f64,
        equivalence_band: f64,
    ) -> Self {
        Self {
            solubility_product,
            titrant_concentration,
            initial_volume,
            equivalence_volume,
            equivalence_band,
        }
    }

    pub fn equivalence_volume(&self) -> f64 {
        self.equivalence_volume
    }

    /// Excess species left to titrate \[mmol\]
    #[inline]
    pub fn excess_amount(&self) -> f64 {
        self.equivalence_volume * self.titrant_concentration
    }

    /// pX at the equivalence point, `−log10(√Ksp)`
    #[inline]
    pub fn equivalence_px(&self) -> f64 {
        -self.solubility_product.sqrt().log10()
    }

    /// pX after `volume` mL of titrant, clipped to `[0, 12]`
    pub fn px_at(&self, volume: f64) -> f64 {
        let n = self.excess_amount();
        let total = self.initial_volume + volume;
        let delivered = self.titrant_concentration * volume;

        let px = if (volume - self.equivalence_volume).abs() <= self.equivalence_band {
            self.equivalence_px()
        } else if volume < self.equivalence_volume {
            p_value((n - delivered) / total)
        } else {
            let titrant_excess = ((delivered - n) / total).max(CONCENTRATION_FLOOR);
            p_value(self.solubility_product / titrant_excess)
        };
        px.clamp(0.0, BACK_TITRATION_MAX_PX)
    }

    /// Plotted volume range \[mL\]
    pub fn volume_range(&self) -> (f64, f64) {
        (
            BACK_TITRATION_START_VOLUME,
            self.equivalence_volume * BACK_TITRATION_RANGE_FACTOR,
        )
    }

    /// Sample the curve, returning `(volumes, pX)`
    pub fn sample(&self, n_points: usize) -> (DVector<f64>, DVector<f64>) {
        let (start, end) = self.volume_range();
        let volumes = volume_grid(start, end, n_points, self.equivalence_volume);
        let px = sample(&volumes, |v| self.px_at(v));
        (volumes, px)
    }
}

// =================================================================================================
// Reaction model
// =================================================================================================

/// [`ReactionModel`] for the `back-titration` family
#[derive(Debug, Clone, Copy, Default)]
pub struct BackTitrationModel;

impl BackTitrationModel {
    fn params<'a>(&self, practice: &'a PracticeDefinition) -> Result<&'a BackTitrationParams> {
        match &practice.chemistry {
            Some(ChemistryConfig::BackTitration(params)) => Ok(params),
            Some(other) => Err(LabError::unsupported(
                practice.id,
                format!("chemistry family '{}' is not a back-titration", other.family()),
            )),
            None => Err(LabError::unsupported(practice.id, "no reaction chemistry is described")),
        }
    }
}

impl ReactionModel for BackTitrationModel {
    fn family(&self) -> ReactionFamily {
        ReactionFamily::BackTitration
    }

    fn name(&self) -> &str {
        "Back-titration (excess precipitant)"
    }

    fn curve(
        &self,
        practice: &PracticeDefinition,
        request: &CurveRequest,
        config: &CurveConfig,
    ) -> Result<TitrationCurve> {
        let params = self.params(practice)?;
        let titration = practice.titration()?;
        let n_points = checked_points(config)?;

        // session value first, then the practice's own rule
        let equivalence_volume = match request.expected_volume.filter(|v| *v > 0.0) {
            Some(volume) => volume,
            None => {
                let measured = request.measured_value.unwrap_or(titration.reference_value);
                self.expected_volume(practice, measured, None)?
            }
        };
        if !(equivalence_volume.is_finite() && equivalence_volume > 0.0) {
            return Err(LabError::InvalidInput(format!(
                "equivalence volume must be positive, got {equivalence_volume}"
            )));
        }

        let system = BackTitrationSystem::new(
            params.solubility_product,
            titration.titrant_concentration,
            params.initial_volume,
            equivalence_volume,
            params.equivalence_band,
        );
        let (volumes, px) = system.sample(n_points);

        log::debug!(
            "Back-titration curve for practice {}: V_eq = {equivalence_volume:.3} mL, {} points",
            practice.id,
            volumes.len()
        );

        Ok(TitrationCurve {
            family: ReactionFamily::BackTitration,
            volumes,
            px,
            equivalence_volume,
            equivalence_px: system.equivalence_px(),
            volume_range: (0.0, system.volume_range().1),
            px_range: (0.0, BACK_TITRATION_MAX_PX),
            tolerance: titration.endpoint_tolerance,
            species_label: label_or(&params.species_label, "X"),
            titrant_label: label_or(&params.titrant_label, &titration.titrant),
            title: format!("Titration curve: {}", practice.name),
        })
    }

    fn correct_result(
        &self,
        practice: &PracticeDefinition,
        recorded_volume: f64,
        measured_value: f64,
    ) -> Result<f64> {
        let params = self.params(practice)?;
        let titration = practice.titration()?;
        let sample_volume = checked_measurement(measured_value)?;

        let excess = params.excess_reagent_volume * params.excess_reagent_concentration;
        let titrated = recorded_volume * titration.titrant_concentration;
        Ok((excess - titrated) * params.analyte_molar_mass / sample_volume)
    }
}

fn label_or(label: &str, fallback: &str) -> String {
    if label.is_empty() {
        fallback.to_string()
    } else {
        label.to_string()
    }
}

// =================================================================================================
// Tests
// =================================================================================================
