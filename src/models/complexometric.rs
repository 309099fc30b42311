//! Direct complexometric model (EDTA titration of total hardness)
//!
//! # Chemical Background
//!
//! At controlled pH the metal ion M²⁺ reacts 1:1 with the chelating titrant Y:
//!
//! ```text
//! M²⁺ + HY³⁻ → MY²⁻ + H⁺          K'f = Kf · αY
//! ```
//!
//! The curve follows pM = −log[M²⁺]. With the sample volume `V_s`, a buffer
//! volume `V_b`, `V₀ = V_s + V_b` and `n = V_eq · M` \[mmol\]:
//!
//! ```text
//! before equivalence:  [M]  = (n − M·V) / (V₀ + V)          (K'f ≫ 1)
//! at equivalence:      [MY] = n / (V₀ + V)
//!                      [M]  = √([MY] / K'f)
//! after equivalence:   [Y'] = (M·V − n) / (V₀ + V)
//!                      [M]  = [MY] / (K'f · [Y'])
//! ```
//!
//! The equivalence volume scales with the sample volume through the
//! practice's `direct` proportionality rule. pM is clipped to `[0, 14]`; the
//! plotted y range ends at `min(1.08 · max pM, 14)` where the maximum is taken
//! over volumes above `0.1 · V_eq`.
//!
//! # Result Formula
//!
//! ```text
//! ppm = V · M · PM · scale / V_sample
//! ```

use nalgebra::DVector;

use crate::chemistry::traits::{checked_measurement, checked_points, peak_after};
use crate::chemistry::{
    p_value, sample, CurveConfig, CurveRequest, ReactionModel, TitrationCurve,
    CONCENTRATION_FLOOR,
};
use crate::error::{LabError, Result};
use crate::models::volume_grid;
use crate::practice::{
    ChemistryConfig, ComplexometricParams, PracticeDefinition, ReactionFamily,
};

/// First plotted volume \[mL\]
pub const COMPLEXOMETRIC_START_VOLUME: f64 = 0.02;

/// Plotted range as a multiple of the equivalence volume
pub const COMPLEXOMETRIC_RANGE_FACTOR: f64 = 1.9;

/// pM clip bound
pub const COMPLEXOMETRIC_MAX_PX: f64 = 14.0;

/// y range used when no point lies past `0.1 · V_eq`
const FALLBACK_PX_MAX: f64 = 12.0;

/// Headroom above the curve maximum
const PX_HEADROOM: f64 = 1.08;

// =================================================================================================
// Closed-form system
// =================================================================================================

/// Complexometric equilibrium for one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexometricSystem {
    /// Conditional formation constant K'f
    formation_constant: f64,

    titrant_concentration: f64,

    /// Sample plus buffer volume \[mL\]
    initial_volume: f64,

    equivalence_volume: f64,

    equivalence_band: f64,
}

impl ComplexometricSystem {
    pub fn new(
        formation_constant: f64,
        titrant_concentration: f64,
        initial_volume: f64,
        equivalence_volume: f64,
        equivalence_band: f64,
    ) -> Self {
        Self {
            formation_constant,
            titrant_concentration,
            initial_volume,
            equivalence_volume,
            equivalence_band,
        }
    }

    pub fn equivalence_volume(&self) -> f64 {
        self.equivalence_volume
    }

    /// Metal ion to titrate \[mmol\]
    #[inline]
    pub fn metal_amount(&self) -> f64 {
        self.equivalence_volume * self.titrant_concentration
    }

    /// Free metal at the equivalence point
    fn equivalence_concentration(&self, volume: f64) -> f64 {
        let complex = self.metal_amount() / (self.initial_volume + volume);
        (complex / self.formation_constant).max(1e-30).sqrt()
    }

    /// pM at `V = V_eq`
    pub fn equivalence_px(&self) -> f64 {
        p_value(self.equivalence_concentration(self.equivalence_volume))
    }

    /// pM after `volume` mL of titrant, clipped to `[0, 14]`
    pub fn px_at(&self, volume: f64) -> f64 {
        let n = self.metal_amount();
        let total = self.initial_volume + volume;
        let delivered = self.titrant_concentration * volume;

        let px = if (volume - self.equivalence_volume).abs() <= self.equivalence_band {
            p_value(self.equivalence_concentration(volume))
        } else if volume < self.equivalence_volume {
            p_value((n - delivered) / total)
        } else {
            let ligand_excess = ((delivered - n) / total).max(CONCENTRATION_FLOOR);
            let complex = n / total;
            p_value(complex / (self.formation_constant * ligand_excess))
        };
        px.clamp(0.0, COMPLEXOMETRIC_MAX_PX)
    }

    pub fn volume_range(&self) -> (f64, f64) {
        (
            COMPLEXOMETRIC_START_VOLUME,
            self.equivalence_volume * COMPLEXOMETRIC_RANGE_FACTOR,
        )
    }

    pub fn sample(&self, n_points: usize) -> (DVector<f64>, DVector<f64>) {
        let (start, end) = self.volume_range();
        let volumes = volume_grid(start, end, n_points, self.equivalence_volume);
        let px = sample(&volumes, |v| self.px_at(v));
        (volumes, px)
    }
}

/// Upper bound of the plotted pM axis for a sampled curve
pub fn px_axis_max(volumes: &DVector<f64>, px: &DVector<f64>, equivalence_volume: f64) -> f64 {
    let peak = peak_after(volumes, px, equivalence_volume * 0.1)
        .filter(|p| p.is_finite())
        .unwrap_or(FALLBACK_PX_MAX);
    (peak * PX_HEADROOM).min(COMPLEXOMETRIC_MAX_PX)
}

// =================================================================================================
// Reaction model
// =================================================================================================

/// [`ReactionModel`] for the `direct-complexometric` family
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexometricModel;

impl ComplexometricModel {
    fn params<'a>(&self, practice: &'a PracticeDefinition) -> Result<&'a ComplexometricParams> {
        match &practice.chemistry {
            Some(ChemistryConfig::DirectComplexometric(params)) => Ok(params),
            Some(other) => Err(LabError::unsupported(
                practice.id,
                format!(
                    "chemistry family '{}' is not a direct complexometric titration",
                    other.family()
                ),
            )),
            None => Err(LabError::unsupported(practice.id, "no reaction chemistry is described")),
        }
    }
}

impl ReactionModel for ComplexometricModel {
    fn family(&self) -> ReactionFamily {
        ReactionFamily::DirectComplexometric
    }

    fn name(&self) -> &str {
        "Direct complexometric titration"
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

        let sample_volume =
            checked_measurement(request.measured_value.unwrap_or(titration.reference_value))?;
        let equivalence_volume = self.expected_volume(practice, sample_volume, None)?;

        let system = ComplexometricSystem::new(
            params.conditional_formation_constant(),
            titration.titrant_concentration,
            sample_volume + params.buffer_volume,
            equivalence_volume,
            params.equivalence_band,
        );
        let (volumes, px) = system.sample(n_points);
        let px_max = px_axis_max(&volumes, &px, equivalence_volume);

        log::debug!(
            "Complexometric curve for practice {}: V_s = {sample_volume} mL, V_eq = {equivalence_volume:.3} mL",
            practice.id
        );

        Ok(TitrationCurve {
            family: ReactionFamily::DirectComplexometric,
            volumes,
            px,
            equivalence_volume,
            equivalence_px: system.equivalence_px(),
            volume_range: (0.0, system.volume_range().1),
            px_range: (0.0, px_max),
            tolerance: titration.endpoint_tolerance,
            species_label: if params.species_label.is_empty() {
                "M".to_string()
            } else {
                params.species_label.clone()
            },
            titrant_label: if params.titrant_label.is_empty() {
                titration.titrant.clone()
            } else {
                params.titrant_label.clone()
            },
            title: format!("Titration curve: {} (sample {sample_volume:.0} mL)", practice.name),
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

        Ok(recorded_volume
            * titration.titrant_concentration
            * params.analyte_molar_mass
            * params.result_scale
            / sample_volume)
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::round_to;
    use crate::practice::PracticeCatalog;
    use approx::assert_relative_eq;

    fn hardness(sample_volume: f64) -> ComplexometricSystem {
        let kf = 10f64.powf(10.65) * 0.36;
        ComplexometricSystem::new(kf, 0.01, sample_volume + 10.0, 6.5 * sample_volume / 100.0, 0.005)
    }

    #[test]
    fn test_equivalence_px_continuous_with_band() {
        let system = hardness(100.0);
        assert_relative_eq!(system.px_at(6.5), system.equivalence_px(), epsilon = 1e-12);
        // pCa at equivalence ≈ 7.0 for 0.65 mmol in 116.5 mL
        assert!(system.equivalence_px() > 6.5 && system.equivalence_px() < 7.5);
    }

    #[test]
    fn test_segments_rise() {
        let system = hardness(100.0);
        let (volumes, px) = system.sample(3000);
        assert!(px.iter().all(|p| (0.0..=COMPLEXOMETRIC_MAX_PX).contains(p)));

        let band = 0.005;
        let segment = |keep: &dyn Fn(f64) -> bool| -> Vec<f64> {
            volumes
                .iter()
                .zip(px.iter())
                .filter(|(v, _)| keep(**v))
                .map(|(_, p)| *p)
                .collect()
        };
        let before = segment(&|v| v < 6.5 - band);
        let after = segment(&|v| v > 6.5 + band);
        assert!(before.windows(2).all(|w| w[1] >= w[0]));
        assert!(after.windows(2).all(|w| w[1] >= w[0]));
        assert!(after.last().unwrap() > before.last().unwrap());
    }

    #[test]
    fn test_axis_max_is_capped() {
        let (volumes, px) = hardness(100.0).sample(3000);
        let top = px_axis_max(&volumes, &px, 6.5);
        assert!(top <= COMPLEXOMETRIC_MAX_PX);
        let peak = px.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_relative_eq!(top, (peak * 1.08).min(14.0), epsilon = 1e-12);
        assert_eq!(px_axis_max(&DVector::zeros(0), &DVector::zeros(0), 6.5), 12.0 * 1.08);
    }

    #[test]
    fn test_equivalence_scales_with_sample() {
        let catalog = PracticeCatalog::builtin().unwrap();
        let practice = catalog.get(5).unwrap();
        let request = CurveRequest {
            measured_value: Some(200.0),
            ..CurveRequest::default()
        };
        let curve = ComplexometricModel
            .curve(practice, &request, &CurveConfig::default())
            .unwrap();
        assert_relative_eq!(curve.equivalence_volume, 13.0, epsilon = 1e-12);
        assert_relative_eq!(curve.volume_range.1, 13.0 * 1.9, epsilon = 1e-12);
        assert_eq!(curve.tolerance, 0.3);
    }

    #[test]
    fn test_correct_result_matches_reference() {
        let catalog = PracticeCatalog::builtin().unwrap();
        let practice = catalog.get(5).unwrap();
        let result = ComplexometricModel.correct_result(practice, 6.5, 100.0).unwrap();
        assert_eq!(round_to(result, 2), 65.06);
    }
}
