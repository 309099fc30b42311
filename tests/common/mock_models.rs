//! Mock reaction models for testing
//!
//! These models have trivially predictable output, which makes them useful
//! for testing dispatch through the registry independently of the chemistry.

use titra_rs::chemistry::{
    linspace, CurveConfig, CurveRequest, ReactionModel, TitrationCurve,
};
use titra_rs::models::ComplexometricModel;
use titra_rs::practice::{PracticeDefinition, ReactionFamily};
use titra_rs::Result;

// =================================================================================================
// Flat model: pX is constant
// =================================================================================================

/// Model returning a flat curve at a fixed pX and a fixed result
///
/// Registered under any family, it replaces the standard model of that family.
pub struct FlatModel {
    pub family: ReactionFamily,
    pub px: f64,
    pub result: f64,
}

impl FlatModel {
    pub fn new(family: ReactionFamily, px: f64, result: f64) -> Self {
        Self { family, px, result }
    }
}

impl ReactionModel for FlatModel {
    fn family(&self) -> ReactionFamily {
        self.family
    }

    fn name(&self) -> &str {
        "Flat"
    }

    fn curve(
        &self,
        practice: &PracticeDefinition,
        request: &CurveRequest,
        config: &CurveConfig,
    ) -> Result<TitrationCurve> {
        let equivalence_volume = request.expected_volume.unwrap_or(1.0);
        let volumes = linspace(0.0, 2.0 * equivalence_volume, config.n_points);
        let px = volumes.map(|_| self.px);

        Ok(TitrationCurve {
            family: self.family,
            volumes,
            px,
            equivalence_volume,
            equivalence_px: self.px,
            volume_range: (0.0, 2.0 * equivalence_volume),
            px_range: (0.0, 2.0 * self.px),
            tolerance: 0.1,
            species_label: "X".to_string(),
            titrant_label: "T".to_string(),
            title: practice.name.clone(),
        })
    }

    fn correct_result(
        &self,
        _practice: &PracticeDefinition,
        _recorded_volume: f64,
        _measured_value: f64,
    ) -> Result<f64> {
        Ok(self.result)
    }
}

// =================================================================================================
// Scaled volume model: overrides the expected volume only
// =================================================================================================

/// Complexometric model whose expected volume is the rule's volume times `factor`
///
/// Curves and results are those of [`ComplexometricModel`].
pub struct ScaledVolumeModel {
    pub factor: f64,
}

impl ReactionModel for ScaledVolumeModel {
    fn family(&self) -> ReactionFamily {
        ReactionFamily::DirectComplexometric
    }

    fn name(&self) -> &str {
        "Scaled volume"
    }

    fn expected_volume(
        &self,
        practice: &PracticeDefinition,
        measured_value: f64,
        sample_id: Option<&str>,
    ) -> Result<f64> {
        let volume = ComplexometricModel.expected_volume(practice, measured_value, sample_id)?;
        Ok(volume * self.factor)
    }

    fn curve(
        &self,
        practice: &PracticeDefinition,
        request: &CurveRequest,
        config: &CurveConfig,
    ) -> Result<TitrationCurve> {
        ComplexometricModel.curve(practice, request, config)
    }

    fn correct_result(
        &self,
        practice: &PracticeDefinition,
        recorded_volume: f64,
        measured_value: f64,
    ) -> Result<f64> {
        ComplexometricModel.correct_result(practice, recorded_volume, measured_value)
    }
}
