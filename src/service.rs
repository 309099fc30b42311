//! Engine facade
//!
//! [`LabEngine`] owns the read-only catalog and the reaction registry and
//! exposes the operations a surrounding service calls, each keyed by practice
//! id. It holds no mutable state; sessions are passed in by the caller.
//!
//! # Example
//!
//! ```rust
//! use titra_rs::prelude::*;
//!
//! let engine = LabEngine::builtin()?;
//!
//! let resolved = engine.resolve_expected_volume(5, 100.0, None)?;
//! assert_eq!(resolved.expected_volume, 6.5);
//!
//! let check = engine.validate_calculation(5, 6.5, 100.0, 65.0)?;
//! assert_eq!(check.correct_result, 65.06);
//! assert!(check.is_within_tolerance);
//! # Ok::<(), titra_rs::LabError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::chemistry::{
    color_at, round_to, CurveConfig, CurveRequest, ReactionRegistry, Rgb, TitrationCurve,
    DEFAULT_SOLUTION_COLOR, VOLUME_DECIMALS,
};
use crate::error::{LabError, Result};
use crate::output::visualization::{render_curve, ImageFormat, PlotConfig};
use crate::practice::{
    check_materials, MaterialSelection, MaterialsCheck, PracticeCatalog, PracticeDefinition,
    SessionRecord,
};
use crate::scoring::{self, CalculationCheck, EvaluationReport};

/// Expected volume with a human readable explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedVolume {
    /// Expected titrant volume \[mL\], 4 decimals
    pub expected_volume: f64,
    pub explanation: String,
}

/// Titration engine over a catalog and a reaction registry
#[derive(Debug, Clone)]
pub struct LabEngine {
    catalog: PracticeCatalog,
    registry: ReactionRegistry,
    curve_config: CurveConfig,
}

impl LabEngine {
    pub fn new(catalog: PracticeCatalog, registry: ReactionRegistry) -> Self {
        Self {
            catalog,
            registry,
            curve_config: CurveConfig::default(),
        }
    }

    /// Engine over the built-in catalog and the standard models
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(PracticeCatalog::builtin()?, ReactionRegistry::standard()))
    }

    /// Builder pattern: set the curve sampling
    pub fn with_curve_config(mut self, config: CurveConfig) -> Result<Self> {
        config.validate().map_err(LabError::InvalidConfig)?;
        self.curve_config = config;
        Ok(self)
    }

    pub fn catalog(&self) -> &PracticeCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &ReactionRegistry {
        &self.registry
    }

    pub fn practice(&self, practice_id: u32) -> Result<&PracticeDefinition> {
        self.catalog.get(practice_id)
    }

    // ── volumes and colors ──

    /// Expected titrant volume for a measurement
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidConfig` (no titration section), `InvalidInput`
    /// (measurement unusable by a scaling rule).
    pub fn resolve_expected_volume(
        &self,
        practice_id: u32,
        measured_value: f64,
        sample_id: Option<&str>,
    ) -> Result<ResolvedVolume> {
        let practice = self.practice(practice_id)?;
        let titration = practice.titration()?;
        let volume = self.registry.expected_volume(practice, measured_value, sample_id)?;
        let expected_volume = round_to(volume, VOLUME_DECIMALS);

        Ok(ResolvedVolume {
            expected_volume,
            explanation: format!(
                "For the {} practice, approximately {expected_volume:.2} mL of {} ({} {}) are expected.",
                practice.name,
                titration.titrant,
                titration.titrant_concentration,
                titration.titrant_concentration_unit
            ),
        })
    }

    /// Solution color at a titration progress
    ///
    /// Practices without a titration section use the default solution color.
    pub fn interpolate_color(&self, practice_id: u32, progress: f64) -> Result<Rgb> {
        let practice = self.practice(practice_id)?;
        Ok(match &practice.titration {
            Some(titration) => color_at(&titration.color_transitions, progress),
            None => DEFAULT_SOLUTION_COLOR,
        })
    }

    // ── curves ──

    /// Theoretical curve for a session's values
    pub fn build_curve(&self, practice_id: u32, request: &CurveRequest) -> Result<TitrationCurve> {
        let practice = self.practice(practice_id)?;
        let model = self.registry.model_for(practice)?;
        model.curve(practice, request, &self.curve_config)
    }

    /// Curve chart as image bytes
    ///
    /// # Errors
    ///
    /// `UnsupportedPractice` for a practice without an implemented model,
    /// `Render` when drawing fails.
    pub fn render_curve(
        &self,
        practice_id: u32,
        request: &CurveRequest,
        format: ImageFormat,
        config: Option<&PlotConfig>,
    ) -> Result<Vec<u8>> {
        let curve = self.build_curve(practice_id, request)?;
        render_curve(&curve, request.recorded_volume, format, config)
    }

    // ── scoring ──

    /// Check a student's result against the correct result for their reading
    pub fn validate_calculation(
        &self,
        practice_id: u32,
        recorded_volume: f64,
        measured_value: f64,
        student_result: f64,
    ) -> Result<CalculationCheck> {
        let practice = self.practice(practice_id)?;
        let model = self.registry.model_for(practice)?;
        scoring::validate_calculation(model, practice, recorded_volume, measured_value, student_result)
    }

    /// Validate a submitted result with the session's own reading and store it
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the session has no burette reading or measurement yet.
    pub fn submit_calculation(
        &self,
        session: &mut SessionRecord,
        student_result: f64,
    ) -> Result<CalculationCheck> {
        let recorded = session
            .recorded_volume
            .ok_or_else(|| LabError::InvalidInput("no burette reading recorded".to_string()))?;
        let measured = session
            .measured_value()
            .ok_or_else(|| LabError::InvalidInput("no sample measurement recorded".to_string()))?;
        let check = self.validate_calculation(session.practice_id, recorded, measured, student_result)?;
        session.record_calculation(&check);
        Ok(check)
    }

    /// Score a session and mark it completed
    pub fn generate_report(&self, session: &mut SessionRecord) -> Result<EvaluationReport> {
        let practice = self.practice(session.practice_id)?;
        let report = scoring::score_session(session, practice);
        session.complete(&report);
        Ok(report)
    }

    // ── sessions ──

    /// New in-progress session with the expected volume precomputed from the
    /// practice's default measurement
    pub fn start_session(&self, practice_id: u32, student_name: &str) -> Result<SessionRecord> {
        let practice = self.practice(practice_id)?;
        let default_value = practice.measurement.as_ref().and_then(|m| m.default_value);
        let expected = match default_value {
            Some(value) => self.expected_for(practice, value, None).unwrap_or_else(|e| {
                log::warn!("Practice {practice_id}: default measurement {value} unusable ({e})");
                None
            }),
            None => None,
        };

        let session = SessionRecord::start(practice_id, student_name, expected);
        log::info!("Session {} started on practice {practice_id}", session.id);
        Ok(session)
    }

    /// Record a measurement with its expected volume
    ///
    /// A measurement the practice's rule cannot use is rejected and leaves the
    /// session untouched.
    pub fn record_measurement(
        &self,
        session: &mut SessionRecord,
        value: f64,
        unit: &str,
        sample_id: Option<&str>,
    ) -> Result<Option<f64>> {
        let practice = self.practice(session.practice_id)?;
        let expected = self.expected_for(practice, value, sample_id)?;
        Ok(session.record_measurement(value, unit, sample_id, expected))
    }

    /// Expected volume to store on a session, `None` without a titration section
    fn expected_for(
        &self,
        practice: &PracticeDefinition,
        measured_value: f64,
        sample_id: Option<&str>,
    ) -> Result<Option<f64>> {
        if practice.titration.is_none() {
            return Ok(None);
        }
        self.registry
            .expected_volume(practice, measured_value, sample_id)
            .map(Some)
    }

    /// Check a material selection and store the outcome on the session
    pub fn check_materials(
        &self,
        session: &mut SessionRecord,
        selection: &MaterialSelection,
    ) -> Result<MaterialsCheck> {
        let practice = self.practice(session.practice_id)?;
        let check = check_materials(practice, selection);
        session.record_materials(check.correct);
        Ok(check)
    }
}

// =================================================================================================
// Tests
// =================================================================================================
