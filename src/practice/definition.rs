//! Practice definition types
//!
//! A practice definition is the read-only description of one lab exercise:
//! which titrant is used and how its expected volume scales, how the solution
//! color evolves, which closed-form chemistry model describes the reaction,
//! how the student's result is calculated and how the attempt is scored.
//!
//! The types deserialize from the camelCase JSON layout used by the catalog
//! files (see `data/practices.json`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::chemistry::Rgb;
use crate::error::{LabError, Result};

/// Tier `maxError` at or above which a tier counts as the catch-all
pub const CATCH_ALL_MAX_ERROR: f64 = 999.0;

// =================================================================================================
// Enumerations
// =================================================================================================

/// How the expected titrant volume depends on the measured sample value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Proportionality {
    /// Volume independent of the sample (constant excess back-titration)
    Fixed,
    /// Volume scales with the sample size
    Direct,
    /// Volume scales with the inverse of the measured value (dilution factor)
    Inverse,
}

/// Reaction family tag, used to look up the chemistry model in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReactionFamily {
    /// Excess reagent precipitation followed by titration of the excess
    BackTitration,
    /// Direct titration of a metal ion by a chelating titrant
    DirectComplexometric,
}

impl std::fmt::Display for ReactionFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BackTitration => write!(f, "back-titration"),
            Self::DirectComplexometric => write!(f, "direct-complexometric"),
        }
    }
}

/// Where a formula variable takes its value from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableSource {
    Constant,
    Measurement,
    TitrationResult,
}

/// Evaluation criterion identifiers understood by the scoring engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriterionId {
    Materials,
    Measurement,
    Assembly,
    Interpretation,
    Endpoint,
    Calculation,
}

impl CriterionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Materials => "materials",
            Self::Measurement => "measurement",
            Self::Assembly => "assembly",
            Self::Interpretation => "interpretation",
            Self::Endpoint => "endpoint",
            Self::Calculation => "calculation",
        }
    }
}

impl std::fmt::Display for CriterionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scoring rule of a criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriterionKind {
    /// Full weight when the session field is present/true, zero otherwise
    Boolean,
    /// Error magnitude mapped through ordered tolerance tiers
    Range,
}

// =================================================================================================
// Titration section
// =================================================================================================

/// One breakpoint of the indicator color table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorTransition {
    /// Titration progress (delivered / expected volume), may exceed 1.0
    pub progress: f64,

    pub color: Rgb,

    #[serde(default)]
    pub description: String,
}

impl ColorTransition {
    pub fn new(progress: f64, color: Rgb, description: impl Into<String>) -> Self {
        Self {
            progress,
            color,
            description: description.into(),
        }
    }
}

/// Titration configuration of a practice
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitrationConfig {
    /// Titrant reagent identifier (e.g. `"EDTA-001M"`)
    pub titrant: String,

    /// Titrant molarity \[mol/L\]
    pub titrant_concentration: f64,

    #[serde(default = "default_concentration_unit")]
    pub titrant_concentration_unit: String,

    pub proportionality: Proportionality,

    /// Measured value the expected volume was calibrated against
    pub reference_value: f64,

    /// Titrant volume at equivalence for the reference value \[mL\]
    pub expected_volume: f64,

    /// Optional per-sample base volumes, overriding `expected_volume`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub volumes_by_sample: BTreeMap<String, f64>,

    #[serde(default)]
    pub color_transitions: Vec<ColorTransition>,

    /// Half-width of the accepted endpoint window \[mL\]
    #[serde(default = "default_endpoint_tolerance")]
    pub endpoint_tolerance: f64,

    #[serde(default)]
    pub endpoint_description: String,

    /// Visual precipitate metadata, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitate: Option<serde_json::Value>,
}

fn default_concentration_unit() -> String {
    "M".to_string()
}

fn default_endpoint_tolerance() -> f64 {
    0.5
}

impl TitrationConfig {
    /// Base volume for an optional sample identifier
    ///
    /// Unknown sample identifiers fall back to `expected_volume`.
    pub fn base_volume(&self, sample_id: Option<&str>) -> f64 {
        match sample_id {
            Some(id) => match self.volumes_by_sample.get(id) {
                Some(volume) => *volume,
                None => {
                    if !self.volumes_by_sample.is_empty() {
                        log::warn!(
                            "Sample '{id}' has no volume entry, using base volume {}",
                            self.expected_volume
                        );
                    }
                    self.expected_volume
                }
            },
            None => self.expected_volume,
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if !(self.titrant_concentration.is_finite() && self.titrant_concentration > 0.0) {
            return Err(format!(
                "titrant concentration must be positive, got {}",
                self.titrant_concentration
            ));
        }
        if !(self.reference_value.is_finite() && self.reference_value > 0.0) {
            return Err(format!(
                "reference value must be positive, got {}",
                self.reference_value
            ));
        }
        if !(self.expected_volume.is_finite() && self.expected_volume > 0.0) {
            return Err(format!(
                "expected volume must be positive, got {}",
                self.expected_volume
            ));
        }
        if let Some((id, v)) = self
            .volumes_by_sample
            .iter()
            .find(|(_, v)| !(v.is_finite() && **v > 0.0))
        {
            return Err(format!("sample '{id}' has invalid base volume {v}"));
        }
        if self.endpoint_tolerance < 0.0 {
            return Err("endpoint tolerance must not be negative".to_string());
        }
        for pair in self.color_transitions.windows(2) {
            if pair[1].progress < pair[0].progress {
                return Err(format!(
                    "color transitions must be ordered by progress ({} after {})",
                    pair[1].progress, pair[0].progress
                ));
            }
        }
        Ok(())
    }
}

// =================================================================================================
// Chemistry section
// =================================================================================================

/// Constants of the back-titration (Volhard) model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackTitrationParams {
    /// Solubility product of the titration precipitate (e.g. AgSCN)
    pub solubility_product: f64,

    /// Solution volume in the flask before titration starts \[mL\]
    pub initial_volume: f64,

    /// Volume of excess reagent added during assembly \[mL\]
    pub excess_reagent_volume: f64,

    /// Molarity of the excess reagent \[mol/L\]
    pub excess_reagent_concentration: f64,

    /// Molar mass of the analyte reported in the result \[g/mol\]
    pub analyte_molar_mass: f64,

    /// Half-width of the band treated as the equivalence point \[mL\]
    #[serde(default = "default_equivalence_band")]
    pub equivalence_band: f64,

    #[serde(default)]
    pub species_label: String,

    #[serde(default)]
    pub titrant_label: String,
}

/// Constants of the direct complexometric (EDTA) model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexometricParams {
    /// log10 of the absolute formation constant of the metal complex
    pub log_formation_constant: f64,

    /// Fraction of free ligand in its fully deprotonated form at the working pH
    pub ligand_fraction: f64,

    /// Buffer volume added to the sample \[mL\]
    pub buffer_volume: f64,

    /// Molar mass used to express the result (e.g. CaCO₃) \[g/mol\]
    pub analyte_molar_mass: f64,

    /// Unit conversion factor of the result (1000 for ppm)
    #[serde(default = "default_result_scale")]
    pub result_scale: f64,

    #[serde(default = "default_equivalence_band")]
    pub equivalence_band: f64,

    #[serde(default)]
    pub species_label: String,

    #[serde(default)]
    pub titrant_label: String,
}

impl ComplexometricParams {
    /// Conditional formation constant K'f = Kf × αY
    pub fn conditional_formation_constant(&self) -> f64 {
        10f64.powf(self.log_formation_constant) * self.ligand_fraction
    }
}

fn default_equivalence_band() -> f64 {
    0.005
}

fn default_result_scale() -> f64 {
    1000.0
}

/// Reaction chemistry of a practice, tagged by family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "kebab-case")]
pub enum ChemistryConfig {
    BackTitration(BackTitrationParams),
    DirectComplexometric(ComplexometricParams),
}

impl ChemistryConfig {
    pub fn family(&self) -> ReactionFamily {
        match self {
            Self::BackTitration(_) => ReactionFamily::BackTitration,
            Self::DirectComplexometric(_) => ReactionFamily::DirectComplexometric,
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(format!("{name} must be positive, got {v}"))
            }
        };
        match self {
            Self::BackTitration(p) => {
                positive("solubility product", p.solubility_product)?;
                positive("initial volume", p.initial_volume)?;
                positive("excess reagent volume", p.excess_reagent_volume)?;
                positive("excess reagent concentration", p.excess_reagent_concentration)?;
                positive("analyte molar mass", p.analyte_molar_mass)?;
                positive("equivalence band", p.equivalence_band)
            }
            Self::DirectComplexometric(p) => {
                positive("ligand fraction", p.ligand_fraction)?;
                positive("analyte molar mass", p.analyte_molar_mass)?;
                positive("result scale", p.result_scale)?;
                positive("equivalence band", p.equivalence_band)?;
                if p.buffer_volume < 0.0 {
                    return Err("buffer volume must not be negative".to_string());
                }
                Ok(())
            }
        }
    }
}

// =================================================================================================
// Measurement & calculation sections
// =================================================================================================

/// Sample measurement stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementConfig {
    #[serde(default)]
    pub instrument: String,

    /// Value proposed to the student, also used to precompute the expected volume
    #[serde(default)]
    pub default_value: Option<f64>,

    /// True when the instrument only delivers one volume (volumetric pipette)
    #[serde(default)]
    pub fixed_value: bool,

    #[serde(default)]
    pub range: Option<[f64; 2]>,

    #[serde(default = "default_measurement_unit")]
    pub unit: String,

    #[serde(default)]
    pub label: String,
}

fn default_measurement_unit() -> String {
    "mL".to_string()
}

/// Practice field a constant formula variable repeats for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BoundQuantity {
    /// `titration.titrantConcentration`
    TitrantConcentration,
    /// `chemistry.excessReagentVolume` (back-titration)
    ExcessReagentVolume,
    /// `chemistry.excessReagentConcentration` (back-titration)
    ExcessReagentConcentration,
    /// `chemistry.analyteMolarMass`
    AnalyteMolarMass,
    /// `chemistry.resultScale` (complexometric)
    ResultScale,
}

impl std::fmt::Display for BoundQuantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::TitrantConcentration => "titrantConcentration",
            Self::ExcessReagentVolume => "excessReagentVolume",
            Self::ExcessReagentConcentration => "excessReagentConcentration",
            Self::AnalyteMolarMass => "analyteMolarMass",
            Self::ResultScale => "resultScale",
        };
        write!(f, "{name}")
    }
}

/// One variable of the result formula (display metadata)
///
/// A constant that repeats a titration or chemistry field names it in
/// `binds`; catalog validation rejects the practice when the two differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationVariable {
    pub symbol: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub unit: String,

    pub source: VariableSource,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binds: Option<BoundQuantity>,
}

/// Labelled value range used to interpret a result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpretationRange {
    pub min: f64,
    pub max: f64,
    pub label: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Interpretation {
    pub ranges: Vec<InterpretationRange>,

    #[serde(default)]
    pub explanation: String,
}

impl Interpretation {
    /// Label of the first range with `min <= value < max`
    pub fn classify(&self, value: f64) -> Option<&str> {
        self.ranges
            .iter()
            .find(|r| value >= r.min && value < r.max)
            .map(|r| r.label.as_str())
    }
}

/// Result calculation stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationConfig {
    #[serde(default)]
    pub formula_text: String,

    #[serde(default)]
    pub variables: Vec<CalculationVariable>,

    #[serde(default)]
    pub result_unit: String,

    /// Result for the reference sample and the theoretical volume
    pub expected_result: f64,

    /// Accepted percent error
    pub tolerance: f64,

    #[serde(default)]
    pub interpretation: Option<Interpretation>,
}

impl CalculationConfig {
    /// Value of a constant formula variable
    pub fn constant(&self, symbol: &str) -> Option<f64> {
        self.variables
            .iter()
            .find(|v| v.source == VariableSource::Constant && v.symbol == symbol)
            .and_then(|v| v.value)
    }

    /// Interpretation label for a result, if ranges are configured
    pub fn interpret(&self, value: f64) -> Option<&str> {
        self.interpretation.as_ref().and_then(|i| i.classify(value))
    }
}

// =================================================================================================
// Evaluation section
// =================================================================================================

/// One row of a tolerance tier table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringTier {
    pub max_error: f64,
    pub score: f64,
    pub feedback: String,
}

impl ScoringTier {
    pub fn new(max_error: f64, score: f64, feedback: impl Into<String>) -> Self {
        Self {
            max_error,
            score,
            feedback: feedback.into(),
        }
    }
}

/// One evaluation criterion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criterion {
    pub id: CriterionId,
    pub label: String,
    pub weight: f64,

    #[serde(rename = "type")]
    pub kind: CriterionKind,

    /// Tolerance tiers, ascending by `max_error` (range criteria only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scoring: Vec<ScoringTier>,
}

impl Criterion {
    fn validate(&self) -> std::result::Result<(), String> {
        if !(self.weight.is_finite() && self.weight >= 0.0) {
            return Err(format!("criterion '{}' has invalid weight {}", self.id, self.weight));
        }
        if self.kind == CriterionKind::Boolean {
            return Ok(());
        }

        let last = self
            .scoring
            .last()
            .ok_or_else(|| format!("range criterion '{}' has no scoring tiers", self.id))?;
        if last.max_error < CATCH_ALL_MAX_ERROR {
            return Err(format!(
                "criterion '{}' must end with a catch-all tier (maxError >= {CATCH_ALL_MAX_ERROR})",
                self.id
            ));
        }
        for tier in &self.scoring {
            if tier.score < 0.0 || tier.score > self.weight {
                return Err(format!(
                    "criterion '{}' tier score {} outside [0, {}]",
                    self.id, tier.score, self.weight
                ));
            }
        }
        for pair in self.scoring.windows(2) {
            if pair[1].max_error < pair[0].max_error {
                return Err(format!(
                    "criterion '{}' tiers must be ascending by maxError",
                    self.id
                ));
            }
            if pair[1].score > pair[0].score {
                return Err(format!(
                    "criterion '{}' tier scores must not increase with error",
                    self.id
                ));
            }
        }
        Ok(())
    }
}

/// Feedback pair for a boolean criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeFeedback {
    pub pass: String,
    pub fail: String,
}

impl OutcomeFeedback {
    fn new(pass: &str, fail: &str) -> Self {
        Self {
            pass: pass.to_string(),
            fail: fail.to_string(),
        }
    }

    pub fn pick(&self, passed: bool) -> &str {
        if passed {
            &self.pass
        } else {
            &self.fail
        }
    }
}

/// Feedback texts and overall score bands
///
/// Every field has a default, so a practice only lists what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedbackConfig {
    /// Total score from which the commendation message is used
    pub excellent_threshold: f64,

    /// Total score from which the pass-with-improvement message is used
    pub passing_threshold: f64,

    pub excellent_message: String,
    pub passing_message: String,
    pub failing_message: String,

    pub materials: OutcomeFeedback,
    pub measurement: OutcomeFeedback,
    pub assembly: OutcomeFeedback,
    pub interpretation: OutcomeFeedback,

    /// Endpoint criterion without recorded or expected volume
    pub endpoint_missing: String,

    /// Calculation criterion without a validated result
    pub calculation_missing: String,

    /// Criterion id paired with a type the engine cannot score
    pub unsupported_criterion: String,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            excellent_threshold: 80.0,
            passing_threshold: 60.0,
            excellent_message: "Excellent performance in this practice.".to_string(),
            passing_message: "Good performance. Review the points for improvement.".to_string(),
            failing_message: "Insufficient performance. Repeating the practice is recommended."
                .to_string(),
            materials: OutcomeFeedback::new(
                "Correct selection of materials.",
                "Materials were selected incorrectly.",
            ),
            measurement: OutcomeFeedback::new(
                "Measurement recorded correctly.",
                "The measurement was not recorded.",
            ),
            assembly: OutcomeFeedback::new(
                "Assembly completed correctly.",
                "Assembly incomplete or incorrect.",
            ),
            interpretation: OutcomeFeedback::new(
                "Interpretation completed.",
                "No interpretation was made.",
            ),
            endpoint_missing: "No titration reading was recorded.".to_string(),
            calculation_missing: "The calculation was not performed.".to_string(),
            unsupported_criterion: "Criterion cannot be evaluated.".to_string(),
        }
    }
}

impl FeedbackConfig {
    /// Overall message for a total score
    pub fn overall(&self, total_score: f64) -> &str {
        if total_score >= self.excellent_threshold {
            &self.excellent_message
        } else if total_score >= self.passing_threshold {
            &self.passing_message
        } else {
            &self.failing_message
        }
    }
}

/// Evaluation rubric of a practice
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationConfig {
    pub criteria: Vec<Criterion>,

    #[serde(default = "default_max_score")]
    pub max_score: f64,

    #[serde(default = "default_passing_score")]
    pub passing_score: f64,

    #[serde(default)]
    pub feedback: FeedbackConfig,
}

fn default_max_score() -> f64 {
    100.0
}

fn default_passing_score() -> f64 {
    60.0
}

impl EvaluationConfig {
    /// Sum of all criterion weights
    pub fn total_weight(&self) -> f64 {
        self.criteria.iter().map(|c| c.weight).sum()
    }

    fn validate(&self) -> std::result::Result<(), String> {
        for criterion in &self.criteria {
            criterion.validate()?;
        }
        let total = self.total_weight();
        if (total - self.max_score).abs() > 1e-9 {
            return Err(format!(
                "criterion weights sum to {total}, expected maxScore {}",
                self.max_score
            ));
        }
        if self.passing_score > self.max_score {
            return Err(format!(
                "passingScore {} exceeds maxScore {}",
                self.passing_score, self.max_score
            ));
        }
        Ok(())
    }
}

// =================================================================================================
// Practice definition
// =================================================================================================

/// Complete definition of one practice
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeDefinition {
    pub id: u32,
    pub name: String,

    #[serde(default)]
    pub full_name: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub required_instruments: Vec<String>,

    #[serde(default)]
    pub required_reagents: Vec<String>,

    #[serde(default)]
    pub measurement: Option<MeasurementConfig>,

    #[serde(default)]
    pub titration: Option<TitrationConfig>,

    #[serde(default)]
    pub chemistry: Option<ChemistryConfig>,

    #[serde(default)]
    pub calculation: Option<CalculationConfig>,

    pub evaluation: EvaluationConfig,
}

impl PracticeDefinition {
    /// Titration section, or `InvalidConfig` when absent
    pub fn titration(&self) -> Result<&TitrationConfig> {
        self.titration.as_ref().ok_or_else(|| {
            LabError::InvalidConfig(format!(
                "practice {} has no titration configuration",
                self.id
            ))
        })
    }

    /// Calculation section, or `InvalidConfig` when absent
    pub fn calculation(&self) -> Result<&CalculationConfig> {
        self.calculation.as_ref().ok_or_else(|| {
            LabError::InvalidConfig(format!(
                "practice {} has no calculation configuration",
                self.id
            ))
        })
    }

    /// Reaction family of the practice, if its chemistry is described
    pub fn reaction_family(&self) -> Option<ReactionFamily> {
        self.chemistry.as_ref().map(ChemistryConfig::family)
    }

    /// Check every authoring invariant of the definition
    pub fn validate(&self) -> std::result::Result<(), String> {
        let prefix = |e: String| format!("practice {}: {e}", self.id);
        if let Some(titration) = &self.titration {
            titration.validate().map_err(prefix)?;
        }
        if let Some(chemistry) = &self.chemistry {
            chemistry.validate().map_err(prefix)?;
            if self.titration.is_none() {
                return Err(prefix("chemistry section requires a titration section".into()));
            }
        }
        if let Some(calculation) = &self.calculation {
            if !(calculation.tolerance.is_finite() && calculation.tolerance >= 0.0) {
                return Err(prefix(format!(
                    "calculation tolerance must not be negative, got {}",
                    calculation.tolerance
                )));
            }
            self.check_formula_constants(calculation).map_err(prefix)?;
        }
        self.evaluation.validate().map_err(prefix)
    }

    /// Value of the practice field a formula constant repeats
    pub fn bound_value(&self, quantity: BoundQuantity) -> Option<f64> {
        let chemistry = self.chemistry.as_ref();
        match (quantity, chemistry) {
            (BoundQuantity::TitrantConcentration, _) => {
                self.titration.as_ref().map(|t| t.titrant_concentration)
            }
            (BoundQuantity::ExcessReagentVolume, Some(ChemistryConfig::BackTitration(p))) => {
                Some(p.excess_reagent_volume)
            }
            (BoundQuantity::ExcessReagentConcentration, Some(ChemistryConfig::BackTitration(p))) => {
                Some(p.excess_reagent_concentration)
            }
            (BoundQuantity::AnalyteMolarMass, Some(ChemistryConfig::BackTitration(p))) => {
                Some(p.analyte_molar_mass)
            }
            (BoundQuantity::AnalyteMolarMass, Some(ChemistryConfig::DirectComplexometric(p))) => {
                Some(p.analyte_molar_mass)
            }
            (BoundQuantity::ResultScale, Some(ChemistryConfig::DirectComplexometric(p))) => {
                Some(p.result_scale)
            }
            _ => None,
        }
    }

    /// Every bound constant must carry the value the models compute with
    fn check_formula_constants(
        &self,
        calculation: &CalculationConfig,
    ) -> std::result::Result<(), String> {
        for variable in &calculation.variables {
            let Some(quantity) = variable.binds else { continue };
            if variable.source != VariableSource::Constant {
                return Err(format!(
                    "formula variable {} binds {quantity} but is not a constant",
                    variable.symbol
                ));
            }
            let shown = calculation.constant(&variable.symbol).ok_or_else(|| {
                format!("formula constant {} has no value", variable.symbol)
            })?;
            let actual = self.bound_value(quantity).ok_or_else(|| {
                format!(
                    "formula constant {} binds {quantity}, which this practice does not define",
                    variable.symbol
                )
            })?;
            if (shown - actual).abs() > 1e-9 * actual.abs().max(1.0) {
                return Err(format!(
                    "formula constant {} = {shown} disagrees with {quantity} = {actual}",
                    variable.symbol
                ));
            }
        }
        Ok(())
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn range_criterion(tiers: Vec<ScoringTier>) -> Criterion {
        Criterion {
            id: CriterionId::Endpoint,
            label: "Endpoint".into(),
            weight: 25.0,
            kind: CriterionKind::Range,
            scoring: tiers,
        }
    }

    #[test]
    fn test_reaction_family_serde_tags() {
        let json = serde_json::to_string(&ReactionFamily::DirectComplexometric).unwrap();
        assert_eq!(json, "\"direct-complexometric\"");
        let family: ReactionFamily = serde_json::from_str("\"back-titration\"").unwrap();
        assert_eq!(family, ReactionFamily::BackTitration);
        assert_eq!(family.to_string(), "back-titration");
    }

    #[test]
    fn test_chemistry_config_tagged_by_family() {
        let json = r#"{
            "family": "back-titration",
            "solubilityProduct": 1e-12,
            "initialVolume": 73.0,
            "excessReagentVolume": 50.0,
            "excessReagentConcentration": 0.1,
            "analyteMolarMass": 35.45
        }"#;
        let chemistry: ChemistryConfig = serde_json::from_str(json).unwrap();
        assert_eq!(chemistry.family(), ReactionFamily::BackTitration);
        match chemistry {
            ChemistryConfig::BackTitration(p) => assert_eq!(p.equivalence_band, 0.005),
            _ => panic!("wrong family"),
        }
    }

    #[test]
    fn test_conditional_formation_constant() {
        let params = ComplexometricParams {
            log_formation_constant: 10.65,
            ligand_fraction: 0.36,
            buffer_volume: 10.0,
            analyte_molar_mass: 100.09,
            result_scale: 1000.0,
            equivalence_band: 0.005,
            species_label: String::new(),
            titrant_label: String::new(),
        };
        let kf = params.conditional_formation_constant();
        assert!((kf / 1.61e10 - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_range_criterion_requires_catch_all() {
        let criterion = range_criterion(vec![
            ScoringTier::new(0.1, 25.0, "a"),
            ScoringTier::new(1.0, 10.0, "b"),
        ]);
        let err = criterion.validate().unwrap_err();
        assert!(err.contains("catch-all"));
    }

    #[test]
    fn test_range_criterion_rejects_increasing_scores() {
        let criterion = range_criterion(vec![
            ScoringTier::new(0.1, 10.0, "a"),
            ScoringTier::new(0.5, 20.0, "b"),
            ScoringTier::new(999.0, 0.0, "c"),
        ]);
        assert!(criterion.validate().unwrap_err().contains("must not increase"));
    }

    #[test]
    fn test_range_criterion_rejects_unordered_tiers() {
        let criterion = range_criterion(vec![
            ScoringTier::new(0.5, 25.0, "a"),
            ScoringTier::new(0.1, 20.0, "b"),
            ScoringTier::new(999.0, 0.0, "c"),
        ]);
        assert!(criterion.validate().unwrap_err().contains("ascending"));
    }

    #[test]
    fn test_feedback_bands() {
        let feedback = FeedbackConfig::default();
        assert_eq!(feedback.overall(80.0), feedback.excellent_message);
        assert_eq!(feedback.overall(79.99), feedback.passing_message);
        assert_eq!(feedback.overall(60.0), feedback.passing_message);
        assert_eq!(feedback.overall(59.99), feedback.failing_message);
    }

    #[test]
    fn test_feedback_partial_override() {
        let json = r#"{ "excellentThreshold": 90, "passingMessage": "Pass." }"#;
        let feedback: FeedbackConfig = serde_json::from_str(json).unwrap();
        assert_eq!(feedback.excellent_threshold, 90.0);
        assert_eq!(feedback.passing_threshold, 60.0);
        assert_eq!(feedback.overall(85.0), "Pass.");
    }

    #[test]
    fn test_interpretation_classify() {
        let interpretation = Interpretation {
            ranges: vec![
                InterpretationRange { min: 0.0, max: 60.0, label: "Soft".into() },
                InterpretationRange { min: 60.0, max: 120.0, label: "Moderate".into() },
            ],
            explanation: String::new(),
        };
        assert_eq!(interpretation.classify(65.06), Some("Moderate"));
        assert_eq!(interpretation.classify(60.0), Some("Moderate"));
        assert_eq!(interpretation.classify(-1.0), None);
    }

    #[test]
    fn test_bound_values_follow_family() {
        let catalog = crate::practice::PracticeCatalog::builtin().unwrap();
        let volhard = catalog.get(4).unwrap();
        assert_eq!(volhard.bound_value(BoundQuantity::TitrantConcentration), Some(0.08));
        assert_eq!(volhard.bound_value(BoundQuantity::ExcessReagentVolume), Some(50.0));
        assert_eq!(volhard.bound_value(BoundQuantity::ResultScale), None);

        let hardness = catalog.get(5).unwrap();
        assert_eq!(hardness.bound_value(BoundQuantity::AnalyteMolarMass), Some(100.09));
        assert_eq!(hardness.bound_value(BoundQuantity::ResultScale), Some(1000.0));
        assert_eq!(hardness.bound_value(BoundQuantity::ExcessReagentVolume), None);
        assert_eq!(hardness.calculation().unwrap().constant("M_EDTA"), Some(0.01));
    }
}
