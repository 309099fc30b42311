//! Evaluation report
//!
//! Each criterion of a practice's rubric is dispatched on its `(id, type)`
//! pair:
//!
//! | Criterion        | Type      | Scored from                                  |
//! |------------------|-----------|----------------------------------------------|
//! | `materials`      | `boolean` | `materials_correct == true`                  |
//! | `measurement`    | `boolean` | a measured value is present                  |
//! | `assembly`       | `boolean` | `assembly_correct == true`                   |
//! | `interpretation` | `boolean` | a student calculation is present             |
//! | `endpoint`       | `range`   | `|recorded_volume − expected_volume|` \[mL\] |
//! | `calculation`    | `range`   | stored percent error                         |
//!
//! Missing session data scores zero with an explanatory feedback; it is not an
//! error. Building the report does not touch the session; callers apply it
//! with [`SessionRecord::complete`](crate::practice::SessionRecord::complete).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chemistry::round_to;
use crate::practice::{
    Criterion, CriterionId, CriterionKind, FeedbackConfig, PracticeDefinition, SessionRecord,
};
use crate::scoring::calculation::RESULT_DECIMALS;
use crate::scoring::tiers::select_tier;

/// Score of one criterion, kept as an audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionResult {
    pub criterion_id: CriterionId,
    pub label: String,
    pub score: f64,
    pub max_score: f64,
    pub feedback: String,
}

/// Scored attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub session_id: Uuid,
    pub practice_id: u32,
    pub criteria: Vec<CriterionResult>,

    /// Sum of criterion scores, 2 decimals
    pub total_score: f64,

    pub max_score: f64,
    pub passed: bool,
    pub overall_feedback: String,
    pub generated_at: DateTime<Utc>,
}

impl EvaluationReport {
    pub fn criterion(&self, id: CriterionId) -> Option<&CriterionResult> {
        self.criteria.iter().find(|c| c.criterion_id == id)
    }
}

/// Score a session against its practice rubric
pub fn score_session(session: &SessionRecord, practice: &PracticeDefinition) -> EvaluationReport {
    let evaluation = &practice.evaluation;
    let feedback = &evaluation.feedback;

    let criteria: Vec<CriterionResult> = evaluation
        .criteria
        .iter()
        .map(|criterion| score_criterion(criterion, session, feedback))
        .collect();

    let total_score = round_to(criteria.iter().map(|c| c.score).sum(), RESULT_DECIMALS);
    let passed = total_score >= evaluation.passing_score;

    log::info!(
        "Session {} on practice {} scored {total_score}/{} (passed: {passed})",
        session.id,
        practice.id,
        evaluation.max_score
    );

    EvaluationReport {
        session_id: session.id,
        practice_id: practice.id,
        criteria,
        total_score,
        max_score: evaluation.max_score,
        passed,
        overall_feedback: feedback.overall(total_score).to_string(),
        generated_at: Utc::now(),
    }
}

fn score_criterion(
    criterion: &Criterion,
    session: &SessionRecord,
    feedback: &FeedbackConfig,
) -> CriterionResult {
    let full = |passed: bool, text: &str| (if passed { criterion.weight } else { 0.0 }, text.to_string());

    let (score, text) = match (criterion.id, criterion.kind) {
        // ── boolean criteria ──
        (CriterionId::Materials, CriterionKind::Boolean) => {
            let passed = session.materials_correct == Some(true);
            full(passed, feedback.materials.pick(passed))
        }
        (CriterionId::Measurement, CriterionKind::Boolean) => {
            let passed = session.measured_value().is_some();
            full(passed, feedback.measurement.pick(passed))
        }
        (CriterionId::Assembly, CriterionKind::Boolean) => {
            let passed = session.assembly_correct == Some(true);
            full(passed, feedback.assembly.pick(passed))
        }
        (CriterionId::Interpretation, CriterionKind::Boolean) => {
            let passed = session.student_calculation.is_some();
            full(passed, feedback.interpretation.pick(passed))
        }

        // ── range criteria ──
        (CriterionId::Endpoint, CriterionKind::Range) => {
            match (session.recorded_volume, session.expected_volume()) {
                (Some(recorded), Some(expected)) => tiered(criterion, (recorded - expected).abs()),
                _ => (0.0, feedback.endpoint_missing.clone()),
            }
        }
        (CriterionId::Calculation, CriterionKind::Range) => match session.percent_error {
            Some(error) => tiered(criterion, error),
            None => (0.0, feedback.calculation_missing.clone()),
        },

        (id, kind) => {
            log::warn!("Criterion '{id}' cannot be scored as {kind:?}, awarding 0");
            (0.0, feedback.unsupported_criterion.clone())
        }
    };

    CriterionResult {
        criterion_id: criterion.id,
        label: criterion.label.clone(),
        score,
        max_score: criterion.weight,
        feedback: text,
    }
}

fn tiered(criterion: &Criterion, error: f64) -> (f64, String) {
    match select_tier(&criterion.scoring, error) {
        Some(tier) => (tier.score, tier.feedback.clone()),
        None => {
            log::warn!("Criterion '{}': error {error} above every tier", criterion.id);
            let text = criterion
                .scoring
                .last()
                .map(|t| t.feedback.clone())
                .unwrap_or_default();
            (0.0, text)
        }
    }
}

// =================================================================================================
// Tests
// =================================================================================================
