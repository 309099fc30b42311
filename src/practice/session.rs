//! Student session record
//!
//! One record per attempt. Fields fill in stage by stage (materials,
//! measurement, assembly, titration, calculation, report) without any enforced
//! order; scoring treats whatever is still missing as zero.
//!
//! The expected volume is private: it only changes through
//! [`SessionRecord::record_measurement`]. The record does not resolve it
//! itself; [`LabEngine`](crate::LabEngine) resolves it through the reaction
//! registry and hands it over, so the stored value is the one the engine
//! reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chemistry::{round_to, VOLUME_DECIMALS};
use crate::scoring::{CalculationCheck, EvaluationReport};

/// Lifecycle of a session, `InProgress → Completed` only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
}

/// Mutable record of one student attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub student_name: String,
    pub practice_id: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,

    pub sample_id: Option<String>,
    measured_value: Option<f64>,
    measured_unit: Option<String>,
    expected_volume: Option<f64>,

    pub materials_correct: Option<bool>,
    pub assembly_correct: Option<bool>,
    pub recorded_volume: Option<f64>,

    pub student_calculation: Option<f64>,
    pub correct_calculation: Option<f64>,
    pub percent_error: Option<f64>,

    pub total_score: Option<f64>,
    pub feedback: Option<String>,
}

impl SessionRecord {
    /// Empty in-progress record
    pub fn new(practice_id: u32, student_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_name: student_name.into(),
            practice_id,
            started_at: Utc::now(),
            completed_at: None,
            status: SessionStatus::InProgress,
            sample_id: None,
            measured_value: None,
            measured_unit: None,
            expected_volume: None,
            materials_correct: None,
            assembly_correct: None,
            recorded_volume: None,
            student_calculation: None,
            correct_calculation: None,
            percent_error: None,
            total_score: None,
            feedback: None,
        }
    }

    /// New record with an expected volume already resolved for the practice's
    /// default measurement, when it has one
    pub fn start(
        practice_id: u32,
        student_name: impl Into<String>,
        expected_volume: Option<f64>,
    ) -> Self {
        let mut session = Self::new(practice_id, student_name);
        session.expected_volume = expected_volume.map(|v| round_to(v, VOLUME_DECIMALS));
        session
    }

    pub fn measured_value(&self) -> Option<f64> {
        self.measured_value
    }

    pub fn measured_unit(&self) -> Option<&str> {
        self.measured_unit.as_deref()
    }

    pub fn expected_volume(&self) -> Option<f64> {
        self.expected_volume
    }

    /// Store a measurement with the expected volume resolved for it
    ///
    /// `expected_volume` is `None` for a practice without a titration section.
    /// It is stored rounded to [`VOLUME_DECIMALS`] and returned.
    pub fn record_measurement(
        &mut self,
        value: f64,
        unit: impl Into<String>,
        sample_id: Option<&str>,
        expected_volume: Option<f64>,
    ) -> Option<f64> {
        let expected = expected_volume.map(|v| round_to(v, VOLUME_DECIMALS));
        self.measured_value = Some(value);
        self.measured_unit = Some(unit.into());
        self.sample_id = sample_id.map(str::to_string);
        self.expected_volume = expected;
        expected
    }

    pub fn record_materials(&mut self, correct: bool) {
        self.materials_correct = Some(correct);
    }

    pub fn record_assembly(&mut self, correct: bool) {
        self.assembly_correct = Some(correct);
    }

    /// Burette reading at the endpoint \[mL\]
    pub fn record_titration(&mut self, recorded_volume: f64) {
        self.recorded_volume = Some(recorded_volume);
    }

    /// Store the outcome of a calculation validation
    pub fn record_calculation(&mut self, check: &CalculationCheck) {
        self.student_calculation = Some(check.student_result);
        self.correct_calculation = Some(check.correct_result);
        self.percent_error = Some(check.percent_error);
    }

    /// Write the report outcome and close the session
    pub fn complete(&mut self, report: &EvaluationReport) {
        if self.status == SessionStatus::Completed {
            log::warn!("Session {} scored again, overwriting previous result", self.id);
        }
        self.total_score = Some(report.total_score);
        self.feedback = Some(report.overall_feedback.clone());
        self.status = SessionStatus::Completed;
        self.completed_at = Some(report.generated_at);
    }

    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }
}

// =================================================================================================
// Tests
// =================================================================================================
