//! End-to-end lab sessions through the engine facade
//!
//! Each test drives a session the way a surrounding service would: start,
//! check materials, measure, titrate, submit the calculation, then score.

mod common;

use std::sync::Arc;

use approx::assert_relative_eq;
use common::{
    builtin_engine, catalog_with_plain_practice, completed_session, FlatModel, ScaledVolumeModel,
};
use titra_rs::chemistry::{CurveRequest, ReactionRegistry, Rgb};
use titra_rs::practice::{CriterionId, MaterialSelection, ReactionFamily, SessionStatus};
use titra_rs::{LabEngine, LabError};

// =================================================================================================
// Expected volumes and colors
// =================================================================================================

#[test]
fn test_direct_rule_scales_with_sample() {
    let engine = builtin_engine();

    let reference = engine.resolve_expected_volume(5, 100.0, None).unwrap();
    assert_eq!(reference.expected_volume, 6.5);

    let doubled = engine.resolve_expected_volume(5, 200.0, None).unwrap();
    assert_eq!(doubled.expected_volume, 13.0);

    let small = engine.resolve_expected_volume(5, 37.0, None).unwrap();
    assert_eq!(small.expected_volume, 2.405);
    assert!(small.explanation.contains("Water Hardness"));
}

#[test]
fn test_fixed_rule_ignores_sample() {
    let engine = builtin_engine();
    for measured in [5.0, 10.0, 25.0] {
        let resolved = engine.resolve_expected_volume(4, measured, None).unwrap();
        assert_eq!(resolved.expected_volume, 16.93);
    }
}

#[test]
fn test_direct_rule_rejects_non_positive_sample() {
    let engine = builtin_engine();
    assert!(matches!(
        engine.resolve_expected_volume(5, 0.0, None),
        Err(LabError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.resolve_expected_volume(5, f64::NAN, None),
        Err(LabError::InvalidInput(_))
    ));
}

#[test]
fn test_color_table_endpoints() {
    let engine = builtin_engine();

    assert_eq!(engine.interpolate_color(5, 0.0).unwrap(), "#D07070".parse::<Rgb>().unwrap());
    assert_eq!(engine.interpolate_color(5, 1.0).unwrap().to_hex(), "#6B90E0");
    assert_eq!(engine.interpolate_color(5, 1.15).unwrap().to_hex(), "#4870C0");

    // clamped outside the table
    assert_eq!(engine.interpolate_color(5, -0.3).unwrap().to_hex(), "#D07070");
    assert_eq!(engine.interpolate_color(5, 4.0).unwrap().to_hex(), "#4870C0");
}

#[test]
fn test_color_is_deterministic() {
    let engine = builtin_engine();
    let first = engine.interpolate_color(4, 0.613).unwrap();
    for _ in 0..10 {
        assert_eq!(engine.interpolate_color(4, 0.613).unwrap(), first);
    }
}

// =================================================================================================
// Calculation validation
// =================================================================================================

#[test]
fn test_hardness_calculation_example() {
    let engine = builtin_engine();
    let check = engine.validate_calculation(5, 6.5, 100.0, 65.0).unwrap();

    assert_eq!(check.correct_result, 65.06);
    assert_eq!(check.student_result, 65.0);
    assert_eq!(check.percent_error, 0.09);
    assert!(check.is_within_tolerance);
    assert_eq!(check.interpretation.as_deref(), Some("Moderately hard water"));
}

#[test]
fn test_volhard_calculation_uses_own_reading() {
    let engine = builtin_engine();
    let check = engine.validate_calculation(4, 16.93, 10.0, 12.92).unwrap();
    assert_relative_eq!(check.correct_result, 12.92, epsilon = 1e-9);

    // a late endpoint lowers the correct result
    let late = engine.validate_calculation(4, 18.0, 10.0, 12.92).unwrap();
    assert!(late.correct_result < check.correct_result);
    assert!(!late.is_within_tolerance);
}

// =================================================================================================
// Full sessions
// =================================================================================================

#[test]
fn test_hardness_session_full_marks() {
    let engine = builtin_engine();
    let mut session = engine.start_session(5, "Ada").unwrap();
    assert_eq!(session.expected_volume(), Some(6.5));

    let materials = engine
        .check_materials(
            &mut session,
            &MaterialSelection::new(
                ["PRO-250", "ERL-250", "BUR-050"],
                ["TAMPON-PH10", "IND-NET", "EDTA-001M"],
            ),
        )
        .unwrap();
    assert!(materials.correct);

    engine.record_measurement(&mut session, 100.0, "mL", None).unwrap();
    session.record_assembly(true);
    session.record_titration(6.55);

    let check = engine.submit_calculation(&mut session, 65.0).unwrap();
    assert!(check.is_within_tolerance);

    let report = engine.generate_report(&mut session).unwrap();
    assert_eq!(report.total_score, 100.0);
    assert!(report.passed);
    assert_eq!(report.session_id, session.id);
    assert_eq!(report.criteria.len(), 6);

    assert_eq!(session.status, SessionStatus::Completed);
    assert!(session.is_completed());
    assert_eq!(session.total_score, Some(100.0));
    assert_eq!(session.completed_at, Some(report.generated_at));
}

#[test]
fn test_volhard_session_full_marks() {
    let engine = builtin_engine();
    let mut session = completed_session(&engine, 4, 17.0, 12.9);
    let report = engine.generate_report(&mut session).unwrap();
    assert_eq!(report.total_score, 100.0);
    assert!(report.passed);
}

#[test]
fn test_wrong_materials_and_late_endpoint() {
    let engine = builtin_engine();
    let mut session = engine.start_session(5, "Ada").unwrap();

    let materials = engine
        .check_materials(
            &mut session,
            &MaterialSelection::new(["PRO-250", "BUR-050"], ["IND-NET", "EDTA-001M", "HNO3-1A1"]),
        )
        .unwrap();
    assert!(!materials.correct);
    assert_eq!(materials.missing_instruments, vec!["ERL-250".to_string()]);
    assert_eq!(materials.unexpected_reagents, vec!["HNO3-1A1".to_string()]);

    engine.record_measurement(&mut session, 100.0, "mL", None).unwrap();
    session.record_assembly(true);
    // 0.4 mL past the expected 6.5 mL
    session.record_titration(6.9);
    engine.submit_calculation(&mut session, 69.06).unwrap();

    let report = engine.generate_report(&mut session).unwrap();
    assert_eq!(report.criterion(CriterionId::Materials).unwrap().score, 0.0);
    assert_eq!(report.criterion(CriterionId::Endpoint).unwrap().score, 15.0);
    assert_eq!(report.criterion(CriterionId::Calculation).unwrap().score, 25.0);
    assert_eq!(report.total_score, 75.0);
    assert!(report.passed);
}

#[test]
fn test_abandoned_session_fails() {
    let engine = builtin_engine();
    let mut session = engine.start_session(4, "Ada").unwrap();
    let report = engine.generate_report(&mut session).unwrap();

    assert_eq!(report.total_score, 0.0);
    assert!(!report.passed);
    assert_eq!(
        report.overall_feedback,
        engine.practice(4).unwrap().evaluation.feedback.failing_message
    );
    assert!(session.is_completed());
}

#[test]
fn test_report_total_matches_criteria() {
    let engine = builtin_engine();
    let mut session = completed_session(&engine, 5, 7.1, 60.0);
    let report = engine.generate_report(&mut session).unwrap();

    let sum: f64 = report.criteria.iter().map(|c| c.score).sum();
    assert_relative_eq!(report.total_score, sum, epsilon = 1e-9);
    assert!(report.criteria.iter().all(|c| c.score <= c.max_score));
}

// =================================================================================================
// Registry dispatch
// =================================================================================================

#[test]
fn test_practice_without_model_is_unsupported() {
    let engine = LabEngine::new(catalog_with_plain_practice(1), ReactionRegistry::standard());

    // volume resolution and colors still work from the titration section
    let resolved = engine.resolve_expected_volume(1, 10.0, None).unwrap();
    assert_eq!(resolved.expected_volume, 16.93);
    assert!(engine.interpolate_color(1, 0.5).is_ok());

    let request = CurveRequest::new(17.0, 16.93, 10.0);
    let err = engine.build_curve(1, &request).unwrap_err();
    assert!(matches!(err, LabError::UnsupportedPractice { practice_id: 1, .. }));
    assert!(err.is_client_error());

    assert!(matches!(
        engine.validate_calculation(1, 17.0, 10.0, 12.9),
        Err(LabError::UnsupportedPractice { .. })
    ));
}

#[test]
fn test_empty_registry_is_unsupported() {
    let engine = LabEngine::new(
        titra_rs::practice::PracticeCatalog::builtin().unwrap(),
        ReactionRegistry::empty(),
    );
    let request = CurveRequest::new(6.55, 6.5, 100.0);
    assert!(matches!(
        engine.build_curve(5, &request),
        Err(LabError::UnsupportedPractice { practice_id: 5, .. })
    ));
}

#[test]
fn test_registered_model_replaces_standard() {
    let mut registry = ReactionRegistry::standard();
    registry.register(Arc::new(FlatModel::new(ReactionFamily::DirectComplexometric, 4.0, 42.0)));
    let engine = LabEngine::new(titra_rs::practice::PracticeCatalog::builtin().unwrap(), registry);

    let curve = engine.build_curve(5, &CurveRequest::new(6.55, 6.5, 100.0)).unwrap();
    assert!(curve.px.iter().all(|p| *p == 4.0));

    let check = engine.validate_calculation(5, 6.5, 100.0, 42.0).unwrap();
    assert_eq!(check.correct_result, 42.0);
    assert_eq!(check.percent_error, 0.0);

    // the other family keeps its standard model
    let volhard = engine.build_curve(4, &CurveRequest::new(17.0, 16.93, 10.0)).unwrap();
    assert_eq!(volhard.family, ReactionFamily::BackTitration);
}

#[test]
fn test_session_stores_registry_volume() {
    let mut registry = ReactionRegistry::standard();
    registry.register(Arc::new(ScaledVolumeModel { factor: 2.0 }));
    let engine = LabEngine::new(titra_rs::practice::PracticeCatalog::builtin().unwrap(), registry);

    let resolved = engine.resolve_expected_volume(5, 100.0, None).unwrap();
    assert_eq!(resolved.expected_volume, 13.0);

    // precomputed from the 100 mL default measurement
    let mut session = engine.start_session(5, "Ada").unwrap();
    assert_eq!(session.expected_volume(), Some(resolved.expected_volume));

    let stored = engine.record_measurement(&mut session, 100.0, "mL", None).unwrap();
    assert_eq!(stored, Some(resolved.expected_volume));
    assert_eq!(session.expected_volume(), Some(resolved.expected_volume));

    // the endpoint is scored against the same volume
    session.record_titration(13.0);
    let report = engine.generate_report(&mut session).unwrap();
    assert_eq!(report.criterion(CriterionId::Endpoint).unwrap().score, 25.0);
}
