//! Helper functions for integration tests

use titra_rs::practice::{MaterialSelection, PracticeCatalog, PracticeDefinition, SessionRecord};
use titra_rs::LabEngine;

/// Engine over the built-in catalog and the standard models
pub fn builtin_engine() -> LabEngine {
    LabEngine::builtin().expect("built-in catalog must load")
}

/// Walk a session through every step with the given reading and result
///
/// Materials, measurement (the practice default) and assembly are all correct.
pub fn completed_session(
    engine: &LabEngine,
    practice_id: u32,
    recorded_volume: f64,
    student_result: f64,
) -> SessionRecord {
    let practice = engine.practice(practice_id).unwrap().clone();
    let mut session = engine.start_session(practice_id, "Test Student").unwrap();

    let selection = MaterialSelection::new(
        practice.required_instruments.clone(),
        practice.required_reagents.clone(),
    );
    engine.check_materials(&mut session, &selection).unwrap();

    let measurement = practice.measurement.as_ref().expect("practice has a measurement step");
    let measured = measurement.default_value.unwrap_or(1.0);
    engine
        .record_measurement(&mut session, measured, &measurement.unit, None)
        .unwrap();
    session.record_assembly(true);
    session.record_titration(recorded_volume);
    engine.submit_calculation(&mut session, student_result).unwrap();
    session
}

/// Practice 4 with the chemistry section removed and a new id
pub fn practice_without_chemistry(id: u32) -> PracticeDefinition {
    let catalog = PracticeCatalog::builtin().unwrap();
    let mut practice = catalog.get(4).unwrap().clone();
    practice.id = id;
    practice.name = "Plain Titration".to_string();
    practice.chemistry = None;
    practice
}

/// Built-in practices plus one practice without a reaction model
pub fn catalog_with_plain_practice(id: u32) -> PracticeCatalog {
    let builtin = PracticeCatalog::builtin().unwrap();
    let mut definitions: Vec<PracticeDefinition> = builtin.iter().cloned().collect();
    definitions.push(practice_without_chemistry(id));
    PracticeCatalog::new(definitions).unwrap()
}

/// Assert that a sequence never decreases
pub fn assert_non_decreasing(values: &[f64], message: &str) {
    for (i, pair) in values.windows(2).enumerate() {
        assert!(
            pair[1] >= pair[0],
            "{}: value {} at index {} drops to {}",
            message,
            pair[0],
            i,
            pair[1]
        );
    }
}
