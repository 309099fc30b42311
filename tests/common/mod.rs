//! Common utilities for integration tests

pub mod mock_models;
pub mod test_helpers;

// Re-export commonly used items
pub use mock_models::{FlatModel, ScaledVolumeModel};
pub use test_helpers::{
    assert_non_decreasing,
    builtin_engine,
    catalog_with_plain_practice,
    completed_session,
    practice_without_chemistry,
};
