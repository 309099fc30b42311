//! Closed-form reaction models
//!
//! All models implement the [`ReactionModel`](crate::chemistry::ReactionModel)
//! trait and are looked up by the reaction-family tag of a practice through the
//! [`ReactionRegistry`](crate::chemistry::ReactionRegistry).
//!
//! # Available Models
//!
//! ## [`BackTitrationModel`] (`back-titration`)
//!
//! A known excess of precipitant is added, and the unreacted excess is titrated
//! (Volhard chloride determination). The curve follows the excess species.
//!
//! ## [`ComplexometricModel`] (`direct-complexometric`)
//!
//! A metal ion is titrated directly by a chelating agent at controlled pH
//! (water hardness by EDTA). The curve follows the free metal ion.
//!
//! Each model also has a `*System` type holding the closed-form equations for a
//! fixed set of constants, usable without a practice definition.

use nalgebra::DVector;

use crate::chemistry::linspace;

// =================================================================================================
// Module Declarations
// =================================================================================================

pub mod back_titration;
pub mod complexometric;

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use back_titration::{BackTitrationModel, BackTitrationSystem};
pub use complexometric::{px_axis_max, ComplexometricModel, ComplexometricSystem};

/// Evenly spaced volumes over `[start, end]`, with the equivalence volume
/// inserted so the curve is evaluated exactly at equivalence
pub(crate) fn volume_grid(start: f64, end: f64, n: usize, equivalence_volume: f64) -> DVector<f64> {
    let base = linspace(start, end, n);
    if !(start..=end).contains(&equivalence_volume)
        || base.iter().any(|v| *v == equivalence_volume)
    {
        return base;
    }
    let at = base.as_slice().partition_point(|v| *v < equivalence_volume);
    base.insert_row(at, equivalence_volume)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_contains_equivalence() {
        let grid = volume_grid(0.05, 27.9345, 3000, 16.93);
        assert_eq!(grid.len(), 3001);
        assert!(grid.iter().any(|v| *v == 16.93));
        assert!(grid.as_slice().windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_grid_outside_range_unchanged() {
        let grid = volume_grid(0.05, 1.0, 1000, 5.0);
        assert_eq!(grid.len(), 1000);
    }
}
