//! Titration chemistry
//!
//! This module holds the pure computations of the lab:
//! - `proportionality`: expected titrant volume from the measured sample
//! - `color`: indicator color along the titration
//! - `traits`: `ReactionModel` strategy and the `TitrationCurve` data type
//! - `registry`: reaction-family → model dispatch
//!
//! The closed-form models themselves live in [`crate::models`].

pub mod color;
pub mod proportionality;
pub mod registry;
pub mod traits;

pub use color::{color_at, progress, Rgb, DEFAULT_SOLUTION_COLOR};
pub use proportionality::{expected_volume, resolve_expected_volume, round_to, VOLUME_DECIMALS};
pub use registry::ReactionRegistry;
pub use traits::{
    linspace, p_value, sample, CurveConfig, CurveRequest, ReactionModel, ReadingDeviation,
    TitrationCurve, CONCENTRATION_FLOOR, MIN_CURVE_POINTS,
};
