//! Reaction model trait and titration curve types
//!
//! This module defines the core API of the chemistry layer:
//! - `ReactionModel`: strategy trait implemented once per reaction family
//! - `TitrationCurve`: sampled pX-versus-volume curve with its equivalence data
//! - `CurveRequest` / `CurveConfig`: inputs and sampling settings of a curve
//!
//! Curves are pure data. Rendering lives in [`crate::output`].

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::chemistry::proportionality;
use crate::error::{LabError, Result};
use crate::practice::{PracticeDefinition, ReactionFamily};

/// Minimum number of sampled points of a curve
pub const MIN_CURVE_POINTS: usize = 1000;

/// Sample count from which pX evaluation is dispatched to rayon
/// (only with the `parallel` feature)
pub const PARALLEL_THRESHOLD: usize = 1000;

/// Concentration floor applied before taking a logarithm \[mol/L\]
pub const CONCENTRATION_FLOOR: f64 = 1e-15;

// =================================================================================================
// Curve request and configuration
// =================================================================================================

/// Session values a curve is drawn for
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveRequest {
    /// Burette reading of the student \[mL\]
    #[serde(default)]
    pub recorded_volume: Option<f64>,

    /// Expected volume stored on the session \[mL\]
    #[serde(default)]
    pub expected_volume: Option<f64>,

    /// Sample measurement (volume or dilution factor)
    #[serde(default)]
    pub measured_value: Option<f64>,
}

impl CurveRequest {
    pub fn new(recorded_volume: f64, expected_volume: f64, measured_value: f64) -> Self {
        Self {
            recorded_volume: Some(recorded_volume),
            expected_volume: Some(expected_volume),
            measured_value: Some(measured_value),
        }
    }

    /// Recorded volume, 0 when the student has not read the burette yet
    pub fn recorded_or_zero(&self) -> f64 {
        self.recorded_volume.unwrap_or(0.0)
    }
}

/// Curve sampling settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveConfig {
    /// Number of volumes sampled over the plotted range
    pub n_points: usize,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self { n_points: 3000 }
    }
}

impl CurveConfig {
    pub fn with_points(n_points: usize) -> Self {
        Self { n_points }
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.n_points < MIN_CURVE_POINTS {
            return Err(format!(
                "a curve needs at least {MIN_CURVE_POINTS} points, got {}",
                self.n_points
            ));
        }
        Ok(())
    }
}

// =================================================================================================
// Titration curve
// =================================================================================================

/// Deviation of a burette reading from the equivalence volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadingDeviation {
    pub recorded_volume: f64,

    /// Signed error, `recorded - equivalence` \[mL\]
    pub volume_error: f64,

    /// `|volume_error| / equivalence × 100`, 0 when the equivalence volume is 0
    pub percent_error: f64,
}

impl ReadingDeviation {
    /// Chart label, e.g. `+0.05 mL (0.8%)`
    pub fn label(&self) -> String {
        let sign = if self.volume_error >= 0.0 { "+" } else { "" };
        format!("{sign}{:.2} mL ({:.1}%)", self.volume_error, self.percent_error)
    }
}

/// Sampled titration curve
#[derive(Debug, Clone)]
pub struct TitrationCurve {
    pub family: ReactionFamily,

    /// Delivered titrant volumes \[mL\], ascending
    pub volumes: DVector<f64>,

    /// pX of the followed species at each volume
    pub px: DVector<f64>,

    pub equivalence_volume: f64,
    pub equivalence_px: f64,

    /// Plotted x range \[mL\]
    pub volume_range: (f64, f64),

    /// Plotted y range
    pub px_range: (f64, f64),

    /// Half-width of the shaded endpoint tolerance band \[mL\]
    pub tolerance: f64,

    /// Followed species, e.g. `Ag+`
    pub species_label: String,

    /// Titrant, e.g. `KSCN`
    pub titrant_label: String,

    pub title: String,
}

impl TitrationCurve {
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// `(volume, pX)` pairs in volume order
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.volumes.iter().copied().zip(self.px.iter().copied())
    }

    /// Largest pX among points with `volume > min_volume`
    pub fn max_px_after(&self, min_volume: f64) -> Option<f64> {
        peak_after(&self.volumes, &self.px, min_volume)
    }

    /// Linear interpolation of pX at a volume, clamped to the sampled range
    pub fn px_at(&self, volume: f64) -> Option<f64> {
        let n = self.volumes.len();
        if n == 0 {
            return None;
        }
        if volume <= self.volumes[0] {
            return Some(self.px[0]);
        }
        if volume >= self.volumes[n - 1] {
            return Some(self.px[n - 1]);
        }
        // volumes are sorted: first index with v >= volume
        let upper = self.volumes.as_slice().partition_point(|v| *v < volume);
        let lower = upper - 1;
        let (v0, v1) = (self.volumes[lower], self.volumes[upper]);
        let (p0, p1) = (self.px[lower], self.px[upper]);
        if v1 - v0 <= 0.0 {
            return Some(p0);
        }
        Some(p0 + (p1 - p0) * (volume - v0) / (v1 - v0))
    }

    /// Deviation of a reading from this curve's equivalence volume
    pub fn deviation(&self, recorded_volume: f64) -> ReadingDeviation {
        let volume_error = recorded_volume - self.equivalence_volume;
        let percent_error = if self.equivalence_volume != 0.0 {
            volume_error.abs() / self.equivalence_volume * 100.0
        } else {
            0.0
        };
        ReadingDeviation {
            recorded_volume,
            volume_error,
            percent_error,
        }
    }
}

// =================================================================================================
// Sampling helpers
// =================================================================================================

/// `n` evenly spaced values from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, n: usize) -> DVector<f64> {
    match n {
        0 => DVector::zeros(0),
        1 => DVector::from_element(1, start),
        _ => {
            let step = (end - start) / (n - 1) as f64;
            DVector::from_fn(n, |i, _| {
                if i == n - 1 {
                    end
                } else {
                    start + step * i as f64
                }
            })
        }
    }
}

/// Evaluate `f` at every volume
///
/// With the `parallel` feature, vectors of at least [`PARALLEL_THRESHOLD`]
/// samples are evaluated with rayon.
pub fn sample<F>(volumes: &DVector<f64>, f: F) -> DVector<f64>
where
    F: Fn(f64) -> f64 + Sync + Send,
{
    let mut values = volumes.clone();

    #[cfg(feature = "parallel")]
    if values.len() >= PARALLEL_THRESHOLD {
        values.as_mut_slice().par_iter_mut().for_each(|x| *x = f(*x));
        return values;
    }

    values.iter_mut().for_each(|x| *x = f(*x));
    values
}

/// Largest pX among samples with `volume > min_volume`
pub(crate) fn peak_after(volumes: &DVector<f64>, px: &DVector<f64>, min_volume: f64) -> Option<f64> {
    volumes
        .iter()
        .zip(px.iter())
        .filter(|(v, _)| **v > min_volume)
        .map(|(_, p)| *p)
        .fold(None, |acc, p| Some(acc.map_or(p, |a: f64| a.max(p))))
}

/// `-log10(c)` with `c` floored at [`CONCENTRATION_FLOOR`]
pub fn p_value(concentration: f64) -> f64 {
    -concentration.max(CONCENTRATION_FLOOR).log10()
}

// =================================================================================================
// Reaction model trait
// =================================================================================================

/// Closed-form chemistry of one reaction family
///
/// # Responsibility
///
/// A model turns a practice definition plus session values into the numbers
/// the lab needs: the expected titrant volume, the theoretical titration
/// curve and the correct result of the student's calculation.
///
/// Models are stateless; everything they need comes from the practice's
/// `chemistry` section. They are shared across threads by the
/// [`ReactionRegistry`](crate::chemistry::ReactionRegistry).
pub trait ReactionModel: Send + Sync {
    /// Family this model implements
    fn family(&self) -> ReactionFamily;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Expected titrant volume \[mL\]
    ///
    /// Defaults to the practice's proportionality rule.
    fn expected_volume(
        &self,
        practice: &PracticeDefinition,
        measured_value: f64,
        sample_id: Option<&str>,
    ) -> Result<f64> {
        proportionality::resolve_expected_volume(practice, measured_value, sample_id)
    }

    /// Theoretical titration curve for a session
    ///
    /// # Errors
    ///
    /// `UnsupportedPractice` when the practice's chemistry belongs to another
    /// family, `InvalidInput` when no usable equivalence volume can be derived.
    fn curve(
        &self,
        practice: &PracticeDefinition,
        request: &CurveRequest,
        config: &CurveConfig,
    ) -> Result<TitrationCurve>;

    /// Correct result of the practice formula for the student's own reading
    fn correct_result(
        &self,
        practice: &PracticeDefinition,
        recorded_volume: f64,
        measured_value: f64,
    ) -> Result<f64>;
}

/// Check a curve config, mapping failures to `InvalidConfig`
pub(crate) fn checked_points(config: &CurveConfig) -> Result<usize> {
    config.validate().map_err(LabError::InvalidConfig)?;
    Ok(config.n_points)
}

/// Positive finite measurement used as a formula divisor
pub(crate) fn checked_measurement(measured_value: f64) -> Result<f64> {
    if measured_value.is_finite() && measured_value > 0.0 {
        Ok(measured_value)
    } else {
        Err(LabError::InvalidInput(format!(
            "sample measurement must be a positive number, got {measured_value}"
        )))
    }
}

// =================================================================================================
// Tests
// =================================================================================================
