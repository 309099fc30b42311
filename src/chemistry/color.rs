//! Indicator color interpolation
//!
//! The color of the titrated solution is described by an ordered breakpoint
//! table of `(progress, color)` pairs. Between two breakpoints each RGB channel
//! is interpolated linearly:
//!
//! ```text
//! t       = (p - p_curr) / (p_next - p_curr)
//! channel = trunc(c_curr + (c_next - c_curr) · t)
//! ```
//!
//! Outside the table the color is clamped to the first or last breakpoint.
//!
//! # Example
//!
//! ```rust
//! use titra_rs::chemistry::{color_at, Rgb};
//! use titra_rs::practice::ColorTransition;
//!
//! let table = vec![
//!     ColorTransition::new(0.0, Rgb::new(0, 0, 0), "start"),
//!     ColorTransition::new(1.0, Rgb::new(200, 100, 50), "endpoint"),
//! ];
//! assert_eq!(color_at(&table, 0.5), Rgb::new(100, 50, 25));
//! assert_eq!(color_at(&table, 2.0), Rgb::new(200, 100, 50));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::practice::ColorTransition;

/// Color returned when a practice defines no transition table
pub const DEFAULT_SOLUTION_COLOR: Rgb = Rgb::new(0xF0, 0xF0, 0xF0);

/// 8-bit RGB color, (de)serialized as `"#RRGGBB"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Uppercase hex notation, `#RRGGBB`
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Channel-wise linear interpolation toward `other`, truncated toward zero
    ///
    /// `t` is clamped to `[0, 1]`.
    pub fn lerp(&self, other: &Rgb, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mix = |a: u8, b: u8| -> u8 {
            let (a, b) = (f64::from(a), f64::from(b));
            // `as` truncates toward zero and saturates to [0, 255]
            (a + (b - a) * t) as u8
        };
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid hex color '{s}', expected #RRGGBB"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("invalid hex color '{s}': {e}"))
        };
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}

/// Titration progress: delivered volume over expected volume
///
/// Returns 0 when the expected volume is not positive.
pub fn progress(delivered_volume: f64, expected_volume: f64) -> f64 {
    if expected_volume > 0.0 {
        delivered_volume / expected_volume
    } else {
        0.0
    }
}

/// Solution color at a titration progress
///
/// - empty table → [`DEFAULT_SOLUTION_COLOR`]
/// - `progress` at or below the first breakpoint (or NaN) → first color
/// - `progress` at or above the last breakpoint → last color
/// - otherwise interpolation inside the first bracketing pair; a zero-width
///   bracket yields its lower color
pub fn color_at(transitions: &[ColorTransition], progress: f64) -> Rgb {
    let (first, last) = match (transitions.first(), transitions.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return DEFAULT_SOLUTION_COLOR,
    };

    if progress.is_nan() || progress <= first.progress {
        return first.color;
    }
    if progress >= last.progress {
        return last.color;
    }

    for pair in transitions.windows(2) {
        let (curr, next) = (&pair[0], &pair[1]);
        if curr.progress <= progress && progress <= next.progress {
            let width = next.progress - curr.progress;
            if width <= 0.0 {
                return curr.color;
            }
            let t = (progress - curr.progress) / width;
            return curr.color.lerp(&next.color, t);
        }
    }

    last.color
}

// =================================================================================================
// Tests
// =================================================================================================
