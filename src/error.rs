//! Error types for the titration engine
//!
//! Every fallible public operation returns [`Result<T>`]. The variants map onto
//! the way a calling service reports them:
//!
//! | Variant               | Meaning                                               |
//! |-----------------------|-------------------------------------------------------|
//! | `NotFound`            | unknown practice identifier                           |
//! | `InvalidConfig`       | practice definition lacks a section or breaks a rule  |
//! | `UnsupportedPractice` | no closed-form model for the practice's chemistry     |
//! | `InvalidInput`        | measurement that cannot be used in a ratio            |
//! | `Catalog`, `Io`       | catalog file could not be read or parsed              |
//! | `Render`              | plotting backend or image encoder failed              |
//!
//! Missing session data is not an error: an incomplete attempt is scored as
//! zero with feedback, not rejected.

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, LabError>;

/// Errors raised by the titration engine
#[derive(Error, Debug)]
pub enum LabError {
    /// Practice identifier is not in the catalog
    #[error("Practice {0} not found")]
    NotFound(u32),

    /// Practice definition is missing a section or violates an invariant
    #[error("Invalid practice configuration: {0}")]
    InvalidConfig(String),

    /// The practice's reaction chemistry has no implemented model
    #[error("Unsupported practice {practice_id}: {reason}")]
    UnsupportedPractice { practice_id: u32, reason: String },

    /// Measurement value cannot be used (non-finite, zero or negative divisor)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Catalog JSON could not be parsed
    #[error("Catalog parse error: {0}")]
    Catalog(#[from] serde_json::Error),

    /// File system error while reading a catalog or writing an artifact
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Chart rendering or image encoding failed
    #[error("Render error: {0}")]
    Render(String),
}

impl LabError {
    /// Shorthand for [`LabError::UnsupportedPractice`]
    pub fn unsupported(practice_id: u32, reason: impl Into<String>) -> Self {
        Self::UnsupportedPractice {
            practice_id,
            reason: reason.into(),
        }
    }

    /// True for errors caused by the caller's request rather than the engine
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::InvalidConfig(_)
                | Self::UnsupportedPractice { .. }
                | Self::InvalidInput(_)
        )
    }
}
