//! Material selection check
//!
//! The student picks instruments and reagents from the lab inventory. The
//! selection is correct when it equals the practice's required sets; order and
//! duplicates do not matter.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::practice::definition::PracticeDefinition;

/// Instruments and reagents picked by the student
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialSelection {
    #[serde(default)]
    pub instruments: Vec<String>,

    #[serde(default)]
    pub reagents: Vec<String>,
}

impl MaterialSelection {
    pub fn new<I, R>(instruments: I, reagents: R) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            instruments: instruments.into_iter().map(Into::into).collect(),
            reagents: reagents.into_iter().map(Into::into).collect(),
        }
    }
}

/// Outcome of a material check, lists sorted alphabetically
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialsCheck {
    pub correct: bool,
    pub missing_instruments: Vec<String>,
    pub unexpected_instruments: Vec<String>,
    pub missing_reagents: Vec<String>,
    pub unexpected_reagents: Vec<String>,
}

impl MaterialsCheck {
    /// One line per problem, empty when the selection is correct
    pub fn messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        let mut push = |items: &[String], what: &str| {
            if !items.is_empty() {
                messages.push(format!("{what}: {}", items.join(", ")));
            }
        };
        push(&self.missing_instruments, "Missing instruments");
        push(&self.unexpected_instruments, "Unnecessary instruments");
        push(&self.missing_reagents, "Missing reagents");
        push(&self.unexpected_reagents, "Unnecessary reagents");
        messages
    }
}

/// Compare a selection with the practice's required materials
pub fn check_materials(practice: &PracticeDefinition, selection: &MaterialSelection) -> MaterialsCheck {
    let (missing_instruments, unexpected_instruments) =
        set_difference(&practice.required_instruments, &selection.instruments);
    let (missing_reagents, unexpected_reagents) =
        set_difference(&practice.required_reagents, &selection.reagents);

    let correct = missing_instruments.is_empty()
        && unexpected_instruments.is_empty()
        && missing_reagents.is_empty()
        && unexpected_reagents.is_empty();

    MaterialsCheck {
        correct,
        missing_instruments,
        unexpected_instruments,
        missing_reagents,
        unexpected_reagents,
    }
}

fn set_difference(required: &[String], selected: &[String]) -> (Vec<String>, Vec<String>) {
    let required: BTreeSet<&String> = required.iter().collect();
    let selected: BTreeSet<&String> = selected.iter().collect();
    let missing = required.difference(&selected).map(|s| s.to_string()).collect();
    let unexpected = selected.difference(&required).map(|s| s.to_string()).collect();
    (missing, unexpected)
}
