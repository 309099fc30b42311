//! Read-only practice catalog
//!
//! The catalog is built once (from the embedded defaults or a JSON file),
//! validated, and then only read. It is `Send + Sync` and can be shared behind
//! an `Arc` by every request handler of a surrounding service.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{LabError, Result};
use crate::practice::definition::PracticeDefinition;

/// Practice definitions shipped with the crate
const BUILTIN_PRACTICES: &str = include_str!("../../data/practices.json");

/// Immutable collection of practice definitions keyed by id
#[derive(Debug, Clone, Default)]
pub struct PracticeCatalog {
    practices: BTreeMap<u32, PracticeDefinition>,
}

impl PracticeCatalog {
    /// Build a catalog from definitions, validating each one
    ///
    /// # Errors
    ///
    /// `InvalidConfig` on a duplicated id or a definition breaking an invariant
    /// (weights not summing to `maxScore`, unordered tiers, ...).
    pub fn new(definitions: Vec<PracticeDefinition>) -> Result<Self> {
        let mut practices = BTreeMap::new();
        for definition in definitions {
            definition.validate().map_err(LabError::InvalidConfig)?;
            let id = definition.id;
            if practices.insert(id, definition).is_some() {
                return Err(LabError::InvalidConfig(format!("duplicate practice id {id}")));
            }
        }
        log::info!("Practice catalog loaded with {} practices", practices.len());
        Ok(Self { practices })
    }

    /// Catalog with the practices embedded in the crate
    /// (4: Volhard chloride back-titration, 5: water hardness by EDTA)
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_PRACTICES)
    }

    /// Parse a JSON array of practice definitions
    pub fn from_json_str(json: &str) -> Result<Self> {
        let definitions: Vec<PracticeDefinition> = serde_json::from_str(json)?;
        Self::new(definitions)
    }

    /// Read and parse a JSON catalog file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading practice catalog from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Definition for `id`, or `NotFound`
    pub fn get(&self, id: u32) -> Result<&PracticeDefinition> {
        self.practices.get(&id).ok_or(LabError::NotFound(id))
    }

    pub fn contains(&self, id: u32) -> bool {
        self.practices.contains_key(&id)
    }

    /// All definitions, ordered by id
    pub fn iter(&self) -> impl Iterator<Item = &PracticeDefinition> {
        self.practices.values()
    }

    pub fn ids(&self) -> Vec<u32> {
        self.practices.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.practices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.practices.is_empty()
    }
}

// =================================================================================================
// Tests
// =================================================================================================
