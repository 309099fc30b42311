//! Reaction family registry
//!
//! Maps the `family` tag of a practice's chemistry section to the
//! [`ReactionModel`] that implements it. The registry is built explicitly and
//! handed to the engine; nothing registers itself at load time.

use std::collections::HashMap;
use std::sync::Arc;

use crate::chemistry::proportionality;
use crate::chemistry::traits::ReactionModel;
use crate::error::{LabError, Result};
use crate::models::{BackTitrationModel, ComplexometricModel};
use crate::practice::{PracticeDefinition, ReactionFamily};

/// Reaction models keyed by family
#[derive(Clone)]
pub struct ReactionRegistry {
    models: HashMap<ReactionFamily, Arc<dyn ReactionModel>>,
}

impl std::fmt::Debug for ReactionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut families: Vec<_> = self.models.keys().collect();
        families.sort();
        f.debug_struct("ReactionRegistry")
            .field("families", &families)
            .finish()
    }
}

impl ReactionRegistry {
    /// Registry without any model
    pub fn empty() -> Self {
        Self {
            models: HashMap::new(),
        }
    }

    /// Registry with every model shipped by the crate
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(BackTitrationModel));
        registry.register(Arc::new(ComplexometricModel));
        registry
    }

    /// Add or replace the model of a family
    pub fn register(&mut self, model: Arc<dyn ReactionModel>) {
        let family = model.family();
        if self.models.insert(family, model).is_some() {
            log::debug!("Replaced reaction model for family '{family}'");
        }
    }

    pub fn get(&self, family: ReactionFamily) -> Option<&Arc<dyn ReactionModel>> {
        self.models.get(&family)
    }

    pub fn contains(&self, family: ReactionFamily) -> bool {
        self.models.contains_key(&family)
    }

    /// Model able to handle a practice
    ///
    /// # Errors
    ///
    /// `UnsupportedPractice` when the practice has no chemistry section or its
    /// family has no registered model.
    pub fn model_for(&self, practice: &PracticeDefinition) -> Result<&dyn ReactionModel> {
        let family = practice.reaction_family().ok_or_else(|| {
            LabError::unsupported(practice.id, "no reaction chemistry is described")
        })?;
        self.get(family).map(|m| m.as_ref()).ok_or_else(|| {
            LabError::unsupported(
                practice.id,
                format!("no model registered for reaction family '{family}'"),
            )
        })
    }

    /// Expected titrant volume \[mL\] for a practice
    ///
    /// Uses the practice's registered model, or the plain proportionality rule
    /// when no model applies. Every stored or reported expected volume goes
    /// through here.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when the practice has no titration section,
    /// `InvalidInput` for a measurement the rule cannot use.
    pub fn expected_volume(
        &self,
        practice: &PracticeDefinition,
        measured_value: f64,
        sample_id: Option<&str>,
    ) -> Result<f64> {
        match self.model_for(practice) {
            Ok(model) => model.expected_volume(practice, measured_value, sample_id),
            Err(_) => proportionality::resolve_expected_volume(practice, measured_value, sample_id),
        }
    }
}

impl Default for ReactionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::practice::PracticeCatalog;

    #[test]
    fn test_standard_registry_covers_both_families() {
        let registry = ReactionRegistry::standard();
        assert!(registry.contains(ReactionFamily::BackTitration));
        assert!(registry.contains(ReactionFamily::DirectComplexometric));
    }

    #[test]
    fn test_dispatch_by_family_tag() {
        let catalog = PracticeCatalog::builtin().unwrap();
        let registry = ReactionRegistry::standard();
        let model = registry.model_for(catalog.get(4).unwrap()).unwrap();
        assert_eq!(model.family(), ReactionFamily::BackTitration);
        let model = registry.model_for(catalog.get(5).unwrap()).unwrap();
        assert_eq!(model.family(), ReactionFamily::DirectComplexometric);
    }

    #[test]
    fn test_missing_model_is_unsupported() {
        let catalog = PracticeCatalog::builtin().unwrap();
        let registry = ReactionRegistry::empty();
        let err = registry.model_for(catalog.get(5).unwrap()).err().expect("expected Err");
        assert!(matches!(err, LabError::UnsupportedPractice { practice_id: 5, .. }));
    }

    #[test]
    fn test_expected_volume_without_model_uses_rule() {
        let catalog = PracticeCatalog::builtin().unwrap();
        let practice = catalog.get(5).unwrap();
        let volume = ReactionRegistry::empty().expected_volume(practice, 200.0, None).unwrap();
        assert_eq!(volume, 13.0);
        let volume = ReactionRegistry::standard().expected_volume(practice, 200.0, None).unwrap();
        assert_eq!(volume, 13.0);
    }

    #[test]
    fn test_practice_without_chemistry_is_unsupported() {
        let catalog = PracticeCatalog::builtin().unwrap();
        let mut practice = catalog.get(4).unwrap().clone();
        practice.chemistry = None;
        let err = ReactionRegistry::standard().model_for(&practice).err().expect("expected Err");
        assert!(matches!(err, LabError::UnsupportedPractice { practice_id: 4, .. }));
    }
}
