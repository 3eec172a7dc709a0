use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::records::{MealTypeRecord, RecipeRecord};
use crate::source::CatalogSource;
use crate::types::{Category, MealTypeDefinition, RecipeId, RecipeItem};
use crate::CatalogError;

/// Immutable, request-scoped view of the menu.
///
/// Built once per screen/session from a [`CatalogSource`] and never
/// re-fetched while a mutation is being validated. Lookups are exact:
/// meal-type names are case-sensitive keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogSnapshot {
    meal_types: BTreeMap<String, MealTypeDefinition>,
    recipes: BTreeMap<RecipeId, RecipeItem>,
}

impl CatalogSnapshot {
    /// Build from already-typed entities. Duplicate keys are rejected
    /// rather than silently overwritten.
    pub fn from_parts(
        meal_types: Vec<MealTypeDefinition>,
        recipes: Vec<RecipeItem>,
    ) -> Result<Self, CatalogError> {
        let mut mt = BTreeMap::new();
        for def in meal_types {
            if mt.contains_key(&def.name) {
                return Err(CatalogError::DuplicateMealType(def.name));
            }
            mt.insert(def.name.clone(), def);
        }

        let mut rc = BTreeMap::new();
        for item in recipes {
            if rc.contains_key(&item.id) {
                return Err(CatalogError::DuplicateRecipe(item.id));
            }
            rc.insert(item.id, item);
        }

        Ok(Self {
            meal_types: mt,
            recipes: rc,
        })
    }

    /// Build from wire records.
    pub fn from_records(
        meal_types: Vec<MealTypeRecord>,
        recipes: Vec<RecipeRecord>,
    ) -> Result<Self, CatalogError> {
        let meal_types = meal_types
            .into_iter()
            .map(MealTypeDefinition::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let recipes = recipes
            .into_iter()
            .map(RecipeItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_parts(meal_types, recipes)
    }

    /// Fetch both lists from `source`. Either fetch failing makes the whole
    /// snapshot unavailable; an empty catalog is never substituted.
    pub fn load(source: &dyn CatalogSource) -> Result<Self, CatalogError> {
        let meal_types = source.fetch_meal_types().map_err(|e| {
            warn!(error = %e, "catalog meal-type fetch failed");
            CatalogError::unavailable("meal types", e)
        })?;
        let recipes = source.fetch_recipes().map_err(|e| {
            warn!(error = %e, "catalog recipe fetch failed");
            CatalogError::unavailable("recipes", e)
        })?;

        let snap = Self::from_records(meal_types, recipes)?;
        info!(
            meal_types = snap.meal_types.len(),
            recipes = snap.recipes.len(),
            "catalog snapshot loaded"
        );
        Ok(snap)
    }

    pub fn meal_type(&self, name: &str) -> Option<&MealTypeDefinition> {
        self.meal_types.get(name)
    }

    pub fn recipe(&self, id: RecipeId) -> Option<&RecipeItem> {
        self.recipes.get(&id)
    }

    /// Recipe only if it exists AND belongs to `category`.
    pub fn recipe_in(&self, id: RecipeId, category: Category) -> Option<&RecipeItem> {
        self.recipe(id).filter(|r| r.category == category)
    }

    pub fn meal_types(&self) -> impl Iterator<Item = &MealTypeDefinition> {
        self.meal_types.values()
    }

    pub fn recipes(&self) -> impl Iterator<Item = &RecipeItem> {
        self.recipes.values()
    }

    pub fn recipes_in(&self, category: Category) -> impl Iterator<Item = &RecipeItem> {
        self.recipes.values().filter(move |r| r.category == category)
    }

    pub fn seasonal_recipes(&self) -> impl Iterator<Item = &RecipeItem> {
        self.recipes.values().filter(|r| r.seasonal)
    }

    pub fn is_empty(&self) -> bool {
        self.meal_types.is_empty() && self.recipes.is_empty()
    }

    /// Back to wire records (for `GET /v1/catalog` and the CLI).
    pub fn to_records(&self) -> (Vec<MealTypeRecord>, Vec<RecipeRecord>) {
        (
            self.meal_types.values().map(MealTypeRecord::from).collect(),
            self.recipes.values().map(RecipeRecord::from).collect(),
        )
    }
}
