use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use kpos_catalog::RecipeId;

/// Servings required per recipe.
pub type Requirements = BTreeMap<RecipeId, u64>;

/// Prepared servings on hand, per recipe. Mutated by the kitchen, read here.
///
/// Counts are signed because kitchen tooling can push corrections below
/// zero; anything `<= 0` is treated as none on hand.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CookedStock(BTreeMap<RecipeId, i64>);

impl CookedStock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, recipe_id: RecipeId, servings: i64) -> Self {
        self.set(recipe_id, servings);
        self
    }

    pub fn set(&mut self, recipe_id: RecipeId, servings: i64) {
        self.0.insert(recipe_id, servings);
    }

    /// `None` when the kitchen has no record for the recipe at all.
    pub fn get(&self, recipe_id: RecipeId) -> Option<i64> {
        self.0.get(&recipe_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RecipeId, i64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(RecipeId, i64)> for CookedStock {
    fn from_iter<I: IntoIterator<Item = (RecipeId, i64)>>(iter: I) -> Self {
        CookedStock(iter.into_iter().collect())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub recipe_id: RecipeId,
    pub required: u64,
    /// Raw stock value; `None` when there is no record.
    pub available: Option<i64>,
    pub missing: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookBatch {
    pub recipe_id: RecipeId,
    /// `None` when the recipe is not in the catalog snapshot.
    pub name: Option<String>,
    pub batch_yield: u32,
    pub batches: u64,
    /// `batches × batch_yield`, always `>= missing`.
    pub servings: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub ready: bool,
    pub required: Requirements,
    pub shortfalls: Vec<Shortfall>,
    pub cook_plan: Vec<CookBatch>,
}
