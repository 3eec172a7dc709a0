use tracing::debug;

use kpos_cart::Cart;
use kpos_catalog::CatalogSnapshot;

use crate::types::{CookBatch, CookedStock, ReadinessReport, Requirements, Shortfall};

/// Servings per recipe for an order's contents.
pub fn aggregate_requirements(contents: &Cart) -> Requirements {
    let mut req = Requirements::new();
    for meal in contents.meals() {
        for s in meal.selections.iter() {
            *req.entry(s.recipe_id).or_insert(0) += meal.quantity as u64;
        }
    }
    for item in contents.items() {
        *req.entry(item.recipe_id).or_insert(0) += item.quantity as u64;
    }
    req
}

fn missing_for(required: u64, available: Option<i64>) -> u64 {
    let on_hand = available.map(|a| a.max(0) as u64).unwrap_or(0);
    required.saturating_sub(on_hand)
}

/// `true` iff every required recipe has a stock record with at least the
/// required servings. Stops at the first shortfall.
pub fn is_ready(contents: &Cart, stock: &CookedStock) -> bool {
    aggregate_requirements(contents)
        .iter()
        .all(|(id, &required)| missing_for(required, stock.get(*id)) == 0)
}

/// Every recipe that is short, in recipe-id order.
pub fn shortfalls(contents: &Cart, stock: &CookedStock) -> Vec<Shortfall> {
    aggregate_requirements(contents)
        .into_iter()
        .filter_map(|(recipe_id, required)| {
            let available = stock.get(recipe_id);
            let missing = missing_for(required, available);
            (missing > 0).then_some(Shortfall {
                recipe_id,
                required,
                available,
                missing,
            })
        })
        .collect()
}

/// Batches to cook per short recipe: `ceil(missing / yield)`. A recipe with
/// no usable yield (unknown, or `0`) is cooked one serving per batch.
pub fn cook_plan(shortfalls: &[Shortfall], catalog: &CatalogSnapshot) -> Vec<CookBatch> {
    shortfalls
        .iter()
        .map(|s| {
            let recipe = catalog.recipe(s.recipe_id);
            let batch_yield = recipe.map(|r| r.batch_yield).filter(|&y| y > 0).unwrap_or(1);
            let batches = s.missing.div_ceil(batch_yield as u64);
            CookBatch {
                recipe_id: s.recipe_id,
                name: recipe.map(|r| r.name.clone()),
                batch_yield,
                batches,
                servings: batches * batch_yield as u64,
            }
        })
        .collect()
}

/// Full diagnostic: readiness, requirements, shortfalls and (when a catalog
/// is at hand) the cook plan.
pub fn readiness_report(
    contents: &Cart,
    stock: &CookedStock,
    catalog: Option<&CatalogSnapshot>,
) -> ReadinessReport {
    let required = aggregate_requirements(contents);
    let short = shortfalls(contents, stock);
    let plan = catalog.map(|c| cook_plan(&short, c)).unwrap_or_default();
    debug!(
        recipes = required.len(),
        short = short.len(),
        "readiness evaluated"
    );
    ReadinessReport {
        ready: short.is_empty(),
        required,
        shortfalls: short,
        cook_plan: plan,
    }
}
