//! Re-derive every cart price from the current catalog.
//!
//! Prices captured when a line was added are a convenience for display.
//! Before money changes hands the cart is rebuilt against the snapshot in
//! force at that moment; lines that no longer resolve are reported rather
//! than silently priced at a stale amount.

use serde::{Deserialize, Serialize};
use tracing::debug;

use kpos_cart::{Cart, IndividualItem, LineKind, MealOrder, MealSelections, RecipeSelection};
use kpos_catalog::{CatalogSnapshot, MealSlot, RecipeId};

use crate::engine::meal_unit_price_for;
use crate::types::{PricingError, PricingPolicy};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StaleReason {
    MealTypeGone { meal_type: String },
    RecipeGone { recipe_id: RecipeId },
    /// Recipe still exists but no longer fits the slot/category it was
    /// picked for.
    CategoryChanged { recipe_id: RecipeId },
    /// The meal type's required counts changed.
    CompositionChanged { meal_type: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleLine {
    pub kind: LineKind,
    pub position: usize,
    #[serde(flatten)]
    pub reason: StaleReason,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepriceReport {
    /// Surviving lines with refreshed prices, names and premium flags.
    pub cart: Cart,
    pub stale: Vec<StaleLine>,
}

impl RepriceReport {
    pub fn is_clean(&self) -> bool {
        self.stale.is_empty()
    }
}

pub fn reprice_cart(
    cart: &Cart,
    catalog: &CatalogSnapshot,
    policy: &PricingPolicy,
) -> Result<RepriceReport, PricingError> {
    let mut stale = Vec::new();
    let mut meals = Vec::with_capacity(cart.meals().len());
    for (position, m) in cart.meals().iter().enumerate() {
        match reprice_meal(m, catalog, policy)? {
            Ok(fresh) => meals.push(fresh),
            Err(reason) => {
                debug!(position, ?reason, "meal line stale at reprice");
                stale.push(StaleLine {
                    kind: LineKind::Meal,
                    position,
                    reason,
                });
            }
        }
    }

    let mut items = Vec::with_capacity(cart.items().len());
    for (position, it) in cart.items().iter().enumerate() {
        match catalog.recipe(it.recipe_id) {
            None => stale.push(StaleLine {
                kind: LineKind::Item,
                position,
                reason: StaleReason::RecipeGone {
                    recipe_id: it.recipe_id,
                },
            }),
            Some(r) if r.category != it.category => stale.push(StaleLine {
                kind: LineKind::Item,
                position,
                reason: StaleReason::CategoryChanged {
                    recipe_id: it.recipe_id,
                },
            }),
            Some(r) => items.push(IndividualItem::of(r, it.quantity)),
        }
    }

    Ok(RepriceReport {
        cart: Cart::from_lines(meals, items),
        stale,
    })
}

fn reprice_meal(
    m: &MealOrder,
    catalog: &CatalogSnapshot,
    policy: &PricingPolicy,
) -> Result<Result<MealOrder, StaleReason>, PricingError> {
    let Some(def) = catalog.meal_type(&m.meal_type) else {
        return Ok(Err(StaleReason::MealTypeGone {
            meal_type: m.meal_type.clone(),
        }));
    };

    let mut selections = MealSelections::default();
    for slot in MealSlot::ALL {
        let picked = m.selections.slot(slot);
        if picked.len() as u64 != def.required(slot) as u64 {
            return Ok(Err(StaleReason::CompositionChanged {
                meal_type: m.meal_type.clone(),
            }));
        }
        for s in picked {
            let Some(r) = catalog.recipe(s.recipe_id) else {
                return Ok(Err(StaleReason::RecipeGone {
                    recipe_id: s.recipe_id,
                }));
            };
            if r.category != slot.category() {
                return Ok(Err(StaleReason::CategoryChanged {
                    recipe_id: s.recipe_id,
                }));
            }
            selections.slot_mut(slot).push(RecipeSelection::of(r));
        }
    }

    let unit_price = meal_unit_price_for(def, &selections, policy)?;
    Ok(Ok(MealOrder {
        meal_type: def.name.clone(),
        quantity: m.quantity,
        unit_price,
        selections,
    }))
}
