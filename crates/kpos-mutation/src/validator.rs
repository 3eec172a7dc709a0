//! Mutation validator.
//!
//! Turns an untrusted [`MutationRequest`] into lines that are true to the
//! catalog snapshot. Invalid lines are dropped individually (allow-list
//! filtering); only "nothing at all was valid" escalates. Prices and names
//! always come from the catalog.

use serde::{Deserialize, Serialize};
use tracing::debug;

use kpos_cart::{
    AddBatch, Cart, IndividualItem, LineKind, MealOrder, MealSelections, RecipeSelection,
    RemovalPlan,
};
use kpos_catalog::{CatalogSnapshot, Category, MealSlot, Micros, RecipeId};
use kpos_pricing::{meal_unit_price_for, PricingError, PricingPolicy};

use crate::request::{AddRequest, ItemRequest, MealRequest, MutationRequest, RemoveRequest};

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DropReason {
    UnknownMealType {
        meal_type: String,
    },
    UnknownRecipe {
        recipe_id: RecipeId,
    },
    CategoryMismatch {
        recipe_id: RecipeId,
        expected: Category,
        found: Option<String>,
    },
    IncompleteMealComposition {
        meal_type: String,
        slot: MealSlot,
        required: u32,
        found: u32,
    },
    InvalidQuantity {
        raw: String,
    },
    Malformed {
        detail: String,
    },
    /// Meal price arithmetic overflowed; the line is unusable.
    Unpriceable {
        detail: String,
    },
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::UnknownMealType { meal_type } => {
                write!(f, "unknown meal type '{meal_type}'")
            }
            DropReason::UnknownRecipe { recipe_id } => write!(f, "unknown recipe {recipe_id}"),
            DropReason::CategoryMismatch {
                recipe_id,
                expected,
                found,
            } => match found {
                Some(found) => write!(
                    f,
                    "recipe {recipe_id} is {expected}, request said '{found}'"
                ),
                None => write!(f, "recipe {recipe_id} is {expected}, request gave no category"),
            },
            DropReason::IncompleteMealComposition {
                meal_type,
                slot,
                required,
                found,
            } => write!(
                f,
                "{meal_type} needs {required} {slot}, {found} valid selected"
            ),
            DropReason::InvalidQuantity { raw } => write!(f, "invalid quantity {raw}"),
            DropReason::Malformed { detail } => write!(f, "malformed line: {detail}"),
            DropReason::Unpriceable { detail } => write!(f, "cannot price line: {detail}"),
        }
    }
}

/// A request line the validator discarded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedLine {
    pub kind: LineKind,
    /// 0-based position within its list in the request.
    pub position: usize,
    #[serde(flatten)]
    pub reason: DropReason,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedAdd {
    pub batch: AddBatch,
    pub dropped: Vec<DroppedLine>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidatedMutation {
    Add(ValidatedAdd),
    Remove(RemovalPlan),
    ClearAll,
    /// Empty add request.
    Noop,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rejection", rename_all = "snake_case")]
pub enum Rejection {
    /// A non-empty add (or an unreadable payload) yielded zero usable lines.
    NoValidItems { dropped: Vec<DroppedLine> },
    /// A remove request matched no line in the cart.
    EmptyRemovalResult {
        requested: usize,
        meals_in_cart: usize,
        items_in_cart: usize,
    },
    /// No catalog snapshot is available; adds cannot be validated.
    CatalogUnavailable { detail: String },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::NoValidItems { dropped } => {
                write!(f, "no valid items in request ({} dropped)", dropped.len())
            }
            Rejection::EmptyRemovalResult {
                requested,
                meals_in_cart,
                items_in_cart,
            } => write!(
                f,
                "none of {requested} removal position(s) matched a cart with {meals_in_cart} meal(s) and {items_in_cart} item(s)"
            ),
            Rejection::CatalogUnavailable { detail } => {
                write!(f, "validation unavailable: {detail}")
            }
        }
    }
}

impl std::error::Error for Rejection {}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

/// Validate `request` against `catalog` and the cart as it is right now.
pub fn validate(
    request: &MutationRequest,
    catalog: &CatalogSnapshot,
    cart: &Cart,
    policy: &PricingPolicy,
) -> Result<ValidatedMutation, Rejection> {
    match request {
        MutationRequest::Add(add) => validate_add(add, catalog, policy),
        MutationRequest::Remove(rm) => validate_remove(rm, cart),
    }
}

pub fn validate_add(
    add: &AddRequest,
    catalog: &CatalogSnapshot,
    policy: &PricingPolicy,
) -> Result<ValidatedMutation, Rejection> {
    if add.is_empty() {
        return Ok(ValidatedMutation::Noop);
    }

    let mut batch = AddBatch::default();
    let mut dropped = Vec::new();

    for (position, line) in add.meals.iter().enumerate() {
        let result = match line {
            Ok(req) => validate_meal(req, catalog, policy),
            Err(m) => Err(DropReason::Malformed {
                detail: m.detail.clone(),
            }),
        };
        match result {
            Ok(meal) => batch.meals.push(meal),
            Err(reason) => {
                debug!(position, %reason, "meal line dropped");
                dropped.push(DroppedLine {
                    kind: LineKind::Meal,
                    position,
                    reason,
                });
            }
        }
    }

    for (position, line) in add.individual_items.iter().enumerate() {
        let result = match line {
            Ok(req) => validate_item(req, catalog),
            Err(m) => Err(DropReason::Malformed {
                detail: m.detail.clone(),
            }),
        };
        match result {
            Ok(item) => batch.items.push(item),
            Err(reason) => {
                debug!(position, %reason, "item line dropped");
                dropped.push(DroppedLine {
                    kind: LineKind::Item,
                    position,
                    reason,
                });
            }
        }
    }

    if batch.is_empty() {
        return Err(Rejection::NoValidItems { dropped });
    }
    Ok(ValidatedMutation::Add(ValidatedAdd { batch, dropped }))
}

fn validate_meal(
    req: &MealRequest,
    catalog: &CatalogSnapshot,
    policy: &PricingPolicy,
) -> Result<MealOrder, DropReason> {
    let def = catalog
        .meal_type(&req.meal_type)
        .ok_or_else(|| DropReason::UnknownMealType {
            meal_type: req.meal_type.clone(),
        })?;
    let quantity = req
        .quantity
        .resolve()
        .map_err(|raw| DropReason::InvalidQuantity { raw })?;

    let mut selections = MealSelections::default();
    for slot in MealSlot::ALL {
        let wanted = slot.category();
        let kept: Vec<RecipeSelection> = req
            .selections
            .slot(slot)
            .iter()
            .filter_map(|s| {
                let recipe = s.recipe_id.and_then(|id| catalog.recipe_in(id, wanted));
                if recipe.is_none() {
                    debug!(meal_type = %def.name, %slot, recipe_id = ?s.recipe_id, "selection filtered");
                }
                recipe
            })
            .map(RecipeSelection::of)
            .collect();

        let required = def.required(slot);
        if kept.len() as u64 != required as u64 {
            return Err(DropReason::IncompleteMealComposition {
                meal_type: def.name.clone(),
                slot,
                required,
                found: kept.len() as u32,
            });
        }
        *selections.slot_mut(slot) = kept;
    }

    let unit_price = meal_unit_price_for(def, &selections, policy).map_err(|e: PricingError| {
        DropReason::Unpriceable {
            detail: e.to_string(),
        }
    })?;
    note_advisory_price("meal", req.price, unit_price);

    Ok(MealOrder {
        meal_type: def.name.clone(),
        quantity,
        unit_price,
        selections,
    })
}

fn validate_item(req: &ItemRequest, catalog: &CatalogSnapshot) -> Result<IndividualItem, DropReason> {
    let recipe = catalog
        .recipe(req.recipe_id)
        .ok_or(DropReason::UnknownRecipe {
            recipe_id: req.recipe_id,
        })?;
    let claimed = req.recipe_type.as_deref().and_then(Category::parse);
    if claimed != Some(recipe.category) {
        return Err(DropReason::CategoryMismatch {
            recipe_id: recipe.id,
            expected: recipe.category,
            found: req.recipe_type.clone(),
        });
    }
    let quantity = req
        .quantity
        .resolve()
        .map_err(|raw| DropReason::InvalidQuantity { raw })?;
    note_advisory_price("item", req.price, recipe.price);
    Ok(IndividualItem::of(recipe, quantity))
}

/// Caller prices never reach the cart; a mismatch is only worth a debug line.
fn note_advisory_price(kind: &'static str, claimed: Option<f64>, catalog: Micros) {
    let Some(claimed) = claimed else { return };
    match Micros::from_dollars(claimed) {
        Ok(m) if m == catalog => {}
        _ => debug!(kind, claimed, catalog = %catalog, "ignoring caller-supplied price"),
    }
}

pub fn validate_remove(rm: &RemoveRequest, cart: &Cart) -> Result<ValidatedMutation, Rejection> {
    if rm.clear_all {
        return Ok(ValidatedMutation::ClearAll);
    }
    if rm.meal_indices.is_empty() && rm.item_indices.is_empty() {
        return Ok(ValidatedMutation::Noop);
    }
    let meal_positions = zero_based(&rm.meal_indices);
    let item_positions = zero_based(&rm.item_indices);
    let plan = RemovalPlan::new(cart, &meal_positions, &item_positions);
    if plan.is_empty() {
        return Err(Rejection::EmptyRemovalResult {
            requested: rm.meal_indices.len() + rm.item_indices.len(),
            meals_in_cart: cart.meals().len(),
            items_in_cart: cart.items().len(),
        });
    }
    Ok(ValidatedMutation::Remove(plan))
}

/// 1-based → 0-based; zero and negatives are discarded.
fn zero_based(indices: &[i64]) -> Vec<usize> {
    indices
        .iter()
        .filter(|&&i| i >= 1)
        .filter_map(|&i| usize::try_from(i - 1).ok())
        .collect()
}
