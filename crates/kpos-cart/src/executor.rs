//! Cart mutation executor.
//!
//! Applies already-validated batches to a [`Cart`]. Two rules live here:
//!
//! 1. **Hard ceiling.** A line is appended only if the running total
//!    (cart + lines already queued in this batch) stays within
//!    `max_items`. Lines are never truncated to fit.
//! 2. **Back-to-front removal.** Removal positions are snapshotted against
//!    the cart as it was when the request arrived, deduplicated and sorted
//!    descending, so removing one position never shifts another still
//!    waiting in the same batch.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::types::{Cart, IndividualItem, LineKind, MealOrder};

/// Item-count ceiling configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLimits {
    pub max_items: u32,
}

impl CartLimits {
    pub const DEFAULT_MAX_ITEMS: u32 = 20;

    pub fn new(max_items: u32) -> Self {
        Self { max_items }
    }
}

impl Default for CartLimits {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ITEMS)
    }
}

// ---------------------------------------------------------------------------
// Add
// ---------------------------------------------------------------------------

/// Catalog-true lines ready to append, in request order (meals first).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddBatch {
    pub meals: Vec<MealOrder>,
    pub items: Vec<IndividualItem>,
}

impl AddBatch {
    pub fn is_empty(&self) -> bool {
        self.meals.is_empty() && self.items.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.meals.len() + self.items.len()
    }
}

/// A line the ceiling refused.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityRejection {
    pub kind: LineKind,
    /// 0-based position within its sub-list of the batch.
    pub position: usize,
    pub quantity: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOutcome {
    pub meals_added: usize,
    pub items_added: usize,
    pub capacity_rejected: Vec<CapacityRejection>,
    /// Cart total quantity after the batch.
    pub total_quantity: u64,
    pub limit: u32,
}

impl AddOutcome {
    pub fn lines_added(&self) -> usize {
        self.meals_added + self.items_added
    }
}

/// Every line of a non-empty batch was refused by the ceiling; the cart is
/// unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityExceeded {
    pub limit: u32,
    pub current: u64,
    pub rejected_lines: usize,
}

impl std::fmt::Display for CapacityExceeded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cart capacity exceeded: {} of {} items in cart, {} line(s) rejected",
            self.current, self.limit, self.rejected_lines
        )
    }
}

impl std::error::Error for CapacityExceeded {}

/// Append `batch` to `cart` under the ceiling.
///
/// Every line that fits is appended. When no line fits the cart is left
/// untouched and [`CapacityExceeded`] is returned.
pub fn apply_add(
    cart: &mut Cart,
    batch: AddBatch,
    limits: &CartLimits,
) -> Result<AddOutcome, CapacityExceeded> {
    let max = limits.max_items as u64;
    let current = cart.total_quantity();
    let mut running = current;
    let mut rejected = Vec::new();

    let mut queued_meals = Vec::with_capacity(batch.meals.len());
    for (position, meal) in batch.meals.into_iter().enumerate() {
        let q = meal.quantity as u64;
        if running + q <= max {
            running += q;
            queued_meals.push(meal);
        } else {
            rejected.push(CapacityRejection {
                kind: LineKind::Meal,
                position,
                quantity: meal.quantity,
            });
        }
    }

    let mut queued_items = Vec::with_capacity(batch.items.len());
    for (position, item) in batch.items.into_iter().enumerate() {
        let q = item.quantity as u64;
        if running + q <= max {
            running += q;
            queued_items.push(item);
        } else {
            rejected.push(CapacityRejection {
                kind: LineKind::Item,
                position,
                quantity: item.quantity,
            });
        }
    }

    if queued_meals.is_empty() && queued_items.is_empty() && !rejected.is_empty() {
        warn!(
            limit = limits.max_items,
            current,
            rejected = rejected.len(),
            "add refused: cart at capacity"
        );
        return Err(CapacityExceeded {
            limit: limits.max_items,
            current,
            rejected_lines: rejected.len(),
        });
    }

    let outcome = AddOutcome {
        meals_added: queued_meals.len(),
        items_added: queued_items.len(),
        capacity_rejected: rejected,
        total_quantity: running,
        limit: limits.max_items,
    };

    cart.meals.extend(queued_meals);
    cart.items.extend(queued_items);

    if !outcome.capacity_rejected.is_empty() {
        warn!(
            rejected = outcome.capacity_rejected.len(),
            limit = limits.max_items,
            "some lines refused by cart ceiling"
        );
    }
    info!(
        meals = outcome.meals_added,
        items = outcome.items_added,
        total_quantity = outcome.total_quantity,
        "cart add applied"
    );
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Remove
// ---------------------------------------------------------------------------

/// Positions to remove, normalized against one cart snapshot.
///
/// Invariant (enforced by [`RemovalPlan::new`]): each list is 0-based,
/// in bounds for the cart it was built from, unique, and sorted descending.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalPlan {
    meal_positions: Vec<usize>,
    item_positions: Vec<usize>,
}

impl RemovalPlan {
    /// Normalize 0-based positions against `cart`: out-of-range positions
    /// are dropped, duplicates collapsed, order made descending.
    pub fn new(cart: &Cart, meal_positions: &[usize], item_positions: &[usize]) -> Self {
        Self {
            meal_positions: normalize(meal_positions, cart.meals.len()),
            item_positions: normalize(item_positions, cart.items.len()),
        }
    }

    pub fn meal_positions(&self) -> &[usize] {
        &self.meal_positions
    }

    pub fn item_positions(&self) -> &[usize] {
        &self.item_positions
    }

    pub fn is_empty(&self) -> bool {
        self.meal_positions.is_empty() && self.item_positions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.meal_positions.len() + self.item_positions.len()
    }
}

fn normalize(positions: &[usize], len: usize) -> Vec<usize> {
    let mut v: Vec<usize> = positions.iter().copied().filter(|&p| p < len).collect();
    v.sort_unstable_by(|a, b| b.cmp(a));
    v.dedup();
    v
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveOutcome {
    pub removed_meals: Vec<MealOrder>,
    pub removed_items: Vec<IndividualItem>,
}

impl RemoveOutcome {
    pub fn lines_removed(&self) -> usize {
        self.removed_meals.len() + self.removed_items.len()
    }
}

/// Remove the planned positions back-to-front. Meal and item lists are
/// independent; each position list only addresses its own list.
///
/// Removed lines are returned in their original cart order.
pub fn apply_removal(cart: &mut Cart, plan: &RemovalPlan) -> RemoveOutcome {
    let mut removed_meals = Vec::with_capacity(plan.meal_positions.len());
    for &p in &plan.meal_positions {
        if p < cart.meals.len() {
            removed_meals.push(cart.meals.remove(p));
        }
    }
    removed_meals.reverse();

    let mut removed_items = Vec::with_capacity(plan.item_positions.len());
    for &p in &plan.item_positions {
        if p < cart.items.len() {
            removed_items.push(cart.items.remove(p));
        }
    }
    removed_items.reverse();

    info!(
        meals = removed_meals.len(),
        items = removed_items.len(),
        "cart removal applied"
    );
    RemoveOutcome {
        removed_meals,
        removed_items,
    }
}
