use serde::{Deserialize, Serialize};

use kpos_catalog::{Category, MealSlot, Micros, RecipeId, RecipeItem};

/// A recipe as it was when the customer picked it.
///
/// Name and premium flag are copied, not referenced, so a later catalog
/// change cannot silently alter a meal already in the cart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSelection {
    pub recipe_id: RecipeId,
    pub name: String,
    pub premium: bool,
}

impl RecipeSelection {
    pub fn of(item: &RecipeItem) -> Self {
        Self {
            recipe_id: item.id,
            name: item.name.clone(),
            premium: item.premium,
        }
    }
}

/// Entree/side/drink picks of one meal. Sizes equal the meal type's
/// required counts; they are fixed when the meal is validated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealSelections {
    pub entrees: Vec<RecipeSelection>,
    pub sides: Vec<RecipeSelection>,
    pub drinks: Vec<RecipeSelection>,
}

impl MealSelections {
    pub fn slot(&self, slot: MealSlot) -> &[RecipeSelection] {
        match slot {
            MealSlot::Entree => &self.entrees,
            MealSlot::Side => &self.sides,
            MealSlot::Drink => &self.drinks,
        }
    }

    pub fn slot_mut(&mut self, slot: MealSlot) -> &mut Vec<RecipeSelection> {
        match slot {
            MealSlot::Entree => &mut self.entrees,
            MealSlot::Side => &mut self.sides,
            MealSlot::Drink => &mut self.drinks,
        }
    }

    /// All selections, entrees first, then sides, then drinks.
    pub fn iter(&self) -> impl Iterator<Item = &RecipeSelection> {
        self.entrees
            .iter()
            .chain(self.sides.iter())
            .chain(self.drinks.iter())
    }

    /// Premium picks across all three slots.
    pub fn premium_count(&self) -> u32 {
        self.iter().filter(|s| s.premium).count() as u32
    }
}

/// One meal line in the cart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealOrder {
    pub meal_type: String,
    pub quantity: u32,
    /// Catalog base price plus premium upcharge, per meal.
    pub unit_price: Micros,
    pub selections: MealSelections,
}

/// One a-la-carte line in the cart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualItem {
    pub recipe_id: RecipeId,
    pub name: String,
    pub category: Category,
    pub quantity: u32,
    /// Catalog per-serving price.
    pub unit_price: Micros,
}

impl IndividualItem {
    pub fn of(item: &RecipeItem, quantity: u32) -> Self {
        Self {
            recipe_id: item.id,
            name: item.name.clone(),
            category: item.category,
            quantity,
            unit_price: item.price,
        }
    }
}

/// Which sub-list of the cart a line lives in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Meal,
    Item,
}

impl std::fmt::Display for LineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineKind::Meal => f.write_str("meal"),
            LineKind::Item => f.write_str("item"),
        }
    }
}

/// A customer's in-progress order.
///
/// Owned by the session context and passed by `&mut` to the executor;
/// there is no global cart. Both lists keep insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub(crate) meals: Vec<MealOrder>,
    pub(crate) items: Vec<IndividualItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meals(&self) -> &[MealOrder] {
        &self.meals
    }

    pub fn items(&self) -> &[IndividualItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.meals.is_empty() && self.items.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.meals.len() + self.items.len()
    }

    /// Sum of all line quantities (what the item ceiling is measured in).
    pub fn total_quantity(&self) -> u64 {
        let meals: u64 = self.meals.iter().map(|m| m.quantity as u64).sum();
        let items: u64 = self.items.iter().map(|i| i.quantity as u64).sum();
        meals + items
    }

    /// Remaining room under `max_items`.
    pub fn headroom(&self, max_items: u32) -> u64 {
        (max_items as u64).saturating_sub(self.total_quantity())
    }

    /// Human-readable listing whose numbers are exactly the 1-based indices
    /// a remove request uses, e.g. `meal 2: Plate x1 (...)`.
    pub fn numbered_lines(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.line_count());
        for (i, m) in self.meals.iter().enumerate() {
            let picks: Vec<&str> = m.selections.iter().map(|s| s.name.as_str()).collect();
            out.push(format!(
                "meal {}: {} x{} ({}) @ {}",
                i + 1,
                m.meal_type,
                m.quantity,
                picks.join(", "),
                m.unit_price
            ));
        }
        for (i, it) in self.items.iter().enumerate() {
            out.push(format!(
                "item {}: {} x{} @ {}",
                i + 1,
                it.name,
                it.quantity,
                it.unit_price
            ));
        }
        out
    }

    /// Drop everything. Idempotent.
    pub fn clear(&mut self) -> usize {
        let n = self.line_count();
        self.meals.clear();
        self.items.clear();
        n
    }

    /// Rebuild a cart from lines that already passed validation (repricing,
    /// rehydration). The item ceiling is not re-checked here.
    pub fn from_lines(meals: Vec<MealOrder>, items: Vec<IndividualItem>) -> Self {
        Self { meals, items }
    }

    pub fn len_of(&self, kind: LineKind) -> usize {
        match kind {
            LineKind::Meal => self.meals.len(),
            LineKind::Item => self.items.len(),
        }
    }
}
