//! Reference menu shared by tests across the workspace.

use crate::{CatalogSnapshot, Category, MealTypeDefinition, Micros, RecipeId, RecipeItem};

pub const BOWL: &str = "Bowl";
pub const PLATE: &str = "Plate";
pub const BIGGER_PLATE: &str = "Bigger Plate";
pub const COMBO: &str = "Combo";

pub const ORANGE_CHICKEN: RecipeId = RecipeId(1);
pub const HONEY_WALNUT_SHRIMP: RecipeId = RecipeId(2);
pub const BROCCOLI_BEEF: RecipeId = RecipeId(3);
pub const CHOW_MEIN: RecipeId = RecipeId(4);
pub const FRIED_RICE: RecipeId = RecipeId(5);
pub const FOUNTAIN_DRINK: RecipeId = RecipeId(6);
pub const RANGOON: RecipeId = RecipeId(7);
pub const PEPPER_STEAK: RecipeId = RecipeId(8);
pub const SUPER_GREENS: RecipeId = RecipeId(9);

pub fn meal_types() -> Vec<MealTypeDefinition> {
    vec![
        MealTypeDefinition::new(BOWL, 1, 1, 0, Micros::from_cents(830)).with_image("bowl.png"),
        MealTypeDefinition::new(PLATE, 2, 1, 0, Micros::from_cents(980)),
        MealTypeDefinition::new(BIGGER_PLATE, 3, 1, 0, Micros::from_cents(1_130)),
        MealTypeDefinition::new(COMBO, 1, 1, 1, Micros::from_cents(1_050)),
    ]
}

pub fn recipes() -> Vec<RecipeItem> {
    vec![
        RecipeItem::new(1, "Orange Chicken", Category::Entree, Micros::from_cents(520))
            .with_batch_yield(8),
        RecipeItem::new(2, "Honey Walnut Shrimp", Category::Entree, Micros::from_cents(670))
            .premium()
            .with_batch_yield(6),
        RecipeItem::new(3, "Broccoli Beef", Category::Entree, Micros::from_cents(520))
            .with_batch_yield(8),
        RecipeItem::new(4, "Chow Mein", Category::Side, Micros::from_cents(440))
            .with_batch_yield(10),
        RecipeItem::new(5, "Fried Rice", Category::Side, Micros::from_cents(440))
            .with_batch_yield(10),
        RecipeItem::new(6, "Fountain Drink", Category::Drink, Micros::from_cents(210))
            .with_batch_yield(20),
        RecipeItem::new(7, "Cream Cheese Rangoon", Category::Appetizer, Micros::from_cents(200))
            .with_batch_yield(12),
        RecipeItem::new(8, "Black Pepper Sirloin Steak", Category::Entree, Micros::from_cents(670))
            .premium()
            .seasonal()
            .with_batch_yield(6),
        RecipeItem::new(9, "Super Greens", Category::Side, Micros::from_cents(440))
            .with_batch_yield(0),
    ]
}

/// The reference snapshot. Construction cannot fail for this fixed data.
pub fn snapshot() -> CatalogSnapshot {
    match CatalogSnapshot::from_parts(meal_types(), recipes()) {
        Ok(s) => s,
        Err(e) => panic!("fixture catalog is invalid: {e}"),
    }
}
