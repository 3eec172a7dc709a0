use std::fmt;

use serde::{Deserialize, Serialize};

use crate::money::Micros;

/// Catalog identifier of a recipe.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(pub u32);

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Menu category of a recipe.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[serde(alias = "Entree", alias = "ENTREE")]
    Entree,
    #[serde(alias = "Side", alias = "SIDE")]
    Side,
    #[serde(alias = "Drink", alias = "DRINK")]
    Drink,
    #[serde(alias = "Appetizer", alias = "APPETIZER")]
    Appetizer,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Entree,
        Category::Side,
        Category::Drink,
        Category::Appetizer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Entree => "entree",
            Category::Side => "side",
            Category::Drink => "drink",
            Category::Appetizer => "appetizer",
        }
    }

    /// Case-insensitive parse of the wire name. Tolerates a trailing plural
    /// `s` ("entrees", "sides") since agent payloads use both forms.
    pub fn parse(raw: &str) -> Option<Category> {
        let t = raw.trim().to_ascii_lowercase();
        let t = t.strip_suffix('s').unwrap_or(&t);
        Category::ALL.into_iter().find(|c| c.as_str() == t)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the three composition slots of a meal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Entree,
    Side,
    Drink,
}

impl MealSlot {
    pub const ALL: [MealSlot; 3] = [MealSlot::Entree, MealSlot::Side, MealSlot::Drink];

    /// The only recipe category that may fill this slot.
    pub fn category(self) -> Category {
        match self {
            MealSlot::Entree => Category::Entree,
            MealSlot::Side => Category::Side,
            MealSlot::Drink => Category::Drink,
        }
    }

    /// Plural wire key used in request/record payloads.
    pub fn key(self) -> &'static str {
        match self {
            MealSlot::Entree => "entrees",
            MealSlot::Side => "sides",
            MealSlot::Drink => "drinks",
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A named meal bundle: fixed entree/side/drink counts at a base price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealTypeDefinition {
    pub name: String,
    pub entrees: u32,
    pub sides: u32,
    pub drinks: u32,
    pub base_price: Micros,
    pub image: Option<String>,
}

impl MealTypeDefinition {
    pub fn new<S: Into<String>>(
        name: S,
        entrees: u32,
        sides: u32,
        drinks: u32,
        base_price: Micros,
    ) -> Self {
        Self {
            name: name.into(),
            entrees,
            sides,
            drinks,
            base_price,
            image: None,
        }
    }

    pub fn with_image<S: Into<String>>(mut self, image: S) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Exact number of selections required in `slot`.
    pub fn required(&self, slot: MealSlot) -> u32 {
        match slot {
            MealSlot::Entree => self.entrees,
            MealSlot::Side => self.sides,
            MealSlot::Drink => self.drinks,
        }
    }
}

/// An immutable catalog recipe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeItem {
    pub id: RecipeId,
    pub name: String,
    pub category: Category,
    /// Per-serving a-la-carte price.
    pub price: Micros,
    pub premium: bool,
    pub seasonal: bool,
    /// Servings produced by one kitchen cook batch.
    pub batch_yield: u32,
}

impl RecipeItem {
    pub fn new<S: Into<String>>(id: u32, name: S, category: Category, price: Micros) -> Self {
        Self {
            id: RecipeId(id),
            name: name.into(),
            category,
            price,
            premium: false,
            seasonal: false,
            batch_yield: 1,
        }
    }

    pub fn premium(mut self) -> Self {
        self.premium = true;
        self
    }

    pub fn seasonal(mut self) -> Self {
        self.seasonal = true;
        self
    }

    pub fn with_batch_yield(mut self, batch_yield: u32) -> Self {
        self.batch_yield = batch_yield;
        self
    }
}
