//! Wire records as served by the external catalog service.
//!
//! Prices arrive as `f64` dollars; conversion into [`Micros`] happens here
//! and nowhere else.

use serde::{Deserialize, Serialize};

use crate::money::Micros;
use crate::types::{Category, MealTypeDefinition, RecipeId, RecipeItem};
use crate::CatalogError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealTypeRecord {
    pub name: String,
    #[serde(alias = "entrees", alias = "entree_count")]
    pub entree_count: u32,
    #[serde(alias = "sides", alias = "side_count")]
    pub side_count: u32,
    #[serde(default, alias = "drinks", alias = "drink_count")]
    pub drink_count: u32,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRecord {
    pub id: u32,
    pub name: String,
    #[serde(alias = "category", alias = "recipe_type", alias = "type")]
    pub recipe_type: String,
    pub price: f64,
    #[serde(default)]
    pub premium: bool,
    #[serde(default)]
    pub seasonal: bool,
    #[serde(default = "default_yield", alias = "yield", alias = "batch_yield")]
    pub batch_yield: u32,
}

fn default_yield() -> u32 {
    1
}

fn wire_price(what: String, dollars: f64) -> Result<Micros, CatalogError> {
    let price = Micros::from_dollars(dollars).map_err(|e| CatalogError::InvalidRecord {
        what: what.clone(),
        detail: format!("price: {e}"),
    })?;
    if price.is_negative() {
        return Err(CatalogError::InvalidRecord {
            what,
            detail: format!("negative price {dollars}"),
        });
    }
    Ok(price)
}

impl TryFrom<MealTypeRecord> for MealTypeDefinition {
    type Error = CatalogError;

    fn try_from(r: MealTypeRecord) -> Result<Self, Self::Error> {
        let name = r.name.trim().to_string();
        if name.is_empty() {
            return Err(CatalogError::InvalidRecord {
                what: "meal type".to_string(),
                detail: "empty name".to_string(),
            });
        }
        let base_price = wire_price(format!("meal type '{name}'"), r.price)?;
        Ok(MealTypeDefinition {
            name,
            entrees: r.entree_count,
            sides: r.side_count,
            drinks: r.drink_count,
            base_price,
            image: r.image,
        })
    }
}

impl TryFrom<RecipeRecord> for RecipeItem {
    type Error = CatalogError;

    fn try_from(r: RecipeRecord) -> Result<Self, Self::Error> {
        let category = Category::parse(&r.recipe_type).ok_or_else(|| CatalogError::InvalidRecord {
            what: format!("recipe {}", r.id),
            detail: format!("unknown category '{}'", r.recipe_type),
        })?;
        let price = wire_price(format!("recipe {}", r.id), r.price)?;
        Ok(RecipeItem {
            id: RecipeId(r.id),
            name: r.name,
            category,
            price,
            premium: r.premium,
            seasonal: r.seasonal,
            batch_yield: r.batch_yield,
        })
    }
}

impl From<&MealTypeDefinition> for MealTypeRecord {
    fn from(d: &MealTypeDefinition) -> Self {
        Self {
            name: d.name.clone(),
            entree_count: d.entrees,
            side_count: d.sides,
            drink_count: d.drinks,
            price: d.base_price.to_dollars(),
            image: d.image.clone(),
        }
    }
}

impl From<&RecipeItem> for RecipeRecord {
    fn from(r: &RecipeItem) -> Self {
        Self {
            id: r.id.0,
            name: r.name.clone(),
            recipe_type: r.category.as_str().to_string(),
            price: r.price.to_dollars(),
            premium: r.premium,
            seasonal: r.seasonal,
            batch_yield: r.batch_yield,
        }
    }
}
