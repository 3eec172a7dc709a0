//! kpos-catalog
//!
//! Menu catalog snapshot for the kiosk order engine.
//! - `Micros` fixed-point money (the only money type in the workspace)
//! - Meal-type definitions and recipe items
//! - Immutable, request-scoped `CatalogSnapshot`
//! - `CatalogSource` boundary to the external catalog service
//!
//! Deterministic lookups, no mutation. IO only inside `JsonFileCatalogSource`.

mod money;
mod records;
mod snapshot;
mod source;
mod types;

#[cfg(any(test, feature = "testkit"))]
pub mod fixtures;

pub use money::{round_half_away, Micros, MoneyError, MICROS_PER_CENT, MICROS_PER_DOLLAR};
pub use records::{MealTypeRecord, RecipeRecord};
pub use snapshot::CatalogSnapshot;
pub use source::{CatalogFile, CatalogSource, JsonFileCatalogSource, StaticCatalogSource};
pub use types::{Category, MealSlot, MealTypeDefinition, RecipeId, RecipeItem};

/// Errors building or fetching a catalog snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogError {
    /// A fetch from the catalog service failed or returned garbage.
    /// Validation must not proceed against a partial catalog.
    Unavailable { what: &'static str, detail: String },
    DuplicateMealType(String),
    DuplicateRecipe(RecipeId),
    /// A record could not be converted (bad category, non-finite price, …).
    InvalidRecord { what: String, detail: String },
}

impl CatalogError {
    pub(crate) fn unavailable(what: &'static str, cause: CatalogError) -> Self {
        match cause {
            CatalogError::Unavailable { detail, .. } => CatalogError::Unavailable { what, detail },
            other => CatalogError::Unavailable {
                what,
                detail: other.to_string(),
            },
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, CatalogError::Unavailable { .. })
    }
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Unavailable { what, detail } => {
                write!(f, "catalog unavailable ({what}): {detail}")
            }
            CatalogError::DuplicateMealType(name) => write!(f, "duplicate meal type '{name}'"),
            CatalogError::DuplicateRecipe(id) => write!(f, "duplicate recipe id {id}"),
            CatalogError::InvalidRecord { what, detail } => {
                write!(f, "invalid catalog record ({what}): {detail}")
            }
        }
    }
}

impl std::error::Error for CatalogError {}
