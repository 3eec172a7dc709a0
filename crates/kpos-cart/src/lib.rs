//! kpos-cart
//!
//! Cart model and the cart mutation executor.
//! - `Cart`: ordered meal lines + ordered a-la-carte lines
//! - `apply_add`: hard item ceiling, per-line reject, never truncate
//! - `apply_removal`: positions normalized once, removed back-to-front
//! - `CartStore`: session-keyed persistence (memory or JSON files)
//!
//! The executor trusts its input: lines reaching it have already been
//! validated and priced against a catalog snapshot.

mod executor;
mod persist;
mod types;

pub use executor::{
    apply_add, apply_removal, AddBatch, AddOutcome, CapacityExceeded, CapacityRejection,
    CartLimits, RemovalPlan, RemoveOutcome,
};
pub use persist::{validate_session_id, CartStore, JsonFileCartStore, MemoryCartStore, PersistError};
pub use types::{Cart, IndividualItem, LineKind, MealOrder, MealSelections, RecipeSelection};
