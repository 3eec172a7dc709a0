//! kpos-readiness
//!
//! Fulfillment readiness for placed orders.
//!
//! Goals:
//! - Aggregate per-recipe servings an order needs (meal selections count
//!   once per meal quantity, a-la-carte items once per item quantity)
//! - `is_ready`: short-circuit boolean against cooked stock
//! - `shortfalls`: every recipe that is short, with amounts
//! - `cook_plan`: shortfalls expressed as kitchen batches
//!
//! Read-only. Stock is a point-in-time copy owned by the kitchen; nothing
//! here reserves or decrements it.

mod engine;
mod types;

pub use engine::{aggregate_requirements, cook_plan, is_ready, readiness_report, shortfalls};
pub use types::*;
