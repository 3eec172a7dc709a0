//! kpos-pricing
//!
//! Pricing engine for kiosk carts.
//!
//! Goals:
//! - Meal unit price = base + premium selections × upcharge
//! - Line totals unrounded; subtotal is their exact sum
//! - Tax and total rounded once to cents, half-up
//! - Repricing against the current catalog before checkout
//!
//! Deterministic, pure logic. Same cart + same catalog + same policy gives
//! the same totals.

mod engine;
mod reprice;
mod types;

pub use engine::{line_total, meal_unit_price, meal_unit_price_for, price_cart, tax_on};
pub use reprice::{reprice_cart, RepriceReport, StaleLine, StaleReason};
pub use types::*;
