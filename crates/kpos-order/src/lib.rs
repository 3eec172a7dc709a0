//! kpos-order
//!
//! Checkout and the kitchen lifecycle.
//! - `place_order`: reprice against the live catalog, freeze, total
//! - `checkout`: `place_order` + clear the session cart
//! - `KitchenStatus` state machine with explicit `TransitionError`
//!
//! The caller supplies `now` and the order id; nothing here reads a clock
//! or generates randomness.

mod kitchen;
mod order;

pub use kitchen::{transition, KitchenEvent, KitchenStatus, TransitionError};
pub use order::{checkout, place_order, CheckoutError, Order};
