use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use kpos_cart::Cart;
use kpos_catalog::{CatalogSnapshot, Micros};
use kpos_pricing::{price_cart, reprice_cart, CartTotals, PricingError, PricingPolicy, StaleLine};

use crate::kitchen::{transition, KitchenEvent, KitchenStatus, TransitionError};

/// A placed order. Contents and money are frozen at checkout; only the
/// kitchen status moves afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: Uuid,
    placed_at: DateTime<Utc>,
    contents: Cart,
    totals: CartTotals,
    status: KitchenStatus,
}

impl Order {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }

    pub fn contents(&self) -> &Cart {
        &self.contents
    }

    pub fn totals(&self) -> &CartTotals {
        &self.totals
    }

    pub fn subtotal(&self) -> Micros {
        self.totals.subtotal
    }

    pub fn tax(&self) -> Micros {
        self.totals.tax
    }

    pub fn total(&self) -> Micros {
        self.totals.total
    }

    pub fn status(&self) -> KitchenStatus {
        self.status
    }

    pub fn completed(&self) -> bool {
        self.status == KitchenStatus::Completed
    }

    /// Advance the kitchen lifecycle. The order is unchanged on error.
    pub fn apply(&mut self, event: KitchenEvent) -> Result<KitchenStatus, TransitionError> {
        let next = transition(self.status, event)?;
        if next != self.status {
            info!(order_id = %self.id, from = %self.status, to = %next, "kitchen status changed");
        }
        self.status = next;
        Ok(next)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutError {
    EmptyCart,
    /// Some lines no longer resolve against the current catalog; the
    /// customer must review the cart before paying.
    StaleLines(Vec<StaleLine>),
    Pricing(PricingError),
}

impl std::fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckoutError::EmptyCart => write!(f, "cannot check out an empty cart"),
            CheckoutError::StaleLines(lines) => write!(
                f,
                "{} cart line(s) no longer match the menu",
                lines.len()
            ),
            CheckoutError::Pricing(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CheckoutError {}

impl From<PricingError> for CheckoutError {
    fn from(e: PricingError) -> Self {
        CheckoutError::Pricing(e)
    }
}

/// Freeze `cart` into an [`Order`], repricing every line against `catalog`
/// first. The cart itself is not touched.
pub fn place_order(
    cart: &Cart,
    catalog: &CatalogSnapshot,
    policy: &PricingPolicy,
    now: DateTime<Utc>,
    order_id: Uuid,
) -> Result<Order, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    let report = reprice_cart(cart, catalog, policy)?;
    if !report.is_clean() {
        warn!(stale = report.stale.len(), "checkout blocked by stale cart lines");
        return Err(CheckoutError::StaleLines(report.stale));
    }
    let totals = price_cart(&report.cart, policy)?;
    info!(
        %order_id,
        lines = report.cart.line_count(),
        total = %totals.total,
        "order placed"
    );
    Ok(Order {
        id: order_id,
        placed_at: now,
        contents: report.cart,
        totals,
        status: KitchenStatus::Placed,
    })
}

/// [`place_order`], then clear the session cart on success.
pub fn checkout(
    cart: &mut Cart,
    catalog: &CatalogSnapshot,
    policy: &PricingPolicy,
    now: DateTime<Utc>,
    order_id: Uuid,
) -> Result<Order, CheckoutError> {
    let order = place_order(cart, catalog, policy, now, order_id)?;
    cart.clear();
    Ok(order)
}
