//! Request and response types for all kpos-daemon HTTP endpoints.
//!
//! Money goes over the wire as dollar strings with two decimals ("8.30");
//! the engine's `Micros` never leave the process as raw integers here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kpos_cart::Cart;
use kpos_catalog::{MealTypeRecord, RecipeRecord};
use kpos_mutation::MutationReport;
use kpos_order::{KitchenStatus, Order};
use kpos_pricing::CartTotals;
use kpos_readiness::ReadinessReport;

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
    pub uptime_secs: u64,
    pub catalog_loaded: bool,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine code, e.g. `NO_VALID_ITEMS`.
    pub error: String,
    /// Sentence suitable for showing to the customer.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// /v1/catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    pub meal_types: Vec<MealTypeRecord>,
    pub recipes: Vec<RecipeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogReloadResponse {
    pub meal_types: usize,
    pub recipes: usize,
}

// ---------------------------------------------------------------------------
// Carts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsView {
    pub subtotal: String,
    pub tax: String,
    pub total: String,
}

impl From<&CartTotals> for TotalsView {
    fn from(t: &CartTotals) -> Self {
        Self {
            subtotal: t.subtotal.to_string(),
            tax: t.tax.to_string(),
            total: t.total.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartResponse {
    pub session_id: String,
    /// 1-based listing, numbered the way remove requests address lines.
    pub lines: Vec<String>,
    pub total_quantity: u64,
    pub max_items: u32,
    pub totals: TotalsView,
    pub cart: Cart,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse {
    pub report: MutationReport,
    pub cart: CartResponse,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: Uuid,
    pub placed_at: DateTime<Utc>,
    pub status: KitchenStatus,
    pub completed: bool,
    pub lines: Vec<String>,
    pub totals: TotalsView,
    pub contents: Cart,
}

impl From<&Order> for OrderResponse {
    fn from(o: &Order) -> Self {
        Self {
            order_id: o.id(),
            placed_at: o.placed_at(),
            status: o.status(),
            completed: o.completed(),
            lines: o.contents().numbered_lines(),
            totals: TotalsView::from(o.totals()),
            contents: o.contents().clone(),
        }
    }
}

/// `POST /v1/orders/{id}/status` body: `{ "event": "start" }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitchenEventRequest {
    pub event: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockResponse {
    pub recipes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub order_id: Uuid,
    #[serde(flatten)]
    pub report: ReadinessReport,
}
