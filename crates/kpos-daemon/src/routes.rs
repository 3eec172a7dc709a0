//! Axum router and all HTTP handlers for kpos-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Handlers are `pub(crate)`; the scenario tests in
//! `tests/` compose the router directly.
//!
//! Status mapping for engine outcomes:
//! - `NoValidItems`, `EmptyRemovalResult`, empty checkout: 422
//! - cart capacity exceeded, stale cart at checkout, illegal kitchen
//!   transition: 409
//! - catalog not loaded: 503
//! - unknown order: 404

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use kpos_cart::{validate_session_id, Cart};
use kpos_mutation::{apply_payload, MutationError, Rejection};
use kpos_order::{place_order, CheckoutError, KitchenEvent};
use kpos_pricing::price_cart;
use kpos_readiness::{readiness_report, CookedStock};

use crate::{
    api_types::{
        CartResponse, CatalogReloadResponse, CatalogResponse, ErrorResponse, HealthResponse,
        KitchenEventRequest, MutationResponse, OrderResponse, ReadinessResponse, StockResponse,
        TotalsView,
    },
    state::{session_entry, uptime_secs, AppState, OrderEntry},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/catalog", get(catalog_get))
        .route("/v1/catalog/reload", post(catalog_reload))
        .route("/v1/sessions/:session_id/cart", get(cart_get))
        .route("/v1/sessions/:session_id/mutations", post(cart_mutate))
        .route("/v1/sessions/:session_id/checkout", post(cart_checkout))
        .route("/v1/orders/:order_id", get(order_get))
        .route("/v1/orders/:order_id/status", post(order_status))
        .route("/v1/orders/:order_id/readiness", get(order_readiness))
        .route("/v1/kitchen/stock", put(stock_put))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn refuse(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    refuse_with(status, code, message, None)
}

fn refuse_with(
    status: StatusCode,
    code: &str,
    message: impl Into<String>,
    detail: Option<Value>,
) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: code.to_string(),
            message: message.into(),
            detail,
        }),
    )
        .into_response()
}

fn catalog_unavailable() -> Response {
    refuse(
        StatusCode::SERVICE_UNAVAILABLE,
        "CATALOG_UNAVAILABLE",
        "The menu is temporarily unavailable. Please try again in a moment.",
    )
}

fn bad_session(session_id: &str) -> Response {
    refuse(
        StatusCode::BAD_REQUEST,
        "INVALID_SESSION_ID",
        format!("invalid session id '{session_id}'"),
    )
}

fn store_failure(e: impl std::fmt::Display) -> Response {
    error!(error = %e, "cart store failure");
    refuse(
        StatusCode::INTERNAL_SERVER_ERROR,
        "CART_STORE_FAILED",
        "Your order could not be saved. Please try again.",
    )
}

fn order_not_found(order_id: Uuid) -> Response {
    refuse(
        StatusCode::NOT_FOUND,
        "ORDER_NOT_FOUND",
        format!("no order {order_id}"),
    )
}

/// Cart view with totals priced at the cart's captured unit prices.
fn cart_view(st: &AppState, session_id: &str, cart: &Cart) -> Result<CartResponse, Response> {
    let totals = price_cart(cart, &st.settings.pricing_policy()).map_err(|e| {
        error!(error = %e, "cart pricing failed");
        refuse(
            StatusCode::INTERNAL_SERVER_ERROR,
            "PRICING_FAILED",
            e.to_string(),
        )
    })?;
    Ok(CartResponse {
        session_id: session_id.to_string(),
        lines: cart.numbered_lines(),
        total_quantity: cart.total_quantity(),
        max_items: st.settings.max_items,
        totals: TotalsView::from(&totals),
        cart: cart.clone(),
    })
}

fn to_detail<T: serde::Serialize>(v: &T) -> Option<Value> {
    serde_json::to_value(v).ok()
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let catalog_loaded = st.catalog_snapshot().await.is_some();
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
            uptime_secs: uptime_secs(),
            catalog_loaded,
        }),
    )
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

pub(crate) async fn catalog_get(State(st): State<Arc<AppState>>) -> Response {
    let Some(snap) = st.catalog_snapshot().await else {
        return catalog_unavailable();
    };
    let (meal_types, recipes) = snap.to_records();
    (
        StatusCode::OK,
        Json(CatalogResponse {
            meal_types,
            recipes,
        }),
    )
        .into_response()
}

pub(crate) async fn catalog_reload(State(st): State<Arc<AppState>>) -> Response {
    match st.reload_catalog().await {
        Ok(snap) => (
            StatusCode::OK,
            Json(CatalogReloadResponse {
                meal_types: snap.meal_types().count(),
                recipes: snap.recipes().count(),
            }),
        )
            .into_response(),
        Err(e) => refuse(
            StatusCode::SERVICE_UNAVAILABLE,
            "CATALOG_UNAVAILABLE",
            e.to_string(),
        ),
    }
}

// ---------------------------------------------------------------------------
// Sessions / carts
// ---------------------------------------------------------------------------

pub(crate) async fn cart_get(
    State(st): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Response {
    if validate_session_id(&session_id).is_err() {
        return bad_session(&session_id);
    }
    let mut sessions = st.sessions.lock().await;
    let session = match session_entry(
        &mut sessions,
        st.cart_store.as_ref(),
        &session_id,
        Instant::now(),
    ) {
        Ok(s) => s,
        Err(e) => return store_failure(e),
    };
    match cart_view(&st, &session_id, &session.cart) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(resp) => resp,
    }
}

/// Body is the raw mutation envelope from the ordering agent. It is taken as
/// text so that a non-JSON body is reported as `NO_VALID_ITEMS` like any
/// other unusable request.
pub(crate) async fn cart_mutate(
    State(st): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    body: String,
) -> Response {
    if validate_session_id(&session_id).is_err() {
        return bad_session(&session_id);
    }
    let payload: Value =
        serde_json::from_str(&body).unwrap_or_else(|_| Value::String(body.clone()));

    let catalog = st.catalog_snapshot().await;
    let policy = st.settings.pricing_policy();
    let limits = st.settings.cart_limits();

    let mut sessions = st.sessions.lock().await;
    let session = match session_entry(
        &mut sessions,
        st.cart_store.as_ref(),
        &session_id,
        Instant::now(),
    ) {
        Ok(s) => s,
        Err(e) => return store_failure(e),
    };

    // The live cart only changes once the store has accepted the result.
    let mut next = session.cart.clone();
    let outcome = apply_payload(&payload, catalog.as_deref(), &mut next, &policy, &limits);
    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            let message = e.user_message();
            return match e {
                MutationError::Rejected(r @ Rejection::NoValidItems { .. }) => refuse_with(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "NO_VALID_ITEMS",
                    message,
                    to_detail(&r),
                ),
                MutationError::Rejected(r @ Rejection::EmptyRemovalResult { .. }) => refuse_with(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "EMPTY_REMOVAL_RESULT",
                    message,
                    to_detail(&r),
                ),
                MutationError::Rejected(Rejection::CatalogUnavailable { .. }) => {
                    catalog_unavailable()
                }
                MutationError::Capacity { exceeded, .. } => refuse_with(
                    StatusCode::CONFLICT,
                    "CART_CAPACITY_EXCEEDED",
                    message,
                    to_detail(&exceeded),
                ),
            };
        }
    };

    if report.changed() {
        if let Err(e) = st.cart_store.save(&session_id, &next) {
            return store_failure(e);
        }
        session.cart = next;
    }
    info!(
        session_id = %session_id,
        kind = ?report.kind,
        total_quantity = report.total_quantity,
        "cart mutation applied"
    );

    match cart_view(&st, &session_id, &session.cart) {
        Ok(cart) => (StatusCode::OK, Json(MutationResponse { report, cart })).into_response(),
        Err(resp) => resp,
    }
}

pub(crate) async fn cart_checkout(
    State(st): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Response {
    if validate_session_id(&session_id).is_err() {
        return bad_session(&session_id);
    }
    let Some(catalog) = st.catalog_snapshot().await else {
        return catalog_unavailable();
    };

    let mut sessions = st.sessions.lock().await;
    let session = match session_entry(
        &mut sessions,
        st.cart_store.as_ref(),
        &session_id,
        Instant::now(),
    ) {
        Ok(s) => s,
        Err(e) => return store_failure(e),
    };

    let order = match place_order(
        &session.cart,
        &catalog,
        &st.settings.pricing_policy(),
        Utc::now(),
        Uuid::new_v4(),
    ) {
        Ok(order) => order,
        Err(CheckoutError::EmptyCart) => {
            return refuse(
                StatusCode::UNPROCESSABLE_ENTITY,
                "EMPTY_CART",
                "Your order is empty.",
            )
        }
        Err(CheckoutError::StaleLines(stale)) => {
            warn!(session_id = %session_id, stale = stale.len(), "checkout refused");
            return refuse_with(
                StatusCode::CONFLICT,
                "STALE_CART",
                "Some items in your order are no longer on the menu. Please review your order.",
                to_detail(&stale),
            );
        }
        Err(CheckoutError::Pricing(e)) => {
            error!(error = %e, "checkout pricing failed");
            return refuse(
                StatusCode::INTERNAL_SERVER_ERROR,
                "PRICING_FAILED",
                e.to_string(),
            );
        }
    };

    // No order is recorded unless the stored cart is emptied with it.
    if let Err(e) = st.cart_store.save(&session_id, &Cart::new()) {
        return store_failure(e);
    }
    session.cart.clear();
    drop(sessions);

    let view = OrderResponse::from(&order);
    st.orders
        .write()
        .await
        .insert(order.id(), OrderEntry::new(order));
    (StatusCode::CREATED, Json(view)).into_response()
}

// ---------------------------------------------------------------------------
// Orders / kitchen
// ---------------------------------------------------------------------------

pub(crate) async fn order_get(
    State(st): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Response {
    match st.orders.read().await.get(&order_id) {
        Some(entry) => (StatusCode::OK, Json(OrderResponse::from(&entry.order))).into_response(),
        None => order_not_found(order_id),
    }
}

pub(crate) async fn order_status(
    State(st): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<KitchenEventRequest>,
) -> Response {
    let Some(event) = KitchenEvent::parse(&req.event) else {
        return refuse(
            StatusCode::UNPROCESSABLE_ENTITY,
            "UNKNOWN_EVENT",
            format!("unknown kitchen event '{}'", req.event),
        );
    };

    let mut orders = st.orders.write().await;
    let Some(entry) = orders.get_mut(&order_id) else {
        return order_not_found(order_id);
    };
    match entry.order.apply(event) {
        Ok(_) => {
            entry.note_status(Instant::now());
            (StatusCode::OK, Json(OrderResponse::from(&entry.order))).into_response()
        }
        Err(e) => refuse(StatusCode::CONFLICT, "ILLEGAL_TRANSITION", e.to_string()),
    }
}

pub(crate) async fn order_readiness(
    State(st): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Response {
    let catalog = st.catalog_snapshot().await;
    let orders = st.orders.read().await;
    let Some(entry) = orders.get(&order_id) else {
        return order_not_found(order_id);
    };
    let stock = st.stock.read().await;
    let report = readiness_report(entry.order.contents(), &stock, catalog.as_deref());
    (
        StatusCode::OK,
        Json(ReadinessResponse { order_id, report }),
    )
        .into_response()
}

/// Replace the whole cooked-stock snapshot. Body: `{ "<recipeId>": servings }`.
pub(crate) async fn stock_put(
    State(st): State<Arc<AppState>>,
    Json(stock): Json<CookedStock>,
) -> impl IntoResponse {
    let recipes = stock.len();
    *st.stock.write().await = stock;
    info!(recipes, "cooked stock replaced");
    (StatusCode::OK, Json(StockResponse { recipes }))
}
