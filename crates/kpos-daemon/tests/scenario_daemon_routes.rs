//! In-process scenario tests for kpos-daemon HTTP endpoints.
//!
//! The router is driven via `tower::ServiceExt::oneshot` without binding a
//! socket. State is backed by the fixture menu and an in-memory cart store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use kpos_cart::{CartStore, MemoryCartStore};
use kpos_catalog::{fixtures, StaticCatalogSource};
use kpos_config::EngineSettings;
use kpos_daemon::{routes, state::AppState};
use serde_json::{json, Value};
use tower::ServiceExt; // oneshot

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fixture_source() -> Arc<StaticCatalogSource> {
    let (meals, recipes) = fixtures::snapshot().to_records();
    Arc::new(StaticCatalogSource::new(meals, recipes))
}

/// State with the fixture catalog already loaded.
async fn loaded_state(settings: EngineSettings, store: Arc<MemoryCartStore>) -> Arc<AppState> {
    let st = Arc::new(AppState::new(settings, fixture_source(), store));
    st.reload_catalog().await.expect("fixture catalog loads");
    st
}

async fn call(st: &Arc<AppState>, req: Request<Body>) -> (StatusCode, Value) {
    let router = routes::build_router(Arc::clone(st));
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("body is not valid JSON")
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn send(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn two_bowls_and_rangoon() -> Value {
    json!({
        "meals": [{
            "mealType": "Bowl",
            "quantity": 2,
            "price": 99.0,
            "selections": {
                "entrees": [{ "recipeId": 1, "recipeName": "Orange Chicken" }],
                "sides": [{ "recipeId": 4, "recipeName": "Chow Mein" }]
            }
        }],
        "individualItems": [{
            "recipeId": 7,
            "recipeName": "Cream Cheese Rangoon",
            "recipeType": "Appetizer",
            "quantity": 1,
            "price": 0.5
        }]
    })
}

// ---------------------------------------------------------------------------
// Health / catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_catalog_state() {
    let st = Arc::new(AppState::new(
        EngineSettings::default(),
        fixture_source(),
        Arc::new(MemoryCartStore::new()),
    ));
    let (status, json) = call(&st, get("/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "kpos-daemon");
    assert_eq!(json["catalog_loaded"], false);

    let (status, _) = call(&st, get("/v1/catalog")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, json) = call(&st, send("POST", "/v1/catalog/reload", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["meal_types"], 4);
    assert_eq!(json["recipes"], 9);

    let (status, json) = call(&st, get("/v1/catalog")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["mealTypes"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn add_without_catalog_is_503_but_clear_still_works() {
    let st = Arc::new(AppState::new(
        EngineSettings::default(),
        fixture_source(),
        Arc::new(MemoryCartStore::new()),
    ));
    let (status, json) = call(
        &st,
        send("POST", "/v1/sessions/k1/mutations", two_bowls_and_rangoon()),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"], "CATALOG_UNAVAILABLE");

    let (status, json) = call(
        &st,
        send("POST", "/v1/sessions/k1/mutations", json!({ "clearAll": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["report"]["kind"], "clear");
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_prices_from_catalog_and_persists_cart() {
    let store = Arc::new(MemoryCartStore::new());
    let st = loaded_state(EngineSettings::default(), Arc::clone(&store)).await;

    let (status, json) = call(
        &st,
        send("POST", "/v1/sessions/k1/mutations", two_bowls_and_rangoon()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["report"]["meals_added"], 1);
    assert_eq!(json["report"]["items_added"], 1);
    assert_eq!(json["cart"]["total_quantity"], 3);
    assert_eq!(json["cart"]["totals"]["subtotal"], "18.60");
    assert_eq!(json["cart"]["totals"]["tax"], "1.53");
    assert_eq!(json["cart"]["totals"]["total"], "20.13");

    let saved = store.load("k1").unwrap().expect("cart saved after mutation");
    assert_eq!(saved.total_quantity(), 3);

    let (status, json) = call(&st, get("/v1/sessions/k1/cart")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["lines"].as_array().unwrap().len(), 2);
    assert_eq!(json["totals"]["total"], "20.13");
}

#[tokio::test]
async fn incomplete_bowl_is_422_no_valid_items() {
    let st = loaded_state(EngineSettings::default(), Arc::new(MemoryCartStore::new())).await;
    let (status, json) = call(
        &st,
        send(
            "POST",
            "/v1/sessions/k1/mutations",
            json!({
                "meals": [{
                    "mealType": "Bowl",
                    "selections": { "entrees": [{ "recipeId": 1 }] }
                }]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "NO_VALID_ITEMS");
    assert_eq!(json["detail"]["rejection"], "no_valid_items");
}

#[tokio::test]
async fn non_json_body_is_422_no_valid_items() {
    let st = loaded_state(EngineSettings::default(), Arc::new(MemoryCartStore::new())).await;
    let req = Request::builder()
        .method("POST")
        .uri("/v1/sessions/k1/mutations")
        .body(Body::from("add two bowls please"))
        .unwrap();
    let (status, json) = call(&st, req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "NO_VALID_ITEMS");
}

#[tokio::test]
async fn capacity_overflow_is_409_and_cart_unchanged() {
    let settings = EngineSettings {
        max_items: 2,
        ..EngineSettings::default()
    };
    let st = loaded_state(settings, Arc::new(MemoryCartStore::new())).await;

    let (status, json) = call(
        &st,
        send("POST", "/v1/sessions/k1/mutations", two_bowls_and_rangoon()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["report"]["meals_added"], 1);
    assert_eq!(json["cart"]["total_quantity"], 2);

    let (status, json) = call(
        &st,
        send(
            "POST",
            "/v1/sessions/k1/mutations",
            json!({ "individualItems": [{ "recipeId": 7, "recipeType": "Appetizer" }] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "CART_CAPACITY_EXCEEDED");
    assert_eq!(json["detail"]["limit"], 2);
    assert_eq!(json["detail"]["current"], 2);

    let (_, json) = call(&st, get("/v1/sessions/k1/cart")).await;
    assert_eq!(json["total_quantity"], 2);
}

#[tokio::test]
async fn out_of_range_removal_is_422_empty_removal() {
    let st = loaded_state(EngineSettings::default(), Arc::new(MemoryCartStore::new())).await;
    call(
        &st,
        send("POST", "/v1/sessions/k1/mutations", two_bowls_and_rangoon()),
    )
    .await;

    let (status, json) = call(
        &st,
        send(
            "POST",
            "/v1/sessions/k1/mutations",
            json!({ "mealIndices": [5], "itemIndices": [0] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "EMPTY_REMOVAL_RESULT");

    let (status, json) = call(
        &st,
        send("POST", "/v1/sessions/k1/mutations", json!({ "itemIndices": [1] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["report"]["items_removed"], 1);
    assert_eq!(json["cart"]["totals"]["subtotal"], "16.60");
}

#[tokio::test]
async fn bad_session_id_is_400() {
    let st = loaded_state(EngineSettings::default(), Arc::new(MemoryCartStore::new())).await;
    let (status, json) = call(&st, get("/v1/sessions/a.b/cart")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "INVALID_SESSION_ID");
}

// ---------------------------------------------------------------------------
// Checkout, kitchen, readiness
// ---------------------------------------------------------------------------

#[tokio::test]
async fn checkout_then_kitchen_lifecycle_and_readiness() {
    let st = loaded_state(EngineSettings::default(), Arc::new(MemoryCartStore::new())).await;

    let (status, json) = call(&st, send("POST", "/v1/sessions/k1/checkout", json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "EMPTY_CART");

    call(
        &st,
        send("POST", "/v1/sessions/k1/mutations", two_bowls_and_rangoon()),
    )
    .await;
    let (status, order) = call(&st, send("POST", "/v1/sessions/k1/checkout", json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "placed");
    assert_eq!(order["completed"], false);
    assert_eq!(order["totals"]["total"], "20.13");
    let order_id = order["order_id"].as_str().unwrap().to_string();

    // Checkout empties the session cart.
    let (_, cart) = call(&st, get("/v1/sessions/k1/cart")).await;
    assert_eq!(cart["total_quantity"], 0);

    let (status, _) = call(&st, get(&format!("/v1/orders/{order_id}"))).await;
    assert_eq!(status, StatusCode::OK);

    // Nothing cooked yet: two bowls need 2 orange chicken + 2 chow mein.
    let (status, ready) = call(&st, get(&format!("/v1/orders/{order_id}/readiness"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ready["ready"], false);
    assert_eq!(ready["shortfalls"].as_array().unwrap().len(), 3);

    let (status, json) = call(
        &st,
        send("PUT", "/v1/kitchen/stock", json!({ "1": 2, "4": 2, "7": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["recipes"], 3);

    let (_, ready) = call(&st, get(&format!("/v1/orders/{order_id}/readiness"))).await;
    assert_eq!(ready["ready"], true);

    let status_uri = format!("/v1/orders/{order_id}/status");
    let (status, json) = call(&st, send("POST", &status_uri, json!({ "event": "complete" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "ILLEGAL_TRANSITION");

    for (event, expected) in [("start", "in_progress"), ("ready", "ready"), ("complete", "completed")] {
        let (status, json) = call(&st, send("POST", &status_uri, json!({ "event": event }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], expected);
    }
    let (_, json) = call(&st, get(&format!("/v1/orders/{order_id}"))).await;
    assert_eq!(json["completed"], true);
    let id: uuid::Uuid = order_id.parse().unwrap();
    assert!(st.orders.read().await[&id].settled_at.is_some());

    let (status, json) = call(&st, send("POST", &status_uri, json!({ "event": "juggle" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "UNKNOWN_EVENT");
}

#[tokio::test]
async fn unknown_order_is_404() {
    let st = loaded_state(EngineSettings::default(), Arc::new(MemoryCartStore::new())).await;
    let id = uuid_like();
    let (status, json) = call(&st, get(&format!("/v1/orders/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "ORDER_NOT_FOUND");

    let (status, _) = call(&st, get(&format!("/v1/orders/{id}/readiness"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn uuid_like() -> &'static str {
    "7d0f3a52-0000-4000-8000-000000000001"
}
