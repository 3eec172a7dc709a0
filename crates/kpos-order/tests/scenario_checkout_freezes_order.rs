use chrono::{TimeZone, Utc};
use uuid::Uuid;

use kpos_cart::*;
use kpos_catalog::{fixtures, CatalogSnapshot, Micros, RecipeItem};
use kpos_order::*;
use kpos_pricing::PricingPolicy;

fn cart() -> Cart {
    let snap = fixtures::snapshot();
    Cart::from_lines(
        vec![MealOrder {
            meal_type: fixtures::BOWL.into(),
            quantity: 2,
            unit_price: Micros::from_cents(830),
            selections: MealSelections {
                entrees: vec![RecipeSelection::of(
                    snap.recipe(fixtures::ORANGE_CHICKEN).unwrap(),
                )],
                sides: vec![RecipeSelection::of(snap.recipe(fixtures::CHOW_MEIN).unwrap())],
                drinks: vec![],
            },
        }],
        vec![IndividualItem::of(snap.recipe(fixtures::RANGOON).unwrap(), 1)],
    )
}

fn id() -> Uuid {
    Uuid::from_u128(0x1234)
}

#[test]
fn checkout_totals_and_clears_cart() {
    let snap = fixtures::snapshot();
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let mut c = cart();

    let order = checkout(&mut c, &snap, &PricingPolicy::default(), now, id()).unwrap();
    assert!(c.is_empty());
    assert_eq!(order.id(), id());
    assert_eq!(order.placed_at(), now);
    assert_eq!(order.subtotal(), Micros::from_cents(1_860));
    assert_eq!(order.tax(), Micros::from_cents(153));
    assert_eq!(order.total(), Micros::from_cents(2_013));
    assert_eq!(order.status(), KitchenStatus::Placed);
    assert!(!order.completed());
}

#[test]
fn empty_cart_cannot_check_out() {
    let snap = fixtures::snapshot();
    let mut c = Cart::new();
    let err = checkout(&mut c, &snap, &PricingPolicy::default(), Utc::now(), id()).unwrap_err();
    assert_eq!(err, CheckoutError::EmptyCart);
}

#[test]
fn stale_cart_is_refused_and_left_intact() {
    let recipes: Vec<RecipeItem> = fixtures::recipes()
        .into_iter()
        .filter(|r| r.id != fixtures::CHOW_MEIN)
        .collect();
    let changed = CatalogSnapshot::from_parts(fixtures::meal_types(), recipes).unwrap();
    let mut c = cart();
    let before = c.clone();

    let err = checkout(&mut c, &changed, &PricingPolicy::default(), Utc::now(), id()).unwrap_err();
    assert!(matches!(err, CheckoutError::StaleLines(ref s) if s.len() == 1));
    assert_eq!(c, before);
}

#[test]
fn checkout_uses_current_catalog_price() {
    let recipes: Vec<RecipeItem> = fixtures::recipes()
        .into_iter()
        .map(|r| {
            if r.id == fixtures::RANGOON {
                RecipeItem {
                    price: Micros::from_cents(250),
                    ..r
                }
            } else {
                r
            }
        })
        .collect();
    let changed = CatalogSnapshot::from_parts(fixtures::meal_types(), recipes).unwrap();
    let order = place_order(
        &cart(),
        &changed,
        &PricingPolicy::default(),
        Utc::now(),
        id(),
    )
    .unwrap();
    assert_eq!(order.contents().items()[0].unit_price, Micros::from_cents(250));
    assert_eq!(order.subtotal(), Micros::from_cents(1_910));
}

#[test]
fn kitchen_lifecycle_sets_completed_flag() {
    let snap = fixtures::snapshot();
    let mut order = place_order(&cart(), &snap, &PricingPolicy::default(), Utc::now(), id()).unwrap();
    order.apply(KitchenEvent::Start).unwrap();
    order.apply(KitchenEvent::MarkReady).unwrap();
    order.apply(KitchenEvent::Complete).unwrap();
    assert!(order.completed());

    let frozen_total = order.total();
    let err = order.apply(KitchenEvent::Cancel).unwrap_err();
    assert_eq!(err.from, KitchenStatus::Completed);
    assert_eq!(order.status(), KitchenStatus::Completed);
    assert_eq!(order.total(), frozen_total);
}

#[test]
fn order_round_trips_through_json_with_same_totals() {
    let snap = fixtures::snapshot();
    let order = place_order(&cart(), &snap, &PricingPolicy::default(), Utc::now(), id()).unwrap();
    let json = serde_json::to_string(&order).unwrap();
    let back: Order = serde_json::from_str(&json).unwrap();
    assert_eq!(back, order);
    assert_eq!(back.totals(), order.totals());
}
