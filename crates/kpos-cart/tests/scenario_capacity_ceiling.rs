//! The item ceiling is a hard limit measured in total quantity. Lines are
//! rejected whole, never truncated, and the cart can never exceed it.

use kpos_cart::*;
use kpos_catalog::{Category, Micros, RecipeId};
use proptest::prelude::*;

fn item(qty: u32) -> IndividualItem {
    IndividualItem {
        recipe_id: RecipeId(7),
        name: "Cream Cheese Rangoon".into(),
        category: Category::Appetizer,
        quantity: qty,
        unit_price: Micros::from_cents(200),
    }
}

#[test]
fn three_items_with_two_slots_left_is_rejected_not_truncated() {
    let limits = CartLimits::new(20);
    let mut cart = Cart::new();
    apply_add(
        &mut cart,
        AddBatch {
            meals: vec![],
            items: vec![item(18)],
        },
        &limits,
    )
    .unwrap();
    assert_eq!(cart.headroom(limits.max_items), 2);

    let err = apply_add(
        &mut cart,
        AddBatch {
            meals: vec![],
            items: vec![item(3)],
        },
        &limits,
    )
    .unwrap_err();
    assert_eq!(err.current, 18);
    assert_eq!(cart.total_quantity(), 18);
    assert_eq!(cart.items().len(), 1);
}

#[test]
fn partial_batch_reports_rejected_positions() {
    let limits = CartLimits::new(5);
    let mut cart = Cart::new();
    let out = apply_add(
        &mut cart,
        AddBatch {
            meals: vec![],
            items: vec![item(2), item(4), item(3)],
        },
        &limits,
    )
    .unwrap();
    assert_eq!(out.items_added, 2);
    assert_eq!(out.total_quantity, 5);
    assert_eq!(
        out.capacity_rejected,
        vec![CapacityRejection {
            kind: LineKind::Item,
            position: 1,
            quantity: 4,
        }]
    );
}

#[test]
fn clear_is_idempotent() {
    let mut cart = Cart::new();
    apply_add(
        &mut cart,
        AddBatch {
            meals: vec![],
            items: vec![item(1), item(1)],
        },
        &CartLimits::default(),
    )
    .unwrap();
    assert_eq!(cart.clear(), 2);
    assert_eq!(cart.clear(), 0);
    assert!(cart.is_empty());
}

proptest! {
    #[test]
    fn total_never_exceeds_limit(
        limit in 0u32..30,
        batches in proptest::collection::vec(
            proptest::collection::vec(1u32..8, 0..5), 0..6),
    ) {
        let limits = CartLimits::new(limit);
        let mut cart = Cart::new();
        for qtys in batches {
            let before = cart.clone();
            let batch = AddBatch { meals: vec![], items: qtys.into_iter().map(item).collect() };
            match apply_add(&mut cart, batch, &limits) {
                Ok(out) => prop_assert_eq!(out.total_quantity, cart.total_quantity()),
                Err(_) => prop_assert_eq!(&cart, &before),
            }
            prop_assert!(cart.total_quantity() <= limit as u64);
        }
    }
}
