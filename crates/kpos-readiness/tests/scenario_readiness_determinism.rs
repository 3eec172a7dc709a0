use kpos_cart::*;
use kpos_catalog::{fixtures, Category, Micros, RecipeId};
use kpos_readiness::*;
use proptest::prelude::*;

fn item(id: u32, qty: u32) -> IndividualItem {
    IndividualItem {
        recipe_id: RecipeId(id),
        name: format!("r{id}"),
        category: Category::Appetizer,
        quantity: qty,
        unit_price: Micros::from_cents(100),
    }
}

fn order_r1x2_r2x1() -> Cart {
    Cart::from_lines(vec![], vec![item(1, 2), item(2, 1)])
}

#[test]
fn short_on_r1_is_not_ready() {
    let stock = CookedStock::new().with(RecipeId(1), 1).with(RecipeId(2), 5);
    assert!(!is_ready(&order_r1x2_r2x1(), &stock));
    let s = shortfalls(&order_r1x2_r2x1(), &stock);
    assert_eq!(
        s,
        vec![Shortfall {
            recipe_id: RecipeId(1),
            required: 2,
            available: Some(1),
            missing: 1,
        }]
    );
}

#[test]
fn exact_stock_is_ready() {
    let stock = CookedStock::new().with(RecipeId(1), 2).with(RecipeId(2), 1);
    assert!(is_ready(&order_r1x2_r2x1(), &stock));
    assert!(shortfalls(&order_r1x2_r2x1(), &stock).is_empty());
}

#[test]
fn missing_record_and_zero_stock_are_not_ready() {
    let no_record = CookedStock::new().with(RecipeId(1), 10);
    assert!(!is_ready(&order_r1x2_r2x1(), &no_record));

    let zero = CookedStock::new().with(RecipeId(1), 10).with(RecipeId(2), 0);
    let s = shortfalls(&order_r1x2_r2x1(), &zero);
    assert_eq!(s.len(), 1);
    assert_eq!(s[0].available, Some(0));
}

#[test]
fn meal_selections_count_once_per_meal_quantity() {
    let snap = fixtures::snapshot();
    let plate = MealOrder {
        meal_type: fixtures::PLATE.into(),
        quantity: 3,
        unit_price: Micros::from_cents(980),
        selections: MealSelections {
            entrees: vec![
                RecipeSelection::of(snap.recipe(fixtures::ORANGE_CHICKEN).unwrap()),
                RecipeSelection::of(snap.recipe(fixtures::ORANGE_CHICKEN).unwrap()),
            ],
            sides: vec![RecipeSelection::of(snap.recipe(fixtures::FRIED_RICE).unwrap())],
            drinks: vec![],
        },
    };
    let order = Cart::from_lines(
        vec![plate],
        vec![IndividualItem::of(snap.recipe(fixtures::FRIED_RICE).unwrap(), 1)],
    );
    let req = aggregate_requirements(&order);
    assert_eq!(req.get(&fixtures::ORANGE_CHICKEN), Some(&6));
    assert_eq!(req.get(&fixtures::FRIED_RICE), Some(&4));

    let stock = CookedStock::new()
        .with(fixtures::ORANGE_CHICKEN, 5)
        .with(fixtures::FRIED_RICE, 4);
    let report = readiness_report(&order, &stock, Some(&snap));
    assert!(!report.ready);
    assert_eq!(report.shortfalls[0].missing, 1);
    assert_eq!(report.cook_plan[0].batches, 1);
    assert_eq!(report.cook_plan[0].servings, 8);
}

#[test]
fn stock_json_uses_recipe_ids_as_keys() {
    let stock: CookedStock = serde_json::from_str(r#"{ "1": 2, "2": -1 }"#).unwrap();
    assert_eq!(stock.get(RecipeId(1)), Some(2));
    assert_eq!(stock.get(RecipeId(2)), Some(-1));
    assert_eq!(stock.get(RecipeId(3)), None);
}

proptest! {
    #[test]
    fn is_ready_agrees_with_shortfalls(
        lines in proptest::collection::vec((1u32..6, 1u32..5), 0..8),
        stock in proptest::collection::btree_map(1u32..6, -3i64..10, 0..6),
    ) {
        let cart = Cart::from_lines(vec![], lines.iter().map(|&(id, q)| item(id, q)).collect());
        let stock: CookedStock = stock.into_iter().map(|(k, v)| (RecipeId(k), v)).collect();
        prop_assert_eq!(is_ready(&cart, &stock), shortfalls(&cart, &stock).is_empty());
        // same inputs, same answer
        prop_assert_eq!(is_ready(&cart, &stock), is_ready(&cart, &stock));
    }
}
