//! Whatever the agent sends, every meal that reaches the cart has exactly
//! the required number of selections per slot, each of the slot's category,
//! priced from the catalog.

use kpos_cart::{Cart, CartLimits};
use kpos_catalog::{fixtures, MealSlot};
use kpos_mutation::*;
use kpos_pricing::{meal_unit_price_for, PricingPolicy};
use proptest::prelude::*;
use serde_json::json;

fn meal_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        fixtures::BOWL,
        fixtures::PLATE,
        fixtures::BIGGER_PLATE,
        fixtures::COMBO,
        "Family Feast",
    ])
}

fn ids() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::vec(0u32..12, 0..4)
}

proptest! {
    #[test]
    fn accepted_meals_match_their_definition(
        name in meal_name(),
        entrees in ids(),
        sides in ids(),
        drinks in ids(),
        claimed_price in -5.0f64..50.0,
    ) {
        let snap = fixtures::snapshot();
        let policy = PricingPolicy::default();
        let payload = json!({
            "meals": [{
                "mealType": name,
                "price": claimed_price,
                "selections": {
                    "entrees": entrees.iter().map(|id| json!({ "recipeId": id })).collect::<Vec<_>>(),
                    "sides": sides,
                    "drinks": drinks,
                }
            }]
        });
        let mut cart = Cart::new();
        let _ = apply_payload(&payload, Some(&snap), &mut cart, &policy, &CartLimits::default());

        for meal in cart.meals() {
            let def = snap.meal_type(&meal.meal_type).unwrap();
            for slot in MealSlot::ALL {
                let picked = meal.selections.slot(slot);
                prop_assert_eq!(picked.len() as u32, def.required(slot));
                for s in picked {
                    prop_assert_eq!(snap.recipe(s.recipe_id).unwrap().category, slot.category());
                }
            }
            let expected = meal_unit_price_for(def, &meal.selections, &policy).unwrap();
            prop_assert_eq!(meal.unit_price, expected);
        }
    }
}
