use kpos_cart::{Cart, LineKind, MealSelections};
use kpos_catalog::{round_half_away, MealTypeDefinition, Micros, MICROS_PER_CENT};

use crate::types::{CartTotals, LineTotal, PricingError, PricingPolicy, TaxRate, PPM_SCALE};

/// `base + premium_count × upcharge`.
pub fn meal_unit_price(
    def: &MealTypeDefinition,
    premium_count: u32,
    policy: &PricingPolicy,
) -> Result<Micros, PricingError> {
    let upcharge = policy
        .premium_upcharge
        .checked_mul_qty(premium_count as u64)
        .ok_or(PricingError::Overflow {
            what: "premium upcharge",
        })?;
    def.base_price
        .checked_add(upcharge)
        .ok_or(PricingError::Overflow {
            what: "meal unit price",
        })
}

/// Unit price for a meal with these selections.
pub fn meal_unit_price_for(
    def: &MealTypeDefinition,
    selections: &MealSelections,
    policy: &PricingPolicy,
) -> Result<Micros, PricingError> {
    meal_unit_price(def, selections.premium_count(), policy)
}

/// `unit × quantity`, no rounding.
pub fn line_total(unit_price: Micros, quantity: u32) -> Result<Micros, PricingError> {
    unit_price
        .checked_mul_qty(quantity as u64)
        .ok_or(PricingError::Overflow { what: "line total" })
}

/// `round2(subtotal × rate)`, computed in i128.
pub fn tax_on(subtotal: Micros, rate: TaxRate) -> Result<Micros, PricingError> {
    let product = subtotal.raw() as i128 * rate.ppm() as i128;
    // product is micros × ppm; one cent of tax is MICROS_PER_CENT × PPM_SCALE.
    let unit = MICROS_PER_CENT as i128 * PPM_SCALE as i128;
    let rounded = round_half_away(product, unit) / PPM_SCALE as i128;
    i64::try_from(rounded)
        .map(Micros::new)
        .map_err(|_| PricingError::Overflow { what: "tax" })
}

/// Price every line of `cart` from its stored unit prices.
///
/// The cart's unit prices are catalog-derived at validation time; use
/// [`crate::reprice_cart`] first when the catalog may have changed since.
pub fn price_cart(cart: &Cart, policy: &PricingPolicy) -> Result<CartTotals, PricingError> {
    let mut lines = Vec::with_capacity(cart.line_count());
    for (position, m) in cart.meals().iter().enumerate() {
        lines.push(LineTotal {
            kind: LineKind::Meal,
            position,
            unit_price: m.unit_price,
            quantity: m.quantity,
            total: line_total(m.unit_price, m.quantity)?,
        });
    }
    for (position, it) in cart.items().iter().enumerate() {
        lines.push(LineTotal {
            kind: LineKind::Item,
            position,
            unit_price: it.unit_price,
            quantity: it.quantity,
            total: line_total(it.unit_price, it.quantity)?,
        });
    }

    let mut subtotal = Micros::ZERO;
    for l in &lines {
        subtotal = subtotal
            .checked_add(l.total)
            .ok_or(PricingError::Overflow { what: "subtotal" })?;
    }
    let tax = tax_on(subtotal, policy.tax_rate)?;
    let total = subtotal
        .checked_add(tax)
        .ok_or(PricingError::Overflow { what: "total" })?
        .round_to_cents();

    Ok(CartTotals {
        lines,
        subtotal,
        tax,
        total,
    })
}
