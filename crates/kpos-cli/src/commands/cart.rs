//! Cart-file commands: price, mutate, checkout.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use kpos_cart::Cart;
use kpos_config::ConfigMode;
use kpos_mutation::{apply_payload, MutationError, Rejection};
use kpos_pricing::{price_cart, reprice_cart};

use super::{
    load_catalog, load_settings, print_json, read_json, read_json_or_default,
    resolve_catalog_path, write_json,
};

/// Print a cart's lines and totals. With a catalog, every line is repriced
/// against it first and lines that no longer resolve are listed.
pub fn price(catalog: Option<PathBuf>, cart_path: &Path, config: &[String]) -> Result<()> {
    let settings = load_settings(config, ConfigMode::Offline)?;
    let policy = settings.pricing_policy();
    let cart: Cart = read_json(cart_path)?;

    let catalog_path = catalog.or_else(|| settings.catalog_path.clone());
    let cart = match catalog_path {
        Some(p) => {
            let snap = load_catalog(&p)?;
            let report = reprice_cart(&cart, &snap, &policy).context("reprice failed")?;
            for s in &report.stale {
                println!("stale: {} {} {:?}", s.kind, s.position + 1, s.reason);
            }
            report.cart
        }
        None => cart,
    };

    let totals = price_cart(&cart, &policy).context("pricing failed")?;
    for line in cart.numbered_lines() {
        println!("{line}");
    }
    println!(
        "subtotal={} tax={} total={}",
        totals.subtotal, totals.tax, totals.total
    );
    Ok(())
}

/// Validate and apply a mutation request to a cart file. Without `write`
/// the cart file is left alone (dry run); a missing cart file is an empty
/// cart.
pub fn mutate(
    catalog: Option<PathBuf>,
    cart_path: &Path,
    request_path: &Path,
    write: bool,
    config: &[String],
) -> Result<()> {
    let settings = load_settings(config, ConfigMode::Offline)?;
    let snap = load_catalog(&resolve_catalog_path(catalog, &settings)?)?;
    let payload: Value = read_json(request_path)?;
    let mut cart: Cart = read_json_or_default(cart_path)?;

    let report = match apply_payload(
        &payload,
        Some(&snap),
        &mut cart,
        &settings.pricing_policy(),
        &settings.cart_limits(),
    ) {
        Ok(r) => r,
        Err(e) => bail!("{}: {}", error_code(&e), e.user_message()),
    };
    print_json(&report)?;

    let written = write && report.changed();
    if written {
        write_json(cart_path, &cart)?;
        info!(path = %cart_path.display(), "cart written");
    }
    println!("written={written}");
    Ok(())
}

/// Place an order from a cart file. The order is written to `out`; the
/// cart file is emptied.
pub fn checkout(
    catalog: Option<PathBuf>,
    cart_path: &Path,
    out: &Path,
    config: &[String],
) -> Result<()> {
    let settings = load_settings(config, ConfigMode::Offline)?;
    let snap = load_catalog(&resolve_catalog_path(catalog, &settings)?)?;
    let mut cart: Cart = read_json(cart_path)?;

    let order = kpos_order::checkout(
        &mut cart,
        &snap,
        &settings.pricing_policy(),
        Utc::now(),
        Uuid::new_v4(),
    )
    .context("checkout refused")?;
    write_json(out, &order)?;
    write_json(cart_path, &cart)?;

    println!("order_id={}", order.id());
    println!(
        "subtotal={} tax={} total={}",
        order.subtotal(),
        order.tax(),
        order.total()
    );
    Ok(())
}

fn error_code(e: &MutationError) -> &'static str {
    match e {
        MutationError::Rejected(Rejection::NoValidItems { .. }) => "NO_VALID_ITEMS",
        MutationError::Rejected(Rejection::EmptyRemovalResult { .. }) => "EMPTY_REMOVAL_RESULT",
        MutationError::Rejected(Rejection::CatalogUnavailable { .. }) => "CATALOG_UNAVAILABLE",
        MutationError::Capacity { .. } => "CART_CAPACITY_EXCEEDED",
    }
}
