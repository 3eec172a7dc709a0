//! Order-file commands for the kitchen: readiness and status changes.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use kpos_config::ConfigMode;
use kpos_order::{KitchenEvent, Order};
use kpos_readiness::{readiness_report, CookedStock};

use super::{load_catalog, load_settings, print_json, read_json, write_json};

/// Print `ready=<bool>` and the full report. The cook plan needs a catalog
/// (`--catalog` or `/catalog/path`); without one it is empty.
pub fn readiness(
    order_path: &Path,
    stock_path: &Path,
    catalog: Option<PathBuf>,
    config: &[String],
) -> Result<()> {
    let settings = load_settings(config, ConfigMode::Kitchen)?;
    let order: Order = read_json(order_path)?;
    let stock: CookedStock = read_json(stock_path)?;

    let snap = match catalog.or_else(|| settings.catalog_path.clone()) {
        Some(p) => Some(load_catalog(&p)?),
        None => None,
    };
    let report = readiness_report(order.contents(), &stock, snap.as_ref());
    println!("ready={}", report.ready);
    print_json(&report)
}

/// Apply one kitchen event to an order file and write it back.
pub fn advance(order_path: &Path, event: &str) -> Result<()> {
    let ev = KitchenEvent::parse(event).ok_or_else(|| {
        anyhow!("invalid --event '{event}'. expected one of: start | ready | complete | cancel")
    })?;
    let mut order: Order = read_json(order_path)?;
    let status = order.apply(ev).context("kitchen transition refused")?;
    write_json(order_path, &order)?;
    println!("order_id={} status={}", order.id(), status);
    Ok(())
}
