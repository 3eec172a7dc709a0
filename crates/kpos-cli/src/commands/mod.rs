//! Command handler modules for kpos-cli.
//!
//! Shared file and config helpers live here; command logic lives in the
//! submodules.

pub mod cart;
pub mod kitchen;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use kpos_catalog::{CatalogSnapshot, JsonFileCatalogSource};
use kpos_config::{report_unused_keys, ConfigMode, EngineSettings, UnusedKeyPolicy};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Settings from `--config` layers (defaults when none are given). Unused
/// keys for `mode` are warned about, not fatal.
pub fn load_settings(paths: &[String], mode: ConfigMode) -> Result<EngineSettings> {
    if paths.is_empty() {
        return Ok(EngineSettings::default());
    }
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = kpos_config::load_layered_yaml(&path_refs)?;
    let report = report_unused_keys(mode, &loaded.config_json, UnusedKeyPolicy::Warn)?;
    for ptr in &report.unused_leaf_pointers {
        let layer = loaded.origin_of(ptr).and_then(|i| paths.get(i)).map(String::as_str);
        warn!(
            pointer = %ptr,
            mode = mode.as_str(),
            layer = layer.unwrap_or("?"),
            "unused config key"
        );
    }
    EngineSettings::from_config_json(&loaded.config_json)
}

/// `--catalog` wins over `/catalog/path` from config.
pub fn resolve_catalog_path(flag: Option<PathBuf>, settings: &EngineSettings) -> Result<PathBuf> {
    flag.or_else(|| settings.catalog_path.clone())
        .ok_or_else(|| anyhow!("no catalog: pass --catalog or set /catalog/path in config"))
}

pub fn load_catalog(path: &Path) -> Result<CatalogSnapshot> {
    CatalogSnapshot::load(&JsonFileCatalogSource::new(path))
        .with_context(|| format!("load catalog {}", path.display()))
}

/// Read a JSON document, tolerating a UTF-8 BOM.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("read failed: {}", path.display()))?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    serde_json::from_slice(bytes).with_context(|| format!("invalid json in {}", path.display()))
}

/// Like [`read_json`], but a missing file yields `T::default()`.
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    read_json(path)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let raw = serde_json::to_string_pretty(value).context("serialize failed")?;
    fs::write(path, raw).with_context(|| format!("write failed: {}", path.display()))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("serialize failed")?
    );
    Ok(())
}
