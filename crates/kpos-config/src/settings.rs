use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use serde_json::Value;

use kpos_cart::CartLimits;
use kpos_catalog::Micros;
use kpos_pricing::{PricingPolicy, TaxRate};

/// Typed engine settings read from the merged config JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub max_items: u32,
    pub tax_rate: TaxRate,
    pub premium_upcharge: Micros,
    /// `0` disables idle expiry.
    pub idle_timeout_secs: u64,
    pub catalog_path: Option<PathBuf>,
    pub cart_dir: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_items: CartLimits::DEFAULT_MAX_ITEMS,
            tax_rate: PricingPolicy::DEFAULT_TAX_RATE,
            premium_upcharge: PricingPolicy::DEFAULT_PREMIUM_UPCHARGE,
            idle_timeout_secs: 900,
            catalog_path: None,
            cart_dir: None,
        }
    }
}

impl EngineSettings {
    /// Missing keys take their defaults; present keys must have the right
    /// type and range. Errors name the offending pointer.
    pub fn from_config_json(cfg: &Value) -> Result<Self> {
        let d = EngineSettings::default();

        let max_items = match read_u64(cfg, "/cart/max_items")? {
            None => d.max_items,
            Some(0) => return Err(anyhow!("/cart/max_items must be >= 1")),
            Some(n) => u32::try_from(n).context("/cart/max_items out of range")?,
        };

        let tax_rate = match read_f64(cfg, "/pricing/tax_rate")? {
            None => d.tax_rate,
            Some(f) => TaxRate::from_fraction(f)
                .map_err(|e| anyhow!("/pricing/tax_rate: {e}"))?,
        };

        let premium_upcharge = match read_f64(cfg, "/pricing/premium_upcharge")? {
            None => d.premium_upcharge,
            Some(f) => {
                let m = Micros::from_dollars(f)
                    .map_err(|e| anyhow!("/pricing/premium_upcharge: {e}"))?;
                if m.is_negative() {
                    return Err(anyhow!("/pricing/premium_upcharge must be >= 0 (got {f})"));
                }
                m
            }
        };

        let idle_timeout_secs =
            read_u64(cfg, "/session/idle_timeout_secs")?.unwrap_or(d.idle_timeout_secs);

        Ok(Self {
            max_items,
            tax_rate,
            premium_upcharge,
            idle_timeout_secs,
            catalog_path: read_path(cfg, "/catalog/path")?,
            cart_dir: read_path(cfg, "/persistence/cart_dir")?,
        })
    }

    pub fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy::new(self.premium_upcharge, self.tax_rate)
    }

    pub fn cart_limits(&self) -> CartLimits {
        CartLimits::new(self.max_items)
    }
}

// Numbers may also arrive as strings from env-substituted YAML.
fn read_u64(cfg: &Value, ptr: &str) -> Result<Option<u64>> {
    match cfg.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| anyhow!("{ptr} must be a non-negative integer (got {n})")),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .with_context(|| format!("{ptr} must be a non-negative integer (got '{s}')")),
        Some(other) => Err(anyhow!("{ptr} must be a non-negative integer (got {other})")),
    }
}

fn read_f64(cfg: &Value, ptr: &str) -> Result<Option<f64>> {
    match cfg.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| anyhow!("{ptr} is not a finite number")),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .with_context(|| format!("{ptr} must be a number (got '{s}')")),
        Some(other) => Err(anyhow!("{ptr} must be a number (got {other})")),
    }
}

fn read_path(cfg: &Value, ptr: &str) -> Result<Option<PathBuf>> {
    match cfg.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(PathBuf::from(s))),
        Some(other) => Err(anyhow!("{ptr} must be a path string (got {other})")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_config_gives_defaults() {
        let s = EngineSettings::from_config_json(&json!({})).unwrap();
        assert_eq!(s, EngineSettings::default());
        assert_eq!(s.cart_limits().max_items, 20);
        assert_eq!(s.pricing_policy().tax_rate.ppm(), 82_500);
    }

    #[test]
    fn string_numbers_are_accepted() {
        let s = EngineSettings::from_config_json(&json!({
            "cart": { "max_items": "12" },
            "pricing": { "tax_rate": "0.07" }
        }))
        .unwrap();
        assert_eq!(s.max_items, 12);
        assert_eq!(s.tax_rate.ppm(), 70_000);
    }

    #[test]
    fn errors_name_the_pointer() {
        let err = EngineSettings::from_config_json(&json!({ "cart": { "max_items": 0 } }))
            .unwrap_err();
        assert!(err.to_string().contains("/cart/max_items"));

        let err = EngineSettings::from_config_json(&json!({ "pricing": { "tax_rate": 1.5 } }))
            .unwrap_err();
        assert!(err.to_string().contains("/pricing/tax_rate"));

        let err = EngineSettings::from_config_json(&json!({
            "pricing": { "premium_upcharge": -1.0 }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("/pricing/premium_upcharge"));
    }
}
