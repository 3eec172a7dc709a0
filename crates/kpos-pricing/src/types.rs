use serde::{Deserialize, Serialize};

use kpos_cart::LineKind;
use kpos_catalog::Micros;

/// Parts-per-million scale for [`TaxRate`].
pub const PPM_SCALE: u32 = 1_000_000;

/// Sales tax rate in parts per million (8.25% = 82_500).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(u32);

impl TaxRate {
    pub const ZERO: TaxRate = TaxRate(0);

    pub const fn from_ppm(ppm: u32) -> Self {
        TaxRate(ppm)
    }

    pub const fn ppm(self) -> u32 {
        self.0
    }

    /// Wire/config boundary: a fraction such as `0.0825`. Must be finite and
    /// in `[0, 1)`.
    pub fn from_fraction(fraction: f64) -> Result<TaxRate, PricingError> {
        if !fraction.is_finite() {
            return Err(PricingError::InvalidTaxRate(fraction.to_string()));
        }
        if !(0.0..1.0).contains(&fraction) {
            return Err(PricingError::InvalidTaxRate(fraction.to_string()));
        }
        Ok(TaxRate((fraction * PPM_SCALE as f64).round() as u32))
    }

    pub fn as_fraction(self) -> f64 {
        self.0 as f64 / PPM_SCALE as f64
    }
}

/// Store-wide pricing parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Added to a meal's base price once per premium selection.
    pub premium_upcharge: Micros,
    pub tax_rate: TaxRate,
}

impl PricingPolicy {
    pub const DEFAULT_PREMIUM_UPCHARGE: Micros = Micros::from_cents(150);
    pub const DEFAULT_TAX_RATE: TaxRate = TaxRate::from_ppm(82_500);

    pub fn new(premium_upcharge: Micros, tax_rate: TaxRate) -> Self {
        Self {
            premium_upcharge,
            tax_rate,
        }
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREMIUM_UPCHARGE, Self::DEFAULT_TAX_RATE)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PricingError {
    /// Line or order arithmetic left the `i64` micros range.
    Overflow { what: &'static str },
    InvalidTaxRate(String),
    NegativeUpcharge,
}

impl std::fmt::Display for PricingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingError::Overflow { what } => write!(f, "pricing overflow computing {what}"),
            PricingError::InvalidTaxRate(raw) => {
                write!(f, "tax rate must be a finite fraction in [0, 1), got {raw}")
            }
            PricingError::NegativeUpcharge => write!(f, "premium upcharge must not be negative"),
        }
    }
}

impl std::error::Error for PricingError {}

/// One priced cart line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTotal {
    pub kind: LineKind,
    /// 0-based position within its sub-list.
    pub position: usize,
    pub unit_price: Micros,
    pub quantity: u32,
    /// `unit_price × quantity`, unrounded.
    pub total: Micros,
}

/// Totals for a cart. `tax` and `total` are whole cents; `subtotal` is the
/// exact sum of unrounded line totals.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub lines: Vec<LineTotal>,
    pub subtotal: Micros,
    pub tax: Micros,
    pub total: Micros,
}
