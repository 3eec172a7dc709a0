//! Fixed-point money type.
//!
//! # Scale
//!
//! All money amounts use a 1e-6 (micros) fixed-point representation stored
//! as `i64`. 1 USD = `Micros(1_000_000)`. Quantities (servings, line counts)
//! remain plain integers and are never implicitly convertible.
//!
//! # Wire boundary
//!
//! `f64` dollars only appear where data enters from outside (catalog
//! records, agent payloads, config values). They are converted exactly once
//! with [`Micros::from_dollars`], which rejects NaN, infinities and values
//! that do not fit in `i64` after scaling. [`Micros::to_dollars`] is for
//! display/serialization back to such boundaries only.
//!
//! # Rounding
//!
//! [`Micros::round_to_cents`] is the only rounding primitive: half-up, where
//! "up" means away from zero for negative amounts.

use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

/// Scale factor: 1 dollar = 1_000_000 micros.
pub const MICROS_PER_DOLLAR: i64 = 1_000_000;

/// 1 cent = 10_000 micros.
pub const MICROS_PER_CENT: i64 = 10_000;

// ---------------------------------------------------------------------------
// MoneyError
// ---------------------------------------------------------------------------

/// Returned by [`Micros::from_dollars`] when the input is not representable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// Input was `NaN` or infinite.
    NotFinite,
    /// Input would overflow `i64` after scaling by [`MICROS_PER_DOLLAR`].
    OutOfRange,
}

impl std::fmt::Display for MoneyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoneyError::NotFinite => write!(f, "amount is not finite (NaN or Inf)"),
            MoneyError::OutOfRange => write!(f, "amount out of i64 range after scaling"),
        }
    }
}

impl std::error::Error for MoneyError {}

// ---------------------------------------------------------------------------
// Micros newtype
// ---------------------------------------------------------------------------

/// A fixed-point monetary amount at 1e-6 scale.
///
/// There is intentionally no `From<i64>`: callers must be deliberate about
/// when a raw integer represents money. Serialized form is the raw integer,
/// so persisted carts reload bit-for-bit.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Micros(i64);

impl Micros {
    pub const ZERO: Micros = Micros(0);

    #[inline]
    pub const fn new(raw: i64) -> Self {
        Micros(raw)
    }

    /// Whole cents, e.g. `Micros::from_cents(830)` is $8.30.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Micros(cents * MICROS_PER_CENT)
    }

    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Convert wire-format dollars into micros, rounding to the nearest
    /// micro. Fires in all build profiles.
    pub fn from_dollars(dollars: f64) -> Result<Micros, MoneyError> {
        if !dollars.is_finite() {
            return Err(MoneyError::NotFinite);
        }
        let scaled = dollars * MICROS_PER_DOLLAR as f64;
        if scaled >= i64::MAX as f64 || scaled <= i64::MIN as f64 {
            return Err(MoneyError::OutOfRange);
        }
        Ok(Micros(scaled.round() as i64))
    }

    /// Dollars as `f64`. Wire boundary only.
    pub fn to_dollars(self) -> f64 {
        self.0 as f64 / MICROS_PER_DOLLAR as f64
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub fn checked_add(self, rhs: Micros) -> Option<Micros> {
        self.0.checked_add(rhs.0).map(Micros)
    }

    /// Multiply a per-unit price by a plain count (servings, selections).
    ///
    /// `None` on overflow; callers must handle it explicitly.
    #[inline]
    pub fn checked_mul_qty(self, qty: u64) -> Option<Micros> {
        i64::try_from(qty)
            .ok()
            .and_then(|q| self.0.checked_mul(q))
            .map(Micros)
    }

    /// Round to whole cents, half-up (away from zero on ties).
    pub fn round_to_cents(self) -> Micros {
        let rounded = round_half_away(self.0 as i128, MICROS_PER_CENT as i128);
        // |rounded| <= |self| + half a cent, which only exceeds i64 at the
        // extreme edges; clamp there rather than wrap.
        Micros(rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }
}

/// Round `value` to the nearest multiple of `unit` (unit > 0), ties away
/// from zero. Shared with the tax computation, which works in i128.
pub fn round_half_away(value: i128, unit: i128) -> i128 {
    debug_assert!(unit > 0);
    let half = unit / 2;
    if value >= 0 {
        (value + half) / unit * unit
    } else {
        -((-value + half) / unit * unit)
    }
}

// ---------------------------------------------------------------------------
// Arithmetic (closed over Micros)
// ---------------------------------------------------------------------------

impl Add for Micros {
    type Output = Micros;
    #[inline]
    fn add(self, rhs: Micros) -> Micros {
        Micros(self.0 + rhs.0)
    }
}

impl Sub for Micros {
    type Output = Micros;
    #[inline]
    fn sub(self, rhs: Micros) -> Micros {
        Micros(self.0 - rhs.0)
    }
}

impl AddAssign for Micros {
    #[inline]
    fn add_assign(&mut self, rhs: Micros) {
        self.0 += rhs.0;
    }
}

impl Sum for Micros {
    fn sum<I: Iterator<Item = Micros>>(iter: I) -> Micros {
        iter.fold(Micros::ZERO, |acc, m| acc + m)
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// Renders as dollars with two decimals after cent rounding, e.g. `8.30`.
impl std::fmt::Display for Micros {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cents = self.round_to_cents().0 / MICROS_PER_CENT;
        let sign = if cents < 0 { "-" } else { "" };
        let abs = cents.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}
