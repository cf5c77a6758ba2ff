//! Engine-wide numeric knobs.
//!
//! Collaborators may load this from JSON (every field has a default), or
//! just use `EngineConfig::default()` through the non-`_ext` entry points.

use serde::{Deserialize, Serialize};

use crate::mechanics::rate::{DEFAULT_FRACTION_DIGITS, MAX_FRACTION_DIGITS, RATE_TOLERANCE};

/// A "pay `price`, receive `pulls`" pricing step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPrice {
    pub price: u64,
    pub pulls: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Slack allowed when checking that rates sum to at most 1.
    pub rate_tolerance: f64,
    /// Fraction digits used by `format_rarity_rate`.
    pub fraction_digits: usize,
    /// Upper bound for inferred per-rarity digit budgets.
    pub max_fraction_digits: usize,
    /// Applied when a setting has no usable pull pricing at all.
    /// `None` turns such settings into a `no-pricing` plan error.
    pub fallback_unit: Option<UnitPrice>,
    /// Cap on budget steps when inverting the plan resolver.
    pub max_inversion_iters: usize,
    /// Most pulls a single execution will draw; bigger plans are refused.
    pub max_pulls: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rate_tolerance: RATE_TOLERANCE,
            fraction_digits: DEFAULT_FRACTION_DIGITS,
            max_fraction_digits: MAX_FRACTION_DIGITS,
            fallback_unit: Some(UnitPrice { price: 1, pulls: 1 }),
            max_inversion_iters: 1000,
            max_pulls: 1_000_000,
        }
    }
}
