//! Rarity tiers and their emission rates.
//!
//! A gacha's tiers carry user-set rates, except for at most one
//! *auto-adjust* tier whose rate is always `1 − Σ(other rates)`, clamped
//! to ≥ 0. The auto-adjust tier is an explicit flag on the tier record;
//! [`designate_base_tier`] applies the "lowest `sort_order`" convention to
//! snapshots that don't carry the flag.
//!
//! Edits go through [`build_emit_rate_updates`], which rejects any edit that
//! would push the user-set rates past 100% so callers can revert the input.

use serde::{Deserialize, Serialize};

use crate::error::RateError;
use crate::mechanics::rate::{RATE_TOLERANCE, clamp_rate};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RarityTier {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub color: String,
    /// Fraction in [0,1]; `None` counts as 0. Ignored for the auto tier.
    #[serde(default)]
    pub emit_rate: Option<f64>,
    /// Higher = rarer. The base (most common) tier has the lowest value.
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub auto_adjust: bool,
}

impl RarityTier {
    pub fn new(id: impl Into<String>, label: impl Into<String>, emit_rate: Option<f64>, sort_order: i32) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            color: String::new(),
            emit_rate,
            sort_order,
            auto_adjust: false,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Mark as the auto-adjust tier.
    pub fn auto(mut self) -> Self {
        self.auto_adjust = true;
        self
    }

    #[inline]
    fn stored_rate(&self) -> f64 {
        clamp_rate(self.emit_rate.unwrap_or(0.0))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoAdjustRate {
    pub desired_rate: f64,
}

/// One row's new rate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitRateUpdate {
    pub rarity_id: String,
    pub emit_rate: f64,
}

/// Accepted edit: the edited row, plus the recomputed auto tier if any.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitRateUpdates {
    pub updates: Vec<EmitRateUpdate>,
    pub auto_adjust_rate: Option<EmitRateUpdate>,
}

/// A proposed edit against a snapshot of a gacha's tiers.
#[derive(Clone, Copy, Debug)]
pub struct EmitRateEdit<'a> {
    pub rarity_id: &'a str,
    pub next_rate: f64,
    pub auto_adjust_rarity_id: Option<&'a str>,
    pub rows: &'a [RarityTier],
}

/// The flagged auto-adjust tier. With several flagged (an invalid snapshot)
/// the lowest `sort_order` wins so the answer stays deterministic.
pub fn get_auto_adjust_rarity_id(tiers: &[RarityTier]) -> Option<&str> {
    tiers
        .iter()
        .filter(|t| t.auto_adjust)
        .min_by_key(|t| t.sort_order)
        .map(|t| t.id.as_str())
}

/// Copy of `tiers` where, if nothing is flagged and there is more than one
/// tier, the lowest-`sort_order` tier becomes the auto-adjust tier.
pub fn designate_base_tier(tiers: &[RarityTier]) -> Vec<RarityTier> {
    let mut out = tiers.to_vec();
    if out.len() > 1 && !out.iter().any(|t| t.auto_adjust) {
        if let Some(base) = out.iter_mut().min_by_key(|t| t.sort_order) {
            base.auto_adjust = true;
        }
    }
    out
}

/// `clamp_rate(1 − Σ rate of every tier other than auto_id)`.
pub fn compute_auto_adjust_rate(tiers: &[RarityTier], auto_id: &str) -> Option<AutoAdjustRate> {
    if !tiers.iter().any(|t| t.id == auto_id) {
        return None;
    }
    let others: f64 = tiers.iter().filter(|t| t.id != auto_id).map(RarityTier::stored_rate).sum();
    Some(AutoAdjustRate { desired_rate: clamp_rate(1.0 - others) })
}

/// Effective rate per tier (same order as `tiers`), auto tier resolved.
pub fn resolve_emit_rates(tiers: &[RarityTier]) -> Vec<f64> {
    let auto = get_auto_adjust_rarity_id(tiers);
    let auto_rate = auto.and_then(|id| compute_auto_adjust_rate(tiers, id));
    tiers
        .iter()
        .map(|t| match (auto, auto_rate) {
            (Some(id), Some(r)) if t.id == id => r.desired_rate,
            _ => t.stored_rate(),
        })
        .collect()
}

pub fn validate_rarity_tiers(tiers: &[RarityTier]) -> Result<(), RateError> {
    validate_rarity_tiers_ext(tiers, RATE_TOLERANCE)
}

pub fn validate_rarity_tiers_ext(tiers: &[RarityTier], tolerance: f64) -> Result<(), RateError> {
    let flagged: Vec<String> = tiers.iter().filter(|t| t.auto_adjust).map(|t| t.id.clone()).collect();
    if flagged.len() > 1 {
        return Err(RateError::MultipleAutoAdjust { ids: flagged });
    }
    let total: f64 = tiers.iter().filter(|t| !t.auto_adjust).map(RarityTier::stored_rate).sum();
    if total > 1.0 + tolerance {
        return Err(RateError::TotalExceedsLimit { total });
    }
    Ok(())
}

pub fn build_emit_rate_updates(edit: EmitRateEdit<'_>) -> Result<EmitRateUpdates, RateError> {
    build_emit_rate_updates_ext(edit, RATE_TOLERANCE)
}

/// Validate and build the updates for setting `edit.rarity_id` to
/// `edit.next_rate`. On `Err` nothing should be applied.
pub fn build_emit_rate_updates_ext(edit: EmitRateEdit<'_>, tolerance: f64) -> Result<EmitRateUpdates, RateError> {
    if !edit.rows.iter().any(|t| t.id == edit.rarity_id) {
        return Err(RateError::UnknownRarity { rarity_id: edit.rarity_id.to_string() });
    }
    let next = clamp_rate(edit.next_rate);
    let auto = edit
        .auto_adjust_rarity_id
        .filter(|id| edit.rows.iter().any(|t| t.id == *id));

    // user-set rows; the auto row only counts when it is the one being edited
    let total: f64 = edit
        .rows
        .iter()
        .filter(|t| Some(t.id.as_str()) != auto || t.id == edit.rarity_id)
        .map(|t| if t.id == edit.rarity_id { next } else { t.stored_rate() })
        .sum();

    if total > 1.0 + tolerance {
        tracing::debug!(rarity = edit.rarity_id, total, "rejected emit rate edit");
        return Err(RateError::TotalExceedsLimit { total });
    }

    let auto_adjust_rate = match auto {
        Some(id) if id != edit.rarity_id => Some(EmitRateUpdate {
            rarity_id: id.to_string(),
            emit_rate: clamp_rate(1.0 - total),
        }),
        _ => None,
    };

    Ok(EmitRateUpdates {
        updates: vec![EmitRateUpdate { rarity_id: edit.rarity_id.to_string(), emit_rate: next }],
        auto_adjust_rate,
    })
}

/// New tier snapshot with `updates` applied; unknown ids are ignored.
pub fn apply_emit_rate_updates(rows: &[RarityTier], updates: &EmitRateUpdates) -> Vec<RarityTier> {
    let mut out = rows.to_vec();
    for u in updates.updates.iter().chain(updates.auto_adjust_rate.iter()) {
        if let Some(row) = out.iter_mut().find(|t| t.id == u.rarity_id) {
            row.emit_rate = Some(u.emit_rate);
        }
    }
    out
}
