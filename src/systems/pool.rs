//! Pool builder: catalog + rarity snapshots → flat weighted pools.
//!
//! Each item's per-pull rate is its rarity's emission rate split evenly over
//! the items of that rarity. Items with an explicit `item_rate` override are
//! taken out of the split; the rest share what the overrides leave.
//! If the overrides alone exceed the tier's rate they are scaled down to fit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::mechanics::odds::{calculate_at_least_one_rate, expected_count};
use crate::mechanics::rate::{
    DEFAULT_FRACTION_DIGITS, MAX_FRACTION_DIGITS, RATE_TOLERANCE, clamp_rate,
    format_rarity_rate_with_digits, infer_rarity_fraction_digits_ext,
};
use crate::systems::rarity::{RarityTier, resolve_emit_rates, validate_rarity_tiers};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDefinition {
    pub item_id: String,
    pub name: String,
    pub rarity_id: String,
    #[serde(default)]
    pub pickup_target: bool,
    #[serde(default)]
    pub complete_target: bool,
    /// Explicit per-pull rate, excluded from the equal split.
    #[serde(default)]
    pub item_rate: Option<f64>,
}

impl ItemDefinition {
    pub fn new(item_id: impl Into<String>, name: impl Into<String>, rarity_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            name: name.into(),
            rarity_id: rarity_id.into(),
            pickup_target: false,
            complete_target: false,
            item_rate: None,
        }
    }

    pub fn pickup(mut self) -> Self {
        self.pickup_target = true;
        self
    }

    pub fn complete(mut self) -> Self {
        self.complete_target = true;
        self
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.item_rate = Some(rate);
        self
    }
}

/// Items per gacha, in catalog order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogState {
    pub items_by_gacha: BTreeMap<String, Vec<ItemDefinition>>,
}

/// Rarity tiers per gacha.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RarityState {
    pub tiers_by_gacha: BTreeMap<String, Vec<RarityTier>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolItem {
    pub item_id: String,
    pub rarity_id: String,
    pub item_rate: f64,
    pub item_rate_display: String,
    pub pickup_target: bool,
    pub complete_target: bool,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RarityGroup {
    pub rarity_id: String,
    pub label: String,
    pub color: String,
    pub emit_rate: f64,
    pub emit_rate_display: String,
    pub sort_order: i32,
    pub item_count: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GachaPoolDefinition {
    pub items: Vec<PoolItem>,
    pub rarity_groups: Vec<RarityGroup>,
}

impl GachaPoolDefinition {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, item_id: &str) -> Option<&PoolItem> {
        self.items.iter().find(|i| i.item_id == item_id)
    }

    pub fn rarity(&self, rarity_id: &str) -> Option<&RarityGroup> {
        self.rarity_groups.iter().find(|g| g.rarity_id == rarity_id)
    }

    /// Rarity rank (the tier's `sort_order`); unknown rarities rank lowest.
    pub fn rarity_rank(&self, rarity_id: &str) -> i32 {
        self.rarity(rarity_id).map_or(i32::MIN, |g| g.sort_order)
    }

    pub fn items_in_rarity<'a>(&'a self, rarity_id: &'a str) -> impl Iterator<Item = &'a PoolItem> + 'a {
        self.items.iter().filter(move |i| i.rarity_id == rarity_id)
    }

    pub fn total_weight(&self) -> f64 {
        self.items.iter().map(|i| i.item_rate).filter(|w| w.is_finite() && *w > 0.0).sum()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GachaPools {
    pub pools_by_gacha_id: BTreeMap<String, GachaPoolDefinition>,
}

/// Build a pool per gacha found in either snapshot.
///
/// `rarity_fraction_digits` pins the display digit budget per rarity id;
/// rarities not listed get [`infer_rarity_fraction_digits_ext`].
pub fn build_gacha_pools(
    catalog: &CatalogState,
    rarities: &RarityState,
    rarity_fraction_digits: Option<&BTreeMap<String, usize>>,
) -> GachaPools {
    let mut pools_by_gacha_id = BTreeMap::new();
    let gacha_ids = catalog.items_by_gacha.keys().chain(rarities.tiers_by_gacha.keys());
    for gacha_id in gacha_ids {
        if pools_by_gacha_id.contains_key(gacha_id) {
            continue;
        }
        let items = catalog.items_by_gacha.get(gacha_id).map(Vec::as_slice).unwrap_or(&[]);
        let tiers = rarities.tiers_by_gacha.get(gacha_id).map(Vec::as_slice).unwrap_or(&[]);
        if let Err(err) = validate_rarity_tiers(tiers) {
            warn!(gacha = %gacha_id, %err, "rarity snapshot violates rate invariants");
        }
        let pool = build_pool(items, tiers, rarity_fraction_digits);
        pools_by_gacha_id.insert(gacha_id.clone(), pool);
    }
    GachaPools { pools_by_gacha_id }
}

/// Pool for a single gacha. Empty when `items` is empty.
pub fn build_pool(
    items: &[ItemDefinition],
    tiers: &[RarityTier],
    rarity_fraction_digits: Option<&BTreeMap<String, usize>>,
) -> GachaPoolDefinition {
    if items.is_empty() {
        return GachaPoolDefinition::default();
    }

    let rates = resolve_emit_rates(tiers);
    let mut order: Vec<usize> = (0..tiers.len()).collect();
    order.sort_by_key(|&i| tiers[i].sort_order);

    let mut pool = GachaPoolDefinition::default();
    for &ti in &order {
        let tier = &tiers[ti];
        let emit_rate = rates[ti];
        let members: Vec<&ItemDefinition> = items.iter().filter(|i| i.rarity_id == tier.id).collect();
        let item_rates = split_tier_rate(&tier.id, emit_rate, &members);

        let digits = rarity_fraction_digits
            .and_then(|m| m.get(&tier.id).copied())
            .unwrap_or_else(|| {
                let mut sample = item_rates.clone();
                sample.push(emit_rate);
                infer_rarity_fraction_digits_ext(&sample, DEFAULT_FRACTION_DIGITS, MAX_FRACTION_DIGITS)
            });

        pool.rarity_groups.push(RarityGroup {
            rarity_id: tier.id.clone(),
            label: tier.label.clone(),
            color: tier.color.clone(),
            emit_rate,
            emit_rate_display: format_rarity_rate_with_digits(emit_rate, digits),
            sort_order: tier.sort_order,
            item_count: members.len(),
        });
        for (item, item_rate) in members.into_iter().zip(item_rates) {
            pool.items.push(PoolItem {
                item_id: item.item_id.clone(),
                rarity_id: item.rarity_id.clone(),
                item_rate,
                item_rate_display: format_rarity_rate_with_digits(item_rate, digits),
                pickup_target: item.pickup_target,
                complete_target: item.complete_target,
                name: item.name.clone(),
            });
        }
    }

    let orphans = items.iter().filter(|i| !tiers.iter().any(|t| t.id == i.rarity_id)).count();
    if orphans > 0 {
        warn!(orphans, "items reference unknown rarities and were left out of the pool");
    }
    pool
}

/// Per-item rates for one tier, in `members` order.
fn split_tier_rate(rarity_id: &str, emit_rate: f64, members: &[&ItemDefinition]) -> Vec<f64> {
    let override_sum: f64 = members.iter().filter_map(|i| i.item_rate).map(clamp_rate).sum();
    let scale = if override_sum > emit_rate + RATE_TOLERANCE && override_sum > 0.0 {
        warn!(rarity = rarity_id, override_sum, emit_rate, "item rate overrides exceed tier rate; scaling down");
        emit_rate / override_sum
    } else {
        1.0
    };
    let plain = members.iter().filter(|i| i.item_rate.is_none()).count();
    let remaining = (emit_rate - override_sum * scale).max(0.0);
    let share = if plain > 0 { remaining / plain as f64 } else { 0.0 };

    members
        .iter()
        .map(|i| match i.item_rate {
            Some(r) => clamp_rate(r) * scale,
            None => share,
        })
        .collect()
}

/// A display row of "odds over N pulls".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OddsRow {
    pub id: String,
    pub rate: f64,
    pub at_least_one: f64,
    pub expected: f64,
}

/// Per-rarity odds of at least one hit in `pulls`, normalized by pool weight.
pub fn rarity_odds(pool: &GachaPoolDefinition, pulls: u64) -> Vec<OddsRow> {
    let total = pool.total_weight();
    pool.rarity_groups
        .iter()
        .map(|g| {
            let mass: f64 = pool.items_in_rarity(&g.rarity_id).map(|i| i.item_rate.max(0.0)).sum();
            let rate = if total > 0.0 { mass / total } else { 0.0 };
            OddsRow {
                id: g.rarity_id.clone(),
                rate,
                at_least_one: calculate_at_least_one_rate(rate, pulls),
                expected: expected_count(rate, pulls),
            }
        })
        .collect()
}

/// Odds for one item; `None` when the item is not in the pool.
pub fn item_odds(pool: &GachaPoolDefinition, item_id: &str, pulls: u64) -> Option<OddsRow> {
    let item = pool.item(item_id)?;
    let total = pool.total_weight();
    let rate = if total > 0.0 { item.item_rate.max(0.0) / total } else { 0.0 };
    Some(OddsRow {
        id: item.item_id.clone(),
        rate,
        at_least_one: calculate_at_least_one_rate(rate, pulls),
        expected: expected_count(rate, pulls),
    })
}
