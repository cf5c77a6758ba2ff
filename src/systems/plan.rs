//! Point plan resolver: point budget → pulls.
//!
//! Pricing units (the per-pull price and every bundle) are ranked by
//! pulls-per-point, best first, and the budget is spent greedily down that
//! list. Since every unit further down has a worse ratio, the pulls bought
//! never decrease as the budget grows, which is what makes the inversion
//! (`calculate_points_for_pulls`) searchable.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{EngineConfig, UnitPrice};
use crate::error::{PlanError, PlanWarning};
use crate::refine_det;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletePrice {
    pub price: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundlePrice {
    pub id: String,
    pub price: u64,
    pub pulls: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GuaranteeTarget {
    Rarity,
    #[serde(rename_all = "camelCase")]
    Item { item_id: String },
}

/// "Every `threshold` pulls, at least `quantity` results hit `target`."
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuaranteeSetting {
    pub id: String,
    pub rarity_id: String,
    pub threshold: u64,
    pub quantity: u64,
    pub target: GuaranteeTarget,
}

/// Pricing configuration of one gacha, as the settings store hands it over.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PtSetting {
    #[serde(default)]
    pub per_pull: Option<UnitPrice>,
    #[serde(default)]
    pub complete: Option<CompletePrice>,
    #[serde(default)]
    pub bundles: Vec<BundlePrice>,
    #[serde(default)]
    pub guarantees: Vec<GuaranteeSetting>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PriceSource {
    PerPull,
    Bundle { id: String },
    /// Default unit applied because nothing else was priced.
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceUnit {
    pub source: PriceSource,
    pub price: u64,
    pub pulls: u64,
}

impl PriceUnit {
    /// Better pulls-per-point first; ties prefer the bigger unit.
    fn rank(&self, other: &Self) -> Ordering {
        let lhs = self.pulls as u128 * other.price as u128;
        let rhs = other.pulls as u128 * self.price as u128;
        rhs.cmp(&lhs).then(other.pulls.cmp(&self.pulls))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedPtSetting {
    /// Best ratio first.
    pub units: Vec<PriceUnit>,
    pub complete: Option<u64>,
    pub guarantees: Vec<GuaranteeSetting>,
}

impl NormalizedPtSetting {
    pub fn cheapest_price(&self) -> Option<u64> {
        self.units.iter().map(|u| u.price).min()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub source: PriceSource,
    pub count: u64,
    pub pulls: u64,
    pub points: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawPlan {
    pub total_pulls: u64,
    pub points_spent: u64,
    pub purchases: Vec<Purchase>,
    pub warnings: Vec<PlanWarning>,
    pub errors: Vec<PlanError>,
}

impl DrawPlan {
    fn failed(errors: Vec<PlanError>) -> Self {
        Self { errors, ..Self::default() }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PlanRequest<'a> {
    pub points: u64,
    pub settings: &'a PtSetting,
    pub total_item_types: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PointsForPulls {
    pub points: u64,
    pub plan: DrawPlan,
}

pub fn normalize_pt_setting(settings: &PtSetting) -> NormalizedPtSetting {
    normalize_pt_setting_ext(settings, &EngineConfig::default())
}

/// Drop non-positive prices/pulls and broken guarantees, apply the fallback
/// unit when nothing is priced, rank units by pulls-per-point.
pub fn normalize_pt_setting_ext(settings: &PtSetting, cfg: &EngineConfig) -> NormalizedPtSetting {
    let mut units = Vec::with_capacity(settings.bundles.len() + 1);
    if let Some(p) = settings.per_pull {
        if p.price > 0 && p.pulls > 0 {
            units.push(PriceUnit { source: PriceSource::PerPull, price: p.price, pulls: p.pulls });
        } else {
            debug!(?p, "dropping unusable per-pull price");
        }
    }
    for b in &settings.bundles {
        if b.price > 0 && b.pulls > 0 {
            units.push(PriceUnit {
                source: PriceSource::Bundle { id: b.id.clone() },
                price: b.price,
                pulls: b.pulls,
            });
        } else {
            debug!(bundle = %b.id, "dropping unusable bundle");
        }
    }
    if units.is_empty() {
        if let Some(f) = cfg.fallback_unit.filter(|f| f.price > 0 && f.pulls > 0) {
            units.push(PriceUnit { source: PriceSource::Fallback, price: f.price, pulls: f.pulls });
        }
    }
    units.sort_by(PriceUnit::rank);

    let guarantees = settings
        .guarantees
        .iter()
        .filter(|g| {
            let ok = g.threshold > 0
                && g.quantity > 0
                && match &g.target {
                    GuaranteeTarget::Rarity => !g.rarity_id.is_empty(),
                    GuaranteeTarget::Item { item_id } => !item_id.is_empty(),
                };
            if !ok {
                warn!(guarantee = %g.id, "dropping malformed guarantee");
            }
            ok
        })
        .map(|g| GuaranteeSetting { quantity: g.quantity.min(g.threshold), ..g.clone() })
        .collect();

    NormalizedPtSetting {
        units,
        complete: settings.complete.map(|c| c.price).filter(|&p| p > 0),
        guarantees,
    }
}

pub fn calculate_draw_plan(req: &PlanRequest<'_>) -> DrawPlan {
    calculate_draw_plan_ext(req, &EngineConfig::default())
}

pub fn calculate_draw_plan_ext(req: &PlanRequest<'_>, cfg: &EngineConfig) -> DrawPlan {
    let normalized = normalize_pt_setting_ext(req.settings, cfg);
    resolve_plan(req.points, &normalized, req.total_item_types)
}

/// Greedy spend of `points` over the ranked units.
pub fn resolve_plan(points: u64, settings: &NormalizedPtSetting, total_item_types: usize) -> DrawPlan {
    let mut errors = Vec::new();
    if total_item_types == 0 {
        errors.push(PlanError::NoItems);
    }
    match settings.cheapest_price() {
        None => errors.push(PlanError::NoPricing),
        Some(cheapest) if cheapest > points => {
            errors.push(PlanError::InsufficientPoints { points, cheapest });
        }
        Some(_) => {}
    }
    if !errors.is_empty() {
        return DrawPlan::failed(errors);
    }

    let mut plan = DrawPlan::default();
    if let Some(price) = settings.complete {
        if points >= price {
            plan.warnings.push(PlanWarning::CompleteReachable { price });
        }
    }

    let mut remaining = points;
    for unit in &settings.units {
        let count = remaining / unit.price;
        if count == 0 {
            continue;
        }
        let spent = count * unit.price;
        let pulls = count.saturating_mul(unit.pulls);
        remaining -= spent;
        plan.points_spent += spent;
        plan.total_pulls = plan.total_pulls.saturating_add(pulls);
        plan.purchases.push(Purchase { source: unit.source.clone(), count, pulls, points: spent });
    }
    if remaining > 0 {
        plan.warnings.push(PlanWarning::LeftoverPoints { points: remaining });
    }

    debug!(points, pulls = plan.total_pulls, spent = plan.points_spent, leftover = remaining, "resolved draw plan");
    plan
}

pub fn calculate_points_for_pulls(
    target_pulls: u64,
    settings: &PtSetting,
    total_item_types: usize,
) -> Result<PointsForPulls, PlanError> {
    calculate_points_for_pulls_ext(target_pulls, settings, total_item_types, &EngineConfig::default())
}

/// Smallest budget whose plan reaches `target_pulls`.
///
/// Starts at the best-ratio lower bound and steps the budget by the cheapest
/// price until the plan suffices (at most `cfg.max_inversion_iters` steps),
/// then bisects the last step. The returned plan is resolved at exactly the
/// points it spends, so it carries no leftover warning.
pub fn calculate_points_for_pulls_ext(
    target_pulls: u64,
    settings: &PtSetting,
    total_item_types: usize,
    cfg: &EngineConfig,
) -> Result<PointsForPulls, PlanError> {
    if total_item_types == 0 {
        return Err(PlanError::NoItems);
    }
    if target_pulls == 0 {
        return Ok(PointsForPulls { points: 0, plan: DrawPlan::default() });
    }
    let normalized = normalize_pt_setting_ext(settings, cfg);
    let (Some(best), Some(step)) = (normalized.units.first(), normalized.cheapest_price()) else {
        return Err(PlanError::NoPricing);
    };

    let lower = (target_pulls as u128 * best.price as u128).div_ceil(best.pulls as u128);
    let start = u64::try_from(lower).unwrap_or(u64::MAX).max(step);
    let reaches = |plan: &DrawPlan| plan.is_ok() && plan.total_pulls >= target_pulls;

    let refined = refine_det(
        start,
        |&budget| resolve_plan(budget, &normalized, total_item_types),
        |plan: &DrawPlan| plan.clone(),
        |&budget, _| budget.saturating_add(step),
        |_, plan| reaches(plan),
        cfg.max_inversion_iters,
    );
    if !refined.converged {
        warn!(target_pulls, iterations = refined.iters, "plan inversion hit its step cap");
        return Err(PlanError::InversionLimit { target: target_pulls, iterations: refined.iters });
    }

    // (lo, hi]: lo falls short (or is below the start), hi reaches
    let mut lo = refined.theta.saturating_sub(step).max(start.saturating_sub(1));
    let mut hi = refined.theta;
    let mut plan = refined.metrics;
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        let candidate = resolve_plan(mid, &normalized, total_item_types);
        if reaches(&candidate) {
            hi = mid;
            plan = candidate;
        } else {
            lo = mid;
        }
    }
    let points = plan.points_spent;
    Ok(PointsForPulls { points, plan: resolve_plan(points, &normalized, total_item_types) })
}
