//! Draw execution: plan → weighted pulls → guarantee post-pass → tallies.
//!
//! Guarantees never add pulls. After every random pull is drawn, the pull
//! sequence is cut into consecutive windows of `threshold` pulls; a complete
//! window with fewer than `quantity` hits gets its lowest-rarity misses
//! (earliest first on ties) replaced by the guaranteed target.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::error::{DrawError, DrawWarning, PlanError, PlanWarning};
use crate::mechanics::stoch::{UniformSource, draw_weighted};
use crate::systems::plan::{GuaranteeSetting, GuaranteeTarget, PtSetting, normalize_pt_setting_ext, resolve_plan};
use crate::systems::pool::GachaPoolDefinition;

#[derive(Clone, Copy, Debug)]
pub struct ExecuteRequest<'a> {
    pub pool: &'a GachaPoolDefinition,
    pub settings: &'a PtSetting,
    pub points: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionItem {
    pub item_id: String,
    /// Every occurrence, random and guaranteed.
    pub count: u64,
    /// Occurrences produced by guarantee replacement.
    pub guaranteed_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRecord {
    pub item_id: String,
    pub guaranteed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RarityTotal {
    pub rarity_id: String,
    pub count: u64,
    pub guaranteed_count: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Items drawn at least once, in pool order.
    pub items: Vec<ExecutionItem>,
    /// The pull sequence after guarantees.
    pub pulls: Vec<PullRecord>,
    pub points_spent: u64,
    pub total_pulls: u64,
    pub warnings: Vec<DrawWarning>,
    pub errors: Vec<DrawError>,
}

impl ExecutionResult {
    fn failed(errors: Vec<DrawError>) -> Self {
        Self { errors, ..Self::default() }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Per-rarity sums, in the pool's rarity order.
    pub fn rarity_totals(&self, pool: &GachaPoolDefinition) -> Vec<RarityTotal> {
        pool.rarity_groups
            .iter()
            .map(|g| {
                let mut total = RarityTotal { rarity_id: g.rarity_id.clone(), count: 0, guaranteed_count: 0 };
                for it in &self.items {
                    if pool.item(&it.item_id).is_some_and(|p| p.rarity_id == g.rarity_id) {
                        total.count += it.count;
                        total.guaranteed_count += it.guaranteed_count;
                    }
                }
                total
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug)]
struct Slot {
    item: usize,
    guaranteed: bool,
}

pub fn execute_gacha(req: &ExecuteRequest<'_>, rng: &mut impl UniformSource) -> ExecutionResult {
    execute_gacha_ext(req, rng, &EngineConfig::default())
}

pub fn execute_gacha_ext(req: &ExecuteRequest<'_>, rng: &mut impl UniformSource, cfg: &EngineConfig) -> ExecutionResult {
    let pool = req.pool;
    let settings = normalize_pt_setting_ext(req.settings, cfg);
    let plan = resolve_plan(req.points, &settings, pool.items.len());
    if !plan.is_ok() {
        return ExecutionResult::failed(plan.errors.into_iter().map(DrawError::from).collect());
    }
    if pool.total_weight() <= 0.0 {
        return ExecutionResult::failed(vec![DrawError::EmptyPool]);
    }

    if plan.total_pulls > cfg.max_pulls {
        warn!(pulls = plan.total_pulls, limit = cfg.max_pulls, "refusing oversized execution");
        return ExecutionResult::failed(vec![DrawError::TooManyPulls { pulls: plan.total_pulls, limit: cfg.max_pulls }]);
    }

    let weights: Vec<f64> = pool.items.iter().map(|i| i.item_rate).collect();
    let mut slots = Vec::with_capacity(usize::try_from(plan.total_pulls).unwrap_or(0));
    for _ in 0..plan.total_pulls {
        let Some(item) = draw_weighted(&weights, rng) else {
            return ExecutionResult::failed(vec![DrawError::EmptyPool]);
        };
        slots.push(Slot { item, guaranteed: false });
    }

    let mut warnings: Vec<DrawWarning> = plan.warnings.into_iter().map(DrawWarning::from).collect();
    for g in &settings.guarantees {
        apply_guarantee(pool, g, &mut slots, rng, &mut warnings);
    }

    debug!(pulls = slots.len(), spent = plan.points_spent, "executed gacha");
    tally(pool, slots, plan.points_spent, warnings)
}

/// Guaranteed-target resolution: replacement candidates and a hit test.
enum Target {
    Rarity { rank: i32, items: Vec<usize>, weights: Vec<f64> },
    Item(usize),
}

fn resolve_target(pool: &GachaPoolDefinition, g: &GuaranteeSetting) -> Option<Target> {
    let positive = |i: usize| pool.items[i].item_rate.is_finite() && pool.items[i].item_rate > 0.0;
    match &g.target {
        GuaranteeTarget::Item { item_id } => {
            let idx = pool.items.iter().position(|i| &i.item_id == item_id)?;
            positive(idx).then_some(Target::Item(idx))
        }
        GuaranteeTarget::Rarity => {
            let group = pool.rarity(&g.rarity_id)?;
            let items: Vec<usize> = (0..pool.items.len())
                .filter(|&i| pool.items[i].rarity_id == g.rarity_id && positive(i))
                .collect();
            if items.is_empty() {
                return None;
            }
            let weights = items.iter().map(|&i| pool.items[i].item_rate).collect();
            Some(Target::Rarity { rank: group.sort_order, items, weights })
        }
    }
}

impl Target {
    fn hit(&self, pool: &GachaPoolDefinition, item: usize) -> bool {
        match self {
            Target::Item(idx) => *idx == item,
            Target::Rarity { rank, .. } => pool.rarity_rank(&pool.items[item].rarity_id) >= *rank,
        }
    }

    fn pick(&self, rng: &mut impl UniformSource) -> usize {
        match self {
            Target::Item(idx) => *idx,
            Target::Rarity { items, weights, .. } => {
                let k = draw_weighted(weights, rng).unwrap_or(0);
                items[k]
            }
        }
    }
}

fn apply_guarantee(
    pool: &GachaPoolDefinition,
    g: &GuaranteeSetting,
    slots: &mut [Slot],
    rng: &mut impl UniformSource,
    warnings: &mut Vec<DrawWarning>,
) {
    let Some(target) = resolve_target(pool, g) else {
        warn!(guarantee = %g.id, "guarantee target has no weight in the pool");
        warnings.push(DrawWarning::GuaranteeUnsatisfiable { guarantee_id: g.id.clone() });
        return;
    };
    let threshold = usize::try_from(g.threshold).unwrap_or(usize::MAX);
    let quantity = usize::try_from(g.quantity).unwrap_or(usize::MAX);

    for (w, window) in slots.chunks_exact_mut(threshold).enumerate() {
        let hits = window.iter().filter(|s| target.hit(pool, s.item)).count();
        if hits >= quantity {
            continue;
        }
        let deficit = quantity - hits;

        let mut misses: Vec<usize> = (0..window.len())
            .filter(|&i| !window[i].guaranteed && !target.hit(pool, window[i].item))
            .collect();
        misses.sort_by_key(|&i| (pool.rarity_rank(&pool.items[window[i].item].rarity_id), i));

        let replaced = misses.len().min(deficit);
        for &i in &misses[..replaced] {
            let item = target.pick(rng);
            trace!(guarantee = %g.id, window = w, slot = i, item = %pool.items[item].item_id, "guarantee replacement");
            window[i] = Slot { item, guaranteed: true };
        }
        if replaced < deficit {
            warnings.push(DrawWarning::GuaranteeWindowExhausted {
                guarantee_id: g.id.clone(),
                window: w,
                missing: (deficit - replaced) as u64,
            });
        }
    }
}

fn tally(pool: &GachaPoolDefinition, slots: Vec<Slot>, points_spent: u64, warnings: Vec<DrawWarning>) -> ExecutionResult {
    let mut counts = vec![(0u64, 0u64); pool.items.len()];
    let mut pulls = Vec::with_capacity(slots.len());
    for s in &slots {
        counts[s.item].0 += 1;
        if s.guaranteed {
            counts[s.item].1 += 1;
        }
        pulls.push(PullRecord { item_id: pool.items[s.item].item_id.clone(), guaranteed: s.guaranteed });
    }
    let items = pool
        .items
        .iter()
        .zip(counts)
        .filter(|(_, (count, _))| *count > 0)
        .map(|(item, (count, guaranteed_count))| ExecutionItem {
            item_id: item.item_id.clone(),
            count,
            guaranteed_count,
        })
        .collect();

    ExecutionResult {
        items,
        pulls,
        points_spent,
        total_pulls: slots.len() as u64,
        warnings,
        errors: Vec::new(),
    }
}

pub fn execute_complete(req: &ExecuteRequest<'_>) -> ExecutionResult {
    execute_complete_ext(req, &EngineConfig::default())
}

/// The "complete the set" purchase: one of every `complete_target` item
/// (every item when none is flagged) for the complete price. No randomness.
pub fn execute_complete_ext(req: &ExecuteRequest<'_>, cfg: &EngineConfig) -> ExecutionResult {
    let pool = req.pool;
    let settings = normalize_pt_setting_ext(req.settings, cfg);
    if pool.is_empty() {
        return ExecutionResult::failed(vec![PlanError::NoItems.into()]);
    }
    let Some(price) = settings.complete else {
        return ExecutionResult::failed(vec![DrawError::CompleteUnavailable]);
    };
    if req.points < price {
        return ExecutionResult::failed(vec![
            PlanError::InsufficientPoints { points: req.points, cheapest: price }.into(),
        ]);
    }

    let flagged = pool.items.iter().any(|i| i.complete_target);
    let slots: Vec<Slot> = (0..pool.items.len())
        .filter(|&i| !flagged || pool.items[i].complete_target)
        .map(|item| Slot { item, guaranteed: true })
        .collect();

    let mut warnings = Vec::new();
    if req.points > price {
        warnings.push(PlanWarning::LeftoverPoints { points: req.points - price }.into());
    }
    tally(pool, slots, price, warnings)
}
